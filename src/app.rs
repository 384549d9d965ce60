//! Application state management for tictac-tui.
//!
//! This module contains the core `App` struct that manages all application
//! state: the current screen, form state, the session store, the toast
//! queue, the local board, and background network task coordination.

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, GameStats, RefreshedTokens};
use crate::api::client::SignupRequest;
use crate::auth::guard::{self, GuardCheck, GuardState, MSG_SESSION_EXPIRED, MSG_UNAUTHORIZED};
use crate::auth::{FileTokenRepository, SessionStore, TokenSet};
use crate::config::Config;
use crate::game::{Board, Mark};
use crate::toast::{Severity, ToastQueue};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for name input.
pub const MAX_NAME_LENGTH: usize = 50;

/// Maximum length for email input. 254 is the RFC 5321 path limit.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Confirmation codes are exactly 6 digits.
pub const CODE_LENGTH: usize = 6;

/// Fixed message for a failed login; the underlying error is never shown.
const MSG_LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Fixed message for a failed verification attempt.
const MSG_VERIFY_FAILED: &str = "Verification failed. Please try again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Login,
    Signup,
    Verify,
    Game,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    Submit,
}

impl LoginField {
    pub fn next(&self) -> Self {
        match self {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Submit,
            LoginField::Submit => LoginField::Email,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginField::Email => LoginField::Submit,
            LoginField::Password => LoginField::Email,
            LoginField::Submit => LoginField::Password,
        }
    }
}

/// Signup form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Name,
    Email,
    Password,
    ConfirmPassword,
    Submit,
}

impl SignupField {
    pub fn next(&self) -> Self {
        match self {
            SignupField::Name => SignupField::Email,
            SignupField::Email => SignupField::Password,
            SignupField::Password => SignupField::ConfirmPassword,
            SignupField::ConfirmPassword => SignupField::Submit,
            SignupField::Submit => SignupField::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            SignupField::Name => SignupField::Submit,
            SignupField::Email => SignupField::Name,
            SignupField::Password => SignupField::Email,
            SignupField::ConfirmPassword => SignupField::Password,
            SignupField::Submit => SignupField::ConfirmPassword,
        }
    }
}

/// Inline field errors for the login form
#[derive(Debug, Default)]
pub struct LoginErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Inline field errors for the signup form
#[derive(Debug, Default)]
pub struct SignupErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Signup credentials held in memory between signup and verification so the
/// client can log in automatically once the code is confirmed. Never
/// persisted.
#[derive(Debug, Clone)]
struct SignupStash {
    email: String,
    password: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results from spawned network tasks, sent back over an MPSC channel and
/// drained by the main loop each tick.
enum NetEvent {
    LoginDone(Result<TokenSet>),
    SignupDone(Result<bool>),
    VerifyDone(Result<String>),
    RefreshDone(Result<RefreshedTokens>),
    LogoutDone(Result<String>),
    StatsFetched(Result<GameStats>),
    StatsUpdated(Result<()>),
}

// ============================================================================
// Form validation
// ============================================================================

/// Whether a printable character can be appended to a text field.
pub fn can_add_field_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && !c.is_control()
}

/// Whether a character can be appended to the confirmation-code field.
pub fn can_add_code_char(current_len: usize, c: char) -> bool {
    current_len < CODE_LENGTH && c.is_ascii_digit()
}

pub fn validate_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        Some("Name is required".to_string())
    } else {
        None
    }
}

pub fn validate_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() {
        return Some("Email is required".to_string());
    }
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    };
    if well_formed {
        None
    } else {
        Some("Invalid email address".to_string())
    }
}

pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        Some("Password is required".to_string())
    } else if password.len() < 6 {
        Some("Password must be at least 6 characters".to_string())
    } else {
        None
    }
}

pub fn validate_confirm_password(password: &str, confirm: &str) -> Option<String> {
    if confirm.is_empty() {
        Some("Confirm password is required".to_string())
    } else if password != confirm {
        Some("Passwords must match".to_string())
    } else {
        None
    }
}

pub fn validate_confirmation_code(code: &str) -> Option<String> {
    if code.is_empty() {
        Some("Confirmation code is required".to_string())
    } else if code.len() != CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        Some("Confirmation code must be numeric and exactly 6 digits".to_string())
    } else {
        None
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub session: SessionStore,
    pub toasts: ToastQueue,

    // Navigation
    pub screen: Screen,

    // Session guard state for the game screen
    pub guard_state: GuardState,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginField,
    pub login_errors: LoginErrors,
    pub login_pending: bool,

    // Signup form
    pub signup_name: String,
    pub signup_email: String,
    pub signup_password: String,
    pub signup_confirm: String,
    pub signup_focus: SignupField,
    pub signup_errors: SignupErrors,
    pub signup_pending: bool,

    // Verify form
    pub verify_code: String,
    pub verify_error: Option<String>,
    pub verify_pending: bool,
    stash: Option<SignupStash>,

    // Game state
    pub board: Board,
    pub cell_cursor: usize,
    pub stats: GameStats,
    pub stats_loaded: bool,
    win_reported: bool,

    // Background task channel
    net_rx: mpsc::Receiver<NetEvent>,
    net_tx: mpsc::Sender<NetEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.base_url();
        debug!(%base_url, "API base URL resolved");
        let api = ApiClient::new(&base_url)?;

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("./cache"));
        let session = SessionStore::new(Box::new(FileTokenRepository::new(cache_dir)));

        Ok(Self::with_parts(config, api, session))
    }

    /// Assemble the app from preconstructed services. `new` wires up the
    /// file-backed config and token store; tests inject in-memory ones.
    fn with_parts(config: Config, api: ApiClient, session: SessionStore) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();

        Self {
            config,
            api,
            session,
            toasts: ToastQueue::new(),

            screen: Screen::Landing,

            guard_state: GuardState::Checking,

            login_email,
            login_password: String::new(),
            login_focus: LoginField::Email,
            login_errors: LoginErrors::default(),
            login_pending: false,

            signup_name: String::new(),
            signup_email: String::new(),
            signup_password: String::new(),
            signup_confirm: String::new(),
            signup_focus: SignupField::Name,
            signup_errors: SignupErrors::default(),
            signup_pending: false,

            verify_code: String::new(),
            verify_error: None,
            verify_pending: false,
            stash: None,

            board: Board::new(),
            cell_cursor: 4,
            stats: GameStats::default(),
            stats_loaded: false,
            win_reported: false,

            net_rx: rx,
            net_tx: tx,
        }
    }

    // =========================================================================
    // Toasts
    // =========================================================================

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.toasts.push(message, severity);
    }

    /// Central conversion of a failed network call into an error toast. The
    /// message falls back through the server's error field, its message
    /// field, and a fixed default (see `ApiError::user_message`).
    fn report_network_error(&mut self, err: &anyhow::Error) {
        error!(error = %err, "Request failed");
        let message = match err.downcast_ref::<ApiError>() {
            Some(api_err) => api_err.user_message(),
            None => "Something went wrong!".to_string(),
        };
        self.notify(message, Severity::Error);
    }

    /// Dismiss the oldest visible toast, if any.
    pub fn dismiss_oldest_toast(&mut self) {
        let id = self.toasts.iter().next().map(|t| t.id);
        if let Some(id) = id {
            self.toasts.dismiss(id);
        }
    }

    /// Prune expired toasts. Called once per UI tick.
    pub fn tick(&mut self) {
        self.toasts.prune(Utc::now());
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn goto_landing(&mut self) {
        self.screen = Screen::Landing;
    }

    pub fn goto_login(&mut self) {
        self.screen = Screen::Login;
        self.login_focus = if self.login_email.is_empty() {
            LoginField::Email
        } else {
            LoginField::Password
        };
        self.login_errors = LoginErrors::default();
    }

    pub fn goto_signup(&mut self) {
        self.screen = Screen::Signup;
        self.signup_focus = SignupField::Name;
        self.signup_errors = SignupErrors::default();
    }

    fn goto_verify(&mut self) {
        self.screen = Screen::Verify;
        self.verify_code.clear();
        self.verify_error = None;
    }

    /// Enter the game screen, running the session guard exactly once. The
    /// local expiry check always completes before any refresh is issued, and
    /// the board is only reachable through `Authorized`.
    pub fn enter_game(&mut self) {
        self.screen = Screen::Game;
        self.guard_state = GuardState::Checking;
        self.board.reset();
        self.win_reported = false;
        self.stats_loaded = false;

        match guard::check(&self.session, Utc::now()) {
            GuardCheck::Valid => {
                debug!("Session valid, rendering game");
                self.guard_state = GuardState::Authorized;
                self.spawn_fetch_stats();
            }
            GuardCheck::NoToken => {
                info!("No session token, redirecting to login");
                self.ask_relogin(MSG_UNAUTHORIZED);
            }
            GuardCheck::Expired {
                email,
                refresh_token,
            } => {
                info!("Identity token expired, refreshing");
                self.guard_state = GuardState::Refreshing;
                let api = self.api.clone();
                let tx = self.net_tx.clone();
                tokio::spawn(async move {
                    let result = api.refresh_token(&email, &refresh_token).await;
                    let _ = tx.send(NetEvent::RefreshDone(result)).await;
                });
            }
        }
    }

    /// Send the user back to login with an error toast.
    fn ask_relogin(&mut self, message: &str) {
        self.guard_state = GuardState::Unauthorized;
        self.notify(message, Severity::Error);
        self.goto_login();
    }

    // =========================================================================
    // Auth flows
    // =========================================================================

    /// Validate and submit the login form.
    pub fn submit_login(&mut self) {
        if self.login_pending {
            return;
        }

        self.login_errors = LoginErrors {
            email: validate_email(&self.login_email),
            password: validate_password(&self.login_password),
        };
        if self.login_errors.email.is_some() || self.login_errors.password.is_some() {
            return;
        }

        self.login_pending = true;
        self.spawn_login(self.login_email.trim().to_string(), self.login_password.clone());
    }

    fn spawn_login(&self, email: String, password: String) {
        let api = self.api.clone();
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = api.login(&email, &password).await;
            let _ = tx.send(NetEvent::LoginDone(result)).await;
        });
    }

    /// Validate and submit the signup form.
    pub fn submit_signup(&mut self) {
        if self.signup_pending {
            return;
        }

        self.signup_errors = SignupErrors {
            name: validate_name(&self.signup_name),
            email: validate_email(&self.signup_email),
            password: validate_password(&self.signup_password),
            confirm_password: validate_confirm_password(
                &self.signup_password,
                &self.signup_confirm,
            ),
        };
        if self.signup_errors.name.is_some()
            || self.signup_errors.email.is_some()
            || self.signup_errors.password.is_some()
            || self.signup_errors.confirm_password.is_some()
        {
            return;
        }

        self.signup_pending = true;
        let request = SignupRequest {
            name: self.signup_name.trim().to_string(),
            email: self.signup_email.trim().to_string(),
            password: self.signup_password.clone(),
            confirm_password: self.signup_confirm.clone(),
        };
        let api = self.api.clone();
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = api.signup(&request).await;
            let _ = tx.send(NetEvent::SignupDone(result)).await;
        });
    }

    /// Validate and submit the confirmation code.
    pub fn submit_verify(&mut self) {
        if self.verify_pending {
            return;
        }

        self.verify_error = validate_confirmation_code(&self.verify_code);
        if self.verify_error.is_some() {
            return;
        }

        let email = match self.stash.as_ref() {
            Some(stash) => stash.email.clone(),
            None => {
                // Reached the verify screen without a signup in this run
                self.notify(MSG_VERIFY_FAILED, Severity::Error);
                return;
            }
        };

        self.verify_pending = true;
        let code = self.verify_code.clone();
        let api = self.api.clone();
        let tx = self.net_tx.clone();
        tokio::spawn(async move {
            let result = api.verify(&email, &code).await;
            let _ = tx.send(NetEvent::VerifyDone(result)).await;
        });
    }

    /// Optimistic logout: clear local state immediately, then tell the
    /// server best-effort with the access token captured before the clear.
    pub fn logout(&mut self) {
        let access_token = self.session.access_token();

        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear persisted tokens");
        }
        self.notify("Logout successful!", Severity::Success);
        self.goto_landing();
        info!("Logged out");

        if let Some(token) = access_token {
            let api = self.api.clone();
            let tx = self.net_tx.clone();
            tokio::spawn(async move {
                let result = api.logout(&token).await;
                let _ = tx.send(NetEvent::LogoutDone(result)).await;
            });
        }
    }

    // =========================================================================
    // Game
    // =========================================================================

    /// Handle a move at the cursor. Only reachable in `Authorized`.
    pub fn play_cell(&mut self, index: usize) {
        if self.guard_state != GuardState::Authorized {
            return;
        }
        if !self.board.play(index) {
            return;
        }
        if let Some(winner) = self.board.winner() {
            if !self.win_reported {
                self.win_reported = true;
                // Bump locally for immediate display; the refetch after the
                // update call re-syncs with the server.
                match winner {
                    Mark::X => self.stats.player_x_wins += 1,
                    Mark::O => self.stats.player_o_wins += 1,
                }
                self.spawn_update_stats(winner);
            }
        }
    }

    pub fn reset_game(&mut self) {
        self.board.reset();
        self.win_reported = false;
    }

    fn spawn_fetch_stats(&self) {
        let api = self.api.clone();
        let tx = self.net_tx.clone();
        let token = self.session.access_token();
        tokio::spawn(async move {
            let result = api.fetch_game_stats(token.as_deref()).await;
            let _ = tx.send(NetEvent::StatsFetched(result)).await;
        });
    }

    fn spawn_update_stats(&self, winner: Mark) {
        let api = self.api.clone();
        let tx = self.net_tx.clone();
        let token = self.session.access_token();
        tokio::spawn(async move {
            let result = api.update_game_stats(winner, token.as_deref()).await;
            let _ = tx.send(NetEvent::StatsUpdated(result)).await;
        });
    }

    // =========================================================================
    // Background task results
    // =========================================================================

    /// Drain completed network tasks. Called once per UI tick.
    pub fn poll_net_events(&mut self) {
        while let Ok(event) = self.net_rx.try_recv() {
            self.handle_net_event(event);
        }
    }

    fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::LoginDone(Ok(tokens)) => {
                self.login_pending = false;
                match self.session.establish(tokens) {
                    Ok(claims) => {
                        info!(email = %claims.email, "Login successful");
                        self.notify("Login Successful!", Severity::Success);

                        self.config.last_email = Some(claims.email);
                        if let Err(e) = self.config.save() {
                            warn!(error = %e, "Failed to save config");
                        }

                        self.login_password.clear();
                        self.stash = None;
                        self.enter_game();
                    }
                    Err(e) => {
                        error!(error = %e, "Server returned an unusable identity token");
                        self.notify(MSG_LOGIN_FAILED, Severity::Error);
                    }
                }
            }
            NetEvent::LoginDone(Err(e)) => {
                self.login_pending = false;
                error!(error = %e, "Login failed");
                // Fixed message; the underlying error is never surfaced
                self.notify(MSG_LOGIN_FAILED, Severity::Error);
            }

            NetEvent::SignupDone(Ok(code_sent)) => {
                self.signup_pending = false;
                if code_sent {
                    info!(email = %self.signup_email, "Signup accepted, code sent");
                    self.stash = Some(SignupStash {
                        email: self.signup_email.trim().to_string(),
                        password: self.signup_password.clone(),
                    });
                    self.goto_verify();
                } else {
                    warn!("Signup response carried no delivery confirmation");
                    self.notify("Something went wrong!", Severity::Error);
                }
            }
            NetEvent::SignupDone(Err(e)) => {
                self.signup_pending = false;
                self.report_network_error(&e);
            }

            NetEvent::VerifyDone(Ok(message)) => {
                self.verify_pending = false;
                debug!(%message, "Verification confirmed");
                self.notify("Signup successful, logging in...", Severity::Success);
                if let Some(stash) = self.stash.clone() {
                    self.login_pending = true;
                    self.spawn_login(stash.email, stash.password);
                }
            }
            NetEvent::VerifyDone(Err(e)) => {
                self.verify_pending = false;
                error!(error = %e, "Verification failed");
                self.notify(MSG_VERIFY_FAILED, Severity::Error);
            }

            NetEvent::RefreshDone(Ok(refreshed)) => {
                match self
                    .session
                    .apply_refresh(&refreshed.id_token, &refreshed.access_token)
                {
                    Ok(claims) => {
                        info!(email = %claims.email, "Session refreshed");
                        self.guard_state = GuardState::Authorized;
                        self.spawn_fetch_stats();
                    }
                    Err(e) => {
                        error!(error = %e, "Refreshed identity token was unusable");
                        self.ask_relogin(MSG_SESSION_EXPIRED);
                    }
                }
            }
            NetEvent::RefreshDone(Err(e)) => {
                error!(error = %e, "Token refresh failed");
                self.ask_relogin(MSG_SESSION_EXPIRED);
            }

            NetEvent::LogoutDone(Ok(_)) => debug!("Server acknowledged logout"),
            NetEvent::LogoutDone(Err(e)) => {
                // Local state is already cleared; nothing to recover
                warn!(error = %e, "Server logout failed");
            }

            NetEvent::StatsFetched(Ok(stats)) => {
                self.stats = stats;
                self.stats_loaded = true;
            }
            NetEvent::StatsFetched(Err(e)) => self.report_network_error(&e),

            NetEvent::StatsUpdated(Ok(())) => self.spawn_fetch_stats(),
            NetEvent::StatsUpdated(Err(e)) => {
                self.report_network_error(&e);
                // The local bump was optimistic; pull the server's counters
                // back so the display converges
                self.spawn_fetch_stats();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Validator tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("a@b.com"), None);
        assert_eq!(validate_email("  a@b.com  "), None);
        assert!(validate_email("").is_some());
        assert!(validate_email("no-at-sign").is_some());
        assert!(validate_email("@b.com").is_some());
        assert!(validate_email("a@nodot").is_some());
        assert!(validate_email("a@.com").is_some());
        assert!(validate_email("a@b.com.").is_some());
    }

    #[test]
    fn test_validate_password() {
        assert_eq!(validate_password("secret1"), None);
        assert_eq!(
            validate_password("").as_deref(),
            Some("Password is required")
        );
        assert_eq!(
            validate_password("short").as_deref(),
            Some("Password must be at least 6 characters")
        );
    }

    #[test]
    fn test_validate_confirm_password() {
        assert_eq!(validate_confirm_password("secret1", "secret1"), None);
        assert!(validate_confirm_password("secret1", "").is_some());
        assert_eq!(
            validate_confirm_password("secret1", "secret2").as_deref(),
            Some("Passwords must match")
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("Ada"), None);
        assert!(validate_name("").is_some());
        assert!(validate_name("   ").is_some());
    }

    #[test]
    fn test_validate_confirmation_code() {
        assert_eq!(validate_confirmation_code("123456"), None);
        assert!(validate_confirmation_code("").is_some());
        assert!(validate_confirmation_code("12345").is_some());
        assert!(validate_confirmation_code("1234567").is_some());
        assert!(validate_confirmation_code("12345a").is_some());
    }

    #[test]
    fn test_can_add_field_char() {
        assert!(can_add_field_char(0, MAX_EMAIL_LENGTH, 'a'));
        assert!(can_add_field_char(MAX_PASSWORD_LENGTH - 1, MAX_PASSWORD_LENGTH, '!'));
        // At the limit
        assert!(!can_add_field_char(MAX_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, 'a'));
        // Control characters rejected
        assert!(!can_add_field_char(0, MAX_EMAIL_LENGTH, '\x00'));
        assert!(!can_add_field_char(0, MAX_EMAIL_LENGTH, '\n'));
    }

    #[test]
    fn test_can_add_code_char() {
        assert!(can_add_code_char(0, '1'));
        assert!(can_add_code_char(5, '9'));
        assert!(!can_add_code_char(6, '1')); // full
        assert!(!can_add_code_char(0, 'a')); // non-digit
    }

    // -------------------------------------------------------------------------
    // Focus cycling tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_focus_cycles() {
        assert_eq!(LoginField::Email.next(), LoginField::Password);
        assert_eq!(LoginField::Password.next(), LoginField::Submit);
        assert_eq!(LoginField::Submit.next(), LoginField::Email); // wraps
        assert_eq!(LoginField::Email.prev(), LoginField::Submit); // wraps
    }

    #[test]
    fn test_signup_focus_cycles() {
        let mut field = SignupField::Name;
        for _ in 0..5 {
            field = field.next();
        }
        assert_eq!(field, SignupField::Name); // full cycle
        assert_eq!(SignupField::Name.prev(), SignupField::Submit);
    }

    // -------------------------------------------------------------------------
    // Flow driver tests: guard transitions and network event handling
    // -------------------------------------------------------------------------

    use crate::auth::claims::testutil::unsigned_token;
    use crate::auth::tokens::MemoryTokenRepository;

    const FUTURE_EXP: i64 = 4_000_000_000;
    const PAST_EXP: i64 = 1_000_000;

    fn tokens_for(email: &str, exp: i64) -> TokenSet {
        TokenSet {
            id_token: unsigned_token(email, "Ada", exp),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    /// App wired to an in-memory token repository and a dead endpoint, with
    /// anything it persists (last_email) redirected away from the real
    /// config directory.
    fn test_app(repository: MemoryTokenRepository) -> App {
        let dir = std::env::temp_dir().join("tictac-tui-app-tests");
        std::env::set_var("XDG_CONFIG_HOME", dir.join("config"));
        std::env::set_var("XDG_CACHE_HOME", dir.join("cache"));

        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let session = SessionStore::new(Box::new(repository));
        App::with_parts(Config::default(), api, session)
    }

    #[tokio::test]
    async fn test_enter_game_without_session_redirects_to_login() {
        let mut app = test_app(MemoryTokenRepository::new());
        app.enter_game();

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.guard_state, GuardState::Unauthorized);
        let toast = app.toasts.iter().last().unwrap();
        assert_eq!(toast.message, MSG_UNAUTHORIZED);
        // No network task was started
        assert!(app.net_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enter_game_with_valid_token_authorizes() {
        let repo = MemoryTokenRepository::with_tokens(tokens_for("a@b.com", FUTURE_EXP));
        let mut app = test_app(repo);
        app.enter_game();

        assert_eq!(app.screen, Screen::Game);
        assert_eq!(app.guard_state, GuardState::Authorized);
    }

    #[tokio::test]
    async fn test_enter_game_with_expired_token_starts_single_refresh() {
        let repo = MemoryTokenRepository::with_tokens(tokens_for("a@b.com", PAST_EXP));
        let mut app = test_app(repo);
        app.enter_game();

        // The board stays gated behind Refreshing until the result lands
        assert_eq!(app.screen, Screen::Game);
        assert_eq!(app.guard_state, GuardState::Refreshing);

        // Exactly one refresh is in flight, and nothing else
        let event = app.net_rx.recv().await.unwrap();
        assert!(matches!(event, NetEvent::RefreshDone(_)));
        assert!(app.net_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_refresh_success_authorizes_and_persists() {
        let repo = MemoryTokenRepository::with_tokens(tokens_for("a@b.com", PAST_EXP));
        let mut app = test_app(repo);
        app.enter_game();
        assert_eq!(app.guard_state, GuardState::Refreshing);

        let new_id = unsigned_token("a@b.com", "Ada", FUTURE_EXP);
        app.handle_net_event(NetEvent::RefreshDone(Ok(RefreshedTokens {
            id_token: new_id.clone(),
            access_token: "access2".to_string(),
        })));

        assert_eq!(app.guard_state, GuardState::Authorized);
        let tokens = app.session.tokens().unwrap().unwrap();
        assert_eq!(tokens.id_token, new_id);
        assert_eq!(tokens.access_token, "access2");
        assert_eq!(tokens.refresh_token, "refresh"); // reused, not rotated
    }

    #[tokio::test]
    async fn test_refresh_failure_redirects_with_expired_message() {
        let repo = MemoryTokenRepository::with_tokens(tokens_for("a@b.com", PAST_EXP));
        let mut app = test_app(repo);
        app.enter_game();

        app.handle_net_event(NetEvent::RefreshDone(Err(anyhow::anyhow!("refused"))));

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.guard_state, GuardState::Unauthorized);
        let toast = app.toasts.iter().last().unwrap();
        assert_eq!(toast.message, MSG_SESSION_EXPIRED);
    }

    #[tokio::test]
    async fn test_login_success_persists_tokens_and_enters_game() {
        let mut app = test_app(MemoryTokenRepository::new());
        app.goto_login();
        app.login_pending = true;

        app.handle_net_event(NetEvent::LoginDone(Ok(tokens_for("a@b.com", FUTURE_EXP))));

        assert_eq!(app.screen, Screen::Game);
        assert_eq!(app.guard_state, GuardState::Authorized);
        assert!(!app.login_pending);
        assert!(app.session.tokens().unwrap().is_some());
        assert_eq!(app.config.last_email.as_deref(), Some("a@b.com"));
        let toast = app.toasts.iter().next().unwrap();
        assert_eq!(toast.message, "Login Successful!");
    }

    #[tokio::test]
    async fn test_login_failure_stays_on_login_without_tokens() {
        let mut app = test_app(MemoryTokenRepository::new());
        app.goto_login();
        app.login_pending = true;

        app.handle_net_event(NetEvent::LoginDone(Err(anyhow::anyhow!("bad credentials"))));

        assert_eq!(app.screen, Screen::Login);
        assert!(!app.login_pending);
        assert!(app.session.tokens().unwrap().is_none());
        let toast = app.toasts.iter().last().unwrap();
        assert_eq!(toast.message, MSG_LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_verify_success_logs_in_with_stashed_credentials() {
        let mut app = test_app(MemoryTokenRepository::new());
        app.signup_email = "a@b.com".to_string();
        app.signup_password = "secret1".to_string();

        app.handle_net_event(NetEvent::SignupDone(Ok(true)));
        assert_eq!(app.screen, Screen::Verify);

        app.handle_net_event(NetEvent::VerifyDone(Ok("confirmed".to_string())));
        assert!(app.login_pending);
        let event = app.net_rx.recv().await.unwrap();
        assert!(matches!(event, NetEvent::LoginDone(_)));
    }

    #[tokio::test]
    async fn test_stats_update_failure_resyncs_from_server() {
        let repo = MemoryTokenRepository::with_tokens(tokens_for("a@b.com", FUTURE_EXP));
        let mut app = test_app(repo);
        app.enter_game();
        let _ = app.net_rx.recv().await; // entry stats fetch settles

        // Optimistic bump, then the update call fails
        app.stats.player_x_wins = 1;
        app.handle_net_event(NetEvent::StatsUpdated(Err(anyhow::anyhow!("refused"))));

        // A re-fetch was started; its result replaces the bumped counters
        let event = app.net_rx.recv().await.unwrap();
        assert!(matches!(event, NetEvent::StatsFetched(_)));
        app.handle_net_event(NetEvent::StatsFetched(Ok(GameStats::default())));
        assert_eq!(app.stats.player_x_wins, 0);
    }
}
