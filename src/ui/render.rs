use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginField, Screen, SignupField};
use crate::auth::guard::GuardState;
use crate::game::Mark;

use super::styles;

/// Width of the text-input boxes on the auth forms.
const FIELD_WIDTH: usize = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    render_toasts(frame, app);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Tic Tac Toe";
    let greeting = match (app.screen, app.session.claims()) {
        (Screen::Game, Some(claims)) if !claims.name.is_empty() => {
            format!("Welcome, {} ", claims.name)
        }
        _ => String::new(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + greeting.len() + 2),
        )),
        Span::styled(greeting, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.screen {
        Screen::Landing => render_landing(frame, app, area),
        Screen::Login => render_login(frame, app, area),
        Screen::Signup => render_signup(frame, app, area),
        Screen::Verify => render_verify(frame, app, area),
        Screen::Game => render_game(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.screen {
        Screen::Landing => "[l]ogin | [s]ignup | [q]uit",
        Screen::Login | Screen::Signup | Screen::Verify => {
            "Tab/↑↓ move | Enter submit | Esc back"
        }
        Screen::Game => "1-9/arrows play | [r]eset | [l]ogout | [q]uit",
    };

    let line = Line::from(Span::styled(
        format!(" {} ", shortcuts),
        styles::muted_style(),
    ));
    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}

// ============================================================================
// Screens
// ============================================================================

fn render_landing(frame: &mut Frame, app: &App, area: Rect) {
    let logged_in = app.session.claims().is_some();

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("   ╔╦╗╦╔═╗  ╔╦╗╔═╗╔═╗  ╔╦╗╔═╗╔═╗", styles::title_style())),
        Line::from(Span::styled("    ║ ║║     ║ ╠═╣║     ║ ║ ║║╣ ", styles::title_style())),
        Line::from(Span::styled("    ╩ ╩╚═╝   ╩ ╩ ╩╚═╝   ╩ ╚═╝╚═╝", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   A two-player game with online win tracking",
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   [l] ", styles::help_key_style()),
            Span::styled("Login", styles::help_desc_style()),
        ]),
        Line::from(vec![
            Span::styled("   [s] ", styles::help_key_style()),
            Span::styled("Sign up", styles::help_desc_style()),
        ]),
    ];

    if logged_in {
        lines.push(Line::from(vec![
            Span::styled("   [Enter] ", styles::help_key_style()),
            Span::styled("Continue to game", styles::help_desc_style()),
        ]));
    }

    lines.push(Line::from(vec![
        Span::styled("   [q] ", styles::help_key_style()),
        Span::styled("Quit", styles::help_desc_style()),
    ]));

    frame.render_widget(Paragraph::new(lines), area);
}

/// One form input row: label, boxed value with a cursor when focused.
fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let shown: String = if masked {
        "*".repeat(value.chars().count().min(FIELD_WIDTH))
    } else {
        value.chars().rev().take(FIELD_WIDTH).collect::<Vec<_>>().into_iter().rev().collect()
    };
    let cursor = if focused { "▌" } else { "" };
    let value_style = if focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };

    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:>17}: [", label), styles::muted_style()),
        Span::styled(
            format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH),
            value_style,
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Inline validation error under a field, if any.
fn field_error_line(error: &Option<String>) -> Option<Line<'static>> {
    error.as_ref().map(|msg| {
        Line::from(vec![
            Span::raw("   "),
            Span::styled(format!("{:>19}{}", "", msg), styles::error_style()),
        ])
    })
}

fn submit_line(label: &str, focused: bool, pending: bool) -> Line<'static> {
    let text = if pending {
        format!("   {}...   ", label)
    } else if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    let style = if pending {
        styles::muted_style()
    } else if focused {
        styles::selected_style()
    } else {
        styles::field_style()
    };
    Line::from(vec![
        Span::raw("                    ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Login", styles::title_style())),
        Line::from(""),
        field_line("Email", &app.login_email, app.login_focus == LoginField::Email, false),
    ];
    if let Some(line) = field_error_line(&app.login_errors.email) {
        lines.push(line);
    }
    lines.push(field_line(
        "Password",
        &app.login_password,
        app.login_focus == LoginField::Password,
        true,
    ));
    if let Some(line) = field_error_line(&app.login_errors.password) {
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(submit_line(
        "Login",
        app.login_focus == LoginField::Submit,
        app.login_pending,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "   New here? Press [F2] to sign up instead.",
        styles::muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_signup(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Sign Up", styles::title_style())),
        Line::from(""),
        field_line("Name", &app.signup_name, app.signup_focus == SignupField::Name, false),
    ];
    if let Some(line) = field_error_line(&app.signup_errors.name) {
        lines.push(line);
    }
    lines.push(field_line(
        "Email",
        &app.signup_email,
        app.signup_focus == SignupField::Email,
        false,
    ));
    if let Some(line) = field_error_line(&app.signup_errors.email) {
        lines.push(line);
    }
    lines.push(field_line(
        "Password",
        &app.signup_password,
        app.signup_focus == SignupField::Password,
        true,
    ));
    if let Some(line) = field_error_line(&app.signup_errors.password) {
        lines.push(line);
    }
    lines.push(field_line(
        "Confirm password",
        &app.signup_confirm,
        app.signup_focus == SignupField::ConfirmPassword,
        true,
    ));
    if let Some(line) = field_error_line(&app.signup_errors.confirm_password) {
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(submit_line(
        "Sign Up",
        app.signup_focus == SignupField::Submit,
        app.signup_pending,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "   Already registered? Press [F2] to login.",
        styles::muted_style(),
    )));

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_verify(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("   Verify your account", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   Enter the 6-digit code sent to your email.",
            styles::muted_style(),
        )),
        Line::from(""),
        field_line("Code", &app.verify_code, true, false),
    ];
    if let Some(line) = field_error_line(&app.verify_error) {
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(submit_line("Verify", true, app.verify_pending));

    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Game screen
// ============================================================================

fn mark_span(mark: Option<Mark>, selected: bool) -> Span<'static> {
    let text = match mark {
        Some(Mark::X) => " X ",
        Some(Mark::O) => " O ",
        None => "   ",
    };
    let style = if selected {
        styles::selected_style()
    } else {
        match mark {
            Some(Mark::X) => styles::mark_x_style(),
            Some(Mark::O) => styles::mark_o_style(),
            None => styles::muted_style(),
        }
    };
    Span::styled(text, style)
}

fn render_game(frame: &mut Frame, app: &App, area: Rect) {
    // The board is only rendered once the session guard authorizes it.
    match app.guard_state {
        GuardState::Authorized => {}
        GuardState::Refreshing => {
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    "   Refreshing session...",
                    styles::muted_style(),
                )),
            ];
            frame.render_widget(Paragraph::new(lines), area);
            return;
        }
        GuardState::Checking | GuardState::Unauthorized => {
            frame.render_widget(Paragraph::new(""), area);
            return;
        }
    }

    let status = match app.board.winner() {
        Some(winner) => format!("Winner: {}", winner),
        None if app.board.is_full() => "Cat's game! Press [r] to play again.".to_string(),
        None => format!("Next Player: {}", app.board.next_mark()),
    };

    let stats = if app.stats_loaded {
        format!(
            "X wins: {}   O wins: {}",
            app.stats.player_x_wins, app.stats.player_o_wins
        )
    } else {
        "Loading stats...".to_string()
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("   "),
            Span::styled(status, styles::highlight_style()),
        ]),
        Line::from(""),
    ];

    for row in 0..3 {
        let mut spans = vec![Span::raw("   ")];
        for col in 0..3 {
            let index = row * 3 + col;
            spans.push(mark_span(app.board.cell(index), index == app.cell_cursor));
            if col < 2 {
                spans.push(Span::styled("│", styles::muted_style()));
            }
        }
        lines.push(Line::from(spans));
        if row < 2 {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled("───┼───┼───", styles::muted_style()),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled(stats, styles::muted_style()),
    ]));

    if app.board.is_terminal() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("   "),
            Span::styled("Press ", styles::muted_style()),
            Span::styled("[r]", styles::help_key_style()),
            Span::styled(" for a new game", styles::muted_style()),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

// ============================================================================
// Toast overlay
// ============================================================================

fn render_toasts(frame: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }

    let frame_area = frame.area();
    let mut y = frame_area.y;

    for toast in app.toasts.iter() {
        let width = (toast.message.len() as u16 + 4).min(frame_area.width);
        let area = Rect::new(
            frame_area.x + frame_area.width.saturating_sub(width),
            y,
            width,
            3,
        );
        if area.bottom() > frame_area.bottom() {
            break;
        }

        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::toast_style(toast.severity));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", toast.message),
            styles::toast_style(toast.severity),
        )))
        .block(block);
        frame.render_widget(paragraph, area);

        y += 3;
    }
}
