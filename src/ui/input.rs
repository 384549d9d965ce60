//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_code_char, can_add_field_char, App, LoginField, Screen, SignupField,
    MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PASSWORD_LENGTH,
};
use crate::auth::guard::GuardState;

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Delete dismisses the oldest toast on any screen
    if key.code == KeyCode::Delete {
        app.dismiss_oldest_toast();
        return Ok(false);
    }

    match app.screen {
        Screen::Landing => handle_landing_input(app, key),
        Screen::Login => handle_login_input(app, key),
        Screen::Signup => handle_signup_input(app, key),
        Screen::Verify => handle_verify_input(app, key),
        Screen::Game => handle_game_input(app, key),
    }
}

fn handle_landing_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('l') => app.goto_login(),
        KeyCode::Char('s') => app.goto_signup(),
        KeyCode::Enter => {
            if app.session.claims().is_some() {
                app.enter_game();
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.goto_landing(),
        KeyCode::F(2) => app.goto_signup(),
        KeyCode::Tab | KeyCode::Down => app.login_focus = app.login_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => match app.login_focus {
            LoginField::Submit => app.submit_login(),
            _ => app.login_focus = app.login_focus.next(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginField::Email => {
                app.login_email.pop();
            }
            LoginField::Password => {
                app.login_password.pop();
            }
            LoginField::Submit => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginField::Email => {
                if can_add_field_char(app.login_email.len(), MAX_EMAIL_LENGTH, c) {
                    app.login_email.push(c);
                }
            }
            LoginField::Password => {
                if can_add_field_char(app.login_password.len(), MAX_PASSWORD_LENGTH, c) {
                    app.login_password.push(c);
                }
            }
            LoginField::Submit => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_signup_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.goto_landing(),
        KeyCode::F(2) => app.goto_login(),
        KeyCode::Tab | KeyCode::Down => app.signup_focus = app.signup_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.signup_focus = app.signup_focus.prev(),
        KeyCode::Enter => match app.signup_focus {
            SignupField::Submit => app.submit_signup(),
            _ => app.signup_focus = app.signup_focus.next(),
        },
        KeyCode::Backspace => {
            if let Some(field) = signup_field_mut(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let max_len = match app.signup_focus {
                SignupField::Name => MAX_NAME_LENGTH,
                SignupField::Email => MAX_EMAIL_LENGTH,
                SignupField::Password | SignupField::ConfirmPassword => MAX_PASSWORD_LENGTH,
                SignupField::Submit => 0,
            };
            if let Some(field) = signup_field_mut(app) {
                if can_add_field_char(field.len(), max_len, c) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
    Ok(false)
}

fn signup_field_mut(app: &mut App) -> Option<&mut String> {
    match app.signup_focus {
        SignupField::Name => Some(&mut app.signup_name),
        SignupField::Email => Some(&mut app.signup_email),
        SignupField::Password => Some(&mut app.signup_password),
        SignupField::ConfirmPassword => Some(&mut app.signup_confirm),
        SignupField::Submit => None,
    }
}

fn handle_verify_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.goto_signup(),
        KeyCode::Enter => app.submit_verify(),
        KeyCode::Backspace => {
            app.verify_code.pop();
        }
        KeyCode::Char(c) => {
            if can_add_code_char(app.verify_code.len(), c) {
                app.verify_code.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_game_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // The guard may still be refreshing or redirecting; the board only
    // accepts input once authorized.
    if app.guard_state != GuardState::Authorized {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            return Ok(true);
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') => return Ok(true),
        KeyCode::Char('r') => app.reset_game(),
        KeyCode::Char('l') => app.logout(),
        // Direct cell selection, keypad layout 1-9
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.cell_cursor = index;
            app.play_cell(index);
        }
        KeyCode::Left => {
            if app.cell_cursor % 3 > 0 {
                app.cell_cursor -= 1;
            }
        }
        KeyCode::Right => {
            if app.cell_cursor % 3 < 2 {
                app.cell_cursor += 1;
            }
        }
        KeyCode::Up => {
            if app.cell_cursor >= 3 {
                app.cell_cursor -= 3;
            }
        }
        KeyCode::Down => {
            if app.cell_cursor < 6 {
                app.cell_cursor += 3;
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => app.play_cell(app.cell_cursor),
        _ => {}
    }
    Ok(false)
}
