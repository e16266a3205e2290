use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::HealthChecked { generation, status } => app.on_health_checked(generation, status),
        AppEvent::ChatFinished { id, outcome } => app.on_chat_finished(id, outcome),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // An open alert swallows the next key
    if app.alert.is_some() {
        app.dismiss_alert();
        return;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('l') => app.clear_chat(),
            KeyCode::Char('s') => app.toggle_settings(),
            KeyCode::Char('t') => app.check_connection(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),
        KeyCode::Esc => {
            if !app.cancel_request() && app.show_settings {
                app.toggle_settings();
            }
        }
        _ if app.show_settings => handle_settings_key(app, key),
        _ => handle_composer_key(app, key),
    }
}

fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.check_connection(),
        KeyCode::Backspace => {
            if app.url_cursor > 0 {
                app.url_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.url_input, app.url_cursor);
                app.url_input.remove(byte_pos);
                app.apply_url_input();
            }
        }
        KeyCode::Delete => {
            if app.url_cursor < app.url_input.chars().count() {
                let byte_pos = char_to_byte_index(&app.url_input, app.url_cursor);
                app.url_input.remove(byte_pos);
                app.apply_url_input();
            }
        }
        KeyCode::Left => {
            app.url_cursor = app.url_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.url_input.chars().count();
            app.url_cursor = (app.url_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.url_cursor = 0;
        }
        KeyCode::End => {
            app.url_cursor = app.url_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.url_input, app.url_cursor);
            app.url_input.insert(byte_pos, c);
            app.url_cursor += 1;
            app.apply_url_input();
        }
        _ => {}
    }
}

fn handle_composer_key(app: &mut App, key: KeyEvent) {
    // Transcript scrolling stays available while a reply is pending
    match key.code {
        KeyCode::Up => {
            app.scroll_up(1);
            return;
        }
        KeyCode::Down => {
            app.scroll_down(1);
            return;
        }
        _ => {}
    }

    // The composer is disabled while a request is in flight
    if app.session.is_loading() {
        return;
    }

    match key.code {
        KeyCode::Enter => {
            // Alt+Enter covers terminals that cannot report Shift+Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                insert_char(app, '\n');
            } else {
                app.send_message();
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
    app.input.insert(byte_pos, c);
    app.input_cursor += 1;
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);

    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.wheel_down(),
        MouseEventKind::ScrollUp => app.wheel_up(),
        _ => {}
    }
}
