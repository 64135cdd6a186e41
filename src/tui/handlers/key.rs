// Keyboard handling for the chat screen.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::chat::Submission;
use crate::tui::types::{App, Mode, TuiMsg};

use super::async_ops::spawn_generation;

pub fn handle_event(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(tx, app, key),
        Event::Paste(text) => {
            for ch in text.chars() {
                insert_char(app, ch);
            }
        }
        _ => {}
    }
}

pub fn handle_key(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.mode == Mode::Help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('q')) {
            app.mode = Mode::Chat;
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::F(1) => app.mode = Mode::Help,
        KeyCode::Char('n') if ctrl => app.reload(),
        KeyCode::Char('l') if ctrl => {
            app.status = "Log in is not available.".to_string();
        }
        KeyCode::PageUp => app.scroll_from_bottom = app.scroll_from_bottom.saturating_add(5),
        KeyCode::PageDown => app.scroll_from_bottom = app.scroll_from_bottom.saturating_sub(5),
        KeyCode::Enter if alt => insert_char(app, '\n'),
        KeyCode::Enter => submit(tx, app),
        KeyCode::Backspace => {
            if app.cursor > 0 && app.cursor <= app.input.len() {
                app.cursor -= 1;
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.len() {
                app.input.remove(app.cursor);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => app.cursor = (app.cursor + 1).min(app.input.len()),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.len(),
        KeyCode::Char(ch) => {
            if ctrl {
                return;
            }
            insert_char(app, ch);
        }
        _ => {}
    }
}

fn insert_char(app: &mut App, ch: char) {
    let ch = if ch == '\r' { '\n' } else { ch };
    if app.cursor > app.input.len() {
        app.cursor = app.input.len();
    }
    app.input.insert(app.cursor, ch);
    app.cursor += 1;
}

fn submit(tx: &mpsc::UnboundedSender<TuiMsg>, app: &mut App) {
    if !app.can_send() {
        return;
    }
    let text = app.input_text();
    match app.controller.submit(&text) {
        Submission::Dispatched(prompt) => {
            app.clear_input();
            spawn_generation(app.controller.generator(), tx.clone(), app.session, prompt);
        }
        Submission::Blank | Submission::Busy => {}
    }
}
