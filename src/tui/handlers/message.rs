// Applies results of background work to the app state.

use tracing::debug;

use crate::tui::types::{App, TuiMsg};

pub fn handle_tui_msg(app: &mut App, msg: TuiMsg) {
    match msg {
        TuiMsg::Generated { session, outcome } => {
            if session != app.session {
                debug!(session, current = app.session, "dropping outcome from a discarded chat");
                return;
            }
            app.controller.resolve(outcome);
        }
    }
}

/// Drains controller notifications into view state.
pub fn drain_chat_events(app: &mut App) {
    while let Ok(event) = app.events.try_recv() {
        app.on_chat_event(event);
    }
}
