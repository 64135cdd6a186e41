// Background work for the TUI. Results come back as TuiMsg.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::chat::Generator;
use crate::tui::types::TuiMsg;

pub fn spawn_generation(
    generator: Arc<dyn Generator>,
    tx: mpsc::UnboundedSender<TuiMsg>,
    session: u64,
    prompt: String,
) {
    tokio::spawn(async move {
        let outcome = generator.complete(&prompt).await;
        let _ = tx.send(TuiMsg::Generated { session, outcome });
    });
}
