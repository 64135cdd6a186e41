use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::GeminiClient;
use crate::chat::conversation::{Conversation, Message, Sender};
use crate::chat::gateway::Generator;
use crate::config::GatewayConfig;
use crate::errors::{CliError, GenerationError};
use crate::parse::markup::format_message;

pub const GENERATION_ERROR_TEXT: &str = "Error in generation, please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Awaiting,
}

/// What happened to a submitted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty or whitespace-only input. Nothing changed.
    Blank,
    /// A request is already outstanding. Nothing changed.
    Busy,
    /// The user message was appended; the prompt must now go to the generator.
    Dispatched(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessageAppended(Message),
    ErrorsCleared(usize),
    StateChanged(ChatState),
}

/// Whether the send affordance is enabled.
pub fn can_submit(input: &str, state: ChatState) -> bool {
    !input.trim().is_empty() && state == ChatState::Idle
}

pub struct ChatController {
    generator: Arc<dyn Generator>,
    conversation: Conversation,
    state: ChatState,
    subscribers: Vec<mpsc::UnboundedSender<ChatEvent>>,
    dispatched_at: Option<Instant>,
}

impl ChatController {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            conversation: Conversation::new(),
            state: ChatState::Idle,
            subscribers: Vec::new(),
            dispatched_at: None,
        }
    }

    pub fn from_config(config: GatewayConfig) -> Result<Self, CliError> {
        let client = GeminiClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn generator(&self) -> Arc<dyn Generator> {
        Arc::clone(&self.generator)
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == ChatState::Awaiting
    }

    pub fn can_submit(&self, input: &str) -> bool {
        can_submit(input, self.state)
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChatEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn submit(&mut self, text: &str) -> Submission {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Submission::Blank;
        }
        if self.state == ChatState::Awaiting {
            debug!("submit ignored while a request is outstanding");
            return Submission::Busy;
        }

        let appended = self.conversation.push(Sender::User, prompt).clone();
        self.notify(ChatEvent::MessageAppended(appended));
        self.set_state(ChatState::Awaiting);
        self.dispatched_at = Some(Instant::now());
        info!(
            chars = prompt.chars().count(),
            pending_errors = self.conversation.error_count(),
            "prompt dispatched"
        );
        Submission::Dispatched(prompt.to_string())
    }

    pub fn resolve(&mut self, outcome: Result<String, GenerationError>) {
        if self.state != ChatState::Awaiting {
            warn!("generation outcome arrived with no request outstanding; ignored");
            return;
        }
        let elapsed_ms = self
            .dispatched_at
            .take()
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or_default();

        match outcome {
            Ok(raw) => {
                info!(elapsed_ms, chars = raw.chars().count(), "generation succeeded");
                let appended = self
                    .conversation
                    .push(Sender::System, format_message(&raw))
                    .clone();
                self.notify(ChatEvent::MessageAppended(appended));
                let cleared = self.conversation.drop_errors();
                if cleared > 0 {
                    self.notify(ChatEvent::ErrorsCleared(cleared));
                }
            }
            Err(err) => {
                warn!(elapsed_ms, cause = err.detail(), "generation failed");
                let appended = self
                    .conversation
                    .push(Sender::Error, GENERATION_ERROR_TEXT)
                    .clone();
                self.notify(ChatEvent::MessageAppended(appended));
            }
        }
        self.set_state(ChatState::Idle);
    }

    /// Submit, wait for the generator, and resolve in one go.
    pub async fn exchange(&mut self, text: &str) -> Submission {
        let submission = self.submit(text);
        if let Submission::Dispatched(prompt) = &submission {
            let generator = self.generator();
            let outcome = generator.complete(prompt).await;
            self.resolve(outcome);
        }
        submission
    }

    fn set_state(&mut self, state: ChatState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.notify(ChatEvent::StateChanged(state));
    }

    fn notify(&mut self, event: ChatEvent) {
        if let ChatEvent::MessageAppended(m) = &event {
            debug!(
                id = m.id.0,
                sender = m.sender.as_str(),
                total = self.conversation.len(),
                "message appended"
            );
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{Scripted, fail, ok};

    fn summary(controller: &ChatController) -> Vec<(Sender, String)> {
        controller
            .messages()
            .iter()
            .map(|m| (m.sender, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn successful_exchange_appends_formatted_reply() {
        let script = Scripted::with(vec![ok("## Hi\nWelcome")]);
        let mut controller = ChatController::new(script.clone());

        let submission = controller.exchange("hello").await;

        assert_eq!(submission, Submission::Dispatched("hello".to_string()));
        assert_eq!(
            summary(&controller),
            vec![
                (Sender::User, "hello".to_string()),
                (Sender::System, "<h2>Hi</h2><br/>Welcome".to_string()),
            ]
        );
        assert_eq!(controller.state(), ChatState::Idle);
        assert_eq!(script.prompts(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn failed_exchange_appends_error_bubble() {
        let mut controller = ChatController::new(Scripted::with(vec![fail()]));

        controller.exchange("hello").await;

        assert_eq!(
            summary(&controller),
            vec![
                (Sender::User, "hello".to_string()),
                (Sender::Error, GENERATION_ERROR_TEXT.to_string()),
            ]
        );
        assert_eq!(controller.state(), ChatState::Idle);
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let script = Scripted::with(vec![ok("unused")]);
        let mut controller = ChatController::new(script.clone());

        assert_eq!(controller.exchange("").await, Submission::Blank);
        assert_eq!(controller.exchange("  \n\t ").await, Submission::Blank);

        assert!(controller.messages().is_empty());
        assert_eq!(controller.state(), ChatState::Idle);
        assert!(script.prompts().is_empty());
    }

    #[tokio::test]
    async fn prompt_is_trimmed_before_sending() {
        let script = Scripted::with(vec![ok("ok")]);
        let mut controller = ChatController::new(script.clone());

        controller.exchange("  what is rust?\n").await;

        assert_eq!(script.prompts(), vec!["what is rust?".to_string()]);
        assert_eq!(controller.messages()[0].content, "what is rust?");
    }

    #[tokio::test]
    async fn success_removes_every_prior_error() {
        let script = Scripted::with(vec![fail(), fail(), ok("fine"), fail(), ok("again")]);
        let mut controller = ChatController::new(script);

        controller.exchange("one").await;
        controller.exchange("two").await;
        assert_eq!(controller.conversation.error_count(), 2);

        controller.exchange("three").await;
        assert_eq!(controller.conversation.error_count(), 0);

        controller.exchange("four").await;
        assert_eq!(controller.conversation.error_count(), 1);
        assert_eq!(controller.messages().last().map(|m| m.sender), Some(Sender::Error));

        controller.exchange("five").await;
        assert_eq!(controller.conversation.error_count(), 0);

        let users: Vec<&str> = controller
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::User)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(users, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn second_submit_while_awaiting_is_rejected() {
        let mut controller = ChatController::new(Scripted::with(vec![]));

        assert_eq!(
            controller.submit("first"),
            Submission::Dispatched("first".to_string())
        );
        assert!(controller.is_busy());
        assert_eq!(controller.submit("second"), Submission::Busy);
        assert_eq!(controller.messages().len(), 1);

        controller.resolve(ok("done"));
        assert_eq!(controller.state(), ChatState::Idle);
        assert_eq!(controller.messages().len(), 2);
    }

    #[test]
    fn stray_outcome_is_ignored_when_idle() {
        let mut controller = ChatController::new(Scripted::with(vec![]));
        controller.resolve(ok("nobody asked"));
        controller.resolve(fail());
        assert!(controller.messages().is_empty());
        assert_eq!(controller.state(), ChatState::Idle);
    }

    #[test]
    fn subscribers_see_events_in_order() {
        let mut controller = ChatController::new(Scripted::with(vec![]));
        let mut rx = controller.subscribe();

        controller.submit("hello");
        controller.resolve(fail());
        controller.submit("again");
        controller.resolve(ok("**yes**"));

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }

        let kinds: Vec<String> = events
            .iter()
            .map(|ev| match ev {
                ChatEvent::MessageAppended(m) => format!("append:{}", m.sender.as_str()),
                ChatEvent::ErrorsCleared(n) => format!("cleared:{n}"),
                ChatEvent::StateChanged(s) => format!("state:{s:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "append:user",
                "state:Awaiting",
                "append:error",
                "state:Idle",
                "append:user",
                "state:Awaiting",
                "append:system",
                "cleared:1",
                "state:Idle",
            ]
        );
        match &events[6] {
            ChatEvent::MessageAppended(m) => assert_eq!(m.content, "<strong>yes</strong>"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut controller = ChatController::new(Scripted::with(vec![]));
        let rx = controller.subscribe();
        let mut kept = controller.subscribe();
        drop(rx);

        controller.submit("hi");

        assert_eq!(controller.subscribers.len(), 1);
        assert!(matches!(
            kept.try_recv(),
            Ok(ChatEvent::MessageAppended(_))
        ));
    }

    #[test]
    fn send_affordance_tracks_input_and_state() {
        let cases = [
            ("", ChatState::Idle, false),
            ("   ", ChatState::Idle, false),
            ("\n\t", ChatState::Idle, false),
            ("hi", ChatState::Idle, true),
            ("  hi  ", ChatState::Idle, true),
            ("hi", ChatState::Awaiting, false),
            ("", ChatState::Awaiting, false),
        ];
        for (input, state, expected) in cases {
            assert_eq!(can_submit(input, state), expected, "{input:?} {state:?}");
        }
    }

    #[test]
    fn controller_gate_follows_its_own_state() {
        let mut controller = ChatController::new(Scripted::with(vec![]));
        assert!(controller.can_submit("x"));
        controller.submit("x");
        assert!(!controller.can_submit("y"));
        controller.resolve(ok("z"));
        assert!(controller.can_submit("y"));
    }
}
