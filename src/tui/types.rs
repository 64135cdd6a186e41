// TUI state types.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::chat::{ChatController, ChatEvent, ChatState};
use crate::config::API_KEY_ENV;
use crate::errors::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Help,
}

pub struct App {
    pub mode: Mode,
    pub should_quit: bool,

    pub controller: ChatController,
    pub events: mpsc::UnboundedReceiver<ChatEvent>,
    /// Bumped on every reload so late outcomes from a discarded session are dropped.
    pub session: u64,

    pub key_present: bool,
    pub model: &'static str,
    pub spinner_step: u64,
    pub spinner_last: Instant,

    pub input: Vec<char>,
    pub cursor: usize,

    pub status: String,
    pub scroll_from_bottom: usize,
}

impl App {
    pub fn new(mut controller: ChatController, key_present: bool, model: &'static str) -> Self {
        let events = controller.subscribe();
        Self {
            mode: Mode::Chat,
            should_quit: false,
            controller,
            events,
            session: 0,
            key_present,
            model,
            spinner_step: 0,
            spinner_last: Instant::now(),
            input: Vec::new(),
            cursor: 0,
            status: ready_status(key_present),
            scroll_from_bottom: 0,
        }
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    /// Send affordance: non-blank input and no request outstanding.
    pub fn can_send(&self) -> bool {
        self.controller.can_submit(&self.input_text())
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    /// Discards the whole session, like reloading the page.
    pub fn reload(&mut self) {
        let mut controller = ChatController::new(self.controller.generator());
        self.events = controller.subscribe();
        self.controller = controller;
        self.session = self.session.wrapping_add(1);
        self.clear_input();
        self.scroll_from_bottom = 0;
        self.status = "New chat.".to_string();
    }

    pub fn on_chat_event(&mut self, event: ChatEvent) {
        // Any change jumps back to the newest entry.
        self.scroll_from_bottom = 0;
        match event {
            ChatEvent::MessageAppended(_) | ChatEvent::ErrorsCleared(_) => {}
            ChatEvent::StateChanged(ChatState::Awaiting) => {
                self.spinner_step = 0;
                self.spinner_last = Instant::now();
                self.status = "Waiting for Gemini...".to_string();
            }
            ChatEvent::StateChanged(ChatState::Idle) => {
                self.status = ready_status(self.key_present);
            }
        }
    }
}

pub fn ready_status(key_present: bool) -> String {
    if key_present {
        return "Ready.".to_string();
    }
    format!("Ready. {API_KEY_ENV} is not set; requests will fail.")
}

#[derive(Debug)]
pub enum TuiMsg {
    Generated {
        session: u64,
        outcome: Result<String, GenerationError>,
    },
}
