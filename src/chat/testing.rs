// Scripted generator shared by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::chat::gateway::Generator;
use crate::errors::GenerationError;

#[derive(Default)]
pub struct Scripted {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn with(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for Scripted {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::new("script exhausted")))
    }
}

pub fn ok(text: &str) -> Result<String, GenerationError> {
    Ok(text.to_string())
}

pub fn fail() -> Result<String, GenerationError> {
    Err(GenerationError::new("status 500"))
}
