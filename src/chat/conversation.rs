use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
    Error,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::System => "system",
            Sender::Error => "error",
        }
    }
}

/// One chat bubble. System content is an HTML fragment, the others are plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub content: String,
}

/// The ordered message sequence of one session.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sender: Sender, content: impl Into<String>) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: MessageId(self.next_id),
            sender,
            content: content.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Removes every error bubble, returning how many went away.
    pub fn drop_errors(&mut self) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| m.sender != Sender::Error);
        before - self.messages.len()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_in_append_order() {
        let mut conv = Conversation::new();
        let a = conv.push(Sender::User, "a").id;
        let b = conv.push(Sender::System, "b").id;
        let c = conv.push(Sender::Error, "c").id;
        assert!(a < b && b < c);
        assert_eq!(conv.len(), 3);
    }

    #[test]
    fn new_conversation_is_empty() {
        let mut conv = Conversation::new();
        assert!(conv.is_empty());
        assert_eq!(conv.len(), 0);
        assert_eq!(conv.error_count(), 0);
        conv.push(Sender::User, "hi");
        assert!(!conv.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_errors_are_dropped() {
        let mut conv = Conversation::new();
        conv.push(Sender::User, "hi");
        let err = conv.push(Sender::Error, "boom").id;
        assert_eq!(conv.drop_errors(), 1);
        let next = conv.push(Sender::System, "ok").id;
        assert!(next > err);
    }

    #[test]
    fn drop_errors_keeps_order_of_the_rest() {
        let mut conv = Conversation::new();
        conv.push(Sender::User, "1");
        conv.push(Sender::Error, "x");
        conv.push(Sender::User, "2");
        conv.push(Sender::Error, "y");
        assert_eq!(conv.error_count(), 2);
        assert_eq!(conv.drop_errors(), 2);
        assert_eq!(conv.error_count(), 0);
        assert_eq!(conv.len(), 2);
        let contents: Vec<&str> = conv.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["1", "2"]);
        assert_eq!(conv.drop_errors(), 0);
    }

    #[test]
    fn sender_serializes_lowercase() {
        let mut conv = Conversation::new();
        conv.push(Sender::Error, "e");
        let json = serde_json::to_value(conv.messages()).unwrap();
        assert_eq!(json[0]["sender"], "error");
        assert_eq!(json[0]["id"], 1);
    }
}
