//! Conversation memory.
//!
//! A [`Conversation`] is an append-only log of role-tagged messages seeded
//! with one system message. A question/answer turn adds exactly two entries,
//! and [`PendingTurn`] makes that pair atomic: the user message is appended
//! when the turn begins and removed again unless the turn is committed with
//! an answer. Dropping the guard (error, timeout, a cancelled future) rolls
//! the log back to where it was.

use docchat_model::{Message, Role};

/// The ordered message log of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
    history_limit: Option<usize>,
}

impl Conversation {
    /// Start a conversation with a single system message.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self { messages: vec![Message::system(system_prompt)], history_limit: None }
    }

    /// Cap how many non-system messages are sent with each request.
    ///
    /// The log itself keeps growing; only the request window shrinks. A limit
    /// of zero is treated as one so the newest message is always sent.
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Append a message. No deduplication, no truncation.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Every message in append order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages, including the system message.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the system message is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything except the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// The messages to send to the backend.
    ///
    /// Without a history limit this is the whole log. With a limit it is the
    /// system message followed by at most `limit` of the most recent messages,
    /// trimmed so that the window opens on a user message.
    pub fn request_window(&self) -> Vec<Message> {
        let Some(limit) = self.history_limit else {
            return self.messages.clone();
        };

        let (system, rest) = self.messages.split_at(1);
        let start = rest.len().saturating_sub(limit.max(1));
        let tail = rest[start..].iter().skip_while(|m| m.role != Role::User);

        system.iter().chain(tail).cloned().collect()
    }

    /// Append `prompt` as a user message and return a guard for the turn.
    pub fn begin_turn(&mut self, prompt: impl Into<String>) -> PendingTurn<'_> {
        let checkpoint = self.messages.len();
        self.append(Role::User, prompt);
        PendingTurn { conversation: self, checkpoint, committed: false }
    }
}

/// A turn whose user message has been appended but whose answer is pending.
///
/// Call [`commit`](PendingTurn::commit) with the assistant reply to keep the
/// turn. If the guard is dropped without committing, the user message is
/// removed and the conversation is exactly as it was before the turn.
#[derive(Debug)]
pub struct PendingTurn<'a> {
    conversation: &'a mut Conversation,
    checkpoint: usize,
    committed: bool,
}

impl PendingTurn<'_> {
    /// The messages to send for this turn, ending with the new user message.
    pub fn request_messages(&self) -> Vec<Message> {
        self.conversation.request_window()
    }

    /// The user message this turn appended.
    pub fn prompt(&self) -> &str {
        &self.conversation.messages[self.checkpoint].content
    }

    /// Record the assistant reply and keep the turn.
    pub fn commit(mut self, answer: impl Into<String>) {
        self.conversation.append(Role::Assistant, answer);
        self.committed = true;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.conversation.messages.truncate(self.checkpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(conversation: &Conversation) -> Vec<Role> {
        conversation.snapshot().iter().map(|m| m.role).collect()
    }

    #[test]
    fn seeded_with_one_system_message() {
        let conversation = Conversation::new("You are a helpful assistant.");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.snapshot()[0], Message::system("You are a helpful assistant."));
    }

    #[test]
    fn committed_turn_adds_user_and_assistant() {
        let mut conversation = Conversation::new("sys");
        let turn = conversation.begin_turn("question?");
        assert_eq!(turn.prompt(), "question?");
        assert_eq!(turn.request_messages().len(), 2);
        turn.commit("answer");

        assert_eq!(roles(&conversation), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(conversation.snapshot()[2].content, "answer");
    }

    #[test]
    fn dropped_turn_rolls_back() {
        let mut conversation = Conversation::new("sys");
        conversation.begin_turn("first").commit("one");
        {
            let _turn = conversation.begin_turn("second");
        }
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.snapshot()[1].content, "first");
    }

    #[test]
    fn append_never_deduplicates() {
        let mut conversation = Conversation::new("sys");
        conversation.append(Role::User, "same");
        conversation.append(Role::User, "same");
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn unlimited_window_is_the_whole_log() {
        let mut conversation = Conversation::new("sys");
        for i in 0..5 {
            conversation.begin_turn(format!("q{i}")).commit(format!("a{i}"));
        }
        assert_eq!(conversation.request_window(), conversation.snapshot().to_vec());
    }

    #[test]
    fn limited_window_keeps_system_and_starts_on_user() {
        let mut conversation = Conversation::new("sys").with_history_limit(Some(4));
        for i in 0..5 {
            conversation.begin_turn(format!("q{i}")).commit(format!("a{i}"));
        }
        let turn = conversation.begin_turn("q5");
        let window = turn.request_messages();

        // The last four messages are a3, q4, a4, q5; a3 is trimmed.
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "q4", "a4", "q5"]);
        drop(turn);

        // The log itself is never truncated by the limit.
        assert_eq!(conversation.len(), 11);
    }

    #[test]
    fn reset_keeps_only_system_message() {
        let mut conversation = Conversation::new("sys");
        conversation.begin_turn("q").commit("a");
        conversation.reset();
        assert_eq!(roles(&conversation), vec![Role::System]);
    }
}
