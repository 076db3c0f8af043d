//! Conversation session state.
//!
//! Owns the visible transcript and applies streamed reply events to it.
//! Application is single-owner: whoever drives the event stream calls
//! [`ChatSession::apply`] in arrival order from one execution context.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{ChatClient, EventStream, Message, Role, StreamEvent};

/// User-selected emotion attached to a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoodTag {
    Happy,
    Sad,
    Angry,
    Confused,
    Excited,
    Calm,
}

impl fmt::Display for MoodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Confused => "confused",
            Self::Excited => "excited",
            Self::Calm => "calm",
        };
        write!(f, "{name}")
    }
}

/// Opaque handle to one transcript message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One turn in the visible conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodTag>,
    pub timestamp: i64,
}

impl ConversationMessage {
    fn new(role: Role, content: impl Into<String>, mood: Option<MoodTag>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            mood,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn user(content: impl Into<String>, mood: Option<MoodTag>) -> Self {
        Self::new(Role::User, content, mood)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, None)
    }
}

/// Binds an in-flight reply stream to the transcript generation it was
/// started against. Events carrying a stale ticket are discarded, so a
/// stream that outlives a reset can never mutate the new conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTicket {
    generation: u64,
}

/// Outcome of applying one stream event to the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Delta appended to the open assistant message
    Appended,
    /// Delta opened a new assistant message
    Opened,
    /// The open assistant message was closed
    Finished,
    /// Event carries nothing for the transcript (audio, invalid payload)
    Ignored,
    /// Ticket predates the last reset; event discarded
    Stale,
}

/// A conversation backed by a streaming chat client
pub struct ChatSession {
    client: Arc<dyn ChatClient>,
    system_prompt: String,
    transcript: Vec<ConversationMessage>,
    /// At most one assistant message receives deltas at a time.
    open: Option<MessageId>,
    generation: u64,
    invalid_events: u64,
}

impl ChatSession {
    pub fn new(client: Arc<dyn ChatClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
            transcript: Vec::new(),
            open: None,
            generation: 0,
            invalid_events: 0,
        }
    }

    /// The visible conversation, oldest first.
    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    /// Count of undecodable events observed since the last reset.
    pub fn invalid_events(&self) -> u64 {
        self.invalid_events
    }

    /// Send a user message and open a reply stream.
    ///
    /// Returns `None` without touching the transcript or the network when
    /// the text trims to empty. Otherwise the user turn is appended first,
    /// so the transcript stays consistent even if the request then fails.
    pub fn send_message(
        &mut self,
        text: &str,
        mood: Option<MoodTag>,
    ) -> Option<(ReplyTicket, EventStream)> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        // A new user turn ends whatever reply was still open.
        self.open = None;
        self.transcript
            .push(ConversationMessage::user(trimmed, mood));

        let stream = self.client.stream(self.request_messages());
        let ticket = ReplyTicket {
            generation: self.generation,
        };
        Some((ticket, stream))
    }

    /// Apply one reply event to the transcript, in arrival order.
    pub fn apply(&mut self, ticket: &ReplyTicket, event: &StreamEvent) -> Applied {
        if ticket.generation != self.generation {
            tracing::debug!("Discarding event from a reset conversation");
            return Applied::Stale;
        }

        match event {
            StreamEvent::Delta(content) => {
                if let Some(id) = self.open
                    && let Some(message) = self.transcript.iter_mut().find(|m| m.id == id)
                {
                    message.content.push_str(content);
                    Applied::Appended
                } else {
                    let message = ConversationMessage::assistant(content.clone());
                    self.open = Some(message.id);
                    self.transcript.push(message);
                    Applied::Opened
                }
            }
            StreamEvent::Finish(reason) => {
                tracing::debug!(?reason, "Reply finished");
                self.open = None;
                Applied::Finished
            }
            StreamEvent::Audio(_) => Applied::Ignored,
            StreamEvent::Invalid { reason } => {
                tracing::warn!(reason = %reason, "Malformed stream event skipped");
                self.invalid_events += 1;
                Applied::Ignored
            }
        }
    }

    /// Close the open reply after its stream ends, even without a server
    /// finish reason.
    pub fn finish_reply(&mut self, ticket: &ReplyTicket) {
        if ticket.generation == self.generation {
            self.open = None;
        }
    }

    /// Start a new conversation: clears the transcript and invalidates
    /// every outstanding [`ReplyTicket`].
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.open = None;
        self.generation += 1;
        self.invalid_events = 0;
    }

    /// System prompt plus the full history, oldest first.
    fn request_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        for turn in &self.transcript {
            messages.push(Message {
                role: turn.role,
                content: turn.content.clone(),
            });
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::llm::{FinishReason, MockChatClient, MockStep};

    fn session_with(steps: Vec<MockStep>) -> ChatSession {
        let client = Arc::new(MockChatClient::from_steps("mock-model", steps));
        ChatSession::new(client, "be kind")
    }

    async fn drive(session: &mut ChatSession, text: &str) {
        let (ticket, mut stream) = session
            .send_message(text, None)
            .expect("message should open a stream");
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    session.apply(&ticket, &event);
                }
                Err(_) => break,
            }
        }
        session.finish_reply(&ticket);
    }

    #[tokio::test]
    async fn deltas_accumulate_into_one_assistant_message() {
        let mut session = session_with(vec![MockStep::deltas(vec!["Hi", " there"])]);

        drive(&mut session, "hello").await;

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "hello");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "Hi there");
    }

    #[tokio::test]
    async fn whitespace_only_input_is_a_noop() {
        let mut session = session_with(vec![]);

        assert!(session.send_message("   ", None).is_none());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn user_turn_survives_a_failed_request() {
        let mut session = session_with(vec![MockStep::error("boom")]);

        drive(&mut session, "hello").await;

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, Role::User);
    }

    #[tokio::test]
    async fn mood_tag_is_recorded_on_the_user_turn() {
        let mut session = session_with(vec![MockStep::text("ok")]);

        let (ticket, mut stream) = session
            .send_message("rough day", Some(MoodTag::Sad))
            .expect("message should open a stream");
        while let Some(Ok(event)) = stream.next().await {
            session.apply(&ticket, &event);
        }

        assert_eq!(session.transcript()[0].mood, Some(MoodTag::Sad));
    }

    #[tokio::test]
    async fn finish_closes_the_open_message() {
        let mut session = session_with(vec![]);
        let (ticket, _stream) = session
            .send_message("hello", None)
            .expect("message should open a stream");

        assert_eq!(
            session.apply(&ticket, &StreamEvent::Delta("a".to_string())),
            Applied::Opened
        );
        assert_eq!(
            session.apply(&ticket, &StreamEvent::Finish(FinishReason::Stop)),
            Applied::Finished
        );
        // A delta after finish starts a fresh assistant message.
        assert_eq!(
            session.apply(&ticket, &StreamEvent::Delta("b".to_string())),
            Applied::Opened
        );
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn reset_invalidates_in_flight_tickets() {
        let mut session = session_with(vec![]);
        let (ticket, _stream) = session
            .send_message("hello", None)
            .expect("message should open a stream");
        session.apply(&ticket, &StreamEvent::Delta("partial".to_string()));

        session.reset();
        assert!(session.transcript().is_empty());

        // Late chunks from the cancelled stream must not resurface.
        assert_eq!(
            session.apply(&ticket, &StreamEvent::Delta("late".to_string())),
            Applied::Stale
        );
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn invalid_events_are_counted_not_applied() {
        let mut session = session_with(vec![]);
        let (ticket, _stream) = session
            .send_message("hello", None)
            .expect("message should open a stream");

        session.apply(&ticket, &StreamEvent::Delta("ok".to_string()));
        session.apply(
            &ticket,
            &StreamEvent::Invalid {
                reason: "bad json".to_string(),
            },
        );
        session.apply(&ticket, &StreamEvent::Delta("!".to_string()));

        assert_eq!(session.invalid_events(), 1);
        assert_eq!(session.transcript()[1].content, "ok!");
    }

    #[tokio::test]
    async fn audio_events_leave_the_transcript_alone() {
        let mut session = session_with(vec![]);
        let (ticket, _stream) = session
            .send_message("hello", None)
            .expect("message should open a stream");

        assert_eq!(
            session.apply(&ticket, &StreamEvent::Audio(vec![1, 2, 3])),
            Applied::Ignored
        );
        assert_eq!(session.transcript().len(), 1);
    }
}
