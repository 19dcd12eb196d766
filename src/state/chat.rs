//! Conversational session state: transcript, pending input, request phase.
//!
//! DESIGN
//! ======
//! `ChatState` is a synchronous state machine with phases `Idle`,
//! `Awaiting`, and `Errored`. A question can only be started from `Idle`
//! or `Errored`; `begin_submit` refuses while `Awaiting`, so at most one
//! request exists at a time regardless of what the UI disables.
//!
//! The user message is echoed into the transcript before the request is
//! sent and is never rolled back. A failed answer shows up as the error
//! banner, not as a missing question.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use crate::error::{ClientError, ValidationError, too_long};
use crate::net::types::ChatReply;

/// Limit in UTF-16 code units, the unit browsers count input length in.
pub const MAX_QUESTION_CHARS: usize = 500;
pub const WELCOME_MESSAGE: &str =
    "Hi! Summarize some text, a URL, or upload a PDF, and I can answer your questions about it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub source: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), source: None }
    }

    pub fn bot(content: impl Into<String>, source: Option<String>) -> Self {
        Self { role: Role::Bot, content: content.into(), source }
    }

    fn welcome() -> Self {
        Self::bot(WELCOME_MESSAGE, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Awaiting,
    Errored(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    messages: Vec<Message>,
    pending_input: String,
    phase: Phase,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    /// Empty transcript; call [`ChatState::initialize`] to seed it.
    #[must_use]
    pub fn new() -> Self {
        Self { messages: Vec::new(), pending_input: String::new(), phase: Phase::Idle }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.phase == Phase::Awaiting
    }

    /// Banner text for the current failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        match &self.phase {
            Phase::Errored(err) => Some(err.user_message()),
            Phase::Idle | Phase::Awaiting => None,
        }
    }

    /// Seed the welcome message if the transcript is empty. Idempotent.
    pub fn initialize(&mut self) {
        if self.messages.is_empty() {
            self.messages.push(Message::welcome());
        }
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Validate `text` and move to `Awaiting`, echoing the user message.
    /// Returns the question to send.
    ///
    /// # Errors
    ///
    /// - `Validation(Empty)`: no state change.
    /// - `Busy`: a request is already awaiting; no state change.
    /// - `Validation(TooLong)`: recorded as the current error; input kept.
    pub fn begin_submit(&mut self, text: &str) -> Result<String, ClientError> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty.into());
        }
        if self.in_flight() {
            return Err(ClientError::Busy);
        }
        let len = question_len(text);
        if len > MAX_QUESTION_CHARS {
            let err = too_long(len);
            self.phase = Phase::Errored(err.clone());
            return Err(err);
        }

        self.messages.push(Message::user(text));
        self.pending_input.clear();
        self.phase = Phase::Awaiting;
        Ok(text.to_owned())
    }

    /// Append the answer and return to `Idle`.
    pub fn finish_success(&mut self, reply: ChatReply) {
        self.messages.push(Message::bot(reply.answer, reply.source));
        self.phase = Phase::Idle;
    }

    /// Record the failure; the echoed question stays in the transcript.
    pub fn finish_failure(&mut self, err: ClientError) {
        self.phase = Phase::Errored(err);
    }

    /// Replace the transcript with a fresh welcome message and clear any
    /// error. An awaiting request is left to complete.
    pub fn reset(&mut self) {
        self.messages = vec![Message::welcome()];
        if let Phase::Errored(_) = self.phase {
            self.phase = Phase::Idle;
        }
    }
}

fn question_len(text: &str) -> usize {
    text.encode_utf16().count()
}
