//! Chat session service: one question at a time against `POST /chat`.
//!
//! DESIGN
//! ======
//! `ChatSession` owns a `ChatState` behind a mutex and an injected
//! `Transport`. The lock is never held across the request, so concurrent
//! `submit` calls on a shared session interleave; the state machine's
//! `Awaiting` phase is what rejects the second one.
//!
//! ERROR HANDLING
//! ==============
//! Failures are recorded as the session's banner text and also returned to
//! the caller. Only server-supplied `error` text is shown verbatim; network
//! failures and anything else fall back to a generic message. A 401 has
//! already been handled by the transport and shows the re-login text.
//! A caller that drops `submit` mid-request (timeout, `select!`) leaves the
//! session errored with the generic message rather than stuck awaiting.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::ClientError;
use crate::net::api::{self, CHAT_FALLBACK_MESSAGE};
use crate::net::http::Transport;
use crate::net::types::ChatReply;
use crate::state::chat::{ChatState, Message};

pub struct ChatSession {
    state: Mutex<ChatState>,
    transport: Arc<dyn Transport>,
}

impl ChatSession {
    /// Create a session seeded with the welcome message.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let mut state = ChatState::new();
        state.initialize();
        Self { state: Mutex::new(state), transport }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ChatState {
        self.lock().clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages().to_vec()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error()
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.lock().in_flight()
    }

    pub fn initialize(&self) {
        self.lock().initialize();
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().set_input(text);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Submit whatever is in the pending input.
    ///
    /// # Errors
    ///
    /// See [`ChatSession::submit`].
    pub async fn submit_input(&self) -> Result<ChatReply, ClientError> {
        let text = self.lock().pending_input().to_owned();
        self.submit(&text).await
    }

    /// Ask `text` and append the answer.
    ///
    /// # Errors
    ///
    /// Validation errors and `Busy` are returned without issuing a request.
    /// Request failures are returned after being recorded on the session.
    pub async fn submit(&self, text: &str) -> Result<ChatReply, ClientError> {
        let question = self.lock().begin_submit(text)?;
        let mut pending = PendingQuestion { session: self, settled: false };
        debug!(chars = question.chars().count(), "chat question sent");

        let result = self
            .transport
            .send(api::ask_request(&question))
            .await
            .and_then(|reply| api::parse_answer(&reply));

        pending.settled = true;
        let mut state = self.lock();
        match result {
            Ok(reply) => {
                state.finish_success(reply.clone());
                Ok(reply)
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "chat question failed");
                state.finish_failure(banner_error(&err));
                Err(err)
            }
        }
    }
}

/// Settles an `Awaiting` phase whose `submit` future was dropped before the
/// answer arrived, so the session does not stay busy forever.
struct PendingQuestion<'a> {
    session: &'a ChatSession,
    settled: bool,
}

impl Drop for PendingQuestion<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.session.lock();
        if state.in_flight() {
            warn!("chat question abandoned before the answer arrived");
            state.finish_failure(ClientError::RequestFailed { message: CHAT_FALLBACK_MESSAGE.to_owned() });
        }
    }
}

/// Map a request failure to what the banner should carry.
fn banner_error(err: &ClientError) -> ClientError {
    match err {
        ClientError::RequestFailed { .. } | ClientError::Unauthorized => err.clone(),
        _ => ClientError::RequestFailed { message: CHAT_FALLBACK_MESSAGE.to_owned() },
    }
}
