//! History reconciler: polled admin collections plus confirmed deletions.
//!
//! DESIGN
//! ======
//! A round issues the content and chat fetches concurrently and settles
//! them as one unit through `HistoryState::settle_round`, which enforces
//! both the sequence guard and the deactivation check. Deletes wait for the
//! server before touching local state; a rejected delete leaves the row in
//! place for a retry.
//!
//! The reconciler is shared (`Arc`) between the poller's round tasks and
//! whatever drives deletions. The state mutex is never held across I/O.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::net::api;
use crate::net::http::Transport;
use crate::state::history::{HistoryState, RoundDisposition};

pub const CONFIRM_DELETE_CONTENT: &str = "Are you sure you want to delete this content?";
pub const CONFIRM_DELETE_CHAT: &str = "Are you sure you want to delete this chat message?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of a delete attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Server confirmed; the entry is gone locally (if it was still cached).
    Deleted,
    /// The user declined; nothing was sent.
    Cancelled,
}

pub struct HistoryReconciler {
    state: Mutex<HistoryState>,
    transport: Arc<dyn Transport>,
}

impl HistoryReconciler {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { state: Mutex::new(HistoryState::new()), transport }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Copy of the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> HistoryState {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().is_active()
    }

    /// Stop accepting results. Pending rounds and deletes still resolve but
    /// are not applied.
    pub fn deactivate(&self) {
        self.lock().deactivate();
        info!("history reconciler deactivated");
    }

    /// Run one polling round.
    pub async fn poll_once(&self) -> RoundDisposition {
        let Some(ticket) = self.lock().begin_round() else {
            return RoundDisposition::Discarded;
        };
        debug!(seq = ticket.seq(), "history round started");

        let (content, chats) = tokio::join!(
            self.transport.send(api::content_history_request()),
            self.transport.send(api::chat_history_request()),
        );
        let outcome = content.and_then(|content| {
            let chats = chats?;
            api::parse_history_round(&content, &chats)
        });

        let disposition = self.lock().settle_round(ticket, outcome);
        match &disposition {
            RoundDisposition::Applied => debug!(seq = ticket.seq(), "history round applied"),
            RoundDisposition::Failed(err) => {
                warn!(seq = ticket.seq(), code = err.error_code(), error = %err, "history round failed");
            }
            RoundDisposition::Stale => debug!(seq = ticket.seq(), "history round superseded"),
            RoundDisposition::Discarded => debug!(seq = ticket.seq(), "history round discarded"),
        }
        disposition
    }

    /// Delete one content entry after confirmation.
    ///
    /// # Errors
    ///
    /// Transport and server failures; local state is untouched on error.
    pub async fn delete_content(
        &self,
        user_id: &str,
        content_id: &str,
        confirm: &(dyn Confirm + Sync),
    ) -> Result<DeleteOutcome, ClientError> {
        if !confirm.confirm(CONFIRM_DELETE_CONTENT) {
            return Ok(DeleteOutcome::Cancelled);
        }
        let reply = self
            .transport
            .send(api::delete_content_request(user_id, content_id))
            .await?;
        api::parse_delete_content(&reply)?;

        let removed = self.lock().remove_content(user_id, content_id);
        info!(user_id, content_id, removed, "content entry deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Delete one chat entry after confirmation. `owner_id` is the bucket's
    /// resolved owner id.
    ///
    /// # Errors
    ///
    /// Transport and server failures; local state is untouched on error.
    pub async fn delete_chat(
        &self,
        owner_id: &str,
        chat_id: &str,
        confirm: &(dyn Confirm + Sync),
    ) -> Result<DeleteOutcome, ClientError> {
        if !confirm.confirm(CONFIRM_DELETE_CHAT) {
            return Ok(DeleteOutcome::Cancelled);
        }
        let reply = self
            .transport
            .send(api::delete_chat_request(owner_id, chat_id))
            .await?;
        api::parse_delete_chat(&reply)?;

        let removed = self.lock().remove_chat(owner_id, chat_id);
        info!(owner_id, chat_id, removed, "chat entry deleted");
        Ok(DeleteOutcome::Deleted)
    }
}
