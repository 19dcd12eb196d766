//! Moderation history state: cached collections, round sequencing, deletes.
//!
//! DESIGN
//! ======
//! The collections are a read-through cache of server state. A successful
//! polling round replaces both wholesale; confirmed deletions remove single
//! entries in between. Buckets are never created, merged, or pruned here,
//! so an emptied bucket stays until the next round reshapes the list.
//!
//! TRADE-OFFS
//! ==========
//! Rounds may overlap when the server is slower than the poll interval.
//! Each round takes a ticket with a monotonically increasing sequence
//! number, and an outcome is dropped if a later round has already settled.
//! A delete that races a round is not reconciled: whatever the next applied
//! round says wins.
//!
//! Once deactivated, the state ignores every late outcome (rounds and
//! deletes alike) so a torn-down view is never mutated.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::error::ClientError;
use crate::net::api::HistorySnapshot;
use crate::net::types::{ChatBucket, ContentBucket};

const PREVIEW_CHARS: usize = 50;
const UNKNOWN_EMAIL: &str = "Unknown";
const MISSING_SUMMARY: &str = "Not available";

/// Identifies one polling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoundTicket(u64);

impl RoundTicket {
    #[must_use]
    pub fn seq(self) -> u64 {
        self.0
    }
}

/// What happened to a round outcome handed to [`HistoryState::settle_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundDisposition {
    Applied,
    Failed(ClientError),
    /// A later round already settled.
    Stale,
    /// The state was deactivated while the round was in flight.
    Discarded,
}

/// Coarse status for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Loading,
    Failed(String),
    Empty,
    Ready,
}

/// One flattened content-history row, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRow {
    pub user_id: String,
    pub email: String,
    pub content_id: String,
    pub kind: String,
    pub content_preview: String,
    pub summary_preview: String,
    pub timestamp: Option<String>,
    pub url: Option<String>,
}

/// One flattened chat-history row, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub owner_id: String,
    pub email: String,
    pub chat_id: String,
    pub question: String,
    pub answer: String,
    pub source: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HistoryState {
    content: Vec<ContentBucket>,
    chats: Vec<ChatBucket>,
    loading: bool,
    last_error: Option<ClientError>,
    active: bool,
    next_seq: u64,
    last_settled: Option<u64>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            chats: Vec::new(),
            loading: true,
            last_error: None,
            active: true,
            next_seq: 0,
            last_settled: None,
        }
    }

    #[must_use]
    pub fn content(&self) -> &[ContentBucket] {
        &self.content
    }

    #[must_use]
    pub fn chats(&self) -> &[ChatBucket] {
        &self.chats
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn view(&self) -> HistoryView {
        if let Some(err) = &self.last_error {
            return HistoryView::Failed(err.user_message());
        }
        if self.loading {
            return HistoryView::Loading;
        }
        if self.content.is_empty() && self.chats.is_empty() {
            return HistoryView::Empty;
        }
        HistoryView::Ready
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    // =========================================================================
    // ROUNDS
    // =========================================================================

    /// Start a round. Returns `None` once deactivated.
    pub fn begin_round(&mut self) -> Option<RoundTicket> {
        if !self.active {
            return None;
        }
        self.next_seq += 1;
        Some(RoundTicket(self.next_seq))
    }

    /// Apply a round outcome unless it is stale or the state is inactive.
    /// A failed round keeps the previous collections.
    pub fn settle_round(
        &mut self,
        ticket: RoundTicket,
        outcome: Result<HistorySnapshot, ClientError>,
    ) -> RoundDisposition {
        if !self.active {
            return RoundDisposition::Discarded;
        }
        if self.last_settled.is_some_and(|last| ticket.0 < last) {
            return RoundDisposition::Stale;
        }
        self.last_settled = Some(ticket.0);
        self.loading = false;

        match outcome {
            Ok(snapshot) => {
                self.content = snapshot.content;
                self.chats = snapshot.chats;
                self.last_error = None;
                RoundDisposition::Applied
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                RoundDisposition::Failed(err)
            }
        }
    }

    // =========================================================================
    // CONFIRMED DELETES
    // =========================================================================

    /// Drop a content entry after the server confirmed its deletion.
    /// Returns whether an entry was removed.
    pub fn remove_content(&mut self, user_id: &str, content_id: &str) -> bool {
        if !self.active {
            return false;
        }
        let Some(bucket) = self.content.iter_mut().find(|b| b.user_id == user_id) else {
            return false;
        };
        let before = bucket.contents.len();
        bucket.contents.retain(|entry| entry.id != content_id);
        bucket.contents.len() != before
    }

    /// Drop a chat entry after the server confirmed its deletion.
    /// Returns whether an entry was removed.
    pub fn remove_chat(&mut self, owner_id: &str, chat_id: &str) -> bool {
        if !self.active {
            return false;
        }
        let Some(bucket) = self.chats.iter_mut().find(|b| b.owner_id == owner_id) else {
            return false;
        };
        let before = bucket.messages.len();
        bucket.messages.retain(|entry| entry.chat_id != chat_id);
        bucket.messages.len() != before
    }

    // =========================================================================
    // ROWS
    // =========================================================================

    #[must_use]
    pub fn content_rows(&self) -> Vec<ContentRow> {
        self.content
            .iter()
            .rev()
            .flat_map(|bucket| {
                bucket.contents.iter().rev().map(move |entry| ContentRow {
                    user_id: bucket.user_id.clone(),
                    email: display_email(bucket.email.as_deref()),
                    content_id: entry.id.clone(),
                    kind: entry.kind.clone(),
                    content_preview: preview(&entry.content),
                    summary_preview: entry
                        .summary
                        .as_deref()
                        .filter(|s| !s.is_empty())
                        .map_or_else(|| MISSING_SUMMARY.to_owned(), preview),
                    timestamp: entry.timestamp.clone(),
                    url: entry.url.clone(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn chat_rows(&self) -> Vec<ChatRow> {
        self.chats
            .iter()
            .rev()
            .flat_map(|bucket| {
                bucket.messages.iter().rev().map(move |entry| ChatRow {
                    owner_id: bucket.owner_id.clone(),
                    email: display_email(bucket.email.as_deref()),
                    chat_id: entry.chat_id.clone(),
                    question: entry.question.clone(),
                    answer: entry.answer.clone(),
                    source: entry.source.clone(),
                    timestamp: entry.timestamp.clone(),
                })
            })
            .collect()
    }
}

fn display_email(email: Option<&str>) -> String {
    email
        .filter(|e| !e.is_empty())
        .unwrap_or(UNKNOWN_EMAIL)
        .to_owned()
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
