//! Wire schema for the answer and admin history endpoints.
//!
//! DESIGN
//! ======
//! History payloads are ingested through `Raw*` types that mirror what the
//! server emits, then normalized once into the canonical bucket types used
//! by the reconciler. The chat-history owner id arrives in one of three
//! shapes (`userId`, `_id._id`, or a bare `_id`); normalization resolves it
//! to a single `owner_id` so nothing downstream branches on payload shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

// =============================================================================
// CHAT ENDPOINT
// =============================================================================

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Success body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
}

// =============================================================================
// CONTENT HISTORY
// =============================================================================

/// One summarized/translated document belonging to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// All content entries for one user, as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBucket {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contents: Vec<ContentEntry>,
}

// =============================================================================
// CHAT HISTORY
// =============================================================================

/// One question/answer exchange recorded by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub chat_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Chat transcript bucket with its owner id already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBucket {
    pub owner_id: String,
    pub email: Option<String>,
    pub messages: Vec<ChatEntry>,
}

/// Chat bucket exactly as the server emits it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChatBucket {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "_id", default)]
    pub alt_id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatEntry>,
}

impl RawChatBucket {
    /// Resolve the owner id: explicit `userId` first, then `_id._id`, then
    /// a string `_id`. Returns `None` when no shape yields a non-empty id.
    #[must_use]
    pub fn resolve_owner_id(&self) -> Option<String> {
        if let Some(id) = self.user_id.as_deref().filter(|id| !id.is_empty()) {
            return Some(id.to_owned());
        }
        let alt = self.alt_id.as_ref()?;
        let nested = alt.get("_id").and_then(Value::as_str);
        nested
            .or_else(|| alt.as_str())
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Normalize into a [`ChatBucket`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` when no owner id can be resolved.
    pub fn into_bucket(self) -> Result<ChatBucket, ClientError> {
        let owner_id = self
            .resolve_owner_id()
            .ok_or_else(|| ClientError::MalformedResponse("chat bucket without owner id".into()))?;
        Ok(ChatBucket { owner_id, email: self.email, messages: self.messages })
    }
}

// =============================================================================
// ERROR / ACK BODIES
// =============================================================================

/// Acknowledgement body of the delete endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
