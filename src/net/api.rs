//! Endpoint paths and reply interpretation for the answer and admin APIs.
//!
//! Request construction and status rules live here as plain functions so
//! the services only sequence calls and apply results to state.
//!
//! ERROR HANDLING
//! ==============
//! Server-supplied text (`error` on `/chat`, `message` on admin routes) is
//! preferred over the fallbacks below. Chat-delete failure bodies are not
//! trusted to be JSON and are only logged.

use serde_json::json;
use tracing::warn;

use super::http::{ApiRequest, HttpReply};
use super::types::{ChatBucket, ChatReply, ContentBucket, DeleteAck, RawChatBucket};
use crate::error::ClientError;

pub const CHAT_FALLBACK_MESSAGE: &str = "Failed to send message. Please try again.";
pub const CONTENT_HISTORY_FALLBACK_MESSAGE: &str = "Failed to load content history";
pub const CHAT_HISTORY_FALLBACK_MESSAGE: &str = "Failed to load chat history";
pub const DELETE_CONTENT_FALLBACK_MESSAGE: &str = "Failed to delete content";
pub const DELETE_CHAT_FALLBACK_MESSAGE: &str = "Failed to delete chat message";

const RATE_LIMIT_STATUS: u16 = 429;

// =============================================================================
// PATHS
// =============================================================================

pub const CHAT_PATH: &str = "/chat";
pub const CONTENT_HISTORY_PATH: &str = "/admin/content-history";
pub const CHAT_HISTORY_PATH: &str = "/admin/chat-history";

fn delete_content_path(user_id: &str, content_id: &str) -> String {
    format!("/admin/delete-content/{user_id}/{content_id}")
}

fn delete_chat_path(user_id: &str, chat_id: &str) -> String {
    format!("/admin/delete-chat/{user_id}/{chat_id}")
}

// =============================================================================
// REQUESTS
// =============================================================================

#[must_use]
pub fn ask_request(question: &str) -> ApiRequest {
    ApiRequest::post(CHAT_PATH, json!({ "question": question }))
}

#[must_use]
pub fn content_history_request() -> ApiRequest {
    ApiRequest::get(CONTENT_HISTORY_PATH).require_auth()
}

#[must_use]
pub fn chat_history_request() -> ApiRequest {
    ApiRequest::get(CHAT_HISTORY_PATH).require_auth()
}

#[must_use]
pub fn delete_content_request(user_id: &str, content_id: &str) -> ApiRequest {
    ApiRequest::delete(delete_content_path(user_id, content_id)).require_auth()
}

#[must_use]
pub fn delete_chat_request(user_id: &str, chat_id: &str) -> ApiRequest {
    ApiRequest::delete(delete_chat_path(user_id, chat_id)).require_auth()
}

// =============================================================================
// REPLIES
// =============================================================================

/// Interpret a `/chat` reply.
///
/// # Errors
///
/// `RequestFailed` with the body's `error` text (or the generic fallback)
/// for non-2xx; `MalformedResponse` when a 2xx body has no `answer`.
pub fn parse_answer(reply: &HttpReply) -> Result<ChatReply, ClientError> {
    if !reply.is_success() {
        let message = reply
            .json_field("error")
            .unwrap_or_else(|| CHAT_FALLBACK_MESSAGE.to_owned());
        return Err(ClientError::RequestFailed { message });
    }
    reply.json::<ChatReply>()
}

/// Both collections from one successful polling round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub content: Vec<ContentBucket>,
    pub chats: Vec<ChatBucket>,
}

/// Interpret the paired replies of one polling round as a single unit.
///
/// # Errors
///
/// In order: `RateLimited` if either status is 429; `RequestFailed` for a
/// non-2xx content reply, then for a non-2xx chat reply; `MalformedResponse`
/// if either body is not a list of bucket records.
pub fn parse_history_round(content: &HttpReply, chats: &HttpReply) -> Result<HistorySnapshot, ClientError> {
    if content.status == RATE_LIMIT_STATUS || chats.status == RATE_LIMIT_STATUS {
        return Err(ClientError::RateLimited);
    }
    ensure_success(content, CONTENT_HISTORY_FALLBACK_MESSAGE)?;
    ensure_success(chats, CHAT_HISTORY_FALLBACK_MESSAGE)?;

    let content = content.json::<Vec<ContentBucket>>()?;
    let chats = chats
        .json::<Vec<RawChatBucket>>()?
        .into_iter()
        .map(RawChatBucket::into_bucket)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HistorySnapshot { content, chats })
}

/// Interpret a content-delete reply.
///
/// # Errors
///
/// `RequestFailed` with the server `message` (or fallback) for non-2xx.
pub fn parse_delete_content(reply: &HttpReply) -> Result<DeleteAck, ClientError> {
    ensure_success(reply, DELETE_CONTENT_FALLBACK_MESSAGE)?;
    Ok(reply.json::<DeleteAck>().unwrap_or_default())
}

/// Interpret a chat-delete reply. The failure body may be non-JSON.
///
/// # Errors
///
/// `RequestFailed` with a generic message for non-2xx.
pub fn parse_delete_chat(reply: &HttpReply) -> Result<DeleteAck, ClientError> {
    if !reply.is_success() {
        warn!(status = reply.status, body = %reply.body, "delete-chat rejected");
        return Err(ClientError::RequestFailed { message: DELETE_CHAT_FALLBACK_MESSAGE.to_owned() });
    }
    Ok(reply.json::<DeleteAck>().unwrap_or_default())
}

fn ensure_success(reply: &HttpReply, fallback: &str) -> Result<(), ClientError> {
    if reply.is_success() {
        return Ok(());
    }
    let message = reply
        .json_field("message")
        .unwrap_or_else(|| fallback.to_owned());
    Err(ClientError::RequestFailed { message })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
