use super::*;
use crate::net::api::{CHAT_HISTORY_PATH, CONTENT_HISTORY_PATH};
use crate::net::http::HttpReply;
use crate::state::history::HistoryView;
use crate::test_helpers::MockTransport;
use reqwest::Method;

const CONTENT_U1_E1: &str =
    r#"[{"userId":"u1","email":"ann@example.test","contents":[{"_id":"e1","type":"text","content":"hello","timestamp":"2024-05-01T10:00:00Z"}]}]"#;
const CHAT_U1_C1: &str = r#"[{"_id":{"_id":"u1"},"email":"ann@example.test","messages":[{"chat_id":"c1","question":"q","answer":"a","source":"doc","timestamp":"2024-05-01T10:00:00Z"}]}]"#;

fn yes(_: &str) -> bool {
    true
}

fn transport_with_history() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, CHAT_U1_C1);
    transport
}

async fn polled(transport: &Arc<MockTransport>) -> HistoryReconciler {
    let reconciler = HistoryReconciler::new(transport.clone());
    assert_eq!(reconciler.poll_once().await, RoundDisposition::Applied);
    reconciler
}

// =============================================================
// Polling
// =============================================================

#[tokio::test]
async fn round_fetches_both_collections() {
    let transport = transport_with_history();
    let reconciler = polled(&transport).await;

    let state = reconciler.snapshot();
    assert_eq!(state.content()[0].contents[0].id, "e1");
    assert_eq!(state.chats()[0].owner_id, "u1");
    assert_eq!(state.view(), HistoryView::Ready);
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 1);
    assert_eq!(transport.count(CHAT_HISTORY_PATH), 1);
}

#[tokio::test]
async fn chat_fetch_failure_leaves_both_collections_unchanged() {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, "[]");
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, CHAT_U1_C1);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 500, r#"{"message":"chat store offline"}"#);
    let reconciler = polled(&transport).await;
    let before = reconciler.snapshot();

    let disposition = reconciler.poll_once().await;
    assert_eq!(
        disposition,
        RoundDisposition::Failed(ClientError::RequestFailed { message: "chat store offline".into() })
    );
    let after = reconciler.snapshot();
    assert_eq!(after.content(), before.content());
    assert_eq!(after.chats(), before.chats());
}

#[tokio::test]
async fn rate_limit_on_chat_fetch_keeps_cache() {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, "[]");
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, CHAT_U1_C1);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 429, "Too Many Requests");
    let reconciler = polled(&transport).await;
    let before = reconciler.snapshot();

    assert_eq!(reconciler.poll_once().await, RoundDisposition::Failed(ClientError::RateLimited));
    let after = reconciler.snapshot();
    assert_eq!(after.last_error(), Some(&ClientError::RateLimited));
    assert_eq!(after.content(), before.content());
    assert_eq!(after.chats(), before.chats());
    assert!(matches!(after.view(), HistoryView::Failed(_)));
}

#[tokio::test]
async fn malformed_payload_fails_round() {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, r#"{"not":"a list"}"#);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, "[]");
    let reconciler = HistoryReconciler::new(transport.clone());

    let disposition = reconciler.poll_once().await;
    assert!(matches!(disposition, RoundDisposition::Failed(ClientError::MalformedResponse(_))));
    assert!(reconciler.snapshot().content().is_empty());
}

#[tokio::test]
async fn unauthorized_round_surfaces_error() {
    let transport = Arc::new(MockTransport::new());
    transport.route(Method::GET, CONTENT_HISTORY_PATH, Err(ClientError::Unauthorized));
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, "[]");
    let reconciler = HistoryReconciler::new(transport.clone());

    assert_eq!(reconciler.poll_once().await, RoundDisposition::Failed(ClientError::Unauthorized));
}

#[tokio::test]
async fn round_in_flight_at_deactivation_is_discarded() {
    let transport = Arc::new(MockTransport::gated());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, CHAT_U1_C1);
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));

    let round = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.poll_once().await }
    });
    while transport.count(CHAT_HISTORY_PATH) == 0 {
        tokio::task::yield_now().await;
    }
    reconciler.deactivate();
    transport.release(2);

    assert_eq!(round.await.unwrap(), RoundDisposition::Discarded);
    assert!(reconciler.snapshot().content().is_empty());
    assert_eq!(reconciler.poll_once().await, RoundDisposition::Discarded);
}

// =============================================================
// Deletion
// =============================================================

#[tokio::test]
async fn confirmed_content_delete_removes_entry_but_keeps_bucket() {
    let transport = transport_with_history();
    transport.reply(Method::DELETE, "/admin/delete-content/u1/e1", 200, r#"{"message":"Deleted"}"#);
    let reconciler = polled(&transport).await;

    let outcome = reconciler.delete_content("u1", "e1", &yes).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    let state = reconciler.snapshot();
    assert_eq!(state.content().len(), 1);
    assert_eq!(state.content()[0].user_id, "u1");
    assert!(state.content()[0].contents.is_empty());
}

#[tokio::test]
async fn rejected_content_delete_keeps_entry() {
    let transport = transport_with_history();
    transport.reply(Method::DELETE, "/admin/delete-content/u1/e1", 403, r#"{"message":"Admins only"}"#);
    let reconciler = polled(&transport).await;

    let err = reconciler.delete_content("u1", "e1", &yes).await.unwrap_err();
    assert_eq!(err, ClientError::RequestFailed { message: "Admins only".into() });
    assert_eq!(reconciler.snapshot().content()[0].contents.len(), 1);
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let transport = transport_with_history();
    let reconciler = polled(&transport).await;
    let prompts = std::sync::Mutex::new(Vec::new());
    let decline = |prompt: &str| {
        prompts.lock().unwrap().push(prompt.to_owned());
        false
    };

    let outcome = reconciler.delete_chat("u1", "c1", &decline).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(prompts.into_inner().unwrap(), vec![CONFIRM_DELETE_CHAT.to_owned()]);
    assert!(transport.requests().iter().all(|r| r.method != Method::DELETE));
    assert_eq!(reconciler.snapshot().chats()[0].messages.len(), 1);
}

#[tokio::test]
async fn chat_delete_uses_resolved_owner_id() {
    let transport = transport_with_history();
    transport.reply(Method::DELETE, "/admin/delete-chat/u1/c1", 200, "{}");
    let reconciler = polled(&transport).await;

    reconciler.delete_chat("u1", "c1", &yes).await.unwrap();
    let state = reconciler.snapshot();
    assert_eq!(state.chats().len(), 1);
    assert!(state.chats()[0].messages.is_empty());
}

#[tokio::test]
async fn chat_delete_with_non_json_failure_is_generic() {
    let transport = transport_with_history();
    transport.reply(Method::DELETE, "/admin/delete-chat/u1/c1", 500, "<html>Internal Server Error</html>");
    let reconciler = polled(&transport).await;

    let err = reconciler.delete_chat("u1", "c1", &yes).await.unwrap_err();
    assert_eq!(err, ClientError::RequestFailed { message: api::DELETE_CHAT_FALLBACK_MESSAGE.into() });
    assert_eq!(reconciler.snapshot().chats()[0].messages.len(), 1);
}

#[tokio::test]
async fn delete_transport_error_keeps_entry() {
    let transport = transport_with_history();
    transport.route(
        Method::DELETE,
        "/admin/delete-content/u1/e1",
        Err(ClientError::Network("connection reset".into())),
    );
    let reconciler = polled(&transport).await;

    assert!(reconciler.delete_content("u1", "e1", &yes).await.is_err());
    assert_eq!(reconciler.snapshot().content()[0].contents.len(), 1);
}

#[tokio::test]
async fn next_round_is_authoritative_after_delete() {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    // The server had not processed the delete yet when the next round ran.
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, CONTENT_U1_E1);
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, "[]");
    transport.route(Method::DELETE, "/admin/delete-content/u1/e1", Ok(HttpReply::new(200, "{}")));
    let reconciler = polled(&transport).await;

    reconciler.delete_content("u1", "e1", &yes).await.unwrap();
    assert!(reconciler.snapshot().content()[0].contents.is_empty());

    reconciler.poll_once().await;
    assert_eq!(reconciler.snapshot().content()[0].contents.len(), 1);
}
