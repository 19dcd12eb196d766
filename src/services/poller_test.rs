use super::*;
use crate::config::DEFAULT_POLL_INTERVAL_SECS;
use crate::net::api::{CHAT_HISTORY_PATH, CONTENT_HISTORY_PATH};
use crate::state::history::HistoryView;
use crate::test_helpers::MockTransport;
use reqwest::Method;

fn transport() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, "[]");
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, "[]");
    transport
}

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_every_interval() {
    let transport = transport();
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));
    let poller = spawn_poller(reconciler.clone(), Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 1);
    assert_eq!(transport.count(CHAT_HISTORY_PATH), 1);
    assert_eq!(reconciler.snapshot().view(), HistoryView::Empty);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 3);

    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_halts_scheduling_and_deactivates() {
    let transport = transport();
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));
    let poller = spawn_poller(reconciler.clone(), Duration::from_secs(10));

    tokio::time::sleep(Duration::from_millis(1)).await;
    poller.stop();
    assert!(!reconciler.is_active());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_it() {
    let transport = transport();
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));
    drop(spawn_poller(reconciler.clone(), Duration::from_secs(10)));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!reconciler.is_active());
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_round_does_not_delay_next_tick() {
    let transport = Arc::new(MockTransport::gated());
    transport.reply(Method::GET, CONTENT_HISTORY_PATH, 200, "[]");
    transport.reply(Method::GET, CHAT_HISTORY_PATH, 200, "[]");
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));
    let poller = spawn_poller(reconciler.clone(), Duration::from_secs(10));

    // Nothing is released, so the first round is still pending at the second tick.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 2);
    assert_eq!(reconciler.snapshot().view(), HistoryView::Loading);

    transport.release(4);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(reconciler.snapshot().view(), HistoryView::Empty);

    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn zero_interval_uses_default_cadence() {
    let transport = transport();
    let reconciler = Arc::new(HistoryReconciler::new(transport.clone()));
    let poller = spawn_poller(reconciler.clone(), Duration::ZERO);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 1);

    tokio::time::sleep(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)).await;
    assert_eq!(transport.count(CONTENT_HISTORY_PATH), 2);

    poller.stop();
}
