// tests/scheduler.rs
mod common;

use common::{mock_state, MockSource, DEFAULT_CHAT};
use p2p_quote_bot::scheduler::spawn_price_scheduler;
use std::time::Duration;

#[tokio::test]
async fn scheduler_broadcasts_on_every_tick() {
    let ok = MockSource::quote("binancep2p", 7.0, 6.9);
    let (state, messenger) = mock_state(&[ok.clone()], Some(DEFAULT_CHAT));

    let handle = spawn_price_scheduler(state, Duration::from_millis(50));

    // Nothing before the first full interval.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(messenger.messages().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    let sent = messenger.messages();
    assert!(sent.len() >= 2, "expected repeated reports, got {}", sent.len());
    assert!(sent.iter().all(|(chat, _)| chat == DEFAULT_CHAT));
}

#[tokio::test]
async fn scheduler_keeps_running_when_reports_fail() {
    let bad = MockSource::failing("binancep2p");
    let (state, messenger) = mock_state(&[bad.clone()], Some(DEFAULT_CHAT));

    let handle = spawn_price_scheduler(state, Duration::from_millis(40));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished(), "loop must not exit on errors");
    handle.abort();

    assert!(bad.call_count() >= 2);
    assert!(messenger.messages().is_empty());
}
