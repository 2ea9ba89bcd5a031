//! Tests for notification auto-dismiss timing.
//!
//! Runs with a paused clock so timers fire deterministically.

use std::time::Duration;

use nutriscope::{NotificationQueue, Severity};

#[tokio::test(start_paused = true)]
async fn default_timeout_dismisses_after_five_seconds() {
    let queue = NotificationQueue::new();
    queue.success("Meal analyzed successfully!");

    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert_eq!(queue.len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn sticky_notification_stays() {
    let queue = NotificationQueue::new();
    let id = queue.enqueue("Check your files", Severity::Warning, None);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(queue.len(), 1);

    assert!(queue.dismiss(id));
    assert!(!queue.dismiss(id));
}

#[tokio::test(start_paused = true)]
async fn manual_dismiss_before_expiry_is_harmless() {
    let queue = NotificationQueue::new();
    let id = queue.error("Failed to analyze meal");
    let keep = queue.enqueue("kept", Severity::Info, None);

    assert!(queue.dismiss(id));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let remaining = queue.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}

#[tokio::test(start_paused = true)]
async fn timers_expire_independently() {
    let queue = NotificationQueue::with_default_timeout(None);
    queue.enqueue("short", Severity::Info, Some(Duration::from_secs(1)));
    queue.enqueue("long", Severity::Info, Some(Duration::from_secs(3)));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let messages: Vec<_> = queue.snapshot().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["long"]);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn clear_drops_everything() {
    let queue = NotificationQueue::new();
    queue.info("a");
    queue.warning("b");
    queue.clear();
    assert!(queue.is_empty());

    // Pending timers find nothing to remove.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(queue.is_empty());
}

#[tokio::test]
async fn drain_returns_in_order() {
    let queue = NotificationQueue::with_default_timeout(None);
    queue.info("first");
    queue.error("second");

    let drained = queue.drain();
    assert_eq!(drained[0].severity, Severity::Info);
    assert_eq!(drained[1].message, "second");
    assert!(queue.is_empty());
}
