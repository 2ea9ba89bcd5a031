//! Transient user-facing notifications.
//!
//! [`NotificationQueue`] keeps messages in insertion order. Each entry may
//! carry an auto-dismiss delay; expiry runs on a tokio timer task holding
//! only a weak reference, so dropping every queue handle also stops
//! pending timers from touching anything.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::telemetry;
use crate::types::{Notification, NotificationId, Severity};

/// Default auto-dismiss delay.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Default)]
struct QueueInner {
    next_id: u64,
    items: Vec<Notification>,
}

/// Shared handle to the notification list. Clones observe the same queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    inner: Arc<Mutex<QueueInner>>,
    default_timeout: Option<Duration>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_default_timeout(Some(DEFAULT_TIMEOUT))
    }

    /// Queue whose convenience methods use `timeout` (`None` = sticky).
    pub fn with_default_timeout(timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner::default())),
            default_timeout: timeout,
        }
    }

    /// Append a notification.
    ///
    /// With `Some(timeout)` (non-zero) the entry is removed after that delay;
    /// with `None` or a zero duration it stays until [`dismiss`](Self::dismiss).
    /// Scheduling needs a tokio runtime; outside one the entry is kept and a
    /// warning logged.
    pub fn enqueue(
        &self,
        message: impl Into<String>,
        severity: Severity,
        timeout: Option<Duration>,
    ) -> NotificationId {
        let timeout = timeout.filter(|t| !t.is_zero());
        let message = message.into();
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = NotificationId(inner.next_id);
            inner.items.push(Notification {
                id,
                message: message.clone(),
                severity,
                auto_dismiss: timeout,
            });
            id
        };
        debug!(%id, %severity, %message, "notification");
        metrics::counter!(telemetry::NOTIFICATIONS_TOTAL, "severity" => severity.as_str())
            .increment(1);

        if let Some(delay) = timeout {
            self.schedule_dismiss(id, delay);
        }
        id
    }

    /// Append with the queue's default timeout.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> NotificationId {
        self.enqueue(message, severity, self.default_timeout)
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Success)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.notify(message, Severity::Error)
    }

    /// Remove a notification. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        remove(&mut self.lock(), id)
    }

    /// Current notifications in display order.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().items.clone()
    }

    /// Remove and return every notification.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut self.lock().items)
    }

    pub fn clear(&self) {
        self.lock().items.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn schedule_dismiss(&self, id: NotificationId, delay: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "no tokio runtime; notification will not auto-dismiss");
            return;
        };
        let weak: Weak<Mutex<QueueInner>> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                let mut guard = inner.lock().unwrap_or_else(|p| p.into_inner());
                remove(&mut guard, id);
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn remove(inner: &mut QueueInner, id: NotificationId) -> bool {
    let before = inner.items.len();
    inner.items.retain(|n| n.id != id);
    inner.items.len() != before
}
