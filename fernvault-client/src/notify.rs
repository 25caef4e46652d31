//! Transient alerts.
//!
//! Every alert dismisses itself after the configured timeout and can be
//! dismissed by hand at any time. Dismissal is idempotent.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertId(u64);

#[derive(Clone, Debug)]
pub struct Alert {
    pub id: AlertId,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

struct Inner {
    next_id: u64,
    alerts: Vec<Alert>,
}

/// Owns the list of visible alerts.
pub struct NotificationCenter {
    inner: Mutex<Inner>,
    timeout: Duration,
    events: broadcast::Sender<Alert>,
}

impl NotificationCenter {
    pub fn new(timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                alerts: Vec::new(),
            }),
            timeout,
            events,
        }
    }

    /// Shows a new alert. Earlier alerts stay until they expire or are dismissed.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) -> AlertId {
        let timeout = self.timeout;
        let alert = {
            let mut inner = self.lock();
            inner.alerts.retain(|a| a.shown_at.elapsed() < timeout);
            let id = AlertId(inner.next_id);
            inner.next_id += 1;
            let alert = Alert {
                id,
                message: message.into(),
                severity,
                shown_at: Instant::now(),
            };
            inner.alerts.push(alert.clone());
            alert
        };
        let id = alert.id;
        // No subscribers is fine.
        let _ = self.events.send(alert);
        id
    }

    /// Removes an alert. Returns false if it was already gone.
    pub fn dismiss(&self, id: AlertId) -> bool {
        let mut inner = self.lock();
        let before = inner.alerts.len();
        inner.alerts.retain(|a| a.id != id);
        inner.alerts.len() != before
    }

    pub fn dismiss_all(&self) {
        self.lock().alerts.clear();
    }

    /// Alerts still on screen, oldest first. Expired ones are dropped here.
    pub fn active(&self) -> Vec<Alert> {
        let timeout = self.timeout;
        let mut inner = self.lock();
        inner.alerts.retain(|a| a.shown_at.elapsed() < timeout);
        inner.alerts.clone()
    }

    /// Most recent visible alert.
    pub fn latest(&self) -> Option<Alert> {
        self.active().pop()
    }

    /// Receives every alert as it is shown.
    pub fn subscribe(&self) -> broadcast::Receiver<Alert> {
        self.events.subscribe()
    }

    /// Number of alerts held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().alerts.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
