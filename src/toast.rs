//! Transient toast notifications.
//!
//! Every flow reports its outcome through this queue; the UI renders the
//! queue as an overlay and prunes entries after a display timeout.

use chrono::{DateTime, Duration, Utc};

/// How long a toast stays on screen before auto-dismissal.
const TOAST_TTL_SECS: i64 = 5;

/// Maximum number of toasts rendered at once; older ones are dropped first.
const MAX_VISIBLE_TOASTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::seconds(TOAST_TTL_SECS)
    }
}

/// FIFO queue of active toasts.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toast and return its id.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            message: message.into(),
            severity,
            created_at: Utc::now(),
        });
        if self.toasts.len() > MAX_VISIBLE_TOASTS {
            self.toasts.remove(0);
        }
        id
    }

    /// Remove a toast by id (manual dismissal).
    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Drop toasts past their display timeout. Called once per UI tick.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_unique_ids() {
        let mut queue = ToastQueue::new();
        let a = queue.push("first", Severity::Info);
        let b = queue.push("second", Severity::Error);
        assert_ne!(a, b);
        assert_eq!(queue.iter().count(), 2);
    }

    #[test]
    fn test_dismiss_removes_only_matching_toast() {
        let mut queue = ToastQueue::new();
        let a = queue.push("keep", Severity::Success);
        let b = queue.push("drop", Severity::Warning);
        queue.dismiss(b);
        let remaining: Vec<u64> = queue.iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![a]);
    }

    #[test]
    fn test_prune_removes_expired_toasts() {
        let mut queue = ToastQueue::new();
        queue.push("old", Severity::Info);
        queue.push("fresh", Severity::Info);
        // Age the first toast past the TTL
        queue.toasts[0].created_at = Utc::now() - Duration::seconds(TOAST_TTL_SECS + 1);
        queue.prune(Utc::now());
        assert_eq!(queue.iter().count(), 1);
        assert_eq!(queue.iter().next().map(|t| t.message.as_str()), Some("fresh"));
    }

    #[test]
    fn test_prune_keeps_fresh_toasts() {
        let mut queue = ToastQueue::new();
        queue.push("fresh", Severity::Error);
        queue.prune(Utc::now());
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_queue_caps_visible_toasts() {
        let mut queue = ToastQueue::new();
        for i in 0..10 {
            queue.push(format!("toast {}", i), Severity::Info);
        }
        assert_eq!(queue.iter().count(), MAX_VISIBLE_TOASTS);
        // Oldest dropped first
        assert_eq!(
            queue.iter().next().map(|t| t.message.as_str()),
            Some("toast 6")
        );
    }
}
