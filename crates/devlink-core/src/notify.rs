//! User-visible notifications.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::error;

use crate::error::LinkError;

/// Receives failures the user should see.
pub trait Notifier: Send + Sync {
    /// Show a plain message.
    fn notify_message(&self, message: &str);

    /// Show an error, see [`format_error`].
    fn notify_error(&self, error: &LinkError);
}

/// Describe an error: its kind on the first line, then its message.
pub fn format_error(error: &LinkError) -> String {
    format!("{}\n{}", error.kind(), error)
}

/// One notification as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    /// Notifications shown so far, this one included.
    pub count: u64,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\nFor more info see the debug log.\n\n({} unhandled errors so far)",
            self.text, self.count
        )
    }
}

type NotificationSink = Box<dyn Fn(&Notification) + Send + Sync>;

/// Keeps the latest notification and a running count, and hands each one
/// to a display sink.
pub struct NotificationBoard {
    count: AtomicU64,
    latest: Mutex<Option<Notification>>,
    sink: NotificationSink,
}

impl NotificationBoard {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        Self {
            count: AtomicU64::new(0),
            latest: Mutex::new(None),
            sink: Box::new(sink),
        }
    }

    /// Board that prints to stderr.
    pub fn stderr() -> Self {
        Self::new(|notification| eprintln!("{}", notification))
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn latest(&self) -> Option<Notification> {
        self.latest.lock().clone()
    }

    fn show(&self, text: String) {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        error!("{}", text);

        let notification = Notification { text, count };
        (self.sink)(&notification);
        *self.latest.lock() = Some(notification);
    }
}

impl Notifier for NotificationBoard {
    fn notify_message(&self, message: &str) {
        self.show(message.to_string());
    }

    fn notify_error(&self, error: &LinkError) {
        self.show(format_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_format_error_has_kind_and_message() {
        let err = LinkError::Transport("tcp connect error: Connection refused".to_string());
        let text = format_error(&err);
        assert!(text.starts_with("TransportFailure\n"));
        assert!(text.contains("Connection refused"));
    }

    #[test]
    fn test_notification_display() {
        let notification = Notification {
            text: "http://device/auth responded with status code 401".to_string(),
            count: 2,
        };
        let shown = notification.to_string();
        assert!(shown.starts_with("http://device/auth responded"));
        assert!(shown.contains("debug log"));
        assert!(shown.ends_with("(2 unhandled errors so far)"));
    }

    #[test]
    fn test_board_counts_and_keeps_latest() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let board = {
            let seen = seen.clone();
            NotificationBoard::new(move |n| seen.lock().push(n.clone()))
        };

        board.notify_message("first");
        board.notify_error(&LinkError::NotConnected);

        assert_eq!(board.count(), 2);
        let latest = board.latest().unwrap();
        assert_eq!(latest.count, 2);
        assert!(latest.text.contains("WebSocket disconnected!"));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].text, "first");
        assert_eq!(seen[0].count, 1);
    }

    #[test]
    fn test_empty_board() {
        let board = NotificationBoard::new(|_| {});
        assert_eq!(board.count(), 0);
        assert!(board.latest().is_none());
    }
}
