// =============================================================================
// NOTIFICATIONS MODULE
// =============================================================================
// Transient user notifications ("toasts"). Stores, the data source and the
// connectivity monitor publish; whoever renders toasts subscribes a feed and
// drains it.
// =============================================================================

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================
// LEARNING NOTE:
// A tokio broadcast channel hands every subscribed receiver its own copy of
// each message. Receivers that were dropped simply stop counting, so there is
// no subscriber list to prune. The ring holds TOAST_BACKLOG messages; a
// subscriber that falls further behind loses the oldest ones.
// -----------------------------------------------------------------------------

/// Messages a subscriber can fall behind by before the oldest are lost.
pub const TOAST_BACKLOG: usize = 64;

/// Publishes toasts to every subscribed `ToastFeed`. Clones share feeds.
#[derive(Clone)]
pub struct Notifier {
    hub: broadcast::Sender<Notification>,
}

/// One subscriber's view of the toast stream.
pub struct ToastFeed {
    rx: broadcast::Receiver<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (hub, _) = broadcast::channel(TOAST_BACKLOG);
        Self { hub }
    }

    /// Number of feeds currently subscribed.
    pub fn subscribers(&self) -> usize {
        self.hub.receiver_count()
    }

    /// Publishes `toast`. With nobody subscribed it is logged and dropped.
    pub fn notify(&self, toast: Notification) {
        if self.hub.send(toast).is_err() {
            tracing::trace!("No toast subscribers");
        }
    }

    /// Subscribes a feed. It sees toasts published from now on.
    pub fn observer(&self) -> ToastFeed {
        ToastFeed {
            rx: self.hub.subscribe(),
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(message = %message, "notification: success");
        self.notify(Notification::success(message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(message = %message, "notification: warning");
        self.notify(Notification::warning(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(message = %message, "notification: error");
        self.notify(Notification::error(message));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastFeed {
    /// Takes every toast delivered so far without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut toasts = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(toast) => toasts.push(toast),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Toast feed fell behind");
                }
                Err(_) => break,
            }
        }
        toasts
    }
}

/// Shorthand for `feed.drain()`.
pub fn drain(feed: &mut ToastFeed) -> Vec<Notification> {
    feed.drain()
}
