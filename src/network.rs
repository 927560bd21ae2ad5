// =============================================================================
// NETWORK STATUS MODULE
// =============================================================================
// Tracks whether the API is reachable. The API client reports every
// transport failure and every response; only transitions notify the user.
// =============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::notify::Notifier;

pub const OFFLINE_MESSAGE: &str = "Network error: check your internet connection";
pub const RESTORED_MESSAGE: &str = "Connection restored";

#[derive(Clone)]
pub struct NetworkMonitor {
    online: Arc<AtomicBool>,
    notifier: Notifier,
}

impl NetworkMonitor {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(true)),
            notifier,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// A response (any status) arrived.
    pub fn record_response(&self) {
        if !self.online.swap(true, Ordering::SeqCst) {
            tracing::info!("API reachable again");
            self.notifier.success(RESTORED_MESSAGE);
        }
    }

    /// The request never reached the server.
    pub fn record_transport_failure(&self) {
        if self.online.swap(false, Ordering::SeqCst) {
            tracing::warn!("API unreachable");
            self.notifier.error(OFFLINE_MESSAGE);
        }
    }
}
