use std::cell::RefCell;
use std::rc::Rc;
use std::thread::JoinHandle;

pub const NOTIFICATION_TITLE: &str = "Information";
const APP_NAME: &str = "keepsake";

/// User-visible message sink. Calls return immediately; delivery and
/// acknowledgment happen elsewhere and overlapping messages are not serialized.
pub trait Notifier {
    fn notify_user(&self, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn notify_user(&self, message: &str) {
        (**self).notify_user(message)
    }
}

/// Desktop notification sent from a worker thread per message.
///
/// Callers never wait on delivery, but the owner must call [`flush`] before
/// the process exits or in-flight messages are lost.
///
/// [`flush`]: DesktopNotifier::flush
#[derive(Debug)]
pub struct DesktopNotifier {
    enabled: bool,
    deliver: fn(String),
    pending: RefCell<Vec<JoinHandle<()>>>,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self::with_delivery(enabled, send)
    }

    fn with_delivery(enabled: bool, deliver: fn(String)) -> Self {
        Self {
            enabled,
            deliver,
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Number of deliveries that have not been joined yet.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Blocks until every started delivery has finished.
    pub fn flush(&self) {
        let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "waiting for notification delivery");
        }
        for handle in pending {
            if handle.join().is_err() {
                tracing::warn!("notification worker panicked");
            }
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for DesktopNotifier {
    fn notify_user(&self, message: &str) {
        tracing::info!(message, enabled = self.enabled, "user notification");
        if !self.enabled {
            return;
        }
        let body = message.to_string();
        let deliver = self.deliver;
        let mut pending = self.pending.borrow_mut();
        pending.retain(|handle| !handle.is_finished());
        pending.push(std::thread::spawn(move || deliver(body)));
    }
}

fn send(body: String) {
    let result = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary(NOTIFICATION_TITLE)
        .body(&body)
        .show();
    if let Err(err) = result {
        tracing::warn!(%err, "desktop notification failed");
    }
}
