/// Desktop notifications for phase changes

use crate::storage::{KeyValueStore, TIMER_STATE_KEY, write_record};
use crate::timer::{PhaseComplete, TimerState};
use web_sys::{Notification, NotificationPermission};

/// Fire-and-forget notification sink behind a permission gate
pub trait Notifier {
    fn permission_granted(&self) -> bool;

    fn show(&self, message: &str);
}

/// Announce the phase that starts next. Returns whether anything was shown;
/// a missing permission is not an error.
pub fn notify_phase_complete(notifier: &dyn Notifier, done: &PhaseComplete) -> bool {
    if !notifier.permission_granted() {
        log::debug!("Notification permission not granted, skipping");
        return false;
    }
    notifier.show(done.message());
    true
}

/// Write the timer snapshot, then announce the phase that just ended, if any.
///
/// The notification only goes out once the write has settled, and still goes
/// out when the write fails. Returns whether a notification was shown.
pub async fn persist_then_notify<S>(
    store: &S,
    notifier: &dyn Notifier,
    snapshot: &TimerState,
    completion: Option<&PhaseComplete>,
) -> bool
where
    S: KeyValueStore + ?Sized,
{
    if let Err(e) = write_record(store, TIMER_STATE_KEY, snapshot).await {
        log::warn!("Failed to persist timer state: {}", e);
    }
    completion.is_some_and(|done| notify_phase_complete(notifier, done))
}

/// The page's `Notification` API
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNotifier;

impl Notifier for BrowserNotifier {
    fn permission_granted(&self) -> bool {
        Notification::permission() == NotificationPermission::Granted
    }

    fn show(&self, message: &str) {
        if let Err(e) = Notification::new(message) {
            log::warn!("Failed to show notification: {:?}", e);
        }
    }
}
