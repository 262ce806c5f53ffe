//! Notification sink: where decoded alerts go.
//!
//! The UI layer owns display and queueing. A sink must not block; it is
//! called from the channel task once per alert, in arrival order.

use filingdesk_core::AlertMessage;

pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, alert: AlertMessage);
}

impl<F> NotificationSink for F
where
    F: Fn(AlertMessage) + Send + Sync + 'static,
{
    fn notify(&self, alert: AlertMessage) {
        self(alert)
    }
}
