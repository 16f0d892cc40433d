//! Collaborator surfaces consumed from the hosting platform.
//!
//! The daemon core never talks to the platform directly — permission
//! state, the foreground indicator, and the deferred-work scheduler are
//! all behind traits so deployments wire the real surfaces and tests wire
//! recorders. Stubs log and do nothing, so a bare daemon still runs.

use log::{debug, info};

/// Boolean capability check consulted before any send-path work.
pub trait PermissionGate {
    fn has_sms_permissions(&self) -> bool;
}

/// Permission state from configuration, for deployments without a live
/// platform permission service.
pub struct ConfigPermissions {
    granted: bool,
}

impl ConfigPermissions {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl PermissionGate for ConfigPermissions {
    fn has_sms_permissions(&self) -> bool {
        self.granted
    }
}

/// Foreground indicator keyed by a caller-supplied channel id and icon.
pub trait NotificationSink {
    fn foreground_started(&self, channel_id: &str, icon: Option<i64>);
    fn foreground_stopped(&self);
}

pub struct StubNotifications;

impl NotificationSink for StubNotifications {
    fn foreground_started(&self, channel_id: &str, icon: Option<i64>) {
        info!("foreground indicator started (channel={channel_id}, icon={icon:?})");
    }

    fn foreground_stopped(&self) {
        info!("foreground indicator stopped");
    }
}

/// Best-effort deferred work: re-forward a message to the bridge once
/// conditions allow (the platform scheduler owns retry/network policy).
pub trait JobScheduler {
    fn enqueue_forward(&self, message_guid: &str);
}

pub struct StubScheduler;

impl JobScheduler for StubScheduler {
    fn enqueue_forward(&self, message_guid: &str) {
        debug!("no scheduler wired, dropping deferred forward of {message_guid}");
    }
}
