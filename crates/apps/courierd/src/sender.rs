//! Outbound SMS/MMS submission.
//!
//! Sends are fire-and-forget: the processor attaches the originating
//! command id as the correlation token, the platform transaction runs on
//! its own, and the eventual delivery/sent callback posts a
//! [`Event::SendResult`] back onto the dispatch queue.
//!
//! [`Event::SendResult`]: crate::events::Event::SendResult

use log::warn;
use tokio::sync::mpsc;

use crate::events::Event;

/// Hard cap on attachment size for media sends, in bytes.
pub const MAX_FILE_SIZE: u64 = 400_000;

/// One outbound transmission handed to the platform send surface.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingSend {
    Text {
        text: String,
        recipients: Vec<String>,
        thread_id: i64,
    },
    Media {
        recipients: Vec<String>,
        bytes: Vec<u8>,
        mime_type: String,
        file_name: String,
        thread_id: i64,
    },
}

/// Terminal signal from the platform for one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The message left the device; `guid` is its store identity.
    Sent { guid: String, timestamp: i64 },
    Failed { reason: String },
}

/// Platform send-transaction surface. Implementations must eventually
/// post exactly one `SendResult` for the token (duplicates are tolerated
/// by the correlator, but not required).
pub trait SendTransaction {
    fn submit(&self, send: OutgoingSend, token: i64);
}

/// Default transaction for deployments without a radio wired: every
/// submission immediately completes as failed.
pub struct StubTransaction {
    events: mpsc::UnboundedSender<Event>,
}

impl StubTransaction {
    pub fn new(events: mpsc::UnboundedSender<Event>) -> Self {
        Self { events }
    }
}

impl SendTransaction for StubTransaction {
    fn submit(&self, _send: OutgoingSend, token: i64) {
        let posted = self.events.send(Event::SendResult {
            command_id: token,
            outcome: SendOutcome::Failed {
                reason: "platform send transaction not wired".to_string(),
            },
        });
        if posted.is_err() {
            warn!("event queue closed, dropping send completion for #{token}");
        }
    }
}

/// Human-readable SI file size, e.g. `391 kB`, `1.2 MB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];
    if bytes < 1_000 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1_000.0 && unit < UNITS.len() - 1 {
        value /= 1_000.0;
        unit += 1;
    }
    if value < 10.0 && value.fract() >= 0.05 {
        format!("{value:.1} {}", UNITS[unit])
    } else {
        format!("{value:.0} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_si_sizes() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(999), "999 B");
        assert_eq!(format_file_size(400_000), "400 kB");
        assert_eq!(format_file_size(1_200_000), "1.2 MB");
        assert_eq!(format_file_size(2_500), "2.5 kB");
        assert_eq!(format_file_size(25_000), "25 kB");
    }

    #[tokio::test]
    async fn stub_transaction_fails_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stub = StubTransaction::new(tx);
        stub.submit(
            OutgoingSend::Text {
                text: "hi".to_string(),
                recipients: vec!["+1".to_string()],
                thread_id: 0,
            },
            41,
        );
        match rx.recv().await.expect("completion event") {
            Event::SendResult { command_id, outcome } => {
                assert_eq!(command_id, 41);
                assert!(matches!(outcome, SendOutcome::Failed { .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
