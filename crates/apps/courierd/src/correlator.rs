//! Request/response correlation for in-flight asynchronous operations.
//!
//! A process-wide table mapping request id to a waiting caller. Entries
//! are registered before the corresponding operation can possibly
//! complete (registration and submission happen in the same dispatch
//! turn) and are fulfilled exactly once: `fulfill` removes the entry, so
//! a duplicate or late signal finds nothing and is dropped with a log
//! line. No timeout is enforced here — an operation that never completes
//! leaks its entry, which is an accepted gap; expiry policy belongs to
//! the host bridge.

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, warn};
use serde_json::Value;
use tokio::sync::oneshot;

use courier_proto::ErrorBody;

/// What a waiter eventually receives: the bridge's response data, or a
/// typed failure from the send path.
pub type CommandResult = Result<Value, ErrorBody>;

#[derive(Default)]
pub struct Correlator {
    pending: Mutex<HashMap<i64, oneshot::Sender<CommandResult>>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `id` and returns the receiving half.
    ///
    /// Re-registering an id replaces the previous waiter (which then
    /// observes a closed channel) and logs; overlapping ids indicate a
    /// confused host.
    pub fn register(&self, id: i64) -> oneshot::Receiver<CommandResult> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().expect("correlator mutex poisoned");
        if pending.insert(id, tx).is_some() {
            warn!("replaced pending waiter for request #{id}");
        }
        rx
    }

    /// Removes and resolves the waiter for `id`. Returns false when no
    /// waiter exists — duplicate platform callbacks and late replies land
    /// here and are dropped.
    pub fn fulfill(&self, id: i64, result: CommandResult) -> bool {
        let waiter = {
            let mut pending = self.pending.lock().expect("correlator mutex poisoned");
            pending.remove(&id)
        };
        match waiter {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!("waiter for request #{id} went away before fulfillment");
                }
                true
            }
            None => {
                debug!("no pending waiter for request #{id}, dropping");
                false
            }
        }
    }

    /// Number of in-flight entries.
    pub fn pending(&self) -> usize {
        self.pending.lock().expect("correlator mutex poisoned").len()
    }
}
