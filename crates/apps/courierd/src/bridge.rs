//! Outbound side of the bridge connection.
//!
//! `BridgeHandle` owns the outbound frame channel plus the correlator and
//! is the only way frames leave the daemon: fire-and-forget via [`send`],
//! or correlated request/response via [`request`], which registers the
//! waiter before the frame is written so the reply can never race the
//! registration.
//!
//! [`send`]: BridgeHandle::send
//! [`request`]: BridgeHandle::request

use std::rc::Rc;

use log::warn;
use serde_json::Value;
use tokio::sync::mpsc;

use courier_proto::Envelope;

use crate::correlator::Correlator;
use crate::error::DaemonError;

#[derive(Clone)]
pub struct BridgeHandle {
    outbound: mpsc::UnboundedSender<Envelope>,
    correlator: Rc<Correlator>,
}

impl BridgeHandle {
    pub fn new(outbound: mpsc::UnboundedSender<Envelope>, correlator: Rc<Correlator>) -> Self {
        Self {
            outbound,
            correlator,
        }
    }

    /// Writes one frame. A closed transport is logged, not fatal — the
    /// dispatch loop keeps running until its own input ends.
    pub fn send(&self, envelope: Envelope) {
        if self.outbound.send(envelope).is_err() {
            warn!("outbound transport closed, dropping frame");
        }
    }

    /// Sends a device-initiated request and awaits the bridge's response.
    ///
    /// # Errors
    ///
    /// [`DaemonError::ChannelClosed`] when the transport or waiter channel
    /// is gone; [`DaemonError::Rejected`] when the bridge answers with a
    /// typed error body.
    pub async fn request(
        &self,
        command: impl Into<String>,
        data: Value,
    ) -> Result<Value, DaemonError> {
        let envelope = Envelope::request(command, data);
        let id = envelope.id.unwrap_or_default();
        let rx = self.correlator.register(id);
        self.send(envelope);
        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(body)) => Err(DaemonError::Rejected(body)),
            Err(_) => Err(DaemonError::ChannelClosed),
        }
    }

    pub fn correlator(&self) -> &Rc<Correlator> {
        &self.correlator
    }
}
