//! # courierd
//!
//! Device-side daemon of the courier SMS/MMS bridge.
//!
//! The daemon relays between the device message store and a host bridge
//! process over newline-delimited JSON on stdio. Inbound commands request
//! contact, thread, and message data from the store adapters; outbound
//! frames report send results and push state. The core is a
//! single-threaded dispatch loop:
//!
//! ```text
//! stdin ─▶ transport ─▶ event queue ─▶ CommandProcessor ─▶ adapters / sender
//!                                           │
//! stdout ◀─ transport ◀─ outbound queue ◀───┘
//! ```
//!
//! Message sends are fire-and-forget: the processor registers the request
//! id with the [`correlator::Correlator`], submits the platform
//! transaction, and the eventual delivery callback re-enters the same
//! event queue as a [`events::Event::SendResult`], so all correlator
//! mutation happens on one logical execution context.

pub mod bridge;
pub mod config;
pub mod correlator;
pub mod error;
pub mod events;
pub mod platform;
pub mod processor;
pub mod sender;
pub mod transport;

pub use bridge::BridgeHandle;
pub use correlator::Correlator;
pub use error::DaemonError;
pub use events::Event;
pub use processor::CommandProcessor;
