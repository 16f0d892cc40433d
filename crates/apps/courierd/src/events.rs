//! The single event queue drained by the dispatch loop.
//!
//! Everything that can mutate dispatch state arrives here: protocol lines
//! from the transport, passthrough output from the host process, and send
//! completions from the platform callback path. Processing is strictly
//! FIFO in arrival order.

use crate::sender::SendOutcome;

#[derive(Debug)]
pub enum Event {
    /// A candidate protocol frame (passed the brace rule); may still be
    /// malformed JSON, which the processor logs and drops.
    Line(String),
    /// A non-frame line from the host, routed to the passthrough log sink.
    Passthrough(String),
    /// Completion signal from a platform send transaction, correlated by
    /// the originating command id.
    SendResult { command_id: i64, outcome: SendOutcome },
    /// The transport reached end of stream; the loop shuts down cleanly.
    Eof,
}
