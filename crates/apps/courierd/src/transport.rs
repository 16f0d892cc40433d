//! Line transport pumps for the stdio stream.
//!
//! The reader pump classifies each incoming line with the brace rule —
//! lines that look like a JSON object become candidate frames, anything
//! else is passthrough — and posts [`Event::Eof`] once, when the stream
//! ends. The writer pump drains the outbound envelope queue, one frame
//! per line, flushing after each so the bridge sees frames promptly.

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use courier_proto::{encode_line, is_frame, Envelope};

use crate::events::Event;

/// Reads lines until EOF, posting each onto the event queue.
pub async fn pump_reader<R>(reader: R, events: mpsc::UnboundedSender<Event>) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let event = if is_frame(&line) {
            Event::Line(line)
        } else {
            Event::Passthrough(line)
        };
        if events.send(event).is_err() {
            warn!("event queue closed, stopping reader");
            break;
        }
    }
    debug!("input stream ended");
    let _ = events.send(Event::Eof);
    Ok(())
}

/// Writes outbound envelopes as newline-delimited JSON until the queue
/// closes.
pub async fn pump_writer<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Envelope>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(envelope) = outbound.recv().await {
        let line = match encode_line(&envelope) {
            Ok(line) => line,
            Err(err) => {
                warn!("dropping unencodable frame: {err}");
                continue;
            }
        };
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    debug!("outbound queue closed");
    Ok(())
}
