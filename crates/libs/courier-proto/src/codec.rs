//! Line codec for the stdio transport.
//!
//! Frames are one JSON object per line. Only lines that look like a JSON
//! object — after trimming, starting with `{` and ending with `}` — are
//! protocol frames; everything else on the stream belongs to the host
//! process's passthrough log sink.

use crate::envelope::Envelope;
use crate::error::WireError;

/// Returns true when the line should be treated as a protocol frame.
#[must_use]
pub fn is_frame(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Decodes one line into an envelope.
///
/// # Errors
///
/// Returns [`WireError::Json`] for malformed JSON and
/// [`WireError::MissingCommand`] when the command name is empty.
pub fn decode_line(line: &str) -> Result<Envelope, WireError> {
    let envelope: Envelope = serde_json::from_str(line.trim())?;
    if envelope.command.is_empty() {
        return Err(WireError::MissingCommand);
    }
    Ok(envelope)
}

/// Encodes an envelope as a single line (no trailing newline; the
/// transport appends one).
///
/// # Errors
///
/// Returns [`WireError::Json`] if serialization fails.
pub fn encode_line(envelope: &Envelope) -> Result<String, WireError> {
    Ok(serde_json::to_string(envelope)?)
}
