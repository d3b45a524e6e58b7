//! Responder payloads
//!
//! A responder history line carries the events of one generation as a
//! JSON array. The same text is what replicates to followers.

use crate::Result;
use colloquy_core::Event;

/// Serialize the events of one generation
pub fn encode_events(events: &[Event]) -> Result<String> {
    Ok(serde_json::to_string(events)?)
}

/// Parse a responder payload; the text must be a JSON array of events
pub fn decode_events(text: &str) -> Result<Vec<Event>> {
    Ok(serde_json::from_str(text.trim())?)
}

/// Parse leniently for display: an array or a single event object
pub(crate) fn decode_for_display(text: &str) -> Option<Vec<Event>> {
    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).ok()
    } else if trimmed.starts_with('{') {
        serde_json::from_str::<Event>(trimmed).ok().map(|e| vec![e])
    } else {
        None
    }
}
