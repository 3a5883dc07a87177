//! Newline-delimited JSON input accepted on stdin.

use serde::Deserialize;
use tidelink_router::{Observation, SystemId};

/// Request to queue a command for later delivery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnqueueRequest {
    /// Destination system id
    pub destination: SystemId,
    /// UTF-8 command text
    pub payload: String,
}

/// One input line: either an observation or a control request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputLine {
    /// `{"enqueue": {"destination": 23, "payload": "..."}}`
    Enqueue {
        /// Command to queue
        enqueue: EnqueueRequest,
    },
    /// Any [`Observation`], tagged by `kind`
    Observation(Observation),
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<serde_json::Result<InputLine>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line))
}
