//! Event channel model
//!
//! Server-pushed messages are JSON envelopes `{channel, data}` multiplexed
//! over one persistent connection. Payloads are decoded into one shape per
//! channel at the boundary; unknown channels and undecodable payloads are
//! dropped there and never reach subscribers.

use crate::error::GangwayError;
use serde::{Deserialize, Serialize};

/// Named logical stream multiplexed over the event connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Task,
    Permission,
    Debug,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Task, Channel::Permission, Channel::Debug];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Channel::Task => "task-event",
            Channel::Permission => "permission-request",
            Channel::Debug => "debug-log",
        }
    }

    pub fn from_wire(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.wire_name() == name)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Raw wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,
    pub data: serde_json::Value,
}

/// Progress of a shell-side task run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub task_id: String,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A tool call waiting on user approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub request_id: String,
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Diagnostic line forwarded from the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugEntry {
    pub level: String,
    pub message: String,
}

/// One decoded payload shape per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    Task(TaskEvent),
    Permission(PermissionRequest),
    Debug(DebugEntry),
}

impl EventData {
    pub fn channel(&self) -> Channel {
        match self {
            EventData::Task(_) => Channel::Task,
            EventData::Permission(_) => Channel::Permission,
            EventData::Debug(_) => Channel::Debug,
        }
    }

    /// Decode an envelope payload for a known channel.
    pub fn decode(channel: Channel, data: serde_json::Value) -> Result<Self, GangwayError> {
        let decoded = match channel {
            Channel::Task => EventData::Task(
                serde_json::from_value(data)
                    .map_err(|e| GangwayError::Envelope(format!("{channel}: {e}")))?,
            ),
            Channel::Permission => EventData::Permission(
                serde_json::from_value(data)
                    .map_err(|e| GangwayError::Envelope(format!("{channel}: {e}")))?,
            ),
            Channel::Debug => EventData::Debug(
                serde_json::from_value(data)
                    .map_err(|e| GangwayError::Envelope(format!("{channel}: {e}")))?,
            ),
        };
        Ok(decoded)
    }

    /// Parse a raw text frame into a decoded event.
    pub fn from_frame(text: &str) -> Result<Self, GangwayError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| GangwayError::Envelope(e.to_string()))?;
        let channel = Channel::from_wire(&envelope.channel)
            .ok_or(GangwayError::UnknownChannel(envelope.channel))?;
        Self::decode(channel, envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_wire(channel.wire_name()), Some(channel));
        }
        assert_eq!(Channel::from_wire("nonsense"), None);
    }

    #[test]
    fn frame_decodes_task_event() {
        let frame = r#"{"channel":"task-event","data":{"task_id":"t1","phase":"running"}}"#;
        let event = EventData::from_frame(frame).unwrap();
        assert_eq!(event.channel(), Channel::Task);
        assert_eq!(
            event,
            EventData::Task(TaskEvent {
                task_id: "t1".to_string(),
                phase: "running".to_string(),
                message: None,
            })
        );
    }

    #[test]
    fn non_json_frame_is_an_envelope_error() {
        let err = EventData::from_frame("not json").unwrap_err();
        assert!(matches!(err, GangwayError::Envelope(_)));
    }

    #[test]
    fn unknown_channel_is_reported_as_such() {
        let frame = r#"{"channel":"mystery","data":{}}"#;
        let err = EventData::from_frame(frame).unwrap_err();
        assert!(matches!(err, GangwayError::UnknownChannel(name) if name == "mystery"));
    }

    #[test]
    fn payload_shape_mismatch_is_an_envelope_error() {
        // Valid envelope, wrong payload shape for the channel.
        let frame = r#"{"channel":"debug-log","data":{"task_id":"t1"}}"#;
        let err = EventData::from_frame(frame).unwrap_err();
        assert!(matches!(err, GangwayError::Envelope(_)));
    }
}
