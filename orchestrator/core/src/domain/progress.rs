// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Compose Progress Events
//!
//! `docker compose --progress=json` writes one JSON object per line. Each
//! line is parsed on its own into a [`ProgressEvent`] and translated into a
//! log record straight away; events are never stored.

use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

/// Log target used for everything the compose tool reports.
pub const COMPOSE_LOG_TARGET: &str = "compose";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl ProgressLevel {
    /// Map the tool's level names onto tracing levels. Unknown names log as info.
    pub fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "trace" => ProgressLevel::Trace,
            "debug" => ProgressLevel::Debug,
            "warn" | "warning" => ProgressLevel::Warn,
            "error" | "fatal" | "panic" | "critical" => ProgressLevel::Error,
            _ => ProgressLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Leveled message from the tool itself
    Message { level: ProgressLevel, msg: String },
    /// Status change of one container/network/volume
    Status { id: String, status: String },
    /// Valid record that carries neither pair
    Other,
}

#[derive(Debug, Deserialize)]
struct RawProgressLine {
    level: Option<String>,
    msg: Option<String>,
    id: Option<String>,
    status: Option<String>,
}

impl ProgressEvent {
    /// Parse one output line. Anything that is not a JSON object is an error.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        let raw: RawProgressLine = serde_json::from_str(line.trim())?;

        let event = match raw {
            RawProgressLine {
                level: Some(level),
                msg: Some(msg),
                ..
            } if !level.is_empty() && !msg.is_empty() => ProgressEvent::Message {
                level: ProgressLevel::parse(&level),
                msg,
            },
            RawProgressLine {
                id: Some(id),
                status: Some(status),
                ..
            } if !id.is_empty() && !status.is_empty() => ProgressEvent::Status { id, status },
            _ => ProgressEvent::Other,
        };
        Ok(event)
    }

    /// Emit this event as a log record attributed to `stack`.
    pub fn log(&self, stack: &str) {
        match self {
            ProgressEvent::Message { level, msg } => match level {
                ProgressLevel::Trace => trace!(target: COMPOSE_LOG_TARGET, stack, "{}", msg),
                ProgressLevel::Debug => debug!(target: COMPOSE_LOG_TARGET, stack, "{}", msg),
                ProgressLevel::Info => info!(target: COMPOSE_LOG_TARGET, stack, "{}", msg),
                ProgressLevel::Warn => warn!(target: COMPOSE_LOG_TARGET, stack, "{}", msg),
                ProgressLevel::Error => error!(target: COMPOSE_LOG_TARGET, stack, "{}", msg),
            },
            ProgressEvent::Status { id, status } => {
                info!(target: COMPOSE_LOG_TARGET, stack, "{} {}", id, status)
            }
            ProgressEvent::Other => debug!(target: COMPOSE_LOG_TARGET, stack, "progress record without message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_message() {
        let event =
            ProgressEvent::parse_line(r#"{"level":"warning","msg":"image not found locally"}"#)
                .unwrap();
        assert_eq!(
            event,
            ProgressEvent::Message {
                level: ProgressLevel::Warn,
                msg: "image not found locally".to_string()
            }
        );
    }

    #[test]
    fn test_parse_status_with_extra_keys() {
        let line = r#"{"dry-run":false,"id":"Container web-app-1","status":"Started","text":"Started"}"#;
        let event = ProgressEvent::parse_line(line).unwrap();
        assert_eq!(
            event,
            ProgressEvent::Status {
                id: "Container web-app-1".to_string(),
                status: "Started".to_string()
            }
        );
    }

    #[test]
    fn test_level_message_wins_over_status() {
        let line = r#"{"level":"error","msg":"failed","id":"x","status":"Error"}"#;
        assert!(matches!(
            ProgressEvent::parse_line(line).unwrap(),
            ProgressEvent::Message { level: ProgressLevel::Error, .. }
        ));
    }

    #[test]
    fn test_record_without_pairs() {
        assert_eq!(ProgressEvent::parse_line(r#"{"tail":true}"#).unwrap(), ProgressEvent::Other);
    }

    #[test]
    fn test_malformed_line_is_error() {
        assert!(ProgressEvent::parse_line("Container web-app-1  Started").is_err());
        assert!(ProgressEvent::parse_line("42").is_err());
    }

    #[test]
    fn test_unknown_level_is_info() {
        assert_eq!(ProgressLevel::parse("notice"), ProgressLevel::Info);
        assert_eq!(ProgressLevel::parse("ERROR"), ProgressLevel::Error);
    }
}
