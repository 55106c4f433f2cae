use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::level::LevelObserver;
use crate::types::OccupantId;

/// One line of structured output on stderr.
#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: i64,
    pub level: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: &str, event: &str, details: Value) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            level: level.to_string(),
            event: event.to_string(),
            source: None,
            details,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(text) => eprintln!("{text}"),
            Err(error) => eprintln!("[log] failed to serialize {}: {error}", self.event),
        }
    }
}

pub fn emit_log(level: &str, event: &str, details: Value) {
    StructuredLogLine::new(level, event, details).emit();
}

/// Level observer that writes every event as a log line.
#[derive(Clone, Debug)]
pub struct EventLogger {
    source: String,
}

impl EventLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn death_line(&self, player: OccupantId) -> StructuredLogLine {
        StructuredLogLine::new("info", "player_died", json!({ "playerId": player }))
            .with_source(&self.source)
    }

    fn completion_line(&self) -> StructuredLogLine {
        StructuredLogLine::new("info", "level_completed", json!({})).with_source(&self.source)
    }
}

impl LevelObserver for EventLogger {
    fn player_died(&self, player: OccupantId) {
        self.death_line(player).emit();
    }

    fn level_completed(&self) {
        self.completion_line().emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_uses_camel_case_and_skips_missing_source() {
        let line = StructuredLogLine::new("warn", "map_fallback", json!({ "path": "x.txt" }));
        let value = serde_json::to_value(&line).expect("line serializes");
        assert_eq!(value["level"], "warn");
        assert_eq!(value["event"], "map_fallback");
        assert_eq!(value["details"]["path"], "x.txt");
        assert!(value["timestampMs"].as_i64().is_some_and(|ms| ms > 0));
        assert!(value.get("source").is_none());
    }

    #[test]
    fn event_logger_tags_lines_with_its_source() {
        let logger = EventLogger::new("play");
        let death = serde_json::to_value(logger.death_line(OccupantId(3))).expect("serializes");
        assert_eq!(death["event"], "player_died");
        assert_eq!(death["source"], "play");
        assert_eq!(death["details"]["playerId"], 3);

        let done = serde_json::to_value(logger.completion_line()).expect("serializes");
        assert_eq!(done["event"], "level_completed");
        assert_eq!(logger.source(), "play");
    }
}
