use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DriverError, DriverEvent, PerformanceTiming};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// URL the recording was captured against, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// Events in the order the capturing driver delivered them.
    #[serde(default)]
    pub events: Vec<DriverEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_timing: Option<PerformanceTiming>,
}

impl Recording {
    pub fn from_json(source: &str) -> Result<Self, DriverError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Instant playback is measured from: navigation start when the recording
    /// has usable marks, otherwise the earliest event.
    pub fn origin(&self) -> i64 {
        match self.performance_timing {
            Some(timing) if timing.is_available() => timing.navigation_start,
            _ => self
                .events
                .iter()
                .map(|event| event.timestamp)
                .min()
                .unwrap_or(0),
        }
    }

    /// Delay after navigation at which `event` is delivered, given the
    /// recording's [`origin`](Self::origin). Events recorded before the origin
    /// are delivered immediately.
    pub fn playback_offset(event: &DriverEvent, origin: i64) -> Duration {
        let offset = event.timestamp.saturating_sub(origin).max(0);
        Duration::from_millis(offset as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_prefers_navigation_start() {
        let recording = Recording {
            page_url: None,
            events: vec![DriverEvent::request("https://a/", "document", 1_000)],
            performance_timing: Some(PerformanceTiming {
                navigation_start: 900,
                dom_content_loaded_event_start: 1_200,
                load_event_start: 1_500,
            }),
        };
        assert_eq!(recording.origin(), 900);
        assert_eq!(
            Recording::playback_offset(&recording.events[0], recording.origin()),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn origin_falls_back_to_earliest_event() {
        let recording = Recording {
            page_url: None,
            events: vec![
                DriverEvent::request("https://a/", "document", 1_050),
                DriverEvent::response("https://a/", 1_020),
            ],
            performance_timing: None,
        };
        assert_eq!(recording.origin(), 1_020);
        assert_eq!(
            Recording::playback_offset(&recording.events[1], recording.origin()),
            Duration::ZERO
        );
    }

    #[test]
    fn offsets_saturate_at_the_timestamp_extremes() {
        let late = DriverEvent::request("https://a/", "document", i64::MAX);
        let early = DriverEvent::request("https://a/", "document", i64::MIN);
        assert_eq!(
            Recording::playback_offset(&late, i64::MIN),
            Duration::from_millis(i64::MAX as u64)
        );
        assert_eq!(Recording::playback_offset(&early, i64::MAX), Duration::ZERO);
    }

    #[test]
    fn malformed_json_is_a_recording_error() {
        let error = Recording::from_json("{\"events\": 3}").unwrap_err();
        assert!(matches!(error, DriverError::Recording(_)));
    }
}
