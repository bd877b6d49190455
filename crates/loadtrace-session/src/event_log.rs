use loadtrace_driver::{DriverEvent, EventKind};
use serde::{Deserialize, Serialize};

use crate::MatchRule;

/// A retained event. Immutable once logged; offsets are derived later on
/// [`TimelineEntry`](crate::TimelineEntry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEvent {
    pub timestamp: i64,
    pub kind: EventKind,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_name: Option<String>,
}

impl NetworkEvent {
    pub fn performance_mark(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            timestamp,
            kind: EventKind::PerformanceMark,
            resource_type: String::new(),
            url: None,
            mark_name: Some(name.into()),
        }
    }
}

impl From<DriverEvent> for NetworkEvent {
    fn from(raw: DriverEvent) -> Self {
        if raw.kind == EventKind::PerformanceMark {
            return Self::performance_mark(raw.resource_type, raw.timestamp);
        }
        Self {
            timestamp: raw.timestamp,
            kind: raw.kind,
            resource_type: raw.resource_type,
            url: Some(raw.url),
            mark_name: None,
        }
    }
}

/// Raw event counts, independent of filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCounts {
    pub requests: u64,
    pub responses: u64,
    pub failures: u64,
}

/// Append-only store of the events one session retains.
#[derive(Debug)]
pub struct EventLog {
    rule: MatchRule,
    events: Vec<NetworkEvent>,
    counts: RawCounts,
    last_response_at: Option<i64>,
    malformed_urls: u64,
}

impl EventLog {
    pub fn new(rule: MatchRule) -> Self {
        Self {
            rule,
            events: Vec::new(),
            counts: RawCounts::default(),
            last_response_at: None,
            malformed_urls: 0,
        }
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    pub fn record_raw(&mut self, kind: EventKind) {
        match kind {
            EventKind::Request => self.counts.requests += 1,
            EventKind::Response => self.counts.responses += 1,
            EventKind::RequestFailed => self.counts.failures += 1,
            EventKind::PerformanceMark => {}
        }
    }

    /// Stores `event` if it is a performance mark or its URL is of interest.
    /// Returns whether the event was kept.
    pub fn append(&mut self, event: NetworkEvent) -> bool {
        let keep = match (&event.kind, event.url.as_deref()) {
            (EventKind::PerformanceMark, _) => true,
            (_, Some(url)) => self.rule.is_of_interest(url),
            (_, None) => false,
        };
        if keep {
            self.events.push(event);
        }
        keep
    }

    /// Counts, validates and filters one raw driver event.
    pub fn ingest(&mut self, raw: DriverEvent) -> bool {
        self.record_raw(raw.kind);
        if raw.kind == EventKind::Response {
            self.last_response_at = Some(raw.timestamp);
        }
        if raw.kind == EventKind::PerformanceMark {
            return self.append(NetworkEvent::from(raw));
        }

        if let Err(error) = url::Url::parse(&raw.url) {
            self.malformed_urls += 1;
            tracing::warn!(
                target: "loadtrace_session",
                kind = %raw.kind,
                url = %raw.url,
                error = %error,
                "dropping event with malformed url"
            );
            return false;
        }

        let kind = raw.kind;
        let kept = self.append(NetworkEvent::from(raw));
        if kept {
            if let Some(event) = self.events.last() {
                tracing::debug!(
                    target: "loadtrace_session",
                    kind = %kind,
                    resource_type = %event.resource_type,
                    url = event.url.as_deref().unwrap_or_default(),
                    "event retained"
                );
            }
        }
        kept
    }

    pub fn snapshot(&self) -> &[NetworkEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<NetworkEvent> {
        self.events
    }

    pub fn counts(&self) -> RawCounts {
        self.counts
    }

    pub fn request_count(&self) -> u64 {
        self.counts.requests
    }

    /// Timestamp of the most recent response seen, retained or not.
    pub fn last_response_at(&self) -> Option<i64> {
        self.last_response_at
    }

    pub fn malformed_urls(&self) -> u64 {
        self.malformed_urls
    }
}
