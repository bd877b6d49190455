use loadtrace_driver::{EventKind, PerformanceTiming};
use serde::{Deserialize, Serialize};

use crate::NetworkEvent;

/// Which earlier request a response or failure is attributed to when several
/// requests share its URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationPolicy {
    /// The closest preceding request with the same URL.
    #[default]
    Nearest,
    /// The first request with the same URL in the timeline. Matches what
    /// earlier versions of this tool reported.
    Earliest,
}

/// One event of the finished timeline, with its derived offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub timestamp: i64,
    pub kind: EventKind,
    /// For responses and failures, copied from the matched request.
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_name: Option<String>,
    pub diff_from_start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_from_request: Option<i64>,
}

/// Orders retained events by timestamp and derives their offsets.
///
/// The navigation marks in `timing`, when present, are added as
/// performance-mark entries and `navigation_start` anchors `diff_from_start`.
/// Without marks the anchor is 0 and offsets are absolute timestamps.
pub fn build_timeline(
    events: Vec<NetworkEvent>,
    timing: Option<&PerformanceTiming>,
    policy: CorrelationPolicy,
) -> Vec<TimelineEntry> {
    let mut ordered = events;
    let navigation_start = match timing {
        Some(timing) => {
            ordered.extend(
                timing
                    .marks()
                    .into_iter()
                    .map(|(name, at)| NetworkEvent::performance_mark(name, at)),
            );
            timing.navigation_start
        }
        None => 0,
    };
    // Stable: a request and its own response may share a millisecond.
    ordered.sort_by_key(|event| event.timestamp);

    let mut timeline: Vec<TimelineEntry> = Vec::with_capacity(ordered.len());
    for event in ordered {
        let mut entry = TimelineEntry {
            timestamp: event.timestamp,
            kind: event.kind,
            resource_type: event.resource_type,
            url: event.url,
            mark_name: event.mark_name,
            diff_from_start: event.timestamp.saturating_sub(navigation_start),
            diff_from_request: None,
        };
        if entry.kind.is_completion() {
            if let Some(request) = matching_request(&timeline, entry.url.as_deref(), policy) {
                entry.diff_from_request = Some(entry.timestamp.saturating_sub(request.timestamp));
                entry.resource_type = request.resource_type.clone();
            }
        }
        timeline.push(entry);
    }
    timeline
}

/// Scans `earlier` newest-to-oldest for a request to `url`.
fn matching_request<'a>(
    earlier: &'a [TimelineEntry],
    url: Option<&str>,
    policy: CorrelationPolicy,
) -> Option<&'a TimelineEntry> {
    let url = url?;
    let mut requests = earlier
        .iter()
        .rev()
        .filter(|entry| entry.kind == EventKind::Request && entry.url.as_deref() == Some(url));
    match policy {
        CorrelationPolicy::Nearest => requests.next(),
        CorrelationPolicy::Earliest => requests.last(),
    }
}

#[cfg(test)]
mod tests {
    use loadtrace_driver::DriverEvent;
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(raw: DriverEvent) -> NetworkEvent {
        NetworkEvent::from(raw)
    }

    fn timing() -> PerformanceTiming {
        PerformanceTiming {
            navigation_start: 1_000,
            dom_content_loaded_event_start: 1_400,
            load_event_start: 1_900,
        }
    }

    #[test]
    fn nearest_preceding_request_is_matched() {
        let events = vec![
            event(DriverEvent::request("https://a/x", "script", 0)),
            event(DriverEvent::request("https://a/x", "fetch", 100)),
            event(DriverEvent::response("https://a/x", 150)),
        ];
        let timeline = build_timeline(events, None, CorrelationPolicy::Nearest);

        let response = &timeline[2];
        assert_eq!(response.diff_from_request, Some(50));
        assert_eq!(response.resource_type, "fetch");
    }

    #[test]
    fn earliest_policy_matches_first_request() {
        let events = vec![
            event(DriverEvent::request("https://a/x", "script", 0)),
            event(DriverEvent::request("https://a/x", "fetch", 100)),
            event(DriverEvent::response("https://a/x", 150)),
        ];
        let timeline = build_timeline(events, None, CorrelationPolicy::Earliest);

        assert_eq!(timeline[2].diff_from_request, Some(150));
        assert_eq!(timeline[2].resource_type, "script");
    }

    #[test]
    fn requests_after_the_response_are_not_matched() {
        let events = vec![
            event(DriverEvent::response("https://a/x", 50)),
            event(DriverEvent::request("https://a/x", "script", 80)),
        ];
        let timeline = build_timeline(events, None, CorrelationPolicy::Nearest);

        assert_eq!(timeline[0].kind, EventKind::Response);
        assert_eq!(timeline[0].diff_from_request, None);
        assert_eq!(timeline[0].resource_type, "");
    }

    #[test]
    fn failures_are_correlated_like_responses() {
        let events = vec![
            event(DriverEvent::request("https://a/ad.js", "script", 1_100)),
            event(DriverEvent::request_failed("https://a/ad.js", 1_350)),
        ];
        let timeline = build_timeline(events, Some(&timing()), CorrelationPolicy::Nearest);

        let failure = timeline
            .iter()
            .find(|entry| entry.kind == EventKind::RequestFailed)
            .unwrap();
        assert_eq!(failure.diff_from_request, Some(250));
        assert_eq!(failure.diff_from_start, 350);
        assert_eq!(failure.resource_type, "script");
    }

    #[test]
    fn marks_are_added_and_everything_is_sorted() {
        let events = vec![
            event(DriverEvent::response("https://a/", 1_300)),
            event(DriverEvent::request("https://a/", "document", 1_010)),
            event(DriverEvent::request("https://a/app.js", "script", 1_500)),
        ];
        let timeline = build_timeline(events, Some(&timing()), CorrelationPolicy::Nearest);

        assert_eq!(timeline.len(), 6);
        let offsets: Vec<i64> = timeline.iter().map(|entry| entry.diff_from_start).collect();
        assert_eq!(offsets, vec![0, 10, 300, 400, 500, 900]);
        assert_eq!(timeline[0].mark_name.as_deref(), Some("navigationStart"));
        assert_eq!(timeline[2].diff_from_request, Some(290));
        assert_eq!(timeline[2].resource_type, "document");
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let events = vec![
            event(DriverEvent::request("https://a/x", "image", 10)),
            event(DriverEvent::response("https://a/x", 10)),
        ];
        let timeline = build_timeline(events, None, CorrelationPolicy::Nearest);

        assert_eq!(timeline[0].kind, EventKind::Request);
        assert_eq!(timeline[1].diff_from_request, Some(0));
    }

    #[test]
    fn extreme_timestamps_saturate_instead_of_overflowing() {
        let events = vec![
            event(DriverEvent::request("https://a/x", "script", i64::MIN)),
            event(DriverEvent::response("https://a/x", i64::MAX)),
        ];
        let timeline = build_timeline(events, Some(&timing()), CorrelationPolicy::Nearest);

        let first = timeline.first().unwrap();
        let last = timeline.last().unwrap();
        assert_eq!(first.diff_from_start, i64::MIN);
        assert_eq!(last.diff_from_start, i64::MAX - 1_000);
        assert_eq!(last.diff_from_request, Some(i64::MAX));
    }

    #[test]
    fn missing_marks_leave_absolute_offsets() {
        let events = vec![event(DriverEvent::request("https://a/", "document", 1_010))];
        let timeline = build_timeline(events, None, CorrelationPolicy::Nearest);

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].diff_from_start, 1_010);
    }

    #[test]
    fn serializes_with_camel_case_offsets() {
        let events = vec![
            event(DriverEvent::request("https://a/x", "script", 1_100)),
            event(DriverEvent::response("https://a/x", 1_150)),
        ];
        let timeline = build_timeline(events, Some(&timing()), CorrelationPolicy::Nearest);
        let json = serde_json::to_value(&timeline[2]).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "timestamp": 1_150,
                "kind": "response",
                "resourceType": "script",
                "url": "https://a/x",
                "diffFromStart": 150,
                "diffFromRequest": 50,
            })
        );
    }
}
