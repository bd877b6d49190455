use loadtrace_driver::{NetworkCondition, PerformanceTiming};
use serde::{Deserialize, Serialize};

use crate::timeline::{build_timeline, CorrelationPolicy, TimelineEntry};
use crate::{EventLog, MatchRule, SettleOutcome};

/// Recoverable anomalies that degraded a report without failing the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The absolute timeout elapsed before the network went quiet.
    SettleTimeout,
    /// No navigation marks; offsets are absolute timestamps.
    MissingPerformanceMarks,
    /// Events dropped because their URL could not be parsed.
    MalformedUrls { count: u64 },
}

/// Finished page-load timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub page_url: String,
    pub match_rule: MatchRule,
    pub network_condition: NetworkCondition,
    /// Every request the driver reported, retained or not.
    pub request_count: u64,
    pub dom_content_loaded_offset: Option<i64>,
    pub load_offset: Option<i64>,
    /// Offset of the last response seen, retained or not.
    pub final_response_offset: Option<i64>,
    pub settle: SettleOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Degradation>,
    pub timeline: Vec<TimelineEntry>,
}

impl Report {
    pub fn assemble(
        log: EventLog,
        timing: Option<PerformanceTiming>,
        settle: SettleOutcome,
        network_condition: NetworkCondition,
        policy: CorrelationPolicy,
    ) -> Self {
        let mut warnings = Vec::new();
        if settle == SettleOutcome::TimedOut {
            warnings.push(Degradation::SettleTimeout);
        }
        if timing.is_none() {
            warnings.push(Degradation::MissingPerformanceMarks);
        }
        if log.malformed_urls() > 0 {
            warnings.push(Degradation::MalformedUrls {
                count: log.malformed_urls(),
            });
        }

        let navigation_start = timing.map_or(0, |timing| timing.navigation_start);
        let match_rule = log.rule().clone();
        let request_count = log.request_count();
        let final_response_offset = log
            .last_response_at()
            .map(|at| at.saturating_sub(navigation_start));
        let timeline = build_timeline(log.into_events(), timing.as_ref(), policy);

        Self {
            page_url: match_rule.exact_url.clone(),
            match_rule,
            network_condition,
            request_count,
            dom_content_loaded_offset: timing.map(|timing| {
                timing
                    .dom_content_loaded_event_start
                    .saturating_sub(navigation_start)
            }),
            load_offset: timing
                .map(|timing| timing.load_event_start.saturating_sub(navigation_start)),
            final_response_offset,
            settle,
            warnings,
            timeline,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use loadtrace_driver::DriverEvent;
    use pretty_assertions::assert_eq;

    use super::*;

    const PAGE: &str = "https://shop.test/";

    fn filled_log() -> EventLog {
        let mut log = EventLog::new(MatchRule::new(
            vec!["static.shop.test".to_string()],
            vec![],
            PAGE,
        ));
        log.ingest(DriverEvent::request(PAGE, "document", 5_010));
        log.ingest(DriverEvent::request("https://static.shop.test/app.js", "script", 5_100));
        log.ingest(DriverEvent::request("https://tracker.test/pixel", "image", 5_120));
        log.ingest(DriverEvent::response(PAGE, 5_090));
        log.ingest(DriverEvent::response("https://static.shop.test/app.js", 5_200));
        log.ingest(DriverEvent::response("https://tracker.test/pixel", 5_260));
        log
    }

    fn timing() -> PerformanceTiming {
        PerformanceTiming {
            navigation_start: 5_000,
            dom_content_loaded_event_start: 5_300,
            load_event_start: 5_600,
        }
    }

    #[test]
    fn assembles_offsets_against_navigation_start() {
        let report = Report::assemble(
            filled_log(),
            Some(timing()),
            SettleOutcome::Settled,
            NetworkCondition::default(),
            CorrelationPolicy::Nearest,
        );

        assert_eq!(report.page_url, PAGE);
        assert_eq!(report.request_count, 3);
        assert_eq!(report.dom_content_loaded_offset, Some(300));
        assert_eq!(report.load_offset, Some(600));
        assert_eq!(report.final_response_offset, Some(260));
        assert!(!report.is_degraded());
        // four retained events plus three marks
        assert_eq!(report.timeline.len(), 7);
        assert!(report
            .timeline
            .windows(2)
            .all(|pair| pair[0].diff_from_start <= pair[1].diff_from_start));
    }

    #[test]
    fn missing_marks_degrade_to_absolute_offsets() {
        let report = Report::assemble(
            filled_log(),
            None,
            SettleOutcome::TimedOut,
            NetworkCondition::default(),
            CorrelationPolicy::Nearest,
        );

        assert_eq!(
            report.warnings,
            vec![Degradation::SettleTimeout, Degradation::MissingPerformanceMarks]
        );
        assert_eq!(report.dom_content_loaded_offset, None);
        assert_eq!(report.final_response_offset, Some(5_260));
        assert_eq!(report.timeline.len(), 4);
        assert_eq!(report.timeline[0].diff_from_start, 5_010);
    }

    #[test]
    fn serializes_camel_case_fields() {
        let report = Report::assemble(
            filled_log(),
            Some(timing()),
            SettleOutcome::Settled,
            NetworkCondition::default(),
            CorrelationPolicy::Nearest,
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["requestCount"], 3);
        assert_eq!(json["matchRule"]["exactUrl"], PAGE);
        assert_eq!(json["networkCondition"]["downloadMbps"], 100.0);
        assert_eq!(json["settle"], "settled");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn malformed_urls_are_reported() {
        let mut log = filled_log();
        log.ingest(DriverEvent::request("::not a url::", "other", 5_150));
        let report = Report::assemble(
            log,
            Some(timing()),
            SettleOutcome::Settled,
            NetworkCondition::default(),
            CorrelationPolicy::Nearest,
        );

        assert_eq!(report.request_count, 4);
        assert_eq!(report.warnings, vec![Degradation::MalformedUrls { count: 1 }]);
    }

    #[test]
    fn offsets_saturate_for_marks_far_from_navigation_start() {
        let mut log = filled_log();
        log.ingest(DriverEvent::response(PAGE, i64::MIN));
        let timing = PerformanceTiming {
            navigation_start: i64::MAX,
            dom_content_loaded_event_start: i64::MIN,
            load_event_start: i64::MIN + 1,
        };
        let report = Report::assemble(
            log,
            Some(timing),
            SettleOutcome::Settled,
            NetworkCondition::default(),
            CorrelationPolicy::Nearest,
        );

        assert_eq!(report.dom_content_loaded_offset, Some(i64::MIN));
        assert_eq!(report.load_offset, Some(i64::MIN));
        assert_eq!(report.final_response_offset, Some(i64::MIN));
        assert!(report.timeline.iter().all(|entry| entry.diff_from_start <= 0));
    }
}
