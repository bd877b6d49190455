//! Page-load network timeline capture.
//!
//! A session filters the raw network events a [`BrowserDriver`] reports,
//! waits for the page's network activity to settle, and correlates what it
//! kept into a [`Report`] anchored to navigation start.
//!
//! [`BrowserDriver`]: loadtrace_driver::BrowserDriver

pub mod config;
pub mod error;
pub mod event_log;
pub mod match_rule;
pub mod report;
pub mod session;
pub mod settle;
pub mod timeline;

pub use config::SessionConfig;
pub use error::SessionError;
pub use event_log::{EventLog, NetworkEvent, RawCounts};
pub use match_rule::MatchRule;
pub use report::{Degradation, Report};
pub use session::run;
pub use settle::{SettleDetector, SettleOutcome};
pub use timeline::{build_timeline, CorrelationPolicy, TimelineEntry};
