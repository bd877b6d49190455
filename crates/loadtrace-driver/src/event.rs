use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Request,
    Response,
    RequestFailed,
    PerformanceMark,
}

impl EventKind {
    /// Responses and failures are the events that close an earlier request.
    pub fn is_completion(self) -> bool {
        matches!(self, EventKind::Response | EventKind::RequestFailed)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::RequestFailed => "request_failed",
            EventKind::PerformanceMark => "performance_mark",
        };
        write!(f, "{label}")
    }
}

/// One raw network occurrence as observed by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverEvent {
    pub kind: EventKind,
    pub url: String,
    /// Empty for responses and failures; drivers only know the type at request time.
    /// Holds the mark name for performance marks, which carry no URL.
    #[serde(default)]
    pub resource_type: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl DriverEvent {
    pub fn request(url: impl Into<String>, resource_type: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EventKind::Request,
            url: url.into(),
            resource_type: resource_type.into(),
            timestamp,
        }
    }

    pub fn response(url: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EventKind::Response,
            url: url.into(),
            resource_type: String::new(),
            timestamp,
        }
    }

    pub fn request_failed(url: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EventKind::RequestFailed,
            url: url.into(),
            resource_type: String::new(),
            timestamp,
        }
    }

    pub fn performance_mark(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: EventKind::PerformanceMark,
            url: String::new(),
            resource_type: name.into(),
            timestamp,
        }
    }
}

/// Navigation marks read from the page once it has settled, in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTiming {
    pub navigation_start: i64,
    pub dom_content_loaded_event_start: i64,
    pub load_event_start: i64,
}

impl PerformanceTiming {
    pub const NAVIGATION_START: &'static str = "navigationStart";
    pub const DOM_CONTENT_LOADED_EVENT_START: &'static str = "domContentLoadedEventStart";
    pub const LOAD_EVENT_START: &'static str = "loadEventStart";

    /// A page that never started navigating reports a zero navigation start.
    pub fn is_available(&self) -> bool {
        self.navigation_start > 0
    }

    /// The three marks as `(name, timestamp)` pairs, in navigation order.
    pub fn marks(&self) -> [(&'static str, i64); 3] {
        [
            (Self::NAVIGATION_START, self.navigation_start),
            (
                Self::DOM_CONTENT_LOADED_EVENT_START,
                self.dom_content_loaded_event_start,
            ),
            (Self::LOAD_EVENT_START, self.load_event_start),
        ]
    }
}
