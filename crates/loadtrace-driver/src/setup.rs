use serde::{Deserialize, Serialize};

/// User agent presented when the real one is not requested.
pub const BOT_USER_AGENT: &str = "bot";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Pc,
    Android,
    Ios,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeviceKind::Pc => "pc",
            DeviceKind::Android => "android",
            DeviceKind::Ios => "ios",
        };
        write!(f, "{label}")
    }
}

/// Throughput and latency the driver should emulate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkCondition {
    /// Megabits per second.
    pub download_mbps: f64,
    /// Megabits per second.
    pub upload_mbps: f64,
    pub latency_ms: u64,
}

impl Default for NetworkCondition {
    fn default() -> Self {
        Self {
            download_mbps: 100.0,
            upload_mbps: 100.0,
            latency_ms: 0,
        }
    }
}

impl NetworkCondition {
    pub fn download_bytes_per_sec(&self) -> f64 {
        mbps_to_bytes_per_sec(self.download_mbps)
    }

    pub fn upload_bytes_per_sec(&self) -> f64 {
        mbps_to_bytes_per_sec(self.upload_mbps)
    }
}

fn mbps_to_bytes_per_sec(mbps: f64) -> f64 {
    mbps * 1024.0 * 1024.0 / 8.0
}

/// Page environment applied by the driver before navigation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSetup {
    pub headless: bool,
    pub device: DeviceKind,
    pub network: NetworkCondition,
    pub use_real_user_agent: bool,
}

impl PageSetup {
    /// The user agent override to apply, if any.
    pub fn user_agent_override(&self) -> Option<&'static str> {
        (!self.use_real_user_agent).then_some(BOT_USER_AGENT)
    }
}
