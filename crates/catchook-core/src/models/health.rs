use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub redis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub services: ServiceStatus,
    #[serde(default)]
    pub is_first_time_setup: bool,
}

impl HealthCheckResponse {
    /// True when the backend has no administrator yet and the app must go to `/setup`
    pub fn requires_setup(&self) -> bool {
        self.is_first_time_setup && self.status != "unknown"
    }
}

/// API status indicator shown in the title bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Checking,
    Operational,
    Warning,
    Error,
    Unknown,
}

impl ApiStatus {
    pub fn from_health(loading: bool, failed: bool, health: Option<&HealthCheckResponse>) -> Self {
        if loading {
            return ApiStatus::Checking;
        }
        if failed {
            return ApiStatus::Error;
        }
        match health {
            None => ApiStatus::Unknown,
            Some(h) if h.status == "ok" || h.status == "healthy" => ApiStatus::Operational,
            Some(_) => ApiStatus::Warning,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApiStatus::Checking => "API CHECKING",
            ApiStatus::Operational => "API OPERATIONAL",
            ApiStatus::Warning => "API WARNING",
            ApiStatus::Error => "API ERROR",
            ApiStatus::Unknown => "API UNKNOWN",
        }
    }
}
