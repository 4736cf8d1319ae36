use thiserror::Error;

#[derive(Error, Debug)]
pub enum SvcoffError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Service '{service}' does not exist")]
    ServiceNotFound { service: String },

    #[error("Failed to query service '{service}': {message}")]
    ServiceQuery { service: String, message: String },

    #[error("Service '{service}' does not accept stop requests")]
    StopRejected { service: String },

    #[error("Service '{service}' did not stop within {timeout_secs:.1}s (last state: {last_state})")]
    StopTimeout {
        service: String,
        timeout_secs: f64,
        last_state: String,
    },

    #[error("Failed to stop service '{service}': {message}")]
    StopFailed { service: String, message: String },

    #[error("Failed to disable service '{service}': {message}")]
    DisableFailed { service: String, message: String },

    #[error("System error: {message}")]
    System { message: String },
}

impl SvcoffError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(service: S) -> Self {
        Self::ServiceNotFound {
            service: service.into(),
        }
    }

    pub fn query<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ServiceQuery {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn stop_failed<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::StopFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn disable_failed<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::DisableFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to a single service rather than the run as a whole
    pub fn is_service_level(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotFound { .. }
                | Self::ServiceQuery { .. }
                | Self::StopRejected { .. }
                | Self::StopTimeout { .. }
                | Self::StopFailed { .. }
                | Self::DisableFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SvcoffError>;
