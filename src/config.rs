use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Hard ceiling on concurrently running shutdown operations
pub const MAX_PARALLEL: usize = 10;

/// Services disabled when nothing is named on the command line
pub const DEFAULT_SERVICES: &[&str] = &[
    "DiagTrack",
    "dmwappushservice",
    "SysMain",
    "WSearch",
    "wuauserv",
    "MapsBroker",
    "RetailDemo",
    "Fax",
    "XblAuthManager",
    "XblGameSave",
    "XboxNetApiSvc",
    "XboxGipSvc",
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SvcoffConfig {
    pub orchestrator: OrchestratorConfig,
    pub services: ServicesConfig,
    pub precheck: PrecheckConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OrchestratorConfig {
    /// Maximum shutdown operations in flight at once
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// How long to wait for a service to reach the stopped state
    #[serde(default = "default_stop_timeout_seconds")]
    pub stop_timeout_seconds: u64,

    /// Interval between state queries while waiting for a stop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServicesConfig {
    /// Service names to stop and disable
    #[serde(default = "default_service_names")]
    pub names: Vec<String>,

    /// Service control backend
    #[serde(default)]
    pub backend: BackendKind,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrecheckConfig {
    /// Refuse to run without administrator / root privileges
    #[serde(default = "default_require_admin")]
    pub require_admin: bool,

    /// Refuse to run on an unsupported OS
    #[serde(default = "default_require_supported_os")]
    pub require_supported_os: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `sc.exe` on Windows, systemd everywhere else
    #[default]
    Auto,
    Windows,
    Systemd,
}

impl BackendKind {
    /// Resolve `Auto` against the platform we were built for
    pub fn resolve(self) -> Self {
        match self {
            BackendKind::Auto if cfg!(windows) => BackendKind::Windows,
            BackendKind::Auto => BackendKind::Systemd,
            other => other,
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "windows" | "sc" => Ok(BackendKind::Windows),
            "systemd" | "systemctl" => Ok(BackendKind::Systemd),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl OrchestratorConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SvcoffConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("svcoff.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("orchestrator.max_parallel", default_max_parallel() as i64)?
            .set_default(
                "orchestrator.stop_timeout_seconds",
                default_stop_timeout_seconds() as i64,
            )?
            .set_default(
                "orchestrator.poll_interval_ms",
                default_poll_interval_ms() as i64,
            )?
            .set_default("services.names", default_service_names())?
            .set_default("services.backend", "auto")?
            .set_default("precheck.require_admin", default_require_admin())?
            .set_default(
                "precheck.require_supported_os",
                default_require_supported_os(),
            )?
            .add_source(File::with_name(&path_str).required(false))
            // SVCOFF_ORCHESTRATOR__MAX_PARALLEL=4
            .add_source(
                Environment::with_prefix("SVCOFF")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: SvcoffConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let orchestrator = &self.orchestrator;

        if orchestrator.max_parallel == 0 {
            return Err(ConfigError::Message(
                "max_parallel must be greater than 0".to_string(),
            ));
        }

        if orchestrator.max_parallel > MAX_PARALLEL {
            return Err(ConfigError::Message(format!(
                "max_parallel must not exceed {}",
                MAX_PARALLEL
            )));
        }

        if orchestrator.stop_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "stop_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if orchestrator.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if orchestrator.poll_interval() > orchestrator.stop_timeout() {
            return Err(ConfigError::Message(
                "poll_interval_ms must not be longer than the stop timeout".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for SvcoffConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            services: ServicesConfig {
                names: default_service_names(),
                backend: BackendKind::Auto,
            },
            precheck: PrecheckConfig {
                require_admin: default_require_admin(),
                require_supported_os: default_require_supported_os(),
            },
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            stop_timeout_seconds: default_stop_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// Default value functions
fn default_max_parallel() -> usize {
    MAX_PARALLEL
}
fn default_stop_timeout_seconds() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    250
}

fn default_service_names() -> Vec<String> {
    DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
}

fn default_require_admin() -> bool {
    true
}
fn default_require_supported_os() -> bool {
    true
}
