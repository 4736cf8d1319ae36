//! systemd backend driven through `systemctl`.

use super::command::{self, CommandOutput};
use super::manager::ServiceManager;
use super::state::{ServiceState, ServiceStatus};
use crate::error::{Result, SvcoffError};
use async_trait::async_trait;
use std::collections::HashMap;

const SYSTEMCTL_PROGRAM: &str = "systemctl";

pub struct SystemdServiceManager {
    program: String,
}

impl SystemdServiceManager {
    pub fn new() -> Self {
        Self {
            program: SYSTEMCTL_PROGRAM.to_string(),
        }
    }

    async fn systemctl(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        command::run(&self.program, args).await
    }
}

impl Default for SystemdServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceManager for SystemdServiceManager {
    fn name(&self) -> &'static str {
        "systemd"
    }

    async fn query(&self, service: &str) -> Result<ServiceStatus> {
        let output = self
            .systemctl(&[
                "show",
                "--property=LoadState,ActiveState,CanStop",
                "--",
                service,
            ])
            .await
            .map_err(|e| SvcoffError::query(service, e.to_string()))?;

        if !output.success() {
            return Err(SvcoffError::query(service, output.message()));
        }

        let properties = parse_properties(&output.stdout);

        match properties.get("LoadState").map(String::as_str) {
            Some("not-found") => return Err(SvcoffError::not_found(service)),
            Some(_) => {}
            None => {
                return Err(SvcoffError::query(
                    service,
                    format!("unrecognised systemctl output: {}", output.message()),
                ))
            }
        }

        let state = properties
            .get("ActiveState")
            .map(|s| active_state(s))
            .unwrap_or(ServiceState::Unknown);
        let can_stop = properties.get("CanStop").map(String::as_str) == Some("yes");

        Ok(ServiceStatus::new(state, can_stop))
    }

    async fn send_stop(&self, service: &str) -> Result<()> {
        // --no-block: the handle does its own waiting
        let output = self
            .systemctl(&["stop", "--no-block", "--", service])
            .await
            .map_err(|e| SvcoffError::stop_failed(service, e.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            Err(SvcoffError::stop_failed(service, output.message()))
        }
    }

    async fn set_start_disabled(&self, service: &str) -> Result<()> {
        let output = self
            .systemctl(&["disable", "--", service])
            .await
            .map_err(|e| SvcoffError::disable_failed(service, e.to_string()))?;

        if output.success() {
            Ok(())
        } else {
            Err(SvcoffError::disable_failed(service, output.message()))
        }
    }
}

/// Parse `Key=Value` lines printed by `systemctl show`
pub(crate) fn parse_properties(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Map a unit `ActiveState` onto the service lifecycle
pub(crate) fn active_state(value: &str) -> ServiceState {
    match value {
        "active" | "reloading" | "refreshing" => ServiceState::Running,
        "inactive" | "failed" => ServiceState::Stopped,
        "activating" => ServiceState::StartPending,
        "deactivating" => ServiceState::StopPending,
        _ => ServiceState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let text = "LoadState=loaded\nActiveState=active\nCanStop=yes\n";
        let properties = parse_properties(text);
        assert_eq!(properties.get("LoadState").unwrap(), "loaded");
        assert_eq!(properties.get("ActiveState").unwrap(), "active");
        assert_eq!(properties.get("CanStop").unwrap(), "yes");
    }

    #[test]
    fn test_parse_properties_ignores_noise() {
        let properties = parse_properties("\nnot a property\nExecStart={ path=/bin/true }\n");
        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("ExecStart").unwrap(), "{ path=/bin/true }");
    }

    #[test]
    fn test_active_state_mapping() {
        assert_eq!(active_state("active"), ServiceState::Running);
        assert_eq!(active_state("inactive"), ServiceState::Stopped);
        assert_eq!(active_state("failed"), ServiceState::Stopped);
        assert_eq!(active_state("deactivating"), ServiceState::StopPending);
        assert_eq!(active_state("activating"), ServiceState::StartPending);
        assert_eq!(active_state("maintenance"), ServiceState::Unknown);
    }
}
