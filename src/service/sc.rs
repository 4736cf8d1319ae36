//! Windows service control manager backend driven through `sc.exe`.

use super::command::{self, CommandOutput};
use super::manager::ServiceManager;
use super::state::{ServiceState, ServiceStatus};
use crate::error::{Result, SvcoffError};
use async_trait::async_trait;

const SC_PROGRAM: &str = "sc.exe";

/// ERROR_SERVICE_DOES_NOT_EXIST
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
/// ERROR_SERVICE_NOT_ACTIVE, returned when stopping a stopped service
const ERROR_SERVICE_NOT_ACTIVE: i32 = 1062;

pub struct ScServiceManager {
    program: String,
}

impl ScServiceManager {
    pub fn new() -> Self {
        Self {
            program: SC_PROGRAM.to_string(),
        }
    }

    async fn sc(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        command::run(&self.program, args).await
    }
}

impl Default for ScServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceManager for ScServiceManager {
    fn name(&self) -> &'static str {
        "sc"
    }

    async fn query(&self, service: &str) -> Result<ServiceStatus> {
        let output = self
            .sc(&["queryex", service])
            .await
            .map_err(|e| SvcoffError::query(service, e.to_string()))?;

        if let Some(code) = failure_code(&output) {
            if code == ERROR_SERVICE_DOES_NOT_EXIST {
                return Err(SvcoffError::not_found(service));
            }
            return Err(SvcoffError::query(service, output.message()));
        }

        parse_queryex(&output.stdout).ok_or_else(|| {
            SvcoffError::query(service, format!("unrecognised sc output: {}", output.message()))
        })
    }

    async fn send_stop(&self, service: &str) -> Result<()> {
        let output = self
            .sc(&["stop", service])
            .await
            .map_err(|e| SvcoffError::stop_failed(service, e.to_string()))?;

        match failure_code(&output) {
            None | Some(ERROR_SERVICE_NOT_ACTIVE) => Ok(()),
            Some(ERROR_SERVICE_DOES_NOT_EXIST) => Err(SvcoffError::not_found(service)),
            Some(_) => Err(SvcoffError::stop_failed(service, output.message())),
        }
    }

    async fn set_start_disabled(&self, service: &str) -> Result<()> {
        // sc.exe wants "start=" and the value as separate arguments
        let output = self
            .sc(&["config", service, "start=", "disabled"])
            .await
            .map_err(|e| SvcoffError::disable_failed(service, e.to_string()))?;

        match failure_code(&output) {
            None => Ok(()),
            Some(_) => Err(SvcoffError::disable_failed(service, output.message())),
        }
    }
}

/// Win32 error code of a failed sc.exe call, `None` on success
fn failure_code(output: &CommandOutput) -> Option<i32> {
    if output.success() {
        return None;
    }
    parse_failed_code(&output.stdout)
        .or_else(|| parse_failed_code(&output.stderr))
        .or(output.code)
        .or(Some(-1))
}

/// Extract `1060` from lines like `[SC] OpenService FAILED 1060:`
pub(crate) fn parse_failed_code(text: &str) -> Option<i32> {
    let rest = &text[text.find("FAILED")? + "FAILED".len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse the `STATE` block of `sc queryex` output
pub(crate) fn parse_queryex(text: &str) -> Option<ServiceStatus> {
    let mut lines = text.lines();
    let state_line = lines.find(|line| line.trim_start().starts_with("STATE"))?;

    let code: u32 = state_line
        .split(':')
        .nth(1)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;

    let state = match code {
        1 => ServiceState::Stopped,
        2 => ServiceState::StartPending,
        3 => ServiceState::StopPending,
        4 => ServiceState::Running,
        5 => ServiceState::ContinuePending,
        6 => ServiceState::PausePending,
        7 => ServiceState::Paused,
        _ => ServiceState::Unknown,
    };

    // Control flags follow on the next line: (STOPPABLE, NOT_PAUSABLE, ...)
    let can_stop = lines
        .next()
        .map(|flags| {
            flags
                .trim()
                .trim_matches(|c| c == '(' || c == ')')
                .split(',')
                .any(|flag| flag.trim() == "STOPPABLE")
        })
        .unwrap_or(false);

    Some(ServiceStatus::new(state, can_stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: &str = "
SERVICE_NAME: wuauserv
        TYPE               : 20  WIN32_SHARE_PROCESS
        STATE              : 4  RUNNING
                                (STOPPABLE, NOT_PAUSABLE, ACCEPTS_PRESHUTDOWN)
        WIN32_EXIT_CODE    : 0  (0x0)
        SERVICE_EXIT_CODE  : 0  (0x0)
        CHECKPOINT         : 0x0
        WAIT_HINT          : 0x0
        PID                : 1234
        FLAGS              :
";

    const PROTECTED: &str = "
SERVICE_NAME: WinDefend
        TYPE               : 10  WIN32_OWN_PROCESS
        STATE              : 4  RUNNING
                                (NOT_STOPPABLE, NOT_PAUSABLE, IGNORES_SHUTDOWN)
";

    const STOPPED: &str = "
SERVICE_NAME: Fax
        TYPE               : 10  WIN32_OWN_PROCESS
        STATE              : 1  STOPPED
        WIN32_EXIT_CODE    : 1077  (0x435)
";

    #[test]
    fn test_parse_running_stoppable() {
        let status = parse_queryex(RUNNING).unwrap();
        assert_eq!(status.state, ServiceState::Running);
        assert!(status.can_stop);
    }

    #[test]
    fn test_parse_not_stoppable() {
        let status = parse_queryex(PROTECTED).unwrap();
        assert_eq!(status.state, ServiceState::Running);
        assert!(!status.can_stop);
    }

    #[test]
    fn test_parse_stopped() {
        let status = parse_queryex(STOPPED).unwrap();
        assert_eq!(status.state, ServiceState::Stopped);
        assert!(!status.can_stop);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_queryex("").is_none());
        assert!(parse_queryex("STATE : x").is_none());
    }

    #[test]
    fn test_parse_failed_code() {
        let text = "[SC] EnumQueryServicesStatus:OpenService FAILED 1060:\r\n\r\nThe specified service does not exist as an installed service.\r\n";
        assert_eq!(parse_failed_code(text), Some(1060));
        assert_eq!(parse_failed_code("[SC] OpenService FAILED 5:\n\nAccess is denied."), Some(5));
        assert_eq!(parse_failed_code("[SC] ChangeServiceConfig SUCCESS"), None);
    }

    #[test]
    fn test_failure_code_uses_exit_status_fallback() {
        let output = CommandOutput {
            code: Some(1062),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(failure_code(&output), Some(1062));

        let ok = CommandOutput {
            code: Some(0),
            stdout: "[SC] ControlService SUCCESS".to_string(),
            stderr: String::new(),
        };
        assert_eq!(failure_code(&ok), None);
    }
}
