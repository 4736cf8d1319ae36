//! Preconditions checked before any service is touched.

use crate::config::{BackendKind, PrecheckConfig};
use crate::error::{Result, SvcoffError};
use crate::service::run_command;
use std::path::Path;
use tracing::{debug, info, warn};

/// First Windows 10 build; older releases are not supported
pub const MIN_WINDOWS_BUILD: u32 = 10240;

const SYSTEMD_RUNTIME_DIR: &str = "/run/systemd/system";

/// Run every enabled precheck for the selected backend
pub async fn run_prechecks(config: &PrecheckConfig, backend: BackendKind) -> Result<()> {
    let backend = backend.resolve();

    if config.require_admin {
        if !is_elevated().await {
            return Err(SvcoffError::system(
                "administrator privileges are required to stop and disable services",
            ));
        }
        debug!("Running with administrator privileges");
    } else {
        warn!("Privilege check skipped");
    }

    if config.require_supported_os {
        let description = check_os_support(backend).await?;
        info!("Supported OS detected: {}", description);
    } else {
        warn!("OS support check skipped");
    }

    Ok(())
}

/// Whether the process can reconfigure system services
#[cfg(unix)]
pub async fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Whether the process can reconfigure system services
#[cfg(windows)]
pub async fn is_elevated() -> bool {
    // `net session` only succeeds from an elevated prompt
    match run_command("net", &["session"]).await {
        Ok(output) => output.success(),
        Err(e) => {
            warn!("Privilege probe failed: {}", e);
            false
        }
    }
}

#[cfg(not(any(unix, windows)))]
pub async fn is_elevated() -> bool {
    false
}

/// Confirm the host can be driven by `backend`, returning a description of it
pub async fn check_os_support(backend: BackendKind) -> Result<String> {
    match backend.resolve() {
        BackendKind::Windows => {
            let output = run_command("cmd", &["/C", "ver"])
                .await
                .map_err(|e| SvcoffError::system(format!("failed to detect Windows version: {}", e)))?;
            let (major, minor, build) = parse_windows_version(&output.stdout).ok_or_else(|| {
                SvcoffError::system(format!(
                    "unrecognised Windows version string: {}",
                    output.message()
                ))
            })?;

            if build < MIN_WINDOWS_BUILD {
                return Err(SvcoffError::system(format!(
                    "Windows build {} is not supported (requires {} or newer)",
                    build, MIN_WINDOWS_BUILD
                )));
            }
            Ok(format!("Windows {}.{} build {}", major, minor, build))
        }
        _ => {
            if !Path::new(SYSTEMD_RUNTIME_DIR).exists() {
                return Err(SvcoffError::system(
                    "systemd is not running on this host",
                ));
            }
            Ok(format!("{} with systemd", std::env::consts::OS))
        }
    }
}

/// Parse `Microsoft Windows [Version 10.0.19045.3803]` into (major, minor, build)
pub fn parse_windows_version(text: &str) -> Option<(u32, u32, u32)> {
    let start = text.find('[')? + 1;
    let end = start + text[start..].find(']')?;
    let version = text[start..end].split_whitespace().last()?;

    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    let major = parts.next()??;
    let minor = parts.next()??;
    let build = parts.next()??;
    Some((major, minor, build))
}
