use super::state::ServiceStatus;
use crate::error::Result;
use async_trait::async_trait;

/// Primitive calls against an OS service control facility.
///
/// Implementations issue exactly one request per call and never wait for a
/// state transition; waiting and idempotence live in [`super::ServiceHandle`].
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Query the current state and stop capability of a service.
    ///
    /// Fails with `ServiceNotFound` for unknown names and `ServiceQuery` for
    /// anything else the OS reports.
    async fn query(&self, service: &str) -> Result<ServiceStatus>;

    /// Ask the service to stop without waiting for it
    async fn send_stop(&self, service: &str) -> Result<()>;

    /// Set the startup mode of the service to disabled
    async fn set_start_disabled(&self, service: &str) -> Result<()>;
}
