use super::*;
use crate::error::SvcoffError;
use std::sync::Arc;
use std::time::Duration;

const SHORT_TIMEOUT: Duration = Duration::from_millis(200);
const POLL: Duration = Duration::from_millis(10);

fn handle(name: &str, manager: &Arc<MockServiceManager>) -> ServiceHandle {
    let manager: Arc<dyn ServiceManager> = manager.clone();
    ServiceHandle::new(name, manager).with_poll_interval(POLL)
}

#[tokio::test]
async fn test_query_state() {
    let manager = Arc::new(
        MockServiceManager::new()
            .with_service("SysMain", MockService::running())
            .with_service("Fax", MockService::stopped()),
    );

    assert_eq!(
        handle("SysMain", &manager).query_state().await.unwrap(),
        ServiceState::Running
    );
    assert_eq!(
        handle("Fax", &manager).query_state().await.unwrap(),
        ServiceState::Stopped
    );
}

#[tokio::test]
async fn test_query_unknown_service() {
    let manager = Arc::new(MockServiceManager::new());

    match handle("missing", &manager).query_state().await {
        Err(SvcoffError::ServiceNotFound { service }) => assert_eq!(service, "missing"),
        other => panic!("Expected ServiceNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_query_failure() {
    let manager = Arc::new(
        MockServiceManager::new()
            .with_service("Locked", MockService::running().fails_query("access denied")),
    );

    assert!(matches!(
        handle("Locked", &manager).query_state().await,
        Err(SvcoffError::ServiceQuery { .. })
    ));
}

#[tokio::test]
async fn test_stop_running_service() {
    let manager = Arc::new(MockServiceManager::new().with_service(
        "SysMain",
        MockService::running().stops_after(Duration::from_millis(30)),
    ));
    let mut service = handle("SysMain", &manager);

    assert!(service.request_stop(SHORT_TIMEOUT).await);
    assert!(service.take_error().is_none());
    assert_eq!(manager.stop_calls("SysMain"), 1);
    assert_eq!(service.query_state().await.unwrap(), ServiceState::Stopped);
}

#[tokio::test]
async fn test_stop_already_stopped_is_noop() {
    let manager = Arc::new(MockServiceManager::new().with_service("Fax", MockService::stopped()));
    let mut service = handle("Fax", &manager);

    assert!(service.request_stop(SHORT_TIMEOUT).await);
    assert!(service.request_stop(SHORT_TIMEOUT).await);
    assert_eq!(manager.stop_calls("Fax"), 0);
}

#[tokio::test]
async fn test_stop_not_stoppable_is_rejected() {
    let manager = Arc::new(
        MockServiceManager::new().with_service("WinDefend", MockService::running().not_stoppable()),
    );
    let mut service = handle("WinDefend", &manager);

    assert!(!service.request_stop(SHORT_TIMEOUT).await);
    assert_eq!(manager.stop_calls("WinDefend"), 0);
    assert!(matches!(
        service.take_error(),
        Some(SvcoffError::StopRejected { .. })
    ));
}

#[tokio::test]
async fn test_stop_timeout() {
    let manager = Arc::new(
        MockServiceManager::new().with_service("Stuck", MockService::running().hangs_on_stop()),
    );
    let mut service = handle("Stuck", &manager);

    let started = std::time::Instant::now();
    assert!(!service.request_stop(Duration::from_millis(100)).await);
    assert!(started.elapsed() >= Duration::from_millis(100));

    match service.take_error() {
        Some(SvcoffError::StopTimeout { last_state, .. }) => {
            assert_eq!(last_state, ServiceState::StopPending.to_string())
        }
        other => panic!("Expected StopTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stop_request_failure_is_absorbed() {
    let manager = Arc::new(
        MockServiceManager::new()
            .with_service("Flaky", MockService::running().fails_stop("RPC server unavailable")),
    );
    let mut service = handle("Flaky", &manager);

    assert!(!service.request_stop(SHORT_TIMEOUT).await);
    assert!(matches!(
        service.take_error(),
        Some(SvcoffError::StopFailed { .. })
    ));
    assert!(service.take_error().is_none());
}

#[tokio::test]
async fn test_stop_unknown_service() {
    let manager = Arc::new(MockServiceManager::new());
    let mut service = handle("ghost", &manager);

    assert!(!service.request_stop(SHORT_TIMEOUT).await);
    assert!(matches!(
        service.take_error(),
        Some(SvcoffError::ServiceNotFound { .. })
    ));
}

#[tokio::test]
async fn test_disable() {
    let manager = Arc::new(
        MockServiceManager::new()
            .with_service("SysMain", MockService::running())
            .with_service("Locked", MockService::running().fails_disable("access denied")),
    );

    let mut ok = handle("SysMain", &manager);
    assert!(ok.request_disable().await);
    assert!(manager.is_disabled("SysMain"));

    let mut locked = handle("Locked", &manager);
    assert!(!locked.request_disable().await);
    assert!(!manager.is_disabled("Locked"));
    assert!(matches!(
        locked.take_error(),
        Some(SvcoffError::DisableFailed { .. })
    ));
}

#[tokio::test]
async fn test_disable_unknown_service() {
    let manager = Arc::new(MockServiceManager::new());
    let mut service = handle("ghost", &manager);

    assert!(!service.request_disable().await);
    assert!(matches!(
        service.take_error(),
        Some(SvcoffError::DisableFailed { .. })
    ));
}

#[test]
fn test_manager_for_backend() {
    use crate::config::BackendKind;

    assert_eq!(manager_for(BackendKind::Windows).name(), "sc");
    assert_eq!(manager_for(BackendKind::Systemd).name(), "systemd");
}

#[tokio::test]
async fn test_mock_counts_calls_in_flight() {
    let manager = Arc::new(
        MockServiceManager::new()
            .with_call_latency(Duration::from_millis(30))
            .with_service("A", MockService::running())
            .with_service("B", MockService::running().hangs_on_stop()),
    );

    let (a, b) = tokio::join!(manager.query("A"), manager.send_stop("B"));
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(manager.peak_concurrent_calls(), 2);
    assert_eq!(manager.active_calls(), 0);

    // A hung stop holds no call open once its request has returned
    let mut service = handle("B", &manager);
    assert!(!service.request_stop(Duration::from_millis(100)).await);
    assert_eq!(manager.active_calls(), 0);
    assert_eq!(manager.peak_concurrent_calls(), 2);
}
