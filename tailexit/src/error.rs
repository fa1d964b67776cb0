use crate::watch::Phase;
use kube::core::ErrorResponse;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Errors surfaced by the pod supervisor.
///
/// Every error from the readiness waiter or the completion watcher is fatal
/// to the run; there is no retry inside the supervisor. Unexpected channel
/// closure and explicit error events are kept distinct because they imply
/// different conditions on the watch backend.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Kubernetes error: {0}")]
    Kubernetes(String),

    #[error("timed out waiting for pod to become ready")]
    ReadyTimeout,

    #[error("pod failed ({0})")]
    PodFailed(Phase),

    #[error("watch channel closed unexpectedly")]
    WatchClosed,

    #[error("watch reported an error event: {0}")]
    WatchEvent(ErrorResponse),

    #[error("watch stream error: {0}")]
    Watch(#[source] kube::Error),

    #[error("failed to open watch: {0}")]
    WatchOpen(#[source] kube::Error),

    #[error("failed to open log stream: {0}")]
    LogOpen(#[source] kube::Error),

    #[error("interrupted before the pod reached a terminal phase")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_failed_carries_phase() {
        let err = SupervisorError::PodFailed(Phase::Failed);
        assert_eq!(err.to_string(), "pod failed (Failed)");
    }

    #[test]
    fn test_ready_timeout_message() {
        let err = SupervisorError::ReadyTimeout;
        assert_eq!(err.to_string(), "timed out waiting for pod to become ready");
    }

    #[test]
    fn test_watch_closed_message() {
        let err = SupervisorError::WatchClosed;
        assert!(err.to_string().contains("closed unexpectedly"));
    }

    #[test]
    fn test_watch_event_carries_response() {
        let err = SupervisorError::WatchEvent(ErrorResponse {
            status: "Failure".to_string(),
            message: "too old resource version".to_string(),
            reason: "Expired".to_string(),
            code: 410,
        });
        assert!(err.to_string().contains("too old resource version"));
    }
}
