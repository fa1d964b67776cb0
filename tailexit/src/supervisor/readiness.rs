use crate::error::{Result, SupervisorError};
use crate::kube::PodOperations;
use crate::watch::{is_ready, observe_until, Phase, PodRef};
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;

/// Block until the pod is Ready or already finished, bounded by `timeout`.
///
/// A pod observed in the Succeeded phase is a readiness success: a
/// run-to-completion workload may finish before its first readiness probe,
/// and that must not be reported as a failure. A Failed phase short-circuits
/// with `PodFailed` before any further event is consumed.
///
/// The timeout is enforced twice: server-side on the watch session, and
/// client-side around the consumption loop so a stalled stream cannot block
/// past the deadline. The session is dropped (closed) on every exit path.
pub async fn wait_for_ready<T>(ops: &T, pod: &PodRef, timeout: Duration) -> Result<Pod>
where
    T: PodOperations + ?Sized,
{
    let timeout_secs = timeout.as_secs().min(u32::MAX as u64) as u32;
    let events = ops.watch_pod(pod, Some(timeout_secs), "0").await?;

    let wait = observe_until(events, |snapshot| match Phase::of(snapshot) {
        Phase::Succeeded => Some(Ok(snapshot.clone())),
        Phase::Failed => Some(Err(SupervisorError::PodFailed(Phase::Failed))),
        _ if is_ready(snapshot) => Some(Ok(snapshot.clone())),
        _ => None,
    });

    match tokio::time::timeout(timeout, wait).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SupervisorError::ReadyTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::mock::{pod_event, test_pod, MockPodOperations, WatchScript};
    use std::time::Instant;

    fn pod_ref() -> PodRef {
        PodRef::new("test-ns", "pod1")
    }

    #[tokio::test]
    async fn test_ready_condition_succeeds() {
        let mock = MockPodOperations::new();
        mock.push_watch(WatchScript::Events(vec![
            pod_event(test_pod("pod1", "test-ns", "Pending", false, "1")),
            pod_event(test_pod("pod1", "test-ns", "Running", true, "2")),
        ]));

        let pod = wait_for_ready(&mock, &pod_ref(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(pod.metadata.resource_version.as_deref(), Some("2"));
        // The server-side bound was passed through.
        assert_eq!(mock.watch_timeouts(), vec![Some(5)]);
    }

    #[tokio::test]
    async fn test_already_succeeded_is_a_readiness_success() {
        let mock = MockPodOperations::new();
        mock.push_watch(WatchScript::Events(vec![pod_event(test_pod(
            "pod1", "test-ns", "Succeeded", false, "7",
        ))]));

        let pod = wait_for_ready(&mock, &pod_ref(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(Phase::of(&pod), Phase::Succeeded);
    }

    #[tokio::test]
    async fn test_failed_pod_short_circuits() {
        let mock = MockPodOperations::new();
        mock.push_watch(WatchScript::EventsThenHang(vec![
            pod_event(test_pod("pod1", "test-ns", "Pending", false, "1")),
            pod_event(test_pod("pod1", "test-ns", "Failed", false, "2")),
            pod_event(test_pod("pod1", "test-ns", "Running", true, "3")),
        ]));

        let result = wait_for_ready(&mock, &pod_ref(), Duration::from_secs(5)).await;

        assert!(matches!(
            result,
            Err(SupervisorError::PodFailed(Phase::Failed))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_no_qualifying_event() {
        let mock = MockPodOperations::new();
        mock.push_watch(WatchScript::Hang);

        let started = Instant::now();
        let result = wait_for_ready(&mock, &pod_ref(), Duration::from_secs(2)).await;

        assert!(matches!(result, Err(SupervisorError::ReadyTimeout)));
        // Paused-clock time advances straight to the deadline.
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_channel_closed_without_readiness() {
        let mock = MockPodOperations::new();
        mock.push_watch(WatchScript::Events(vec![pod_event(test_pod(
            "pod1", "test-ns", "Pending", false, "1",
        ))]));

        let result = wait_for_ready(&mock, &pod_ref(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(SupervisorError::WatchClosed)));
    }
}
