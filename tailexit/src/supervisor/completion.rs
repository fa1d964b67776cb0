use crate::error::Result;
use crate::kube::PodOperations;
use crate::watch::{observe_until, Phase, PodRef};

/// Block until the pod reaches a terminal phase, returning that phase.
///
/// The watch resumes from `resource_version`, the version observed when the
/// readiness waiter exited, so no transition between the two sessions is
/// missed and none is processed twice. The session is unbounded; only the
/// caller's cancellation or a watch failure ends it early.
pub async fn wait_for_completion<T>(ops: &T, pod: &PodRef, resource_version: &str) -> Result<Phase>
where
    T: PodOperations + ?Sized,
{
    let events = ops.watch_pod(pod, None, resource_version).await?;

    observe_until(events, |snapshot| {
        let phase = Phase::of(snapshot);
        phase.is_terminal().then_some(Ok(phase))
    })
    .await
}
