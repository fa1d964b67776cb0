use crate::error::{Result, SupervisorError};
use crate::kube::PodOperations;
use crate::supervisor::{completion, logs, readiness};
use crate::watch::{Phase, PodRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

/// Pod-lifecycle supervisor.
///
/// Drives one already-existing pod through a strict two-phase watch:
/// block until the pod is Ready (or already finished), then tail its logs
/// as a cancellable background task while watching for the terminal phase.
/// Only the completion watch decides the outcome; the tailer is cancelled
/// once it resolves.
pub struct Supervisor<T: PodOperations + ?Sized> {
    ops: Arc<T>,
    pod: PodRef,
    ready_timeout: Duration,
}

impl<T: PodOperations + ?Sized + 'static> Supervisor<T> {
    pub fn new(ops: Arc<T>, pod: PodRef, ready_timeout: Duration) -> Self {
        Self {
            ops,
            pod,
            ready_timeout,
        }
    }

    /// Run the pod to completion, streaming its logs into `sink`.
    ///
    /// Returns `Ok(())` only when the pod's Succeeded phase was observed;
    /// every other terminal condition is an error carrying the reason. A
    /// readiness failure terminates immediately without starting the
    /// tailer or the completion watch. `shutdown` pre-empts both
    /// foreground phases and propagates to the tailer.
    pub async fn run<W>(&self, shutdown: CancellationToken, sink: W) -> Result<()>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        tracing::info!("Waiting for pod {} to be ready", self.pod);
        let ready = tokio::select! {
            _ = shutdown.cancelled() => return Err(SupervisorError::Interrupted),
            outcome = readiness::wait_for_ready(self.ops.as_ref(), &self.pod, self.ready_timeout) => outcome?,
        };

        // Seed the completion watch from the version observed at waiter
        // exit so no transition is missed between the two sessions.
        let resume_version = match ready.metadata.resource_version.clone() {
            Some(version) => version,
            None => {
                // An empty version resumes from latest, which can skip
                // transitions between the two sessions.
                tracing::warn!(
                    "Pod {} snapshot carried no resource version; resuming watch from latest",
                    self.pod
                );
                String::new()
            }
        };
        tracing::debug!(
            "Pod {} ready (resource version {})",
            self.pod,
            resume_version
        );

        let tail_cancel = shutdown.child_token();
        let tailer = tokio::spawn({
            let ops = Arc::clone(&self.ops);
            let pod = self.pod.clone();
            let cancel = tail_cancel.clone();
            async move { logs::tail(ops.as_ref(), &pod, cancel, sink).await }
        });

        let outcome = tokio::select! {
            _ = shutdown.cancelled() => Err(SupervisorError::Interrupted),
            outcome = completion::wait_for_completion(self.ops.as_ref(), &self.pod, &resume_version) => outcome,
        };

        // The completion watch resolving is the sole trigger for stopping
        // the tailer, regardless of the outcome.
        tail_cancel.cancel();
        let _ = tailer.await;

        match outcome? {
            Phase::Succeeded => Ok(()),
            phase => Err(SupervisorError::PodFailed(phase)),
        }
    }
}
