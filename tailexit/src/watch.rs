use crate::error::{Result, SupervisorError};
use crate::kube::PodEvents;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;
use std::fmt;

/// Immutable identity of the pod being supervised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Coarse pod lifecycle stage, as reported in `status.phase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl Phase {
    /// Read the phase off a pod snapshot. Missing status or an
    /// unrecognized phase string both map to `Unknown`.
    pub fn of(pod: &Pod) -> Phase {
        match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
            Some("Pending") => Phase::Pending,
            Some("Running") => Phase::Running,
            Some("Succeeded") => Phase::Succeeded,
            Some("Failed") => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "Pending",
            Phase::Running => "Running",
            Phase::Succeeded => "Succeeded",
            Phase::Failed => "Failed",
            Phase::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// True iff the pod carries a `Ready` condition with status `True`.
pub fn is_ready(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.type_ == "Ready" && c.status == "True")
        })
}

/// Consume a watch session until `decide` resolves on a pod snapshot.
///
/// This is the single event-dispatch loop shared by the readiness waiter
/// and the completion watcher. `decide` is consulted on every Added,
/// Modified and Deleted event (a deleted pod's last state can still carry
/// a terminal phase); bookmarks are skipped. No further event is consumed
/// once `decide` returns an outcome.
///
/// Stream end maps to `WatchClosed`, an explicit error event to
/// `WatchEvent`, and a transport-level item error to `Watch`.
pub async fn observe_until<T, F>(mut events: PodEvents, mut decide: F) -> Result<T>
where
    F: FnMut(&Pod) -> Option<Result<T>>,
{
    while let Some(item) = events.next().await {
        match item {
            Ok(WatchEvent::Added(pod))
            | Ok(WatchEvent::Modified(pod))
            | Ok(WatchEvent::Deleted(pod)) => {
                if let Some(outcome) = decide(&pod) {
                    return outcome;
                }
            }
            Ok(WatchEvent::Bookmark(_)) => {}
            Ok(WatchEvent::Error(response)) => return Err(SupervisorError::WatchEvent(response)),
            Err(e) => return Err(SupervisorError::Watch(e)),
        }
    }

    Err(SupervisorError::WatchClosed)
}
