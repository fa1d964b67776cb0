use crate::error::Result;
use crate::watch::PodRef;
use async_trait::async_trait;
use futures::io::AsyncRead;
use futures::stream::BoxStream;
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;

/// A live watch session: a lazy sequence of pod change events that is
/// finite only once the server or transport closes it.
pub type PodEvents = BoxStream<'static, kube::Result<WatchEvent<Pod>>>;

/// A follow-mode log byte stream.
pub type LogReader = Box<dyn AsyncRead + Send + Unpin>;

/// Abstraction over the cluster API to enable testing with mocks.
#[async_trait]
pub trait PodOperations: Send + Sync {
    /// Open a watch session filtered to the single named pod.
    ///
    /// `timeout_secs` is the server-side bound on the session; `None`
    /// leaves it bounded only by the caller dropping the stream.
    /// `resource_version` seeds the watch so a session can resume where a
    /// previous one left off without gaps or duplicates.
    async fn watch_pod(
        &self,
        pod: &PodRef,
        timeout_secs: Option<u32>,
        resource_version: &str,
    ) -> Result<PodEvents>;

    /// Open a follow-mode log stream for the pod.
    async fn follow_logs(&self, pod: &PodRef) -> Result<LogReader>;
}
