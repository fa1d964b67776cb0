use crate::error::{Result, SupervisorError};
use crate::kube::traits::{LogReader, PodEvents, PodOperations};
use crate::watch::PodRef;
use async_trait::async_trait;
use futures::stream;
use futures::{AsyncReadExt, StreamExt};
use k8s_openapi::api::core::v1::{Pod, PodCondition, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// Build a pod snapshot for tests: name, namespace, phase string, whether
/// the Ready condition is True, and the resource version.
pub fn test_pod(name: &str, namespace: &str, phase: &str, ready: bool, resource_version: &str) -> Pod {
    let conditions = ready.then(|| {
        vec![PodCondition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            ..PodCondition::default()
        }]
    });

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version: Some(resource_version.to_string()),
            ..ObjectMeta::default()
        },
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            conditions,
            ..PodStatus::default()
        }),
        ..Pod::default()
    }
}

/// Wrap a pod snapshot as a Modified watch event, the common case when
/// scripting sessions.
pub fn pod_event(pod: Pod) -> kube::Result<kube::api::WatchEvent<Pod>> {
    Ok(kube::api::WatchEvent::Modified(pod))
}

/// Script for one watch session served by the mock.
pub enum WatchScript {
    /// Deliver these events, then end the stream (channel closes).
    Events(Vec<kube::Result<kube::api::WatchEvent<Pod>>>),
    /// Deliver these events, then stay open without yielding anything.
    EventsThenHang(Vec<kube::Result<kube::api::WatchEvent<Pod>>>),
    /// Never yield an event.
    Hang,
}

/// Script for one log stream served by the mock.
pub enum LogScript {
    /// Deliver these bytes, then end the stream naturally.
    Bytes(Vec<u8>),
    /// Deliver these bytes, then stay open without yielding anything.
    BytesThenHang(Vec<u8>),
    /// Never deliver anything; readable only until cancelled.
    Hang,
}

struct PendingReader;

impl futures::io::AsyncRead for PendingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Pending
    }
}

#[derive(Default)]
struct MockState {
    watches: VecDeque<WatchScript>,
    logs: VecDeque<LogScript>,
    watch_versions: Vec<String>,
    watch_timeouts: Vec<Option<u32>>,
    log_calls: usize,
}

/// Mock implementation of PodOperations for unit testing.
///
/// Watch sessions and log streams are served from scripted queues in call
/// order, and every watch records the resource version and timeout it was
/// opened with so tests can assert on the resume invariant.
#[derive(Clone, Default)]
pub struct MockPodOperations {
    state: Arc<Mutex<MockState>>,
}

impl MockPodOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script for the next watch session.
    pub fn push_watch(&self, script: WatchScript) {
        self.state.lock().unwrap().watches.push_back(script);
    }

    /// Queue the script for the next log stream.
    pub fn push_logs(&self, script: LogScript) {
        self.state.lock().unwrap().logs.push_back(script);
    }

    /// Resource versions watches were opened with, in call order.
    pub fn watch_versions(&self) -> Vec<String> {
        self.state.lock().unwrap().watch_versions.clone()
    }

    /// Server-side timeouts watches were opened with, in call order.
    pub fn watch_timeouts(&self) -> Vec<Option<u32>> {
        self.state.lock().unwrap().watch_timeouts.clone()
    }

    pub fn watch_calls(&self) -> usize {
        self.state.lock().unwrap().watch_versions.len()
    }

    pub fn log_calls(&self) -> usize {
        self.state.lock().unwrap().log_calls
    }
}

#[async_trait]
impl PodOperations for MockPodOperations {
    async fn watch_pod(
        &self,
        pod: &PodRef,
        timeout_secs: Option<u32>,
        resource_version: &str,
    ) -> Result<PodEvents> {
        let mut state = self.state.lock().unwrap();
        state.watch_versions.push(resource_version.to_string());
        state.watch_timeouts.push(timeout_secs);

        let script = state.watches.pop_front().ok_or_else(|| {
            SupervisorError::Kubernetes(format!("no scripted watch session for {}", pod))
        })?;

        let events = match script {
            WatchScript::Events(events) => stream::iter(events).boxed(),
            WatchScript::EventsThenHang(events) => {
                stream::iter(events).chain(stream::pending()).boxed()
            }
            WatchScript::Hang => stream::pending().boxed(),
        };

        Ok(events)
    }

    async fn follow_logs(&self, pod: &PodRef) -> Result<LogReader> {
        let mut state = self.state.lock().unwrap();
        state.log_calls += 1;

        let script = state.logs.pop_front().ok_or_else(|| {
            SupervisorError::Kubernetes(format!("no scripted log stream for {}", pod))
        })?;

        let reader: LogReader = match script {
            LogScript::Bytes(bytes) => Box::new(futures::io::Cursor::new(bytes)),
            LogScript::BytesThenHang(bytes) => {
                Box::new(futures::io::Cursor::new(bytes).chain(PendingReader))
            }
            LogScript::Hang => Box::new(PendingReader),
        };

        Ok(reader)
    }
}

/// Shared in-memory sink for asserting on tailed log bytes.
#[derive(Clone, Default)]
pub struct SharedBuf {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.lock().unwrap().clone()
    }
}

impl tokio::io::AsyncWrite for SharedBuf {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
