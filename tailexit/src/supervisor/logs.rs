use crate::kube::PodOperations;
use crate::watch::PodRef;
use futures::AsyncReadExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Copy the pod's follow-mode log stream verbatim into `sink` until the
/// stream ends naturally or `cancel` fires.
///
/// This is pure side-channel observation: it never returns an error and
/// never influences the run outcome. Stream or sink failures are logged at
/// warn level, and only while the lifetime is still active; once cancelled,
/// whatever the stream surfaces is expected noise and is suppressed.
pub async fn tail<T, W>(ops: &T, pod: &PodRef, cancel: CancellationToken, mut sink: W)
where
    T: PodOperations + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut reader = match ops.follow_logs(pod).await {
        Ok(reader) => reader,
        Err(e) => {
            if !cancel.is_cancelled() {
                tracing::warn!("Error opening log stream for {}: {}", pod, e);
            }
            return;
        }
    };

    let mut buf = [0u8; 8192];
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    tracing::debug!("Log stream for {} ended", pod);
                    return;
                }
                Ok(n) => {
                    let written = async {
                        sink.write_all(&buf[..n]).await?;
                        sink.flush().await
                    };
                    if let Err(e) = written.await {
                        if !cancel.is_cancelled() {
                            tracing::warn!("Error writing logs for {}: {}", pod, e);
                        }
                        return;
                    }
                }
                Err(e) => {
                    if !cancel.is_cancelled() {
                        tracing::warn!("Error streaming logs for {}: {}", pod, e);
                    }
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::mock::{LogScript, MockPodOperations, SharedBuf};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    fn pod_ref() -> PodRef {
        PodRef::new("test-ns", "pod1")
    }

    /// Sink that accepts writes but fails every flush.
    struct FailingFlush(SharedBuf);

    impl AsyncWrite for FailingFlush {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.0).poll_write(cx, buf)
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink full")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copies_bytes_verbatim_until_natural_end() {
        let mock = MockPodOperations::new();
        mock.push_logs(LogScript::Bytes(b"line one\npartial".to_vec()));

        let sink = SharedBuf::new();
        tail(&mock, &pod_ref(), CancellationToken::new(), sink.clone()).await;

        assert_eq!(sink.contents(), b"line one\npartial");
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_copy() {
        let mock = MockPodOperations::new();
        mock.push_logs(LogScript::Hang);

        let sink = SharedBuf::new();
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let mock = mock.clone();
            let cancel = cancel.clone();
            let sink = sink.clone();
            async move { tail(&mock, &pod_ref(), cancel, sink).await }
        });

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("tailer did not stop after cancellation")
            .unwrap();

        assert!(sink.contents().is_empty());
    }

    #[tokio::test]
    async fn test_flush_failure_stops_the_tailer() {
        let mock = MockPodOperations::new();
        // The stream stays open after "abc"; only the failed flush can
        // end the copy loop.
        mock.push_logs(LogScript::BytesThenHang(b"abc".to_vec()));

        let inner = SharedBuf::new();
        let done = tokio::time::timeout(
            Duration::from_secs(1),
            tail(
                &mock,
                &pod_ref(),
                CancellationToken::new(),
                FailingFlush(inner.clone()),
            ),
        )
        .await;

        assert!(done.is_ok(), "tailer kept running after a failed flush");
        assert_eq!(inner.contents(), b"abc");
    }

    #[tokio::test]
    async fn test_open_failure_is_non_fatal() {
        let mock = MockPodOperations::new();
        // No log script queued: follow_logs fails.

        let sink = SharedBuf::new();
        tail(&mock, &pod_ref(), CancellationToken::new(), sink.clone()).await;

        assert!(sink.contents().is_empty());
    }
}
