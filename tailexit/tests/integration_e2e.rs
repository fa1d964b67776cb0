use std::sync::Arc;
use std::time::Duration;
/// Integration tests for the pod supervisor
/// These tests run against a real kind cluster
///
/// Run with: cargo test -p tailexit --test integration_e2e -- --ignored --test-threads=1
use tailexit::kube::{KubeClient, PodOperations};
use tailexit::{Phase, PodRef, Supervisor, SupervisorError};
use test_utils::{create_oneshot_pod, create_slow_ready_pod, KindCluster, TEST_NAMESPACE};
use tokio_util::sync::CancellationToken;

/// Setup function that runs before each test
fn setup() -> KindCluster {
    // This is idempotent - safe to call for every test
    KindCluster::setup().expect("Failed to setup kind cluster")
}

async fn supervisor(pod: &str, ready_timeout: Duration) -> Supervisor<dyn PodOperations> {
    let client = KubeClient::new(None, None)
        .await
        .expect("Failed to create K8s client");

    Supervisor::new(
        Arc::new(client) as Arc<dyn PodOperations>,
        PodRef::new(TEST_NAMESPACE, pod),
        ready_timeout,
    )
}

#[tokio::test]
#[ignore] // Run explicitly with --ignored flag
async fn test_cluster_exists() {
    let cluster = setup();
    println!("Cluster ready: {}", cluster.context_name());
}

#[tokio::test]
#[ignore]
async fn test_oneshot_pod_success() -> Result<(), Box<dyn std::error::Error>> {
    let _cluster = setup();

    create_oneshot_pod(TEST_NAMESPACE, "oneshot-ok", &["hello", "world"], 0).await?;

    let outcome = supervisor("oneshot-ok", Duration::from_secs(120))
        .await
        .run(CancellationToken::new(), tokio::io::stdout())
        .await;

    assert!(outcome.is_ok(), "expected success, got {:?}", outcome.err());

    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_oneshot_pod_failure() -> Result<(), Box<dyn std::error::Error>> {
    let _cluster = setup();

    create_oneshot_pod(TEST_NAMESPACE, "oneshot-bad", &["boom"], 1).await?;

    let outcome = supervisor("oneshot-bad", Duration::from_secs(120))
        .await
        .run(CancellationToken::new(), tokio::io::sink())
        .await;

    assert!(matches!(
        outcome,
        Err(SupervisorError::PodFailed(Phase::Failed))
    ));

    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_slow_ready_pod_runs_to_completion() -> Result<(), Box<dyn std::error::Error>> {
    let _cluster = setup();

    create_slow_ready_pod(TEST_NAMESPACE, "slow-ready").await?;

    let outcome = supervisor("slow-ready", Duration::from_secs(120))
        .await
        .run(CancellationToken::new(), tokio::io::sink())
        .await;

    assert!(outcome.is_ok(), "expected success, got {:?}", outcome.err());

    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_missing_pod_times_out() -> Result<(), Box<dyn std::error::Error>> {
    let _cluster = setup();

    let outcome = supervisor("no-such-pod", Duration::from_secs(5))
        .await
        .run(CancellationToken::new(), tokio::io::sink())
        .await;

    assert!(matches!(outcome, Err(SupervisorError::ReadyTimeout)));

    Ok(())
}
