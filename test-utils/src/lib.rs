use anyhow::{Context, Result};
/// Test utilities for integration tests
/// Manages kind cluster lifecycle and run-to-completion pod fixtures
use std::process::Command;

pub const CLUSTER_NAME: &str = "tailexit";
pub const TEST_NAMESPACE: &str = "tailexit-tests";

/// Test fixture that manages kind cluster lifecycle
pub struct KindCluster {
    cluster_name: String,
}

impl KindCluster {
    /// Get or create the test cluster
    /// Idempotent - safe to call multiple times
    pub fn setup() -> Result<Self> {
        let cluster = Self {
            cluster_name: CLUSTER_NAME.to_string(),
        };

        if !cluster.exists()? {
            println!("Creating kind cluster: {}", CLUSTER_NAME);
            cluster.create()?;
        } else {
            println!("Using existing kind cluster: {}", CLUSTER_NAME);
        }

        // Ensure the test namespace exists and is clean
        cluster.reset_namespace()?;

        Ok(cluster)
    }

    /// Check if cluster exists
    fn exists(&self) -> Result<bool> {
        let output = Command::new("kind")
            .args(["get", "clusters"])
            .output()
            .context("Failed to execute 'kind get clusters'")?;

        if !output.status.success() {
            return Ok(false);
        }

        let clusters = String::from_utf8_lossy(&output.stdout);
        Ok(clusters
            .lines()
            .any(|line| line.trim() == self.cluster_name))
    }

    /// Create new kind cluster
    fn create(&self) -> Result<()> {
        let status = Command::new("kind")
            .args(["create", "cluster", "--name", &self.cluster_name])
            .stdout(std::process::Stdio::inherit())
            .stderr(std::process::Stdio::inherit())
            .status()
            .context("Failed to spawn 'kind create cluster'")?;

        if !status.success() {
            anyhow::bail!("kind create cluster failed");
        }

        self.wait_for_ready()?;

        Ok(())
    }

    /// Wait for cluster nodes to be ready
    fn wait_for_ready(&self) -> Result<()> {
        println!("Waiting for cluster nodes to be ready...");

        let status = Command::new("kubectl")
            .args([
                "wait",
                "--for=condition=Ready",
                "nodes",
                "--all",
                "--timeout=60s",
            ])
            .stdout(std::process::Stdio::inherit())
            .stderr(std::process::Stdio::inherit())
            .status()
            .context("Failed to wait for nodes")?;

        if !status.success() {
            anyhow::bail!("Nodes did not become ready in time");
        }

        Ok(())
    }

    /// Recreate the test namespace for a clean slate
    fn reset_namespace(&self) -> Result<()> {
        let _ = self.delete_namespace(TEST_NAMESPACE); // Ignore errors if doesn't exist
        self.create_namespace(TEST_NAMESPACE)
    }

    /// Create namespace
    fn create_namespace(&self, name: &str) -> Result<()> {
        println!("Creating namespace: {}", name);

        let status = Command::new("kubectl")
            .args(["create", "namespace", name])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .context("Failed to create namespace")?;

        if !status.success() {
            anyhow::bail!("Failed to create namespace: {}", name);
        }

        Ok(())
    }

    /// Delete namespace (for cleanup)
    fn delete_namespace(&self, name: &str) -> Result<()> {
        let status = Command::new("kubectl")
            .args(["delete", "namespace", name, "--ignore-not-found=true"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .context("Failed to delete namespace")?;

        if !status.success() {
            anyhow::bail!("Failed to delete namespace: {}", name);
        }

        // Wait for namespace to be deleted
        let _ = Command::new("kubectl")
            .args([
                "wait",
                "--for=delete",
                &format!("namespace/{}", name),
                "--timeout=30s",
            ])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();

        Ok(())
    }

    /// Get cluster name for kubectl context
    pub fn context_name(&self) -> String {
        format!("kind-{}", self.cluster_name)
    }
}

/// Delete the test cluster
/// Call this explicitly if you want to clean up
#[allow(dead_code)]
pub fn teardown_cluster() -> Result<()> {
    println!("Deleting kind cluster: {}", CLUSTER_NAME);

    let status = Command::new("kind")
        .args(["delete", "cluster", "--name", CLUSTER_NAME])
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .status()
        .context("Failed to delete cluster")?;

    if !status.success() {
        anyhow::bail!("Failed to delete cluster");
    }

    Ok(())
}

/// Create a run-to-completion pod that prints `lines` to stdout and exits
/// with `exit_code`
pub async fn create_oneshot_pod(
    namespace: &str,
    name: &str,
    lines: &[&str],
    exit_code: i32,
) -> Result<()> {
    use k8s_openapi::api::core::v1::Pod;
    use kube::{Api, Client};

    let client = Client::try_default().await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    let mut script = String::new();
    for line in lines {
        script.push_str(&format!("echo '{}'; ", line));
    }
    script.push_str(&format!("exit {}", exit_code));

    let pod = serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
        },
        "spec": {
            "restartPolicy": "Never",
            "containers": [{
                "name": "main",
                "image": "busybox:1.36",
                "command": ["sh", "-c", script],
            }],
        },
    });

    let pp = kube::api::PostParams::default();
    pods.create(&pp, &serde_json::from_value(pod)?)
        .await
        .context("Failed to create test pod")?;

    Ok(())
}

/// Create a long-running pod with a readiness delay, for exercising the
/// readiness wait against a real cluster
pub async fn create_slow_ready_pod(namespace: &str, name: &str) -> Result<()> {
    use k8s_openapi::api::core::v1::Pod;
    use kube::{Api, Client};

    let client = Client::try_default().await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    let pod = serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
        },
        "spec": {
            "restartPolicy": "Never",
            "containers": [{
                "name": "main",
                "image": "busybox:1.36",
                "command": ["sh", "-c", "touch /tmp/up; sleep 5; exit 0"],
                "readinessProbe": {
                    "exec": {
                        "command": ["cat", "/tmp/up"],
                    },
                    "initialDelaySeconds": 1,
                    "periodSeconds": 1,
                },
            }],
        },
    });

    let pp = kube::api::PostParams::default();
    pods.create(&pp, &serde_json::from_value(pod)?)
        .await
        .context("Failed to create test pod")?;

    Ok(())
}

/// Helper to delete a test pod
pub async fn delete_test_pod(namespace: &str, name: &str) -> Result<()> {
    use k8s_openapi::api::core::v1::Pod;
    use kube::{Api, Client};

    let client = Client::try_default().await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    let dp = kube::api::DeleteParams::default();
    pods.delete(name, &dp)
        .await
        .context("Failed to delete pod")?;

    Ok(())
}

/// Helper to wait for a pod to report the given phase
pub async fn wait_for_phase(namespace: &str, name: &str, phase: &str) -> Result<()> {
    use k8s_openapi::api::core::v1::Pod;
    use kube::{Api, Client};
    use std::time::Duration;
    use tokio::time::sleep;

    let client = Client::try_default().await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);

    for _ in 0..60 {
        let pod = pods.get(name).await?;

        if let Some(status) = &pod.status {
            if status.phase.as_deref() == Some(phase) {
                return Ok(());
            }
        }

        sleep(Duration::from_secs(1)).await;
    }

    anyhow::bail!("Pod {} did not reach phase {} in time", name, phase)
}
