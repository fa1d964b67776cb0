use crate::watch::PodRef;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Wait for a pod to become ready, tail its logs, and exit with the
/// pod's terminal phase.
#[derive(Parser, Debug, Clone)]
#[command(name = "tailexit", version, about)]
pub struct Config {
    /// Kubernetes namespace of the pod
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Name of the pod to watch
    #[arg(long)]
    pub pod: String,

    /// Path to a kubeconfig file (default: $KUBECONFIG, then ~/.kube/config,
    /// then in-cluster configuration)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Timeout for pod readiness, in seconds
    #[arg(long, default_value_t = 300)]
    pub ready_timeout: u64,
}

impl Config {
    pub fn pod_ref(&self) -> PodRef {
        PodRef {
            namespace: self.namespace.clone(),
            name: self.pod.clone(),
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout)
    }
}
