use crate::error::{Result, SupervisorError};
use crate::kube::traits::{LogReader, PodEvents, PodOperations};
use crate::watch::PodRef;
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, LogParams, WatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client,
};
use std::path::{Path, PathBuf};

/// Real Kubernetes client implementation using kube-rs
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Create a client from an explicit kubeconfig path and/or context.
    ///
    /// Resolution order for the kubeconfig file mirrors kubectl: the
    /// explicit path, then `$KUBECONFIG`, then `~/.kube/config` if it
    /// exists. With no file found, in-cluster configuration is inferred.
    pub async fn new(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let client = match resolve_kubeconfig(kubeconfig) {
            Some(path) => {
                let config = Kubeconfig::read_from(&path).map_err(|e| {
                    SupervisorError::Kubernetes(format!(
                        "Failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let options = KubeConfigOptions {
                    context: context.map(str::to_owned),
                    ..KubeConfigOptions::default()
                };
                let config = kube::Config::from_custom_kubeconfig(config, &options)
                    .await
                    .map_err(|e| {
                        SupervisorError::Kubernetes(format!("Invalid kubeconfig: {}", e))
                    })?;
                Client::try_from(config).map_err(|e| {
                    SupervisorError::Kubernetes(format!("Failed to create K8s client: {}", e))
                })?
            }
            None => Client::try_default().await.map_err(|e| {
                SupervisorError::Kubernetes(format!("Failed to create K8s client: {}", e))
            })?,
        };

        Ok(Self { client })
    }

    /// Create a Kubernetes client from an explicit kube::Client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn resolve_kubeconfig(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("KUBECONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    // $HOME is good enough on the platforms this tool targets.
    let home = std::env::var("HOME").ok()?;
    let default = PathBuf::from(home).join(".kube").join("config");
    default.exists().then_some(default)
}

// Exercised against a real kind cluster in tests/integration_e2e.rs;
// unit tests cover the mock implementation in mock.rs.
#[async_trait]
impl PodOperations for KubeClient {
    async fn watch_pod(
        &self,
        pod: &PodRef,
        timeout_secs: Option<u32>,
        resource_version: &str,
    ) -> Result<PodEvents> {
        let api = self.pods(&pod.namespace);

        let mut wp = WatchParams::default().fields(&format!("metadata.name={}", pod.name));
        if let Some(secs) = timeout_secs {
            wp = wp.timeout(secs);
        }

        let events = api
            .watch(&wp, resource_version)
            .await
            .map_err(SupervisorError::WatchOpen)?;

        Ok(events.boxed())
    }

    async fn follow_logs(&self, pod: &PodRef) -> Result<LogReader> {
        let api = self.pods(&pod.namespace);

        let lp = LogParams {
            follow: true,
            ..LogParams::default()
        };

        let reader = api
            .log_stream(&pod.name, &lp)
            .await
            .map_err(SupervisorError::LogOpen)?;

        Ok(Box::new(reader))
    }
}
