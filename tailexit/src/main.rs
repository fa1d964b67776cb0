use clap::Parser;
use std::sync::Arc;
use tailexit::kube::{KubeClient, PodOperations};
use tailexit::{Config, Supervisor};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to Kubernetes...");
    let client = KubeClient::new(config.kubeconfig.as_deref(), config.context.as_deref()).await?;

    let supervisor = Supervisor::new(
        Arc::new(client) as Arc<dyn PodOperations>,
        config.pod_ref(),
        config.ready_timeout(),
    );

    // Interrupting the process cancels both watch phases and the tailer.
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, shutting down");
                shutdown.cancel();
            }
        }
    });

    supervisor.run(shutdown, tokio::io::stdout()).await?;

    tracing::info!("Pod completed successfully");
    Ok(())
}
