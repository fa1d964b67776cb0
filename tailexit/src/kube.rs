// Module declarations for Kubernetes abstractions
pub mod client;
pub mod mock;
pub mod traits;

// Re-exports for convenience
pub use client::KubeClient;
pub use mock::MockPodOperations;
pub use traits::{LogReader, PodEvents, PodOperations};
