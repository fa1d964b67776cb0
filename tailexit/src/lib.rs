pub mod config;
pub mod error;
pub mod kube;
pub mod supervisor;
pub mod watch;

// Re-exports for convenience
pub use config::Config;
pub use error::{Result, SupervisorError};
pub use supervisor::Supervisor;
pub use watch::{Phase, PodRef};
