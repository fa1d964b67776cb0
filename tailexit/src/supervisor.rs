// Module declarations for the pod-lifecycle supervisor
pub mod completion;
pub mod coordinator;
pub mod logs;
pub mod readiness;

// Re-exports for convenience
pub use coordinator::Supervisor;
