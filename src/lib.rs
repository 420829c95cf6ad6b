// Infrastructure layer (shared components)
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod metrics;

// Domain layer (business logic)
pub mod notification;
pub mod push;
pub mod subscription;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
