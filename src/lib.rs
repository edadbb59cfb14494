// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer
pub mod dispatch;
pub mod template;
pub mod transport;

// Application layer
pub mod api;
pub mod server;
