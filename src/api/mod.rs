//! API layer - HTTP endpoint handlers.

mod health;
mod metrics;
mod models;
mod routes;
mod send;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use models::{Recipients, SendEmailRequest, SendEmailResponse};
pub use routes::api_routes;
pub use send::send_email;
