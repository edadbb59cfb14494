//! Send-email endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{AppError, Result};
use crate::server::AppState;

use super::models::{SendEmailRequest, SendEmailResponse};

/// POST /send-email - Render a raw template and send it to every recipient in batches
#[tracing::instrument(name = "http.send_email", skip(state, request))]
pub async fn send_email(
    State(state): State<AppState>,
    request: std::result::Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>> {
    let Json(request) = request?;
    let request = request.into_dispatch_request();

    // Detached so a client disconnect cannot cut a dispatch short
    let results = state
        .dispatcher
        .spawn_dispatch(request)
        .await
        .map_err(|e| AppError::Internal(format!("Dispatch task failed: {}", e)))??;

    Ok(Json(SendEmailResponse {
        success: true,
        results,
    }))
}
