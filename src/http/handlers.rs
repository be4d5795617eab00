use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::health::{HealthReport, HealthStatus};
use crate::service::{AiService, ProviderSnapshot};
use crate::usage::UsageSummary;

/// 200 while any provider can serve, 503 once every provider is unavailable.
pub async fn get_health(State(service): State<Arc<AiService>>) -> (StatusCode, Json<HealthReport>) {
    let report = service.system_health();
    let status = match report.overall {
        HealthStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report))
}

pub async fn get_providers(State(service): State<Arc<AiService>>) -> Json<Vec<ProviderSnapshot>> {
    Json(service.provider_snapshots())
}

pub async fn get_usage(State(service): State<Arc<AiService>>) -> Json<UsageSummary> {
    Json(service.usage_summary())
}
