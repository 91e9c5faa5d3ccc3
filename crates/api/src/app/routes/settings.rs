use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use toolrent_loans::ConfigCollaborator;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/daily-rent-rate", get(get_daily_rent_rate).put(set_daily_rent_rate))
}

pub async fn get_daily_rent_rate(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    Json(json!({ "value": services.settings.daily_rent_rate() })).into_response()
}

/// Takes effect for loans created afterwards; existing totals are untouched.
pub async fn set_daily_rent_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RateRequest>,
) -> axum::response::Response {
    match services.settings.set_daily_rent_rate(body.value) {
        Ok(value) => Json(json!({ "value": value })).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
