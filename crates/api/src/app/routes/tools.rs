use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use toolrent_core::BucketId;
use toolrent_inventory::{BucketStore, ToolState};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tools).post(register_tool))
        .route("/available", get(list_available))
        .route("/ids", get(find_ids))
        .route("/names", get(names_with_category))
        .route("/:id", get(get_tool).put(update_tool))
}

pub async fn register_tool(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::RegisterToolRequest>,
) -> axum::response::Response {
    let cmd = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let result = errors::blocking(move || services.inventory.register_stock(cmd, ctx.actor())).await;
    match result {
        Ok(bucket) => (StatusCode::CREATED, Json(dto::ToolResponse::from(bucket))).into_response(),
        Err(res) => res,
    }
}

pub async fn get_tool(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: BucketId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.inventory.get(id) {
        Ok(bucket) => Json(dto::ToolResponse::from(bucket)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// `state` in the body moves one unit; otherwise amount/reposition value are overwritten.
pub async fn update_tool(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateToolRequest>,
) -> axum::response::Response {
    let id: BucketId = match errors::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let target = match body.state.as_deref().map(ToolState::parse).transpose() {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let attributes = body.attributes();

    let result = errors::blocking(move || match target {
        Some(target) => services.inventory.move_unit(id, target, ctx.actor()),
        None => services.inventory.edit_attributes(id, attributes, ctx.actor()),
    })
    .await;

    match result {
        Ok(bucket) => Json(dto::ToolResponse::from(bucket)).into_response(),
        Err(res) => res,
    }
}

pub async fn list_tools(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::StateQuery>,
) -> axum::response::Response {
    let result = match query.state.as_deref() {
        Some(raw) => ToolState::parse(raw).and_then(|s| services.inventory.list_by_state(s)),
        None => services.inventory.store().list(),
    };

    match result {
        Ok(buckets) => Json(dto::tools(buckets)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_available(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory.list_available() {
        Ok(buckets) => Json(dto::tools(buckets)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn find_ids(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TripleQuery>,
) -> axum::response::Response {
    let result = ToolState::parse(&query.state)
        .and_then(|state| services.inventory.find_ids(&query.name, &query.category, state));

    match result {
        Ok(ids) => Json(ids).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn names_with_category(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory.names_with_category() {
        Ok(types) => Json(types).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
