use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use toolrent_core::ActorId;

use crate::context::ActorContext;

pub const ACTOR_HEADER: &str = "x-actor";

pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = extract_actor(req.headers())?;
    req.extensions_mut().insert(ActorContext::new(actor));
    Ok(next.run(req).await)
}

fn extract_actor(headers: &HeaderMap) -> Result<ActorId, StatusCode> {
    let Some(header) = headers.get(ACTOR_HEADER) else {
        return Ok(ActorId::system());
    };
    let raw = header.to_str().map_err(|_| StatusCode::BAD_REQUEST)?;
    ActorId::parse(raw).map_err(|_| StatusCode::BAD_REQUEST)
}
