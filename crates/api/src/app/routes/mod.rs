use axum::Router;

pub mod loans;
pub mod settings;
pub mod system;
pub mod tools;

pub fn router() -> Router {
    Router::new()
        .nest("/tool", tools::router())
        .nest("/loan", loans::router())
        .nest("/settings", settings::router())
}
