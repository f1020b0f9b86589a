use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

mod health;
pub mod flags;
pub mod sdk;

pub use health::health;

use crate::error::FlagError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let flag_router = Router::new()
        .route("/", post(flags::routes::create).get(flags::routes::list))
        .route("/count", get(flags::routes::count))
        .route("/stats", get(flags::routes::stats))
        .route("/by-name/{name}", get(flags::routes::get_by_name))
        .route("/{flag_id}",
            get(flags::routes::get)
            .put(flags::routes::update)
            .delete(flags::routes::delete)
        )
        .route("/{flag_id}/exists", get(flags::routes::exists))
        .route("/{flag_id}/toggle", post(flags::routes::toggle));

    let sdk_router = Router::new()
        .route("/evaluate", post(sdk::routes::evaluate_all))
        .route("/evaluate/{name}", post(sdk::routes::evaluate_one));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/flags", flag_router)
        .nest("/sdk", sdk_router)
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "Welcome to the feature flag service written in Rust"
}

// Map a core failure onto the status code the transport speaks
pub fn error_response(err: FlagError) -> (axum::http::StatusCode, String) {
    use axum::http::StatusCode;

    let status = match &err {
        FlagError::NotFound(_) => StatusCode::NOT_FOUND,
        FlagError::Conflict(_) => StatusCode::CONFLICT,
        FlagError::InvalidRuleType(_) => StatusCode::BAD_REQUEST,
    };

    (status, err.to_string())
}
