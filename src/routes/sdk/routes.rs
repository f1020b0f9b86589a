use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{EvaluateRequest, EvaluateResponse, FlagState};
use crate::evaluation::{evaluate, evaluate_batch};
use crate::repository::ListOptions;
use crate::state::AppState;

/// Evaluate every flag for the given context.
///
/// Results come back in the repository's stored flag order, one entry per
/// flag. Evaluation itself never fails; the worst case for a single flag is
/// its global default.
pub async fn evaluate_all(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let context = request.context;

    let flags = state.flags.list(&ListOptions::default());
    let results = evaluate_batch(&flags, &context);

    let states = flags
        .iter()
        .zip(results)
        .map(|(flag, result)| {
            state.observer.flag_evaluated(flag, &result);
            FlagState::new(flag, result)
        })
        .collect();

    Json(EvaluateResponse { flags: states })
}

/// Evaluate a single flag, looked up by name
pub async fn evaluate_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<EvaluateRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(flag) = state.flags.find_by_name(&name) else {
        return Err((StatusCode::NOT_FOUND, format!("Flag '{}' not found", name)));
    };

    let result = evaluate(&flag, &request.context);
    state.observer.flag_evaluated(&flag, &result);

    Ok(Json(FlagState::new(&flag, result)))
}
