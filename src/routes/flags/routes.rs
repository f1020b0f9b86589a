use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use chrono::Utc;
use uuid::Uuid;

use super::{
    build_rules, validate_flag_name, CountQuery, CountResponse, CreateFlagRequest, ExistsResponse,
    FlagResponse, ListQuery, UpdateFlagRequest,
};
use crate::models::{FeatureFlag, FlagUpdate};
use crate::repository::ListOptions;
use crate::routes::error_response;
use crate::state::AppState;

/// Create a new feature flag
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlagRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_flag_name(&payload.name).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let now = Utc::now();
    let rules = build_rules(payload.rules, now).map_err(error_response)?;

    let flag = FeatureFlag::new(
        Uuid::new_v4(),
        payload.name,
        payload.description,
        payload.enabled.unwrap_or(false),
        rules,
        now,
    );

    let created = state.flags.create(flag).map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(FlagResponse::from(created))))
}

/// List flags with optional pagination and search
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let options = ListOptions {
        limit: query.limit,
        offset: query.offset.unwrap_or(0),
        search: query.search,
    };

    let response: Vec<FlagResponse> = state
        .flags
        .list(&options)
        .into_iter()
        .map(FlagResponse::from)
        .collect();

    Json(response)
}

/// Count flags matching the search filter, ignoring pagination
pub async fn count(
    State(state): State<AppState>,
    Query(query): Query<CountQuery>,
) -> impl IntoResponse {
    let count = state.flags.count(query.search.as_deref());

    Json(CountResponse { count })
}

/// Aggregate counts over the whole flag population
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.flags.stats())
}

/// Cheap existence probe by ID, no flag body in the response
pub async fn exists(
    State(state): State<AppState>,
    Path(flag_id): Path<Uuid>,
) -> impl IntoResponse {
    Json(ExistsResponse {
        exists: state.flags.exists(flag_id),
    })
}

/// Get a single flag by ID
pub async fn get(
    State(state): State<AppState>,
    Path(flag_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.flags.find_by_id(flag_id) {
        Some(flag) => Ok(Json(FlagResponse::from(flag))),
        None => Err((StatusCode::NOT_FOUND, "Flag not found".to_string())),
    }
}

/// Get a single flag by its name
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.flags.find_by_name(&name) {
        Some(flag) => Ok(Json(FlagResponse::from(flag))),
        None => Err((StatusCode::NOT_FOUND, "Flag not found".to_string())),
    }
}

/// Update a feature flag
pub async fn update(
    State(state): State<AppState>,
    Path(flag_id): Path<Uuid>,
    Json(payload): Json<UpdateFlagRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(name) = &payload.name {
        validate_flag_name(name).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    }

    let now = Utc::now();

    let rules = match payload.rules {
        Some(requests) => Some(build_rules(requests, now).map_err(error_response)?),
        None => None,
    };

    let update = FlagUpdate {
        name: payload.name,
        description: payload.description,
        enabled: payload.enabled,
        rules,
    };

    let updated = state
        .flags
        .update(flag_id, update, now)
        .map_err(error_response)?;

    Ok(Json(FlagResponse::from(updated)))
}

/// Delete a feature flag
pub async fn delete(
    State(state): State<AppState>,
    Path(flag_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !state.flags.delete(flag_id) {
        return Err((StatusCode::NOT_FOUND, "Flag not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle a flag's global default
pub async fn toggle(
    State(state): State<AppState>,
    Path(flag_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let toggled = state
        .flags
        .toggle(flag_id, Utc::now())
        .map_err(error_response)?;

    Ok(Json(FlagResponse::from(toggled)))
}
