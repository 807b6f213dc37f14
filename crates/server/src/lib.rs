use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::{NewProfile, Piece, PieceId, PiecePatch, Profile, ProfileId, ProfilePatch},
    error::{ApiError, ErrorCode},
    protocol::{CreatePieceRequest, HandleAvailability, PublicProfile},
};
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::error;

pub mod api;
mod app_state;
pub mod config;

use api::ApiContext;
use app_state::AppState;
use config::Settings;

type HttpResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Identity of the caller. Authentication happens upstream; the server only
/// scopes rows to this id.
#[derive(Debug, Deserialize)]
struct UserQuery {
    user_id: Option<ProfileId>,
}

impl UserQuery {
    fn require(&self) -> HttpResult<ProfileId> {
        self.user_id.ok_or_else(|| {
            reject(ApiError::new(
                ErrorCode::Unauthorized,
                "missing user_id for an authenticated route",
            ))
        })
    }
}

/// All routes over `storage`, with body-size limiting and request tracing.
pub fn build_router(storage: Storage, settings: &Settings) -> Router {
    let state = Arc::new(AppState {
        api: ApiContext { storage },
    });
    Router::new()
        .route("/healthz", get(healthz))
        .route("/profiles", post(http_create_profile))
        .route(
            "/profiles/me",
            get(http_current_profile).patch(http_update_profile),
        )
        .route("/handles/:handle", get(http_handle_availability))
        .route("/pieces", get(http_list_pieces).post(http_create_piece))
        .route(
            "/pieces/:piece_id",
            patch(http_update_piece).delete(http_delete_piece),
        )
        .route("/u/:handle", get(http_public_profile))
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}

async fn http_current_profile(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
) -> HttpResult<Json<Profile>> {
    let user_id = q.require()?;
    api::current_profile(&state.api, user_id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_create_profile(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<NewProfile>,
) -> HttpResult<(StatusCode, Json<Profile>)> {
    let user_id = q.require()?;
    api::create_profile(&state.api, user_id, req)
        .await
        .map(|profile| (StatusCode::CREATED, Json(profile)))
        .map_err(reject)
}

async fn http_update_profile(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<ProfilePatch>,
) -> HttpResult<Json<Profile>> {
    let user_id = q.require()?;
    api::update_profile(&state.api, user_id, req)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_handle_availability(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> HttpResult<Json<HandleAvailability>> {
    api::handle_availability(&state.api, &handle)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_list_pieces(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
) -> HttpResult<Json<Vec<Piece>>> {
    let user_id = q.require()?;
    api::list_pieces(&state.api, user_id)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_create_piece(
    State(state): State<Arc<AppState>>,
    Query(q): Query<UserQuery>,
    Json(req): Json<CreatePieceRequest>,
) -> HttpResult<(StatusCode, Json<Piece>)> {
    let user_id = q.require()?;
    api::create_piece(&state.api, user_id, req)
        .await
        .map(|piece| (StatusCode::CREATED, Json(piece)))
        .map_err(reject)
}

async fn http_update_piece(
    State(state): State<Arc<AppState>>,
    Path(piece_id): Path<PieceId>,
    Query(q): Query<UserQuery>,
    Json(req): Json<PiecePatch>,
) -> HttpResult<Json<Piece>> {
    let user_id = q.require()?;
    api::update_piece(&state.api, user_id, piece_id, req)
        .await
        .map(Json)
        .map_err(reject)
}

async fn http_delete_piece(
    State(state): State<Arc<AppState>>,
    Path(piece_id): Path<PieceId>,
    Query(q): Query<UserQuery>,
) -> HttpResult<StatusCode> {
    let user_id = q.require()?;
    api::delete_piece(&state.api, user_id, piece_id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(reject)
}

async fn http_public_profile(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> HttpResult<Json<PublicProfile>> {
    api::public_profile(&state.api, &handle)
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
