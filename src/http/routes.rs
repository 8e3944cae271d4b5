//! HTTP route definitions

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, FromRequest, FromRequestParts, Path, Query, State,
    },
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::app::AppState;
use crate::game::GameError;
use crate::http::dispatch::{dispatch, validate_color};
use crate::http::middleware::{rate_limit, require_auth, AuthenticatedPlayer};
use crate::http::protocol::{ActionParams, ActionResponse, ClientAction};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Protected routes (auth required). Layers run bottom-up: auth, then rate limit.
    let protected_routes = Router::new()
        .route("/api/game", get(action_query_handler).post(action_json_handler))
        .route("/api/matches", get(list_matches_handler).post(create_match_handler))
        .route("/api/matches/:match_id/join", post(join_match_handler))
        .route("/api/matches/:match_id/state", get(match_state_handler))
        .route("/api/matches/:match_id/direction", post(set_direction_handler))
        .route("/api/matches/:match_id/ping", post(ping_handler))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_matches: usize,
    open_matches: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_matches: state.lobby.active_matches(),
        open_matches: state.lobby.open_matches(),
    })
}

// ============================================================================
// Extractors
// ============================================================================

/// JSON body whose rejections render as `invalid_request` errors
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
struct ApiJson<T>(T);

/// Query string whose rejections render as `invalid_request` errors
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
struct ApiQuery<T>(T);

// ============================================================================
// Action dispatcher endpoints
// ============================================================================

fn run_action(
    state: &AppState,
    player: &AuthenticatedPlayer,
    action: ClientAction,
) -> Result<Json<ActionResponse>, AppError> {
    let response = dispatch(&state.lobby, player, action)?;
    Ok(Json(response))
}

async fn action_query_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    ApiQuery(params): ApiQuery<ActionParams>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(params)?;
    run_action(&state, &player, action)
}

async fn action_json_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    ApiJson(params): ApiJson<ActionParams>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(params)?;
    run_action(&state, &player, action)
}

// ============================================================================
// Match endpoints
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ColorRequest {
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionRequest {
    direction: String,
}

#[derive(Debug, Default, Deserialize)]
struct PingRequest {
    client_timestamp: Option<f64>,
}

fn match_params(match_id: String) -> ActionParams {
    ActionParams {
        match_id: Some(match_id),
        ..ActionParams::default()
    }
}

async fn create_match_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    ApiJson(req): ApiJson<ColorRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    let action = ClientAction::CreateMatch {
        color: validate_color(req.color)?,
    };
    let response = run_action(&state, &player, action)?;
    Ok((StatusCode::CREATED, response))
}

async fn list_matches_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
) -> Result<Json<ActionResponse>, AppError> {
    run_action(&state, &player, ClientAction::ListOpenMatches)
}

async fn join_match_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<ColorRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(ActionParams {
        action: Some("join_match".to_string()),
        color: req.color,
        ..match_params(match_id)
    })?;
    run_action(&state, &player, action)
}

async fn match_state_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    Path(match_id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(ActionParams {
        action: Some("get_state".to_string()),
        ..match_params(match_id)
    })?;
    run_action(&state, &player, action)
}

async fn set_direction_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<DirectionRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(ActionParams {
        action: Some("set_direction".to_string()),
        direction: Some(req.direction),
        ..match_params(match_id)
    })?;
    run_action(&state, &player, action)
}

async fn ping_handler(
    State(state): State<AppState>,
    Extension(player): Extension<AuthenticatedPlayer>,
    Path(match_id): Path<String>,
    ApiJson(req): ApiJson<PingRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let action = ClientAction::try_from(ActionParams {
        action: Some("ping".to_string()),
        client_timestamp: req.client_timestamp,
        ..match_params(match_id)
    })?;
    run_action(&state, &player, action)
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Too many requests")]
    RateLimited,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Game(GameError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Game(GameError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            AppError::Game(err) => {
                let status = match err {
                    GameError::NotFound => StatusCode::NOT_FOUND,
                    GameError::Full
                    | GameError::AlreadySeated
                    | GameError::NotInProgress
                    | GameError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    GameError::NotAParticipant => StatusCode::FORBIDDEN,
                    GameError::InvalidDirection(_)
                    | GameError::InvalidAction(_)
                    | GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.code())
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        };

        warn!(status = %status, code, error = %self, "Request failed");

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
