use axum::extract::{Extension, State};
use axum::http::StatusCode;
use schedly_core::{Actor, AppError, Role, UserId};
use tower_sessions::Session;

use crate::dto::{ActorResponse, ApiJson, EstablishSessionRequest, success};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_ACTOR_KEY, SESSION_CREATED_AT_KEY};

/// Stores an already-verified actor in a fresh session.
///
/// Only the authentication collaborator holding the bootstrap token may call this.
pub async fn establish_session_handler(
    State(state): State<AppState>,
    session: Session,
    axum::Json(payload): axum::Json<EstablishSessionRequest>,
) -> ApiResult<(StatusCode, ApiJson<ActorResponse>)> {
    if !constant_time_eq::constant_time_eq(
        payload.token.as_bytes(),
        state.bootstrap_token.as_bytes(),
    ) {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let role: Role = payload.role.parse()?;
    let actor = Actor::new(UserId::parse(&payload.user_id)?, payload.display_name, role);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_ACTOR_KEY, &actor)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session actor: {error}")))?;
    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    tracing::info!(user_id = %actor.user_id(), role = %actor.role(), "session established");
    Ok((StatusCode::CREATED, success(ActorResponse::from(&actor))))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(Extension(actor): Extension<Actor>) -> ApiJson<ActorResponse> {
    success(ActorResponse::from(&actor))
}
