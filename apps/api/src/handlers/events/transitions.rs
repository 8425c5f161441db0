use axum::Json;
use axum::extract::{Extension, Path, State};
use schedly_core::Actor;
use schedly_domain::EventId;

use crate::dto::{
    ApiJson, EventResponse, FacultyReviewRequest, RemarksRequest, success, success_message,
};
use crate::error::ApiResult;
use crate::state::AppState;

fn remarks(payload: Option<Json<RemarksRequest>>) -> Option<String> {
    payload.and_then(|Json(request)| request.remarks)
}

pub async fn submit_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    payload: Option<Json<RemarksRequest>>,
) -> ApiResult<ApiJson<EventResponse>> {
    let event = state
        .event_service
        .submit_event(&actor, EventId::parse(&event_id)?, remarks(payload))
        .await?;

    Ok(success(EventResponse::from(event)))
}

pub async fn faculty_review_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    Json(payload): Json<FacultyReviewRequest>,
) -> ApiResult<ApiJson<EventResponse>> {
    let decision = payload.decision()?;
    let event = state
        .event_service
        .faculty_review(&actor, EventId::parse(&event_id)?, decision, payload.remarks)
        .await?;

    Ok(success(EventResponse::from(event)))
}

pub async fn admin_approve_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    payload: Option<Json<RemarksRequest>>,
) -> ApiResult<ApiJson<EventResponse>> {
    let event = state
        .event_service
        .admin_approve(&actor, EventId::parse(&event_id)?, remarks(payload))
        .await?;

    Ok(success(EventResponse::from(event)))
}

pub async fn complete_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    payload: Option<Json<RemarksRequest>>,
) -> ApiResult<ApiJson<EventResponse>> {
    let event = state
        .event_service
        .complete_event(&actor, EventId::parse(&event_id)?, remarks(payload))
        .await?;

    Ok(success(EventResponse::from(event)))
}

pub async fn archive_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    payload: Option<Json<RemarksRequest>>,
) -> ApiResult<ApiJson<EventResponse>> {
    let event = state
        .event_service
        .archive_event(&actor, EventId::parse(&event_id)?, remarks(payload))
        .await?;

    Ok(success(EventResponse::from(event)))
}

pub async fn delete_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
) -> ApiResult<ApiJson<()>> {
    state
        .event_service
        .delete_event(&actor, EventId::parse(&event_id)?)
        .await?;

    Ok(success_message("Event deleted successfully"))
}
