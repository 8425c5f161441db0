mod transitions;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use schedly_core::Actor;
use schedly_domain::EventId;

use crate::dto::{
    ApiJson, CreateEventRequest, EventDetailResponse, EventListParams, EventResponse,
    UpdateEventRequest, success,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub use transitions::{
    admin_approve_handler, archive_event_handler, complete_event_handler, delete_event_handler,
    faculty_review_handler, submit_event_handler,
};

pub async fn create_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, ApiJson<EventResponse>)> {
    let event = state
        .event_service
        .create_event(&actor, payload.try_into()?)
        .await?;

    Ok((StatusCode::CREATED, success(EventResponse::from(event))))
}

pub async fn list_events_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<EventListParams>,
) -> ApiResult<ApiJson<Vec<EventResponse>>> {
    let events = state
        .event_service
        .list_events(&actor, params.try_into()?)
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();

    Ok(success(events))
}

pub async fn get_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
) -> ApiResult<ApiJson<EventDetailResponse>> {
    let event = state
        .event_service
        .get_event(&actor, EventId::parse(&event_id)?)
        .await?;

    Ok(success(EventDetailResponse::from(event)))
}

pub async fn update_event_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> ApiResult<ApiJson<EventResponse>> {
    let (patch, remarks) = payload.into_patch()?;
    let event = state
        .event_service
        .update_event(&actor, EventId::parse(&event_id)?, patch, remarks)
        .await?;

    Ok(success(EventResponse::from(event)))
}
