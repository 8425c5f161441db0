use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use schedly_core::Actor;
use schedly_domain::{EventId, RegistrationId};

use crate::dto::{
    ApiJson, AttendanceRequest, CertificateResponse, CreateRegistrationRequest,
    IssueCertificateRequest, RegistrationResponse, RegistrationWithEventResponse, success,
    success_message,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn register_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateRegistrationRequest>,
) -> ApiResult<(StatusCode, ApiJson<RegistrationResponse>)> {
    let registration = state
        .registration_service
        .register(&actor, EventId::parse(&payload.event_id)?)
        .await?;

    Ok((
        StatusCode::CREATED,
        success(RegistrationResponse::from(registration)),
    ))
}

pub async fn my_registrations_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<ApiJson<Vec<RegistrationWithEventResponse>>> {
    let registrations = state
        .registration_service
        .list_my_registrations(&actor)
        .await?
        .into_iter()
        .map(RegistrationWithEventResponse::from)
        .collect();

    Ok(success(registrations))
}

pub async fn event_registrations_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(event_id): Path<String>,
) -> ApiResult<ApiJson<Vec<RegistrationResponse>>> {
    let registrations = state
        .registration_service
        .list_event_registrations(&actor, EventId::parse(&event_id)?)
        .await?
        .into_iter()
        .map(RegistrationResponse::from)
        .collect();

    Ok(success(registrations))
}

pub async fn cancel_registration_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(registration_id): Path<String>,
) -> ApiResult<ApiJson<()>> {
    state
        .registration_service
        .cancel(&actor, RegistrationId::parse(&registration_id)?)
        .await?;

    Ok(success_message("Registration cancelled successfully"))
}

pub async fn mark_attendance_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(registration_id): Path<String>,
    Json(payload): Json<AttendanceRequest>,
) -> ApiResult<ApiJson<RegistrationResponse>> {
    let registration = state
        .registration_service
        .mark_attendance(
            &actor,
            RegistrationId::parse(&registration_id)?,
            payload.attended,
        )
        .await?;

    Ok(success(RegistrationResponse::from(registration)))
}

pub async fn issue_certificate_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(registration_id): Path<String>,
    payload: Option<Json<IssueCertificateRequest>>,
) -> ApiResult<ApiJson<RegistrationResponse>> {
    let certificate_url = payload.and_then(|Json(request)| request.certificate_url);
    let registration = state
        .registration_service
        .issue_certificate(
            &actor,
            RegistrationId::parse(&registration_id)?,
            certificate_url,
        )
        .await?;

    Ok(success(RegistrationResponse::from(registration)))
}

pub async fn certificate_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(registration_id): Path<String>,
) -> ApiResult<ApiJson<CertificateResponse>> {
    let certificate = state
        .registration_service
        .certificate(&actor, RegistrationId::parse(&registration_id)?)
        .await?;

    Ok(success(CertificateResponse::from(certificate)))
}
