use axum::extract::{Extension, Path, Query, State};
use schedly_core::Actor;
use schedly_domain::NotificationId;

use crate::dto::{
    ApiJson, MarkAllReadResponse, NotificationFeedResponse, NotificationListParams,
    NotificationResponse, success, success_message,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_notifications_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<NotificationListParams>,
) -> ApiResult<ApiJson<NotificationFeedResponse>> {
    let feed = state
        .notification_service
        .list(&actor, params.unread_only)
        .await?;

    Ok(success(NotificationFeedResponse::from(feed)))
}

pub async fn mark_read_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(notification_id): Path<String>,
) -> ApiResult<ApiJson<NotificationResponse>> {
    let notification = state
        .notification_service
        .mark_read(&actor, NotificationId::parse(&notification_id)?)
        .await?;

    Ok(success(NotificationResponse::from(notification)))
}

pub async fn mark_all_read_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<ApiJson<MarkAllReadResponse>> {
    let updated = state.notification_service.mark_all_read(&actor).await?;
    Ok(success(MarkAllReadResponse { updated }))
}

pub async fn delete_notification_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(notification_id): Path<String>,
) -> ApiResult<ApiJson<()>> {
    state
        .notification_service
        .delete(&actor, NotificationId::parse(&notification_id)?)
        .await?;

    Ok(success_message("Notification deleted"))
}
