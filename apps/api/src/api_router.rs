mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use schedly_application::RateLimitRule;
use schedly_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router<Store>(
    app_state: AppState,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let cors_layer = build_cors_layer(&app_state.frontend_url)?;

    let session_routes = Router::new()
        .route("/api/auth/session", post(auth::establish_session_handler))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .layer(axum::Extension(RateLimitRule::session()));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(session_routes)
        .route("/api/auth/logout", post(auth::logout_handler))
        .merge(build_protected_routes(app_state.clone()))
        .fallback(handlers::not_found_handler)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}

fn build_protected_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/events",
            get(handlers::events::list_events_handler)
                .post(handlers::events::create_event_handler),
        )
        .route(
            "/api/events/{event_id}",
            get(handlers::events::get_event_handler)
                .put(handlers::events::update_event_handler)
                .delete(handlers::events::delete_event_handler),
        )
        .route(
            "/api/events/{event_id}/submit",
            post(handlers::events::submit_event_handler),
        )
        .route(
            "/api/events/{event_id}/faculty-review",
            post(handlers::events::faculty_review_handler),
        )
        .route(
            "/api/events/{event_id}/admin-approve",
            post(handlers::events::admin_approve_handler),
        )
        .route(
            "/api/events/{event_id}/complete",
            post(handlers::events::complete_event_handler),
        )
        .route(
            "/api/events/{event_id}/archive",
            post(handlers::events::archive_event_handler),
        )
        .route(
            "/api/registrations",
            post(handlers::registrations::register_handler),
        )
        .route(
            "/api/registrations/my",
            get(handlers::registrations::my_registrations_handler),
        )
        .route(
            "/api/registrations/event/{event_id}",
            get(handlers::registrations::event_registrations_handler),
        )
        .route(
            "/api/registrations/{registration_id}",
            delete(handlers::registrations::cancel_registration_handler),
        )
        .route(
            "/api/registrations/{registration_id}/attendance",
            put(handlers::registrations::mark_attendance_handler),
        )
        .route(
            "/api/registrations/{registration_id}/certificate",
            get(handlers::registrations::certificate_handler)
                .post(handlers::registrations::issue_certificate_handler),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications_handler),
        )
        .route(
            "/api/notifications/read-all",
            put(handlers::notifications::mark_all_read_handler),
        )
        .route(
            "/api/notifications/{notification_id}/read",
            put(handlers::notifications::mark_read_handler),
        )
        .route(
            "/api/notifications/{notification_id}",
            delete(handlers::notifications::delete_notification_handler),
        )
        .route_layer(from_fn(middleware::require_auth))
        .route_layer(from_fn_with_state(app_state, middleware::rate_limit))
        .layer(axum::Extension(RateLimitRule::api()))
}

#[cfg(test)]
mod tests;
