use schedly_application::{
    EventLifecycleService, NotificationService, RateLimitService, RegistrationService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub event_service: EventLifecycleService,
    pub registration_service: RegistrationService,
    pub notification_service: NotificationService,
    pub rate_limit_service: RateLimitService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
