pub mod events;
pub mod health;
pub mod notifications;
pub mod registrations;

use schedly_core::AppError;

use crate::error::ApiError;

pub async fn not_found_handler() -> ApiError {
    ApiError(AppError::NotFound("route not found".to_owned()))
}
