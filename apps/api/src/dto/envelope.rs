use axum::Json;
use serde::Serialize;

/// Success envelope: `{"status":"success","data":...}` or `{"status":"success","message":...}`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub type ApiJson<T> = Json<SuccessResponse<T>>;

pub fn success<T: Serialize>(data: T) -> ApiJson<T> {
    Json(SuccessResponse {
        status: "success",
        data: Some(data),
        message: None,
    })
}

pub fn success_message(message: impl Into<String>) -> ApiJson<()> {
    Json(SuccessResponse {
        status: "success",
        data: None,
        message: Some(message.into()),
    })
}
