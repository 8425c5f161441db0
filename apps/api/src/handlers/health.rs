use crate::dto::{ApiJson, HealthResponse, success};

pub async fn health_handler() -> ApiJson<HealthResponse> {
    success(HealthResponse { status: "ok" })
}
