use schedly_core::Actor;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Session bootstrap payload sent by the trusted authentication collaborator.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/establish-session-request.ts"
)]
pub struct EstablishSessionRequest {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    pub role: String,
}

/// API representation of the session actor.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/actor-response.ts"
)]
pub struct ActorResponse {
    pub user_id: String,
    pub display_name: String,
    pub role: String,
}

impl From<&Actor> for ActorResponse {
    fn from(actor: &Actor) -> Self {
        Self {
            user_id: actor.user_id().to_string(),
            display_name: actor.display_name().to_owned(),
            role: actor.role().as_str().to_owned(),
        }
    }
}
