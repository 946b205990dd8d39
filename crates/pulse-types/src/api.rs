use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DataPoint, Role};

// -- JWT Claims --

/// JWT claims shared between pulse-api (REST middleware) and the
/// WebSocket upgrade in pulse-server. Canonical definition lives here
/// to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

/// Fields are optional so that an absent field surfaces as a 400 from
/// the handler's own validation rather than a deserialization reject.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
}

// -- Charts --

/// Body shared by create and update: a display name plus the full
/// series. Updates replace the series wholesale, never merge.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartRequest {
    pub name: Option<String>,
    pub series: Option<Vec<DataPoint>>,
}
