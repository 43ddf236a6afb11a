use serde::{Deserialize, Serialize};

use crate::domain::{UserId, VehicleId};

pub const VEHICLES_TABLE: &str = "vehicles";
pub const USERS_VEHICLES_TABLE: &str = "users_vehicles";

pub const REST_PATH: &str = "rest/v1";
pub const AUTH_PATH: &str = "auth/v1";

/// User object returned by `GET /auth/v1/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Projection of `users_vehicles` selected by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdRow {
    pub vehicle_id: VehicleId,
}
