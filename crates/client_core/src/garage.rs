//! Session resolution, the two-step vehicle join, and the vehicle-then-link
//! submission sequence.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{FormDraft, UserId, UserVehicleLink, Vehicle},
    protocol::{VehicleIdRow, USERS_VEHICLES_TABLE, VEHICLES_TABLE},
};
use tracing::{error, info, warn};

use crate::{
    backend::{Filter, Returning, SelectQuery},
    error::{LoadError, StoreError, SubmitError},
    AuthService, DataStore,
};

/// Returns the signed-in user's id, or `None` when there is no session or the
/// auth service could not be reached. Never retries.
pub async fn resolve_session(auth: &dyn AuthService) -> Option<UserId> {
    match auth.current_user().await {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "session: resolved current user");
            Some(user.id)
        }
        Ok(None) => {
            warn!("session: no active session found");
            None
        }
        Err(err) => {
            error!(error = %err, "session: failed to fetch session");
            None
        }
    }
}

pub async fn load_vehicles(
    store: &dyn DataStore,
    user_id: &UserId,
) -> Result<Vec<Vehicle>, LoadError> {
    let link_rows = store
        .select(
            SelectQuery::new(USERS_VEHICLES_TABLE, "vehicle_id")
                .filter(Filter::eq("user_id", user_id.as_str())),
        )
        .await
        .map_err(LoadError::LinkQueryFailed)?;
    let vehicle_ids = decode_rows::<VehicleIdRow>(link_rows)
        .map_err(LoadError::LinkQueryFailed)?
        .into_iter()
        .map(|row| row.vehicle_id.to_string())
        .collect::<Vec<_>>();

    // An empty `in.()` filter is never sent.
    if vehicle_ids.is_empty() {
        info!(user_id = %user_id, "garage: no vehicles linked to user");
        return Ok(Vec::new());
    }

    let vehicle_rows = store
        .select(SelectQuery::new(VEHICLES_TABLE, "*").filter(Filter::in_list("id", vehicle_ids)))
        .await
        .map_err(LoadError::VehicleQueryFailed)?;
    let vehicles = decode_rows::<Vehicle>(vehicle_rows).map_err(LoadError::VehicleQueryFailed)?;

    info!(
        user_id = %user_id,
        vehicle_count = vehicles.len(),
        "garage: loaded vehicles"
    );
    Ok(vehicles)
}

/// Inserts the draft as a new vehicle and links it to `owner`.
///
/// The two inserts are not transactional. When the link insert fails the
/// vehicle row stays in the backend without an owner.
pub async fn submit_vehicle(
    store: &dyn DataStore,
    draft: &FormDraft,
    owner: Option<&UserId>,
) -> Result<Vehicle, SubmitError> {
    let Some(owner) = owner else {
        return Err(SubmitError::Unauthenticated);
    };

    let body =
        serde_json::to_value(draft).map_err(|err| SubmitError::Unexpected(err.to_string()))?;
    let inserted = store
        .insert(VEHICLES_TABLE, vec![body], Returning::Representation)
        .await
        .map_err(|err| match err {
            StoreError::Decode(detail) => SubmitError::Unexpected(detail),
            other => SubmitError::VehicleInsertFailed(other.message()),
        })?;

    let vehicle = decode_rows::<Vehicle>(inserted)
        .map_err(|err| SubmitError::Unexpected(err.to_string()))?
        .into_iter()
        .next()
        .ok_or_else(|| SubmitError::Unexpected("vehicle insert returned no rows".to_string()))?;

    let link = UserVehicleLink {
        user_id: owner.clone(),
        vehicle_id: vehicle.id,
    };
    let link_body =
        serde_json::to_value(&link).map_err(|err| SubmitError::Unexpected(err.to_string()))?;

    if let Err(err) = store
        .insert(USERS_VEHICLES_TABLE, vec![link_body], Returning::Minimal)
        .await
    {
        warn!(
            user_id = %owner,
            vehicle_id = %vehicle.id,
            error = %err,
            "garage: vehicle stored but owner link failed; row left unlinked"
        );
        return Err(match err {
            StoreError::Decode(detail) => SubmitError::Unexpected(detail),
            other => SubmitError::LinkInsertFailed(other.message()),
        });
    }

    info!(user_id = %owner, vehicle_id = %vehicle.id, "garage: vehicle added");
    Ok(vehicle)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}
