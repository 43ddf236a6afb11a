use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::{
    domain::{DraftField, FormDraft, UserId, Vehicle},
    error::DraftError,
    protocol::SessionUser,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

pub mod backend;
pub mod error;
pub mod garage;
pub mod presentation;

pub use backend::{BackendClient, Filter, Returning, SelectQuery};
pub use error::{LoadError, StoreError, SubmitError};
pub use garage::{load_vehicles, resolve_session, submit_vehicle};
pub use presentation::VehicleCard;

pub const VEHICLE_ADDED_ACK: &str = "Vehicle successfully added!";

#[async_trait]
pub trait AuthService: Send + Sync {
    /// `Ok(None)` means there is no active session.
    async fn current_user(&self) -> Result<Option<SessionUser>, StoreError>;
}

/// Tabular data API: select with a single equality or membership filter, and
/// insert with or without the stored rows echoed back.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: SelectQuery) -> Result<Vec<Value>, StoreError>;
    async fn insert(
        &self,
        table: &str,
        rows: Vec<Value>,
        returning: Returning,
    ) -> Result<Vec<Value>, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Submitting,
}

/// Everything the garage page renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarageState {
    pub user_id: Option<UserId>,
    pub vehicles: Vec<Vehicle>,
    pub draft: FormDraft,
    pub form_visible: bool,
    pub phase: FormPhase,
    pub error: Option<String>,
}

impl GarageState {
    pub fn toggle_label(&self) -> &'static str {
        presentation::toggle_label(self.form_visible)
    }

    pub fn cards(&self) -> Vec<VehicleCard> {
        self.vehicles.iter().map(VehicleCard::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GarageEvent {
    SessionResolved(Option<UserId>),
    VehiclesLoaded(Vec<Vehicle>),
    VehicleAdded {
        vehicle: Vehicle,
        acknowledgment: String,
    },
    SubmitFailed(String),
    FormToggled(bool),
}

struct ControllerState {
    view: GarageState,
    inflight_submissions: usize,
}

/// Per-page-view owner of the garage state.
///
/// The state lock is released before every backend call, so submissions can
/// overlap and a late load response overwrites the list.
pub struct GarageController {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DataStore>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<GarageEvent>,
}

impl GarageController {
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DataStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            auth,
            store,
            inner: Mutex::new(ControllerState {
                view: GarageState::default(),
                inflight_submissions: 0,
            }),
            events,
        })
    }

    pub fn with_backend(client: BackendClient) -> Arc<Self> {
        let client = Arc::new(client);
        Self::new(client.clone(), client)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GarageEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: GarageEvent) {
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> GarageState {
        self.inner.lock().await.view.clone()
    }

    /// Resolves the session and loads the user's vehicles. Failures are
    /// logged and leave the list as it was.
    pub async fn initialize(&self) {
        let user_id = resolve_session(self.auth.as_ref()).await;
        self.inner.lock().await.view.user_id = user_id.clone();
        self.emit(GarageEvent::SessionResolved(user_id.clone()));

        let Some(user_id) = user_id else {
            return;
        };

        match load_vehicles(self.store.as_ref(), &user_id).await {
            Ok(vehicles) => {
                self.inner.lock().await.view.vehicles = vehicles.clone();
                self.emit(GarageEvent::VehiclesLoaded(vehicles));
            }
            Err(err) => {
                error!(user_id = %user_id, error = %err, "garage: vehicle load failed");
            }
        }
    }

    pub async fn toggle_form(&self) -> bool {
        let visible = {
            let mut guard = self.inner.lock().await;
            guard.view.form_visible = !guard.view.form_visible;
            guard.view.form_visible
        };
        self.emit(GarageEvent::FormToggled(visible));
        visible
    }

    pub async fn update_draft(
        &self,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), DraftError> {
        let field: DraftField = field.parse()?;
        self.inner.lock().await.view.draft.set_field(field, value)
    }

    pub async fn replace_draft(&self, draft: FormDraft) {
        self.inner.lock().await.view.draft = draft;
    }

    /// Submits the current draft for the current user.
    ///
    /// On success the vehicle is appended, the draft reset and the form
    /// closed. On failure the draft is kept and the error text is stored for
    /// inline display.
    pub async fn submit(&self) -> Result<Vehicle, SubmitError> {
        let (draft, owner) = {
            let mut guard = self.inner.lock().await;
            guard.view.error = None;
            guard.inflight_submissions += 1;
            guard.view.phase = FormPhase::Submitting;
            (guard.view.draft.clone(), guard.view.user_id.clone())
        };

        let outcome = submit_vehicle(self.store.as_ref(), &draft, owner.as_ref()).await;

        let event = {
            let mut guard = self.inner.lock().await;
            guard.inflight_submissions = guard.inflight_submissions.saturating_sub(1);
            if guard.inflight_submissions == 0 {
                guard.view.phase = FormPhase::Idle;
            }
            match &outcome {
                Ok(vehicle) => {
                    guard.view.vehicles.push(vehicle.clone());
                    guard.view.draft.reset();
                    guard.view.form_visible = false;
                    GarageEvent::VehicleAdded {
                        vehicle: vehicle.clone(),
                        acknowledgment: VEHICLE_ADDED_ACK.to_string(),
                    }
                }
                Err(err) => {
                    if let SubmitError::Unexpected(detail) = err {
                        error!(detail = %detail, "garage: unexpected error while adding vehicle");
                    } else {
                        info!(error = %err, "garage: vehicle submission rejected");
                    }
                    guard.view.error = Some(err.to_string());
                    GarageEvent::SubmitFailed(err.to_string())
                }
            }
        };
        self.emit(event);

        outcome
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
