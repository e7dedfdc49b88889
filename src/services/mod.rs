//! Resource managers for trips, events and tasks.
//!
//! Each manager loads ancestor documents top-down (trip, then event, then
//! task) to establish who may act before touching the resource itself.
//! Input validation always happens before the first store call.

pub mod events;
pub mod tasks;
pub mod trips;

pub use events::EventService;
pub use tasks::TaskService;
pub use trips::TripService;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Event, Trip, UserProfile};
use crate::store::{CollectionPath, Document, DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Identity service failure: {0}")]
    Upstream(String),

    #[error("Gave up after repeated concurrent updates: {0}")]
    Contention(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Load a trip document, or `NotFound`.
pub(crate) async fn load_trip(store: &dyn DocumentStore, trip_id: &str) -> ServiceResult<(Document, Trip)> {
    let doc = store
        .get(&CollectionPath::trips(), trip_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Trip not found".to_string()))?;
    let trip = doc.decode::<Trip>()?;
    debug!("Loaded trip {} (version {})", trip_id, doc.version);
    Ok((doc, trip))
}

/// Load a trip and require the caller to be its owner or a member.
pub(crate) async fn authorize_trip(
    store: &dyn DocumentStore,
    identity: &UserProfile,
    trip_id: &str,
) -> ServiceResult<Trip> {
    let (_, trip) = load_trip(store, trip_id).await?;
    if !trip.is_accessible_by(&identity.id) {
        warn!("User {} denied access to trip {}", identity.id, trip_id);
        return Err(ServiceError::Forbidden("Access denied".to_string()));
    }
    Ok(trip)
}

/// Load an event under a trip, or `NotFound`.
pub(crate) async fn load_event(store: &dyn DocumentStore, trip_id: &str, event_id: &str) -> ServiceResult<Event> {
    let doc = store
        .get(&CollectionPath::events(trip_id), event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Event not found".to_string()))?;
    Ok(doc.decode::<Event>()?)
}
