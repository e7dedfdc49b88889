use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::{authorize_trip, load_event, ServiceError, ServiceResult};
use crate::models::{non_blank, Event, NewEvent, UserProfile, UserSnapshot};
use crate::store::{to_fields, CollectionPath, DocumentStore, Query};

/// Events under a trip. Every call requires owner or member access to the trip.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DocumentStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_event(&self, identity: &UserProfile, trip_id: &str, request: NewEvent) -> ServiceResult<Event> {
        let (name, date) = match (non_blank(&request.name), request.date) {
            (Some(name), Some(date)) => (name.to_string(), date),
            _ => return Err(ServiceError::InvalidInput("Missing event info".to_string())),
        };

        authorize_trip(self.store.as_ref(), identity, trip_id).await?;

        let events = CollectionPath::events(trip_id);
        let event = Event {
            id: self.store.generate_id(),
            name,
            description: request.description,
            date,
            created_at: request.created_at.unwrap_or_else(Utc::now),
            created_by: UserSnapshot::from(identity),
        };

        self.store.create(&events, &event.id, to_fields(&event)?).await?;
        info!("User {} created event {} in trip {}", identity.id, event.id, trip_id);
        Ok(event)
    }

    /// All events of the trip, ascending by date; same-day events keep creation order.
    pub async fn list_events(&self, identity: &UserProfile, trip_id: &str) -> ServiceResult<Vec<Event>> {
        authorize_trip(self.store.as_ref(), identity, trip_id).await?;

        self.store
            .query(&CollectionPath::events(trip_id), &Query::new().order_by("date"))
            .await?
            .iter()
            .map(|doc| doc.decode::<Event>().map_err(ServiceError::from))
            .collect()
    }

    pub async fn get_event(&self, identity: &UserProfile, trip_id: &str, event_id: &str) -> ServiceResult<Event> {
        authorize_trip(self.store.as_ref(), identity, trip_id).await?;
        load_event(self.store.as_ref(), trip_id, event_id).await
    }
}
