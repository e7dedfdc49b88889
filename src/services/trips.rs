use chrono::Utc;
use futures::future::try_join;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::{authorize_trip, load_trip, ServiceError, ServiceResult};
use crate::identity::{IdentityError, IdentityGateway};
use crate::models::{non_blank, InviteRequest, NewTrip, Trip, UserProfile, UserSnapshot};
use crate::store::{to_fields, CollectionPath, DocumentStore, Filter, Query, StoreError};

/// Trip creation, membership invitation and trip-level access control.
#[derive(Clone)]
pub struct TripService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityGateway>,
    invite_max_retries: u32,
}

impl TripService {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityGateway>, invite_max_retries: u32) -> Self {
        Self {
            store,
            identity,
            invite_max_retries,
        }
    }

    pub async fn create_trip(&self, identity: &UserProfile, request: NewTrip) -> ServiceResult<Trip> {
        let title = non_blank(&request.title)
            .ok_or_else(|| ServiceError::InvalidInput("Missing required fields".to_string()))?
            .to_string();

        let trips = CollectionPath::trips();
        let trip = Trip {
            id: self.store.generate_id(),
            title,
            summary: request.summary,
            created_by: identity.id.clone(),
            created_at: request.created_at.unwrap_or_else(Utc::now),
            owner: UserSnapshot::from(identity),
            members: Vec::new(),
            member_ids: Vec::new(),
            tags: request.tags.unwrap_or_default(),
        };

        self.store.create(&trips, &trip.id, to_fields(&trip)?).await?;
        info!("User {} created trip {}", identity.id, trip.id);
        Ok(trip)
    }

    /// Trips the caller owns or belongs to, each exactly once.
    ///
    /// Ownership and membership live in different fields, so this runs two
    /// queries and merges them by id. Order follows the merge, not a sort.
    pub async fn list_trips_for_user(&self, identity: &UserProfile) -> ServiceResult<Vec<Trip>> {
        let trips = CollectionPath::trips();
        let as_member = Query::new().filter(Filter::array_contains("memberIds", identity.id.as_str()));
        let as_owner = Query::new().filter(Filter::eq("owner.userId", identity.id.as_str()));

        let (member_docs, owner_docs) =
            try_join(self.store.query(&trips, &as_member), self.store.query(&trips, &as_owner)).await?;

        let mut seen = HashSet::new();
        member_docs
            .into_iter()
            .chain(owner_docs)
            .filter(|doc| seen.insert(doc.id.clone()))
            .map(|doc| doc.decode::<Trip>().map_err(ServiceError::from))
            .collect()
    }

    pub async fn get_trip(&self, identity: &UserProfile, trip_id: &str) -> ServiceResult<Trip> {
        authorize_trip(self.store.as_ref(), identity, trip_id).await
    }

    /// Owner first, then members in invitation order.
    pub async fn get_members(&self, identity: &UserProfile, trip_id: &str) -> ServiceResult<Vec<UserSnapshot>> {
        Ok(self.get_trip(identity, trip_id).await?.roster())
    }

    /// Add the user registered under `email` to the trip. Owner only.
    ///
    /// The membership write is conditional on the trip version that was
    /// checked, so concurrent invites cannot overwrite each other; on a
    /// version conflict the trip is reloaded and the checks run again.
    pub async fn invite_member(
        &self,
        identity: &UserProfile,
        trip_id: &str,
        request: InviteRequest,
    ) -> ServiceResult<UserSnapshot> {
        let email = non_blank(&request.email)
            .ok_or_else(|| ServiceError::InvalidInput("Missing invited user info".to_string()))?;

        let (doc, trip) = load_trip(self.store.as_ref(), trip_id).await?;
        if !trip.is_owner(&identity.id) {
            warn!("User {} attempted to invite to trip {} without owning it", identity.id, trip_id);
            return Err(ServiceError::Forbidden("Only owner can invite users".to_string()));
        }

        let invited = self.identity.resolve_email(email).await.map_err(|e| match e {
            IdentityError::Rejected(msg) => ServiceError::InvalidInput(msg),
            IdentityError::InvalidCredential => ServiceError::InvalidInput("User not found".to_string()),
            IdentityError::Unavailable(msg) => ServiceError::Upstream(msg),
        })?;
        let member = UserSnapshot::from(&invited);

        let trips = CollectionPath::trips();
        let (mut version, mut trip) = (doc.version, trip);
        for attempt in 0..=self.invite_max_retries {
            if trip.is_owner(&member.user_id) {
                return Err(ServiceError::InvalidInput("Cannot invite the owner".to_string()));
            }
            if trip.is_member(&member.user_id) || trip.members.iter().any(|m| m.user_id == member.user_id) {
                return Err(ServiceError::InvalidInput("User already a member".to_string()));
            }

            trip.members.push(member.clone());
            trip.member_ids.push(member.user_id.clone());
            let fields = to_fields(&json!({
                "members": trip.members,
                "memberIds": trip.member_ids,
            }))?;

            match self.store.update(&trips, trip_id, fields, Some(version)).await {
                Ok(_) => {
                    info!("User {} invited {} to trip {}", identity.id, member.user_id, trip_id);
                    return Ok(member);
                }
                Err(StoreError::Conflict { expected, actual, .. }) => {
                    warn!(
                        "Trip {} changed during invite (expected v{}, found v{}), attempt {}",
                        trip_id, expected, actual, attempt + 1
                    );
                    let (doc, fresh) = load_trip(self.store.as_ref(), trip_id).await?;
                    version = doc.version;
                    trip = fresh;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Contention(format!(
            "membership of trip {} kept changing",
            trip_id
        )))
    }
}
