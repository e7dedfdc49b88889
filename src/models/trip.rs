use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSnapshot;

/// Top-level collaborative resource: one owner, zero or more members.
///
/// `member_ids` mirrors the user ids in `members` so the store can answer
/// "trips containing user X" with a single array-contains query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub owner: UserSnapshot,
    #[serde(default)]
    pub members: Vec<UserSnapshot>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Trip {
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner.user_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    /// Owner or member.
    pub fn is_accessible_by(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.is_member(user_id)
    }

    /// Owner first, then members in invitation order.
    pub fn roster(&self) -> Vec<UserSnapshot> {
        std::iter::once(self.owner.clone())
            .chain(self.members.iter().cloned())
            .collect()
    }
}

/// Body of `POST /trips`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

/// Body of `POST /trips/{tripId}/invite`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InviteRequest {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str) -> UserSnapshot {
        UserSnapshot {
            user_id: id.to_string(),
            email: format!("{id}@example.com"),
            ..Default::default()
        }
    }

    fn trip() -> Trip {
        Trip {
            id: "t1".into(),
            title: "Japan".into(),
            summary: None,
            created_by: "owner".into(),
            created_at: Utc::now(),
            owner: snapshot("owner"),
            members: vec![snapshot("m1"), snapshot("m2")],
            member_ids: vec!["m1".into(), "m2".into()],
            tags: vec![],
        }
    }

    #[test]
    fn access_covers_owner_and_members_only() {
        let trip = trip();
        assert!(trip.is_accessible_by("owner"));
        assert!(trip.is_accessible_by("m2"));
        assert!(!trip.is_accessible_by("stranger"));
        assert!(!trip.is_member("owner"));
    }

    #[test]
    fn roster_puts_owner_first() {
        let ids: Vec<_> = trip().roster().into_iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec!["owner", "m1", "m2"]);
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(trip()).unwrap();
        assert_eq!(value["memberIds"][0], "m1");
        assert_eq!(value["owner"]["userId"], "owner");
        assert_eq!(value["createdBy"], "owner");
    }
}
