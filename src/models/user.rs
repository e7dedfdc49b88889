use serde::{Deserialize, Serialize};

/// User profile as returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Denormalized copy of a user embedded in trips, events and tasks.
///
/// Copied at write time and never refreshed, so it may drift from the
/// identity service's current record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<&UserProfile> for UserSnapshot {
    fn from(user: &UserProfile) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_uses_user_id_key() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "email": "ana@example.com",
            "firstName": "Ana",
            "lastName": "Lima"
        }))
        .unwrap();

        let snapshot = serde_json::to_value(UserSnapshot::from(&profile)).unwrap();
        assert_eq!(snapshot["userId"], "u1");
        assert_eq!(snapshot["firstName"], "Ana");
        assert!(snapshot.get("id").is_none());
    }

    #[test]
    fn profile_tolerates_missing_names() {
        let profile: UserProfile = serde_json::from_value(json!({ "id": "u2" })).unwrap();
        assert_eq!(profile.email, "");
        assert_eq!(profile.first_name, "");
    }
}
