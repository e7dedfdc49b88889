use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSnapshot;

/// A dated entry under exactly one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored as `YYYY-MM-DD`, which orders the same as the calendar.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub created_by: UserSnapshot,
}

/// Body of `POST /trips/{tripId}/events`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
