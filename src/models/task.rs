use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("Unknown task status '{}'", other)),
        }
    }
}

/// Stored documents may carry status strings written before the closed set
/// was enforced; only "completed" counts as completed.
fn lenient_status<'de, D>(deserializer: D) -> Result<TaskStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref() {
        Some("completed") => TaskStatus::Completed,
        _ => TaskStatus::Pending,
    })
}

/// Assignable unit of work under exactly one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: TaskStatus,
    pub assigned_to: UserSnapshot,
    pub created_by: UserSnapshot,
}

/// Body of `POST /trips/{tripId}/events/{eventId}/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: Option<String>,
    pub assigned_to: Option<UserSnapshot>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub priority: Option<String>,
}

/// Body of `PATCH .../tasks/{taskId}/status`. Validated by the task service
/// so an unknown value is reported as invalid input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(alias = "taskStatus")]
    pub status: Option<String>,
}
