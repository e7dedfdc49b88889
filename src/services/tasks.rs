use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{authorize_trip, load_event, ServiceError, ServiceResult};
use crate::models::{non_blank, NewTask, StatusUpdate, Task, TaskStatus, UserProfile, UserSnapshot};
use crate::store::{to_fields, CollectionPath, DocumentStore, Query};

/// Tasks under an event. Every call requires owner or member access to the trip.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn DocumentStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create_task(
        &self,
        identity: &UserProfile,
        trip_id: &str,
        event_id: &str,
        request: NewTask,
    ) -> ServiceResult<Task> {
        let missing = || ServiceError::InvalidInput("Missing required fields".to_string());
        let name = non_blank(&request.name).ok_or_else(missing)?.to_string();
        let assigned_to = request
            .assigned_to
            .filter(|user| !user.user_id.trim().is_empty())
            .ok_or_else(missing)?;

        authorize_trip(self.store.as_ref(), identity, trip_id).await?;
        load_event(self.store.as_ref(), trip_id, event_id).await?;

        let tasks = CollectionPath::tasks(trip_id, event_id);
        let task = Task {
            id: self.store.generate_id(),
            name,
            description: request.description,
            created_at: request.created_at.unwrap_or_else(Utc::now),
            priority: request.priority,
            status: TaskStatus::Pending,
            assigned_to,
            created_by: UserSnapshot::from(identity),
        };

        self.store.create(&tasks, &task.id, to_fields(&task)?).await?;
        info!(
            "User {} created task {} for {} in {}",
            identity.id,
            task.id,
            task.assigned_to.user_id,
            tasks
        );
        Ok(task)
    }

    /// Tasks of the event keyed by assignee, pending before completed,
    /// newest first within each status.
    pub async fn list_tasks_grouped_by_assignee(
        &self,
        identity: &UserProfile,
        trip_id: &str,
        event_id: &str,
    ) -> ServiceResult<BTreeMap<String, Vec<Task>>> {
        authorize_trip(self.store.as_ref(), identity, trip_id).await?;
        load_event(self.store.as_ref(), trip_id, event_id).await?;

        let tasks = self
            .store
            .query(&CollectionPath::tasks(trip_id, event_id), &Query::new())
            .await?
            .iter()
            .map(|doc| doc.decode::<Task>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(group_by_assignee(tasks))
    }

    pub async fn set_task_status(
        &self,
        identity: &UserProfile,
        trip_id: &str,
        event_id: &str,
        task_id: &str,
        update: StatusUpdate,
    ) -> ServiceResult<Task> {
        let status = update
            .status
            .as_deref()
            .ok_or_else(|| ServiceError::InvalidInput("Missing task status".to_string()))?
            .parse::<TaskStatus>()
            .map_err(ServiceError::InvalidInput)?;

        authorize_trip(self.store.as_ref(), identity, trip_id).await?;

        let tasks = CollectionPath::tasks(trip_id, event_id);
        if self.store.get(&tasks, task_id).await?.is_none() {
            return Err(ServiceError::NotFound("Task not found".to_string()));
        }

        let updated = self
            .store
            .update(&tasks, task_id, to_fields(&json!({ "status": status }))?, None)
            .await?;
        info!("User {} set task {} to {}", identity.id, task_id, status);
        Ok(updated.decode::<Task>()?)
    }
}

/// Partition by assignee; each partition is pending tasks newest-first
/// followed by completed tasks newest-first. Assignees without tasks are absent.
pub fn group_by_assignee(tasks: Vec<Task>) -> BTreeMap<String, Vec<Task>> {
    let mut buckets: BTreeMap<String, (Vec<Task>, Vec<Task>)> = BTreeMap::new();
    for task in tasks {
        let (pending, completed) = buckets.entry(task.assigned_to.user_id.clone()).or_default();
        match task.status {
            TaskStatus::Completed => completed.push(task),
            TaskStatus::Pending => pending.push(task),
        }
    }

    buckets
        .into_iter()
        .map(|(user_id, (mut pending, mut completed))| {
            pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            completed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            pending.extend(completed);
            (user_id, pending)
        })
        .collect()
}
