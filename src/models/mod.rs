pub mod event;
pub mod task;
pub mod trip;
pub mod user;

pub use event::{Event, NewEvent};
pub use task::{NewTask, StatusUpdate, Task, TaskStatus};
pub use trip::{InviteRequest, NewTrip, Trip};
pub use user::{UserProfile, UserSnapshot};

/// Treat absent and blank strings the same way for required fields.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
