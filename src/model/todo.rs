use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::topic::{Topic, UNCATEGORIZED_ID};

/// A single to-do entry as persisted in the todos collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Stable identifier, assigned at creation
    pub id: String,
    /// Display text (trimmed, never empty)
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Sort key within the todo's partition (missing = 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Owning topic (missing or dangling = Uncategorized)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    /// Scheduled instant; only its local calendar day is meaningful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl Todo {
    /// Create an active, unscheduled, uncategorized todo
    pub fn new(id: String, text: String) -> Self {
        Todo {
            id,
            text,
            completed: false,
            order: None,
            topic_id: None,
            date: None,
        }
    }

    /// The local calendar day this todo is scheduled on, if any
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.map(local_day)
    }
}

/// `order` with the implicit default applied
pub fn order_of(todo: &Todo) -> i64 {
    todo.order.unwrap_or(0)
}

/// `topicId` with the implicit default applied.
///
/// This does not check that the topic still exists; use
/// [`resolved_topic_of`] when dangling references matter.
pub fn topic_of(todo: &Todo) -> &str {
    todo.topic_id.as_deref().unwrap_or(UNCATEGORIZED_ID)
}

/// Like [`topic_of`], but ids that match no topic fall back to Uncategorized
pub fn resolved_topic_of<'a>(todo: &'a Todo, topics: &[Topic]) -> &'a str {
    let id = topic_of(todo);
    if topics.iter().any(|t| t.id == id) {
        id
    } else {
        UNCATEGORIZED_ID
    }
}

/// Local calendar day of an instant
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// The instant at which a local calendar day starts.
///
/// Falls back to UTC midnight when the local midnight does not exist
/// (DST transitions that skip 00:00).
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    match midnight.and_local_timezone(Local).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => midnight.and_utc(),
    }
}
