//! Read-only views over the todo and topic collections.
//!
//! Everything here is recomputed from the current collections on every
//! read and never stored. Sorting is always ascending by `order` (missing
//! counts as 0) and stable, so ties keep collection order.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::todo::{Todo, order_of, resolved_topic_of};
use crate::model::topic::{Topic, UNCATEGORIZED_ID};

/// Todos scheduled on the same local calendar day as `day`.
pub fn filter_by_date(todos: &[Todo], day: NaiveDate) -> Vec<&Todo> {
    todos.iter().filter(|t| t.day() == Some(day)).collect()
}

/// Todos with no date.
pub fn filter_unscheduled(todos: &[Todo]) -> Vec<&Todo> {
    todos.iter().filter(|t| t.date.is_none()).collect()
}

/// Todos on `day`, or the unscheduled ones for `None`.
pub fn filter_by_day(todos: &[Todo], day: Option<NaiveDate>) -> Vec<&Todo> {
    match day {
        Some(day) => filter_by_date(todos, day),
        None => filter_unscheduled(todos),
    }
}

/// Stable sort by `order`.
pub fn sort_by_order(todos: &mut [&Todo]) {
    todos.sort_by_key(|t| order_of(t));
}

/// Split into (active, completed), each sorted by `order`.
pub fn partition_by_completion<'a>(
    todos: impl IntoIterator<Item = &'a Todo>,
) -> (Vec<&'a Todo>, Vec<&'a Todo>) {
    let (mut active, mut completed): (Vec<&Todo>, Vec<&Todo>) =
        todos.into_iter().partition(|t| !t.completed);
    sort_by_order(&mut active);
    sort_by_order(&mut completed);
    (active, completed)
}

/// Active todos of one topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicGroup<'a> {
    pub topic: &'a Topic,
    pub todos: Vec<&'a Todo>,
}

/// Bucket the active todos by topic, one bucket per topic in collection
/// order. Todos whose topic is missing or unknown go to Uncategorized.
/// Empty buckets are kept.
pub fn group_by_topic<'a>(
    todos: impl IntoIterator<Item = &'a Todo>,
    topics: &'a [Topic],
) -> Vec<TopicGroup<'a>> {
    let mut groups: Vec<TopicGroup<'a>> = topics
        .iter()
        .map(|topic| TopicGroup {
            topic,
            todos: Vec::new(),
        })
        .collect();

    for todo in todos.into_iter().filter(|t| !t.completed) {
        let topic_id = resolved_topic_of(todo, topics);
        if let Some(group) = groups.iter_mut().find(|g| g.topic.id == topic_id) {
            group.todos.push(todo);
        }
    }

    for group in &mut groups {
        sort_by_order(&mut group.todos);
    }
    groups
}

/// Topics worth offering as chips: Uncategorized plus every topic that owns
/// at least one todo anywhere in `todos`, in collection order.
pub fn active_topics_for<'a>(todos: &[Todo], topics: &'a [Topic]) -> Vec<&'a Topic> {
    topics
        .iter()
        .filter(|topic| {
            topic.id == UNCATEGORIZED_ID
                || todos.iter().any(|t| resolved_topic_of(t, topics) == topic.id)
        })
        .collect()
}

/// Everything shown for one day: topic buckets, then the completed list
#[derive(Debug, Clone, Serialize)]
pub struct DayView<'a> {
    pub day: Option<NaiveDate>,
    pub groups: Vec<TopicGroup<'a>>,
    pub completed: Vec<&'a Todo>,
}

impl DayView<'_> {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.groups.iter().all(|g| g.todos.is_empty())
    }
}

/// Day view for `day` (or the unscheduled todos for `None`).
pub fn day_view<'a>(todos: &'a [Todo], topics: &'a [Topic], day: Option<NaiveDate>) -> DayView<'a> {
    let on_day = filter_by_day(todos, day);
    let (active, completed) = partition_by_completion(on_day);
    DayView {
        day,
        groups: group_by_topic(active, topics),
        completed,
    }
}
