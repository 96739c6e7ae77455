use chrono::{DateTime, Utc};

use crate::io::persist::Persistence;
use crate::io::storage::KeyValueStore;
use crate::model::partition::Partition;
use crate::model::todo::Todo;
use crate::model::topic::Topic;
use crate::ops::derive::{self, DayView};
use crate::ops::{todo_ops, topic_ops};

/// The authoritative todo and topic collections for a session.
///
/// Collections are loaded once in [`Planner::open`]. Every operation that
/// changes something writes the todos back (topic operations also write
/// the topics); failed writes are logged by [`Persistence`] and the
/// in-memory state stays authoritative until a later save succeeds.
/// [`Planner::flush`] writes both collections once more at shutdown.
#[derive(Debug)]
pub struct Planner<S: KeyValueStore> {
    todos: Vec<Todo>,
    topics: Vec<Topic>,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> Planner<S> {
    pub fn open(persistence: Persistence<S>) -> Self {
        let todos = persistence.load_todos();
        let topics = persistence.load_topics();
        Planner {
            todos,
            topics,
            persistence,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        todo_ops::find_todo(&self.todos, id)
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        topic_ops::find_topic(&self.topics, id)
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn into_persistence(self) -> Persistence<S> {
        self.persistence
    }

    /// Color given to topics created without one.
    pub fn default_color(&self) -> &str {
        self.persistence.default_color()
    }

    /// The partition a todo currently sits in.
    pub fn partition_of(&self, id: &str) -> Option<Partition> {
        self.todo(id).map(|t| Partition::of(t, &self.topics))
    }

    /// Members of a partition in display order.
    pub fn partition_members(&self, partition: &Partition) -> Vec<&Todo> {
        todo_ops::sorted_members(&self.todos, &self.topics, partition)
            .into_iter()
            .map(|i| &self.todos[i])
            .collect()
    }

    /// Day view for `day` (unscheduled todos for `None`).
    pub fn day_view(&self, day: Option<chrono::NaiveDate>) -> DayView<'_> {
        derive::day_view(&self.todos, &self.topics, day)
    }

    /// Topics to offer as chips.
    pub fn active_topics(&self) -> Vec<&Topic> {
        derive::active_topics_for(&self.todos, &self.topics)
    }

    // -----------------------------------------------------------------------
    // Todo operations
    // -----------------------------------------------------------------------

    pub fn add_todo(
        &mut self,
        text: &str,
        date: Option<DateTime<Utc>>,
        topic_id: Option<&str>,
    ) -> Option<String> {
        let id = todo_ops::add_todo(&mut self.todos, &self.topics, text, date, topic_id)?;
        self.persist_todos();
        Some(id)
    }

    pub fn toggle_todo(&mut self, id: &str) -> bool {
        let changed = todo_ops::toggle_todo(&mut self.todos, id);
        self.persist_todos_if(changed)
    }

    pub fn edit_todo(&mut self, id: &str, text: &str) -> bool {
        let changed = todo_ops::edit_todo(&mut self.todos, id, text);
        self.persist_todos_if(changed)
    }

    pub fn delete_todo(&mut self, id: &str) -> bool {
        let changed = todo_ops::delete_todo(&mut self.todos, id);
        self.persist_todos_if(changed)
    }

    pub fn retopic_todo(&mut self, id: &str, topic_id: &str) -> bool {
        let changed = todo_ops::retopic_todo(&mut self.todos, &self.topics, id, topic_id);
        self.persist_todos_if(changed)
    }

    pub fn reschedule_todo(&mut self, id: &str, date: Option<DateTime<Utc>>) -> bool {
        let changed = todo_ops::reschedule_todo(&mut self.todos, id, date);
        self.persist_todos_if(changed)
    }

    pub fn reorder_todo(
        &mut self,
        id: &str,
        from: &Partition,
        to: &Partition,
        target_index: usize,
    ) -> bool {
        let changed =
            todo_ops::reorder_todo(&mut self.todos, &self.topics, id, from, to, target_index);
        self.persist_todos_if(changed)
    }

    // -----------------------------------------------------------------------
    // Topic operations
    // -----------------------------------------------------------------------

    pub fn add_topic(&mut self, title: &str, color: &str) -> Option<String> {
        let id = topic_ops::add_topic(&mut self.topics, title, color)?;
        self.persist_all();
        Some(id)
    }

    pub fn edit_topic(&mut self, id: &str, title: &str, color: &str) -> bool {
        let changed = topic_ops::edit_topic(&mut self.topics, id, title, color);
        if changed {
            self.persist_all();
        }
        changed
    }

    pub fn delete_topic(&mut self, id: &str) -> bool {
        let changed = topic_ops::delete_topic(&mut self.topics, &mut self.todos, id);
        if changed {
            self.persist_all();
        }
        changed
    }

    /// Final best-effort write of both collections. Returns false if either
    /// write failed (the failure has already been logged).
    pub fn flush(&mut self) -> bool {
        let todos_ok = self.persistence.save_todos(&self.todos);
        let topics_ok = self.persistence.save_topics(&self.topics);
        todos_ok && topics_ok
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist_todos(&mut self) {
        self.persistence.save_todos(&self.todos);
    }

    fn persist_todos_if(&mut self, changed: bool) -> bool {
        if changed {
            self.persist_todos();
        }
        changed
    }

    fn persist_all(&mut self) {
        self.persistence.save_todos(&self.todos);
        self.persistence.save_topics(&self.topics);
    }
}
