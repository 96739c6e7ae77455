use chrono::{DateTime, Utc};

use crate::model::partition::{Lane, Partition};
use crate::model::todo::{Todo, local_day, order_of, resolved_topic_of, start_of_day};
use crate::model::topic::{Topic, UNCATEGORIZED_ID};
use crate::ops::ids::fresh_id;

// Every operation here is forgiving: blank text and unknown ids leave the
// collection untouched and report `false` / `None`.

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Append a new active todo. Its `order` is the size of the partition it
/// lands in, so it sorts last there. A `topic_id` naming no existing topic
/// files the todo under Uncategorized.
///
/// Returns the new id, or `None` if `text` is blank.
pub fn add_todo(
    todos: &mut Vec<Todo>,
    topics: &[Topic],
    text: &str,
    date: Option<DateTime<Utc>>,
    topic_id: Option<&str>,
) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let topic_id = topic_id
        .map(str::trim)
        .filter(|id| topics.iter().any(|t| t.id == *id))
        .map(str::to_string);
    let lane_topic = topic_id.as_deref().unwrap_or(UNCATEGORIZED_ID);
    let target = Partition::topic(date.map(local_day), lane_topic);
    let order = todos.iter().filter(|t| target.contains(t, topics)).count() as i64;

    let id = fresh_id(todos.iter().map(|t| t.id.as_str()));
    todos.push(Todo {
        order: Some(order),
        topic_id,
        date,
        ..Todo::new(id.clone(), text.to_string())
    });
    Some(id)
}

/// Flip `completed`.
pub fn toggle_todo(todos: &mut [Todo], id: &str) -> bool {
    match find_todo_mut(todos, id) {
        Some(todo) => {
            todo.completed = !todo.completed;
            true
        }
        None => false,
    }
}

/// Replace the text with the trimmed `text`.
pub fn edit_todo(todos: &mut [Todo], id: &str, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    match find_todo_mut(todos, id) {
        Some(todo) if todo.text != text => {
            todo.text = text.to_string();
            true
        }
        _ => false,
    }
}

/// Remove a todo. Siblings keep their `order` values; gaps are harmless
/// since only relative order matters.
pub fn delete_todo(todos: &mut Vec<Todo>, id: &str) -> bool {
    let before = todos.len();
    todos.retain(|t| t.id != id);
    todos.len() != before
}

/// Move a todo to another existing topic.
pub fn retopic_todo(todos: &mut [Todo], topics: &[Topic], id: &str, topic_id: &str) -> bool {
    if !topics.iter().any(|t| t.id == topic_id) {
        return false;
    }
    match find_todo_mut(todos, id) {
        Some(todo) if todo.topic_id.as_deref() != Some(topic_id) => {
            todo.topic_id = Some(topic_id.to_string());
            true
        }
        _ => false,
    }
}

/// Set or clear the scheduled date. Topic, completion and order are kept.
pub fn reschedule_todo(todos: &mut [Todo], id: &str, date: Option<DateTime<Utc>>) -> bool {
    match find_todo_mut(todos, id) {
        Some(todo) if todo.date != date => {
            todo.date = date;
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Reordering
// ---------------------------------------------------------------------------

/// Move a todo to `target_index` within the partition `to`.
///
/// The todo takes on the destination's meaning: the Completed lane marks it
/// completed and keeps its topic; a topic lane marks it active and assigns
/// that topic; a different day reschedules it to the start of that day (or
/// unschedules it). Afterwards the remaining source sequence followed by
/// the destination sequence is renumbered densely from 0. When `from` and
/// `to` are the same partition there is only one sequence.
///
/// No-op if the todo is not in `from`, the destination topic does not
/// exist, or the todo would end up where it already is.
pub fn reorder_todo(
    todos: &mut [Todo],
    topics: &[Topic],
    id: &str,
    from: &Partition,
    to: &Partition,
    target_index: usize,
) -> bool {
    let Some(pos) = todos.iter().position(|t| t.id == id) else {
        return false;
    };
    if !from.contains(&todos[pos], topics) {
        return false;
    }
    if let Lane::Topic(topic_id) = &to.lane
        && !topics.iter().any(|t| t.id == *topic_id)
    {
        return false;
    }

    let mut source = sorted_members(todos, topics, from);
    let Some(current) = source.iter().position(|&i| i == pos) else {
        return false;
    };
    source.remove(current);

    if from == to {
        let target = target_index.min(source.len());
        if target == current {
            return false;
        }
        source.insert(target, pos);
        renumber(todos, &source);
        return true;
    }

    move_into(&mut todos[pos], topics, from, to);

    let mut destination: Vec<usize> = sorted_members(todos, topics, to)
        .into_iter()
        .filter(|&i| i != pos)
        .collect();
    destination.insert(target_index.min(destination.len()), pos);

    let sequence: Vec<usize> = source.into_iter().chain(destination).collect();
    renumber(todos, &sequence);
    true
}

/// Apply the destination partition's lane and day to a todo.
fn move_into(todo: &mut Todo, topics: &[Topic], from: &Partition, to: &Partition) {
    match &to.lane {
        Lane::Completed => todo.completed = true,
        Lane::Topic(topic_id) => {
            todo.completed = false;
            if resolved_topic_of(todo, topics) != topic_id.as_str() {
                todo.topic_id = Some(topic_id.clone());
            }
        }
    }
    if to.day != from.day {
        todo.date = to.day.map(start_of_day);
    }
}

/// Indices of the partition's members, stably sorted by `order`.
pub fn sorted_members(todos: &[Todo], topics: &[Topic], partition: &Partition) -> Vec<usize> {
    let mut members: Vec<usize> = (0..todos.len())
        .filter(|&i| partition.contains(&todos[i], topics))
        .collect();
    members.sort_by_key(|&i| order_of(&todos[i]));
    members
}

/// Dense renumbering in sequence order.
fn renumber(todos: &mut [Todo], sequence: &[usize]) {
    for (order, &i) in sequence.iter().enumerate() {
        todos[i].order = Some(order as i64);
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_todo<'a>(todos: &'a [Todo], id: &str) -> Option<&'a Todo> {
    todos.iter().find(|t| t.id == id)
}

pub fn find_todo_mut<'a>(todos: &'a mut [Todo], id: &str) -> Option<&'a mut Todo> {
    todos.iter_mut().find(|t| t.id == id)
}
