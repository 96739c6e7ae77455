use crate::model::todo::Todo;
use crate::model::topic::{Topic, UNCATEGORIZED_ID};
use crate::ops::ids::fresh_id;

/// Append a topic. Returns its id, or `None` for a blank title.
pub fn add_topic(topics: &mut Vec<Topic>, title: &str, color: &str) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let id = fresh_id(topics.iter().map(|t| t.id.as_str()));
    topics.push(Topic::new(id.clone(), title.to_string(), color.to_string()));
    Some(id)
}

/// Rename and recolor a topic. The reserved topic cannot be edited.
pub fn edit_topic(topics: &mut [Topic], id: &str, title: &str, color: &str) -> bool {
    let title = title.trim();
    if id == UNCATEGORIZED_ID || title.is_empty() {
        return false;
    }
    let Some(topic) = topics.iter_mut().find(|t| t.id == id) else {
        return false;
    };
    if topic.title == title && topic.color == color {
        return false;
    }
    topic.title = title.to_string();
    topic.color = color.to_string();
    true
}

/// Remove a topic, moving its todos to Uncategorized. The reserved topic
/// cannot be deleted.
pub fn delete_topic(topics: &mut Vec<Topic>, todos: &mut [Todo], id: &str) -> bool {
    if id == UNCATEGORIZED_ID {
        return false;
    }
    let before = topics.len();
    topics.retain(|t| t.id != id);
    if topics.len() == before {
        return false;
    }
    for todo in todos.iter_mut().filter(|t| t.topic_id.as_deref() == Some(id)) {
        todo.topic_id = Some(UNCATEGORIZED_ID.to_string());
    }
    true
}

pub fn find_topic<'a>(topics: &'a [Topic], id: &str) -> Option<&'a Topic> {
    topics.iter().find(|t| t.id == id)
}
