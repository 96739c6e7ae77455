use serde::{Deserialize, Serialize};

/// Id of the reserved fallback topic
pub const UNCATEGORIZED_ID: &str = "uncategorized";

/// Title of the reserved fallback topic
pub const UNCATEGORIZED_TITLE: &str = "Uncategorized";

/// Color used when a topic has none, or a todo's topic cannot be resolved
pub const DEFAULT_TOPIC_COLOR: &str = "#F3EFEE";

/// A topic used to group todos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    /// Opaque color value (e.g. `#E6D9CB`)
    pub color: String,
}

impl Topic {
    pub fn new(id: String, title: String, color: String) -> Self {
        Topic { id, title, color }
    }

    /// The reserved Uncategorized topic with the given color
    pub fn uncategorized(color: &str) -> Self {
        Topic {
            id: UNCATEGORIZED_ID.to_string(),
            title: UNCATEGORIZED_TITLE.to_string(),
            color: color.to_string(),
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.id == UNCATEGORIZED_ID
    }
}

/// The topic collection used when nothing usable is stored
pub fn default_topics(color: &str) -> Vec<Topic> {
    vec![Topic::uncategorized(color)]
}

/// Make sure the reserved topic is present, prepending it if missing.
/// Returns true if the list was changed.
pub fn ensure_uncategorized(topics: &mut Vec<Topic>, color: &str) -> bool {
    if topics.iter().any(Topic::is_reserved) {
        return false;
    }
    topics.insert(0, Topic::uncategorized(color));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_uncategorized_prepends_once() {
        let mut topics = vec![Topic::new("1".into(), "Work".into(), "#E6D9CB".into())];
        assert!(ensure_uncategorized(&mut topics, DEFAULT_TOPIC_COLOR));
        assert_eq!(topics.len(), 2);
        assert!(topics[0].is_reserved());
        assert_eq!(topics[0].title, "Uncategorized");

        assert!(!ensure_uncategorized(&mut topics, DEFAULT_TOPIC_COLOR));
        assert_eq!(topics.len(), 2);
    }

    #[test]
    fn reserved_topic_kept_in_place() {
        let mut topics = vec![
            Topic::new("1".into(), "Work".into(), "#E6D9CB".into()),
            Topic::uncategorized("#000000"),
        ];
        assert!(!ensure_uncategorized(&mut topics, DEFAULT_TOPIC_COLOR));
        assert!(topics[1].is_reserved());
        assert_eq!(topics[1].color, "#000000");
    }
}
