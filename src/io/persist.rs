use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::storage::KeyValueStore;
use crate::model::config::StorageConfig;
use crate::model::todo::Todo;
use crate::model::topic::{DEFAULT_TOPIC_COLOR, Topic, default_topics, ensure_uncategorized};

/// Loads and saves the todo and topic collections under two fixed keys.
///
/// Nothing here fails: unreadable or malformed data falls back to the
/// defaults, and failed writes leave the caller's in-memory state as the
/// source of truth. Every such fallback is written to the recovery log.
#[derive(Debug)]
pub struct Persistence<S: KeyValueStore> {
    store: S,
    todos_key: String,
    topics_key: String,
    default_color: String,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S, storage: &StorageConfig, default_color: &str) -> Self {
        Persistence {
            store,
            todos_key: storage.todos_key.clone(),
            topics_key: storage.topics_key.clone(),
            default_color: default_color.to_string(),
        }
    }

    /// Default keys (`todos-v1`, `topics-v1`) and default topic color.
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, &StorageConfig::default(), DEFAULT_TOPIC_COLOR)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn todos_key(&self) -> &str {
        &self.todos_key
    }

    pub fn topics_key(&self) -> &str {
        &self.topics_key
    }

    /// Color given to the Uncategorized topic when it has to be created.
    pub fn default_color(&self) -> &str {
        &self.default_color
    }

    /// Stored todos, or an empty list.
    pub fn load_todos(&self) -> Vec<Todo> {
        self.load_collection(&self.todos_key).unwrap_or_default()
    }

    /// Stored topics, always including the reserved Uncategorized topic.
    pub fn load_topics(&self) -> Vec<Topic> {
        match self.load_collection(&self.topics_key) {
            Some(mut topics) => {
                ensure_uncategorized(&mut topics, &self.default_color);
                topics
            }
            None => default_topics(&self.default_color),
        }
    }

    /// Overwrite the stored todos. Returns false (after logging) on failure.
    pub fn save_todos(&mut self, todos: &[Todo]) -> bool {
        let key = self.todos_key.clone();
        self.save_collection(&key, todos)
    }

    /// Overwrite the stored topics. Returns false (after logging) on failure.
    pub fn save_topics(&mut self, topics: &[Topic]) -> bool {
        let key = self.topics_key.clone();
        self.save_collection(&key, topics)
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_recovery(
                    self.store.log_dir(),
                    RecoveryEntry::now(RecoveryCategory::Read, format!("could not read {}", key))
                        .field("Key", key)
                        .field("Error", e),
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                log_recovery(
                    self.store.log_dir(),
                    RecoveryEntry::now(RecoveryCategory::Parser, format!("could not parse {}", key))
                        .field("Key", key)
                        .field("Error", e)
                        .body(raw),
                );
                None
            }
        }
    }

    fn save_collection<T: Serialize>(&mut self, key: &str, items: &[T]) -> bool {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(e) => {
                log_recovery(
                    self.store.log_dir(),
                    RecoveryEntry::now(
                        RecoveryCategory::Write,
                        format!("could not serialize {}", key),
                    )
                    .field("Key", key)
                    .field("Error", e),
                );
                return false;
            }
        };

        if let Err(e) = self.store.set(key, &payload) {
            log_recovery(
                self.store.log_dir(),
                RecoveryEntry::now(RecoveryCategory::Write, format!("could not save {}", key))
                    .field("Key", key)
                    .field("Error", e)
                    .body(payload),
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use crate::io::storage::{DirStore, MemoryStore};
    use crate::model::topic::UNCATEGORIZED_ID;
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    /// Store whose writes always fail, as when the medium is full.
    struct FullStore {
        inner: MemoryStore,
        log_dir: std::path::PathBuf,
    }

    impl KeyValueStore for FullStore {
        fn get(&self, key: &str) -> io::Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("quota exceeded"))
        }

        fn log_dir(&self) -> Option<&Path> {
            Some(&self.log_dir)
        }
    }

    #[test]
    fn empty_store_yields_defaults() {
        let persistence = Persistence::with_defaults(MemoryStore::new());
        assert!(persistence.load_todos().is_empty());
        assert_eq!(
            persistence.load_topics(),
            vec![Topic::new(
                UNCATEGORIZED_ID.into(),
                "Uncategorized".into(),
                "#F3EFEE".into()
            )]
        );
    }

    #[test]
    fn malformed_data_falls_back_and_is_logged() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("todos-v1.json"), "{not json").unwrap();
        std::fs::write(tmp.path().join("topics-v1.json"), "42").unwrap();

        let persistence = Persistence::with_defaults(DirStore::new(tmp.path()));
        assert!(persistence.load_todos().is_empty());
        assert_eq!(persistence.load_topics().len(), 1);

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.category == RecoveryCategory::Parser));
        assert!(entries.iter().any(|e| e.body == "{not json"));
    }

    #[test]
    fn topics_missing_uncategorized_get_it_prepended() {
        let store = MemoryStore::with_entries([(
            "topics-v1",
            r##"[{"id":"1","title":"Work","color":"#E6D9CB"}]"##,
        )]);
        let topics = Persistence::with_defaults(store).load_topics();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].id, UNCATEGORIZED_ID);
        assert_eq!(topics[1].title, "Work");
    }

    #[test]
    fn save_then_load_round_trip() {
        let mut persistence = Persistence::with_defaults(MemoryStore::new());
        let mut todo = Todo::new("1".into(), "A".into());
        todo.order = Some(0);
        todo.topic_id = Some("work".into());
        let mut dated: Todo =
            serde_json::from_str(r#"{"id":"3","text":"C","date":"2025-05-14T10:00:00.000Z"}"#)
                .unwrap();
        dated.completed = true;
        let todos = vec![todo, Todo::new("2".into(), "B".into()), dated];
        let topics = vec![
            Topic::uncategorized("#F3EFEE"),
            Topic::new("work".into(), "Work".into(), "#E6D9CB".into()),
        ];

        assert!(persistence.save_todos(&todos));
        assert!(persistence.save_topics(&topics));
        assert_eq!(persistence.load_todos(), todos);
        assert_eq!(persistence.load_topics(), topics);
        assert_eq!(
            persistence.load_todos()[2].date.unwrap().to_rfc3339(),
            "2025-05-14T10:00:00+00:00"
        );
    }

    #[test]
    fn custom_keys_are_used() {
        let storage = StorageConfig {
            todos_key: "mine".into(),
            topics_key: "tags".into(),
        };
        let mut persistence = Persistence::new(MemoryStore::new(), &storage, "#FFFFFF");
        persistence.save_todos(&[Todo::new("1".into(), "A".into())]);
        assert!(persistence.store().raw("mine").is_some());
        assert!(persistence.store().raw("todos-v1").is_none());
        assert_eq!(persistence.load_topics()[0].color, "#FFFFFF");
    }

    #[test]
    fn failed_write_is_logged_with_payload() {
        let tmp = TempDir::new().unwrap();
        let store = FullStore {
            inner: MemoryStore::new(),
            log_dir: tmp.path().to_path_buf(),
        };
        let mut persistence = Persistence::with_defaults(store);
        assert!(!persistence.save_todos(&[Todo::new("1".into(), "A".into())]));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert!(entries[0].body.contains(r#""text":"A""#));
    }
}
