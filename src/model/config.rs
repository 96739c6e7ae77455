use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::topic::DEFAULT_TOPIC_COLOR;

/// Configuration from `.dayplan/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Keys the two collections are stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Todos collection key (`todos-v1`)
    #[serde(default = "default_todos_key")]
    pub todos_key: String,
    #[serde(default = "default_topics_key")]
    pub topics_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            todos_key: default_todos_key(),
            topics_key: default_topics_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Color for new topics without one, and for the Uncategorized topic
    #[serde(default = "default_color")]
    pub default_color: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        TopicConfig {
            default_color: default_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Number of days in the date strip
    #[serde(default = "default_strip_days")]
    pub strip_days: usize,
    /// Todos listed per calendar day before collapsing into "+N more"
    #[serde(default = "default_visible_per_day")]
    pub visible_per_day: usize,
    #[serde(default)]
    pub week_start: WeekStart,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            strip_days: default_strip_days(),
            visible_per_day: default_visible_per_day(),
            week_start: WeekStart::default(),
        }
    }
}

/// First column of the month grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

fn default_todos_key() -> String {
    "todos-v1".to_string()
}

fn default_topics_key() -> String {
    "topics-v1".to_string()
}

fn default_color() -> String {
    DEFAULT_TOPIC_COLOR.to_string()
}

fn default_strip_days() -> usize {
    6
}

fn default_visible_per_day() -> usize {
    4
}
