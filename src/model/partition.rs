use chrono::NaiveDate;

use super::todo::{Todo, resolved_topic_of};
use super::topic::Topic;

/// Which list inside a day a todo is shown in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lane {
    /// Active todos of one topic
    Topic(String),
    /// Completed todos of every topic
    Completed,
}

impl Lane {
    /// Parse a lane name as typed by the user: `completed` or a topic id
    pub fn parse(s: &str) -> Lane {
        match s {
            "completed" => Lane::Completed,
            other => Lane::Topic(other.to_string()),
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lane::Topic(id) => write!(f, "{}", id),
            Lane::Completed => write!(f, "completed"),
        }
    }
}

/// A set of todos within which `order` is meaningful: one lane on one day
/// (or among unscheduled todos when `day` is `None`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub day: Option<NaiveDate>,
    pub lane: Lane,
}

impl Partition {
    pub fn new(day: Option<NaiveDate>, lane: Lane) -> Self {
        Partition { day, lane }
    }

    pub fn topic(day: Option<NaiveDate>, topic_id: &str) -> Self {
        Partition::new(day, Lane::Topic(topic_id.to_string()))
    }

    pub fn completed(day: Option<NaiveDate>) -> Self {
        Partition::new(day, Lane::Completed)
    }

    /// The partition a todo currently belongs to. Dangling topic
    /// references land in the Uncategorized lane.
    pub fn of(todo: &Todo, topics: &[Topic]) -> Self {
        let lane = if todo.completed {
            Lane::Completed
        } else {
            Lane::Topic(resolved_topic_of(todo, topics).to_string())
        };
        Partition::new(todo.day(), lane)
    }

    /// Whether a todo is a member of this partition
    pub fn contains(&self, todo: &Todo, topics: &[Topic]) -> bool {
        if todo.day() != self.day {
            return false;
        }
        match &self.lane {
            Lane::Completed => todo.completed,
            Lane::Topic(id) => !todo.completed && resolved_topic_of(todo, topics) == id.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topic::UNCATEGORIZED_ID;

    fn topics() -> Vec<Topic> {
        vec![
            Topic::uncategorized("#F3EFEE"),
            Topic::new("work".into(), "Work".into(), "#E6D9CB".into()),
            Topic::new("home".into(), "Home".into(), "#D9E6CB".into()),
        ]
    }

    fn todo(completed: bool, topic: Option<&str>) -> Todo {
        Todo {
            completed,
            topic_id: topic.map(str::to_string),
            ..Todo::new("1".into(), "A".into())
        }
    }

    #[test]
    fn partition_of_active_and_completed() {
        let topics = topics();
        assert_eq!(
            Partition::of(&todo(false, Some("work")), &topics),
            Partition::topic(None, "work")
        );
        assert_eq!(
            Partition::of(&todo(false, None), &topics),
            Partition::topic(None, UNCATEGORIZED_ID)
        );
        assert_eq!(
            Partition::of(&todo(false, Some("deleted")), &topics),
            Partition::topic(None, UNCATEGORIZED_ID)
        );
        assert_eq!(
            Partition::of(&todo(true, Some("work")), &topics),
            Partition::completed(None)
        );
    }

    #[test]
    fn contains_respects_lane_and_day() {
        let topics = topics();
        let day = NaiveDate::from_ymd_opt(2025, 5, 14);
        let active = todo(false, Some("work"));
        assert!(Partition::topic(None, "work").contains(&active, &topics));
        assert!(!Partition::topic(day, "work").contains(&active, &topics));
        assert!(!Partition::topic(None, "home").contains(&active, &topics));
        assert!(!Partition::completed(None).contains(&active, &topics));

        let done = todo(true, Some("work"));
        assert!(Partition::completed(None).contains(&done, &topics));
        assert!(!Partition::topic(None, "work").contains(&done, &topics));
    }

    #[test]
    fn untagged_and_explicit_uncategorized_share_a_lane() {
        let topics = topics();
        let lane = Partition::topic(None, UNCATEGORIZED_ID);
        assert!(lane.contains(&todo(false, None), &topics));
        assert!(lane.contains(&todo(false, Some(UNCATEGORIZED_ID)), &topics));
        assert!(lane.contains(&todo(false, Some("deleted")), &topics));
    }

    #[test]
    fn lane_parse() {
        assert_eq!(Lane::parse("completed"), Lane::Completed);
        assert_eq!(Lane::parse("work"), Lane::Topic("work".into()));
        assert_eq!(Lane::parse("done"), Lane::Topic("done".into()));
        assert_eq!(Lane::Completed.to_string(), "completed");
    }
}
