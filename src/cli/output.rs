use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::config::WeekStart;
use crate::model::todo::{Todo, order_of, resolved_topic_of};
use crate::model::topic::Topic;
use crate::ops::calendar::{DaySummary, Week};
use crate::ops::derive::DayView;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub order: i64,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct TopicJson {
    pub id: String,
    pub title: String,
    pub color: String,
    pub reserved: bool,
    pub todos: usize,
}

#[derive(Serialize)]
pub struct TopicGroupJson {
    pub id: String,
    pub title: String,
    pub color: String,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct DayViewJson {
    /// `None` for the unscheduled list
    pub day: Option<NaiveDate>,
    pub groups: Vec<TopicGroupJson>,
    pub completed: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct DaySummaryJson {
    pub day: NaiveDate,
    pub total: usize,
    pub overflow: usize,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct MonthJson {
    pub month: String,
    pub week_start: WeekStart,
    pub weeks: Vec<Vec<Option<DaySummaryJson>>>,
}

#[derive(Serialize)]
pub struct StripJson {
    pub days: Vec<DaySummaryJson>,
}

#[derive(Serialize)]
pub struct ChangeJson {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo, topics: &[Topic]) -> TodoJson {
    TodoJson {
        id: todo.id.clone(),
        text: todo.text.clone(),
        completed: todo.completed,
        order: order_of(todo),
        topic: resolved_topic_of(todo, topics).to_string(),
        date: todo.day(),
    }
}

pub fn topic_to_json(topic: &Topic, todos: &[Todo], topics: &[Topic]) -> TopicJson {
    TopicJson {
        id: topic.id.clone(),
        title: topic.title.clone(),
        color: topic.color.clone(),
        reserved: topic.is_reserved(),
        todos: todos
            .iter()
            .filter(|t| resolved_topic_of(t, topics) == topic.id)
            .count(),
    }
}

pub fn day_view_to_json(view: &DayView<'_>, topics: &[Topic]) -> DayViewJson {
    DayViewJson {
        day: view.day,
        groups: view
            .groups
            .iter()
            .map(|g| TopicGroupJson {
                id: g.topic.id.clone(),
                title: g.topic.title.clone(),
                color: g.topic.color.clone(),
                todos: g.todos.iter().map(|t| todo_to_json(t, topics)).collect(),
            })
            .collect(),
        completed: view
            .completed
            .iter()
            .map(|t| todo_to_json(t, topics))
            .collect(),
    }
}

pub fn summary_to_json(summary: &DaySummary<'_>, topics: &[Topic]) -> DaySummaryJson {
    DaySummaryJson {
        day: summary.day,
        total: summary.total,
        overflow: summary.overflow,
        todos: summary
            .shown
            .iter()
            .map(|t| todo_to_json(t, topics))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Width of one month-grid cell
const CELL_WIDTH: usize = 7;

/// Widest a todo's text may get inside a calendar line
const CHIP_WIDTH: usize = 24;

/// Pad `s` with spaces to `width` display columns.
pub fn pad_to(s: &str, width: usize) -> String {
    let mut out = s.to_string();
    let used = s.width();
    if used < width {
        out.push_str(&" ".repeat(width - used));
    }
    out
}

/// Cut `s` to at most `width` display columns, ending in `…` when cut.
pub fn truncate_to(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn checkbox(todo: &Todo) -> &'static str {
    if todo.completed { "[x]" } else { "[ ]" }
}

pub fn format_todo_line(todo: &Todo) -> String {
    format!("{} {}  {}", checkbox(todo), todo.id, todo.text)
}

fn day_heading(day: Option<NaiveDate>) -> String {
    match day {
        Some(day) => day.format("%a %Y-%m-%d").to_string(),
        None => "Unscheduled".to_string(),
    }
}

/// A day view: each non-empty topic lane, then the completed list.
pub fn format_day_view(view: &DayView<'_>) -> String {
    let mut out = day_heading(view.day);
    out.push('\n');
    if view.is_empty() {
        out.push_str("  (nothing planned)\n");
        return out;
    }
    for group in view.groups.iter().filter(|g| !g.todos.is_empty()) {
        out.push_str(&format!("  {}\n", group.topic.title));
        for todo in &group.todos {
            out.push_str(&format!("    {}\n", format_todo_line(todo)));
        }
    }
    if !view.completed.is_empty() {
        out.push_str("  Completed\n");
        for todo in &view.completed {
            out.push_str(&format!("    {}\n", format_todo_line(todo)));
        }
    }
    out
}

/// One line per topic: id, title, color, todo count.
pub fn format_topics(topics: &[TopicJson]) -> String {
    let id_width = topics.iter().map(|t| t.id.width()).max().unwrap_or(0);
    let title_width = topics.iter().map(|t| t.title.width()).max().unwrap_or(0);
    let mut out = String::new();
    for topic in topics {
        out.push_str(&format!(
            "{}  {}  {}  {}\n",
            pad_to(&topic.id, id_width),
            pad_to(&topic.title, title_width),
            topic.color,
            todo_count(topic.todos),
        ));
    }
    out
}

fn todo_count(n: usize) -> String {
    if n == 1 {
        "1 todo".to_string()
    } else {
        format!("{} todos", n)
    }
}

fn summary_chips(summary: &DaySummary<'_>) -> String {
    let mut chips: Vec<String> = summary
        .shown
        .iter()
        .map(|t| format!("{} {}", checkbox(t), truncate_to(&t.text, CHIP_WIDTH)))
        .collect();
    if summary.overflow > 0 {
        chips.push(format!("+{} more", summary.overflow));
    }
    chips.join("  ")
}

/// A month grid with todo counts, followed by the busy days.
pub fn format_month(
    first: NaiveDate,
    labels: &[&str; 7],
    weeks: &[Week],
    summaries: &[DaySummary<'_>],
) -> String {
    let count_on = |day: NaiveDate| {
        summaries
            .iter()
            .find(|s| s.day == day)
            .map_or(0, |s| s.total)
    };

    let title = first.format("%B %Y").to_string();
    let grid_width = CELL_WIDTH * 7;
    let indent = grid_width.saturating_sub(title.width()) / 2;
    let mut out = format!("{}{}\n", " ".repeat(indent), title);

    for label in labels {
        out.push_str(&pad_to(label, CELL_WIDTH));
    }
    out = out.trim_end().to_string();
    out.push('\n');

    for week in weeks {
        let mut row = String::new();
        for cell in week {
            let text = match cell {
                Some(day) => match count_on(*day) {
                    0 => format!("{:>2}", day.day()),
                    n => format!("{:>2}({})", day.day(), n),
                },
                None => String::new(),
            };
            row.push_str(&pad_to(&text, CELL_WIDTH));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }

    let busy: Vec<&DaySummary<'_>> = summaries.iter().filter(|s| s.total > 0).collect();
    if !busy.is_empty() {
        out.push('\n');
        for summary in busy {
            out.push_str(&format!(
                "{}  {}\n",
                summary.day.format("%a %d"),
                summary_chips(summary)
            ));
        }
    }
    out
}

/// Consecutive days, each with its first few todos.
pub fn format_strip(summaries: &[DaySummary<'_>]) -> String {
    let mut out = String::new();
    for summary in summaries {
        out.push_str(&format!(
            "{}  {}\n",
            summary.day.format("%a %Y-%m-%d"),
            todo_count(summary.total)
        ));
        for todo in &summary.shown {
            out.push_str(&format!(
                "    {} {}\n",
                checkbox(todo),
                truncate_to(&todo.text, CHIP_WIDTH * 2)
            ));
        }
        if summary.overflow > 0 {
            out.push_str(&format!("    +{} more\n", summary.overflow));
        }
    }
    out
}
