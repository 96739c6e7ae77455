use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::Serialize;

use crate::model::todo::Todo;
use crate::model::topic::Topic;
use crate::ops::derive::{filter_by_date, sort_by_order};

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Every day of the given month, or empty for an invalid month.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// The first day of the month `delta` months away from `day`'s month.
pub fn shift_month(day: NaiveDate, delta: i32) -> NaiveDate {
    let start = month_start(day);
    let months = Months::new(delta.unsigned_abs());
    let shifted = if delta >= 0 {
        start.checked_add_months(months)
    } else {
        start.checked_sub_months(months)
    };
    shifted.unwrap_or(start)
}

/// One row of the month grid; `None` cells fall outside the month
pub type Week = [Option<NaiveDate>; 7];

/// Lay the month out in weeks starting on `week_start`.
pub fn month_grid(year: i32, month: u32, week_start: Weekday) -> Vec<Week> {
    let mut weeks: Vec<Week> = Vec::new();
    let mut week: Week = [None; 7];

    for day in month_days(year, month) {
        let col = column_of(day.weekday(), week_start);
        if col == 0 && week.iter().any(Option::is_some) {
            weeks.push(week);
            week = [None; 7];
        }
        week[col] = Some(day);
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

fn column_of(day: Weekday, week_start: Weekday) -> usize {
    ((day.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7) as usize
}

/// Column headers for a grid starting on `week_start`.
pub fn weekday_labels(week_start: Weekday) -> [&'static str; 7] {
    let mut labels = [""; 7];
    let mut day = week_start;
    for label in &mut labels {
        *label = match day {
            Weekday::Sun => "Sun",
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
        };
        day = day.succ();
    }
    labels
}

/// `len` consecutive days starting at `anchor`.
pub fn date_strip(anchor: NaiveDate, len: usize) -> Vec<NaiveDate> {
    anchor.iter_days().take(len).collect()
}

/// The day after `len` days of the strip, for paging forward.
pub fn next_strip_anchor(anchor: NaiveDate, len: usize) -> NaiveDate {
    anchor
        .checked_add_days(Days::new(len as u64))
        .unwrap_or(anchor)
}

/// Todos on `day` in display order.
pub fn todos_for_day(todos: &[Todo], day: NaiveDate) -> Vec<&Todo> {
    let mut on_day = filter_by_date(todos, day);
    sort_by_order(&mut on_day);
    on_day
}

/// What a calendar cell shows
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary<'a> {
    pub day: NaiveDate,
    /// The first `visible` todos
    pub shown: Vec<&'a Todo>,
    /// How many more there are ("+N more")
    pub overflow: usize,
    pub total: usize,
}

pub fn day_summary(todos: &[Todo], day: NaiveDate, visible: usize) -> DaySummary<'_> {
    let mut shown = todos_for_day(todos, day);
    let total = shown.len();
    shown.truncate(visible);
    DaySummary {
        day,
        overflow: total - shown.len(),
        shown,
        total,
    }
}

/// Color for a todo's chip; absent or unknown topics get `default`.
pub fn topic_color<'a>(topics: &'a [Topic], topic_id: Option<&str>, default: &'a str) -> &'a str {
    topic_id
        .and_then(|id| topics.iter().find(|t| t.id == id))
        .map_or(default, |t| t.color.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::start_of_day;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dated(id: &str, order: i64, on: NaiveDate) -> Todo {
        Todo {
            order: Some(order),
            date: Some(start_of_day(on)),
            ..Todo::new(id.into(), id.into())
        }
    }

    #[test]
    fn month_days_lengths() {
        assert_eq!(month_days(2025, 2).len(), 28);
        assert_eq!(month_days(2024, 2).len(), 29);
        assert_eq!(month_days(2025, 5).len(), 31);
        assert_eq!(month_days(2025, 5)[0], d(2025, 5, 1));
        assert!(month_days(2025, 13).is_empty());
    }

    #[test]
    fn shift_month_wraps_years() {
        assert_eq!(shift_month(d(2025, 12, 31), 1), d(2026, 1, 1));
        assert_eq!(shift_month(d(2025, 1, 15), -1), d(2024, 12, 1));
        assert_eq!(shift_month(d(2025, 5, 20), 0), d(2025, 5, 1));
    }

    #[test]
    fn month_grid_sunday_start() {
        // May 2025 starts on a Thursday
        let grid = month_grid(2025, 5, Weekday::Sun);
        assert_eq!(grid.len(), 5);
        assert!(grid[0][..4].iter().all(Option::is_none));
        assert_eq!(grid[0][4], Some(d(2025, 5, 1)));
        assert_eq!(grid[4][6], Some(d(2025, 5, 31)));
    }

    #[test]
    fn month_grid_monday_start() {
        let grid = month_grid(2025, 5, Weekday::Mon);
        assert_eq!(grid[0][3], Some(d(2025, 5, 1)));
        assert_eq!(grid[0][6], Some(d(2025, 5, 4)));
        assert_eq!(grid[1][0], Some(d(2025, 5, 5)));
        let cells: usize = grid.iter().map(|w| w.iter().flatten().count()).sum();
        assert_eq!(cells, 31);
    }

    #[test]
    fn weekday_labels_rotate() {
        assert_eq!(weekday_labels(Weekday::Sun)[0], "Sun");
        assert_eq!(weekday_labels(Weekday::Mon)[6], "Sun");
    }

    #[test]
    fn date_strip_is_consecutive() {
        let strip = date_strip(d(2025, 5, 30), 6);
        assert_eq!(strip.len(), 6);
        assert_eq!(strip[0], d(2025, 5, 30));
        assert_eq!(strip[5], d(2025, 6, 4));
        assert_eq!(next_strip_anchor(d(2025, 5, 30), 6), d(2025, 6, 5));
    }

    #[test]
    fn day_summary_overflow() {
        let day = d(2025, 5, 14);
        let todos: Vec<Todo> = (0..6)
            .rev()
            .map(|i| dated(&format!("t{}", i), i, day))
            .chain(std::iter::once(dated("other", 0, d(2025, 5, 15))))
            .collect();
        let summary = day_summary(&todos, day, 4);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.overflow, 2);
        let shown: Vec<&str> = summary.shown.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(shown, vec!["t0", "t1", "t2", "t3"]);

        let roomy = day_summary(&todos, day, 10);
        assert_eq!(roomy.overflow, 0);
    }

    #[test]
    fn topic_color_falls_back() {
        let topics = vec![Topic::new("work".into(), "Work".into(), "#E6D9CB".into())];
        assert_eq!(topic_color(&topics, Some("work"), "#F3EFEE"), "#E6D9CB");
        assert_eq!(topic_color(&topics, Some("gone"), "#F3EFEE"), "#F3EFEE");
        assert_eq!(topic_color(&topics, None, "#F3EFEE"), "#F3EFEE");
    }
}
