mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::cli::commands::*;
use crate::cli::dates::{self, parse_day, parse_month};
use crate::cli::output::*;
use crate::io::lock::FileLock;
use crate::io::project_io;
use crate::io::recovery;
use crate::io::storage::DirStore;
use crate::model::partition::{Lane, Partition};
use crate::model::todo::start_of_day;
use crate::ops::calendar::{
    DaySummary, date_strip, day_summary, month_days, month_grid, month_start, next_strip_anchor,
    shift_month, weekday_labels,
};
use crate::ops::derive;
use crate::store::Planner;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Directory commands run against: `-C <dir>` or the working directory.
pub fn resolve_start(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = resolve_start(cli.dir.as_deref())?;

    match cli.command {
        // Bare `dp` shows today
        None => cmd_list(ListArgs::default(), &start, json),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, &start),

            // Read commands
            Commands::List(args) => cmd_list(args, &start, json),
            Commands::Topics(args) => cmd_topics(args, &start, json),
            Commands::Cal(args) => cmd_cal(args, &start, json),
            Commands::Strip(args) => cmd_strip(args, &start, json),
            Commands::Recovery(args) => cmd_recovery(args, &start, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, &start, json),
            Commands::Toggle(args) => cmd_toggle(args, &start, json),
            Commands::Edit(args) => cmd_edit(args, &start, json),
            Commands::Rm(args) => cmd_rm(args, &start, json),
            Commands::Retopic(args) => cmd_retopic(args, &start, json),
            Commands::Reschedule(args) => cmd_reschedule(args, &start, json),
            Commands::Mv(args) => cmd_mv(args, &start, json),

            // Topic management
            Commands::Topic(args) => cmd_topic(args, &start, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Print the outcome of a write command.
fn report(changed: bool, id: &str, verb: &str, json: bool) -> CmdResult {
    if json {
        let out = ChangeJson {
            changed,
            id: Some(id.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if changed {
        println!("{} {}", verb, id);
    } else {
        println!("no change");
    }
    Ok(())
}

/// Print the outcome of a command that creates something.
fn report_created(id: Option<String>, json: bool) -> CmdResult {
    if json {
        let out = ChangeJson {
            changed: id.is_some(),
            id,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match id {
            Some(id) => println!("{}", id),
            None => println!("no change"),
        }
    }
    Ok(())
}

/// Shutdown flush for write commands.
fn finish(mut planner: Planner<DirStore>) {
    planner.flush();
}

fn optional_day(arg: Option<&str>) -> Result<Option<NaiveDate>, dates::DateError> {
    arg.map(|s| parse_day(s, dates::today())).transpose()
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let planner = workspace.planner();
    let todos = planner.todos();
    let topics = planner.topics();

    let days: Vec<Option<NaiveDate>> = if args.all {
        let mut days: Vec<NaiveDate> = todos.iter().filter_map(|t| t.day()).collect();
        days.sort();
        days.dedup();
        let unscheduled = todos.iter().any(|t| t.date.is_none());
        unscheduled
            .then_some(None)
            .into_iter()
            .chain(days.into_iter().map(Some))
            .collect()
    } else if args.unscheduled {
        vec![None]
    } else {
        vec![Some(optional_day(args.date.as_deref())?.unwrap_or_else(dates::today))]
    };

    let views: Vec<derive::DayView<'_>> = days.iter().map(|&d| planner.day_view(d)).collect();

    if json {
        let out: Vec<DayViewJson> = views.iter().map(|v| day_view_to_json(v, topics)).collect();
        if args.all {
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else if let Some(view) = out.first() {
            println!("{}", serde_json::to_string_pretty(view)?);
        }
        return Ok(());
    }

    if views.is_empty() {
        println!("no todos");
        return Ok(());
    }
    let text: Vec<String> = views.iter().map(format_day_view).collect();
    print!("{}", text.join("\n"));
    Ok(())
}

fn cmd_topics(args: TopicsArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let planner = workspace.planner();
    let todos = planner.todos();
    let topics = planner.topics();

    let shown: Vec<TopicJson> = if args.all {
        topics.iter().map(|t| topic_to_json(t, todos, topics)).collect()
    } else {
        planner
            .active_topics()
            .into_iter()
            .map(|t| topic_to_json(t, todos, topics))
            .collect()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        print!("{}", format_topics(&shown));
    }
    Ok(())
}

fn cmd_cal(args: CalArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let planner = workspace.planner();
    let calendar = &workspace.config.calendar;

    let base = match args.month.as_deref() {
        Some(s) => {
            let (year, month) = parse_month(s)?;
            NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| format!("invalid month {:04}-{:02}", year, month))?
        }
        None => month_start(dates::today()),
    };
    let first = shift_month(base, args.shift);
    let (year, month) = (first.year(), first.month());
    let week_start = calendar.week_start.weekday();
    let weeks = month_grid(year, month, week_start);
    let summaries: Vec<DaySummary<'_>> = month_days(year, month)
        .into_iter()
        .map(|d| day_summary(planner.todos(), d, calendar.visible_per_day))
        .collect();

    if json {
        let summary_on = |day: NaiveDate| {
            summaries
                .iter()
                .find(|s| s.day == day)
                .map(|s| summary_to_json(s, planner.topics()))
        };
        let out = MonthJson {
            month: format!("{:04}-{:02}", year, month),
            week_start: calendar.week_start,
            weeks: weeks
                .iter()
                .map(|week| week.iter().map(|cell| cell.and_then(&summary_on)).collect())
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!(
        "{}",
        format_month(first, &weekday_labels(week_start), &weeks, &summaries)
    );
    Ok(())
}

fn cmd_strip(args: StripArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let planner = workspace.planner();
    let calendar = &workspace.config.calendar;

    let mut anchor = optional_day(args.from.as_deref())?.unwrap_or_else(dates::today);
    for _ in 0..args.next {
        anchor = next_strip_anchor(anchor, calendar.strip_days);
    }
    let summaries: Vec<DaySummary<'_>> = date_strip(anchor, calendar.strip_days)
        .into_iter()
        .map(|d| day_summary(planner.todos(), d, calendar.visible_per_day))
        .collect();

    if json {
        let out = StripJson {
            days: summaries
                .iter()
                .map(|s| summary_to_json(s, planner.topics()))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", format_strip(&summaries));
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryCmd, start: &Path, json: bool) -> CmdResult {
    let data_dir = project_io::discover_data_dir(start)?;

    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&data_dir).display());
        }
        Some(RecoveryAction::Prune(prune)) => {
            let removed = recovery::prune_recovery(&data_dir, prune.all)?;
            println!("pruned {} entries", removed);
        }
        None => {
            let entries = recovery::read_recovery_entries(&data_dir, Some(args.limit.unwrap_or(10)));
            if json {
                let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if entries.is_empty() {
                println!("no recovery entries");
            } else {
                for entry in &entries {
                    print!("{}", entry.to_display_markdown());
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let date = optional_day(args.date.as_deref())?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let id = planner.add_todo(&args.text, date.map(start_of_day), args.topic.as_deref());
    finish(planner);
    report_created(id, json)
}

fn cmd_toggle(args: IdArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let changed = planner.toggle_todo(&args.id);
    let verb = match planner.todo(&args.id) {
        Some(todo) if todo.completed => "completed",
        _ => "reopened",
    };
    finish(planner);
    report(changed, &args.id, verb, json)
}

fn cmd_edit(args: EditArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let changed = planner.edit_todo(&args.id, &args.text);
    finish(planner);
    report(changed, &args.id, "edited", json)
}

fn cmd_rm(args: IdArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let changed = planner.delete_todo(&args.id);
    finish(planner);
    report(changed, &args.id, "deleted", json)
}

fn cmd_retopic(args: RetopicArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let changed = planner.retopic_todo(&args.id, &args.topic);
    finish(planner);
    report(changed, &args.id, "retopiced", json)
}

fn cmd_reschedule(args: RescheduleArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let day = if args.clear {
        None
    } else {
        optional_day(args.date.as_deref())?
    };
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let changed = planner.reschedule_todo(&args.id, day.map(start_of_day));
    finish(planner);
    report(changed, &args.id, "rescheduled", json)
}

fn cmd_mv(args: MvArgs, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let day_arg = optional_day(args.day.as_deref())?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let Some(from) = planner.partition_of(&args.id) else {
        return report(false, &args.id, "moved", json);
    };
    let day = if args.unscheduled {
        None
    } else {
        day_arg.or(from.day)
    };
    let to = Partition::new(day, Lane::parse(&args.to));
    let index = args.index.unwrap_or(usize::MAX);

    let changed = planner.reorder_todo(&args.id, &from, &to, index);
    finish(planner);
    report(changed, &args.id, "moved", json)
}

// ---------------------------------------------------------------------------
// Topic management
// ---------------------------------------------------------------------------

fn cmd_topic(args: TopicCmd, start: &Path, json: bool) -> CmdResult {
    let workspace = project_io::open_workspace(start)?;
    let _lock = FileLock::acquire_default(&workspace.data_dir)?;
    let mut planner = workspace.planner();

    let result = match args.action {
        TopicAction::Add(add) => {
            let color = add
                .color
                .unwrap_or_else(|| planner.default_color().to_string());
            let id = planner.add_topic(&add.title, &color);
            report_created(id, json)
        }
        TopicAction::Edit(edit) => {
            let color = edit
                .color
                .or_else(|| planner.topic(&edit.id).map(|t| t.color.clone()));
            let changed = match color {
                Some(color) => planner.edit_topic(&edit.id, &edit.title, &color),
                None => false,
            };
            report(changed, &edit.id, "edited", json)
        }
        TopicAction::Rm(rm) => {
            let changed = planner.delete_topic(&rm.id);
            report(changed, &rm.id, "deleted", json)
        }
    };
    finish(planner);
    result
}
