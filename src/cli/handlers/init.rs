use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::persist::Persistence;
use crate::io::project_io::{self, CONFIG_FILE, DATA_DIR_NAME};
use crate::io::storage::DirStore;
use crate::model::config::{Config, WeekStart};
use crate::store::Planner;

const CONFIG_TEMPLATE: &str = r##"# dayplan configuration. Every setting is optional.

[storage]
# Names of the two collection files (without .json)
todos_key = "{todos_key}"
topics_key = "{topics_key}"

[topics]
# Color for topics created without --color
default_color = "{default_color}"

[calendar]
# Days shown by `dp strip`
strip_days = {strip_days}
# Todos listed per day in `dp cal` before "+N more"
visible_per_day = {visible_per_day}
# "sunday" or "monday"
week_start = "{week_start}"
"##;

/// Render config.toml with the default settings filled in.
fn render_config(config: &Config) -> String {
    let week_start = match config.calendar.week_start {
        WeekStart::Sunday => "sunday",
        WeekStart::Monday => "monday",
    };
    CONFIG_TEMPLATE
        .replace("{todos_key}", &config.storage.todos_key)
        .replace("{topics_key}", &config.storage.topics_key)
        .replace("{default_color}", &config.topics.default_color)
        .replace("{strip_days}", &config.calendar.strip_days.to_string())
        .replace("{visible_per_day}", &config.calendar.visible_per_day.to_string())
        .replace("{week_start}", week_start)
}

pub fn cmd_init(args: InitArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = start.join(DATA_DIR_NAME);

    if data_dir.is_dir() && !args.force {
        return Err(format!(
            "{} already exists (use --force to rewrite config.toml)",
            data_dir.display()
        )
        .into());
    }

    // Nested data dirs shadow the parent's for everything below them
    if let Some(parent) = start.parent()
        && let Ok(outer) = project_io::discover_data_dir(parent)
    {
        eprintln!("Note: an enclosing data directory exists at {}", outer.display());
        eprintln!("Creating a new one in ./{}/", DATA_DIR_NAME);
    }

    fs::create_dir_all(&data_dir)?;
    let config = Config::default();
    fs::write(data_dir.join(CONFIG_FILE), render_config(&config))?;

    // Materialize both collections so the directory is complete on disk
    let persistence = Persistence::new(
        DirStore::new(&data_dir),
        &config.storage,
        &config.topics.default_color,
    );
    let mut planner = Planner::open(persistence);
    planner.flush();

    println!("Initialized {}", data_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_config_parses_back_to_defaults() {
        let text = render_config(&Config::default());
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn rendered_config_is_commented() {
        let text = render_config(&Config::default());
        assert!(text.contains("todos_key = \"todos-v1\""));
        assert!(text.contains("week_start = \"sunday\""));
        assert!(text.contains("# Days shown by `dp strip`"));
    }

    #[test]
    fn init_creates_directory_and_collections() {
        let tmp = tempfile::TempDir::new().unwrap();
        cmd_init(InitArgs { force: false }, tmp.path()).unwrap();

        let data_dir = tmp.path().join(DATA_DIR_NAME);
        assert!(data_dir.join(CONFIG_FILE).is_file());
        assert_eq!(
            fs::read_to_string(data_dir.join("todos-v1.json")).unwrap(),
            "[]"
        );
        assert!(
            fs::read_to_string(data_dir.join("topics-v1.json"))
                .unwrap()
                .contains("\"uncategorized\"")
        );
    }

    #[test]
    fn init_twice_needs_force() {
        let tmp = tempfile::TempDir::new().unwrap();
        cmd_init(InitArgs { force: false }, tmp.path()).unwrap();
        assert!(cmd_init(InitArgs { force: false }, tmp.path()).is_err());
        assert!(cmd_init(InitArgs { force: true }, tmp.path()).is_ok());
    }
}
