use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dp", about = concat!("dayplan v", env!("CARGO_PKG_VERSION"), " - todos by day and topic"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .dayplan/ directory here
    Init(InitArgs),
    /// Show a day: topic lanes, then completed todos
    List(ListArgs),
    /// Add a todo
    Add(AddArgs),
    /// Flip a todo between active and completed
    Toggle(IdArgs),
    /// Change a todo's text
    Edit(EditArgs),
    /// Delete a todo
    Rm(IdArgs),
    /// Move a todo to another topic
    Retopic(RetopicArgs),
    /// Set or clear a todo's date
    Reschedule(RescheduleArgs),
    /// Move a todo within or across lanes and days
    Mv(MvArgs),
    /// Topic management
    Topic(TopicCmd),
    /// List topics
    Topics(TopicsArgs),
    /// Month calendar with todos per day
    Cal(CalArgs),
    /// Consecutive days with their todos
    Strip(StripArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Rewrite config.toml even if .dayplan/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct ListArgs {
    /// Day to show: YYYY-MM-DD, today, tomorrow or yesterday (default: today)
    #[arg(long, conflicts_with_all = ["unscheduled", "all"])]
    pub date: Option<String>,
    /// Show todos without a date
    #[arg(long, conflicts_with = "all")]
    pub unscheduled: bool,
    /// Show every day that has todos
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct TopicsArgs {
    /// Include topics with no todos
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CalArgs {
    /// Month to show as YYYY-MM (default: this month)
    #[arg(long)]
    pub month: Option<String>,
    /// Page by whole months from that month (negative goes back)
    #[arg(long, allow_negative_numbers = true, default_value_t = 0)]
    pub shift: i32,
}

#[derive(Args)]
pub struct StripArgs {
    /// First day of the strip (default: today)
    #[arg(long)]
    pub from: Option<String>,
    /// Page forward by this many strips
    #[arg(long, default_value_t = 0)]
    pub next: usize,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Todo text
    pub text: String,
    /// Day to schedule it on
    #[arg(long)]
    pub date: Option<String>,
    /// Topic id (default: Uncategorized)
    #[arg(long)]
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Todo id
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Todo id
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct RetopicArgs {
    /// Todo id
    pub id: String,
    /// Topic id
    pub topic: String,
}

#[derive(Args)]
pub struct RescheduleArgs {
    /// Todo id
    pub id: String,
    /// New day
    #[arg(required_unless_present = "clear")]
    pub date: Option<String>,
    /// Remove the date
    #[arg(long, conflicts_with = "date")]
    pub clear: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Todo id
    pub id: String,
    /// Destination lane: a topic id, or "completed"
    #[arg(long)]
    pub to: String,
    /// Destination day (default: the todo's current day)
    #[arg(long, conflicts_with = "unscheduled")]
    pub day: Option<String>,
    /// Move to the unscheduled list
    #[arg(long)]
    pub unscheduled: bool,
    /// Position in the destination lane (default: last)
    #[arg(long)]
    pub index: Option<usize>,
}

// ---------------------------------------------------------------------------
// Topic management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TopicCmd {
    #[command(subcommand)]
    pub action: TopicAction,
}

#[derive(Subcommand)]
pub enum TopicAction {
    /// Create a topic
    Add(TopicAddArgs),
    /// Rename or recolor a topic
    Edit(TopicEditArgs),
    /// Delete a topic (its todos move to Uncategorized)
    Rm(TopicRmArgs),
}

#[derive(Args)]
pub struct TopicAddArgs {
    /// Topic title
    pub title: String,
    /// Chip color (default: from config)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct TopicEditArgs {
    /// Topic id
    pub id: String,
    /// New title
    pub title: String,
    /// New color (default: keep the current one)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct TopicRmArgs {
    /// Topic id
    pub id: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
