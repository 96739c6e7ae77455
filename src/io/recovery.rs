use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tempfile::NamedTempFile;

/// Size past which the log drops entries older than [`PRUNE_AGE_DAYS`] on append (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Written at the top of a fresh log.
const FILE_HEADER: &str = "\
<!-- dayplan recovery log: append-only storage diagnostics
     Data that dayplan could not read or save ends up here.
     View with: dp recovery
     Prune old entries: dp recovery prune
     Safe to delete. -->

---
";

/// Separator between the timestamp and the category in an entry header.
const HEADER_SEP: &str = " | ";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// What went wrong at the storage boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Stored data could not be read from the medium
    Read,
    /// Stored data was read but did not parse
    Parser,
    /// A collection could not be written
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Read => write!(f, "read"),
            RecoveryCategory::Parser => write!(f, "parser"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "read" => Some(RecoveryCategory::Read),
            "parser" => Some(RecoveryCategory::Parser),
            "write" => Some(RecoveryCategory::Write),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    /// Entry stamped with the current time
    pub fn now(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Markdown block as appended to the log.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {}{}{}: {}\n\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            HEADER_SEP,
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            let fence = body_fence(&self.body);
            out.push_str(&format!("\n{}text\n", fence));
            out.push_str(&self.body);
            out.push_str(&format!("\n{}\n", fence));
        }
        out.push_str("\n---\n");
        out
    }

    /// Same failure as `other`, ignoring when it happened.
    fn repeats(&self, other: &RecoveryEntry) -> bool {
        self.category == other.category
            && self.description == other.description
            && self.fields == other.fields
            && self.body == other.body
    }

    /// JSON value for `dp recovery --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    /// Human-readable form for `dp recovery`.
    pub fn to_display_markdown(&self) -> String {
        self.to_markdown()
    }
}

/// A backtick fence longer than any backtick run inside `body`.
fn body_fence(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// The backtick run opening a fenced body, if `line` opens one.
fn opening_fence(line: &str) -> Option<&str> {
    let run = line.len() - line.trim_start_matches('`').len();
    (run >= 3).then(|| &line[..run])
}

/// Path to the recovery log inside a data directory.
pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Record a storage problem. With no data directory (in-memory stores) the
/// entry goes to stderr. An entry that repeats the newest one in the log is
/// not appended again. Failures to log are reported on stderr and
/// otherwise ignored.
pub fn log_recovery(data_dir: Option<&Path>, entry: RecoveryEntry) {
    let Some(dir) = data_dir else {
        eprintln!(
            "warning: {}: {}",
            entry.category, entry.description
        );
        return;
    };
    if let Err(e) = append_entry(dir, &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
        eprintln!("warning: {}: {}", entry.category, entry.description);
    }
}

fn append_entry(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    if let Ok(content) = std::fs::read_to_string(&path)
        && parse_entries(&content)
            .last()
            .is_some_and(|newest| newest.repeats(entry))
    {
        return Ok(());
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Drop stale entries from an oversized log, skipping the trim if another
/// process holds the lock.
fn try_inline_trim(path: &Path) {
    let Ok(file) = OpenOptions::new().read(true).write(true).open(path) else {
        return;
    };
    if !try_flock(&file) {
        return;
    }

    let mut content = String::new();
    if io::BufReader::new(&file).read_to_string(&mut content).is_err() {
        return;
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);
    if trimmed.len() < content.len()
        && let Ok(mut f) = File::create(path)
    {
        let _ = f.write_all(trimmed.as_bytes());
    }
}

#[cfg(unix)]
fn try_flock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read entries, most recent first, optionally keeping only the newest `limit`.
pub fn read_recovery_entries(data_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(data_dir)) else {
        return Vec::new();
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

/// Parse all entries (oldest first) from the raw log.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.split('\n');

    while let Some(line) = lines.next() {
        let Some((timestamp, category, description)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body: Vec<&str> = Vec::new();
        let mut fence: Option<&str> = None;

        for line in lines.by_ref() {
            if let Some(open) = fence {
                if line == open {
                    fence = None;
                } else {
                    body.push(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if let Some(open) = opening_fence(line) {
                fence = Some(open);
                continue;
            }
            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body: body.join("\n"),
        });
    }

    entries
}

/// Parse `<timestamp> | <category>: <description>`.
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    let (category, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category)?;
    Some((timestamp, category, description.to_string()))
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Remove entries older than `PRUNE_AGE_DAYS` (or every entry with `all`).
/// Returns the number of entries removed.
pub fn prune_recovery(data_dir: &Path, all: bool) -> io::Result<usize> {
    let path = recovery_log_path(data_dir);
    if !path.exists() {
        return Ok(0);
    }

    let file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mut locked = false;
    for _ in 0..10 {
        if try_flock(&file) {
            locked = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if !locked {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "recovery log is in use, try again later",
        ));
    }

    let content = std::fs::read_to_string(&path)?;
    let before = parse_entries(&content).len();

    if all {
        std::fs::write(&path, FILE_HEADER)?;
        return Ok(before);
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);
    let after = parse_entries(&trimmed).len();
    std::fs::write(&path, &trimmed)?;
    Ok(before - after)
}

/// Keep the file header and every entry stamped at or after `cutoff`.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let mut result = String::new();
    let mut current = String::new();
    let mut keep_current = false;
    let mut in_header = true;
    let mut fence: Option<&str> = None;

    for raw in content.split_inclusive('\n') {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        if in_header {
            result.push_str(raw);
            in_header = line != "---";
            continue;
        }

        if let Some(open) = fence {
            if line == open {
                fence = None;
            }
        } else if let Some(open) = opening_fence(line) {
            fence = Some(open);
        } else if let Some(header) = line.strip_prefix("## ") {
            if keep_current {
                result.push_str(&current);
            }
            current.clear();
            keep_current = parse_entry_header(header).is_some_and(|(ts, _, _)| ts >= *cutoff);
        }
        current.push_str(raw);
    }
    if keep_current {
        result.push_str(&current);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse_failure(desc: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry::now(RecoveryCategory::Parser, desc)
            .field("Key", "todos-v1")
            .field("Error", "expected value at line 1 column 1")
            .body(body)
    }

    #[test]
    fn entry_markdown_layout() {
        let md = parse_failure("could not parse todos", "not json").to_markdown();
        assert!(md.starts_with("## "));
        assert!(md.contains(" | parser: could not parse todos"));
        assert!(md.contains("Key: todos-v1"));
        assert!(md.contains("```text\nnot json\n```"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn log_then_read_most_recent_first() {
        let tmp = TempDir::new().unwrap();
        log_recovery(Some(tmp.path()), parse_failure("first", "a"));
        log_recovery(
            Some(tmp.path()),
            RecoveryEntry::now(RecoveryCategory::Write, "second").body("[]"),
        );

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "second");
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(entries[1].description, "first");
        assert_eq!(entries[1].body, "a");
        assert_eq!(
            entries[1].fields[0],
            ("Key".to_string(), "todos-v1".to_string())
        );
    }

    #[test]
    fn read_with_limit_keeps_newest() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_recovery(Some(tmp.path()), parse_failure(&format!("e{}", i), ""));
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "e4");
        assert_eq!(entries[1].description, "e3");
    }

    #[test]
    fn header_written_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(Some(tmp.path()), parse_failure("one", ""));
        log_recovery(Some(tmp.path()), parse_failure("two", ""));
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- dayplan recovery log"));
        assert_eq!(content.matches("<!-- dayplan").count(), 1);
    }

    #[test]
    fn missing_log_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
        assert_eq!(prune_recovery(tmp.path(), false).unwrap(), 0);
    }

    #[test]
    fn prune_all_clears_entries() {
        let tmp = TempDir::new().unwrap();
        log_recovery(Some(tmp.path()), parse_failure("one", "x"));
        log_recovery(Some(tmp.path()), parse_failure("two", "y"));
        assert_eq!(prune_recovery(tmp.path(), true).unwrap(), 2);
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn prune_drops_only_old_entries() {
        let tmp = TempDir::new().unwrap();
        let mut old = parse_failure("old", "stale");
        old.timestamp = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS + 5);
        log_recovery(Some(tmp.path()), old);
        log_recovery(Some(tmp.path()), parse_failure("fresh", "kept"));

        assert_eq!(prune_recovery(tmp.path(), false).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "fresh");
    }

    #[test]
    fn body_with_fences_reads_back_unchanged() {
        let tmp = TempDir::new().unwrap();
        let body = "[\n```\nKey: not a field\n---\n## 2025-05-14T10:00:00Z | read: x\n]";
        log_recovery(Some(tmp.path()), parse_failure("fenced", body));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, body);
        assert_eq!(entries[0].fields.len(), 2);
    }

    #[test]
    fn body_trailing_newline_is_kept() {
        let tmp = TempDir::new().unwrap();
        log_recovery(Some(tmp.path()), parse_failure("newline", "[1,\n2]\n"));
        log_recovery(Some(tmp.path()), parse_failure("blank", "\n"));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[1].body, "[1,\n2]\n");
        assert_eq!(entries[0].body, "\n");
    }

    #[test]
    fn fence_outgrows_backtick_runs() {
        assert_eq!(body_fence("plain"), "```");
        assert_eq!(body_fence("a ``` b"), "````");
        assert_eq!(body_fence("`````"), "``````");
        assert_eq!(opening_fence("````text"), Some("````"));
        assert_eq!(opening_fence("``x"), None);
    }

    #[test]
    fn repeated_failure_is_logged_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(Some(tmp.path()), parse_failure("could not parse todos", "{"));
        log_recovery(Some(tmp.path()), parse_failure("could not parse todos", "{"));
        assert_eq!(read_recovery_entries(tmp.path(), None).len(), 1);

        log_recovery(Some(tmp.path()), parse_failure("could not parse todos", "{x"));
        log_recovery(Some(tmp.path()), parse_failure("could not parse todos", "{"));
        assert_eq!(read_recovery_entries(tmp.path(), None).len(), 3);
    }

    #[test]
    fn prune_keeps_fenced_bodies_intact() {
        let tmp = TempDir::new().unwrap();
        let mut old = parse_failure("old", "stale");
        old.timestamp = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS + 5);
        log_recovery(Some(tmp.path()), old);
        let body = "## 2000-01-01T00:00:00Z | read: inside body\n```";
        log_recovery(Some(tmp.path()), parse_failure("fresh", body));

        assert_eq!(prune_recovery(tmp.path(), false).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, body);
    }

    #[test]
    fn header_parse_rejects_garbage() {
        assert!(parse_entry_header("not a header").is_none());
        assert!(parse_entry_header("2025-05-14T10:00:00Z | bogus: x").is_none());
        let (_, category, desc) =
            parse_entry_header("2025-05-14T10:00:00Z | write: save failed").unwrap();
        assert_eq!(category, RecoveryCategory::Write);
        assert_eq!(desc, "save failed");
    }

    #[test]
    fn entry_json_shape() {
        let json = parse_failure("could not parse todos", "x").to_json();
        assert_eq!(json["category"], "parser");
        assert_eq!(json["fields"]["Key"], "todos-v1");
        assert_eq!(json["body"], "x");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("todos-v1.json");
        atomic_write(&path, b"[1]").unwrap();
        atomic_write(&path, b"[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
