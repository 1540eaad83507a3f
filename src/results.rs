use std::cmp::Ordering;
use std::time::Duration;

use tracing::warn;

use crate::entry::Hit;
use crate::state::Status;
use crate::stderr::ErrorReport;

/// The output of a finished logical search.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// `Completed` or `Aborted`.
    pub status: Status,

    /// Results reported to the sink, across both phases.
    pub matches: usize,

    /// Commands run: 1, or 2 when a quick pass was followed by `find`.
    pub phases: usize,

    /// The first pass used `locate`.
    pub quick_mode: bool,

    /// Scan performance statistics.
    pub stats: ScanStats,

    /// One report per phase whose stderr had something worth showing.
    pub errors: Vec<ErrorReport>,
}

impl SearchResults {
    /// "3 files found", "No files found", with " (stopped)" after a stop.
    pub fn message(&self) -> String {
        let mut message = match self.matches {
            0 => "No files found".to_string(),
            1 => "1 file found".to_string(),
            n => format!("{n} files found"),
        };
        if self.status == Status::Aborted {
            message.push_str(" (stopped)");
        }
        message
    }
}

/// Performance statistics for a finished search.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Lines read from stdout, over all phases.
    pub lines: usize,

    /// Lines dropped because the path was already reported.
    pub duplicates: usize,

    /// Lines that were not valid UTF-8.
    pub undecodable: usize,

    /// Wall-clock time from search start to completion.
    pub duration: Duration,

    /// Lines per second. Equals `lines / duration.as_secs_f64()`, clamped to
    /// 0 on zero-duration runs.
    pub lines_per_sec: usize,
}

impl ScanStats {
    /// Fill in `duration` and `lines_per_sec`.
    pub(crate) fn finish(&mut self, duration: Duration) {
        self.duration = duration;
        self.lines_per_sec = if duration.as_secs_f64() > 0.0 {
            (self.lines as f64 / duration.as_secs_f64()) as usize
        } else {
            0
        };
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Column a result list is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Folder,
    Size,
    Type,
    Date,
}

impl SortKey {
    /// Parse a `--sortby` value. Unknown values fall back to `Name`.
    pub fn parse(s: &str) -> SortKey {
        match s {
            "name"   => SortKey::Name,
            "folder" => SortKey::Folder,
            "size"   => SortKey::Size,
            "type"   => SortKey::Type,
            "date"   => SortKey::Date,
            other => {
                warn!(value = other, "invalid option passed to sortby, sorting by name");
                SortKey::Name
            }
        }
    }
}

/// Sort hits by `key`. Size and date use the negated keys, so ascending
/// order lists big and recent files first.
pub fn sort_hits(hits: &mut [Hit], key: SortKey, descending: bool) {
    hits.sort_by(|a, b| {
        let ord = compare(a, b, key);
        if descending { ord.reverse() } else { ord }
    });
}

fn compare(a: &Hit, b: &Hit, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Name   => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Folder => a.folder.cmp(&b.folder),
        SortKey::Size   => a.size_key().cmp(&b.size_key()),
        SortKey::Type   => a.description.cmp(&b.description),
        SortKey::Date   => a.date_key().cmp(&b.date_key()),
    };
    primary.then_with(|| a.path.cmp(&b.path))
}
