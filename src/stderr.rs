/// Lines kept before the rest is cut off.
pub const MAX_ERROR_LINES: usize = 20;

/// Appended to a report once [`MAX_ERROR_LINES`] is exceeded.
pub const TRUNCATION_MARKER: &str = "\n... Too many errors to display ...";

/// How a line of tool stderr is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrLine {
    /// Expected noise from a filesystem walk; never shown.
    ToolNoise,
    /// Worth showing to the user.
    Error,
}

/// Classify one stderr line against the deny-list.
pub fn classify(line: &str) -> StderrLine {
    let trimmed = line.trim_end();
    let noisy = trimmed.contains("ermission denied")
        || trimmed.contains("No such file or directory")
        || trimmed.starts_with("grep: ")
        || trimmed == "find:";
    if noisy {
        StderrLine::ToolNoise
    } else {
        StderrLine::Error
    }
}

/// What the caller should offer once a phase's stderr is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReportKind {
    /// "The search results may be invalid. There were errors while
    /// performing this search."
    Plain,
    /// Same, plus an offer to turn quick search off: a noisy `locate`
    /// more likely means a broken index than a permission problem.
    OfferDisableQuickSearch,
}

/// Batched stderr of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind:      ErrorReportKind,
    /// Retained lines, plus the truncation marker when `truncated`.
    pub details:   String,
    pub truncated: bool,
}

impl ErrorReport {
    pub fn headline(&self) -> &'static str {
        match self.kind {
            ErrorReportKind::Plain => {
                "The search results may be invalid.  There were errors while performing this search."
            }
            ErrorReportKind::OfferDisableQuickSearch => {
                "The search results may be invalid.  Do you want to disable the quick search feature?"
            }
        }
    }
}

/// Collects the interesting part of a command's stderr, capped in size.
#[derive(Debug, Default)]
pub struct ErrorStreamAggregator {
    lines:     Vec<String>,
    truncated: bool,
}

impl ErrorStreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one line; returns how it was classified.
    pub fn push(&mut self, line: &str) -> StderrLine {
        let class = classify(line);
        if class == StderrLine::Error && !self.truncated {
            if self.lines.len() < MAX_ERROR_LINES {
                self.lines.push(line.trim_end_matches('\n').to_string());
            } else {
                self.truncated = true;
            }
        }
        class
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Close the stream. `None` when nothing worth showing was seen.
    pub fn finish(self, quick_mode: bool) -> Option<ErrorReport> {
        if self.lines.is_empty() {
            return None;
        }
        let mut details = self.lines.join("\n");
        if self.truncated {
            details.push_str(TRUNCATION_MARKER);
        }
        Some(ErrorReport {
            kind: if quick_mode {
                ErrorReportKind::OfferDisableQuickSearch
            } else {
                ErrorReportKind::Plain
            },
            details,
            truncated: self.truncated,
        })
    }
}
