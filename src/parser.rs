use glob::{MatchOptions, Pattern};
use regex::Regex;
use tracing::debug;

use crate::command::CommandFacts;
use crate::error::FindpassError;
use crate::state::SearchRunState;

/// Base-name matching the way `fnmatch(FNM_NOESCAPE | FNM_CASEFOLD)` does it.
const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive:              false,
    require_literal_separator:   false,
    require_literal_leading_dot: false,
};

/// What [`ResultStreamParser::accept`] decided about one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// New path; report it.
    Report(&'a str),
    /// Passed the filters but was reported earlier in this search.
    Duplicate,
    Filtered,
}

/// Turns lines of command output into reportable paths.
///
/// One parser is built per phase from that phase's [`CommandFacts`]; the
/// dedup set lives in [`SearchRunState`] so it spans both phases.
#[derive(Debug)]
pub struct ResultStreamParser {
    root:        String,
    pattern:     Pattern,
    regex:       Option<Regex>,
    show_hidden: bool,
}

impl ResultStreamParser {
    /// # Errors
    ///
    /// The regex does not compile. Any name `find -name` accepts compiles.
    pub fn new(facts: &CommandFacts) -> Result<Self, FindpassError> {
        let pattern = Pattern::new(&fnmatch_to_glob(&facts.name_pattern))
            .map_err(|_| FindpassError::InvalidPattern(facts.name_pattern.clone()))?;
        let regex = facts
            .regex
            .as_deref()
            .map(|re| {
                Regex::new(re).map_err(|source| FindpassError::InvalidRegex {
                    pattern: re.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            root: facts.root_folder.clone(),
            pattern,
            regex,
            show_hidden: facts.show_hidden,
        })
    }

    /// Every check except deduplication. Returns the path to report.
    pub fn filter<'a>(&self, line: &'a str) -> Option<&'a str> {
        let path = line.strip_suffix('\n').unwrap_or(line);
        if path.len() <= 1 {
            return None;
        }

        // locate may answer with paths outside the folder; the folder itself
        // is never a result.
        let below = path.strip_prefix(self.root.as_str())?;
        if below.is_empty() {
            return None;
        }

        let name = base_name(path);
        if !self.pattern.matches_with(name, NAME_MATCH) {
            debug!(path, "name does not match pattern");
            return None;
        }

        if !self.show_hidden && is_hidden(path) {
            return None;
        }

        if let Some(regex) = &self.regex {
            if !regex.is_match(name) {
                return None;
            }
        }

        Some(path)
    }

    /// Filter, then report each absolute path at most once per search.
    /// Reported paths are counted in `state.result_count`.
    pub fn accept<'a>(&self, line: &'a str, state: &mut SearchRunState) -> Verdict<'a> {
        let Some(path) = self.filter(line) else {
            return Verdict::Filtered;
        };
        if !state.insert_path(path) {
            return Verdict::Duplicate;
        }
        state.result_count += 1;
        Verdict::Report(path)
    }

    /// Split a chunk of output into lines and accept each. Lines that are
    /// not valid UTF-8 are skipped.
    pub fn feed(&self, chunk: &[u8], state: &mut SearchRunState) -> Vec<String> {
        chunk
            .split(|b| *b == b'\n')
            .filter_map(|raw| std::str::from_utf8(raw).ok())
            .filter_map(|line| match self.accept(line, state) {
                Verdict::Report(path) => Some(path.to_string()),
                Verdict::Duplicate | Verdict::Filtered => None,
            })
            .collect()
    }
}

/// Final component of `path`, ignoring a trailing `/`.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// A component starting with `.`, or a backup name ending with `~`.
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.')) || path.ends_with('~')
}

/// Rewrite an fnmatch pattern into one `glob::Pattern` compiles with the
/// same meaning.
///
/// Runs of `*` collapse to one (glob rejects `**` inside a name), and a `[`
/// with no closing `]` matches itself, as it does for `find -name`.
pub fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("[[]"),
            },
            ']' => out.push_str("[]]"),
            c => out.push(c),
        }
        i += 1;
    }
    out
}

/// Index of the `]` closing the bracket expression opened at `start`.
/// A `]` right after `[` or `[!` is a member, not the end.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'!') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    chars.get(i..)?.iter().position(|c| *c == ']').map(|offset| i + offset)
}
