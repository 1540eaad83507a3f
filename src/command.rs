use std::fmt::Write as _;

use tracing::debug;

use crate::builder::SearchRequest;
use crate::config::QuickSearchSettings;
use crate::constraint::Rendering;
use crate::error::FindpassError;
use crate::probe::ToolEnvironment;
use crate::state::Phase;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What the result parser needs to know about the command it is reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFacts {
    pub phase:        Phase,
    /// The command is a `locate` invocation.
    pub quick_mode:   bool,
    /// Glob applied to base names of reported paths.
    pub name_pattern: String,
    /// Regex applied to base names, when the regex constraint is active.
    pub regex:        Option<String>,
    pub show_hidden:  bool,
    /// Literal prefix every accepted path must start with.
    pub root_folder:  String,
}

/// A composed command line, its tokenized argv, and the side-channel facts.
#[derive(Debug, Clone)]
pub struct SearchCommand {
    pub line:  String,
    pub argv:  Vec<String>,
    pub facts: CommandFacts,
}

/// Inputs that come from the host and settings rather than the user.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub tools:    &'a ToolEnvironment,
    pub settings: &'a QuickSearchSettings,
}

impl BuildContext<'_> {
    /// `locate` may serve the first pass for this root.
    pub fn quick_mode_eligible(&self, root_folder: &str) -> bool {
        !self.settings.disable
            && self.tools.locate.is_some()
            && !self.settings.is_excluded(root_folder)
    }
}

// ---------------------------------------------------------------------------
// build()
// ---------------------------------------------------------------------------

/// Turn a request into the shell command for `phase`.
///
/// # Errors
///
/// [`FindpassError::CommandParse`] when the composed line cannot be split
/// into words. Nothing is spawned in that case.
pub fn build(
    request: &SearchRequest,
    phase: Phase,
    ctx: &BuildContext<'_>,
) -> Result<SearchCommand, FindpassError> {
    let name_flag = ctx.tools.flags.name_flag();
    let named = effective_name_pattern(&request.name_pattern);
    let escaped = escape_for_single_quotes(&named);
    let root = &request.root_folder;

    let mut facts = CommandFacts {
        phase,
        quick_mode:   false,
        name_pattern: named.clone(),
        regex:        None,
        show_hidden:  false,
        root_folder:  root.clone(),
    };

    let constrained = request.constraints_visible && request.constraints.has_additional_constraints();

    let line = if !constrained {
        match (&ctx.tools.locate, phase) {
            (Some(locate), Phase::First) if ctx.quick_mode_eligible(root) => {
                facts.quick_mode = true;
                format!(
                    "{} {} '{}*{}'",
                    locate.display(),
                    ctx.tools.flags.locate_options(),
                    escape_single_quotes(root),
                    escaped,
                )
            }
            _ => format!(
                "find \"{}\" {} '{}' -xdev -print",
                escape_double_quotes(root),
                name_flag,
                escaped,
            ),
        }
    } else {
        let mut line = format!(
            "find \"{}\" {}",
            escape_double_quotes(root),
            find_name_clause(&escaped, name_flag),
        );
        let mut include_other_filesystems = false;

        for constraint in request.constraints.iter() {
            match constraint.render(&ctx.tools.flags) {
                Rendering::Fragment(fragment) => {
                    line.push_str(&fragment);
                    line.push(' ');
                }
                Rendering::ShowHidden => facts.show_hidden = true,
                Rendering::IncludeOtherFilesystems => include_other_filesystems = true,
                Rendering::Regex(pattern) => facts.regex = Some(pattern),
                Rendering::Skip => {}
            }
        }

        facts.name_pattern = "*".to_string();
        if !include_other_filesystems {
            line.push_str("-xdev ");
        }
        line.push_str("-print");
        line
    };

    let argv = shell_words::split(&line).map_err(|source| FindpassError::CommandParse {
        command: line.clone(),
        source,
    })?;

    debug!(command = %line, ?phase, quick_mode = facts.quick_mode, "built search command");
    Ok(SearchCommand { line, argv, facts })
}

// ---------------------------------------------------------------------------
// Name handling
// ---------------------------------------------------------------------------

/// The glob the search really uses: `*` when empty, `*name*` when the user
/// typed no wildcard.
pub fn effective_name_pattern(pattern: &str) -> String {
    if pattern.is_empty() {
        "*".to_string()
    } else if !pattern.contains('*') {
        format!("*{pattern}*")
    } else {
        pattern.to_string()
    }
}

/// `find` name alternatives for an escaped pattern, so dotfiles still match.
///
/// The result ends with a space, ready for the next fragment.
pub fn find_name_clause(pattern: &str, flag: &str) -> String {
    let mut out = String::new();
    let starts_with_dot = pattern.starts_with('.');

    // `write!` into a String cannot fail.
    let _ = if !pattern.contains('*') {
        if !starts_with_dot {
            write!(out, "\\( {flag} '*{pattern}*' -o {flag} '.*{pattern}*' \\) ")
        } else {
            write!(
                out,
                "\\( {flag} '*{pattern}*' -o {flag} '.*{pattern}*' -o {flag} '{pattern}*' \\) "
            )
        }
    } else if starts_with_dot {
        write!(out, "\\( {flag} '{pattern}' -o {flag} '.*{pattern}' \\) ")
    } else if !pattern.starts_with('*') {
        write!(out, "{flag} '{pattern}' ")
    } else if pattern[1..].starts_with('.') {
        write!(out, "\\( {flag} '{pattern}' -o {flag} '{}' \\) ", &pattern[1..])
    } else {
        write!(out, "\\( {flag} '{pattern}' -o {flag} '.{pattern}' \\) ")
    };
    out
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Backslash the characters `find`/`grep` patterns treat specially.
pub fn backslash_special_characters(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == '-' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Make `s` safe inside a single-quoted shell word.
pub fn escape_single_quotes(s: &str) -> String {
    s.replace('\'', "'\\''")
}

/// Make `s` safe inside a double-quoted shell word.
pub fn escape_double_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a user value for a `'...'` slot in a fragment.
pub fn escape_for_single_quotes(s: &str) -> String {
    escape_single_quotes(&backslash_special_characters(s))
}
