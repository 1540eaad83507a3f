use std::path::{Path, PathBuf};

use crate::constraint::{Constraint, ConstraintId, ConstraintSet};

// ---------------------------------------------------------------------------
// SearchRequest
// ---------------------------------------------------------------------------

/// Everything the user asked for: pattern, folder, and constraints.
///
/// Created via [`findpass::search()`](crate::search). Phase and quick-mode
/// eligibility are decided per run by the engine, not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Glob typed by the user. Empty means `*`.
    pub name_pattern:        String,
    /// Absolute folder, always ending with `/`.
    pub root_folder:         String,
    pub constraints:         ConstraintSet,
    /// Collapsed constraint panels are ignored when the command is built.
    pub constraints_visible: bool,
}

// ---------------------------------------------------------------------------
// SearchBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of a [`SearchRequest`].
///
/// ```rust
/// use findpass::ConstraintId;
///
/// let request = findpass::search()
///     .named("report")
///     .root("/home/u")
///     .with(ConstraintId::SizeAtLeast, "12")
///     .flag(ConstraintId::ShowHidden)
///     .build();
///
/// assert_eq!(request.root_folder, "/home/u/");
/// assert_eq!(request.constraints.len(), 2);
/// ```
pub struct SearchBuilder {
    name:        String,
    root:        Option<PathBuf>,
    constraints: ConstraintSet,
    visible:     bool,
}

impl Default for SearchBuilder {
    fn default() -> Self {
        Self {
            name:        String::new(),
            root:        None,
            constraints: ConstraintSet::new(),
            visible:     true,
        }
    }
}

impl SearchBuilder {
    // ── Name and folder ───────────────────────────────────────────────────

    /// Set the "name contains" pattern.
    ///
    /// Without a `*` the pattern is treated as a substring match.
    pub fn named(mut self, pattern: impl Into<String>) -> Self {
        self.name = pattern.into();
        self
    }

    /// Folder to search in. Relative paths are resolved against the current
    /// directory; the default is the home directory.
    pub fn root(mut self, folder: impl AsRef<Path>) -> Self {
        self.root = Some(folder.as_ref().to_path_buf());
        self
    }

    // ── Constraints ───────────────────────────────────────────────────────

    /// Add a constraint with a raw value (text, kilobytes, or days).
    pub fn with(mut self, id: ConstraintId, raw: &str) -> Self {
        self.constraints.add(Constraint::parse(id, raw));
        self
    }

    /// Add a boolean constraint.
    pub fn flag(mut self, id: ConstraintId) -> Self {
        self.constraints.add(Constraint::flag(id));
        self
    }

    /// Add an already-built constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.add(constraint);
        self
    }

    /// Keep the constraints but ignore them, like a collapsed panel.
    pub fn constraints_visible(mut self, yes: bool) -> Self {
        self.visible = yes;
        self
    }

    // ── Finish ────────────────────────────────────────────────────────────

    pub fn build(self) -> SearchRequest {
        let root = match self.root {
            Some(p) if p.is_absolute() => p,
            Some(p) => std::env::current_dir().map(|cwd| cwd.join(&p)).unwrap_or(p),
            None => dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
        };

        SearchRequest {
            name_pattern:        self.name,
            root_folder:         normalize_folder(&root),
            constraints:         self.constraints,
            constraints_visible: self.visible,
        }
    }
}

/// Render `path` as a string ending with exactly one `/`.
pub fn normalize_folder(path: &Path) -> String {
    let mut folder = path.to_string_lossy().into_owned();
    while folder.len() > 1 && folder.ends_with("//") {
        folder.pop();
    }
    if !folder.ends_with('/') {
        folder.push('/');
    }
    folder
}
