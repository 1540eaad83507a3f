use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FindpassError;

/// User settings, persisted as `config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(default)]
    pub quick_search: QuickSearchSettings,
    #[serde(default)]
    pub results: ResultsSettings,
}

impl Settings {
    /// Default location: `<config dir>/findpass/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("findpass").join("config.toml"))
    }

    /// Loads settings from a TOML file. Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, FindpassError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| FindpassError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| FindpassError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves settings to a TOML file, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), FindpassError> {
        let write_err = |source| FindpassError::ConfigWrite { path: path.to_path_buf(), source };
        let content = toml::to_string_pretty(self).map_err(|e| write_err(std::io::Error::other(e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    /// Turn the locate fast path off for good.
    pub fn disable_quick_search(&mut self) {
        self.quick_search.disable = true;
    }
}

// ---------------------------------------------------------------------------
// Quick search
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickSearchSettings {
    /// Never run `locate`.
    pub disable: bool,
    /// Never follow a `locate` pass with a `find` pass.
    pub disable_second_pass: bool,
    /// Roots where `locate` is not used.
    pub excluded_paths: Vec<String>,
    /// Roots where the `find` pass after `locate` is skipped.
    pub second_scan_excluded_paths: Vec<String>,
}

impl Default for QuickSearchSettings {
    fn default() -> Self {
        Self {
            disable:                    false,
            disable_second_pass:        false,
            excluded_paths:             ["/mnt/*", "/media/*", "/dev/*", "/tmp/*", "/proc/*", "/var/*"]
                .map(String::from)
                .to_vec(),
            second_scan_excluded_paths: vec!["/".to_string()],
        }
    }
}

impl QuickSearchSettings {
    pub fn is_excluded(&self, root: &str) -> bool {
        is_path_excluded(root, &self.excluded_paths)
    }

    pub fn is_second_scan_excluded(&self, root: &str) -> bool {
        is_path_excluded(root, &self.second_scan_excluded_paths)
    }
}

/// Whether `root` is covered by any entry of `list`.
///
/// `~` expands to the home directory. A trailing `*` makes the entry a
/// prefix; otherwise the folder must be equal, ignoring trailing slashes.
pub fn is_path_excluded(root: &str, list: &[String]) -> bool {
    let root = trim_separators(root);
    list.iter().any(|entry| {
        let entry = expand_home(entry);
        match entry.strip_suffix('*') {
            Some(prefix) => root.starts_with(prefix) || format!("{root}/") == prefix,
            None => root == trim_separators(&entry),
        }
    })
}

fn trim_separators(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" if path.starts_with('/') => "/",
        trimmed => trimmed,
    }
}

fn expand_home(entry: &str) -> String {
    match (entry.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => format!("{}{}", home.to_string_lossy().trim_end_matches('/'), rest),
        _ => entry.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsSettings {
    pub date_format: DateFormat,
}

/// How modification dates are rendered in result records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// The locale's preferred date and time.
    Locale,
    /// `2024-05-01 13:37:00`.
    Iso,
    /// "today at 1:37 PM", "yesterday at …", weekday, then plain date.
    #[default]
    Informal,
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::Locale   => write!(f, "locale"),
            DateFormat::Iso      => write!(f, "iso"),
            DateFormat::Informal => write!(f, "informal"),
        }
    }
}
