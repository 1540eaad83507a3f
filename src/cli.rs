//! Command-line surface.
//!
//! Every option maps onto one catalog constraint, so a search set up
//! interactively can be written back out as arguments ([`clone_args`]) and
//! restored later by passing them to the binary again.

use std::borrow::Cow;
use std::path::PathBuf;

use clap::Parser;

use crate::builder::SearchRequest;
use crate::constraint::{ConstraintId, ConstraintValue};
use crate::results::SortKey;

#[derive(Parser, Debug, Default)]
#[command(name = "findpass")]
#[command(about = "Search for files by name and by what they are", version)]
pub struct CliArgs {
    /// Name pattern; without a `*` it matches anywhere in the name
    #[arg(long)]
    pub named: Option<String>,

    /// Folder to search in (default: home directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Files containing this text
    #[arg(long)]
    pub contains: Option<String>,

    /// Modified less than this many days ago
    #[arg(long)]
    pub mtimeless: Option<String>,

    /// Modified more than this many days ago
    #[arg(long)]
    pub mtimemore: Option<String>,

    /// Size at least this many kilobytes
    #[arg(long)]
    pub sizemore: Option<String>,

    /// Size at most this many kilobytes
    #[arg(long)]
    pub sizeless: Option<String>,

    /// Empty files and folders
    #[arg(long)]
    pub empty: bool,

    /// Owned by this user
    #[arg(long)]
    pub user: Option<String>,

    /// Owned by this group
    #[arg(long)]
    pub group: Option<String>,

    /// Owner or group is unknown
    #[arg(long)]
    pub nouser: bool,

    /// Names not containing this text
    #[arg(long)]
    pub notnamed: Option<String>,

    /// Names matching this regular expression
    #[arg(long)]
    pub regex: Option<String>,

    /// Include hidden and backup files
    #[arg(long)]
    pub hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    pub follow: bool,

    /// Descend into other filesystems
    #[arg(long)]
    pub allmounts: bool,

    /// Sort results by name, folder, size, type or date
    #[arg(long)]
    pub sortby: Option<String>,

    /// Reverse the sort order
    #[arg(long)]
    pub descending: bool,

    /// Run the search instead of printing the command it would run
    #[arg(long)]
    pub start: bool,

    /// Settings file (default: <config dir>/findpass/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// The search these arguments describe.
    pub fn to_request(&self) -> SearchRequest {
        let mut builder = crate::search();
        if let Some(named) = &self.named {
            builder = builder.named(named.clone());
        }
        if let Some(path) = &self.path {
            builder = builder.root(path);
        }

        let valued = [
            (ConstraintId::ContainsText, &self.contains),
            (ConstraintId::ModifiedLessThan, &self.mtimeless),
            (ConstraintId::ModifiedMoreThan, &self.mtimemore),
            (ConstraintId::SizeAtLeast, &self.sizemore),
            (ConstraintId::SizeAtMost, &self.sizeless),
        ];
        for (id, value) in valued {
            if let Some(raw) = value {
                builder = builder.with(id, raw);
            }
        }
        if self.empty {
            builder = builder.flag(ConstraintId::FileIsEmpty);
        }

        let owners = [
            (ConstraintId::OwnedByUser, &self.user),
            (ConstraintId::OwnedByGroup, &self.group),
        ];
        for (id, value) in owners {
            if let Some(raw) = value {
                builder = builder.with(id, raw);
            }
        }
        if self.nouser {
            builder = builder.flag(ConstraintId::OwnerUnrecognized);
        }
        if let Some(raw) = &self.notnamed {
            builder = builder.with(ConstraintId::NameExcludes, raw);
        }
        if let Some(raw) = &self.regex {
            builder = builder.with(ConstraintId::NameMatchesRegex, raw);
        }

        let flags = [
            (ConstraintId::ShowHidden, self.hidden),
            (ConstraintId::FollowSymlinks, self.follow),
            (ConstraintId::IncludeOtherFilesystems, self.allmounts),
        ];
        for (id, on) in flags {
            if on {
                builder = builder.flag(id);
            }
        }

        builder.build()
    }

    /// `None` when results should stream unsorted.
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sortby.as_deref().map(SortKey::parse)
    }
}

/// Option name used for a constraint on the command line.
pub fn option_name(id: ConstraintId) -> &'static str {
    match id {
        ConstraintId::ContainsText            => "contains",
        ConstraintId::ModifiedLessThan        => "mtimeless",
        ConstraintId::ModifiedMoreThan        => "mtimemore",
        ConstraintId::SizeAtLeast             => "sizemore",
        ConstraintId::SizeAtMost              => "sizeless",
        ConstraintId::FileIsEmpty             => "empty",
        ConstraintId::OwnedByUser             => "user",
        ConstraintId::OwnedByGroup            => "group",
        ConstraintId::OwnerUnrecognized       => "nouser",
        ConstraintId::NameExcludes            => "notnamed",
        ConstraintId::NameMatchesRegex        => "regex",
        ConstraintId::ShowHidden              => "hidden",
        ConstraintId::FollowSymlinks          => "follow",
        ConstraintId::IncludeOtherFilesystems => "allmounts",
    }
}

/// `name=value` pairs for the request, in order. Boolean constraints have no
/// value. Constraints are left out when the panel is collapsed.
fn pairs(request: &SearchRequest) -> Vec<(&'static str, Option<String>)> {
    let mut out = vec![
        ("named", Some(request.name_pattern.clone())),
        ("path", Some(display_folder(&request.root_folder).to_string())),
    ];
    if request.constraints_visible {
        for c in request.constraints.iter() {
            let value = match c.value() {
                None => None,
                Some(ConstraintValue::Text(t)) => Some(t.clone()),
                Some(ConstraintValue::Count(n)) => Some(n.to_string()),
                Some(ConstraintValue::Days(d)) => Some(d.to_string()),
            };
            out.push((option_name(c.id()), value));
        }
    }
    out
}

/// Arguments that recreate `request`, program name excluded.
///
/// With `escape`, text values are shell-quoted so the result can be pasted
/// into a shell.
pub fn clone_args(request: &SearchRequest, escape: bool) -> Vec<String> {
    pairs(request)
        .into_iter()
        .map(|(name, value)| match value {
            None => format!("--{name}"),
            Some(v) => {
                let v: Cow<'_, str> = if escape { shell_words::quote(&v) } else { Cow::Borrowed(&v) };
                format!("--{name}={v}")
            }
        })
        .collect()
}

/// Title for a saved search: `Search for Files (named=x&path=/y&hidden)`.
pub fn describe(request: &SearchRequest) -> String {
    let body = pairs(request)
        .into_iter()
        .map(|(name, value)| match value {
            None => name.to_string(),
            Some(v) => format!("{name}={v}"),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("Search for Files ({body})")
}

/// Root folder the way a folder chooser shows it: no trailing `/`.
fn display_folder(root: &str) -> &str {
    match root.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
