use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use once_cell::sync::OnceCell;
use tracing::debug;

// ---------------------------------------------------------------------------
// ToolFlags
// ---------------------------------------------------------------------------

/// Case-insensitive variants supported by the installed tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolFlags {
    /// `find` accepts `-iname`.
    pub find_iname:         bool,
    /// `grep` accepts `-i`.
    pub grep_ignore_case:   bool,
    /// `locate` accepts `-i`.
    pub locate_ignore_case: bool,
}

impl ToolFlags {
    /// Plain `-name`, `grep`, `locate`: what every POSIX system understands.
    pub const CASE_SENSITIVE: ToolFlags = ToolFlags {
        find_iname:         false,
        grep_ignore_case:   false,
        locate_ignore_case: false,
    };

    /// Probe the installed tools once per process and remember the answer.
    ///
    /// Each tool is run against a path that cannot exist; if it prints
    /// nothing on stderr the flag was understood.
    pub fn probe() -> ToolFlags {
        static FLAGS: OnceCell<ToolFlags> = OnceCell::new();
        *FLAGS.get_or_init(|| {
            let flags = ToolFlags {
                find_iname:         accepts("find", &["/dev/null", "-iname", "string"]),
                grep_ignore_case:   accepts("grep", &["-i", "string", "/dev/null"]),
                locate_ignore_case: accepts("locate", &["-i", "/dev/null/string"]),
            };
            debug!(?flags, "probed case-insensitive tool flags");
            flags
        })
    }

    /// `find` name-matching flag.
    pub fn name_flag(&self) -> &'static str {
        if self.find_iname { "-iname" } else { "-name" }
    }

    /// Extra `locate` options (may be empty).
    pub fn locate_options(&self) -> &'static str {
        if self.locate_ignore_case { "-i" } else { "" }
    }
}

/// Whether `program args...` runs and writes nothing to stderr.
fn accepts(program: &str, args: &[&str]) -> bool {
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
    {
        Ok(out) => out.stderr.is_empty(),
        Err(e) => {
            debug!(program, error = %e, "probe could not run tool");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// ToolEnvironment
// ---------------------------------------------------------------------------

/// Facts about the host the command builder and runner depend on.
#[derive(Debug, Clone)]
pub struct ToolEnvironment {
    /// Absolute path of `locate`, when installed.
    pub locate: Option<PathBuf>,
    pub flags:  ToolFlags,
    /// Working directory for spawned commands.
    pub home:   PathBuf,
}

impl ToolEnvironment {
    /// Inspect the running system.
    pub fn detect() -> Self {
        Self {
            locate: find_program_in_path("locate"),
            flags:  ToolFlags::probe(),
            home:   dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")),
        }
    }

    /// An environment with no `locate` and case-sensitive tools.
    /// Useful where the host must not be probed.
    pub fn plain(home: impl Into<PathBuf>) -> Self {
        Self {
            locate: None,
            flags:  ToolFlags::CASE_SENSITIVE,
            home:   home.into(),
        }
    }
}

/// Search `$PATH` for an executable file called `name`.
pub fn find_program_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
