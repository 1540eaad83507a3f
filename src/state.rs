use std::collections::HashSet;
use std::time::Instant;

/// Where a logical search is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Running,
    /// The user pressed stop; output is drained but no longer reported.
    StopRequested,
    Aborted,
    Completed,
}

impl Status {
    pub fn is_active(self) -> bool {
        matches!(self, Status::Running | Status::StopRequested)
    }
}

/// Which command of a logical search is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `locate` when eligible, otherwise `find`.
    First,
    /// The `find` pass that follows a quick first pass.
    Second,
}

/// Mutable state of one logical search, which may span two phases.
///
/// Owned by the engine; nothing else mutates it.
#[derive(Debug)]
pub struct SearchRunState {
    pub status:              Status,
    pub phase:               Phase,
    pub child_pid:           Option<u32>,
    /// Absolute paths already reported. Survives the switch to the second pass.
    pub seen_paths:          HashSet<String>,
    pub result_count:        usize,
    /// The first pass ran `locate`.
    pub quick_mode:          bool,
    pub second_pass_enabled: bool,
    pub aborted:             bool,
    /// The search button stays disabled until this instant.
    pub cooldown_until:      Option<Instant>,
}

impl Default for SearchRunState {
    fn default() -> Self {
        Self {
            status:              Status::Idle,
            phase:               Phase::First,
            child_pid:           None,
            seen_paths:          HashSet::new(),
            result_count:        0,
            quick_mode:          false,
            second_pass_enabled: false,
            aborted:             false,
            cooldown_until:      None,
        }
    }
}

impl SearchRunState {
    /// Reset for a new logical search. The cooldown deadline is kept.
    pub fn begin(&mut self, second_pass_enabled: bool) {
        let cooldown_until = self.cooldown_until;
        *self = Self {
            status: Status::Running,
            second_pass_enabled,
            cooldown_until,
            ..Self::default()
        };
    }

    /// Record a path; `false` when it was reported before in this search.
    pub fn insert_path(&mut self, path: &str) -> bool {
        if self.seen_paths.contains(path) {
            return false;
        }
        self.seen_paths.insert(path.to_string())
    }

    /// Whether a new run may start now.
    pub fn is_ready(&self, now: Instant) -> bool {
        !self.status.is_active() && self.cooldown_until.map_or(true, |until| now >= until)
    }
}
