use crate::entry::Hit;
use crate::state::Phase;
use crate::stderr::ErrorReport;

/// Receives what a running search produces.
///
/// Implement this to feed a result list, a terminal, or a test buffer. Only
/// [`on_hit`](SearchSink::on_hit) is required.
///
/// All methods are called from the engine's own task, between reads, so an
/// implementation may call [`SearchHandle::stop`](crate::SearchHandle::stop)
/// and the engine will see it before the next line.
///
/// # Example
///
/// ```rust
/// use findpass::{Hit, SearchSink};
///
/// struct Names(Vec<String>);
///
/// impl SearchSink for Names {
///     fn on_hit(&mut self, hit: Hit) {
///         self.0.push(hit.name);
///     }
/// }
/// ```
pub trait SearchSink {
    /// A new, deduplicated result.
    fn on_hit(&mut self, hit: Hit);

    /// Running result count, at most every refresh interval and whenever the
    /// command has nothing more to say for the moment.
    fn on_progress(&mut self, _found: usize) {}

    /// A phase's command is about to run.
    fn on_phase(&mut self, _phase: Phase, _command: &str) {}

    /// A phase's stderr closed with something worth showing.
    fn on_errors(&mut self, _report: &ErrorReport) {}
}

impl SearchSink for Vec<Hit> {
    fn on_hit(&mut self, hit: Hit) {
        self.push(hit);
    }
}
