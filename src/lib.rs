//! # findpass
//!
//! Two-phase file search on top of the system's own tools.
//!
//! A search turns a name pattern, a root folder, and a set of optional
//! constraints into one shell command: `locate` for a fast first pass when
//! the index may serve the root, `find` otherwise. After a quick pass the
//! same search is re-run with `find` so results `locate` missed (or that its
//! index got wrong) still turn up. Output of both passes is filtered,
//! deduplicated, and reported one [`Hit`] at a time.
//!
//! findpass owns command synthesis, the stream parser, the stderr policy,
//! and the run lifecycle. Rendering the results is up to the caller, via
//! [`SearchSink`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use findpass::{ConstraintId, Engine, EngineOptions, Hit};
//!
//! let request = findpass::search()
//!     .named("*.txt")
//!     .root("/home/u/docs")
//!     .with(ConstraintId::SizeAtLeast, "4")
//!     .build();
//!
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//!
//! let mut engine = Engine::new(EngineOptions::detect());
//! let mut hits: Vec<Hit> = Vec::new();
//! let results = runtime.block_on(engine.run(&request, &mut hits)).unwrap();
//!
//! if let Some(results) = results {
//!     println!("{} in {:.3}s", results.message(), results.stats.duration.as_secs_f64());
//! }
//! ```
//!
//! # Custom launchers
//!
//! The engine reads whatever a [`Launcher`] hands it, so a search can be fed
//! from canned output instead of a real process:
//!
//! ```rust
//! use findpass::{FindpassError, Launched, Launcher};
//!
//! struct Canned(&'static [u8]);
//!
//! impl Launcher for Canned {
//!     fn launch(&mut self, _argv: &[String]) -> Result<Launched, FindpassError> {
//!         Ok(Launched::from_streams(Box::new(self.0), Box::new(&b""[..])))
//!     }
//! }
//! ```

#![forbid(unsafe_code)]

pub mod cli;
pub mod command;
pub mod config;
pub mod constraint;
pub mod engine;
pub mod parser;
pub mod probe;
pub mod stderr;

mod builder;
mod entry;
mod error;
mod process;
mod results;
mod state;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::{SearchBuilder, SearchRequest};
pub use config::{DateFormat, Settings};
pub use constraint::{Constraint, ConstraintId, ConstraintKind, ConstraintSet, ConstraintValue};
pub use engine::{Engine, EngineOptions, SearchHandle};
pub use entry::{format_date, format_size, Hit, HitKind};
pub use error::FindpassError;
pub use probe::{ToolEnvironment, ToolFlags};
pub use process::{ChildProcess, Launched, Launcher, OutputStream, ProcessLauncher};
pub use results::{sort_hits, ScanStats, SearchResults, SortKey};
pub use state::{Phase, SearchRunState, Status};
pub use stderr::{ErrorReport, ErrorReportKind};
pub use traits::SearchSink;

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`SearchBuilder`] to describe a search.
///
/// # Example
///
/// ```rust
/// use findpass::ConstraintId;
///
/// let request = findpass::search()
///     .named("report")
///     .root("/srv/share")
///     .flag(ConstraintId::ShowHidden)
///     .build();
///
/// assert_eq!(request.root_folder, "/srv/share/");
/// assert!(request.constraints.has_additional_constraints());
/// ```
pub fn search() -> SearchBuilder {
    SearchBuilder::default()
}
