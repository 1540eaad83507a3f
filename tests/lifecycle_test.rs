use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use findpass::{
    ConstraintId, Engine, EngineOptions, ErrorReport, ErrorReportKind, FindpassError, Hit, Launched,
    Launcher, Phase, SearchHandle, SearchRequest, SearchSink, Settings, Status, ToolEnvironment,
    ToolFlags,
};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// One scripted command: stdout and stderr bytes, or a spawn failure.
enum Step {
    Output(&'static [u8], &'static [u8]),
    SpawnFails,
}

/// Hands out scripted output in order and records every argv it was given.
struct Script {
    steps: VecDeque<Step>,
    calls: Rc<RefCell<Vec<Vec<String>>>>,
}

impl Launcher for Script {
    fn launch(&mut self, argv: &[String]) -> Result<Launched, FindpassError> {
        self.calls.borrow_mut().push(argv.to_vec());
        match self.steps.pop_front() {
            Some(Step::Output(out, err)) => Ok(Launched::from_streams(Box::new(out), Box::new(err))),
            Some(Step::SpawnFails) | None => Err(FindpassError::CommandSpawn {
                program: argv.first().cloned().unwrap_or_default(),
                source:  std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
            }),
        }
    }
}

type Calls = Rc<RefCell<Vec<Vec<String>>>>;

fn tools() -> ToolEnvironment {
    ToolEnvironment {
        locate: Some(PathBuf::from("/usr/bin/locate")),
        flags:  ToolFlags::CASE_SENSITIVE,
        home:   PathBuf::from("/"),
    }
}

fn engine_with(settings: Settings, steps: Vec<Step>) -> (Engine<Script>, Calls) {
    let calls = Calls::default();
    let script = Script { steps: steps.into(), calls: calls.clone() };
    let mut opts = EngineOptions::new(tools(), settings);
    opts.cooldown = Duration::ZERO;
    (Engine::with_launcher(opts, script), calls)
}

fn engine(steps: Vec<Step>) -> (Engine<Script>, Calls) {
    engine_with(Settings::default(), steps)
}

fn home_search() -> SearchRequest {
    findpass::search().root("/home/u").build()
}

/// Collects everything the engine reports.
#[derive(Default)]
struct Recorder {
    paths:    Vec<String>,
    progress: Vec<usize>,
    phases:   Vec<Phase>,
    errors:   Vec<ErrorReport>,
    /// Stop or quit after this many hits.
    control:  Option<(usize, SearchHandle, bool)>,
}

impl SearchSink for Recorder {
    fn on_hit(&mut self, hit: Hit) {
        self.paths.push(hit.path.to_string_lossy().into_owned());
        if let Some((after, handle, quit)) = &self.control {
            if self.paths.len() == *after {
                if *quit { handle.quit() } else { handle.stop() }
            }
        }
    }

    fn on_progress(&mut self, found: usize) {
        self.progress.push(found);
    }

    fn on_phase(&mut self, phase: Phase, _command: &str) {
        self.phases.push(phase);
    }

    fn on_errors(&mut self, report: &ErrorReport) {
        self.errors.push(report.clone());
    }
}

// ---------------------------------------------------------------------------
// Two-phase runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_quick_pass_then_find_pass_deduplicates() {
    let (mut engine, calls) = engine(vec![
        Step::Output(b"/home/u/a.txt\n/home/u/b.txt\n", b""),
        Step::Output(b"/home/u/a.txt\n/home/u/c.txt\n", b""),
    ]);
    let mut rec = Recorder::default();

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(rec.paths, vec!["/home/u/a.txt", "/home/u/b.txt", "/home/u/c.txt"]);
    assert_eq!(rec.phases, vec![Phase::First, Phase::Second]);
    assert_eq!(results.status, Status::Completed);
    assert_eq!(results.matches, 3);
    assert_eq!(results.phases, 2);
    assert!(results.quick_mode);
    assert_eq!(results.stats.lines, 4);
    assert_eq!(results.stats.duplicates, 1);
    assert_eq!(results.message(), "3 files found");

    let calls = calls.borrow();
    assert_eq!(calls[0][0], "/usr/bin/locate");
    assert_eq!(calls[1][0], "find");
    assert!(engine.state().seen_paths.is_empty(), "dedup set is cleared at the end");
}

#[tokio::test]
async fn test_second_pass_can_be_disabled() {
    let mut settings = Settings::default();
    settings.quick_search.disable_second_pass = true;
    let (mut engine, calls) = engine_with(settings, vec![Step::Output(b"/home/u/a.txt\n", b"")]);
    let mut rec = Recorder::default();

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(results.phases, 1);
    assert!(results.quick_mode, "quick mode does not depend on the second-pass setting");
    assert_eq!(calls.borrow().len(), 1);
}

#[tokio::test]
async fn test_second_pass_skipped_for_excluded_root() {
    let (mut engine, calls) = engine(vec![Step::Output(b"/etc/hosts\n", b"")]);
    let mut rec = Recorder::default();
    let request = findpass::search().named("hosts").root("/").build();

    let results = engine.run(&request, &mut rec).await.unwrap().unwrap();

    assert_eq!(results.phases, 1);
    assert_eq!(rec.paths, vec!["/etc/hosts"]);
    assert_eq!(calls.borrow().len(), 1);
}

#[tokio::test]
async fn test_find_only_search_runs_once() {
    let (mut engine, calls) = engine(vec![Step::Output(b"/home/u/big.iso\n", b"")]);
    let mut rec = Recorder::default();
    let request = findpass::search().root("/home/u").with(ConstraintId::SizeAtLeast, "1000").build();

    let results = engine.run(&request, &mut rec).await.unwrap().unwrap();

    assert_eq!(results.phases, 1);
    assert!(!results.quick_mode);
    assert_eq!(calls.borrow()[0][0], "find");
}

#[tokio::test]
async fn test_hidden_and_foreign_lines_filtered() {
    let (mut engine, _) = engine(vec![
        Step::Output(b"/home/u/.cache/x\n/home/user2/y\n/home/u/z\n", b""),
        Step::Output(b"", b""),
    ]);
    let mut rec = Recorder::default();

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(rec.paths, vec!["/home/u/z"]);
    assert_eq!(results.stats.lines, 3);
}

#[tokio::test]
async fn test_progress_ends_with_final_count() {
    let (mut engine, _) = engine(vec![
        Step::Output(b"/home/u/a\n/home/u/b\n", b""),
        Step::Output(b"/home/u/c\n", b""),
    ]);
    let mut rec = Recorder::default();

    engine.run(&home_search(), &mut rec).await.unwrap();

    assert_eq!(rec.progress.first(), Some(&0));
    assert_eq!(rec.progress.last(), Some(&3));
    assert!(rec.progress.windows(2).all(|w| w[0] <= w[1]));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stderr_reported_per_phase() {
    let (mut engine, _) = engine(vec![
        Step::Output(b"/home/u/a\n", b"locate: warning: database is more than 8 days old\n"),
        Step::Output(b"/home/u/a\n", b"find: '/home/u/private': Permission denied\n"),
    ]);
    let mut rec = Recorder::default();

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(rec.errors.len(), 1);
    assert_eq!(rec.errors[0].kind, ErrorReportKind::OfferDisableQuickSearch);
    assert_eq!(results.errors.len(), 1);
    assert_eq!(results.status, Status::Completed);
}

#[tokio::test]
async fn test_find_errors_are_plain() {
    let (mut engine, _) = engine(vec![Step::Output(b"", b"find: `/x': Input/output error\n")]);
    let mut rec = Recorder::default();
    let request = findpass::search().root("/home/u").flag(ConstraintId::FollowSymlinks).build();

    engine.run(&request, &mut rec).await.unwrap();

    assert_eq!(rec.errors.len(), 1);
    assert_eq!(rec.errors[0].kind, ErrorReportKind::Plain);
}

#[tokio::test]
async fn test_spawn_failure_leaves_engine_idle() {
    let (mut engine, _) = engine(vec![
        Step::SpawnFails,
        Step::Output(b"/home/u/a\n", b""),
        Step::Output(b"", b""),
    ]);
    let mut rec = Recorder::default();

    let err = engine.run(&home_search(), &mut rec).await.unwrap_err();
    assert!(matches!(err, FindpassError::CommandSpawn { .. }));
    assert_eq!(engine.status(), Status::Idle);
    assert!(rec.phases.is_empty());

    // The next search starts normally.
    assert!(engine.is_ready());
    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();
    assert_eq!(results.matches, 1);
    assert_eq!(results.status, Status::Completed);
}

#[tokio::test]
async fn test_second_pass_spawn_failure_keeps_first_results() {
    let (mut engine, _) = engine(vec![Step::Output(b"/home/u/a\n", b""), Step::SpawnFails]);
    let mut rec = Recorder::default();

    let err = engine.run(&home_search(), &mut rec).await.unwrap_err();

    let FindpassError::SecondPass { results, source } = &err else {
        panic!("expected a second pass error, got {err:?}");
    };
    assert!(matches!(**source, FindpassError::CommandSpawn { .. }));
    assert_eq!(err.command(), Some("find"));
    assert_eq!(results.matches, 1);
    assert_eq!(results.phases, 1);
    assert!(results.quick_mode);
    assert_eq!(results.status, Status::Completed);
    assert_eq!(err.partial_results().map(|r| r.matches), Some(1));

    assert_eq!(rec.paths, vec!["/home/u/a"]);
    assert_eq!(engine.status(), Status::Completed);
}

#[tokio::test]
async fn test_invalid_regex_spawns_nothing() {
    let (mut engine, calls) = engine(vec![Step::Output(b"", b"")]);
    let mut rec = Recorder::default();
    let request = findpass::search().root("/srv").with(ConstraintId::NameMatchesRegex, "(").build();

    let err = engine.run(&request, &mut rec).await.unwrap_err();

    assert!(matches!(err, FindpassError::InvalidRegex { .. }));
    assert!(calls.borrow().is_empty());
    assert_eq!(engine.status(), Status::Idle);
}

// ---------------------------------------------------------------------------
// Stop, quit, cooldown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stop_discards_rest_and_skips_second_pass() {
    let (mut engine, calls) = engine(vec![
        Step::Output(b"/home/u/a\n/home/u/b\n/home/u/c\n", b"locate: stale index\n"),
        Step::Output(b"/home/u/d\n", b""),
    ]);
    let mut rec = Recorder { control: Some((1, engine.handle(), false)), ..Default::default() };

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(rec.paths, vec!["/home/u/a"]);
    assert_eq!(results.status, Status::Aborted);
    assert_eq!(results.message(), "1 file found (stopped)");
    assert_eq!(results.stats.lines, 3, "remaining output is still drained");
    assert_eq!(rec.errors.len(), 1, "stderr is still aggregated after a stop");
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(engine.status(), Status::Aborted);
}

#[tokio::test]
async fn test_quit_returns_without_finalizing() {
    let (mut engine, _) = engine(vec![
        Step::Output(b"/home/u/a\n/home/u/b\n", b"locate: stale index\n"),
        Step::Output(b"/home/u/c\n", b""),
    ]);
    let mut rec = Recorder { control: Some((1, engine.handle(), true)), ..Default::default() };

    let outcome = engine.run(&home_search(), &mut rec).await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(rec.paths, vec!["/home/u/a"]);
    assert!(rec.errors.is_empty());
    assert_eq!(rec.phases, vec![Phase::First]);
}

#[tokio::test]
async fn test_stop_before_run_is_forgotten() {
    let (mut engine, _) = engine(vec![Step::Output(b"/home/u/a\n", b""), Step::Output(b"", b"")]);
    engine.handle().stop();
    let mut rec = Recorder::default();

    let results = engine.run(&home_search(), &mut rec).await.unwrap().unwrap();

    assert_eq!(results.status, Status::Completed);
    assert_eq!(rec.paths, vec!["/home/u/a"]);
}

#[tokio::test]
async fn test_cooldown_rejects_immediate_rerun() {
    let (mut engine, _) = engine(vec![Step::Output(b"", b""), Step::Output(b"", b"")]);
    engine.options_mut().cooldown = Duration::from_secs(60);
    let mut rec = Recorder::default();
    let request = findpass::search().root("/home/u").flag(ConstraintId::FileIsEmpty).build();

    let results = engine.run(&request, &mut rec).await.unwrap().unwrap();
    assert_eq!(results.message(), "No files found");

    assert!(!engine.is_ready());
    let err = engine.run(&request, &mut rec).await.unwrap_err();
    assert!(matches!(err, FindpassError::Busy));
}
