use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::builder::SearchRequest;
use crate::command::{self, BuildContext, CommandFacts};
use crate::config::Settings;
use crate::entry::Hit;
use crate::error::FindpassError;
use crate::parser::{ResultStreamParser, Verdict};
use crate::probe::ToolEnvironment;
use crate::process::{Launched, Launcher, ProcessLauncher};
use crate::results::{ScanStats, SearchResults};
use crate::state::{Phase, SearchRunState, Status};
use crate::stderr::{ErrorReport, ErrorStreamAggregator};
use crate::traits::SearchSink;

/// How often the running count is flushed while output keeps coming.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(50);

/// How long the engine refuses a new run after one finishes.
pub const COOLDOWN: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Host facts and settings the engine runs with.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tools:            ToolEnvironment,
    pub settings:         Settings,
    pub refresh_interval: Duration,
    pub cooldown:         Duration,
}

impl EngineOptions {
    pub fn new(tools: ToolEnvironment, settings: Settings) -> Self {
        Self {
            tools,
            settings,
            refresh_interval: REFRESH_INTERVAL,
            cooldown:         COOLDOWN,
        }
    }

    /// Probe the running system and use default settings.
    pub fn detect() -> Self {
        Self::new(ToolEnvironment::detect(), Settings::default())
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// What the user last asked of the running search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Run,
    /// Drain output, report nothing new, end `Aborted`.
    Stop,
    /// Tear down now; no further callbacks.
    Quit,
}

/// Stops a running search from outside the engine.
///
/// Cheap to clone. Requests are level-triggered: the engine looks at the
/// latest one before every line it reads.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    tx: watch::Sender<Control>,
}

impl SearchHandle {
    /// Kill the command, keep draining, end the run as `Aborted`.
    pub fn stop(&self) {
        self.tx.send_if_modified(|c| {
            if *c == Control::Run {
                *c = Control::Stop;
                true
            } else {
                false
            }
        });
    }

    /// Abandon the run immediately, without finalizing or reporting.
    pub fn quit(&self) {
        self.tx.send_replace(Control::Quit);
    }
}

/// How reading one phase's output ended.
enum PhaseEnd {
    Drained { report: Option<ErrorReport> },
    Quit,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs logical searches: one command, or a quick `locate` pass followed by
/// a `find` pass, with output parsed and deduplicated as it arrives.
///
/// The engine is single-threaded: both streams of the child and the control
/// channel are multiplexed in one task. Run it on a current-thread runtime.
pub struct Engine<L: Launcher = ProcessLauncher> {
    opts:     EngineOptions,
    launcher: L,
    state:    SearchRunState,
    control:  watch::Sender<Control>,
}

impl Engine<ProcessLauncher> {
    /// An engine spawning real processes from the home directory.
    pub fn new(opts: EngineOptions) -> Self {
        let launcher = ProcessLauncher::new(opts.tools.home.clone());
        Self::with_launcher(opts, launcher)
    }
}

impl<L: Launcher> Engine<L> {
    pub fn with_launcher(opts: EngineOptions, launcher: L) -> Self {
        let (control, _) = watch::channel(Control::Run);
        Self {
            opts,
            launcher,
            state: SearchRunState::default(),
            control,
        }
    }

    /// A handle for stopping the current (or next) run.
    pub fn handle(&self) -> SearchHandle {
        SearchHandle { tx: self.control.clone() }
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn state(&self) -> &SearchRunState {
        &self.state
    }

    pub fn options(&self) -> &EngineOptions {
        &self.opts
    }

    pub fn options_mut(&mut self) -> &mut EngineOptions {
        &mut self.opts
    }

    /// Whether [`run`](Engine::run) would be accepted right now.
    pub fn is_ready(&self) -> bool {
        self.state.is_ready(Instant::now())
    }

    // ── Run ───────────────────────────────────────────────────────────────

    /// Run a logical search to the end, reporting into `sink`.
    ///
    /// Returns `Ok(None)` when the run was quit: nothing is finalized or
    /// reported in that case.
    ///
    /// # Errors
    ///
    /// [`FindpassError::Busy`] while a run is active or cooling down. Build
    /// and spawn errors of the first phase end the run before anything is
    /// reported and leave the engine `Idle`. A spawn error of the second
    /// phase is returned after the first phase's results were finalized.
    pub async fn run(
        &mut self,
        request: &SearchRequest,
        sink: &mut dyn SearchSink,
    ) -> Result<Option<SearchResults>, FindpassError> {
        if !self.is_ready() {
            return Err(FindpassError::Busy);
        }

        let started = Instant::now();
        self.control.send_replace(Control::Run);
        self.state.begin(!self.opts.settings.quick_search.disable_second_pass);

        let mut stats = ScanStats::default();
        let mut errors = Vec::new();
        let mut phases = 0;
        let mut phase = Phase::First;

        loop {
            let (facts, parser, mut launched) = match self.start_phase(request, phase, sink) {
                Ok(phase_parts) => phase_parts,
                Err(e) if phase == Phase::First => {
                    self.state = SearchRunState {
                        cooldown_until: self.state.cooldown_until,
                        ..SearchRunState::default()
                    };
                    return Err(e);
                }
                Err(e) => {
                    warn!(error = %e, "second pass could not start");
                    let results = self.finish(request, started, phases, stats, errors);
                    return Err(FindpassError::SecondPass {
                        results: Box::new(results),
                        source:  Box::new(e),
                    });
                }
            };
            phases += 1;

            match self.pump(&mut launched, &parser, &facts, sink, &mut stats).await {
                PhaseEnd::Quit => {
                    info!("search quit");
                    self.state.status = Status::Aborted;
                    self.state.seen_paths.clear();
                    return Ok(None);
                }
                PhaseEnd::Drained { report } => {
                    launched.process.reap().await;
                    self.state.child_pid = None;
                    if let Some(report) = report {
                        sink.on_errors(&report);
                        errors.push(report);
                    }
                }
            }

            if self.wants_second_pass(request) {
                info!(root = %request.root_folder, "quick pass done, starting find pass");
                phase = Phase::Second;
                continue;
            }
            break;
        }

        Ok(Some(self.finish(request, started, phases, stats, errors)))
    }

    /// Build and spawn the command for `phase`.
    fn start_phase(
        &mut self,
        request: &SearchRequest,
        phase: Phase,
        sink: &mut dyn SearchSink,
    ) -> Result<(CommandFacts, ResultStreamParser, Launched), FindpassError> {
        let ctx = BuildContext {
            tools:    &self.opts.tools,
            settings: &self.opts.settings.quick_search,
        };
        let cmd = command::build(request, phase, &ctx)?;
        // Fail on a bad pattern before anything is spawned.
        let parser = ResultStreamParser::new(&cmd.facts)?;
        let launched = self.launcher.launch(&cmd.argv)?;

        self.state.phase = phase;
        self.state.child_pid = launched.process.pid;
        if phase == Phase::First {
            self.state.quick_mode = cmd.facts.quick_mode;
        }
        info!(?phase, command = %cmd.line, pid = launched.process.pid, "search phase started");
        sink.on_phase(phase, &cmd.line);
        Ok((cmd.facts, parser, launched))
    }

    /// A quick first pass that was not stopped gets a `find` pass, unless
    /// settings rule it out for this root.
    fn wants_second_pass(&self, request: &SearchRequest) -> bool {
        !self.state.aborted
            && self.state.quick_mode
            && self.state.phase == Phase::First
            && self.state.second_pass_enabled
            && !self
                .opts
                .settings
                .quick_search
                .is_second_scan_excluded(&request.root_folder)
    }

    /// Settle the terminal state and build the summary.
    fn finish(
        &mut self,
        request: &SearchRequest,
        started: Instant,
        phases: usize,
        mut stats: ScanStats,
        errors: Vec<ErrorReport>,
    ) -> SearchResults {
        stats.finish(started.elapsed());
        self.state.status = if self.state.aborted { Status::Aborted } else { Status::Completed };
        self.state.seen_paths = Default::default();
        self.state.cooldown_until = Some(Instant::now() + self.opts.cooldown);

        let results = SearchResults {
            status: self.state.status,
            matches: self.state.result_count,
            phases,
            quick_mode: self.state.quick_mode,
            stats,
            errors,
        };
        info!(
            root = %request.root_folder,
            matches = results.matches,
            status = ?results.status,
            elapsed_ms = results.stats.duration.as_millis() as u64,
            "search finished"
        );
        results
    }

    // ── Reactor ───────────────────────────────────────────────────────────

    /// Read both streams of one phase to the end.
    ///
    /// Control requests are checked before every read. The running count is
    /// flushed when the refresh interval has passed and whenever stdout has
    /// nothing buffered, i.e. right before the loop would wait for the child.
    async fn pump(
        &mut self,
        launched: &mut Launched,
        parser: &ResultStreamParser,
        facts: &CommandFacts,
        sink: &mut dyn SearchSink,
        stats: &mut ScanStats,
    ) -> PhaseEnd {
        let mut control = self.control.subscribe();
        let mut stdout = BufReader::new(&mut launched.stdout);
        let mut stderr = BufReader::new(&mut launched.stderr);
        let (mut out_line, mut err_line) = (Vec::new(), Vec::new());
        let (mut out_open, mut err_open) = (true, true);
        let mut aggregator = ErrorStreamAggregator::new();
        let mut last_flush = Instant::now();

        while out_open || err_open {
            match *control.borrow_and_update() {
                Control::Quit => {
                    launched.process.kill();
                    return PhaseEnd::Quit;
                }
                Control::Stop if !self.state.aborted => {
                    info!(pid = self.state.child_pid, "stop requested");
                    self.state.aborted = true;
                    self.state.status = Status::StopRequested;
                    launched.process.kill();
                }
                _ => {}
            }

            if out_open && stdout.buffer().is_empty() {
                sink.on_progress(self.state.result_count);
                last_flush = Instant::now();
            }

            tokio::select! {
                biased;

                changed = control.changed() => {
                    if changed.is_err() {
                        // Every handle and the engine's sender are gone; nothing
                        // can stop us any more, so just keep reading.
                        debug!("control channel closed");
                    }
                }

                read = stdout.read_until(b'\n', &mut out_line), if out_open => match read {
                    Ok(0) => {
                        out_open = false;
                        if !out_line.is_empty() {
                            self.handle_line(&out_line, parser, sink, stats);
                            out_line.clear();
                        }
                    }
                    Ok(_) => {
                        self.handle_line(&out_line, parser, sink, stats);
                        out_line.clear();
                    }
                    Err(source) => {
                        let e = FindpassError::StreamRead { stream: "stdout", source };
                        warn!(error = %e, "skipping unreadable output");
                        out_line.clear();
                        if !is_transient(&e) {
                            out_open = false;
                        }
                    }
                },

                read = stderr.read_until(b'\n', &mut err_line), if err_open => match read {
                    Ok(0) => {
                        err_open = false;
                        if !err_line.is_empty() {
                            aggregator.push(&String::from_utf8_lossy(&err_line));
                            err_line.clear();
                        }
                    }
                    Ok(_) => {
                        aggregator.push(&String::from_utf8_lossy(&err_line));
                        err_line.clear();
                    }
                    Err(source) => {
                        let e = FindpassError::StreamRead { stream: "stderr", source };
                        warn!(error = %e, "skipping unreadable error output");
                        err_line.clear();
                        if !is_transient(&e) {
                            err_open = false;
                        }
                    }
                },
            }

            if last_flush.elapsed() >= self.opts.refresh_interval {
                sink.on_progress(self.state.result_count);
                tokio::task::yield_now().await;
                last_flush = Instant::now();
            }
        }

        PhaseEnd::Drained { report: aggregator.finish(facts.quick_mode) }
    }

    /// One stdout line: filter, dedup, stat, report. Nothing is reported
    /// once a stop was requested.
    fn handle_line(
        &mut self,
        raw: &[u8],
        parser: &ResultStreamParser,
        sink: &mut dyn SearchSink,
        stats: &mut ScanStats,
    ) {
        stats.lines += 1;
        if self.state.aborted {
            return;
        }

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(_) => {
                stats.undecodable += 1;
                debug!("skipping line that is not UTF-8");
                return;
            }
        };

        match parser.accept(line, &mut self.state) {
            Verdict::Report(path) => {
                sink.on_hit(Hit::from_path(path, self.opts.settings.results.date_format));
            }
            Verdict::Duplicate => stats.duplicates += 1,
            Verdict::Filtered => {}
        }
    }
}

fn is_transient(e: &FindpassError) -> bool {
    match e {
        FindpassError::StreamRead { source, .. } => matches!(
            source.kind(),
            std::io::ErrorKind::Interrupted | std::io::ErrorKind::InvalidData
        ),
        _ => false,
    }
}
