use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use findpass::cli::{self, CliArgs};
use findpass::command::{self, BuildContext};
use findpass::{
    sort_hits, Engine, EngineOptions, ErrorReport, ErrorReportKind, FindpassError, Hit, Phase, SearchSink,
    Settings, ToolEnvironment,
};

/// Prints hits as they arrive, or keeps them for sorting.
struct Terminal {
    sorted:        Option<Vec<Hit>>,
    offer_disable: bool,
}

impl SearchSink for Terminal {
    fn on_hit(&mut self, hit: Hit) {
        match &mut self.sorted {
            Some(hits) => hits.push(hit),
            None => println!("{}", hit.path.display()),
        }
    }

    fn on_phase(&mut self, phase: Phase, command: &str) {
        debug!(?phase, command, "running");
    }

    fn on_errors(&mut self, report: &ErrorReport) {
        eprintln!("{}\n{}", report.headline(), report.details);
        if report.kind == ErrorReportKind::OfferDisableQuickSearch {
            self.offer_disable = true;
        }
    }
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries results only.
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config_path = args.config.clone().or_else(Settings::default_path);
    let mut settings = match &config_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let request = args.to_request();
    let tools = ToolEnvironment::detect();

    if !args.start {
        let ctx = BuildContext { tools: &tools, settings: &settings.quick_search };
        let cmd = command::build(&request, Phase::First, &ctx)?;
        println!("{}", cmd.line);
        println!("findpass {}", cli::clone_args(&request, true).join(" "));
        return Ok(ExitCode::SUCCESS);
    }

    let sort = args.sort_key();
    let mut sink = Terminal {
        sorted:        sort.map(|_| Vec::new()),
        offer_disable: false,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the event loop")?;

    let mut engine = Engine::new(EngineOptions::new(tools, settings.clone()));
    let handle = engine.handle();

    let outcome = runtime.block_on(async {
        // First Ctrl-C stops the search, the second one leaves at once.
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.stop();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.quit();
            }
        });
        engine.run(&request, &mut sink).await
    });

    // A failed find pass still leaves the quick pass results to show.
    let outcome = match outcome {
        Err(FindpassError::SecondPass { results, source }) => {
            eprintln!("{source}");
            Some(*results)
        }
        other => other?,
    };

    let Some(results) = outcome else {
        return Ok(ExitCode::from(130));
    };

    if let (Some(hits), Some(key)) = (sink.sorted.as_mut(), sort) {
        sort_hits(hits, key, args.descending);
        for hit in hits.iter() {
            println!("{}", hit.path.display());
        }
    }
    eprintln!("{}", results.message());

    if sink.offer_disable && std::io::stdin().is_terminal() {
        if let Some(path) = config_path {
            offer_disable_quick_search(&mut settings, path)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn offer_disable_quick_search(settings: &mut Settings, path: PathBuf) -> Result<()> {
    eprint!("Disable the quick search feature? [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    if matches!(answer.trim(), "y" | "Y" | "yes") {
        settings.disable_quick_search();
        settings
            .save(&path)
            .with_context(|| format!("could not save {}", path.display()))?;
        eprintln!("Quick search disabled in {}", path.display());
    }
    Ok(())
}
