//! monitor - cross-platform CPU, memory and GPU resource monitor.
//!
//! Samples one resource at a fixed interval and streams plain or CSV lines to
//! stdout until interrupted. Diagnostics go to stderr through `tracing`.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cli;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

use monitor_core::collector::{ShellRunner, SysinfoSource};
use monitor_core::{Error, Sampler};

use crate::cli::Cli;

/// Exit status for invalid option combinations, matching clap's usage errors.
const CONFIG_ERROR_EXIT: u8 = 2;

/// Initializes the tracing subscriber on stderr.
/// Default level is WARN; each -v raises it one step. -q shows errors only.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("monitor={}", level).parse().unwrap())
        .add_directive(format!("monitor_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = cli.sample_config();
    info!("monitor {} starting", env!("CARGO_PKG_VERSION"));
    debug!("config: {:?}", config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let result = Sampler::from_config(
        &config,
        SysinfoSource::new(),
        ShellRunner::new(),
        io::stdout().lock(),
    )
    .and_then(|mut sampler| sampler.run(&running));

    match result {
        Ok(ticks) => {
            debug!("exiting after {} ticks", ticks);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_broken_pipe() => {
            debug!("stdout closed, exiting");
            ExitCode::SUCCESS
        }
        Err(Error::Config(e)) => {
            eprintln!("monitor: {e}");
            ExitCode::from(CONFIG_ERROR_EXIT)
        }
        Err(e) => {
            eprintln!("monitor: {e}");
            ExitCode::FAILURE
        }
    }
}
