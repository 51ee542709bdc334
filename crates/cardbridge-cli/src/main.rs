//! `cardbridge` — the native messaging host binary.
//!
//! Thin wrapper around `cardbridge-host`'s run loop: parse arguments,
//! set up logging to stderr, validate the process contract (stdin and
//! stdout must be pipes), then hand off to the loop until it returns.

use std::os::unix::io::RawFd;

use anyhow::{bail, Context};
use cardbridge_host::Config;
use cardbridge_pcsc::{Reconciler, RealTransport};
use clap::Parser;
use tracing_subscriber::EnvFilter;

const STDIN_FD: RawFd = 0;
const STDOUT_FD: RawFd = 1;

#[derive(Parser, Debug)]
#[command(name = "cardbridge", about = "PC/SC native messaging bridge")]
struct Args {
    /// Overrides RUST_LOG / CARDBRIDGE_LOG for this run.
    #[arg(long)]
    log_level: Option<String>,

    /// Overrides CARDBRIDGE_POLL_MS for this run.
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    require_pipe(STDIN_FD).context("stdin must be a pipe")?;
    require_pipe(STDOUT_FD).context("stdout must be a pipe")?;

    let mut config = Config::from_env();
    if let Some(ms) = args.poll_interval_ms {
        config.list_tick = std::time::Duration::from_millis(ms);
    }

    let transport = RealTransport::establish().context("failed to establish PC/SC context")?;
    let reconciler = Reconciler::new(transport);

    let code = cardbridge_host::run(reconciler, config);
    std::process::exit(code);
}

fn init_logging(override_level: Option<&str>) {
    let filter = match override_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env("CARDBRIDGE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn require_pipe(fd: RawFd) -> anyhow::Result<()> {
    // SAFETY: fstat on one of the process's own standard descriptors.
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(fd, &mut stat) };
    if rc != 0 {
        bail!("fstat failed on fd {fd}");
    }
    let mode = stat.st_mode & libc::S_IFMT;
    if mode != libc::S_IFIFO && mode != libc::S_IFSOCK {
        bail!("fd {fd} is not a pipe or socket");
    }
    Ok(())
}
