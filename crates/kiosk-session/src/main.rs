//! `kiosk` — run one application full-screen, and nothing else.
//!
//! The session opens a display socket, starts the given application as its
//! only client, and ends when that application exits (or on SIGINT/SIGTERM).
//!
//! # Usage
//!
//! ```text
//! kiosk [OPTIONS] [--] APPLICATION [ARGS...]
//!
//! Options:
//!   --outputs <WxH,...>       Headless output modes [default: 1920x1080]
//!   --repeat-rate <N>         Key repeats per second [default: 25]
//!   --repeat-delay <MS>       Delay before key repeat [default: 600]
//!   -v, --version             Print the version and exit
//!   -h, --help                Print help and exit
//! ```
//!
//! Everything after the first positional argument is passed to the
//! application verbatim, without a shell.
//!
//! # Environment variable overrides
//!
//! | Variable             | Default      | Description                       |
//! |----------------------|--------------|-----------------------------------|
//! | `KIOSK_OUTPUTS`      | `1920x1080`  | Headless output modes             |
//! | `KIOSK_REPEAT_RATE`  | `25`         | Key repeats per second            |
//! | `KIOSK_REPEAT_DELAY` | `600`        | Key repeat delay (milliseconds)   |
//! | `XDG_RUNTIME_DIR`    | (required)   | Where the display socket is made  |
//!
//! # Exit status
//!
//! 0 when the session ends normally, whatever the application's own exit
//! status was.  1 when the session could not start or failed while running.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiosk_core::KeyboardRepeat;
use kiosk_session::application::config::{OutputMode, SessionConfig, DEFAULT_OUTPUT_MODE};
use kiosk_session::application::lifecycle::run_session;
use kiosk_session::infrastructure::engine::headless::HeadlessEngine;
use kiosk_session::infrastructure::environment::RUNTIME_DIR_VAR;
use kiosk_session::infrastructure::supervisor::privileges::SystemCredentials;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Single-application kiosk session.
#[derive(Debug, Parser)]
#[command(
    name = "kiosk",
    about = "Runs a single application full-screen as the only client of a display",
    disable_version_flag = true
)]
struct Cli {
    /// Print the version and exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Output modes for the headless backend, comma separated.
    #[arg(
        long,
        env = "KIOSK_OUTPUTS",
        value_delimiter = ',',
        default_value = DEFAULT_OUTPUT_MODE
    )]
    outputs: Vec<OutputMode>,

    /// Key repeats per second.
    #[arg(long, default_value_t = 25, env = "KIOSK_REPEAT_RATE")]
    repeat_rate: u32,

    /// Delay before a held key starts repeating, in milliseconds.
    #[arg(long, default_value_t = 600, env = "KIOSK_REPEAT_DELAY")]
    repeat_delay: u32,

    /// Directory for the display socket.
    #[arg(long, env = RUNTIME_DIR_VAR, hide = true)]
    runtime_dir: Option<PathBuf>,

    /// The application to run, followed by its arguments.
    #[arg(value_name = "APPLICATION", trailing_var_arg = true)]
    application: Vec<OsString>,
}

impl Cli {
    /// Splits the parsed arguments into the session config and the command.
    fn into_session(self) -> (SessionConfig, Vec<OsString>) {
        let config = SessionConfig {
            runtime_dir: self.runtime_dir,
            outputs: self.outputs,
            repeat: KeyboardRepeat {
                rate: self.repeat_rate,
                delay_ms: self.repeat_delay,
            },
        };
        (config, self.application)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Help goes to stdout with status 0; any other parse error is a usage
    // error with status 1.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if cli.version {
        println!("kiosk version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if cli.application.is_empty() {
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::FAILURE;
    }

    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the session on a single-threaded runtime.
fn run(cli: Cli) -> anyhow::Result<u8> {
    let (config, command) = cli.into_session();
    info!(
        outputs = config.outputs.len(),
        application = ?command[0],
        "kiosk session starting"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("unable to create the event loop runtime")?;

    let report = runtime.block_on(run_session(
        config,
        command,
        &SystemCredentials,
        HeadlessEngine::new,
    ));

    match &report.result {
        Ok(cause) => info!(%cause, child = ?report.child_exit, "kiosk session ended"),
        Err(e) => info!(child = ?report.child_exit, "kiosk session aborted: {e}"),
    }
    Ok(report.exit_code())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
