//! hostprobe - host and process information from system files
//!
//! The main entry point for the `hostprobe` binary:
//! - `host`: identity, CPU, memory, load, vmstat and network counters
//! - `process`: one process (the caller by default)
//! - `os`: operating system identity only
//! - `version`: build information

use clap::{Args, Parser, Subcommand};
use hp_common::{format_error_human, Error, OutputFormat, StructuredError};
use hp_core::config::{load_config, ConfigOptions};
use hp_core::exit_codes::ExitCode;
use hp_core::logging::{init_logging, LogFormat};
use hp_core::providers::{host_report, process_report, Partial, System};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Report host and process information as JSON
#[derive(Parser)]
#[command(name = "hostprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Config file (default: search XDG config dir, then /etc/hostprobe)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read /proc and /etc under this root instead of /
    #[arg(long, global = true, env = "HOSTPROBE_HOSTFS")]
    hostfs: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Diagnostic log format on stderr (human, json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print host identity and metrics
    Host,

    /// Print information about one process
    Process(ProcessArgs),

    /// Print operating system identity
    Os,

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Process to inspect (default: hostprobe itself)
    #[arg(long)]
    pid: Option<u32>,

    /// Include the environment
    #[arg(long)]
    env: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&cli.global, &err);
            ExitCode::from(&err)
        }
    };
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    let resolved = load_config(&ConfigOptions {
        config_path: cli.global.config.clone(),
        hostfs: cli.global.hostfs.clone(),
    })?;

    let steps = i8::try_from(cli.global.verbose).unwrap_or(i8::MAX)
        - i8::try_from(cli.global.quiet).unwrap_or(i8::MAX);
    let mut log_config = resolved.config.log.clone().apply_env();
    log_config.level = log_config.level.adjusted(steps);
    if let Some(format) = cli.global.log_format {
        log_config.format = format;
    }
    init_logging(&log_config);
    debug!(source = ?resolved.source, level = %log_config.level, "starting");

    let system = System::new(resolved.config);
    match &cli.command {
        Commands::Host => {
            let host = system.host()?;
            emit_partial(&cli.global, host_report(host.as_ref()))
        }
        Commands::Process(args) => {
            let process = match args.pid {
                Some(pid) => system.process(pid)?,
                None => system.self_process()?,
            };
            emit_partial(&cli.global, process_report(process.as_ref(), args.env))
        }
        Commands::Os => {
            let os = system.host()?.os()?;
            emit(&cli.global, &os)?;
            Ok(ExitCode::Clean)
        }
        Commands::Version => {
            let version = serde_json::json!({
                "name": env!("CARGO_BIN_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "os": std::env::consts::OS,
                "arch": std::env::consts::ARCH,
            });
            emit(&cli.global, &version)?;
            Ok(ExitCode::Clean)
        }
    }
}

fn emit<T: Serialize>(global: &GlobalOpts, value: &T) -> Result<(), Error> {
    println!("{}", global.format.render(value)?);
    Ok(())
}

/// Print what was read; failed fields become warnings and exit code 1.
fn emit_partial<T: Serialize>(global: &GlobalOpts, partial: Partial<T>) -> Result<ExitCode, Error> {
    emit(global, &partial.value)?;
    if partial.errors.is_empty() {
        return Ok(ExitCode::Clean);
    }
    for err in partial.errors.errors() {
        warn!(code = err.code(), error = %err, "field unavailable");
    }
    Ok(ExitCode::Partial)
}

fn report_error(global: &GlobalOpts, err: &Error) {
    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Pretty => {
            eprintln!("{}", format_error_human(err, std::io::stderr().is_terminal()))
        }
    }
}
