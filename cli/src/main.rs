use std::{fs, io, path::PathBuf, process::ExitCode};

use clap::Parser;
use interpreter::{ExportError, Format};
use thiserror::Error;

mod config;
mod draw;
mod repl;

use config::{Config, ConfigError};
use repl::Session;

#[derive(Parser)]
#[command(name = "printcalc")]
#[command(about = "A printing calculator: every line and its result goes on the tape")]
#[command(version)]
struct Cli {
    /// Lines to evaluate, in order. Without lines or --file an interactive
    /// session starts.
    lines: Vec<String>,

    /// Read lines from a file, evaluated before any given as arguments
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write the tape to this file when done
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Export format: markdown, latex or plain. Guessed from the file
    /// extension when left out
    #[arg(long, requires = "export")]
    format: Option<Format>,

    /// Title placed at the top of the exported document
    #[arg(long)]
    title: Option<String>,

    /// JSON settings file
    #[arg(long, env = "PRINTCALC_CONFIG")]
    config: Option<PathBuf>,

    /// Print why a line failed next to its `error` marker
    #[arg(long)]
    details: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Logs go to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(EnvFilter::from_default_env())
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.show_error_details |= cli.details;
    if cli.title.is_some() {
        config.export.title = cli.title.clone();
    }
    let mut session = Session::new(config);

    let mut lines = Vec::new();
    if let Some(path) = &cli.file {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        lines.extend(text.lines().map(str::to_owned));
    }
    lines.extend(cli.lines.iter().cloned());

    if cli.file.is_none() && cli.lines.is_empty() {
        let stdin = io::stdin();
        repl::run(
            &mut session,
            stdin.lock(),
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )?;
    } else {
        for line in &lines {
            println!("{}", session.submit(line));
        }
    }

    if let Some(path) = &cli.export {
        session.export(path, cli.format)?;
        tracing::info!(path = %path.display(), "wrote tape");
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("printcalc: {err}");
            ExitCode::FAILURE
        }
    }
}
