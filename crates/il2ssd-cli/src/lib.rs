//! Command-line runtime for the IL-2 dedicated server console client.
//!
//! Splits configuration flags from the command, loads [`Config`] through
//! `ortho_config`, initialises telemetry and runs the requested command
//! against the server console. IO streams and the configuration loader are
//! injectable so the runtime can be exercised from tests.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use il2ssd_config::Config;

mod cli;
mod config;
mod console;
mod errors;
mod session;

use cli::{Cli, CliCommand};
use config::{command_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use session::Session;

/// Runs the CLI with the given arguments and streams.
#[must_use]
pub fn run<I, R, W, E>(args: I, input: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read + Send + 'static,
    W: Write,
    E: Write,
{
    run_with_loader(args, input, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    input: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read + Send + 'static,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let result = Cli::try_parse_from(command_arguments(&args, &split))
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            let config = loader.load(&split.config_arguments)?;
            let telemetry = il2ssd_console::telemetry::initialise(&config)?;
            tracing::debug!(format = %telemetry.format(), "telemetry ready");
            execute(cli.command, &config, input, stdout, stderr)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<R, W, E>(
    command: CliCommand,
    config: &Config,
    input: R,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<(), AppError>
where
    R: Read + Send + 'static,
    W: Write,
    E: Write,
{
    match command {
        CliCommand::Console => console::run_console(config, input, stdout, stderr),
        CliCommand::Status => Session::open(config)?.status(stdout),
        CliCommand::Load { path } => {
            let path = match path {
                Some(path) => path,
                None => config.mission_load_path()?,
            };
            if path.trim().is_empty() {
                return Err(AppError::MissingMission);
            }
            Session::open(config)?.load(&path, stdout)
        }
        CliCommand::Stop => Session::open(config)?.stop(stdout),
        CliCommand::Next => {
            if config.cycle.is_empty() {
                return Err(AppError::EmptyCycle);
            }
            Session::open(config)?.next(&config.cycle, stdout)
        }
    }
}
