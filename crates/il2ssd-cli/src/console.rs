//! Interactive console mode.
//!
//! A helper thread forwards stdin lines over a channel; this thread owns the
//! output streams and pumps display text, state changes and operator input
//! until the operator quits, input ends, or the server goes away.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, select, unbounded};
use il2ssd_config::Config;
use il2ssd_console::{ConsoleClient, ConsoleSink, MissionStatus};

use crate::AppError;

const QUIT: &str = "quit";
const CLEAR: &str = "clear";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// What the operator typed, after local commands are recognised.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Clear,
    Skip,
    Send(&'a str),
}

fn interpret(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => Input::Skip,
        QUIT => Input::Quit,
        CLEAR => Input::Clear,
        _ => Input::Send(trimmed),
    }
}

fn spawn_input<R>(input: R) -> Result<Receiver<std::io::Result<String>>, AppError>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = unbounded();
    thread::Builder::new()
        .name(String::from("il2ssd-input"))
        .spawn(move || {
            for line in BufReader::new(input).lines() {
                if sender.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(AppError::Input)?;
    Ok(receiver)
}

/// Runs the interactive console until it ends.
pub(crate) fn run_console<R, W, E>(
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
    let (sender, display) = unbounded::<String>();
    let sink: Arc<dyn ConsoleSink> = Arc::new(sender);
    let client = ConsoleClient::from_config(config, sink);
    let connected = client.subscribe_connected();
    let status = client.mission().subscribe_status();

    if !client.connect() {
        return Err(AppError::Connect {
            endpoint: client.connection().endpoint().to_string(),
        });
    }
    writeln!(stderr, "connected to {}", client.connection().endpoint())?;
    let lines = spawn_input(input)?;

    let outcome = pump(&client, &lines, &display, &connected, &status, stdout, stderr);
    client.disconnect();
    // Text that arrived before the socket closed is still shown.
    for line in display.try_iter() {
        writeln!(stdout, "{line}")?;
    }
    outcome
}

fn pump<W: Write, E: Write>(
    client: &ConsoleClient,
    lines: &Receiver<std::io::Result<String>>,
    display: &Receiver<String>,
    connected: &Receiver<bool>,
    status: &Receiver<MissionStatus>,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<(), AppError> {
    loop {
        select! {
            recv(display) -> line => {
                if let Ok(line) = line {
                    writeln!(stdout, "{line}")?;
                }
            }
            recv(status) -> change => {
                if let Ok(change) = change {
                    report_status(client, change, stderr)?;
                }
            }
            recv(connected) -> change => {
                if matches!(change, Ok(false) | Err(_)) {
                    writeln!(stderr, "connection to server console lost")?;
                    return Ok(());
                }
            }
            recv(lines) -> line => {
                let line = match line {
                    Ok(line) => line.map_err(AppError::Input)?,
                    Err(_) => return Ok(()),
                };
                match interpret(&line) {
                    Input::Quit => return Ok(()),
                    Input::Clear => write!(stdout, "{CLEAR_SCREEN}")?,
                    Input::Skip => {}
                    Input::Send(text) => {
                        if !client.commands().send_command(text) {
                            writeln!(stderr, "not sent: {text}")?;
                        }
                    }
                }
                stdout.flush()?;
            }
        }
    }
}

fn report_status<E: Write>(
    client: &ConsoleClient,
    status: MissionStatus,
    stderr: &mut E,
) -> Result<(), AppError> {
    match status {
        MissionStatus::Loaded => {
            writeln!(stderr, "[mission {} running]", client.mission().name())?;
        }
        MissionStatus::NotLoaded => writeln!(stderr, "[no mission running]")?,
        MissionStatus::Unknown => {}
    }
    Ok(())
}
