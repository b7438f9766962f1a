//! Fake dedicated server console for session tests.
//!
//! Accepts a single connection on an ephemeral port, records every command
//! line it receives, and answers through a caller-supplied responder.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::Receiver;

/// Upper bound for waiting on asynchronous effects.
pub const WAIT: Duration = Duration::from_secs(2);

/// What the fake console does after receiving a command.
pub enum Reply {
    /// Writes each line, adding a trailing newline.
    Lines(Vec<String>),
    /// Writes the bytes exactly as given.
    Raw(Vec<u8>),
    /// Closes the connection without answering.
    Close,
}

impl Reply {
    pub fn none() -> Self {
        Self::Lines(Vec::new())
    }

    pub fn line(text: &str) -> Self {
        Self::Lines(vec![text.to_string()])
    }
}

pub struct FakeConsole {
    port: u16,
    received: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeConsole {
    pub fn spawn<F>(responder: F) -> Result<Self>
    where
        F: FnMut(&str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake console")?;
        listener
            .set_nonblocking(true)
            .context("fake console nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);
        let handle = thread::spawn(move || serve(listener, responder, &log));
        Ok(Self {
            port,
            received,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the client to hang up and returns the commands received.
    pub fn finish(mut self) -> Result<Vec<String>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake console thread panicked"))??;
        }
        let received = self
            .received
            .lock()
            .map_err(|error| anyhow!("lock received commands: {error}"))?;
        Ok(received.clone())
    }
}

impl Drop for FakeConsole {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve<F>(listener: TcpListener, mut responder: F, received: &Mutex<Vec<String>>) -> Result<()>
where
    F: FnMut(&str) -> Reply,
{
    let Some(stream) = accept(&listener)? else {
        return Ok(());
    };
    stream
        .set_nonblocking(false)
        .context("fake console blocking stream")?;
    let mut writer = stream.try_clone().context("clone stream")?;
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) if error.kind() == io::ErrorKind::ConnectionReset => break,
            Err(error) => return Err(error).context("read command"),
        };
        let command = line.trim_end_matches('\r').to_string();
        received
            .lock()
            .map_err(|error| anyhow!("lock received commands: {error}"))?
            .push(command.clone());
        match responder(&command) {
            Reply::Lines(lines) => {
                for text in lines {
                    writer
                        .write_all(format!("{text}\n").as_bytes())
                        .context("write reply")?;
                }
                writer.flush().context("flush reply")?;
            }
            Reply::Raw(bytes) => {
                writer.write_all(&bytes).context("write raw reply")?;
                writer.flush().context("flush reply")?;
            }
            Reply::Close => return Ok(()),
        }
    }
    Ok(())
}

fn accept(listener: &TcpListener) -> Result<Option<TcpStream>> {
    let deadline = Instant::now() + WAIT;
    loop {
        match listener.accept() {
            Ok((stream, _)) => return Ok(Some(stream)),
            Err(ref error)
                if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
            {
                thread::sleep(Duration::from_millis(10));
            }
            // No client showed up; end quietly so the test does not hang.
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(error) => return Err(error).context("accept connection"),
        }
    }
}

/// Receives the next value or fails after [`WAIT`].
pub fn next<T>(receiver: &Receiver<T>) -> Result<T> {
    receiver
        .recv_timeout(WAIT)
        .context("timed out waiting for a change")
}

/// Receives values until one satisfies `accept`, failing after [`WAIT`].
pub fn wait_for<T>(receiver: &Receiver<T>, accept: impl Fn(&T) -> bool) -> Result<T> {
    let deadline = Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let value = receiver
            .recv_timeout(remaining)
            .context("timed out waiting for an expected value")?;
        if accept(&value) {
            return Ok(value);
        }
    }
}
