//! TCP connection to the dedicated server console.
//!
//! [`Connection`] owns the socket for one client session. Connecting clones
//! the socket into a buffered [`LineReader`], handed to the reader loop, and a
//! buffered writer kept behind a lock for command dispatch. The `connected`
//! flag is the only signal the rest of the client uses to decide whether the
//! channel is usable.

use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::CONNECTION_TARGET;
use crate::errors::ConnectionError;
use crate::state::Observable;

/// Host and port of a server console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    host: String,
    port: u16,
}

impl ServerEndpoint {
    /// Builds an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, ConnectionError> {
        let addresses: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| ConnectionError::Resolve {
                endpoint: self.to_string(),
                source,
            })?
            .collect();
        if addresses.is_empty() {
            return Err(ConnectionError::ResolveEmpty {
                endpoint: self.to_string(),
            });
        }
        Ok(addresses)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

/// Blocking, line-oriented reader over the console socket.
#[derive(Debug)]
pub struct LineReader<R = TcpStream> {
    inner: BufReader<R>,
    buffer: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    /// Wraps a byte stream.
    pub fn new(stream: R) -> Self {
        Self {
            inner: BufReader::new(stream),
            buffer: Vec::new(),
        }
    }

    /// Reads one line including its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. A line that is not valid UTF-8
    /// is consumed and reported as [`io::ErrorKind::InvalidData`], so the
    /// next call continues with the following line.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        if self.inner.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        String::from_utf8(std::mem::take(&mut self.buffer))
            .map(Some)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }
}

struct SocketIo {
    socket: TcpStream,
    writer: BufWriter<TcpStream>,
}

/// Console connection shared between the UI context and the reader loop.
pub struct Connection {
    endpoint: ServerEndpoint,
    io: Mutex<Option<SocketIo>>,
    reader: Mutex<Option<LineReader>>,
    connected: Observable<bool>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connected())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a closed connection to `endpoint`.
    #[must_use]
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self {
            endpoint,
            io: Mutex::new(None),
            reader: Mutex::new(None),
            connected: Observable::new(false),
        }
    }

    /// Endpoint this connection targets.
    #[must_use]
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Opens the socket within `timeout`.
    ///
    /// Failures are logged and leave the connection closed; the return value
    /// mirrors [`Connection::connected`].
    pub fn connect(&self, timeout: Duration) -> bool {
        if self.connected() {
            debug!(target: CONNECTION_TARGET, endpoint = %self.endpoint, "already connected");
            return true;
        }
        match self.open(timeout) {
            Ok((io, reader)) => {
                *lock(&self.io) = Some(io);
                *lock(&self.reader) = Some(reader);
                self.connected.set(true);
                info!(
                    target: CONNECTION_TARGET,
                    endpoint = %self.endpoint,
                    "connected to server console"
                );
                true
            }
            Err(error) => {
                self.release();
                warn!(
                    target: CONNECTION_TARGET,
                    endpoint = %self.endpoint,
                    %error,
                    "failed to connect to server console"
                );
                false
            }
        }
    }

    fn open(&self, timeout: Duration) -> Result<(SocketIo, LineReader), ConnectionError> {
        let socket = self.connect_any(timeout)?;
        if let Err(error) = socket.set_nodelay(true) {
            debug!(target: CONNECTION_TARGET, %error, "failed to set TCP_NODELAY");
        }
        let read_half = socket.try_clone().map_err(ConnectionError::Streams)?;
        let write_half = socket.try_clone().map_err(ConnectionError::Streams)?;
        Ok((
            SocketIo {
                socket,
                writer: BufWriter::new(write_half),
            },
            LineReader::new(read_half),
        ))
    }

    fn connect_any(&self, timeout: Duration) -> Result<TcpStream, ConnectionError> {
        let mut last_error = None;
        for address in self.endpoint.resolve()? {
            match TcpStream::connect_timeout(&address, timeout) {
                Ok(stream) => return Ok(stream),
                Err(source) => {
                    debug!(target: CONNECTION_TARGET, %address, error = %source, "connect attempt failed");
                    last_error = Some(source);
                }
            }
        }
        let source = last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses"));
        Err(ConnectionError::Connect {
            endpoint: self.endpoint.to_string(),
            source,
        })
    }

    /// Flushes and closes the socket.
    ///
    /// Shutting the socket down unblocks a reader waiting in
    /// [`LineReader::read_line`]. Safe to call when already closed.
    pub fn disconnect(&self) {
        if self.release() {
            info!(target: CONNECTION_TARGET, endpoint = %self.endpoint, "disconnected from server console");
        }
    }

    /// Records that the peer went away while reading.
    pub fn mark_lost(&self) {
        if self.release() {
            warn!(target: CONNECTION_TARGET, endpoint = %self.endpoint, "connection to server console lost");
        }
    }

    /// Tears down any open streams; returns whether a socket was open.
    fn release(&self) -> bool {
        let io = lock(&self.io).take();
        drop(lock(&self.reader).take());
        let was_open = io.is_some();
        if let Some(mut io) = io {
            if let Err(error) = io.writer.flush() {
                debug!(target: CONNECTION_TARGET, %error, "flush on close failed");
            }
            if let Err(error) = io.socket.shutdown(Shutdown::Both) {
                debug!(target: CONNECTION_TARGET, %error, "socket shutdown failed");
            }
        }
        self.connected.set(false);
        was_open
    }

    /// Hands the socket reader to the caller. Only the first call after a
    /// successful connect returns a reader.
    pub fn take_reader(&self) -> Option<LineReader> {
        lock(&self.reader).take()
    }

    /// Writes `text` followed by a newline and flushes.
    pub fn write_line(&self, text: &str) -> Result<(), ConnectionError> {
        let mut guard = lock(&self.io);
        let io = guard.as_mut().ok_or(ConnectionError::NotConnected)?;
        io.writer
            .write_all(text.as_bytes())
            .and_then(|()| io.writer.write_all(b"\n"))
            .and_then(|()| io.writer.flush())
            .map_err(ConnectionError::Write)
    }

    /// Whether the socket is open and usable.
    pub fn connected(&self) -> bool {
        self.connected.get()
    }

    /// Subscribes to connected/disconnected transitions.
    pub fn subscribe_connected(&self) -> Receiver<bool> {
        self.connected.subscribe()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;

    #[test]
    fn endpoint_displays_host_and_port() {
        assert_eq!(ServerEndpoint::new("10.0.0.1", 21003).to_string(), "10.0.0.1:21003");
    }

    #[test]
    fn reader_yields_lines_then_end_of_stream() {
        let mut reader = LineReader::new(Cursor::new(b"one\ntwo".to_vec()));
        assert_eq!(reader.read_line().ok().flatten().as_deref(), Some("one\n"));
        assert_eq!(reader.read_line().ok().flatten().as_deref(), Some("two"));
        assert!(matches!(reader.read_line(), Ok(None)));
    }

    #[test]
    fn invalid_utf8_line_is_skipped_not_fatal() {
        let mut reader = LineReader::new(Cursor::new(b"\xff\xfe\nok\n".to_vec()));
        let error = reader.read_line().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
        assert_eq!(reader.read_line().ok().flatten().as_deref(), Some("ok\n"));
    }

    #[test]
    fn write_while_closed_reports_not_connected() {
        let connection = Connection::new(ServerEndpoint::new("127.0.0.1", 1));
        let error = connection.write_line("mission").unwrap_err();
        assert!(matches!(error, ConnectionError::NotConnected));
    }

    #[test]
    fn connect_failure_leaves_connection_closed() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let connection = Connection::new(ServerEndpoint::new("127.0.0.1", port));
        assert!(!connection.connect(Duration::from_millis(500)));
        assert!(!connection.connected());
        assert!(connection.take_reader().is_none());
    }

    #[test]
    fn disconnect_twice_is_harmless() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let connection = Connection::new(ServerEndpoint::new("127.0.0.1", port));
        let transitions = connection.subscribe_connected();

        assert!(connection.connect(Duration::from_secs(2)));
        let _peer = listener.accept().expect("accept");
        connection.disconnect();
        connection.disconnect();

        assert!(!connection.connected());
        let seen: Vec<bool> = transitions.try_iter().collect();
        assert_eq!(seen, vec![true, false]);
    }
}
