//! Persistent eISCP session over TCP.
//!
//! A [`Session`] owns one TCP connection to the receiver and one background
//! reader task. The reader pushes every chunk it reads onto a bounded queue;
//! callers either fire a command and return ([`Session::send`]) or fire a
//! command and take the next chunk off the queue as its response
//! ([`Session::send_and_await`]).
//!
//! # Correlation
//!
//! eISCP has no request identifiers. A response is simply "the next frame
//! after the command was written", so the queue is drained immediately
//! before every write. The drain is best-effort: a frame the receiver emits
//! between the drain and the write (a front-panel change, for example) is
//! still taken as the response to the next query. This gap is inherent to
//! the protocol.
//!
//! Exchanges on one session are serialized: the queue lock is held from the
//! drain until the response (or timeout), so concurrent callers sharing a
//! session cannot interleave their commands and steal each other's replies.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::packet;
use crate::error::{EiscpError, EiscpResult};
use crate::protocol_constants::{
    CONNECT_TIMEOUT, INBOUND_QUEUE_CAPACITY, READ_BUFFER_SIZE, RESPONSE_TIMEOUT,
};

/// Timeouts applied by a [`Session`].
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Maximum time to establish the TCP connection.
    pub connect_timeout: Duration,
    /// Maximum time [`Session::send_and_await`] waits for a response.
    pub response_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            response_timeout: RESPONSE_TIMEOUT,
        }
    }
}

/// A connected eISCP session.
///
/// Dropping the session stops its reader task.
pub struct Session {
    addr: String,
    writer: Mutex<OwnedWriteHalf>,
    inbound: Mutex<mpsc::Receiver<Bytes>>,
    cancel: CancellationToken,
    response_timeout: Duration,
}

impl Session {
    /// Connects to `host:port` with the default timeouts.
    pub async fn connect(host: &str, port: u16) -> EiscpResult<Self> {
        Self::connect_with(host, port, SessionConfig::default()).await
    }

    /// Connects to `host:port` and starts the reader task.
    ///
    /// Fails with [`EiscpError::Connection`] if the receiver is unreachable
    /// or does not accept within `config.connect_timeout`.
    pub async fn connect_with(host: &str, port: u16, config: SessionConfig) -> EiscpResult<Self> {
        let addr = join_host_port(host, port);
        log::info!("[Session] Connecting to {}", addr);

        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| EiscpError::Connection {
                addr: addr.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no connection within {:?}", config.connect_timeout),
                ),
            })?
            .map_err(|source| EiscpError::Connection {
                addr: addr.clone(),
                source,
            })?;

        // Commands are tiny and latency-sensitive
        if let Err(e) = stream.set_nodelay(true) {
            log::warn!("[Session] Failed to set TCP_NODELAY on {}: {}", addr, e);
        }

        log::info!("[Session] Connected to {}", addr);
        Ok(Self::from_stream(stream, addr, config.response_timeout))
    }

    /// Wraps an already-connected stream.
    ///
    /// Must be called within a Tokio runtime, since it spawns the reader task.
    pub fn from_stream(stream: TcpStream, addr: String, response_timeout: Duration) -> Self {
        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();

        tokio::spawn(read_loop(reader, tx, cancel.clone(), addr.clone()));

        Self {
            addr,
            writer: Mutex::new(writer),
            inbound: Mutex::new(rx),
            cancel,
            response_timeout,
        }
    }

    /// Returns the `host:port` this session is connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Returns the response window used by [`Session::send_and_await`].
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Returns whether [`Session::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sends a command without waiting for a response.
    ///
    /// Pending inbound chunks are discarded before the write.
    pub async fn send(&self, command: &str) -> EiscpResult<()> {
        let mut inbound = self.inbound.lock().await;
        self.write_command(&mut inbound, command).await
    }

    /// Sends a command and returns the next inbound frame, decoded.
    ///
    /// Fails with [`EiscpError::Timeout`] if nothing arrives within the
    /// session's response window. The command may still have taken effect.
    pub async fn send_and_await(&self, command: &str) -> EiscpResult<String> {
        self.send_and_await_within(command, self.response_timeout)
            .await
    }

    /// Like [`Session::send_and_await`] with an explicit response window.
    pub async fn send_and_await_within(
        &self,
        command: &str,
        timeout: Duration,
    ) -> EiscpResult<String> {
        let mut inbound = self.inbound.lock().await;
        self.write_command(&mut inbound, command).await?;

        let chunk = tokio::select! {
            _ = self.cancel.cancelled() => return Err(EiscpError::Closed),
            res = tokio::time::timeout(timeout, inbound.recv()) => match res {
                Ok(Some(chunk)) => chunk,
                // Reader task has exited: the connection is gone
                Ok(None) => return Err(EiscpError::Closed),
                Err(_) => {
                    log::debug!("[Session] {} timed out after {:?}", command, timeout);
                    return Err(EiscpError::Timeout(timeout));
                }
            },
        };

        let response = packet::decode(&chunk);
        log::debug!("[Session] {} -> {}", command, response);
        Ok(response)
    }

    /// Closes the connection and stops the reader task.
    ///
    /// Every later operation fails with [`EiscpError::Closed`].
    pub async fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            log::debug!("[Session] Shutdown of {} failed: {}", self.addr, e);
        }
        log::info!("[Session] Closed connection to {}", self.addr);
    }

    async fn write_command(
        &self,
        inbound: &mut mpsc::Receiver<Bytes>,
        command: &str,
    ) -> EiscpResult<()> {
        if self.cancel.is_cancelled() {
            return Err(EiscpError::Closed);
        }

        let stale = drain(inbound);
        if stale > 0 {
            log::debug!(
                "[Session] Discarded {} stale chunk(s) before {}",
                stale,
                command
            );
        }

        let frame = packet::encode(command);
        tracing::trace!(addr = %self.addr, command, bytes = frame.len(), "sending frame");

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(|e| EiscpError::transport(format!("write of {} failed: {}", command, e)))?;
        writer
            .flush()
            .await
            .map_err(|e| EiscpError::transport(format!("flush of {} failed: {}", command, e)))?;

        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Discards everything currently queued without waiting.
fn drain(inbound: &mut mpsc::Receiver<Bytes>) -> usize {
    let mut count = 0;
    while inbound.try_recv().is_ok() {
        count += 1;
    }
    count
}

/// Reads chunks until the connection fails or the session is closed.
///
/// Dropping `tx` on exit closes the queue, which is how waiting callers
/// learn that the connection is gone. Never reconnects.
async fn read_loop(
    mut reader: OwnedReadHalf,
    tx: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
    addr: String,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            res = reader.read(&mut buf) => match res {
                Ok(0) => {
                    log::info!("[Session] {} closed the connection", addr);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    log::warn!("[Session] Read from {} failed: {}", addr, e);
                    break;
                }
            },
        };

        let chunk = Bytes::copy_from_slice(&buf[..n]);
        tracing::trace!(addr = %addr, bytes = n, payload_len = ?packet::payload_len(&chunk), "received chunk");

        // Applies backpressure to the socket when the queue is full
        tokio::select! {
            _ = cancel.cancelled() => break,
            res = tx.send(chunk) => if res.is_err() {
                break;
            },
        }
    }

    log::debug!("[Session] Reader for {} stopped", addr);
}

/// Formats `host:port`, bracketing bare IPv6 literals.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    use crate::protocol_constants::EISCP_HEADER_SIZE;

    /// Builds a frame the way the receiver sends it.
    fn device_frame(message: &str) -> Vec<u8> {
        let payload = format!("!1{}\x1a\r\n", message);
        let mut frame = Vec::new();
        frame.extend_from_slice(b"ISCP");
        frame.extend_from_slice(&16u32.to_be_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&[1, 0, 0, 0]);
        frame.extend_from_slice(payload.as_bytes());
        frame
    }

    /// Reads one complete frame written by the client, or `None` once the
    /// client has gone away.
    async fn try_read_frame(stream: &mut TcpStream) -> Option<String> {
        let mut header = [0u8; EISCP_HEADER_SIZE];
        stream.read_exact(&mut header).await.ok()?;
        let len = packet::payload_len(&header)? as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.ok()?;

        let mut frame = header.to_vec();
        frame.extend_from_slice(&payload);
        Some(packet::decode(&frame))
    }

    /// Reads one complete frame written by the client and returns its command.
    async fn read_frame(stream: &mut TcpStream) -> String {
        try_read_frame(stream).await.expect("client frame")
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_connection_error() {
        let (listener, port) = listener().await;
        drop(listener);

        let err = Session::connect("127.0.0.1", port)
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, EiscpError::Connection { .. }), "{err}");
    }

    #[tokio::test]
    async fn send_writes_encoded_frame() {
        let (listener, port) = listener().await;
        let device = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream).await
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        session.send("PWR01").await.unwrap();

        assert_eq!(device.await.unwrap(), "PWR01");
    }

    #[tokio::test]
    async fn send_and_await_returns_decoded_response() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let command = read_frame(&mut stream).await;
            assert_eq!(command, "MVLQSTN");
            stream.write_all(&device_frame("MVL1E")).await.unwrap();
            // Keep the connection open until the client is done
            let _ = read_frame(&mut stream).await;
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        let response = session.send_and_await("MVLQSTN").await.unwrap();

        assert_eq!(response, "MVL1E");
    }

    #[tokio::test]
    async fn send_and_await_times_out_when_device_is_silent() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = read_frame(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        let started = std::time::Instant::now();
        let err = session.send_and_await("SLIQSTN").await.unwrap_err();

        assert!(matches!(err, EiscpError::Timeout(d) if d == RESPONSE_TIMEOUT));
        assert!(started.elapsed() >= RESPONSE_TIMEOUT);
    }

    #[tokio::test]
    async fn stale_frames_are_drained_before_send() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Unsolicited status update before any query
            stream.write_all(&device_frame("SLI12")).await.unwrap();
            let command = read_frame(&mut stream).await;
            assert_eq!(command, "SLIQSTN");
            stream.write_all(&device_frame("SLI01")).await.unwrap();
            let _ = read_frame(&mut stream).await;
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let response = session.send_and_await("SLIQSTN").await.unwrap();
        assert_eq!(response, "SLI01");
    }

    #[tokio::test]
    async fn every_stale_chunk_is_drained_before_query() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.set_nodelay(true).unwrap();
            // Front-panel activity, one chunk each
            for status in ["SLI12", "MVL0A", "SWL-02", "PWR01"] {
                stream.write_all(&device_frame(status)).await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            let command = read_frame(&mut stream).await;
            assert_eq!(command, "MVLQSTN");
            stream.write_all(&device_frame("MVL1E")).await.unwrap();
            let _ = try_read_frame(&mut stream).await;
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(session.inbound.lock().await.len(), 4);

        let response = session.send_and_await("MVLQSTN").await.unwrap();

        assert_eq!(response, "MVL1E");
        assert!(session.inbound.lock().await.is_empty());
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure_without_stopping_reader() {
        let flood = INBOUND_QUEUE_CAPACITY + 50;
        let (listener, port) = listener().await;
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.set_nodelay(true).unwrap();
            for _ in 0..flood {
                stream.write_all(&device_frame("SLI12")).await.unwrap();
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            while let Some(command) = try_read_frame(&mut stream).await {
                let is_query = command == "SLIQSTN";
                let _ = seen_tx.send(command);
                if is_query && stream.write_all(&device_frame("SLI01")).await.is_err() {
                    break;
                }
            }
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();

        let mut queued = session.inbound.lock().await.len();
        for _ in 0..100 {
            if queued == INBOUND_QUEUE_CAPACITY {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            queued = session.inbound.lock().await.len();
        }
        assert_eq!(queued, INBOUND_QUEUE_CAPACITY);

        // The reader is parked on the full queue, not gone
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(session.inbound.lock().await.len(), INBOUND_QUEUE_CAPACITY);

        session.send("PWR01").await.unwrap();
        assert_eq!(seen_rx.recv().await.unwrap(), "PWR01");

        // Chunks still buffered in the socket surface after the drain; each
        // query drains them again until the device's own reply comes through.
        let mut response = session.send_and_await("SLIQSTN").await.unwrap();
        for _ in 0..4 {
            if response == "SLI01" {
                break;
            }
            response = session.send_and_await("SLIQSTN").await.unwrap();
        }
        assert_eq!(response, "SLI01");
    }

    #[tokio::test]
    async fn peer_disconnect_is_observed_by_next_query() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = session
            .send_and_await_within("PWRQSTN", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(
            matches!(err, EiscpError::Closed | EiscpError::Transport(_)),
            "{err}"
        );
    }

    #[tokio::test]
    async fn operations_fail_after_close() {
        let (listener, port) = listener().await;
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        });

        let session = Session::connect("127.0.0.1", port).await.unwrap();
        session.close().await;

        assert!(session.is_closed());
        assert!(matches!(
            session.send("PWR00").await,
            Err(EiscpError::Closed)
        ));
        assert!(matches!(
            session.send_and_await("PWRQSTN").await,
            Err(EiscpError::Closed)
        ));
    }

    #[test]
    fn join_host_port_brackets_ipv6() {
        assert_eq!(join_host_port("10.0.0.2", 60128), "10.0.0.2:60128");
        assert_eq!(join_host_port("::1", 60128), "[::1]:60128");
        assert_eq!(join_host_port("receiver.local", 1), "receiver.local:1");
    }
}
