// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{debug, warn};

use crate::channels::core::{get_addr, ChannelStats, OutputChannel, SocketStats};
use crate::config::RetryPolicy;
use crate::types::MetricResult;

/// Implementation of an `OutputChannel` that sends metrics over a persistent
/// TCP connection.
///
/// Each metric is written followed by a `\n` so the server can split the
/// stream back into lines. The connection is opened on the first send and
/// reused after that. When a write fails the connection is discarded and,
/// if the retry policy allows it, a fresh connection is opened and the same
/// metric is written again. Once retries are exhausted the last error is
/// returned to the caller. A connection closed by the server is noticed
/// before the next write and replaced, counting as a reconnect.
///
/// Writes are serialized by a mutex so a line is never interleaved with
/// another line sent from a different thread.
#[derive(Debug)]
pub struct TcpOutputChannel {
    addr: SocketAddr,
    retry: RetryPolicy,
    timeout: Option<Duration>,
    stream: Mutex<Option<TcpStream>>,
    stats: SocketStats,
}

impl TcpOutputChannel {
    /// Construct a new `TcpOutputChannel` that will connect to the given
    /// address the first time a metric is sent.
    ///
    /// The timeout, if any, applies both to establishing a connection and to
    /// each write.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use statsline::{RetryPolicy, TcpOutputChannel, DEFAULT_PORT};
    ///
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let channel = TcpOutputChannel::new(host, RetryPolicy::new(3), Some(Duration::from_secs(5)));
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn new<A>(to_addr: A, retry: RetryPolicy, timeout: Option<Duration>) -> MetricResult<TcpOutputChannel>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        Ok(TcpOutputChannel {
            addr,
            retry,
            timeout,
            stream: Mutex::new(None),
            stats: SocketStats::default(),
        })
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let stream = match self.timeout {
            Some(t) => TcpStream::connect_timeout(&self.addr, t)?,
            None => TcpStream::connect(self.addr)?,
        };

        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn write_line(&self, conn: &mut Option<TcpStream>, buf: &[u8]) -> io::Result<usize> {
        // A write to a connection the server already closed still succeeds
        // locally, so the line would be lost without an error.
        if conn.as_ref().map_or(false, peer_closed) {
            *conn = None;
            self.stats.incr_reconnects();
            debug!("connection to {} closed by server, reconnecting", self.addr);
        }

        if conn.is_none() {
            *conn = Some(self.connect()?);
        }

        match conn.as_mut() {
            Some(stream) => stream.write_all(buf).map(|_| buf.len()),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "no connection")),
        }
    }
}

/// Has the server closed its end of the connection, or reset it?
fn peer_closed(stream: &TcpStream) -> bool {
    let mut buf = [0u8; 1];
    if stream.set_nonblocking(true).is_err() {
        return true;
    }

    let closed = match stream.peek(&mut buf) {
        Ok(0) => true,
        Ok(_) => false,
        Err(e) => e.kind() != io::ErrorKind::WouldBlock,
    };

    closed || stream.set_nonblocking(false).is_err()
}

impl OutputChannel for TcpOutputChannel {
    fn send(&self, line: &str) -> io::Result<usize> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut conn = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        let mut attempt = 0;

        loop {
            match self.write_line(&mut conn, &buf) {
                Ok(written) => return self.stats.update(Ok(written), buf.len()),
                Err(e) => {
                    *conn = None;

                    if !self.retry.should_retry(attempt) {
                        debug!("unable to send metric to {} after {} retries: {}", self.addr, attempt, e);
                        return self.stats.update(Err(e), buf.len());
                    }

                    attempt += 1;
                    self.stats.incr_reconnects();
                    warn!(
                        "error writing to {}, reconnecting ({} of {}): {}",
                        self.addr, attempt, self.retry.max_attempts, e
                    );
                }
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        let mut conn = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        match conn.as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }

    fn stats(&self) -> ChannelStats {
        ChannelStats::from(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::TcpOutputChannel;
    use crate::channels::core::OutputChannel;
    use crate::config::RetryPolicy;
    use std::io::{BufRead, BufReader};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    const TIMEOUT: Option<Duration> = Some(Duration::from_secs(5));

    // Bind a listener to find a free port and then close it so that
    // connections to the port are refused.
    fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    }

    #[test]
    fn test_tcp_output_channel_writes_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            BufReader::new(stream)
                .lines()
                .take(2)
                .map(|l| l.unwrap())
                .collect::<Vec<String>>()
        });

        let channel = TcpOutputChannel::new(addr, RetryPolicy::default(), TIMEOUT).unwrap();
        assert_eq!(9, channel.send("foo:54|c").unwrap());
        assert_eq!(9, channel.send("foo:67|c").unwrap());
        channel.flush().unwrap();

        let lines = reader.join().unwrap();
        assert_eq!(vec!["foo:54|c".to_string(), "foo:67|c".to_string()], lines);

        let stats = channel.stats();
        assert_eq!(18, stats.bytes_sent);
        assert_eq!(2, stats.packets_sent);
        assert_eq!(0, stats.reconnects);
    }

    #[test]
    fn test_tcp_output_channel_reconnects_after_server_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = mpsc::channel();

        let reader = thread::spawn(move || {
            let (first, _) = listener.accept().unwrap();
            let mut line = String::new();
            BufReader::new(first).read_line(&mut line).unwrap();
            closed_tx.send(()).unwrap();

            let (second, _) = listener.accept().unwrap();
            let mut lines = vec![line.trim_end().to_string()];
            lines.extend(BufReader::new(second).lines().take(2).map(|l| l.unwrap()));
            lines
        });

        let channel = TcpOutputChannel::new(addr, RetryPolicy::default(), TIMEOUT).unwrap();
        channel.send("a:1|c").unwrap();
        closed_rx.recv().unwrap();
        thread::sleep(Duration::from_millis(100));
        channel.send("b:1|c").unwrap();
        channel.send("c:1|c").unwrap();

        let lines = reader.join().unwrap();
        assert_eq!(vec!["a:1|c", "b:1|c", "c:1|c"], lines);

        let stats = channel.stats();
        assert_eq!(3, stats.packets_sent);
        assert_eq!(1, stats.reconnects);
    }

    #[test]
    fn test_tcp_output_channel_connection_refused_no_retry() {
        let channel = TcpOutputChannel::new(closed_addr(), RetryPolicy::disabled(), TIMEOUT).unwrap();

        assert!(channel.send("foo:1|c").is_err());

        let stats = channel.stats();
        assert_eq!(0, stats.reconnects);
        assert_eq!(1, stats.packets_dropped);
        assert_eq!(8, stats.bytes_dropped);
    }

    #[test]
    fn test_tcp_output_channel_connection_refused_with_retry() {
        let channel = TcpOutputChannel::new(closed_addr(), RetryPolicy::new(2), TIMEOUT).unwrap();

        assert!(channel.send("foo:1|c").is_err());
        assert!(channel.send("foo:2|c").is_err());

        let stats = channel.stats();
        assert_eq!(4, stats.reconnects);
        assert_eq!(2, stats.packets_dropped);
    }

    #[test]
    fn test_tcp_output_channel_flush_without_connection() {
        let channel = TcpOutputChannel::new(closed_addr(), RetryPolicy::disabled(), TIMEOUT).unwrap();
        assert!(channel.flush().is_ok());
    }

    #[test]
    fn test_tcp_output_channel_bad_address() {
        let res = TcpOutputChannel::new("not a host name", RetryPolicy::default(), TIMEOUT);
        assert!(res.is_err());
    }
}
