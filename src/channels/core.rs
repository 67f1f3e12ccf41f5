// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{ErrorKind, MetricError, MetricResult};

/// Attempt to convert anything implementing the `ToSocketAddrs` trait
/// into a concrete `SocketAddr` instance, returning an `InvalidInput`
/// error if the address could not be parsed.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn get_addr<A: ToSocketAddrs>(addr: A) -> MetricResult<SocketAddr> {
    match addr.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(MetricError::from((
            ErrorKind::InvalidInput,
            "No socket addresses yielded",
        ))),
    }
}

/// I/O telemetry reported by an output channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
    pub reconnects: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SocketStats {
    bytes_sent: Arc<AtomicU64>,
    packets_sent: Arc<AtomicU64>,
    bytes_dropped: Arc<AtomicU64>,
    packets_dropped: Arc<AtomicU64>,
    reconnects: Arc<AtomicU64>,
}

impl SocketStats {
    fn incr_bytes_sent(&self, n: u64) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    fn incr_packets_sent(&self) {
        self.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn incr_bytes_dropped(&self, n: u64) {
        self.bytes_dropped.fetch_add(n, Ordering::Relaxed);
    }

    fn incr_packets_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn incr_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn update(&self, res: io::Result<usize>, len: usize) -> io::Result<usize> {
        match res {
            Ok(written) => {
                self.incr_bytes_sent(written as u64);
                self.incr_packets_sent();
                Ok(written)
            }
            Err(e) => {
                self.incr_bytes_dropped(len as u64);
                self.incr_packets_dropped();
                Err(e)
            }
        }
    }
}

impl From<&SocketStats> for ChannelStats {
    fn from(stats: &SocketStats) -> Self {
        ChannelStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
            reconnects: stats.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Trait for the various ways of getting a Statsd line to a server.
///
/// The line will be in the canonical format to be sent to a Statsd server
/// and will not include a trailing newline. Channels that need a line
/// terminator on the wire (such as TCP) add it themselves. Examples of each
/// supported metric type are given below.
///
/// ## Counter
///
/// ``` text
/// some.counter:123|c
/// ```
///
/// ## Timer
///
/// ``` text
/// some.timer:456|ms
/// ```
///
/// ## Gauge
///
/// ``` text
/// some.gauge:5|g
/// ```
///
/// ## Set
///
/// ``` text
/// some.set:2|s
/// ```
///
/// ## Raw
///
/// ``` text
/// some.raw:12934|r|1380000000
/// ```
///
/// ## Calendargram
///
/// ``` text
/// some.logins:user42|cg|d
/// ```
///
/// Implementations must be safe to call from multiple threads at once: a
/// single channel is shared by every call made through a client.
pub trait OutputChannel {
    /// Send the Statsd line using this channel and return the number of bytes
    /// written or an I/O error.
    ///
    /// Note that implementations may return `0` bytes if the line was not
    /// written (such as when it is queued or intentionally discarded). Callers
    /// should *NOT* interpret this as an error.
    fn send(&self, line: &str) -> io::Result<usize>;

    /// Flush anything written but not yet delivered to the backend.
    ///
    /// The default implementation does nothing.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Return I/O telemetry like bytes / packets sent or dropped.
    ///
    /// Note that not all channels implement this method and the default
    /// implementation returns zeros.
    fn stats(&self) -> ChannelStats {
        ChannelStats::default()
    }
}

/// Implementation of an `OutputChannel` that discards all metrics.
///
/// Used when the configured transport could not be created or to disable
/// metric collection entirely.
#[derive(Debug, Clone, Default)]
pub struct NullOutputChannel;

impl OutputChannel for NullOutputChannel {
    fn send(&self, _line: &str) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{get_addr, ChannelStats, NullOutputChannel, OutputChannel, SocketStats};
    use std::io;

    #[test]
    fn test_null_output_channel() {
        let channel = NullOutputChannel;
        assert_eq!(0, channel.send("baz:4|c").unwrap());
        assert!(channel.flush().is_ok());
        assert_eq!(ChannelStats::default(), channel.stats());
    }

    #[test]
    fn test_get_addr_bad_address() {
        let res = get_addr("asdf");
        assert!(res.is_err());
    }

    #[test]
    fn test_get_addr_valid_address() {
        let res = get_addr("127.0.0.1:8125");
        assert!(res.is_ok());
    }

    #[test]
    fn test_socket_stats_update() {
        let stats = SocketStats::default();
        let _ = stats.update(Ok(8), 8);
        let _ = stats.update(Err(io::Error::new(io::ErrorKind::Other, "nope")), 5);
        stats.incr_reconnects();

        let snapshot = ChannelStats::from(&stats);
        assert_eq!(8, snapshot.bytes_sent);
        assert_eq!(1, snapshot.packets_sent);
        assert_eq!(5, snapshot.bytes_dropped);
        assert_eq!(1, snapshot.packets_dropped);
        assert_eq!(1, snapshot.reconnects);
    }
}
