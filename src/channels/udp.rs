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
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use log::debug;

use crate::channels::core::{get_addr, ChannelStats, OutputChannel, SocketStats};
use crate::types::MetricResult;

/// Implementation of an `OutputChannel` that sends metrics over UDP.
///
/// Each metric is sent as a single datagram when `.send()` is called, in the
/// thread of the caller. Delivery is best-effort: a failure to write to the
/// socket is logged, counted as dropped, and never reported to the caller.
#[derive(Debug)]
pub struct UdpOutputChannel {
    addr: SocketAddr,
    socket: UdpSocket,
    stats: SocketStats,
}

impl UdpOutputChannel {
    /// Construct a new `UdpOutputChannel` using an existing socket.
    ///
    /// The socket should already be bound to a local address with any
    /// desired configuration applied (blocking vs non-blocking, etc.).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::net::UdpSocket;
    /// use statsline::{UdpOutputChannel, DEFAULT_PORT};
    ///
    /// let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    /// socket.set_nonblocking(true).unwrap();
    /// let host = ("metrics.example.com", DEFAULT_PORT);
    /// let channel = UdpOutputChannel::from(host, socket);
    /// ```
    ///
    /// # Failures
    ///
    /// This method may fail if:
    ///
    /// * It is unable to resolve the hostname of the metric server.
    /// * The host address is otherwise unable to be parsed
    pub fn from<A>(to_addr: A, socket: UdpSocket) -> MetricResult<UdpOutputChannel>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        Ok(UdpOutputChannel {
            addr,
            socket,
            stats: SocketStats::default(),
        })
    }

    /// Resolve the server address and bind a non-blocking socket of the
    /// matching address family to an ephemeral local port.
    pub fn bind<A>(to_addr: A) -> MetricResult<UdpOutputChannel>
    where
        A: ToSocketAddrs,
    {
        let addr = get_addr(to_addr)?;
        let local = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;

        Ok(UdpOutputChannel {
            addr,
            socket,
            stats: SocketStats::default(),
        })
    }
}

impl OutputChannel for UdpOutputChannel {
    fn send(&self, line: &str) -> io::Result<usize> {
        let res = self.socket.send_to(line.as_bytes(), self.addr);
        match self.stats.update(res, line.len()) {
            Ok(written) => Ok(written),
            Err(e) => {
                debug!("dropped metric sent to {}: {}", self.addr, e);
                Ok(0)
            }
        }
    }

    fn stats(&self) -> ChannelStats {
        ChannelStats::from(&self.stats)
    }
}
