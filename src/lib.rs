// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A Statsd client for Rust with UDP and TCP output channels.
//!
//! ## Features
//!
//! * Counters, timers, gauges, and sets as defined by Statsd, plus the raw
//!   and calendargram extensions understood by statsd.net style servers.
//! * UDP (the default) or TCP transport, with reconnect and retry for TCP.
//! * Prefixes and postfixes applied to every metric name.
//! * Support for alternate backends via the `OutputChannel` trait.
//! * A client that keeps working, and discards metrics, when the server
//!   address is bad, unless asked to report the error instead.
//!
//! ## Install
//!
//! ```toml
//! [dependencies]
//! statsline = "x.y.z"
//! ```
//!
//! ## Usage
//!
//! ### Simple Use
//!
//! Create a client that sends to some metrics server over UDP and send a
//! few metrics. Every method validates its input and returns the exact
//! metric that was sent.
//!
//! ```rust,no_run
//! use statsline::prelude::*;
//! use statsline::{CalendarPeriod, StatsdClient, DEFAULT_PORT};
//!
//! let client = StatsdClient::builder("metrics.example.com", DEFAULT_PORT)
//!     .with_prefix("my.service")
//!     .build()
//!     .unwrap();
//!
//! client.incr("some.counter").unwrap();
//! client.time("some.method.call", 42).unwrap();
//! client.gauge("some.thing", 7).unwrap();
//! client.set("some.users", 1234).unwrap();
//! client.raw_with_epoch("some.raw", 12934, 1380000000).unwrap();
//! client.calendargram("some.logins", "user42", CalendarPeriod::Day.as_str()).unwrap();
//! ```
//!
//! ### TCP
//!
//! Over TCP, each metric is written as a `\n` terminated line to a connection
//! that is opened on the first send and reopened when a write fails. A failed
//! write is retried according to the `RetryPolicy`.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use statsline::prelude::*;
//! use statsline::{RetryPolicy, StatsdClient, Transport, DEFAULT_PORT};
//!
//! let client = StatsdClient::builder("metrics.example.com", DEFAULT_PORT)
//!     .with_transport(Transport::Tcp)
//!     .with_retry(RetryPolicy::new(5))
//!     .with_timeout(Duration::from_secs(2))
//!     .build()
//!     .unwrap();
//!
//! client.count("requests", 1).unwrap();
//! ```
//!
//! ### Queuing Output Channel
//!
//! Writes to a TCP connection that is reconnecting can block. To move the
//! network work off the calling thread, wrap any channel in a
//! `QueuingOutputChannel` and give it to the client directly.
//!
//! ```rust,no_run
//! use statsline::prelude::*;
//! use statsline::{QueuingOutputChannel, RetryPolicy, StatsdClient, TcpOutputChannel, DEFAULT_PORT};
//!
//! let tcp = TcpOutputChannel::new(("metrics.example.com", DEFAULT_PORT), RetryPolicy::default(), None).unwrap();
//! let client = StatsdClient::from_channel("my.prefix", QueuingOutputChannel::from(tcp));
//!
//! client.count("my.counter.thing", 29).unwrap();
//! ```
//!
//! ### Failures
//!
//! If the output channel can't be created, because the host is empty or
//! can't be resolved, a warning is logged through the `log` crate and the
//! client silently discards everything sent through it. Use
//! `with_rethrow_on_error(true)` to get the error instead.
//!
//! ```rust
//! use statsline::prelude::*;
//! use statsline::{ErrorKind, StatsdClient};
//!
//! let client = StatsdClient::builder("", 8125).build().unwrap();
//! assert!(client.count("some.counter", 1).is_ok());
//!
//! let res = StatsdClient::builder("", 8125).with_rethrow_on_error(true).build();
//! assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());
//! ```
//!
//! ### Custom Output Channels
//!
//! Anything implementing `OutputChannel` can be used by the client.
//!
//! ```rust
//! use std::io;
//! use statsline::prelude::*;
//! use statsline::{OutputChannel, StatsdClient};
//!
//! struct StdoutChannel;
//!
//! impl OutputChannel for StdoutChannel {
//!     fn send(&self, line: &str) -> io::Result<usize> {
//!         println!("{}", line);
//!         Ok(line.len())
//!     }
//! }
//!
//! let client = StatsdClient::from_channel("my.prefix", StdoutChannel);
//! client.count("my.counter.thing", 42).unwrap();
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_PORT: u16 = 8125;

pub use self::channels::{
    ChannelStats, NullOutputChannel, OutputChannel, QueuingOutputChannel, SpyOutputChannel, TcpOutputChannel,
    UdpOutputChannel,
};

pub use self::client::{
    CalendarPeriod, Calendared, Counted, CountedExt, Gauged, MetricClient, Recorded, Setted, StatsdClient,
    StatsdClientBuilder, Timed,
};

pub use self::config::{ClientConfig, RetryPolicy, Transport};

pub use self::types::{
    Calendargram, Counter, ErrorKind, Gauge, Metric, MetricError, MetricResult, Raw, Set, Timer,
};

mod builder;
mod channels;
mod client;
mod config;
pub mod ext;
pub mod prelude;
mod types;


mod sealed {
    pub trait Sealed {}
}
