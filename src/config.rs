// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::time::Duration;

use crate::DEFAULT_PORT;

// Default number of times the TCP output channel will reconnect and
// resend a metric before giving up and returning the error to callers.
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

// Default connect and write timeout for the TCP output channel.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport used to send metrics to the Statsd server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transport {
    /// Connectionless, best-effort delivery. This is what most Statsd
    /// servers expect and is the recommended choice.
    #[default]
    Udp,
    /// Persistent stream connection, reconnecting according to a `RetryPolicy`.
    Tcp,
}

/// Policy for reconnecting and resending a metric when a write to a TCP
/// connection fails.
///
/// When enabled, the metric is resent over a fresh connection up to
/// `max_attempts` more times before the error is returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Reconnect and resend up to `max_attempts` times.
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            enabled: true,
            max_attempts,
        }
    }

    /// Never reconnect, return the first error encountered.
    pub fn disabled() -> Self {
        RetryPolicy {
            enabled: false,
            max_attempts: 0,
        }
    }

    /// Should another attempt be made after `attempt` retries have already failed?
    pub(crate) fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_RETRY_ATTEMPTS)
    }
}

/// Settings used to construct a `StatsdClient` and its output channel.
///
/// All settings are consumed once when the client is created. Most callers
/// will want to use `StatsdClient::builder` instead of creating this struct
/// directly.
///
/// # Example
///
/// ```
/// use statsline::{ClientConfig, StatsdClient, Transport};
///
/// let config = ClientConfig {
///     host: "127.0.0.1".to_string(),
///     transport: Transport::Udp,
///     prefix: "my.service".to_string(),
///     ..ClientConfig::default()
/// };
///
/// let client = StatsdClient::from_config(config).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub transport: Transport,
    /// Prepended to every metric name, separated by a `.`.
    pub prefix: String,
    /// Appended to every metric name, separated by a `.`.
    pub postfix: String,
    /// Reconnect behavior, TCP only.
    pub retry: RetryPolicy,
    /// Connect and write timeout, TCP only.
    pub timeout: Option<Duration>,
    /// Return errors creating the output channel instead of falling back to
    /// a channel that discards all metrics.
    pub rethrow_on_error: bool,
    /// When set, metrics are handed to a background thread through a queue
    /// holding at most this many lines, so a slow or reconnecting channel
    /// never blocks callers. Sending fails while the queue is full.
    pub queue_capacity: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            transport: Transport::default(),
            prefix: String::new(),
            postfix: String::new(),
            retry: RetryPolicy::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            rethrow_on_error: false,
            queue_capacity: None,
        }
    }
}

/// Normalize a prefix so that it can be written directly before a metric
/// name: no trailing dots in what was given and exactly one `.` separator.
pub(crate) fn formatted_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}.", trimmed)
    }
}

/// Normalize a postfix so that it can be written directly after a metric
/// name: no trailing dots and exactly one leading `.` separator.
pub(crate) fn formatted_postfix(postfix: &str) -> String {
    let trimmed = postfix.trim_end_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{}", trimmed)
    }
}
