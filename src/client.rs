// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::panic::RefUnwindSafe;
use std::time::Duration;

use log::warn;

use crate::builder::{MetricFormatter, MetricValue};
use crate::channels::{NullOutputChannel, OutputChannel, QueuingOutputChannel, TcpOutputChannel, UdpOutputChannel};
use crate::config::{formatted_postfix, formatted_prefix, ClientConfig, RetryPolicy, Transport};
use crate::sealed::Sealed;
use crate::types::{
    Calendargram, Counter, ErrorKind, Gauge, Metric, MetricError, MetricResult, Raw, Set, Timer,
};

fn non_negative(value: i64, desc: &'static str) -> MetricResult<MetricValue> {
    if value < 0 {
        Err(MetricError::from((ErrorKind::InvalidInput, desc)))
    } else {
        Ok(MetricValue::Unsigned(value as u64))
    }
}

/// Conversion trait for valid values for counters
///
/// This trait must be implemented for any types that are used as counter
/// values (currently only `i64`). This trait is internal to how values are
/// formatted as part of metrics but is exposed publicly for documentation
/// purposes.
pub trait ToCounterValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCounterValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "counter values must not be negative")
    }
}

/// Conversion trait for valid values for timers
///
/// Timers accept a number of milliseconds as an `i64` or a `Duration`,
/// which is truncated to whole milliseconds.
pub trait ToTimerValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToTimerValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "timer values must not be negative")
    }
}

impl ToTimerValue for Duration {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        let as_millis = self.as_millis();
        if as_millis > u64::MAX as u128 {
            Err(MetricError::from((ErrorKind::InvalidInput, "u64 overflow")))
        } else {
            Ok(MetricValue::Unsigned(as_millis as u64))
        }
    }
}

/// Conversion trait for valid values for gauges
pub trait ToGaugeValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToGaugeValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "gauge values must not be negative")
    }
}

/// Conversion trait for valid values for sets
pub trait ToSetValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToSetValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "set values must not be negative")
    }
}

/// Conversion trait for valid values for raw metrics
pub trait ToRawValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToRawValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "raw values must not be negative")
    }
}

/// Conversion trait for valid values for calendargrams
///
/// Calendargrams count occurrences of distinct values so, in addition to
/// non-negative integers, any string without a `\n` or `|` is accepted and
/// sent verbatim.
pub trait ToCalendargramValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCalendargramValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        non_negative(self, "calendargram values must not be negative")
    }
}

impl ToCalendargramValue for &str {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        valid_token(self, "calendargram values must not contain '\\n' or '|'")?;
        Ok(MetricValue::Text(self.to_string()))
    }
}

impl ToCalendargramValue for String {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        valid_token(&self, "calendargram values must not contain '\\n' or '|'")?;
        Ok(MetricValue::Text(self))
    }
}

/// Trait for incrementing counters.
///
/// Counters are simple values incremented by a client. The rates at which
/// these events occur or average values will be determined by the server
/// receiving them. Examples of counter uses include number of logins to a
/// system or requests received.
///
/// The following types are valid for counters:
/// * `i64`, which must not be negative
///
/// See the [Statsd spec](https://github.com/b/statsd_spec) for more
/// information.
pub trait Counted<T>
where
    T: ToCounterValue,
{
    /// Increment the counter by the given amount
    fn count(&self, key: &str, count: T) -> MetricResult<Counter>;
}

/// Trait for convenience methods for counters
///
/// This trait specifically implements increment and is automatically
/// implemented for any client that can count with an `i64`.
pub trait CountedExt: Counted<i64> {
    /// Increment the counter by 1
    fn incr(&self, key: &str) -> MetricResult<Counter> {
        self.count(key, 1)
    }
}

impl<T> CountedExt for T where T: Counted<i64> {}

/// Trait for recording timings in milliseconds.
///
/// Timings are a positive number of milliseconds between a start and end
/// time. Examples include time taken to render a web page or time taken
/// for a database call to return.
///
/// The following types are valid for timers:
/// * `i64`, a number of milliseconds which must not be negative
/// * `Duration`
pub trait Timed<T>
where
    T: ToTimerValue,
{
    /// Record a timing in milliseconds with the given key
    fn time(&self, key: &str, time: T) -> MetricResult<Timer>;
}

/// Trait for recording gauge values.
///
/// Gauge values are an instantaneous measurement of a value determined
/// by the client. They do not change unless changed by the client. Examples
/// include things like load average or how many connections are active.
pub trait Gauged<T>
where
    T: ToGaugeValue,
{
    /// Record a gauge value with the given key
    fn gauge(&self, key: &str, value: T) -> MetricResult<Gauge>;
}

/// Trait for recording set values.
///
/// Sets count the number of unique elements in a group. You can use them to,
/// for example, count the unique visitors to your site.
pub trait Setted<T>
where
    T: ToSetValue,
{
    /// Record a single set value with the given key
    fn set(&self, key: &str, value: T) -> MetricResult<Set>;
}

/// Trait for recording raw values.
///
/// Raw values are passed through the server without any aggregation and may
/// carry the epoch, in seconds, that the value was observed at.
pub trait Recorded<T>
where
    T: ToRawValue,
{
    /// Record a raw value with the given key
    fn raw(&self, key: &str, value: T) -> MetricResult<Raw>;

    /// Record a raw value with the given key and an explicit epoch
    fn raw_with_epoch(&self, key: &str, value: T, epoch: i64) -> MetricResult<Raw>;
}

/// Trait for recording calendargram values.
///
/// Calendargrams count how many distinct values were seen within a calendar
/// aligned period, such as the number of unique users that logged in today.
/// The period is sent as-is, but like text values it must not contain `\n`
/// or `|`. `CalendarPeriod` lists the tokens that servers understand.
pub trait Calendared<T>
where
    T: ToCalendargramValue,
{
    /// Record an occurrence of `value` within `period` with the given key
    fn calendargram(&self, key: &str, value: T, period: &str) -> MetricResult<Calendargram>;
}

/// Calendar periods understood by servers that accept calendargrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarPeriod {
    Hour,
    Day,
    DayOfWeek,
    Week,
    Month,
}

impl CalendarPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarPeriod::Hour => "h",
            CalendarPeriod::Day => "d",
            CalendarPeriod::DayOfWeek => "dow",
            CalendarPeriod::Week => "w",
            CalendarPeriod::Month => "m",
        }
    }
}

impl fmt::Display for CalendarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Trait that encompasses all other traits for sending metrics.
///
/// If you wish to use `StatsdClient` with a generic type or place a
/// `StatsdClient` instance behind a pointer (such as a `Box`) this will allow
/// you to reference all the implemented methods for recording metrics, while
/// using a single trait. An example of this is shown below.
///
/// ```
/// use std::time::Duration;
/// use statsline::{MetricClient, StatsdClient, NullOutputChannel};
///
/// let client: Box<dyn MetricClient> = Box::new(StatsdClient::from_channel(
///     "prefix", NullOutputChannel));
///
/// client.count("some.counter", 1).unwrap();
/// client.time("some.timer", 42).unwrap();
/// client.time("some.timer", Duration::from_millis(42)).unwrap();
/// client.gauge("some.gauge", 8).unwrap();
/// client.set("some.set", 5).unwrap();
/// client.raw("some.raw", 12934).unwrap();
/// client.calendargram("some.logins", "user42", "d").unwrap();
/// ```
pub trait MetricClient:
    Counted<i64>
    + CountedExt
    + Timed<i64>
    + Timed<Duration>
    + Gauged<i64>
    + Setted<i64>
    + Recorded<i64>
    + Calendared<i64>
    + Calendared<String>
    + for<'a> Calendared<&'a str>
{
}

/// Trait for various backends that send Statsd metrics somewhere.
///
/// This trait exposes methods of the client that would normally be internal
/// but may be useful for consumers of the library to extend it, such as
/// sending a metric type this library doesn't know about over the same
/// output channel. It is only exposed in the `ext` module.
///
/// NOTE: This is a sealed trait and so it cannot be implemented outside of the
/// library.
///
/// # Example
///
/// ```
/// use statsline::{Metric, MetricResult, NullOutputChannel, StatsdClient};
/// use statsline::ext::MetricBackend;
///
/// struct Histogram {
///     repr: String,
/// }
///
/// impl Metric for Histogram {
///     fn as_metric_str(&self) -> &str {
///         &self.repr
///     }
/// }
///
/// let client = StatsdClient::from_channel("", NullOutputChannel);
/// let metric = Histogram { repr: "some.histogram:3|h".to_string() };
/// client.send_metric(&metric).unwrap();
/// ```
pub trait MetricBackend: Sealed {
    /// Send a fully formed `Metric` through the output channel, verbatim.
    fn send_metric<M>(&self, metric: &M) -> MetricResult<()>
    where
        M: Metric;
}

/// Builder for creating and customizing `StatsdClient` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `StatsdClient` struct. Settings that aren't given use the
/// same defaults as `ClientConfig::default()`.
///
/// # Example
///
/// ```
/// use statsline::prelude::*;
/// use statsline::{RetryPolicy, StatsdClient, Transport};
///
/// let client = StatsdClient::builder("127.0.0.1", 8125)
///     .with_transport(Transport::Tcp)
///     .with_retry(RetryPolicy::new(5))
///     .with_prefix("my.service")
///     .with_postfix("web01")
///     .build()
///     .unwrap();
/// ```
pub struct StatsdClientBuilder {
    config: ClientConfig,
    channel: Option<Box<dyn OutputChannel + Sync + Send + RefUnwindSafe>>,
}

impl StatsdClientBuilder {
    fn new(config: ClientConfig) -> Self {
        StatsdClientBuilder { config, channel: None }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.config.transport = transport;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.config.prefix = prefix.to_string();
        self
    }

    pub fn with_postfix(mut self, postfix: &str) -> Self {
        self.config.postfix = postfix.to_string();
        self
    }

    /// Set how the TCP output channel reconnects after a failed write.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the TCP connect and write timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Return an error from `build()` when the output channel can't be
    /// created instead of discarding all metrics.
    pub fn with_rethrow_on_error(mut self, rethrow: bool) -> Self {
        self.config.rethrow_on_error = rethrow;
        self
    }

    /// Send metrics from a background thread through a queue holding at most
    /// `capacity` lines, so a TCP channel that is connecting or reconnecting
    /// doesn't block callers. Errors from the channel are then logged instead
    /// of returned, and sending fails while the queue is full.
    ///
    /// This has no effect on a channel given by `with_channel`.
    pub fn with_queue(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Use the given output channel instead of creating one from the host,
    /// port, and transport settings.
    pub fn with_channel<T>(mut self, channel: T) -> Self
    where
        T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
    {
        self.channel = Some(Box::new(channel));
        self
    }

    /// Construct a new `StatsdClient` instance based on current settings.
    ///
    /// If the output channel can't be created (the host is empty, can't be
    /// resolved, or a socket can't be opened) a warning is logged and the
    /// client discards every metric sent through it. When
    /// `with_rethrow_on_error(true)` was set, the error is returned instead.
    pub fn build(self) -> MetricResult<StatsdClient> {
        let channel: Box<dyn OutputChannel + Sync + Send + RefUnwindSafe> = match self.channel {
            Some(channel) => channel,
            None => match new_channel(&self.config) {
                Ok(channel) => channel,
                Err(e) if self.config.rethrow_on_error => return Err(e),
                Err(e) => {
                    warn!(
                        "unable to create {:?} output channel for {}:{}, metrics will be discarded: {}",
                        self.config.transport, self.config.host, self.config.port, e
                    );
                    Box::new(NullOutputChannel)
                }
            },
        };

        Ok(StatsdClient {
            prefix: formatted_prefix(&self.config.prefix),
            postfix: formatted_postfix(&self.config.postfix),
            channel,
        })
    }
}

fn new_channel(config: &ClientConfig) -> MetricResult<Box<dyn OutputChannel + Sync + Send + RefUnwindSafe>> {
    if config.host.is_empty() {
        return Err(MetricError::from((ErrorKind::InvalidInput, "host must not be empty")));
    }

    let addr = (config.host.as_str(), config.port);
    Ok(match config.transport {
        Transport::Udp => with_optional_queue(UdpOutputChannel::bind(addr)?, config.queue_capacity),
        Transport::Tcp => with_optional_queue(
            TcpOutputChannel::new(addr, config.retry, config.timeout)?,
            config.queue_capacity,
        ),
    })
}

fn with_optional_queue<T>(channel: T, capacity: Option<usize>) -> Box<dyn OutputChannel + Sync + Send + RefUnwindSafe>
where
    T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
{
    match capacity {
        Some(v) => Box::new(QueuingOutputChannel::with_capacity(channel, v)),
        None => Box::new(channel),
    }
}

/// Client for Statsd that implements various traits to record metrics.
///
/// # Traits
///
/// The client is the main entry point for users of this library. It supports
/// several traits for recording metrics of different types.
///
/// * `Counted` for emitting counters.
/// * `Timed` for emitting timings.
/// * `Gauged` for emitting gauge values.
/// * `Setted` for emitting set values.
/// * `Recorded` for emitting raw values, optionally with an epoch.
/// * `Calendared` for emitting calendargram values.
/// * `MetricClient` for a combination of all of the above.
///
/// For more information about the uses for each type of metric, see the
/// documentation for each mentioned trait.
///
/// # Validation
///
/// Every method fails with `ErrorKind::InvalidInput` and sends nothing when
/// the key is empty or contains `\n`, `:` or `|`, or when a numeric value is
/// negative. Calendargram text values and periods must not contain `\n` or
/// `|` either.
///
/// # Threading
///
/// The client is `Send + Sync` and is meant to be shared between threads,
/// typically inside an `Arc`. The output channel it uses is created once
/// and reused for every metric.
pub struct StatsdClient {
    prefix: String,
    postfix: String,
    channel: Box<dyn OutputChannel + Sync + Send + RefUnwindSafe>,
}

impl StatsdClient {
    /// Create a new builder for a client sending metrics to the given host
    /// and port.
    ///
    /// # Example
    ///
    /// ```
    /// use statsline::prelude::*;
    /// use statsline::{StatsdClient, DEFAULT_PORT};
    ///
    /// let client = StatsdClient::builder("localhost", DEFAULT_PORT)
    ///     .with_prefix("my.stats")
    ///     .build()
    ///     .unwrap();
    ///
    /// client.count("some.counter", 1).unwrap();
    /// ```
    pub fn builder(host: &str, port: u16) -> StatsdClientBuilder {
        StatsdClientBuilder::new(ClientConfig {
            host: host.to_string(),
            port,
            ..ClientConfig::default()
        })
    }

    /// Create a new client from a complete configuration.
    ///
    /// This only fails when the output channel can't be created and
    /// `rethrow_on_error` is set.
    pub fn from_config(config: ClientConfig) -> MetricResult<Self> {
        StatsdClientBuilder::new(config).build()
    }

    /// Create a new client that uses the given prefix for all metrics sent
    /// to the given `OutputChannel` implementation.
    ///
    /// # Example
    ///
    /// ```
    /// use statsline::{StatsdClient, NullOutputChannel};
    ///
    /// let client = StatsdClient::from_channel("my.stats", NullOutputChannel);
    /// ```
    pub fn from_channel<T>(prefix: &str, channel: T) -> Self
    where
        T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
    {
        StatsdClient {
            prefix: formatted_prefix(prefix),
            postfix: String::new(),
            channel: Box::new(channel),
        }
    }

    /// Flush the underlying output channel.
    pub fn flush(&self) -> MetricResult<()> {
        Ok(self.channel.flush()?)
    }

    fn send_formatted<M>(&self, formatter: MetricFormatter<'_>) -> MetricResult<M>
    where
        M: Metric + From<String>,
    {
        let metric = M::from(formatter.format());
        self.send_metric(&metric)?;
        Ok(metric)
    }
}

fn valid_key(key: &str) -> MetricResult<&str> {
    if key.is_empty() {
        Err(MetricError::from((ErrorKind::InvalidInput, "metric name must not be empty")))
    } else if key.contains(['\n', ':', '|']) {
        Err(MetricError::from((
            ErrorKind::InvalidInput,
            "metric name must not contain '\\n', ':' or '|'",
        )))
    } else {
        Ok(key)
    }
}

// Free-form parts of a line must not end it early or add fields to it.
fn valid_token<'a>(token: &'a str, desc: &'static str) -> MetricResult<&'a str> {
    if token.contains(['\n', '|']) {
        Err(MetricError::from((ErrorKind::InvalidInput, desc)))
    } else {
        Ok(token)
    }
}

impl Sealed for StatsdClient {}

impl MetricBackend for StatsdClient {
    fn send_metric<M>(&self, metric: &M) -> MetricResult<()>
    where
        M: Metric,
    {
        self.channel.send(metric.as_metric_str())?;
        Ok(())
    }
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatsdClient {{ prefix: {:?}, postfix: {:?}, channel: ... }}",
            self.prefix, self.postfix,
        )
    }
}

impl<T> Counted<T> for StatsdClient
where
    T: ToCounterValue,
{
    fn count(&self, key: &str, count: T) -> MetricResult<Counter> {
        let key = valid_key(key)?;
        let value = count.try_to_value()?;
        self.send_formatted(MetricFormatter::counter(&self.prefix, key, &self.postfix, value))
    }
}

impl<T> Timed<T> for StatsdClient
where
    T: ToTimerValue,
{
    fn time(&self, key: &str, time: T) -> MetricResult<Timer> {
        let key = valid_key(key)?;
        let value = time.try_to_value()?;
        self.send_formatted(MetricFormatter::timer(&self.prefix, key, &self.postfix, value))
    }
}

impl<T> Gauged<T> for StatsdClient
where
    T: ToGaugeValue,
{
    fn gauge(&self, key: &str, value: T) -> MetricResult<Gauge> {
        let key = valid_key(key)?;
        let value = value.try_to_value()?;
        self.send_formatted(MetricFormatter::gauge(&self.prefix, key, &self.postfix, value))
    }
}

impl<T> Setted<T> for StatsdClient
where
    T: ToSetValue,
{
    fn set(&self, key: &str, value: T) -> MetricResult<Set> {
        let key = valid_key(key)?;
        let value = value.try_to_value()?;
        self.send_formatted(MetricFormatter::set(&self.prefix, key, &self.postfix, value))
    }
}

impl<T> Recorded<T> for StatsdClient
where
    T: ToRawValue,
{
    fn raw(&self, key: &str, value: T) -> MetricResult<Raw> {
        let key = valid_key(key)?;
        let value = value.try_to_value()?;
        self.send_formatted(MetricFormatter::raw(&self.prefix, key, &self.postfix, value))
    }

    fn raw_with_epoch(&self, key: &str, value: T, epoch: i64) -> MetricResult<Raw> {
        let key = valid_key(key)?;
        let value = value.try_to_value()?;
        let fmt = MetricFormatter::raw(&self.prefix, key, &self.postfix, value).with_suffix(epoch.to_string());
        self.send_formatted(fmt)
    }
}

impl<T> Calendared<T> for StatsdClient
where
    T: ToCalendargramValue,
{
    fn calendargram(&self, key: &str, value: T, period: &str) -> MetricResult<Calendargram> {
        let key = valid_key(key)?;
        let period = valid_token(period, "calendargram periods must not contain '\\n' or '|'")?;
        let value = value.try_to_value()?;
        let fmt = MetricFormatter::calendargram(&self.prefix, key, &self.postfix, value).with_suffix(period);
        self.send_formatted(fmt)
    }
}

impl MetricClient for StatsdClient {}
