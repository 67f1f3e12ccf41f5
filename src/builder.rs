// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::{self, Write};

/// Type of metric that knows how to display itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MetricType {
    Counter,
    Timer,
    Gauge,
    Set,
    Raw,
    Calendargram,
}

impl MetricType {
    fn tag(self) -> &'static str {
        match self {
            MetricType::Counter => "c",
            MetricType::Timer => "ms",
            MetricType::Gauge => "g",
            MetricType::Set => "s",
            MetricType::Raw => "r",
            MetricType::Calendargram => "cg",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tag().fmt(f)
    }
}

/// Holder for metric values that knows how to display itself
///
/// This enum is internal to how various types that are valid for each type
/// of metric (e.g. types for which `ToCounterValue`, `ToTimerValue`, etc) are
/// implemented but is exposed for documentation purposes and advanced use cases.
///
/// Numeric values are always non-negative by the time they are wrapped in this
/// type. Text values are only produced for calendargrams and are written to the
/// wire verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Unsigned(u64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(v) => v.fmt(f),
            MetricValue::Text(v) => v.fmt(f),
        }
    }
}

/// Formats a single metric line.
///
/// Lines have the form `[prefix.]key[postfix]:value|type[|suffix]`. The prefix
/// and postfix are expected to already be normalized by the client (prefix
/// ending with a `.` or empty, postfix starting with a `.` or empty).
#[derive(Debug, Clone)]
pub(crate) struct MetricFormatter<'a> {
    prefix: &'a str,
    key: &'a str,
    postfix: &'a str,
    val: MetricValue,
    type_: MetricType,
    suffix: Option<String>,
}

impl<'a> MetricFormatter<'a> {
    pub(crate) fn counter(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Counter)
    }

    pub(crate) fn timer(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Timer)
    }

    pub(crate) fn gauge(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Gauge)
    }

    pub(crate) fn set(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Set)
    }

    pub(crate) fn raw(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Raw)
    }

    pub(crate) fn calendargram(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue) -> Self {
        Self::from_val(prefix, key, postfix, val, MetricType::Calendargram)
    }

    fn from_val(prefix: &'a str, key: &'a str, postfix: &'a str, val: MetricValue, type_: MetricType) -> Self {
        MetricFormatter {
            prefix,
            key,
            postfix,
            val,
            type_,
            suffix: None,
        }
    }

    /// Append `|suffix` to the end of the line, used for the epoch of raw
    /// metrics and the period of calendargrams. Empty suffixes are ignored.
    pub(crate) fn with_suffix<S>(mut self, suffix: S) -> Self
    where
        S: Into<String>,
    {
        let suffix = suffix.into();
        if !suffix.is_empty() {
            self.suffix = Some(suffix);
        }
        self
    }

    #[rustfmt::skip]
    fn size_hint(&self) -> usize {
        self.prefix.len() + self.key.len() + self.postfix.len()
            + 1 /* : */ + 20 /* value */ + 1 /* | */ + 2 /* type */
            + self.suffix.as_ref().map_or(0, |s| 1 /* | */ + s.len())
    }

    pub(crate) fn format(&self) -> String {
        let mut out = String::with_capacity(self.size_hint());
        let _ = write!(
            out,
            "{}{}{}:{}|{}",
            self.prefix, self.key, self.postfix, self.val, self.type_
        );

        if let Some(ref suffix) = self.suffix {
            out.push('|');
            out.push_str(suffix);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricFormatter, MetricType, MetricValue};

    #[test]
    fn test_metric_type_tags() {
        assert_eq!("c", MetricType::Counter.to_string());
        assert_eq!("ms", MetricType::Timer.to_string());
        assert_eq!("g", MetricType::Gauge.to_string());
        assert_eq!("s", MetricType::Set.to_string());
        assert_eq!("r", MetricType::Raw.to_string());
        assert_eq!("cg", MetricType::Calendargram.to_string());
    }

    #[test]
    fn test_metric_formatter_counter() {
        let fmt = MetricFormatter::counter("prefix.", "some.key", "", MetricValue::Unsigned(4));
        assert_eq!("prefix.some.key:4|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_no_prefix() {
        let fmt = MetricFormatter::counter("", "some.key", "", MetricValue::Unsigned(1));
        assert_eq!("some.key:1|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_counter_prefix_and_postfix() {
        let fmt = MetricFormatter::counter("some.datacenter.", "some.stat", ".host", MetricValue::Unsigned(1));
        assert_eq!("some.datacenter.some.stat.host:1|c", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_timer() {
        let fmt = MetricFormatter::timer("prefix.", "some.method", "", MetricValue::Unsigned(21));
        assert_eq!("prefix.some.method:21|ms", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_gauge() {
        let fmt = MetricFormatter::gauge("prefix.", "num.failures", "", MetricValue::Unsigned(7));
        assert_eq!("prefix.num.failures:7|g", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_set() {
        let fmt = MetricFormatter::set("prefix.", "users.uniques", "", MetricValue::Unsigned(44));
        assert_eq!("prefix.users.uniques:44|s", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_raw_no_epoch() {
        let fmt = MetricFormatter::raw("", "my.raw.stat", "", MetricValue::Unsigned(12934));
        assert_eq!("my.raw.stat:12934|r", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_raw_with_epoch() {
        let fmt = MetricFormatter::raw("", "my.raw.stat", "", MetricValue::Unsigned(12934)).with_suffix("-17");
        assert_eq!("my.raw.stat:12934|r|-17", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_empty_suffix_ignored() {
        let fmt = MetricFormatter::raw("", "my.raw.stat", "", MetricValue::Unsigned(3)).with_suffix("");
        assert_eq!("my.raw.stat:3|r", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_calendargram_text() {
        let fmt = MetricFormatter::calendargram("app.", "users", ".web01", MetricValue::Text("bob".to_string()))
            .with_suffix("dow");
        assert_eq!("app.users.web01:bob|cg|dow", &fmt.format());
    }

    #[test]
    fn test_metric_formatter_size_hint_covers_output() {
        let fmt = MetricFormatter::raw("prefix.", "some.key", ".host", MetricValue::Unsigned(u64::MAX))
            .with_suffix("1380000000");
        assert!(fmt.size_hint() >= fmt.format().len());
    }
}
