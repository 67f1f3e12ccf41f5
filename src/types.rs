// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;

/// Trait for metrics to expose Statsd metric string slice representation.
///
/// Implementing metrics know how to turn themselves into one of the supported
/// types of metrics understood by Statsd servers, plus the raw and
/// calendargram extensions supported by statsd.net.
pub trait Metric {
    fn as_metric_str(&self) -> &str;
}

macro_rules! metric_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Debug, Hash, Clone)]
        pub struct $name {
            repr: String,
        }

        impl $name {
            pub fn new(repr: String) -> Self {
                $name { repr }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name::new(s)
            }
        }

        impl Metric for $name {
            fn as_metric_str(&self) -> &str {
                &self.repr
            }
        }
    };
}

metric_type!(
    /// Counters are simple values incremented by a client.
    ///
    /// See the `Counted` trait for more information.
    Counter
);

metric_type!(
    /// Timers are a positive number of milliseconds between a start and end point.
    ///
    /// See the `Timed` trait for more information.
    Timer
);

metric_type!(
    /// Gauges are an instantaneous value determined by the client.
    ///
    /// See the `Gauged` trait for more information.
    Gauge
);

metric_type!(
    /// Sets count the number of unique elements in a group.
    ///
    /// See the `Setted` trait for more information.
    Set
);

metric_type!(
    /// Raw metrics are passed through the server without aggregation.
    ///
    /// See the `Recorded` trait for more information.
    Raw
);

metric_type!(
    /// Calendargrams count unique values within a calendar aligned period.
    ///
    /// See the `Calendared` trait for more information.
    Calendargram
);

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorKind {
    InvalidInput,
    IoError,
}

/// Error generated by this library potentially wrapping another
/// type of error (exposed via the `Error` trait).
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
