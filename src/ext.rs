// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Extension points for sending metrics this library doesn't model.
//!
//! `MetricBackend` sends any already formatted `Metric` through the same
//! output channel the client uses. The `To*Value` traits mark which types
//! are accepted as values for each kind of metric and convert them, such
//! as turning a `Duration` into milliseconds.

pub use crate::builder::MetricValue;
pub use crate::client::{
    MetricBackend, ToCalendargramValue, ToCounterValue, ToGaugeValue, ToRawValue, ToSetValue, ToTimerValue,
};
