// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export the metric traits for easy glob imports
//!
//! # Example
//!
//! ```
//! use statsline::prelude::*;
//! use statsline::{StatsdClient, NullOutputChannel};
//!
//! let client = StatsdClient::from_channel("some.prefix", NullOutputChannel);
//!
//! client.count("some.counter", 1).unwrap();
//! client.time("some.timer", 23).unwrap();
//! client.gauge("some.gauge", 45).unwrap();
//! client.set("some.set", 123).unwrap();
//! client.raw("some.raw", 67).unwrap();
//! client.calendargram("some.calendargram", "bob", "dow").unwrap();
//! ```

pub use crate::client::{Calendared, Counted, CountedExt, Gauged, MetricClient, Recorded, Setted, Timed};
