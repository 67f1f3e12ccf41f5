// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod core;
mod queuing;
mod spy;
mod tcp;
mod udp;

pub use crate::channels::core::{ChannelStats, NullOutputChannel, OutputChannel};
pub use crate::channels::queuing::QueuingOutputChannel;
pub use crate::channels::spy::SpyOutputChannel;
pub use crate::channels::tcp::TcpOutputChannel;
pub use crate::channels::udp::UdpOutputChannel;
