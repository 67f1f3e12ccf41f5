// Statsline - A Statsd client for Rust with UDP and TCP output channels
//
// Copyright 2026 The Statsline Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, ErrorKind};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::channels::core::OutputChannel;

/// `OutputChannel` implementation that writes all metrics to the `Sender` half
/// of a channel while callers are given ownership of the `Receiver` half.
///
/// This is not a general purpose channel, rather it's meant for verifying
/// metrics written during the course of integration tests. By default, the
/// channel used is unbounded. The size can be limited using `with_capacity`.
#[derive(Debug)]
pub struct SpyOutputChannel {
    sender: Sender<String>,
}

impl SpyOutputChannel {
    pub fn new() -> (Receiver<String>, Self) {
        Self::with_queue_capacity(None)
    }

    pub fn with_capacity(queue: usize) -> (Receiver<String>, Self) {
        Self::with_queue_capacity(Some(queue))
    }

    fn with_queue_capacity(queue: Option<usize>) -> (Receiver<String>, Self) {
        let (tx, rx) = match queue {
            Some(v) => bounded(v),
            None => unbounded(),
        };

        (rx, SpyOutputChannel { sender: tx })
    }
}

impl OutputChannel for SpyOutputChannel {
    fn send(&self, line: &str) -> io::Result<usize> {
        match self.sender.try_send(line.to_string()) {
            Ok(_) => Ok(line.len()),
            Err(TrySendError::Full(_)) => Err(io::Error::new(ErrorKind::Other, "channel full")),
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(ErrorKind::Other, "channel disconnected")),
        }
    }
}
