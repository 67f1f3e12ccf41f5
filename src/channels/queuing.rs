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
use std::io::{self, ErrorKind};
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{self, Receiver, Sender, TrySendError};
use log::error;

use crate::channels::core::{ChannelStats, OutputChannel};

/// Implementation of an `OutputChannel` that hands metrics to a background
/// thread which sends them using another channel.
///
/// This makes sending a metric fire-and-forget for the caller even when the
/// wrapped channel blocks, such as a `TcpOutputChannel` that is reconnecting.
/// Errors from the wrapped channel are logged and otherwise discarded.
///
/// The background thread is started when the `QueuingOutputChannel` is
/// created and is told to stop when it is dropped. Lines already queued at
/// that point are still passed to the wrapped channel before the thread
/// exits. If the wrapped channel panics, the thread is restarted and the
/// panic is counted.
///
/// # Example
///
/// ```no_run
/// use statsline::{OutputChannel, QueuingOutputChannel, RetryPolicy, TcpOutputChannel, DEFAULT_PORT};
///
/// let tcp = TcpOutputChannel::new(("metrics.example.com", DEFAULT_PORT), RetryPolicy::default(), None).unwrap();
/// let queuing = QueuingOutputChannel::from(tcp);
/// queuing.send("foo.counter:4|c").unwrap();
/// ```
pub struct QueuingOutputChannel {
    worker: Arc<Worker<String>>,
    wrapped: Arc<dyn OutputChannel + Sync + Send + RefUnwindSafe>,
}

impl QueuingOutputChannel {
    /// Wrap another channel with an unbounded queue. If the wrapped channel
    /// cannot keep up, the queue grows without bound.
    pub fn from<T>(channel: T) -> Self
    where
        T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::with_optional_capacity(channel, None)
    }

    /// Wrap another channel with a queue holding at most `capacity` lines.
    /// Sending fails while the queue is full.
    pub fn with_capacity<T>(channel: T, capacity: usize) -> Self
    where
        T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::with_optional_capacity(channel, Some(capacity))
    }

    fn with_optional_capacity<T>(channel: T, capacity: Option<usize>) -> Self
    where
        T: OutputChannel + Sync + Send + RefUnwindSafe + 'static,
    {
        let wrapped: Arc<dyn OutputChannel + Sync + Send + RefUnwindSafe> = Arc::new(channel);
        let sender = Arc::clone(&wrapped);

        let worker = Arc::new(Worker::new(capacity, move |line: String| {
            if let Err(e) = sender.send(&line) {
                error!("unable to send queued metric: {}", e);
            }
        }));
        spawn_worker_in_thread(Arc::clone(&worker));

        QueuingOutputChannel { worker, wrapped }
    }

    /// Number of times the wrapped channel panicked and the background thread
    /// had to be restarted.
    pub fn panics(&self) -> u64 {
        self.worker.stats.panics()
    }

    /// Approximate number of lines waiting in the queue.
    pub fn queued(&self) -> u64 {
        self.worker.stats.queued()
    }

    /// Number of lines accepted into the queue.
    pub fn submitted(&self) -> u64 {
        self.worker.stats.submitted()
    }

    /// Number of lines taken off the queue and passed to the wrapped channel.
    pub fn drained(&self) -> u64 {
        self.worker.stats.drained()
    }
}

impl OutputChannel for QueuingOutputChannel {
    fn send(&self, line: &str) -> io::Result<usize> {
        match self.worker.submit(line.to_string()) {
            Err(TrySendError::Disconnected(_)) => Err(io::Error::new(ErrorKind::Other, "queue disconnected")),
            Err(TrySendError::Full(_)) => Err(io::Error::new(ErrorKind::Other, "queue full")),
            Ok(_) => Ok(line.len()),
        }
    }

    fn stats(&self) -> ChannelStats {
        self.wrapped.stats()
    }
}

impl fmt::Debug for QueuingOutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuingOutputChannel")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl Drop for QueuingOutputChannel {
    /// Tell the worker to stop once the queue is drained. Doesn't wait.
    fn drop(&mut self) {
        self.worker.stop();
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    panics: AtomicU64,
    submitted: AtomicU64,
    drained: AtomicU64,
}

impl WorkerStats {
    fn incr_panic(&self) {
        self.panics.fetch_add(1, Ordering::Release);
    }

    fn panics(&self) -> u64 {
        self.panics.load(Ordering::Acquire)
    }

    fn incr_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Release);
    }

    fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Acquire)
    }

    fn incr_drained(&self) {
        self.drained.fetch_add(1, Ordering::Release);
    }

    fn drained(&self) -> u64 {
        self.drained.load(Ordering::Acquire)
    }

    fn queued(&self) -> u64 {
        self.submitted().saturating_sub(self.drained())
    }
}

fn spawn_worker_in_thread<T>(worker: Arc<Worker<T>>) -> thread::JoinHandle<()>
where
    T: Send + 'static,
{
    thread::spawn(move || {
        let mut sentinel = Sentinel::new(&worker);
        worker.run();
        sentinel.cancel();
    })
}

/// Restarts the worker in a new thread when dropped, unless cancelled after
/// the worker returned normally.
#[derive(Debug)]
struct Sentinel<'a, T>
where
    T: Send + 'static,
{
    worker: &'a Arc<Worker<T>>,
    active: bool,
}

impl<'a, T> Sentinel<'a, T>
where
    T: Send + 'static,
{
    fn new(worker: &'a Arc<Worker<T>>) -> Sentinel<'a, T> {
        Sentinel { worker, active: true }
    }

    fn cancel(&mut self) {
        self.active = false;
    }
}

impl<'a, T> Drop for Sentinel<'a, T>
where
    T: Send + 'static,
{
    fn drop(&mut self) {
        if self.active {
            error!("output channel panicked in queuing worker, restarting");
            self.worker.stats.incr_panic();
            spawn_worker_in_thread(Arc::clone(self.worker));
        }
    }
}

/// Runs a task for every value received on a channel until it receives
/// `None`, or until the queue is empty after `stop` was called.
///
/// `run` is meant to be called from the background thread while `submit`
/// and `stop` are called by everything else. The `stopped` flag exists so
/// tests can wait for the run loop to finish.
struct Worker<T>
where
    T: Send + 'static,
{
    task: Box<dyn Fn(T) + Sync + Send + RefUnwindSafe + 'static>,
    sender: Sender<Option<T>>,
    receiver: Receiver<Option<T>>,
    stopping: AtomicBool,
    stopped: AtomicBool,
    stats: WorkerStats,
}

impl<T> Worker<T>
where
    T: Send + 'static,
{
    fn new<F>(capacity: Option<usize>, task: F) -> Worker<T>
    where
        F: Fn(T) + Sync + Send + RefUnwindSafe + 'static,
    {
        let (tx, rx) = match capacity {
            Some(v) => crossbeam_channel::bounded(v),
            None => crossbeam_channel::unbounded(),
        };

        Worker {
            task: Box::new(task),
            sender: tx,
            receiver: rx,
            stopping: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            stats: WorkerStats::default(),
        }
    }

    fn submit(&self, v: T) -> Result<(), TrySendError<Option<T>>> {
        let res = self.sender.try_send(Some(v));
        if res.is_ok() {
            self.stats.incr_submitted();
        }

        res
    }

    fn run(&self) {
        for opt in self.receiver.iter() {
            match opt {
                Some(v) => {
                    self.stats.incr_drained();
                    (self.task)(v);
                }
                None => break,
            }

            if self.stopping.load(Ordering::Acquire) && self.receiver.is_empty() {
                break;
            }
        }

        self.stopped.store(true, Ordering::Release);
    }

    fn stop(&self) {
        // The flag covers a bounded queue too full to take the `None` pill.
        self.stopping.store(true, Ordering::Release);
        let _ = self.sender.try_send(None);
    }

    #[cfg(test)]
    fn stop_and_wait(&self) {
        self.stop();

        while !self.stopped.load(Ordering::Acquire) {
            thread::yield_now();
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl<T> fmt::Debug for Worker<T>
where
    T: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker {{ ... }}")
    }
}
