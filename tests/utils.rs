use statsline::prelude::*;
use statsline::{CalendarPeriod, StatsdClient};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const NUM_THREADS: u64 = 100;
#[allow(dead_code)]
pub const NUM_ITERATIONS: u64 = 1_000;

// Number of metrics sent by each iteration of `run_arc_threaded_test`
#[allow(dead_code)]
pub const METRICS_PER_ITERATION: u64 = 9;

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: StatsdClient, num_threads: u64, iterations: u64) {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations as i64 {
                    local_client.count("some.counter", i).unwrap();
                    local_client.incr("some.counter").unwrap();
                    local_client.time("some.timer", i).unwrap();
                    local_client.time("some.timer", Duration::from_millis(i as u64)).unwrap();
                    local_client.gauge("some.gauge", i).unwrap();
                    local_client.set("some.set", i).unwrap();
                    local_client.raw("some.raw", i).unwrap();
                    local_client.raw_with_epoch("some.raw", i, 1380000000).unwrap();
                    local_client
                        .calendargram("some.logins", format!("user{}", i), CalendarPeriod::Day.as_str())
                        .unwrap();
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}
