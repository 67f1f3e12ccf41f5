use statsline::prelude::*;
use statsline::test::{DelegatingOutputChannel, ServerHarness, TcpTestServer};
use statsline::{
    ErrorKind, OutputChannel, QueuingOutputChannel, RetryPolicy, StatsdClient, TcpOutputChannel, Transport,
};
use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpListener};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

mod utils;
use utils::{run_arc_threaded_test, METRICS_PER_ITERATION, NUM_ITERATIONS, NUM_THREADS};

fn new_tcp_server() -> (ServerHarness<TcpTestServer>, Arc<Mutex<Vec<String>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&received);
    let server = TcpTestServer::new(move |line: String| store.lock().unwrap().push(line)).unwrap();
    (ServerHarness::new(server), received)
}

fn new_tcp_client(prefix: &str, addr: SocketAddr, retry: RetryPolicy) -> StatsdClient {
    StatsdClient::builder(&addr.ip().to_string(), addr.port())
        .with_transport(Transport::Tcp)
        .with_prefix(prefix)
        .with_retry(retry)
        .with_timeout(Duration::from_secs(5))
        .with_rethrow_on_error(true)
        .build()
        .unwrap()
}

// Wait for the server to have received `count` lines, queued lines being
// written from another thread.
fn wait_for_lines(received: &Mutex<Vec<String>>, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while received.lock().unwrap().len() < count && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
}

// Address of a port that nothing is listening on
fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[test]
fn test_statsd_client_tcp_channel_sends_lines() {
    let (harness, received) = new_tcp_server();
    harness.run(|addr| {
        let client = new_tcp_client("statsline", addr, RetryPolicy::default());
        client.count("some.counter", 3).unwrap();
        client.calendargram("some.logins", "bob", "d").unwrap();
        client.flush().unwrap();
    });

    let lines = received.lock().unwrap().clone();
    assert_eq!(
        vec![
            "statsline.some.counter:3|c".to_string(),
            "statsline.some.logins:bob|cg|d".to_string(),
        ],
        lines
    );
}

#[test]
fn test_statsd_client_tcp_channel_single_threaded() {
    let (harness, received) = new_tcp_server();
    harness.run(|addr| {
        let client = new_tcp_client("statsline", addr, RetryPolicy::default());
        run_arc_threaded_test(client, 1, 1);
    });

    assert_eq!(METRICS_PER_ITERATION as usize, received.lock().unwrap().len());
}

#[test]
fn test_statsd_client_tcp_channel_connection_refused_no_retry() {
    let client = new_tcp_client("statsline", closed_addr(), RetryPolicy::disabled());
    let res = client.count("some.counter", 1);

    assert_eq!(ErrorKind::IoError, res.unwrap_err().kind());
}

#[test]
fn test_tcp_output_channel_exhausts_retries() {
    let channel = TcpOutputChannel::new(closed_addr(), RetryPolicy::new(3), Some(Duration::from_secs(5))).unwrap();

    assert!(channel.send("some.counter:1|c").is_err());
    assert_eq!(3, channel.stats().reconnects);
}

#[test]
fn test_statsd_client_queuing_tcp_channel_hides_errors() {
    let tcp = TcpOutputChannel::new(closed_addr(), RetryPolicy::disabled(), None).unwrap();
    let client = StatsdClient::from_channel("statsline", QueuingOutputChannel::from(tcp));

    assert!(client.count("some.counter", 1).is_ok());
}

#[test]
fn test_statsd_client_tcp_channel_rejects_injected_lines() {
    let (harness, received) = new_tcp_server();
    harness.run(|addr| {
        let client = new_tcp_client("", addr, RetryPolicy::default());

        let res = client.count("a\nevil.injected:999|c\nb", 1);
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());

        let res = client.calendargram("logins", "bob\nforged:1|g", "d");
        assert_eq!(ErrorKind::InvalidInput, res.unwrap_err().kind());

        client.calendargram("logins", "bob", "d").unwrap();
        client.flush().unwrap();
    });

    let lines = received.lock().unwrap().clone();
    assert_eq!(vec!["logins:bob|cg|d".to_string()], lines);
}

#[test]
fn test_statsd_client_tcp_channel_reconnects_after_server_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (closed_tx, closed_rx) = mpsc::channel();

    let server = thread::spawn(move || {
        let mut lines = Vec::new();

        let (first, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(first);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        lines.push(line.trim_end().to_string());
        drop(reader);
        closed_tx.send(()).unwrap();

        let (second, _) = listener.accept().unwrap();
        for line in BufReader::new(second).lines().take(2) {
            lines.push(line.unwrap());
        }

        lines
    });

    let tcp = Arc::new(TcpOutputChannel::new(addr, RetryPolicy::default(), Some(Duration::from_secs(5))).unwrap());
    let client = StatsdClient::from_channel("", DelegatingOutputChannel::new(Arc::clone(&tcp)));

    client.count("a", 1).unwrap();
    closed_rx.recv().unwrap();
    thread::sleep(Duration::from_millis(100));
    client.count("b", 1).unwrap();
    client.count("c", 1).unwrap();

    assert_eq!(vec!["a:1|c", "b:1|c", "c:1|c"], server.join().unwrap());

    let stats = tcp.stats();
    assert_eq!(3, stats.packets_sent);
    assert_eq!(1, stats.reconnects);
}

#[test]
fn test_statsd_client_tcp_channel_with_queue() {
    let (harness, received) = new_tcp_server();
    let store = Arc::clone(&received);
    harness.run(|addr| {
        let client = StatsdClient::builder(&addr.ip().to_string(), addr.port())
            .with_transport(Transport::Tcp)
            .with_prefix("statsline")
            .with_queue(64)
            .with_rethrow_on_error(true)
            .build()
            .unwrap();

        client.count("some.counter", 2).unwrap();
        client.gauge("some.gauge", 7).unwrap();
        wait_for_lines(&store, 2);
    });

    let lines = received.lock().unwrap().clone();
    assert_eq!(
        vec!["statsline.some.counter:2|c".to_string(), "statsline.some.gauge:7|g".to_string()],
        lines
    );
}

#[test]
fn test_statsd_client_queuing_tcp_channel_does_not_block_on_retries() {
    let client = StatsdClient::builder("127.0.0.1", closed_addr().port())
        .with_transport(Transport::Tcp)
        .with_retry(RetryPolicy::new(3))
        .with_queue(64)
        .with_rethrow_on_error(true)
        .build()
        .unwrap();

    for _ in 0..10 {
        assert!(client.incr("some.counter").is_ok());
    }
}

#[ignore]
#[test]
fn test_statsd_client_tcp_channel_many_threaded() {
    let (harness, received) = new_tcp_server();
    harness.run(|addr| {
        let client = new_tcp_client("statsline", addr, RetryPolicy::default());
        run_arc_threaded_test(client, NUM_THREADS, NUM_ITERATIONS);
    });

    let expected = NUM_THREADS * NUM_ITERATIONS * METRICS_PER_ITERATION;
    assert_eq!(expected as usize, received.lock().unwrap().len());
}
