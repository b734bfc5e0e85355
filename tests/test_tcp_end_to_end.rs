// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Full stack over loopback TCP: multiplexer, relay queues and controller

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ventlink::prelude::*;

struct Harness {
    addr: SocketAddr,
    _runtime: ServerRuntime<TcpSocketProvider, HostClock>,
    _worker: ControlWorker<NoopActuator>,
}

fn start(heartbeat_interval: Duration) -> Harness {
    // Bind the shared listener up front so the test knows the ephemeral port
    let mut sockets = TcpSocketProvider::new("127.0.0.1");
    sockets.open_listener(1, 0).unwrap();
    let addr = sockets.local_addr(0).unwrap();

    let config = ServerConfig {
        session_count: 2,
        listen_port: 0,
        heartbeat_interval,
        ..ServerConfig::default()
    };
    let (server, consumer) = relay_channels(config.queue_capacity, config.enqueue_timeout);
    let shutdown = Arc::new(AtomicBool::new(false));

    let control = VentControl::new(1, NoopActuator).unwrap();
    let worker = ControlWorker::spawn(
        control,
        consumer,
        Duration::from_millis(20),
        Arc::clone(&shutdown),
    )
    .unwrap();

    let pool = SessionPool::new(config, sockets, HostClock::new(), server).unwrap();
    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    let runtime = ServerRuntime::spawn(pool, gate.clone(), network.clone(), shutdown).unwrap();

    network.set_up(true);
    gate.release();

    Harness {
        addr,
        _runtime: runtime,
        _worker: worker,
    }
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    stream
}

/// Read until `needle` shows up, returning everything received
fn read_until(stream: &mut TcpStream, needle: &[u8], timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut received = Vec::new();
    let mut chunk = [0u8; 64];

    while Instant::now() < deadline {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                received.extend_from_slice(&chunk[..n]);
                if received.windows(needle.len()).any(|w| w == needle) {
                    return received;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => panic!("read failed: {}", e),
        }
    }
    panic!(
        "did not receive {:?}, got {:?}",
        String::from_utf8_lossy(needle),
        String::from_utf8_lossy(&received)
    );
}

#[test]
fn test_get_and_set_round_trip() {
    let harness = start(Duration::from_secs(5));
    let mut client = connect(harness.addr);

    client.write_all(b"GET#").unwrap();
    read_until(&mut client, b"S1#", Duration::from_secs(3));

    client.write_all(b"SET2#").unwrap();
    read_until(&mut client, b"S2#", Duration::from_secs(3));

    client.write_all(b"GET#").unwrap();
    read_until(&mut client, b"S2#", Duration::from_secs(3));
}

#[test]
fn test_line_endings_between_frames_are_ignored() {
    let harness = start(Duration::from_secs(5));
    let mut client = connect(harness.addr);

    client.write_all(b"SET3#\r\n").unwrap();
    read_until(&mut client, b"S3#", Duration::from_secs(3));

    client.write_all(b"SET0#\r\n").unwrap();
    read_until(&mut client, b"S0#", Duration::from_secs(3));
}

#[test]
fn test_clients_share_one_controller() {
    let harness = start(Duration::from_secs(5));
    let mut first = connect(harness.addr);
    let mut second = connect(harness.addr);

    first.write_all(b"SET3#").unwrap();
    read_until(&mut first, b"S3#", Duration::from_secs(3));

    second.write_all(b"GET#").unwrap();
    read_until(&mut second, b"S3#", Duration::from_secs(3));
}

#[test]
fn test_idle_client_receives_heartbeat() {
    let harness = start(Duration::from_millis(200));
    let mut client = connect(harness.addr);

    read_until(&mut client, b"HB#", Duration::from_secs(3));
}
