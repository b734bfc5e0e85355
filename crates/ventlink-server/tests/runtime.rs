// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Startup gate and link-loss handling of the threaded runtime

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ventlink_hal::platforms::{MockClock, MockSocketProvider};
use ventlink_server::{
    relay_channels, ConsumerEndpoint, Message, MessageType, NetworkStatus, ServerConfig,
    ServerRuntime, SessionPool, SessionState, StartupGate,
};

fn pool_with_consumer() -> (SessionPool<MockSocketProvider, MockClock>, ConsumerEndpoint) {
    let config = ServerConfig {
        session_count: 3,
        poll_sleep: Duration::from_micros(200),
        link_poll_interval: Duration::from_millis(2),
        ..ServerConfig::default()
    };
    let (server, consumer) = relay_channels(config.queue_capacity, config.enqueue_timeout);
    let pool = SessionPool::new(config, MockSocketProvider::new(), MockClock::new(), server).unwrap();
    (pool, consumer)
}

fn pool() -> SessionPool<MockSocketProvider, MockClock> {
    pool_with_consumer().0
}

#[test]
fn test_no_polling_before_gate_release() {
    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    network.set_up(true);

    let runtime = ServerRuntime::spawn(
        pool(),
        gate,
        network,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(runtime.is_running());

    let pool = runtime.stop().unwrap();
    assert!(!pool.is_initialized());
    assert_eq!(pool.stats().cycles, 0);
    assert_eq!(pool.transport().open_calls(1), 0);
}

#[test]
fn test_polls_after_gate_release() {
    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    let runtime = ServerRuntime::spawn(
        pool(),
        gate.clone(),
        network.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    network.set_up(true);
    gate.release();
    thread::sleep(Duration::from_millis(50));

    let pool = runtime.stop().unwrap();
    assert!(pool.is_initialized());
    assert!(pool.stats().cycles > 0);
    for id in 1..=3 {
        assert_eq!(pool.session(id).unwrap().state(), SessionState::Listening);
    }
}

#[test]
fn test_link_loss_pauses_and_resets() {
    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    let runtime = ServerRuntime::spawn(
        pool(),
        gate.clone(),
        network.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    network.set_up(true);
    gate.release();
    thread::sleep(Duration::from_millis(30));

    network.set_up(false);
    thread::sleep(Duration::from_millis(30));

    let pool = runtime.stop().unwrap();
    for id in 1..=3 {
        assert_eq!(pool.session(id).unwrap().state(), SessionState::Closed);
        assert_eq!(pool.transport().close_calls(id), 1, "reset exactly once");
    }
}

#[test]
fn test_link_recovery_relistens() {
    let (pool, consumer) = pool_with_consumer();
    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    let runtime = ServerRuntime::spawn(
        pool,
        gate.clone(),
        network.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();

    network.set_up(true);
    gate.release();
    thread::sleep(Duration::from_millis(30));

    network.set_up(false);
    thread::sleep(Duration::from_millis(30));

    network.set_up(true);
    thread::sleep(Duration::from_millis(30));

    let mut pool = runtime.stop().unwrap();
    for id in 1..=3 {
        assert_eq!(pool.session(id).unwrap().state(), SessionState::Listening);
        assert_eq!(pool.transport().close_calls(id), 1, "no second reset");
    }

    // The re-listened slot serves a new client
    assert!(pool.transport_mut().connect_peer(2));
    pool.poll_once();
    pool.transport_mut().push_inbound(2, b"GET#");
    pool.poll_once();

    assert!(pool.session(2).unwrap().is_open());
    assert_eq!(
        consumer.commands.try_pop(),
        Some(Message::new(2, MessageType::GetStatus, 0))
    );
}

#[test]
fn test_drop_joins_thread() {
    let shutdown = Arc::new(AtomicBool::new(false));
    let runtime = ServerRuntime::spawn(
        pool(),
        StartupGate::new(),
        NetworkStatus::new(),
        Arc::clone(&shutdown),
    )
    .unwrap();
    drop(runtime);
    assert!(shutdown.load(std::sync::atomic::Ordering::Relaxed));
}
