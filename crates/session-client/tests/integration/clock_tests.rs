//! Session clock scenarios. All run on paused time.

use crate::harness::spawn_default;
use session_client::session::SessionEvent;
use session_client::transport::TransportEvent;
use session_client::ConnectionState;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_clock_counts_connected_seconds() {
    let scenario = spawn_default();
    let connected = scenario.connect().await;
    assert_eq!(connected.elapsed_seconds, 0);
    assert_eq!(connected.elapsed_display(), "0:00");

    tokio::time::sleep(Duration::from_millis(65_500)).await;
    let snapshot = scenario.handle.snapshot();

    assert_eq!(snapshot.elapsed_seconds, 65);
    assert_eq!(snapshot.elapsed_display(), "1:05");
}

#[tokio::test(start_paused = true)]
async fn test_clock_pauses_while_reconnecting() {
    let scenario = spawn_default();
    scenario.connect().await;

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    scenario.transport.emit(TransportEvent::Interrupted);
    scenario.wait_for_state(ConnectionState::Reconnecting).await;

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(scenario.handle.snapshot().elapsed_seconds, 10);

    scenario.transport.emit(TransportEvent::Resumed);
    scenario.wait_for_state(ConnectionState::Connected).await;
    tokio::time::sleep(Duration::from_millis(5_700)).await;

    // 10.5s + 5.7s connected; the half second before the interruption counts.
    assert_eq!(scenario.handle.snapshot().elapsed_seconds, 16);
}

#[tokio::test(start_paused = true)]
async fn test_clock_sums_short_connected_spans() {
    let scenario = spawn_default();
    scenario.connect().await;

    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(900)).await;
        scenario.transport.emit(TransportEvent::Interrupted);
        scenario.wait_for_state(ConnectionState::Reconnecting).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        scenario.transport.emit(TransportEvent::Resumed);
        scenario.wait_for_state(ConnectionState::Connected).await;
    }

    let snapshot = scenario.handle.snapshot();
    assert_eq!(snapshot.elapsed_seconds, 9);
    assert_eq!(snapshot.elapsed_display(), "0:09");
}

#[tokio::test(start_paused = true)]
async fn test_clock_stops_when_session_ends() {
    let scenario = spawn_default();
    scenario.connect().await;

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    scenario.handle.end().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = scenario.handle.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert_eq!(snapshot.elapsed_seconds, 3);
}

#[tokio::test(start_paused = true)]
async fn test_tick_events_are_broadcast() {
    let scenario = spawn_default();
    scenario.connect().await;
    let mut events = scenario.handle.subscribe();

    let mut ticks = Vec::new();
    while ticks.len() < 3 {
        if let SessionEvent::Tick { elapsed_seconds } = events.recv().await.unwrap() {
            ticks.push(elapsed_seconds);
        }
    }

    assert_eq!(ticks, vec![1, 2, 3]);
}
