//! Integration tests for the DXP controller
//!
//! These tests run the controller actor against a virtual switcher over a
//! real localhost socket and verify:
//! - Bootstrap queries populate device info and the routing mirror
//! - Actions reach the device and tie reports update the mirror
//! - Dropped connections are retried on the reconnect interval
//! - Configuration updates resize the matrix and reconnect

use std::net::SocketAddr;
use std::time::Duration;

use dxp_control::{
    spawn_controller, variable_definitions, variable_values, Action, ConnectionStatus,
    ControllerConfig, ControllerEvent, Feedback, FeedbackValue,
};
use dxp_protocol::{DeviceError, DxpModel};
use dxp_sim::{spawn_switcher, spawn_virtual_switcher, VirtualSwitcher};
use tokio::sync::mpsc;
use tokio::time::timeout;

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const WAIT: Duration = Duration::from_secs(5);

    /// Controller config pointing at a virtual switcher with a fast retry
    pub fn config_for(addr: SocketAddr, model: DxpModel) -> ControllerConfig {
        let mut config = ControllerConfig::new(addr.ip().to_string(), addr.port(), model);
        config.reconnect_interval_ms = 50;
        config
    }

    /// Receive events until one matches, returning it
    pub async fn wait_for<F>(events: &mut mpsc::Receiver<ControllerEvent>, pred: F) -> ControllerEvent
    where
        F: FnMut(&ControllerEvent) -> bool,
    {
        collect_until(events, pred)
            .await
            .pop()
            .expect("collect_until returns the matching event")
    }

    /// Receive events until one matches, returning all of them
    pub async fn collect_until<F>(
        events: &mut mpsc::Receiver<ControllerEvent>,
        mut pred: F,
    ) -> Vec<ControllerEvent>
    where
        F: FnMut(&ControllerEvent) -> bool,
    {
        timeout(WAIT, async {
            let mut seen = Vec::new();
            loop {
                let event = events.recv().await.expect("event stream closed");
                let done = pred(&event);
                seen.push(event);
                if done {
                    return seen;
                }
            }
        })
        .await
        .expect("timed out waiting for controller event")
    }

    pub fn is_connected(event: &ControllerEvent) -> bool {
        matches!(event, ControllerEvent::Connected { .. })
    }

    pub fn is_route(event: &ControllerEvent, output: u8, input: u8) -> bool {
        matches!(
            event,
            ControllerEvent::RouteChanged { output: o, input: i } if *o == output && *i == input
        )
    }
}

use helpers::*;

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_bootstrap_reads_model_and_routes() {
    let mut switcher = VirtualSwitcher::new(DxpModel::Dxp44);
    switcher.set_tie(1, 2);
    switcher.set_tie(3, 4);
    let (addr, sim) = spawn_switcher(switcher).await.unwrap();

    let (handle, mut events, task) = spawn_controller(config_for(addr, DxpModel::Dxp44));

    wait_for(&mut events, is_connected).await;
    let info = wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::DeviceInfoChanged { .. })
    })
    .await;
    assert!(matches!(
        info,
        ControllerEvent::DeviceInfoChanged { info } if info.model == "DXP 44 HD 4K Plus"
    ));
    wait_for(&mut events, |e| is_route(e, 3, 4)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.connected);
    assert_eq!(snapshot.status, ConnectionStatus::Ok);
    assert_eq!(snapshot.matrix.source_of(1), Some(2));
    assert_eq!(snapshot.matrix.source_of(2), None);
    assert_eq!(snapshot.matrix.source_of(3), Some(4));
    assert_eq!(snapshot.matrix.active_routes(), 2);

    let values = variable_values(&snapshot);
    assert_eq!(values["connection_status"].to_string(), "Connected");
    assert_eq!(values["output_1_source"].to_string(), "Input 2");
    assert_eq!(values["disconnected_outputs"].to_string(), "2");

    let state = sim.state().await.unwrap();
    assert_eq!(&state.received_commands()[..2], &["I", "0*!"]);

    handle.shutdown().await.unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();
    sim.shutdown().await.unwrap();
}

// ============================================================================
// Actions
// ============================================================================

#[tokio::test]
async fn test_routing_actions_update_matrix() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp44).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));
    wait_for(&mut events, is_connected).await;

    handle
        .run_action(Action::RouteInputToOutput { input: 3, output: 2 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 2, 3)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(
        Feedback::InputRoutedToOutput { input: 3, output: 2 }.evaluate(&snapshot),
        FeedbackValue::Boolean(true)
    );

    handle
        .run_action(Action::RouteInputToAll { input: 1 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 4, 1)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.matrix.usage_count(1), 4);
    assert_eq!(snapshot.matrix.usage_count(3), 0);

    handle
        .run_action(Action::DisconnectOutput { output: 2 })
        .await
        .unwrap();
    wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::DataIn { line } if line == "Out02 In00 All")
    })
    .await;

    // The device reports In00 for an untied output; that reply is not a tie
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.matrix.source_of(2), Some(1));
    assert_eq!(
        Feedback::OutputDisconnected { output: 2 }.evaluate(&snapshot),
        FeedbackValue::Boolean(false)
    );

    let state = sim.state().await.unwrap();
    assert_eq!(state.tie(1), Some(1));
    assert_eq!(state.tie(2), None);

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_preset_recall_restores_routes() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp84).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp84));
    wait_for(&mut events, is_connected).await;

    handle
        .run_action(Action::RouteInputToOutput { input: 7, output: 1 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 1, 7)).await;

    handle
        .run_action(Action::SavePreset { preset: 3 })
        .await
        .unwrap();
    handle
        .run_action(Action::RouteInputToOutput { input: 2, output: 1 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 1, 2)).await;

    handle
        .run_action(Action::RecallPreset { preset: 3 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 1, 7)).await;

    assert!(sim.state().await.unwrap().has_preset(3));
    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_audio_and_lock_actions_reach_device() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp88).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp88));
    wait_for(&mut events, is_connected).await;

    handle
        .run_action(Action::SetVolume { output: 5, volume: 50 })
        .await
        .unwrap();
    handle
        .run_action(Action::MuteOutput { output: 6, mute: true })
        .await
        .unwrap();
    handle
        .run_action(Action::FrontPanelLock { lock: true })
        .await
        .unwrap();
    wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::DataIn { line } if line == "Exe1")
    })
    .await;

    let state = sim.state().await.unwrap();
    assert_eq!(state.volume(5), Some(32));
    assert_eq!(state.is_muted(6), Some(true));
    assert!(state.is_locked());

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_device_error_is_reported() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp44).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));
    wait_for(&mut events, is_connected).await;

    handle.send_raw("hello").await.unwrap();
    let event = wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::DeviceError { .. })
    })
    .await;
    assert!(matches!(
        event,
        ControllerEvent::DeviceError {
            error: DeviceError::InvalidCommand
        }
    ));

    // The connection survives device errors
    assert!(handle.snapshot().await.unwrap().connected);

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

// ============================================================================
// Reconnection
// ============================================================================

#[tokio::test]
async fn test_dropped_client_reconnects_once() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp44).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));
    wait_for(&mut events, is_connected).await;

    sim.drop_client().await.unwrap();
    let seen = collect_until(&mut events, is_connected).await;

    assert!(seen
        .iter()
        .any(|e| matches!(e, ControllerEvent::Disconnected)));
    assert!(seen.iter().any(|e| matches!(
        e,
        ControllerEvent::StatusChanged {
            status: ConnectionStatus::Disconnected
        }
    )));
    let scheduled = seen
        .iter()
        .filter(|e| matches!(e, ControllerEvent::ReconnectScheduled { .. }))
        .count();
    assert_eq!(scheduled, 1);

    // Bootstrap runs again on the new session
    wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::DataOut { text } if text == "0*!")
    })
    .await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.connected);
    assert_eq!(snapshot.status, ConnectionStatus::Ok);

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_commands_queue_while_unreachable() {
    // Reserve a port, then leave it closed so the first attempts fail
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));

    wait_for(&mut events, |e| {
        matches!(
            e,
            ControllerEvent::StatusChanged {
                status: ConnectionStatus::ConnectionFailure(_)
            }
        )
    })
    .await;

    handle
        .run_action(Action::RouteInputToOutput { input: 1, output: 1 })
        .await
        .unwrap();
    wait_for(&mut events, |e| {
        matches!(e, ControllerEvent::CommandQueued { text } if text == "1*1!")
    })
    .await;
    assert_eq!(handle.snapshot().await.unwrap().queued_commands, 1);

    handle.shutdown().await.unwrap();
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_update_config_resizes_and_reconnects() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp1616).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));
    wait_for(&mut events, is_connected).await;

    let mut config = config_for(addr, DxpModel::Dxp1616);
    config.output_labels.insert(16, "Confidence Monitor".into());
    handle.update_config(config.clone()).await.unwrap();

    let seen = collect_until(&mut events, is_connected).await;
    assert!(seen.iter().any(|e| matches!(
        e,
        ControllerEvent::MatrixResized {
            inputs: 16,
            outputs: 16
        }
    )));
    assert!(seen
        .iter()
        .any(|e| matches!(e, ControllerEvent::Disconnected)));

    handle
        .run_action(Action::RouteInputToOutput { input: 16, output: 16 })
        .await
        .unwrap();
    wait_for(&mut events, |e| is_route(e, 16, 16)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.matrix.inputs(), 16);
    assert_eq!(snapshot.matrix.outputs(), 16);

    let values = variable_values(&snapshot);
    assert_eq!(values["matrix_size"].to_string(), "16x16");
    assert_eq!(values["output_16_source"].to_string(), "Input 16");
    assert!(variable_definitions(&config)
        .iter()
        .any(|d| d.name == "Confidence Monitor Source Input"));

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_to_bad_config_stops_retrying() {
    let (addr, sim) = spawn_virtual_switcher(DxpModel::Dxp44).await.unwrap();
    let (handle, mut events, _task) = spawn_controller(config_for(addr, DxpModel::Dxp44));
    wait_for(&mut events, is_connected).await;

    let mut config = config_for(addr, DxpModel::Dxp44);
    config.host.clear();
    handle.update_config(config).await.unwrap();

    let seen = collect_until(&mut events, |e| {
        matches!(
            e,
            ControllerEvent::StatusChanged {
                status: ConnectionStatus::BadConfig(_)
            }
        )
    })
    .await;
    assert!(!seen
        .iter()
        .any(|e| matches!(e, ControllerEvent::ReconnectScheduled { .. })));

    // No further attempts are made
    tokio::time::sleep(Duration::from_millis(200)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.connected);
    assert!(matches!(snapshot.status, ConnectionStatus::BadConfig(_)));
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, ControllerEvent::Connected { .. }));
    }

    handle.shutdown().await.unwrap();
    sim.shutdown().await.unwrap();
}
