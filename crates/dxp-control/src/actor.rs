//! Controller Actor
//!
//! One task owns the TCP link to the switcher together with the routing
//! mirror and device information. Callers talk to it through
//! [`ControllerCommand`]s and observe it through [`ControllerEvent`]s, so
//! no state is shared between tasks.
//!
//! # Architecture
//!
//! The actor `select!`s over two sources:
//! - the command channel (actions, raw commands, config updates, queries)
//! - the link, which is either connecting, reading, waiting for the
//!   reconnect timer, or idle
//!
//! A lost connection always arms exactly one reconnect timer. Expiry starts a
//! fresh attempt, which tears down whatever link is left first.
//!
//! # Example
//!
//! ```rust,no_run
//! use dxp_control::{spawn_controller, Action, ControllerConfig};
//! use dxp_protocol::DxpModel;
//!
//! # async fn demo() -> Result<(), dxp_control::ControlError> {
//! let config = ControllerConfig::new("192.168.1.100", 23, DxpModel::Dxp88);
//! let (handle, mut events, _task) = spawn_controller(config);
//!
//! handle
//!     .run_action(Action::RouteInputToOutput { input: 2, output: 1 })
//!     .await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;

use dxp_protocol::{DxpCodec, DxpCommand, DxpModel, DxpResponse, LINE_TERMINATOR};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

use crate::actions::Action;
use crate::config::ControllerConfig;
use crate::error::ControlError;
use crate::events::ControllerEvent;
use crate::matrix::MatrixState;
use crate::state::{ConnectionStatus, ControllerSnapshot, DeviceInfo};
use crate::variables::{initial_values, variable_values};

/// Commands held back while disconnected before the oldest is dropped
pub const MAX_QUEUED_COMMANDS: usize = 64;

/// Capacity of the command and event channels created by [`spawn_controller`]
pub const CHANNEL_CAPACITY: usize = 256;

const READ_BUFFER_SIZE: usize = 1024;

/// Commands sent to the controller actor
#[derive(Debug)]
pub enum ControllerCommand {
    /// Send a typed command (checked against the configured model)
    Send {
        /// Command to send
        command: DxpCommand,
    },

    /// Send command text verbatim (the terminator is appended)
    SendRaw {
        /// Command text without terminator
        text: String,
    },

    /// Run a user action
    Action {
        /// Action to run
        action: Action,
        /// Receives the validation result
        response: oneshot::Sender<Result<(), ControlError>>,
    },

    /// Read the current state
    QuerySnapshot {
        /// Receives the snapshot
        response: oneshot::Sender<ControllerSnapshot>,
    },

    /// Replace the configuration and reconnect
    UpdateConfig {
        /// New configuration
        config: ControllerConfig,
    },

    /// Close the connection and stop the actor
    Shutdown,
}

type ConnectFuture = Pin<Box<dyn Future<Output = io::Result<TcpStream>> + Send>>;

/// State of the TCP link
enum Link {
    /// No socket and no timer (bad config or shut down)
    Idle,
    /// Connection attempt in flight
    Connecting(ConnectFuture),
    /// Socket open
    Connected {
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
    },
    /// Reconnect timer armed
    Waiting(Pin<Box<Sleep>>),
}

/// What the link produced
enum LinkEvent {
    Connected(TcpStream),
    ConnectFailed(io::Error),
    Data(usize),
    Closed,
    ReadError(io::Error),
    ReconnectDue,
}

/// Wait for the next thing to happen on the link
///
/// Never resolves while idle. Every branch is cancel-safe, so the future can
/// be dropped whenever a command wins the `select!`.
async fn next_link_event(link: &mut Link, buf: &mut [u8]) -> LinkEvent {
    match link {
        Link::Idle => std::future::pending().await,
        Link::Connecting(connect) => match connect.as_mut().await {
            Ok(stream) => LinkEvent::Connected(stream),
            Err(e) => LinkEvent::ConnectFailed(e),
        },
        Link::Connected { reader, .. } => match reader.read(buf).await {
            Ok(0) => LinkEvent::Closed,
            Ok(n) => LinkEvent::Data(n),
            Err(e) => LinkEvent::ReadError(e),
        },
        Link::Waiting(timer) => {
            timer.as_mut().await;
            LinkEvent::ReconnectDue
        }
    }
}

/// Internal state for the controller actor
struct Controller {
    config: ControllerConfig,
    matrix: MatrixState,
    device_info: DeviceInfo,
    status: ConnectionStatus,
    codec: DxpCodec,
    link: Link,
    /// Commands issued while disconnected (not replayed)
    queue: VecDeque<String>,
    event_tx: mpsc::Sender<ControllerEvent>,
}

impl Controller {
    fn new(config: ControllerConfig, event_tx: mpsc::Sender<ControllerEvent>) -> Self {
        Self {
            matrix: MatrixState::for_model(config.device_model),
            config,
            device_info: DeviceInfo::default(),
            status: ConnectionStatus::Connecting,
            codec: DxpCodec::new(),
            link: Link::Idle,
            queue: VecDeque::new(),
            event_tx,
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected { .. })
    }

    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            config: self.config.clone(),
            matrix: self.matrix.clone(),
            device_info: self.device_info.clone(),
            connected: self.is_connected(),
            status: self.status.clone(),
            queued_commands: self.queue.len(),
        }
    }

    async fn emit(&mut self, event: ControllerEvent) {
        let _ = self.event_tx.send(event).await;
    }

    async fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            self.status = status.clone();
            self.emit(ControllerEvent::StatusChanged { status }).await;
        }
    }

    async fn publish_variables(&mut self) {
        let values = variable_values(&self.snapshot());
        self.emit(ControllerEvent::VariablesUpdated { values }).await;
    }

    /// Drop the socket and any armed timer
    async fn disconnect(&mut self) {
        let was_connected = self.is_connected();
        self.link = Link::Idle;
        self.codec.clear();
        if was_connected {
            info!("Disconnected from {}", self.config.address());
            self.emit(ControllerEvent::Disconnected).await;
        }
    }

    /// Start a fresh connection attempt
    async fn connect(&mut self) {
        self.disconnect().await;

        if let Err(e) = self.config.validate() {
            error!("Cannot connect: {}", e);
            let message = match e {
                ControlError::BadConfig(msg) => msg,
                other => other.to_string(),
            };
            self.set_status(ConnectionStatus::BadConfig(message)).await;
            return;
        }

        let address = self.config.address();
        info!("Connecting to {}", address);
        self.set_status(ConnectionStatus::Connecting).await;
        self.link = Link::Connecting(Box::pin(
            async move { TcpStream::connect(address).await },
        ));
    }

    /// Arm the reconnect timer, replacing any timer already armed
    async fn schedule_reconnect(&mut self) {
        let delay = self.config.reconnect_interval();
        debug!("Reconnecting in {:?}", delay);
        self.link = Link::Waiting(Box::pin(sleep(delay)));
        self.emit(ControllerEvent::ReconnectScheduled { delay }).await;
    }

    async fn on_connected(&mut self, stream: TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY: {}", e);
        }
        let (reader, writer) = stream.into_split();
        self.link = Link::Connected { reader, writer };

        let address = self.config.address();
        info!("Connected to Extron DXP at {}", address);
        self.set_status(ConnectionStatus::Ok).await;
        self.emit(ControllerEvent::Connected { address }).await;
        self.publish_variables().await;

        self.send_text(DxpCommand::Information.encode()).await;
        self.send_text(DxpCommand::RouteStatus.encode()).await;
    }

    async fn on_failure(&mut self, message: String) {
        error!("Connection error: {}", message);
        let was_connected = self.is_connected();
        self.link = Link::Idle;
        self.codec.clear();
        if was_connected {
            self.emit(ControllerEvent::Disconnected).await;
        }
        self.set_status(ConnectionStatus::ConnectionFailure(message))
            .await;
        self.publish_variables().await;
        self.schedule_reconnect().await;
    }

    async fn on_closed(&mut self) {
        warn!("Connection closed");
        self.link = Link::Idle;
        self.codec.clear();
        self.emit(ControllerEvent::Disconnected).await;
        self.set_status(ConnectionStatus::Disconnected).await;
        self.publish_variables().await;
        self.schedule_reconnect().await;
    }

    /// Write one command line, or queue it while disconnected
    async fn send_text(&mut self, text: String) {
        if let Link::Connected { writer, .. } = &mut self.link {
            debug!("Sending command: {}", text);
            let line = format!("{}{}", text, LINE_TERMINATOR);
            match writer.write_all(line.as_bytes()).await {
                Ok(()) => self.emit(ControllerEvent::DataOut { text }).await,
                Err(e) => self.on_failure(format!("Write error: {}", e)).await,
            }
        } else {
            warn!("Not connected, queueing command: {}", text);
            if self.queue.len() >= MAX_QUEUED_COMMANDS {
                if let Some(dropped) = self.queue.pop_front() {
                    debug!("Queue full, dropping oldest command: {}", dropped);
                }
            }
            self.queue.push_back(text.clone());
            self.emit(ControllerEvent::CommandQueued { text }).await;
        }
    }

    async fn on_data(&mut self, data: &[u8]) {
        self.codec.push_bytes(data);

        while let Some((response, line)) = self.codec.next_response_with_line() {
            debug!("Received: {}", line);
            self.emit(ControllerEvent::DataIn { line }).await;

            match response {
                DxpResponse::Tie { output, input } => self.apply_tie(output, input).await,
                DxpResponse::DeviceInfo { model } => {
                    if self.device_info.model != model {
                        info!("Device model: {}", model);
                        if let Some(reported) =
                            mismatched_model(self.config.device_model, &model)
                        {
                            warn!(
                                "Device reports a {} but a {} is configured",
                                reported.short_name(),
                                self.config.device_model.short_name()
                            );
                        }
                        self.device_info.model = model;
                        let info = self.device_info.clone();
                        self.emit(ControllerEvent::DeviceInfoChanged { info }).await;
                    }
                }
                DxpResponse::Error(error) => {
                    warn!("Device reported error {}", error);
                    self.emit(ControllerEvent::DeviceError { error }).await;
                }
                DxpResponse::Unknown(_) => {}
            }
        }

        self.publish_variables().await;
    }

    /// Mirror a tie report (1-based numbers)
    async fn apply_tie(&mut self, output: u8, input: u8) {
        if output == 0
            || output > self.matrix.outputs()
            || input == 0
            || input > self.matrix.inputs()
        {
            warn!(
                "Ignoring tie Out{} In{} outside {}x{} matrix",
                output,
                input,
                self.matrix.inputs(),
                self.matrix.outputs()
            );
            return;
        }

        if self.matrix.apply_tie(output, input) {
            debug!("Output {} now fed by input {}", output, input);
            self.emit(ControllerEvent::RouteChanged { output, input })
                .await;
        }
    }

    async fn run_action(&mut self, action: Action) -> Result<(), ControlError> {
        match action.to_command(&self.config) {
            Ok(Some(command)) => {
                if command.is_query() {
                    debug!("{}: {}", action.name(), command);
                } else {
                    info!("{}: {}", action.name(), command);
                }
                self.send_text(command.encode()).await;
                Ok(())
            }
            Ok(None) => {
                info!("{} not confirmed, nothing sent", action.name());
                Ok(())
            }
            Err(e) => {
                warn!("{} rejected: {}", action.name(), e);
                Err(e)
            }
        }
    }

    async fn update_config(&mut self, config: ControllerConfig) {
        info!(
            "Configuration updated: {} ({})",
            config.address(),
            config.device_model
        );
        self.config = config;
        self.matrix.resize(self.config.device_model);
        self.emit(ControllerEvent::MatrixResized {
            inputs: self.matrix.inputs(),
            outputs: self.matrix.outputs(),
        })
        .await;
        self.publish_variables().await;
        self.connect().await;
    }

    /// Handle one command. Returns false when the actor should stop.
    async fn handle_command(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::Send { command } => {
                match command.check(self.config.device_model) {
                    Ok(()) => self.send_text(command.encode()).await,
                    Err(e) => warn!("Not sending {}: {}", command, e),
                }
            }

            ControllerCommand::SendRaw { text } => {
                self.send_text(text).await;
            }

            ControllerCommand::Action { action, response } => {
                let result = self.run_action(action).await;
                let _ = response.send(result);
            }

            ControllerCommand::QuerySnapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            ControllerCommand::UpdateConfig { config } => {
                self.update_config(config).await;
            }

            ControllerCommand::Shutdown => return false,
        }
        true
    }

    async fn handle_link_event(&mut self, event: LinkEvent, buf: &[u8]) {
        match event {
            LinkEvent::Connected(stream) => self.on_connected(stream).await,
            LinkEvent::ConnectFailed(e) => self.on_failure(e.to_string()).await,
            LinkEvent::Data(n) => self.on_data(&buf[..n]).await,
            LinkEvent::Closed => self.on_closed().await,
            LinkEvent::ReadError(e) => self.on_failure(format!("Read error: {}", e)).await,
            LinkEvent::ReconnectDue => {
                info!("Attempting to reconnect...");
                self.connect().await;
            }
        }
    }
}

/// Run the controller actor
///
/// Owns the connection for `config` until [`ControllerCommand::Shutdown`]
/// arrives or every command sender is dropped.
///
/// # Arguments
///
/// * `config` - Initial configuration
/// * `cmd_rx` - Receiver for commands sent to the actor
/// * `event_tx` - Sender for events emitted by the actor
pub async fn run_controller(
    config: ControllerConfig,
    mut cmd_rx: mpsc::Receiver<ControllerCommand>,
    event_tx: mpsc::Sender<ControllerEvent>,
) {
    let mut controller = Controller::new(config, event_tx);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    info!("Controller actor started");

    let values = initial_values(&controller.config);
    controller
        .emit(ControllerEvent::VariablesUpdated { values })
        .await;
    controller.connect().await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                if !controller.handle_command(cmd).await {
                    break;
                }
            }

            event = next_link_event(&mut controller.link, &mut buf) => {
                controller.handle_link_event(event, &buf).await;
            }
        }
    }

    controller.disconnect().await;
    info!("Controller actor stopped");
}

/// The model named in a device information line, when it is a different
/// DXP model than the configured one
fn mismatched_model(configured: DxpModel, info_line: &str) -> Option<DxpModel> {
    DxpModel::from_info_line(info_line).filter(|&reported| reported != configured)
}

/// Cloneable handle for sending commands to a running controller
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerCommand>,
}

impl ControllerHandle {
    /// Wrap a command sender
    pub fn new(tx: mpsc::Sender<ControllerCommand>) -> Self {
        Self { tx }
    }

    async fn send(&self, cmd: ControllerCommand) -> Result<(), ControlError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| ControlError::ControllerClosed)
    }

    /// Send a typed command
    pub async fn send_command(&self, command: DxpCommand) -> Result<(), ControlError> {
        self.send(ControllerCommand::Send { command }).await
    }

    /// Send command text verbatim
    pub async fn send_raw(&self, text: impl Into<String>) -> Result<(), ControlError> {
        self.send(ControllerCommand::SendRaw { text: text.into() })
            .await
    }

    /// Run an action and wait for it to be validated
    pub async fn run_action(&self, action: Action) -> Result<(), ControlError> {
        let (response, rx) = oneshot::channel();
        self.send(ControllerCommand::Action { action, response })
            .await?;
        rx.await.map_err(|_| ControlError::ControllerClosed)?
    }

    /// Fetch the current state
    pub async fn snapshot(&self) -> Result<ControllerSnapshot, ControlError> {
        let (response, rx) = oneshot::channel();
        self.send(ControllerCommand::QuerySnapshot { response })
            .await?;
        rx.await.map_err(|_| ControlError::ControllerClosed)
    }

    /// Replace the configuration (reconnects)
    pub async fn update_config(&self, config: ControllerConfig) -> Result<(), ControlError> {
        self.send(ControllerCommand::UpdateConfig { config }).await
    }

    /// Stop the controller
    pub async fn shutdown(&self) -> Result<(), ControlError> {
        self.send(ControllerCommand::Shutdown).await
    }
}

/// Spawn a controller on the current runtime
///
/// Returns the command handle, the event stream and the actor's task. The
/// event receiver must be drained; the actor waits when it is full.
pub fn spawn_controller(
    config: ControllerConfig,
) -> (
    ControllerHandle,
    mpsc::Receiver<ControllerEvent>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(run_controller(config, cmd_rx, event_tx));
    (ControllerHandle::new(cmd_tx), event_rx, task)
}
