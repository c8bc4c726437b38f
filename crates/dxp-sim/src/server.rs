//! Virtual switcher TCP server
//!
//! Serves a [`VirtualSwitcher`] over TCP so the controller can be exercised
//! against a real socket. Clients are served one at a time, like the
//! hardware's single control session.

use std::net::SocketAddr;

use dxp_protocol::{DxpCodec, DxpModel, LINE_TERMINATOR};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::switcher::VirtualSwitcher;

/// Commands that can be sent to a running virtual switcher server
#[derive(Debug)]
pub enum SwitcherCommand {
    /// Close the current client connection (the listener stays open)
    DropClient,
    /// Read the switcher state
    Snapshot {
        /// Receives a copy of the switcher
        response: oneshot::Sender<VirtualSwitcher>,
    },
    /// Stop the server
    Shutdown,
}

/// How a client session ended
enum SessionEnd {
    /// Client closed or the socket failed
    Closed,
    /// Dropped on request
    Dropped,
    /// Server asked to stop
    Shutdown,
}

/// Run the virtual switcher server
///
/// Accepts clients from `listener` until [`SwitcherCommand::Shutdown`]
/// arrives or every command sender is dropped.
pub async fn run_virtual_switcher(
    listener: TcpListener,
    mut switcher: VirtualSwitcher,
    mut cmd_rx: mpsc::Receiver<SwitcherCommand>,
) -> Result<(), SimError> {
    info!(
        "Virtual {} listening on {}",
        switcher.model(),
        listener.local_addr()?
    );

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                info!("Virtual switcher client connected from {}", peer);
                match serve_client(stream, &mut switcher, &mut cmd_rx).await {
                    SessionEnd::Closed => info!("Virtual switcher client {} disconnected", peer),
                    SessionEnd::Dropped => info!("Virtual switcher dropped client {}", peer),
                    SessionEnd::Shutdown => break,
                }
            }

            cmd = cmd_rx.recv() => match cmd {
                Some(SwitcherCommand::Snapshot { response }) => {
                    let _ = response.send(switcher.clone());
                }
                Some(SwitcherCommand::DropClient) => debug!("No client to drop"),
                Some(SwitcherCommand::Shutdown) | None => break,
            }
        }
    }

    info!("Virtual switcher shutting down");
    Ok(())
}

async fn serve_client(
    stream: TcpStream,
    switcher: &mut VirtualSwitcher,
    cmd_rx: &mut mpsc::Receiver<SwitcherCommand>,
) -> SessionEnd {
    let (mut reader, mut writer) = stream.into_split();
    let mut codec = DxpCodec::new();
    let mut buf = [0u8; 512];

    loop {
        tokio::select! {
            result = reader.read(&mut buf) => {
                let n = match result {
                    Ok(0) => return SessionEnd::Closed,
                    Ok(n) => n,
                    Err(e) => {
                        warn!("Virtual switcher read error: {}", e);
                        return SessionEnd::Closed;
                    }
                };

                codec.push_bytes(&buf[..n]);
                while let Some(line) = codec.next_line() {
                    for response in switcher.process_line(&line) {
                        let out = format!("{}{}", response, LINE_TERMINATOR);
                        if let Err(e) = writer.write_all(out.as_bytes()).await {
                            warn!("Virtual switcher write error: {}", e);
                            return SessionEnd::Closed;
                        }
                    }
                }
            }

            cmd = cmd_rx.recv() => match cmd {
                Some(SwitcherCommand::Snapshot { response }) => {
                    let _ = response.send(switcher.clone());
                }
                Some(SwitcherCommand::DropClient) => return SessionEnd::Dropped,
                Some(SwitcherCommand::Shutdown) | None => return SessionEnd::Shutdown,
            }
        }
    }
}

/// Control handle for a spawned virtual switcher
#[derive(Debug)]
pub struct SwitcherHandle {
    tx: mpsc::Sender<SwitcherCommand>,
    task: JoinHandle<Result<(), SimError>>,
}

impl SwitcherHandle {
    /// Close the current client connection
    pub async fn drop_client(&self) -> Result<(), SimError> {
        self.tx
            .send(SwitcherCommand::DropClient)
            .await
            .map_err(|_| SimError::Stopped)
    }

    /// Copy of the switcher state
    pub async fn state(&self) -> Result<VirtualSwitcher, SimError> {
        let (response, rx) = oneshot::channel();
        self.tx
            .send(SwitcherCommand::Snapshot { response })
            .await
            .map_err(|_| SimError::Stopped)?;
        rx.await.map_err(|_| SimError::Stopped)
    }

    /// Stop the server and wait for it to exit
    pub async fn shutdown(self) -> Result<(), SimError> {
        let _ = self.tx.send(SwitcherCommand::Shutdown).await;
        self.task.await.map_err(|_| SimError::Stopped)?
    }
}

/// Start a virtual switcher of `model` on an ephemeral localhost port
pub async fn spawn_virtual_switcher(
    model: DxpModel,
) -> Result<(SocketAddr, SwitcherHandle), SimError> {
    spawn_switcher(VirtualSwitcher::new(model)).await
}

/// Start a prepared virtual switcher on an ephemeral localhost port
pub async fn spawn_switcher(
    switcher: VirtualSwitcher,
) -> Result<(SocketAddr, SwitcherHandle), SimError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let (tx, cmd_rx) = mpsc::channel(32);
    let task = tokio::spawn(run_virtual_switcher(listener, switcher, cmd_rx));

    Ok((addr, SwitcherHandle { tx, task }))
}
