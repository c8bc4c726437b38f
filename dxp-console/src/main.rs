//! Extron DXP Control Console
//!
//! A terminal front end for an Extron DXP HD 4K Plus matrix switcher: reads
//! routing commands from stdin, prints controller events, and can run
//! against a built-in virtual switcher.

mod commands;
mod display;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{ConsoleCommand, HELP};
use dxp_control::{spawn_controller, ControlError, ControllerHandle};
use dxp_protocol::DxpModel;
use dxp_sim::spawn_virtual_switcher;
use settings::Settings;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Control an Extron DXP matrix switcher from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Switcher IP address or host name
    #[arg(long)]
    host: Option<String>,

    /// Switcher TCP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Switcher model (dxp44, dxp66, dxp84, dxp88, dxp1212, dxp1616)
    #[arg(short, long)]
    model: Option<DxpModel>,

    /// Delay between reconnection attempts
    #[arg(long)]
    reconnect_interval_ms: Option<u64>,

    /// Print every line sent to and received from the switcher
    #[arg(long)]
    traffic: bool,

    /// Connect to a built-in virtual switcher instead of hardware
    #[arg(long)]
    simulate: bool,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,
}

impl Args {
    /// Apply command line overrides on top of file settings
    fn apply(&self, settings: &mut Settings) {
        let connection = &mut settings.connection;
        if let Some(host) = &self.host {
            connection.host = host.clone();
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(model) = self.model {
            connection.device_model = model;
        }
        if let Some(ms) = self.reconnect_interval_ms {
            connection.reconnect_interval_ms = ms;
        }
        if self.traffic {
            settings.show_traffic = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dxp_console=info,dxp_protocol=info,dxp_control=info,dxp_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting DXP console");

    let settings_path = match &args.config {
        Some(path) => path.clone(),
        None => Settings::default_path().context("Could not determine settings path")?,
    };
    let mut settings = Settings::load_from(&settings_path)?;
    args.apply(&mut settings);

    if args.save {
        settings.save_to(&settings_path)?;
        info!("Saved settings to {}", settings_path.display());
    }

    let mut config = settings.connection.clone();
    let simulator = if args.simulate {
        let (addr, handle) = spawn_virtual_switcher(config.device_model)
            .await
            .context("Failed to start virtual switcher")?;
        config.host = addr.ip().to_string();
        config.port = addr.port();
        Some(handle)
    } else {
        None
    };

    let (handle, mut events, controller_task) = spawn_controller(config);

    let show_traffic = settings.show_traffic;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = display::describe_event(&event, show_traffic) {
                println!("{}", line);
            }
        }
    });

    println!("Type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match commands::parse(&line) {
            Ok(Some(command)) => {
                if !run_command(&handle, command).await? {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    handle.shutdown().await?;
    controller_task.await.context("Controller task failed")?;
    printer.await.context("Event printer failed")?;

    if let Some(simulator) = simulator {
        simulator.shutdown().await?;
    }

    info!("DXP console stopped");
    Ok(())
}

/// Run one console command. Returns false when the console should exit.
async fn run_command(handle: &ControllerHandle, command: ConsoleCommand) -> Result<bool> {
    match command {
        ConsoleCommand::Action(action) => match handle.run_action(action).await {
            Ok(()) => {}
            Err(ControlError::ControllerClosed) => return Err(ControlError::ControllerClosed.into()),
            Err(e) => println!("Error: {}", e),
        },
        ConsoleCommand::Raw(text) => handle.send_raw(text).await?,
        ConsoleCommand::Show => print!("{}", display::format_variables(&handle.snapshot().await?)),
        ConsoleCommand::Matrix => print!("{}", display::format_matrix(&handle.snapshot().await?)),
        ConsoleCommand::Feedback(feedback) => {
            let snapshot = handle.snapshot().await?;
            let value = feedback.evaluate(&snapshot);
            println!("{}", display::format_feedback(&feedback, &value));
        }
        ConsoleCommand::Help => println!("{}", HELP),
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}
