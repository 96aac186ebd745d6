// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hearthlink` command-line front-end.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hearthlink::command::{Action, CommandFamily};
use hearthlink::config::{ControllerConfig, DEFAULT_CONFIG_FILE};
use hearthlink::{Controller, DeviceEvent, DeviceSnapshot};
use tokio::sync::broadcast::error::RecvError;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "hearthlink")]
#[command(about = "Watch and control MQTT smart-home devices")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and print device events until Ctrl-C
    Watch,

    /// List the configured devices
    Devices,

    /// Send one command and wait until it is published
    Send {
        /// Device routing key
        device: String,

        /// Action: on, off, brightness, warmth
        action: Action,

        /// Level for brightness and warmth
        value: Option<u32>,

        /// Seconds to wait for the dispatcher
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ControllerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command {
        Commands::Devices => {
            list_devices(&config);
            Ok(())
        }
        Commands::Watch => watch(&config).await,
        Commands::Send {
            device,
            action,
            value,
            timeout,
        } => send(&config, &device, action, value, Duration::from_secs(timeout)).await,
    }
}

fn list_devices(config: &ControllerConfig) {
    println!("{} device(s):", config.devices.len());
    for (i, device) in config.devices.iter().enumerate() {
        println!(
            "  [{i}] {} ({}) type={} mode={}",
            device.pretty_name(),
            device.name(),
            device.kind(),
            device.mode()
        );
    }
}

async fn watch(config: &ControllerConfig) -> Result<()> {
    info!("hearthlink v{}", env!("CARGO_PKG_VERSION"));
    let controller = Controller::connect(config).await?;
    let mut events = controller.subscribe();

    for snapshot in controller.snapshots() {
        print_snapshot(&snapshot);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => match event {
                Ok(event) => print_event(&controller, &event),
                Err(RecvError::Lagged(n)) => println!("(skipped {n} events)"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("Shutting down");
    controller.shutdown().await?;
    Ok(())
}

async fn send(
    config: &ControllerConfig,
    device: &str,
    action: Action,
    value: Option<u32>,
    timeout: Duration,
) -> Result<()> {
    let controller = Controller::connect(config).await?;
    let Some(index) = controller.device_index(device) else {
        bail!("no device named '{device}' in {} devices", controller.registry().len());
    };

    let mut events = controller.subscribe();
    controller.post_command(index.get(), CommandFamily::OpenBkLight, action, value)?;

    let outcome = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(DeviceEvent::CommandDispatched { device, topic, payload }) if device == index => {
                    return Ok::<_, anyhow::Error>(format!("{topic} {payload}"));
                }
                Ok(DeviceEvent::CommandFailed { device, error }) if device == index => {
                    return Err(anyhow::anyhow!(error));
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => bail!("event bus closed"),
            }
        }
    })
    .await
    .context("timed out waiting for the dispatcher")?;

    controller.shutdown().await?;
    println!("sent: {}", outcome?);
    Ok(())
}

fn print_event(controller: &Controller, event: &DeviceEvent) {
    let device = event.device();
    let name = controller
        .snapshot(device.get())
        .map_or_else(|| device.to_string(), |s| s.device.pretty_name().to_string());

    match event {
        DeviceEvent::ConnectivityChanged { online, .. } => {
            println!("{name}: {}", if *online { "online" } else { "offline" });
        }
        DeviceEvent::StateReplaced { .. } => {
            if let Some(snapshot) = controller.snapshot(device.get()) {
                print_snapshot(&snapshot);
            }
        }
        DeviceEvent::StateCleared { reason, .. } => println!("{name}: state cleared ({reason})"),
        DeviceEvent::StatusReceived { payload, .. } => println!("{name}: status {payload}"),
        DeviceEvent::CommandDispatched { topic, payload, .. } => {
            println!("{name}: sent {topic} {payload}");
        }
        DeviceEvent::CommandFailed { error, .. } => println!("{name}: command failed ({error})"),
    }
}

fn print_snapshot(snapshot: &DeviceSnapshot) {
    let state = &snapshot.state;
    if state.is_clean() {
        println!(
            "{}: {} no state",
            snapshot.device.pretty_name(),
            if snapshot.online { "online," } else { "offline," }
        );
        return;
    }
    println!(
        "{}: power={} dimmer={} ssid={} signal={}% uptime={}",
        snapshot.device.pretty_name(),
        state.power(),
        state.dimmer(),
        state.wifi().ssid(),
        snapshot.wifi_signal_percent().unwrap_or(0),
        state.uptime()
    );
}
