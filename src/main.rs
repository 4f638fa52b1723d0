// Copyright (c) 2026 biosafe-guard contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/biosafe-guard/biosafe-guard-rs

//! BioSafe Guard - Wearable Biomedical Safety Monitoring
//!
//! Headless monitoring daemon: subscribes to the wearable's telemetry
//! topic, runs the emergency detection engine over every record, and logs
//! emitted alerts. Optionally pushes the device configuration (retained)
//! on startup.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use biosafe_guard::{Config, DeviceConfigPayload, Monitor, MqttSource, VERSION};

/// BioSafe Guard - Wearable Biomedical Safety Monitoring
#[derive(Parser, Debug)]
#[command(name = "biosafe-guard")]
#[command(version = VERSION)]
#[command(about = "Emergency detection for wearable biomedical telemetry")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker address
    #[arg(long)]
    broker: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    port: Option<u16>,

    /// Publish the device configuration (retained) before monitoring
    #[arg(long)]
    push_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("BioSafe Guard v{} - Biomedical Safety Monitoring", VERSION);

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if let Some(broker) = args.broker {
        config.mqtt.broker = broker;
    }
    if let Some(port) = args.port {
        config.mqtt.port = port;
    }
    config.device.validate()?;

    info!("Monitoring {} on {}:{}", config.mqtt.data_topic, config.mqtt.broker, config.mqtt.port);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.push_config))
}

async fn run(config: Config, push_config: bool) -> Result<()> {
    use tokio::sync::broadcast;

    let source = MqttSource::connect(&config.mqtt)?;

    if push_config {
        let payload = DeviceConfigPayload::from(&config.device);
        source.publish_config(&payload).await?;
    }

    let mut monitor =
        Monitor::with_history_capacity(config.device.clone(), config.history_size);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received...");
        let _ = shutdown_tx.send(());
    });

    monitor.run(source, shutdown_rx).await?;

    info!(
        "Monitor stopped: {} records seen, {} alerts recorded",
        monitor.history().len(),
        monitor.alert_log().len()
    );

    Ok(())
}
