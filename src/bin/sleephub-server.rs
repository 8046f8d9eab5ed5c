// ABOUTME: Server binary for the Sleephub sleep-sensor hub
// ABOUTME: Loads configuration from the environment and serves HTTP and WebSocket until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

//! # Sleephub Server Binary
//!
//! Starts the hub with configuration from the environment; command-line
//! flags override the listen address.

use anyhow::Result;
use clap::Parser;
use sleephub_server::{config::ServerConfig, logging, server::HubServer};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sleephub-server")]
#[command(about = "Sleephub - sleep sensor hub with cycle-aligned wake-up alarms")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override listen address
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Containers sometimes pass arguments clap cannot parse
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using environment configuration only");
            Args {
                http_port: None,
                host: None,
            }
        }
    };

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!("{}", config.summary());
    display_available_endpoints(&config);

    if let Err(e) = HubServer::new(config).run().await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}

fn display_available_endpoints(config: &ServerConfig) {
    let base = format!("http://{}:{}", config.host, config.http_port);
    info!("=== Available Endpoints ===");
    info!("WebSocket (devices and dashboards): ws://{}:{}/ws", config.host, config.http_port);
    info!("Alarm:    POST {base}/api/alarm/set | POST {base}/api/alarm/cancel | GET {base}/api/alarm/:deviceId");
    info!("Sleep:    POST {base}/api/sleep/start | POST {base}/api/sleep/stop | GET {base}/api/sleep/session/:deviceId");
    info!("Devices:  GET  {base}/api/devices");
    info!("Dimmer:   POST {base}/api/dimmer/power | /pattern | /brightness");
    info!("Light:    POST {base}/api/light/brightness | /sunrise | /sunrise/cancel");
    info!("Health:   GET  {base}/health | GET {base}/ready");
}
