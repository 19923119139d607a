//! Serial-to-WebSocket bridge for the door occupancy controller.
//!
//! Run with: cargo run -p presence-bridge-server -- --device /dev/ttyACM0
//!
//! Then connect a WebSocket client to ws://localhost:8080.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use presence_bridge_core::{ClientRegistry, Relay};
use presence_bridge_transport::create_ws_router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    if args.list_ports {
        for port in presence_bridge_serial::available_ports()? {
            println!("{}\t{:?}", port.port_name, port.port_type);
        }
        return Ok(());
    }

    // No relay is possible without the device
    let (device, lines) = presence_bridge_serial::open(&args.serial_config())
        .inspect_err(|e| tracing::error!("Error opening serial port: {e}"))?;

    let relay = Arc::new(Relay::new(
        device,
        Arc::new(ClientRegistry::new()),
        args.initial_max,
    ));
    let forwarder = Arc::clone(&relay).spawn_device_forwarder(lines);

    let addr = args.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        initial_max = args.initial_max,
        "WebSocket server running on ws://{addr}"
    );

    axum::serve(listener, create_ws_router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    forwarder.abort();
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
