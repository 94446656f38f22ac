// Framework bootstrap for the shooter runtime.

use crate::frameworks::config::{self, LogFormat};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::GameSettings;

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tracing_subscriber::EnvFilter;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = match config::log_format() {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("tracing subscriber already installed: {e}");
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state()?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Result<Arc<AppState>> {
    let tuning = config::load_tuning().map_err(|e| {
        tracing::error!(error = %e, "failed to load tuning");
        std::io::Error::other(e)
    })?;
    let seed = config::seed();
    tracing::debug!(
        seed,
        tuning_path = ?config::tuning_path(),
        max_targets = tuning.targets.max_count,
        "session template configured"
    );

    Ok(Arc::new(AppState {
        session_template: GameSettings {
            tuning,
            seed,
            frame_interval: config::FRAME_INTERVAL,
            detection_interval: config::DETECTION_INTERVAL,
            max_frame_step: config::MAX_FRAME_STEP,
            reading_channel_capacity: config::READING_CHANNEL_CAPACITY,
            control_channel_capacity: config::CONTROL_CHANNEL_CAPACITY,
            frame_broadcast_capacity: config::FRAME_BROADCAST_CAPACITY,
        },
    }))
}
