//! # roomlinkd — building gateway sync daemon
//!
//! Composition root that wires the adapters into the sync facade and keeps
//! the local view of the building synchronized until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Construct the WebSocket connector and the REST backend (adapters)
//! - Construct the transport session, encoder and sync facade
//! - Start synchronization and log every change
//! - Tear down cleanly on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use anyhow::Context as _;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use roomlink_adapter_gateway_ws::WsConnector;
use roomlink_adapter_rest_reqwest::HttpBackend;
use roomlink_app::encoder::CommandEncoder;
use roomlink_app::event_bus::InProcessEventBus;
use roomlink_app::facade::SyncFacade;
use roomlink_app::session::TransportSession;
use roomlink_domain::event::SyncEvent;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.logging.filter)
                .unwrap_or_else(|_| EnvFilter::new("roomlinkd=info,roomlink=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        equipment = %config.gateway.equipment_url,
        sensor = %config.gateway.sensor_url,
        api = %config.api.base_url,
        "starting roomlinkd v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Adapters
    let connector = WsConnector::new(config.gateway.clone());
    let backend = HttpBackend::new(&config.api).context("failed to build REST client")?;

    // Session + facade
    let (session, session_events) =
        TransportSession::new(connector, config.gateway.session_config());
    let facade = SyncFacade::new(
        session,
        session_events,
        backend,
        CommandEncoder::new(config.actor.user_id.clone()),
        InProcessEventBus::new(config.event_capacity),
    );

    let mut changes = facade.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => log_change(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change log lagging behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    facade.start().await;
    tracing::info!(
        sensors = facade.store().sensors().len(),
        equipment = facade.store().equipment().len(),
        rooms = facade.store().rooms().len(),
        active_alerts = facade.store().active_alerts().len(),
        "initial population complete"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutting down");

    facade.teardown().await;
    watcher.abort();
    Ok(())
}

fn log_change(event: &SyncEvent) {
    match event {
        SyncEvent::Degraded { channel } => {
            tracing::warn!(%channel, "channel degraded, restart to reconnect");
        }
        SyncEvent::ChannelOpened { channel } => tracing::info!(%channel, "channel open"),
        SyncEvent::ChannelClosed { channel } => tracing::info!(%channel, "channel closed"),
        other => tracing::debug!(event = ?other, "state changed"),
    }
}
