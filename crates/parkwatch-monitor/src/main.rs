//! Parkwatch monitor - parking slot controller
//!
//! Runs the slot monitor against simulated bays and the parking service
//! configured through `PARKWATCH_*` environment variables. Stops on Ctrl-C
//! after the current tick.

use std::sync::Arc;
use std::time::Instant;

use parkwatch_auth::{AuthorizedClient, ReqwestTransport, SessionManager};
use parkwatch_core::SlotId;
use parkwatch_monitor::simulation::{DemoPlates, SimulatedActuator, TrafficSensor};
use parkwatch_monitor::{Bay, MonitorConfig, ParkingMonitor};
use parkwatch_sync::{Coordinator, ResolverClient};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parkwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting parkwatch monitor");

    let config = MonitorConfig::from_env()?;

    tracing::info!(
        slots = config.slots,
        capacity = ?config.capacity,
        tick_ms = config.tick_interval_ms,
        api = ?config.api,
        "Loaded monitor configuration"
    );

    let transport = Arc::new(ReqwestTransport::new(&config.api));
    let session = Arc::new(SessionManager::new(config.api.clone(), transport));
    let client = AuthorizedClient::new(session);
    let resolver = ResolverClient::new(client.clone(), config.endpoints.clone());
    let coordinator = Coordinator::new(client, config.endpoints.clone());

    let bays = (0..config.slots)
        .map(|i| {
            let (actuator, _log) = SimulatedActuator::new(SlotId::from_index(i));
            Bay::new(
                TrafficSensor::new(config.arrive_chance, config.leave_chance),
                actuator,
            )
        })
        .collect();

    let mut monitor = ParkingMonitor::new(
        &config.sensing,
        bays,
        DemoPlates::new(),
        resolver,
        coordinator,
        Instant::now(),
    )?;
    if let Some(capacity) = config.capacity {
        monitor = monitor.with_capacity(capacity)?;
    }

    if let Some(plate) = &config.self_test_plate {
        match monitor.self_test(plate).await {
            Ok(lookup) => tracing::info!(plate = %plate, result = ?lookup, "Self-test finished"),
            Err(e) => tracing::error!(plate = %plate, error = %e, "Self-test login failed"),
        }
    }

    let mut interval = tokio::time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = monitor.tick(Instant::now()).await;
                for event in &events {
                    tracing::debug!(?event, "Slot event");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    tracing::info!(parked = monitor.registry().len(), "Parkwatch monitor stopped");
    Ok(())
}
