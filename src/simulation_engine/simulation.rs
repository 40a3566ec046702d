// simulation.rs
use crate::communication::channels::{open_channels, ChannelSet};
use crate::communication::messages::ControlSignal;
use crate::config::SimulationConfig;
use crate::control_system::relay::Relay;
use crate::control_system::traffic_light_controller::{PhaseAuthority, PhaseTiming};
use crate::error::SimulationError;
use crate::models::intersection::IntersectionId;
use crate::models::vehicle::Vehicle;
use crate::monitoring::event_log::{EventSink, SimEvent};
use crate::shared_data::{LotReport, SimulationSummary};
use crate::simulation_engine::context::SimContext;
use crate::simulation_engine::journey::{simulate_vehicle_journey, JourneyOutcome};
use crate::simulation_engine::vehicles::VehicleGenerator;

use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, timeout};

/// Spawns one agent per vehicle, pausing a random gap between spawns.
/// Stops early once shutdown begins and hands back every agent handle.
async fn spawn_vehicles(ctx: Arc<SimContext>) -> Vec<JoinHandle<JourneyOutcome>> {
    let mut generator = VehicleGenerator::new(ctx.config());
    let count = ctx.config().vehicle_count;
    let mut agents = Vec::new();

    for spawned in 0..count {
        if ctx.is_shutting_down() {
            info!("[SPAWNER] shutdown requested after {spawned} of {count} vehicles");
            break;
        }

        let vehicle = Vehicle::new(ctx.next_vehicle_id(), generator.next_attributes());
        ctx.emit(SimEvent::VehicleSpawned {
            vehicle: vehicle.id,
            vehicle_type: vehicle.vehicle_type,
            intersection: vehicle.spawn_intersection,
            side: vehicle.spawn_side,
            direction: vehicle.direction,
            wants_parking: vehicle.wants_parking,
        });
        agents.push(tokio::spawn(simulate_vehicle_journey(vehicle, Arc::clone(&ctx))));

        if spawned + 1 < count {
            sleep(generator.spawn_gap()).await;
        }
    }
    agents
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Runs a full simulation, stopping early on a termination signal.
pub async fn run_simulation(
    config: SimulationConfig,
    sink: Arc<dyn EventSink>,
) -> Result<SimulationSummary, SimulationError> {
    run_simulation_until(config, sink, shutdown_signal()).await
}

/// Runs a full simulation; `interrupt` resolving plays the role of a
/// termination signal.
pub async fn run_simulation_until<F>(
    config: SimulationConfig,
    sink: Arc<dyn EventSink>,
    interrupt: F,
) -> Result<SimulationSummary, SimulationError>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    let ChannelSet {
        control,
        f10_authority,
        f11_authority,
        relay,
    } = open_channels(config.channel_capacity)?;

    let timing = PhaseTiming::from(&config);
    let requested = config.vehicle_count;
    let ctx = Arc::new(SimContext::new(config, control, sink));
    info!("[SIMULATION] starting with {requested} vehicles");

    let mut authorities = Vec::with_capacity(2);
    for link in [f10_authority, f11_authority] {
        let intersection = link.intersection;
        authorities.push((
            intersection,
            tokio::spawn(PhaseAuthority::new(link, timing).run()),
        ));
        ctx.emit(SimEvent::AuthorityStarted { intersection });
    }
    let relay = tokio::spawn(Relay::new(Arc::clone(&ctx), relay).run());
    let mut spawner = tokio::spawn(spawn_vehicles(Arc::clone(&ctx)));

    tokio::pin!(interrupt);
    let spawn_result = tokio::select! {
        joined = &mut spawner => Some(joined),
        _ = &mut interrupt => None,
    };
    let mut terminated_by_signal = spawn_result.is_none();

    if !terminated_by_signal {
        let limit = ctx.config().completion_wait_limit();
        tokio::select! {
            waited = timeout(limit, ctx.wait_for_completions(requested)) => {
                if waited.is_err() {
                    warn!(
                        "[SIMULATION] completion wait limit of {limit:?} reached with {}/{requested} vehicles done",
                        ctx.completed()
                    );
                }
            }
            _ = &mut interrupt => terminated_by_signal = true,
        }
    }
    if terminated_by_signal {
        info!("[SIMULATION] termination requested, shutting down");
    }

    ctx.begin_shutdown();
    ctx.control().broadcast(ControlSignal::Shutdown);

    let spawn_result = match spawn_result {
        Some(joined) => joined,
        None => spawner.await,
    };
    let agents = spawn_result.unwrap_or_else(|e| {
        error!("[SIMULATION] spawner task failed: {e}");
        Vec::new()
    });

    let stop_timeout = ctx.config().authority_stop_timeout();
    for (intersection, mut handle) in authorities {
        let cycles = match timeout(stop_timeout, &mut handle).await {
            Ok(Ok(report)) => report.cycles,
            Ok(Err(e)) => {
                error!("[SIMULATION] {intersection} phase authority failed: {e}");
                0
            }
            Err(_) => {
                warn!("[SIMULATION] {intersection} phase authority did not stop in {stop_timeout:?}, aborting");
                handle.abort();
                0
            }
        };
        ctx.emit(SimEvent::AuthorityStopped {
            intersection,
            cycles,
        });
    }

    match relay.await {
        Ok(stats) => info!(
            "[SIMULATION] relay applied {} events, discarded {}",
            stats.applied, stats.discarded
        ),
        Err(e) => error!("[SIMULATION] relay task failed: {e}"),
    }

    let (interrupted, abandoned) = join_agents(agents).await;
    let summary = SimulationSummary {
        requested,
        spawned: ctx.vehicles_issued(),
        completed: ctx.completed(),
        abandoned,
        interrupted,
        terminated_by_signal,
        lots: IntersectionId::ALL
            .iter()
            .map(|&id| LotReport::from(&ctx.parking_lot(id).snapshot()))
            .collect(),
    };
    info!(
        "[SIMULATION] finished: {}/{} vehicles completed",
        summary.completed, summary.requested
    );
    Ok(summary)
}

/// Waits for every agent. Returns (interrupted, abandoned) counts; an agent
/// that panicked is abandoned.
async fn join_agents(agents: Vec<JoinHandle<JourneyOutcome>>) -> (usize, usize) {
    let mut interrupted = 0;
    let mut abandoned = 0;
    for agent in agents {
        match agent.await {
            Ok(JourneyOutcome::Completed) => {}
            Ok(JourneyOutcome::Interrupted) => interrupted += 1,
            Err(e) => {
                log_abandoned(&e);
                abandoned += 1;
            }
        }
    }
    (interrupted, abandoned)
}

fn log_abandoned(e: &JoinError) {
    if e.is_panic() {
        error!("[SIMULATION] vehicle agent panicked, vehicle abandoned");
    } else {
        error!("[SIMULATION] vehicle agent cancelled: {e}");
    }
}
