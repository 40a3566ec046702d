//! Emergency-corridor preemption across both intersections.
//!
//! Lock order is always F10 (west) then F11 (east), whichever end the
//! emergency starts from. Corridors are single-flight: a second emergency
//! vehicle waits on the gate until the active corridor is cleared.

use crate::communication::messages::ControlSignal;
use crate::error::SimulationError;
use crate::models::intersection::{CorridorDirection, IntersectionId, IntersectionState};
use crate::models::vehicle::{Vehicle, VehicleId};
use crate::monitoring::event_log::SimEvent;
use crate::simulation_engine::context::SimContext;
use log::info;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The corridor currently holding both intersections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveCorridor {
    pub vehicle: VehicleId,
    pub direction: CorridorDirection,
}

#[derive(Debug)]
pub struct EmergencyCoordinator {
    gate: Arc<Semaphore>,
    active: Mutex<Option<ActiveCorridor>>,
}

impl Default for EmergencyCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl EmergencyCoordinator {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(1)),
            active: Mutex::new(None),
        }
    }

    pub fn active(&self) -> Option<ActiveCorridor> {
        *self.lock_active()
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveCorridor>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Refuses any further corridor; pending activations fail.
    pub fn close(&self) {
        self.gate.close();
    }
}

fn lock_both(ctx: &SimContext) -> (MutexGuard<'_, IntersectionState>, MutexGuard<'_, IntersectionState>) {
    let west = ctx.intersection(IntersectionId::F10).lock();
    let east = ctx.intersection(IntersectionId::F11).lock();
    (west, east)
}

/// Opens a corridor for `vehicle`. Only a vehicle that spawned at F10 WEST
/// (eastbound) or F11 EAST (westbound) may open one; anything else is an
/// `InvalidEmergencySpawn` and leaves every light untouched.
pub async fn activate_corridor(
    ctx: &Arc<SimContext>,
    vehicle: &Vehicle,
) -> Result<CorridorGuard, SimulationError> {
    let direction = CorridorDirection::from_spawn(vehicle.spawn_intersection, vehicle.spawn_side)
        .ok_or(SimulationError::InvalidEmergencySpawn {
            intersection: vehicle.spawn_intersection,
            side: vehicle.spawn_side,
        })?;

    let permit = Arc::clone(&ctx.corridor().gate)
        .acquire_owned()
        .await
        .map_err(|_| SimulationError::CorridorUnavailable)?;

    let route = direction.route();
    {
        let (mut west, mut east) = lock_both(ctx);
        west.apply_corridor(route);
        east.apply_corridor(route);
    }
    *ctx.corridor().lock_active() = Some(ActiveCorridor {
        vehicle: vehicle.id,
        direction,
    });

    info!(
        "[EMERGENCY] {direction} corridor activated for vehicle {}: {}",
        vehicle.id,
        direction.path()
    );
    ctx.emit(SimEvent::EmergencyStarted {
        vehicle: vehicle.id,
        direction,
        path: direction.path().to_string(),
    });
    ctx.control().broadcast(ControlSignal::Emergency(direction));

    Ok(CorridorGuard {
        ctx: Arc::clone(ctx),
        vehicle: vehicle.id,
        direction,
        _permit: permit,
    })
}

/// Holds an active corridor. Dropping it (or calling [`CorridorGuard::release`])
/// clears both emergency flags, forces both intersections to all-RED and
/// tells the phase authorities to resume.
pub struct CorridorGuard {
    ctx: Arc<SimContext>,
    vehicle: VehicleId,
    direction: CorridorDirection,
    _permit: OwnedSemaphorePermit,
}

impl CorridorGuard {
    pub fn direction(&self) -> CorridorDirection {
        self.direction
    }

    pub fn release(self) {}
}

impl Drop for CorridorGuard {
    fn drop(&mut self) {
        {
            let (mut west, mut east) = lock_both(&self.ctx);
            west.clear_corridor();
            east.clear_corridor();
        }
        *self.ctx.corridor().lock_active() = None;

        info!(
            "[EMERGENCY] {} corridor cleared by vehicle {}, resuming normal cycling",
            self.direction, self.vehicle
        );
        self.ctx.emit(SimEvent::EmergencyCleared {
            vehicle: self.vehicle,
            direction: self.direction,
        });
        self.ctx.control().broadcast(ControlSignal::EmergencyClear);
    }
}
