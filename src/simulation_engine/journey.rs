//! One vehicle agent: approach, cross, maybe park, maybe transit, complete.

use crate::control_system::emergency::activate_corridor;
use crate::error::SimulationError;
use crate::models::vehicle::Vehicle;
use crate::monitoring::event_log::SimEvent;
use crate::simulation_engine::context::SimContext;
use crate::simulation_engine::intersections::WaitOutcome;
use crate::simulation_engine::parking::Admission;
use log::{debug, warn};
use std::sync::Arc;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyOutcome {
    Completed,
    /// Shutdown was observed before the vehicle left the simulation.
    Interrupted,
}

/// Drives `vehicle` until it leaves the simulation or shutdown is observed.
/// A completed journey is counted exactly once.
pub async fn simulate_vehicle_journey(mut vehicle: Vehicle, ctx: Arc<SimContext>) -> JourneyOutcome {
    let outcome = if vehicle.is_emergency() {
        emergency_path(&mut vehicle, &ctx).await
    } else {
        normal_path(&mut vehicle, &ctx).await
    };

    if outcome == JourneyOutcome::Completed {
        ctx.emit(SimEvent::VehicleCompleted {
            vehicle: vehicle.id,
            vehicle_type: vehicle.vehicle_type,
        });
        let completed = ctx.record_completion();
        debug!("[VEHICLE {}] completed ({completed} so far)", vehicle.id);
    } else {
        debug!("[VEHICLE {}] interrupted by shutdown", vehicle.id);
    }
    outcome
}

async fn normal_path(vehicle: &mut Vehicle, ctx: &SimContext) -> JourneyOutcome {
    loop {
        let intersection = ctx.intersection(vehicle.current_intersection);
        let side = vehicle.current_side;

        let blocked_on = {
            let mut state = intersection.lock();
            state.register_waiting(side, vehicle.id);
            let light = state.light(side);
            (!state.can_proceed(side)).then_some(light)
        };
        if let Some(light) = blocked_on {
            ctx.emit(SimEvent::VehicleWaiting {
                vehicle: vehicle.id,
                intersection: vehicle.current_intersection,
                side,
                light,
            });
        }

        if intersection
            .wait_for_green(vehicle.id, side, ctx.shutdown_flag())
            .await
            == WaitOutcome::Shutdown
        {
            return JourneyOutcome::Interrupted;
        }

        ctx.emit(SimEvent::VehicleEntered {
            vehicle: vehicle.id,
            intersection: vehicle.current_intersection,
            side,
        });
        sleep(ctx.config().crossing()).await;

        if vehicle.wants_parking {
            park(vehicle, ctx).await;
        }

        if !leave_intersection(vehicle, ctx) {
            return JourneyOutcome::Completed;
        }
    }
}

async fn park(vehicle: &Vehicle, ctx: &SimContext) {
    let lot = ctx.parking_lot(vehicle.current_intersection);
    let admission = lot
        .seek_parking(vehicle, ctx.config().wait_queue_retry(), ctx.sink())
        .await;

    match admission {
        Admission::Parked { via_wait_queue } => {
            debug!(
                "[VEHICLE {}] parked at {} (via wait queue: {via_wait_queue})",
                vehicle.id,
                lot.id()
            );
            ctx.emit(SimEvent::ParkingEntered {
                vehicle: vehicle.id,
                lot: lot.id(),
            });
            sleep(vehicle.parking_time).await;
            lot.release(vehicle.id);
            ctx.emit(SimEvent::ParkingExited {
                vehicle: vehicle.id,
                lot: lot.id(),
            });
        }
        Admission::QueueFull | Admission::RetryFailed | Admission::Refused => {
            ctx.emit(SimEvent::ParkingSkipped {
                vehicle: vehicle.id,
                lot: lot.id(),
            });
        }
    }
}

/// Emits the exit and either moves the vehicle onto the paired
/// intersection (returns `true`) or marks it as gone.
fn leave_intersection(vehicle: &mut Vehicle, ctx: &SimContext) -> bool {
    let exit = vehicle.exit_side();
    ctx.emit(SimEvent::VehicleExited {
        vehicle: vehicle.id,
        intersection: vehicle.current_intersection,
        side: exit,
    });

    match vehicle.current_intersection.transition(exit) {
        Some((next, entry)) => {
            ctx.emit(SimEvent::VehicleTransit {
                vehicle: vehicle.id,
                from: vehicle.current_intersection,
                to: next,
            });
            vehicle.current_intersection = next;
            vehicle.current_side = entry;
            true
        }
        None => {
            vehicle.has_exited = true;
            false
        }
    }
}

async fn emergency_path(vehicle: &mut Vehicle, ctx: &Arc<SimContext>) -> JourneyOutcome {
    match activate_corridor(ctx, vehicle).await {
        Ok(corridor) => {
            let outcome = cross_segments(vehicle, ctx).await;
            corridor.release();
            outcome
        }
        Err(SimulationError::InvalidEmergencySpawn { intersection, side }) => {
            ctx.emit(SimEvent::InvalidEmergencySpawn {
                vehicle: vehicle.id,
                intersection,
                side,
            });
            cross_segments(vehicle, ctx).await
        }
        Err(error) => {
            warn!("[VEHICLE {}] no corridor: {error}", vehicle.id);
            JourneyOutcome::Interrupted
        }
    }
}

/// Crosses back-to-back without waiting for green.
async fn cross_segments(vehicle: &mut Vehicle, ctx: &SimContext) -> JourneyOutcome {
    loop {
        if ctx.is_shutting_down() {
            return JourneyOutcome::Interrupted;
        }
        ctx.emit(SimEvent::VehicleEntered {
            vehicle: vehicle.id,
            intersection: vehicle.current_intersection,
            side: vehicle.current_side,
        });
        sleep(ctx.config().crossing()).await;

        if !leave_intersection(vehicle, ctx) {
            return JourneyOutcome::Completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::channels::open_channels;
    use crate::config::SimulationConfig;
    use crate::models::intersection::{Axis, IntersectionId, Side};
    use crate::models::vehicle::{Direction, VehicleAttributes, VehicleType};
    use crate::monitoring::event_log::RecordingSink;
    use std::time::Duration;

    fn context(sink: Arc<RecordingSink>) -> Arc<SimContext> {
        let channels = open_channels(16).unwrap();
        Arc::new(SimContext::new(
            SimulationConfig::default(),
            channels.control,
            sink,
        ))
    }

    fn vehicle(
        id: u64,
        vehicle_type: VehicleType,
        intersection: IntersectionId,
        side: Side,
        direction: Direction,
        wants_parking: bool,
    ) -> Vehicle {
        Vehicle::new(
            id,
            VehicleAttributes {
                vehicle_type,
                intersection,
                side,
                direction,
                wants_parking,
                parking_time: Duration::from_secs(2),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn car_waits_for_green_then_leaves() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = context(Arc::clone(&sink));
        let car = vehicle(1, VehicleType::Car, IntersectionId::F10, Side::North, Direction::Right, false);
        let journey = tokio::spawn(simulate_vehicle_journey(car, Arc::clone(&ctx)));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!journey.is_finished());
        assert_eq!(
            ctx.intersection(IntersectionId::F10).snapshot().waiting[0],
            (Side::North, 1)
        );

        ctx.intersection(IntersectionId::F10).lock().open_axis(Axis::NorthSouth);
        ctx.intersection(IntersectionId::F10).wake_axis(Axis::NorthSouth);

        assert_eq!(journey.await.unwrap(), JourneyOutcome::Completed);
        assert_eq!(ctx.completed(), 1);
        // NORTH + RIGHT exits WEST, which leaves the simulation.
        assert!(sink.events().contains(&SimEvent::VehicleExited {
            vehicle: 1,
            intersection: IntersectionId::F10,
            side: Side::West,
        }));
        assert_eq!(sink.count(|e| matches!(e, SimEvent::VehicleTransit { .. })), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn boundary_exit_continues_at_the_paired_intersection() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = context(Arc::clone(&sink));
        for id in IntersectionId::ALL {
            ctx.intersection(id).lock().open_axis(Axis::EastWest);
        }
        let bus = vehicle(2, VehicleType::Bus, IntersectionId::F10, Side::West, Direction::Straight, false);

        let outcome = simulate_vehicle_journey(bus, Arc::clone(&ctx)).await;
        assert_eq!(outcome, JourneyOutcome::Completed);
        assert!(sink.events().contains(&SimEvent::VehicleTransit {
            vehicle: 2,
            from: IntersectionId::F10,
            to: IntersectionId::F11,
        }));
        assert!(sink.events().contains(&SimEvent::VehicleEntered {
            vehicle: 2,
            intersection: IntersectionId::F11,
            side: Side::West,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn parking_is_tried_at_every_intersection_crossed() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = context(Arc::clone(&sink));
        for id in IntersectionId::ALL {
            ctx.intersection(id).lock().open_axis(Axis::EastWest);
        }
        let car = vehicle(3, VehicleType::Car, IntersectionId::F11, Side::East, Direction::Straight, true);

        simulate_vehicle_journey(car, Arc::clone(&ctx)).await;
        let lots: Vec<IntersectionId> = sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                SimEvent::ParkingEntered { vehicle: 3, lot } => Some(lot),
                _ => None,
            })
            .collect();
        assert_eq!(lots, vec![IntersectionId::F11, IntersectionId::F10]);
        assert_eq!(sink.count(|e| matches!(e, SimEvent::ParkingExited { .. })), 2);
        assert_eq!(ctx.parking_lot(IntersectionId::F11).parked_count(), 0);
        assert_eq!(ctx.parking_lot(IntersectionId::F10).parked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_a_waiting_vehicle() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = context(Arc::clone(&sink));
        let car = vehicle(4, VehicleType::Tractor, IntersectionId::F11, Side::South, Direction::Left, false);
        let journey = tokio::spawn(simulate_vehicle_journey(car, Arc::clone(&ctx)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        ctx.begin_shutdown();
        assert_eq!(journey.await.unwrap(), JourneyOutcome::Interrupted);
        assert_eq!(ctx.completed(), 0);
        assert_eq!(ctx.intersection(IntersectionId::F11).snapshot().waiting[1], (Side::South, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn misplaced_emergency_vehicle_still_completes() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = context(Arc::clone(&sink));
        let truck = vehicle(5, VehicleType::Firetruck, IntersectionId::F10, Side::North, Direction::Straight, false);

        assert_eq!(
            simulate_vehicle_journey(truck, Arc::clone(&ctx)).await,
            JourneyOutcome::Completed
        );
        assert_eq!(
            sink.count(|e| matches!(e, SimEvent::InvalidEmergencySpawn { .. })),
            1
        );
        assert_eq!(sink.count(|e| matches!(e, SimEvent::EmergencyStarted { .. })), 0);
        assert!(ctx.intersection(IntersectionId::F10).snapshot().all_red());
    }
}
