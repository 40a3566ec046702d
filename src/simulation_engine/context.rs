//! The simulation context: every piece of shared state, created once at
//! startup and handed to each component by `Arc`.

use crate::communication::channels::ControlBus;
use crate::config::SimulationConfig;
use crate::control_system::emergency::EmergencyCoordinator;
use crate::models::intersection::IntersectionId;
use crate::models::vehicle::VehicleId;
use crate::monitoring::event_log::{EventSink, SimEvent};
use crate::simulation_engine::intersections::Intersection;
use crate::simulation_engine::parking::ParkingLot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug)]
struct Counters {
    next_vehicle_id: VehicleId,
    completed: usize,
}

pub struct SimContext {
    config: SimulationConfig,
    f10: Intersection,
    f11: Intersection,
    f10_lot: ParkingLot,
    f11_lot: ParkingLot,
    counters: Mutex<Counters>,
    completion: Notify,
    shutdown: AtomicBool,
    corridor: EmergencyCoordinator,
    control: ControlBus,
    sink: Arc<dyn EventSink>,
}

impl SimContext {
    pub fn new(config: SimulationConfig, control: ControlBus, sink: Arc<dyn EventSink>) -> Self {
        let lot = |id| ParkingLot::new(id, config.parking_spots, config.waiting_queue);
        Self {
            f10: Intersection::new(IntersectionId::F10),
            f11: Intersection::new(IntersectionId::F11),
            f10_lot: lot(IntersectionId::F10),
            f11_lot: lot(IntersectionId::F11),
            counters: Mutex::new(Counters {
                next_vehicle_id: 1,
                completed: 0,
            }),
            completion: Notify::new(),
            shutdown: AtomicBool::new(false),
            corridor: EmergencyCoordinator::new(),
            control,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn intersection(&self, id: IntersectionId) -> &Intersection {
        match id {
            IntersectionId::F10 => &self.f10,
            IntersectionId::F11 => &self.f11,
        }
    }

    pub fn parking_lot(&self, id: IntersectionId) -> &ParkingLot {
        match id {
            IntersectionId::F10 => &self.f10_lot,
            IntersectionId::F11 => &self.f11_lot,
        }
    }

    pub fn corridor(&self) -> &EmergencyCoordinator {
        &self.corridor
    }

    pub fn control(&self) -> &ControlBus {
        &self.control
    }

    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    pub fn emit(&self, event: SimEvent) {
        self.sink.emit(event);
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn next_vehicle_id(&self) -> VehicleId {
        let mut counters = self.counters();
        let id = counters.next_vehicle_id;
        counters.next_vehicle_id += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn vehicles_issued(&self) -> usize {
        (self.counters().next_vehicle_id - 1) as usize
    }

    pub fn record_completion(&self) -> usize {
        let completed = {
            let mut counters = self.counters();
            counters.completed += 1;
            counters.completed
        };
        self.completion.notify_waiters();
        completed
    }

    pub fn completed(&self) -> usize {
        self.counters().completed
    }

    /// Resolves once at least `target` vehicles have completed.
    pub async fn wait_for_completions(&self, target: usize) {
        loop {
            let notified = self.completion.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.completed() >= target {
                return;
            }
            notified.await;
        }
    }

    pub fn shutdown_flag(&self) -> &AtomicBool {
        &self.shutdown
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sets the shutdown flag, then wakes every blocked waiter so each one
    /// re-checks its predicate and observes it.
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.f10.wake_all();
        self.f11.wake_all();
        self.corridor.close();
        self.completion.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::channels::open_channels;
    use crate::monitoring::event_log::RecordingSink;

    fn context() -> SimContext {
        let channels = open_channels(4).unwrap();
        SimContext::new(
            SimulationConfig::default(),
            channels.control,
            Arc::new(RecordingSink::new()),
        )
    }

    #[test]
    fn vehicle_ids_are_monotonic_from_one() {
        let ctx = context();
        assert_eq!(ctx.next_vehicle_id(), 1);
        assert_eq!(ctx.next_vehicle_id(), 2);
        assert_eq!(ctx.next_vehicle_id(), 3);
        assert_eq!(ctx.vehicles_issued(), 3);
    }

    #[test]
    fn completions_are_counted() {
        let ctx = context();
        assert_eq!(ctx.record_completion(), 1);
        assert_eq!(ctx.record_completion(), 2);
        assert_eq!(ctx.completed(), 2);
    }

    #[tokio::test]
    async fn completion_waiter_sees_the_target() {
        let ctx = Arc::new(context());
        let waiter = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.wait_for_completions(2).await })
        };
        ctx.record_completion();
        ctx.record_completion();
        waiter.await.unwrap();
        assert!(!ctx.is_shutting_down());
    }

    #[test]
    fn lots_use_configured_capacity() {
        let ctx = context();
        let snapshot = ctx.parking_lot(IntersectionId::F11).snapshot();
        assert_eq!(snapshot.capacity, 10);
        assert_eq!(snapshot.wait_capacity, 5);
    }
}
