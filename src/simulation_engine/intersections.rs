use crate::models::intersection::{Axis, IntersectionId, IntersectionSnapshot, IntersectionState, Side};
use crate::models::vehicle::VehicleId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// How a vehicle's wait at a red light ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Proceed,
    Shutdown,
}

/// A shared intersection: one lock over its lights and queues, plus one
/// wake-up condition per axis.
#[derive(Debug)]
pub struct Intersection {
    id: IntersectionId,
    state: Mutex<IntersectionState>,
    north_south_ready: Notify,
    east_west_ready: Notify,
}

impl Intersection {
    pub fn new(id: IntersectionId) -> Self {
        Self {
            id,
            state: Mutex::new(IntersectionState::new(id)),
            north_south_ready: Notify::new(),
            east_west_ready: Notify::new(),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    /// Locks the intersection, recovering the state if a holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, IntersectionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ready(&self, axis: Axis) -> &Notify {
        match axis {
            Axis::NorthSouth => &self.north_south_ready,
            Axis::EastWest => &self.east_west_ready,
        }
    }

    /// Wakes every vehicle blocked on `axis`; each re-checks its predicate.
    pub fn wake_axis(&self, axis: Axis) {
        self.ready(axis).notify_waiters();
    }

    pub fn wake_all(&self) {
        self.wake_axis(Axis::NorthSouth);
        self.wake_axis(Axis::EastWest);
    }

    pub fn snapshot(&self) -> IntersectionSnapshot {
        self.lock().snapshot()
    }

    /// Blocks until `side` is GREEN with no emergency active, or until
    /// shutdown. The vehicle must already be registered at `side`; it is
    /// deregistered before this returns.
    pub async fn wait_for_green(
        &self,
        vehicle: VehicleId,
        side: Side,
        shutdown: &AtomicBool,
    ) -> WaitOutcome {
        let ready = self.ready(side.axis());
        loop {
            // Register for the wake-up before checking, so a broadcast issued
            // between the check and the await is not lost.
            let notified = ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                let outcome = if shutdown.load(Ordering::SeqCst) {
                    Some(WaitOutcome::Shutdown)
                } else if state.can_proceed(side) {
                    Some(WaitOutcome::Proceed)
                } else {
                    None
                };
                if let Some(outcome) = outcome {
                    state.deregister_waiting(side, vehicle);
                    return outcome;
                }
            }

            notified.await;
        }
    }
}
