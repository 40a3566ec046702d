use crate::models::intersection::IntersectionId;
use crate::models::vehicle::{Vehicle, VehicleId, VehicleType};
use crate::monitoring::event_log::{EventSink, SimEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

#[derive(Debug, Default)]
struct Occupants {
    parked: BTreeMap<VehicleId, VehicleType>,
    waiting: BTreeMap<VehicleId, VehicleType>,
}

/// Result of the admission policy for one parking-seeking vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Got a spot, either straight away or on the single retry.
    Parked { via_wait_queue: bool },
    /// Lot and wait queue were both full.
    QueueFull,
    /// Waited in the queue but the retry found the lot still full.
    RetryFailed,
    /// Emergency vehicles are never admitted.
    Refused,
}

/// Bounded parking lot next to one intersection.
///
/// The two semaphores are the only admission counters. Both sets are guarded
/// by one lock, and every permit change happens while that lock is held, so a
/// snapshot always sees `parked + available == capacity`.
#[derive(Debug)]
pub struct ParkingLot {
    id: IntersectionId,
    capacity: usize,
    wait_capacity: usize,
    spots: Semaphore,
    wait_slots: Semaphore,
    occupants: Mutex<Occupants>,
    spot_freed: Notify,
}

impl ParkingLot {
    pub fn new(id: IntersectionId, capacity: usize, wait_capacity: usize) -> Self {
        Self {
            id,
            capacity,
            wait_capacity,
            spots: Semaphore::new(capacity),
            wait_slots: Semaphore::new(wait_capacity),
            occupants: Mutex::new(Occupants::default()),
            spot_freed: Notify::new(),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Occupants> {
        self.occupants
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes a spot if one is free right now.
    pub fn try_acquire(&self, vehicle: &Vehicle) -> bool {
        if vehicle.is_emergency() {
            return false;
        }
        let mut occupants = self.lock();
        if occupants.parked.contains_key(&vehicle.id) {
            return false;
        }
        match self.spots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                occupants.parked.insert(vehicle.id, vehicle.vehicle_type);
                true
            }
            Err(_) => false,
        }
    }

    /// Waits until a spot frees up and takes it. Emergency vehicles are
    /// refused immediately.
    pub async fn acquire_blocking(&self, vehicle: &Vehicle) -> bool {
        if vehicle.is_emergency() {
            return false;
        }
        loop {
            let notified = self.spot_freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_acquire(vehicle) {
                return true;
            }
            if self.lock().parked.contains_key(&vehicle.id) {
                return false;
            }
            notified.await;
        }
    }

    /// Gives a spot back. Unknown ids are ignored and reported as `false`.
    pub fn release(&self, vehicle: VehicleId) -> bool {
        let mut occupants = self.lock();
        if occupants.parked.remove(&vehicle).is_none() {
            return false;
        }
        self.spots.add_permits(1);
        drop(occupants);
        self.spot_freed.notify_waiters();
        true
    }

    pub fn try_join_wait_queue(&self, vehicle: &Vehicle) -> bool {
        if vehicle.is_emergency() {
            return false;
        }
        let mut occupants = self.lock();
        if occupants.waiting.contains_key(&vehicle.id) {
            return false;
        }
        match self.wait_slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                occupants.waiting.insert(vehicle.id, vehicle.vehicle_type);
                true
            }
            Err(_) => false,
        }
    }

    pub fn leave_wait_queue(&self, vehicle: VehicleId) -> bool {
        let mut occupants = self.lock();
        if occupants.waiting.remove(&vehicle).is_none() {
            return false;
        }
        self.wait_slots.add_permits(1);
        true
    }

    /// Admission policy: take a spot; otherwise join the wait queue, wait
    /// `retry_delay`, and try exactly once more. The vehicle leaves the wait
    /// queue after its retry whatever the result.
    pub async fn seek_parking(
        &self,
        vehicle: &Vehicle,
        retry_delay: Duration,
        sink: &dyn EventSink,
    ) -> Admission {
        if vehicle.is_emergency() {
            return Admission::Refused;
        }
        if self.try_acquire(vehicle) {
            return Admission::Parked {
                via_wait_queue: false,
            };
        }
        if !self.try_join_wait_queue(vehicle) {
            return Admission::QueueFull;
        }
        sink.emit(SimEvent::ParkingQueued {
            vehicle: vehicle.id,
            lot: self.id,
        });

        tokio::time::sleep(retry_delay).await;

        let parked = self.try_acquire(vehicle);
        self.leave_wait_queue(vehicle.id);
        if parked {
            Admission::Parked {
                via_wait_queue: true,
            }
        } else {
            Admission::RetryFailed
        }
    }

    pub fn parked_count(&self) -> usize {
        self.lock().parked.len()
    }

    pub fn snapshot(&self) -> LotSnapshot {
        let occupants = self.lock();
        LotSnapshot {
            lot: self.id,
            capacity: self.capacity,
            wait_capacity: self.wait_capacity,
            available: self.spots.available_permits(),
            wait_slots_available: self.wait_slots.available_permits(),
            parked: occupants.parked.keys().copied().collect(),
            waiting: occupants.waiting.keys().copied().collect(),
        }
    }
}

/// Read-only copy of a lot taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSnapshot {
    pub lot: IntersectionId,
    pub capacity: usize,
    pub wait_capacity: usize,
    pub available: usize,
    pub wait_slots_available: usize,
    pub parked: Vec<VehicleId>,
    pub waiting: Vec<VehicleId>,
}

impl LotSnapshot {
    pub fn is_consistent(&self) -> bool {
        self.parked.len() + self.available == self.capacity
            && self.waiting.len() + self.wait_slots_available == self.wait_capacity
            && self.waiting.len() <= self.wait_capacity
    }
}
