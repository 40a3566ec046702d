use crate::models::intersection::{Axis, CorridorDirection, IntersectionId, LightState, Side};
use crate::models::vehicle::{Direction, VehicleId, VehicleType};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Semantic events emitted by the simulation core. Formatting and
/// timestamping belong to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    VehicleSpawned {
        vehicle: VehicleId,
        vehicle_type: VehicleType,
        intersection: IntersectionId,
        side: Side,
        direction: Direction,
        wants_parking: bool,
    },
    VehicleWaiting {
        vehicle: VehicleId,
        intersection: IntersectionId,
        side: Side,
        light: LightState,
    },
    VehicleEntered {
        vehicle: VehicleId,
        intersection: IntersectionId,
        side: Side,
    },
    VehicleExited {
        vehicle: VehicleId,
        intersection: IntersectionId,
        side: Side,
    },
    VehicleTransit {
        vehicle: VehicleId,
        from: IntersectionId,
        to: IntersectionId,
    },
    VehicleCompleted {
        vehicle: VehicleId,
        vehicle_type: VehicleType,
    },
    ParkingEntered {
        vehicle: VehicleId,
        lot: IntersectionId,
    },
    ParkingExited {
        vehicle: VehicleId,
        lot: IntersectionId,
    },
    ParkingQueued {
        vehicle: VehicleId,
        lot: IntersectionId,
    },
    ParkingSkipped {
        vehicle: VehicleId,
        lot: IntersectionId,
    },
    EmergencyStarted {
        vehicle: VehicleId,
        direction: CorridorDirection,
        path: String,
    },
    EmergencyCleared {
        vehicle: VehicleId,
        direction: CorridorDirection,
    },
    InvalidEmergencySpawn {
        vehicle: VehicleId,
        intersection: IntersectionId,
        side: Side,
    },
    LightChanged {
        intersection: IntersectionId,
        axis: Axis,
        light: LightState,
    },
    AuthorityStarted {
        intersection: IntersectionId,
    },
    AuthorityStopped {
        intersection: IntersectionId,
        cycles: u64,
    },
}

/// Receiver for simulation events. Implementations must be cheap and never
/// block for long: they are called from agent tasks and the relay.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SimEvent);
}

/// Writes each event as one JSON line through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: SimEvent) {
        let line = serde_json::to_string(&event).unwrap_or_else(|e| format!("{event:?} ({e})"));
        match event {
            SimEvent::InvalidEmergencySpawn { .. } => error!(target: "traffic", "{line}"),
            _ => info!(target: "traffic", "{line}"),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SimEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SimEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, matches: impl Fn(&SimEvent) -> bool) -> usize {
        self.events().iter().filter(|event| matches(event)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SimEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_snake_case_tag() {
        let event = SimEvent::LightChanged {
            intersection: IntersectionId::F10,
            axis: Axis::NorthSouth,
            light: LightState::Green,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "light_changed");
        assert_eq!(json["intersection"], "F10");
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(SimEvent::AuthorityStarted {
            intersection: IntersectionId::F11,
        });
        sink.emit(SimEvent::VehicleCompleted {
            vehicle: 3,
            vehicle_type: VehicleType::Bus,
        });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SimEvent::VehicleCompleted { vehicle: 3, .. }));
        assert_eq!(
            sink.count(|e| matches!(e, SimEvent::AuthorityStarted { .. })),
            1
        );
    }
}
