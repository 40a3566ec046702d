use crate::models::intersection::{IntersectionId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub type VehicleId = u64;

/// Different types of vehicles in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Bike,
    Bus,
    Tractor,
    Ambulance,
    Firetruck,
}

impl VehicleType {
    pub fn priority(self) -> Priority {
        match self {
            VehicleType::Ambulance | VehicleType::Firetruck => Priority::High,
            VehicleType::Bus => Priority::Medium,
            VehicleType::Car | VehicleType::Bike | VehicleType::Tractor => Priority::Low,
        }
    }

    pub fn is_emergency(self) -> bool {
        self.priority() == Priority::High
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Bus => "Bus",
            VehicleType::Tractor => "Tractor",
            VehicleType::Ambulance => "Ambulance",
            VehicleType::Firetruck => "Firetruck",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Turn a vehicle makes while crossing an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Straight,
    Left,
    Right,
}

/// Attributes chosen by the spawner before a vehicle id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleAttributes {
    pub vehicle_type: VehicleType,
    pub intersection: IntersectionId,
    pub side: Side,
    pub direction: Direction,
    pub wants_parking: bool,
    pub parking_time: Duration,
}

/// Represents a vehicle travelling through the two intersections. Owned and
/// mutated only by its own agent task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    pub priority: Priority,
    pub spawn_intersection: IntersectionId,
    pub spawn_side: Side,
    pub direction: Direction,
    pub current_intersection: IntersectionId,
    pub current_side: Side,
    pub wants_parking: bool,
    pub has_exited: bool,
    /// How long the vehicle stays once it gets a parking spot.
    pub parking_time: Duration,
}

impl Vehicle {
    /// Emergency types never ask for parking, whatever the attributes say.
    pub fn new(id: VehicleId, attributes: VehicleAttributes) -> Self {
        let VehicleAttributes {
            vehicle_type,
            intersection,
            side,
            direction,
            wants_parking,
            parking_time,
        } = attributes;

        Self {
            id,
            vehicle_type,
            priority: vehicle_type.priority(),
            spawn_intersection: intersection,
            spawn_side: side,
            direction,
            current_intersection: intersection,
            current_side: side,
            wants_parking: wants_parking && !vehicle_type.is_emergency(),
            has_exited: false,
            parking_time,
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.vehicle_type.is_emergency()
    }

    /// Side the vehicle will leave its current intersection through.
    pub fn exit_side(&self) -> Side {
        self.current_side.exit_for(self.direction)
    }
}
