use crate::models::vehicle::{Direction, VehicleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two linked intersections. F10 sits west of F11 and they share the
/// F10 EAST / F11 WEST boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntersectionId {
    F10,
    F11,
}

impl IntersectionId {
    pub const ALL: [IntersectionId; 2] = [IntersectionId::F10, IntersectionId::F11];

    pub fn code(self) -> &'static str {
        match self {
            IntersectionId::F10 => "F10",
            IntersectionId::F11 => "F11",
        }
    }

    pub fn paired(self) -> IntersectionId {
        match self {
            IntersectionId::F10 => IntersectionId::F11,
            IntersectionId::F11 => IntersectionId::F10,
        }
    }

    /// The side of this intersection that faces the other one.
    pub fn boundary_side(self) -> Side {
        match self {
            IntersectionId::F10 => Side::East,
            IntersectionId::F11 => Side::West,
        }
    }

    /// Where a vehicle leaving through `exit_side` ends up, if it stays in the
    /// simulation: the paired intersection, entering from its boundary side.
    pub fn transition(self, exit_side: Side) -> Option<(IntersectionId, Side)> {
        if exit_side == self.boundary_side() {
            let next = self.paired();
            Some((next, next.boundary_side()))
        } else {
            None
        }
    }
}

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One compass-named approach of an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    North,
    South,
    East,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::South, Side::East, Side::West];

    fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::South => 1,
            Side::East => 2,
            Side::West => 3,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Side::North | Side::South => Axis::NorthSouth,
            Side::East | Side::West => Axis::EastWest,
        }
    }

    /// Rotation table: the side a vehicle leaves through when it enters from
    /// `self` and turns `direction`.
    pub fn exit_for(self, direction: Direction) -> Side {
        match (direction, self) {
            (Direction::Straight, side) => side.opposite(),
            (Direction::Left, Side::North) => Side::East,
            (Direction::Left, Side::South) => Side::West,
            (Direction::Left, Side::East) => Side::South,
            (Direction::Left, Side::West) => Side::North,
            (Direction::Right, Side::North) => Side::West,
            (Direction::Right, Side::South) => Side::East,
            (Direction::Right, Side::East) => Side::North,
            (Direction::Right, Side::West) => Side::South,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::North => "NORTH",
            Side::South => "SOUTH",
            Side::East => "EAST",
            Side::West => "WEST",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pair of opposing approaches that always share a light state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub fn sides(self) -> [Side; 2] {
        match self {
            Axis::NorthSouth => [Side::North, Side::South],
            Axis::EastWest => [Side::East, Side::West],
        }
    }

    pub fn cross(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Axis::NorthSouth => "NS",
            Axis::EastWest => "EW",
        }
    }
}

/// The possible states for a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightState {
    Green,
    Yellow,
    Red,
}

impl LightState {
    pub fn code(self) -> &'static str {
        match self {
            LightState::Green => "G",
            LightState::Yellow => "Y",
            LightState::Red => "R",
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LightState::Green => "GREEN",
            LightState::Yellow => "YELLOW",
            LightState::Red => "RED",
        };
        f.write_str(name)
    }
}

/// Travel direction of an emergency corridor across both intersections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorridorDirection {
    Eastbound,
    Westbound,
}

impl CorridorDirection {
    /// The only two places a corridor can start: F10 WEST heading east and
    /// F11 EAST heading west.
    pub fn from_spawn(intersection: IntersectionId, side: Side) -> Option<CorridorDirection> {
        match (intersection, side) {
            (IntersectionId::F10, Side::West) => Some(CorridorDirection::Eastbound),
            (IntersectionId::F11, Side::East) => Some(CorridorDirection::Westbound),
            _ => None,
        }
    }

    /// Sides held green on both intersections while the corridor is active.
    pub fn route(self) -> EmergencyRoute {
        match self {
            CorridorDirection::Eastbound => EmergencyRoute {
                entry: Side::West,
                exit: Side::East,
            },
            CorridorDirection::Westbound => EmergencyRoute {
                entry: Side::East,
                exit: Side::West,
            },
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            CorridorDirection::Eastbound => "F10_WEST -> F10_EAST -> F11_WEST -> F11_EAST",
            CorridorDirection::Westbound => "F11_EAST -> F11_WEST -> F10_EAST -> F10_WEST",
        }
    }
}

impl fmt::Display for CorridorDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorridorDirection::Eastbound => f.write_str("EASTBOUND"),
            CorridorDirection::Westbound => f.write_str("WESTBOUND"),
        }
    }
}

/// Entry and exit sides held open while an emergency corridor is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyRoute {
    pub entry: Side,
    pub exit: Side,
}

/// One approach: its light and the vehicles currently queued at it.
#[derive(Debug, Clone)]
pub struct Approach {
    pub side: Side,
    pub light: LightState,
    /// Unordered: removal swaps the last entry into the freed slot.
    pub waiting: Vec<VehicleId>,
}

impl Approach {
    fn new(side: Side) -> Self {
        Self {
            side,
            light: LightState::Red,
            waiting: Vec::new(),
        }
    }
}

/// Everything one intersection lock protects.
#[derive(Debug, Clone)]
pub struct IntersectionState {
    pub id: IntersectionId,
    approaches: [Approach; 4],
    emergency: Option<EmergencyRoute>,
}

impl IntersectionState {
    /// Every approach starts RED with no emergency recorded.
    pub fn new(id: IntersectionId) -> Self {
        Self {
            id,
            approaches: Side::ALL.map(Approach::new),
            emergency: None,
        }
    }

    pub fn approach(&self, side: Side) -> &Approach {
        &self.approaches[side.index()]
    }

    fn approach_mut(&mut self, side: Side) -> &mut Approach {
        &mut self.approaches[side.index()]
    }

    pub fn light(&self, side: Side) -> LightState {
        self.approach(side).light
    }

    pub fn set_axis_light(&mut self, axis: Axis, light: LightState) {
        for side in axis.sides() {
            self.approach_mut(side).light = light;
        }
    }

    /// Opens `axis` and closes the crossing axis in one step.
    pub fn open_axis(&mut self, axis: Axis) {
        self.set_axis_light(axis, LightState::Green);
        self.set_axis_light(axis.cross(), LightState::Red);
    }

    pub fn set_all_red(&mut self) {
        for approach in self.approaches.iter_mut() {
            approach.light = LightState::Red;
        }
    }

    /// Forces all-RED, then opens only the corridor's entry and exit sides.
    pub fn apply_corridor(&mut self, route: EmergencyRoute) {
        self.set_all_red();
        self.approach_mut(route.entry).light = LightState::Green;
        self.approach_mut(route.exit).light = LightState::Green;
        self.emergency = Some(route);
    }

    pub fn clear_corridor(&mut self) {
        self.emergency = None;
        self.set_all_red();
    }

    pub fn emergency(&self) -> Option<EmergencyRoute> {
        self.emergency
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.is_some()
    }

    /// Wait predicate for a normal vehicle queued at `side`.
    pub fn can_proceed(&self, side: Side) -> bool {
        self.light(side) == LightState::Green && !self.is_emergency()
    }

    pub fn register_waiting(&mut self, side: Side, vehicle: VehicleId) {
        self.approach_mut(side).waiting.push(vehicle);
    }

    pub fn deregister_waiting(&mut self, side: Side, vehicle: VehicleId) -> bool {
        let waiting = &mut self.approach_mut(side).waiting;
        match waiting.iter().position(|&id| id == vehicle) {
            Some(index) => {
                waiting.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Normal mode: at most one axis shows non-RED lights and both sides of an
    /// axis agree. Emergency mode: exactly the recorded pair is GREEN.
    pub fn signals_consistent(&self) -> bool {
        match self.emergency {
            Some(route) => Side::ALL.iter().all(|&side| {
                let open = side == route.entry || side == route.exit;
                self.light(side) == if open { LightState::Green } else { LightState::Red }
            }),
            None => {
                let axis_light = |axis: Axis| {
                    let [a, b] = axis.sides();
                    (self.light(a) == self.light(b)).then(|| self.light(a))
                };
                match (axis_light(Axis::NorthSouth), axis_light(Axis::EastWest)) {
                    (Some(ns), Some(ew)) => ns == LightState::Red || ew == LightState::Red,
                    _ => false,
                }
            }
        }
    }

    pub fn snapshot(&self) -> IntersectionSnapshot {
        IntersectionSnapshot {
            id: self.id,
            lights: Side::ALL.map(|side| (side, self.light(side))),
            waiting: Side::ALL.map(|side| (side, self.approach(side).waiting.len())),
            emergency: self.emergency,
        }
    }
}

/// Read-only copy of an intersection taken under its lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionSnapshot {
    pub id: IntersectionId,
    pub lights: [(Side, LightState); 4],
    pub waiting: [(Side, usize); 4],
    pub emergency: Option<EmergencyRoute>,
}

impl IntersectionSnapshot {
    pub fn light(&self, side: Side) -> LightState {
        self.lights
            .iter()
            .find(|(s, _)| *s == side)
            .map(|(_, light)| *light)
            .unwrap_or(LightState::Red)
    }

    pub fn all_red(&self) -> bool {
        self.lights.iter().all(|(_, light)| *light == LightState::Red)
    }
}
