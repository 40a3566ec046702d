use crate::error::SimulationError;
use crate::models::intersection::{Axis, CorridorDirection, IntersectionId, LightState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A light transition emitted by a phase authority. On the wire it is one of
/// six fixed 8-character tags per intersection, e.g. `F10_NS_G`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub intersection: IntersectionId,
    pub axis: Axis,
    pub light: LightState,
}

impl PhaseEvent {
    pub fn new(intersection: IntersectionId, axis: Axis, light: LightState) -> Self {
        Self {
            intersection,
            axis,
            light,
        }
    }

    pub fn tag(&self) -> String {
        format!(
            "{}_{}_{}",
            self.intersection.code(),
            self.axis.code(),
            self.light.code()
        )
    }
}

impl fmt::Display for PhaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for PhaseEvent {
    type Err = SimulationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let unknown = || SimulationError::UnknownPhaseTag(tag.to_string());
        if tag.len() != 8 {
            return Err(unknown());
        }
        let mut parts = tag.split('_');
        let intersection = match parts.next() {
            Some("F10") => IntersectionId::F10,
            Some("F11") => IntersectionId::F11,
            _ => return Err(unknown()),
        };
        let axis = match parts.next() {
            Some("NS") => Axis::NorthSouth,
            Some("EW") => Axis::EastWest,
            _ => return Err(unknown()),
        };
        let light = match parts.next() {
            Some("G") => LightState::Green,
            Some("Y") => LightState::Yellow,
            Some("R") => LightState::Red,
            _ => return Err(unknown()),
        };
        if parts.next().is_some() {
            return Err(unknown());
        }
        Ok(PhaseEvent::new(intersection, axis, light))
    }
}

/// Out-of-band, single-token signals sent to a phase authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlSignal {
    Emergency(CorridorDirection),
    EmergencyClear,
    Shutdown,
}

impl ControlSignal {
    pub fn token(self) -> &'static str {
        match self {
            ControlSignal::Emergency(CorridorDirection::Eastbound) => "EMERGENCY_EASTBOUND",
            ControlSignal::Emergency(CorridorDirection::Westbound) => "EMERGENCY_WESTBOUND",
            ControlSignal::EmergencyClear => "EMERGENCY_CLEAR",
            ControlSignal::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ControlSignal {
    type Err = SimulationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "EMERGENCY_EASTBOUND" => Ok(ControlSignal::Emergency(CorridorDirection::Eastbound)),
            "EMERGENCY_WESTBOUND" => Ok(ControlSignal::Emergency(CorridorDirection::Westbound)),
            "EMERGENCY_CLEAR" => Ok(ControlSignal::EmergencyClear),
            "SHUTDOWN" => Ok(ControlSignal::Shutdown),
            other => Err(SimulationError::UnknownControlToken(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phase_tag_is_eight_ascii_chars_and_parses_back() {
        for intersection in IntersectionId::ALL {
            for axis in [Axis::NorthSouth, Axis::EastWest] {
                for light in [LightState::Green, LightState::Yellow, LightState::Red] {
                    let event = PhaseEvent::new(intersection, axis, light);
                    let tag = event.tag();
                    assert_eq!(tag.len(), 8);
                    assert!(tag.is_ascii());
                    assert_eq!(tag.parse::<PhaseEvent>().ok(), Some(event));
                }
            }
        }
    }

    #[test]
    fn known_tags_render_as_expected() {
        let event = PhaseEvent::new(IntersectionId::F11, Axis::EastWest, LightState::Yellow);
        assert_eq!(event.tag(), "F11_EW_Y");
    }

    #[test]
    fn malformed_tags_are_rejected() {
        for tag in ["F12_NS_G", "F10_NS_X", "F10-NS-G", "F10_NS_GG", ""] {
            assert!(matches!(
                tag.parse::<PhaseEvent>(),
                Err(SimulationError::UnknownPhaseTag(_))
            ));
        }
    }

    #[test]
    fn control_tokens() {
        assert_eq!(
            "EMERGENCY_WESTBOUND".parse::<ControlSignal>().ok(),
            Some(ControlSignal::Emergency(CorridorDirection::Westbound))
        );
        assert_eq!(ControlSignal::Shutdown.to_string(), "SHUTDOWN");
        assert!("HALT".parse::<ControlSignal>().is_err());
    }
}
