// src/shared_data.rs

use crate::models::intersection::IntersectionId;
use crate::simulation_engine::parking::LotSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final parked count for one lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotReport {
    pub lot: IntersectionId,
    pub parked: usize,
    pub waiting: usize,
}

impl From<&LotSnapshot> for LotReport {
    fn from(snapshot: &LotSnapshot) -> Self {
        Self {
            lot: snapshot.lot,
            parked: snapshot.parked.len(),
            waiting: snapshot.waiting.len(),
        }
    }
}

/// Statistics reported once a run has shut down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub requested: usize,
    pub spawned: usize,
    pub completed: usize,
    /// Agents that panicked.
    pub abandoned: usize,
    /// Agents that observed shutdown before leaving.
    pub interrupted: usize,
    /// Set when a termination signal cut the run short.
    pub terminated_by_signal: bool,
    pub lots: Vec<LotReport>,
}

impl SimulationSummary {
    pub fn all_completed(&self) -> bool {
        self.completed == self.requested
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "=== Simulation summary ===")?;
        writeln!(
            f,
            "Vehicles completed: {}/{} (spawned {}, interrupted {}, abandoned {})",
            self.completed, self.requested, self.spawned, self.interrupted, self.abandoned
        )?;
        for lot in &self.lots {
            writeln!(
                f,
                "Parking lot {}: {} parked, {} waiting",
                lot.lot, lot.parked, lot.waiting
            )?;
        }
        if self.terminated_by_signal {
            write!(f, "Run ended by termination signal")?;
        } else {
            write!(f, "Run ended normally")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> SimulationSummary {
        SimulationSummary {
            requested: 15,
            spawned: 15,
            completed: 15,
            abandoned: 0,
            interrupted: 0,
            terminated_by_signal: false,
            lots: vec![
                LotReport {
                    lot: IntersectionId::F10,
                    parked: 0,
                    waiting: 0,
                },
                LotReport {
                    lot: IntersectionId::F11,
                    parked: 0,
                    waiting: 0,
                },
            ],
        }
    }

    #[test]
    fn display_lists_every_lot() {
        let text = summary().to_string();
        assert!(text.contains("Vehicles completed: 15/15"));
        assert!(text.contains("Parking lot F10: 0 parked"));
        assert!(text.contains("Parking lot F11: 0 parked"));
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(json["completed"], 15);
        assert_eq!(json["lots"][1]["lot"], "F11");
    }
}
