//! Tunable settings for one simulation run.
//!
//! Defaults come from [`crate::global_variables`]; every duration is stored in
//! milliseconds so the struct round-trips through JSON unchanged.

use crate::error::SimulationError;
use crate::global_variables::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub vehicle_count: usize,
    pub green_ms: u64,
    pub yellow_ms: u64,
    pub crossing_ms: u64,
    pub parking_min_ms: u64,
    pub parking_max_ms: u64,
    pub spawn_min_delay_ms: u64,
    pub spawn_max_delay_ms: u64,
    pub wait_queue_retry_ms: u64,
    pub relay_poll_ms: u64,
    pub authority_suspended_poll_ms: u64,
    pub completion_wait_limit_ms: u64,
    pub authority_stop_timeout_ms: u64,
    pub parking_spots: usize,
    pub waiting_queue: usize,
    pub channel_capacity: usize,
    /// Seeds the attribute generator; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicle_count: DEFAULT_VEHICLE_COUNT,
            green_ms: GREEN_DURATION_MS,
            yellow_ms: YELLOW_DURATION_MS,
            crossing_ms: CROSSING_TIME_MS,
            parking_min_ms: PARKING_MIN_TIME_MS,
            parking_max_ms: PARKING_MAX_TIME_MS,
            spawn_min_delay_ms: SPAWN_MIN_DELAY_MS,
            spawn_max_delay_ms: SPAWN_MAX_DELAY_MS,
            wait_queue_retry_ms: WAIT_QUEUE_RETRY_MS,
            relay_poll_ms: RELAY_POLL_MS,
            authority_suspended_poll_ms: AUTHORITY_SUSPENDED_POLL_MS,
            completion_wait_limit_ms: COMPLETION_WAIT_LIMIT_MS,
            authority_stop_timeout_ms: AUTHORITY_STOP_TIMEOUT_MS,
            parking_spots: MAX_PARKING_SPOTS,
            waiting_queue: MAX_WAITING_QUEUE,
            channel_capacity: CHANNEL_CAPACITY,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Applies the optional vehicle-count argument, see
    /// [`resolve_vehicle_count`].
    pub fn with_vehicle_arg(mut self, arg: Option<&str>) -> Self {
        self.vehicle_count = resolve_vehicle_count(arg);
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.channel_capacity == 0 {
            return Err(SimulationError::ChannelSetup {
                reason: "channel capacity must be at least 1".to_string(),
            });
        }
        if self.vehicle_count > MAX_VEHICLE_COUNT {
            return Err(SimulationError::InvalidConfig {
                reason: format!(
                    "vehicle count {} exceeds the limit of {MAX_VEHICLE_COUNT}",
                    self.vehicle_count
                ),
            });
        }
        if self.parking_spots == 0 {
            return Err(SimulationError::InvalidConfig {
                reason: "parking lot needs at least one spot".to_string(),
            });
        }
        if self.parking_min_ms > self.parking_max_ms {
            return Err(SimulationError::InvalidConfig {
                reason: format!(
                    "parking stay range is inverted ({} > {})",
                    self.parking_min_ms, self.parking_max_ms
                ),
            });
        }
        if self.spawn_min_delay_ms > self.spawn_max_delay_ms {
            return Err(SimulationError::InvalidConfig {
                reason: format!(
                    "spawn delay range is inverted ({} > {})",
                    self.spawn_min_delay_ms, self.spawn_max_delay_ms
                ),
            });
        }
        Ok(())
    }

    pub fn green(&self) -> Duration {
        Duration::from_millis(self.green_ms)
    }

    pub fn yellow(&self) -> Duration {
        Duration::from_millis(self.yellow_ms)
    }

    pub fn crossing(&self) -> Duration {
        Duration::from_millis(self.crossing_ms)
    }

    pub fn wait_queue_retry(&self) -> Duration {
        Duration::from_millis(self.wait_queue_retry_ms)
    }

    pub fn relay_poll(&self) -> Duration {
        Duration::from_millis(self.relay_poll_ms)
    }

    pub fn authority_suspended_poll(&self) -> Duration {
        Duration::from_millis(self.authority_suspended_poll_ms)
    }

    pub fn completion_wait_limit(&self) -> Duration {
        Duration::from_millis(self.completion_wait_limit_ms)
    }

    pub fn authority_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.authority_stop_timeout_ms)
    }
}

/// Reads the leading integer of `arg`: leading whitespace and one sign are
/// allowed, anything after the digits is ignored (`"12abc"` is 12). A
/// missing, non-positive or digit-less argument gives the default count.
pub fn resolve_vehicle_count(arg: Option<&str>) -> usize {
    arg.and_then(leading_integer)
        .filter(|&count| count > 0)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(DEFAULT_VEHICLE_COUNT)
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['+', '-']));
    let end = raw[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |digits| sign_len + digits);
    raw[..end].parse().ok()
}
