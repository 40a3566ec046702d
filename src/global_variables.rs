// Vehicle count used when the command line gives nothing usable.
pub const DEFAULT_VEHICLE_COUNT: usize = 15;
// Larger counts are refused before anything spawns.
pub const MAX_VEHICLE_COUNT: usize = 100_000;

// Signal timing (milliseconds)
pub const GREEN_DURATION_MS: u64 = 3_000;
pub const YELLOW_DURATION_MS: u64 = 1_000;

// Vehicle timing (milliseconds)
pub const CROSSING_TIME_MS: u64 = 1_000;
pub const PARKING_MIN_TIME_MS: u64 = 2_000;
pub const PARKING_MAX_TIME_MS: u64 = 5_000;
pub const SPAWN_MIN_DELAY_MS: u64 = 500;
pub const SPAWN_MAX_DELAY_MS: u64 = 2_000;
pub const WAIT_QUEUE_RETRY_MS: u64 = 500;

// Polling and shutdown bounds (milliseconds)
pub const RELAY_POLL_MS: u64 = 100;
pub const AUTHORITY_SUSPENDED_POLL_MS: u64 = 100;
pub const COMPLETION_WAIT_LIMIT_MS: u64 = 60_000;
pub const AUTHORITY_STOP_TIMEOUT_MS: u64 = 5_000;

// Parking lot sizing
pub const MAX_PARKING_SPOTS: usize = 10;
pub const MAX_WAITING_QUEUE: usize = 5;

// Bounded capacity of every control and phase-event channel.
pub const CHANNEL_CAPACITY: usize = 32;

// Attribute generator tables (out of 100)
pub const PROB_CAR: u32 = 40;
pub const PROB_BIKE: u32 = 20;
pub const PROB_BUS: u32 = 15;
pub const PROB_TRACTOR: u32 = 10;
pub const PROB_AMBULANCE: u32 = 8;
pub const PROB_FIRETRUCK: u32 = 7;

pub const PROB_STRAIGHT: u32 = 50;
pub const PROB_LEFT: u32 = 25;
pub const PROB_RIGHT: u32 = 25;

pub const PARKING_PROBABILITY: u32 = 30;
