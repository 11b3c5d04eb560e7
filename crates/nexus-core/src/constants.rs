/// Milliseconds per hour
pub const HOUR_MS: i64 = 60 * 60 * 1000;

/// Milliseconds per day
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Lower bound of the normalized timeline position
pub const POSITION_MIN: f64 = 0.0;

/// Upper bound of the normalized timeline position
pub const POSITION_MAX: f64 = 100.0;

/// Minimum distance between the two range handles, in position units
pub const MIN_GAP: f64 = 5.0;

/// Default visible window after a reset: the last 30 days of the domain
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Default timeline domain: one year ending now
pub const DEFAULT_DOMAIN_DAYS: i64 = 365;

/// Intensity bounds for the advanced filter set
pub const INTENSITY_MIN: u8 = 1;
pub const INTENSITY_MAX: u8 = 10;

/// Default geo radius for the advanced filter set
pub const DEFAULT_GEO_RADIUS_KM: f64 = 50.0;

/// Full revolution of the radar beam
pub const RADAR_SWEEP_PERIOD_MS: i64 = 4_000;

/// Lifetime of one expanding radar pulse ring
pub const RADAR_PULSE_PERIOD_MS: i64 = 2_000;

/// Radar redraws are never closer together than this (~60 fps)
pub const MIN_FRAME_INTERVAL_MS: i64 = 16;

/// Golden angle in radians: 2π / φ². Spreads synthetic pin positions.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653_3;

/// Colors handed to new agents in creation order
pub const AGENT_PALETTE: [&str; 6] = [
    "#8b5cf6", "#06b6d4", "#f59e0b", "#ec4899", "#10b981", "#3b82f6",
];
