use std::time::Duration;

use super::tracker_error::TrackerError;
use super::{QUERY_DELAY_MILLIS, QUERY_TIMEOUT_MILLIS, TICK_FREQUENCY_MILLIS};

/// Bounds of the random walk applied to a moving flight on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryLimits {
    pub max_progress_step: f64,
    pub speed_jitter: f64,
    pub speed_floor: f64,
    pub altitude_jitter: f64,
    pub altitude_floor: f64,
    pub max_distance_step: f64,
}

impl Default for TelemetryLimits {
    fn default() -> Self {
        TelemetryLimits {
            max_progress_step: 2.0,
            speed_jitter: 10.0,
            speed_floor: 450.0,
            altitude_jitter: 500.0,
            altitude_floor: 25000.0,
            max_distance_step: 10.0,
        }
    }
}

impl TelemetryLimits {
    fn validate(&self) -> Result<(), TrackerError> {
        let values = [
            ("max_progress_step", self.max_progress_step),
            ("speed_jitter", self.speed_jitter),
            ("speed_floor", self.speed_floor),
            ("altitude_jitter", self.altitude_jitter),
            ("altitude_floor", self.altitude_floor),
            ("max_distance_step", self.max_distance_step),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.max_progress_step > 100.0 {
            return Err(TrackerError::InvalidConfig(
                "max_progress_step cannot exceed 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings of a tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Artificial latency before a query resolves.
    pub query_delay: Duration,
    /// How long a caller waits for a query before giving up.
    pub query_timeout: Duration,
    /// Time between two live updates.
    pub tick_interval: Duration,
    /// Land the flight and stop updating once progress reaches 100. Without
    /// it the loop runs until cancelled.
    pub land_on_arrival: bool,
    pub limits: TelemetryLimits,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            query_delay: Duration::from_millis(QUERY_DELAY_MILLIS),
            query_timeout: Duration::from_millis(QUERY_TIMEOUT_MILLIS),
            tick_interval: Duration::from_millis(TICK_FREQUENCY_MILLIS),
            land_on_arrival: false,
            limits: TelemetryLimits::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.tick_interval.is_zero() {
            return Err(TrackerError::InvalidConfig(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        if self.query_timeout <= self.query_delay {
            return Err(TrackerError::InvalidConfig(format!(
                "query timeout ({} ms) must be longer than the query delay ({} ms)",
                self.query_timeout.as_millis(),
                self.query_delay.as_millis()
            )));
        }
        self.limits.validate()
    }
}
