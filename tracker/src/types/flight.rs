use rand::Rng;

use super::config::TelemetryLimits;
use super::endpoint::{Distance, Endpoint, Position, UNKNOWN};
use super::flight_status::FlightStatus;

const UNKNOWN_AIRLINE: &str = "Unknown Airline";

/// One snapshot of a tracked flight. Snapshots are never changed in place:
/// every live update derives a new value from the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightRecord {
    pub flight_number: String,
    pub airline: String,
    pub aircraft: String,
    pub departure: Endpoint,
    pub arrival: Endpoint,
    pub status: FlightStatus,
    /// Percentage of the route completed, in `[0, 100]`.
    pub progress: f64,
    pub position: Position,
    /// Feet.
    pub altitude: f64,
    /// Miles per hour.
    pub speed: f64,
    pub distance: Distance,
}

impl FlightRecord {
    /// The sentinel answered for any flight number nobody knows about.
    pub fn not_found(flight_number: &str) -> Self {
        FlightRecord {
            flight_number: flight_number.to_string(),
            airline: UNKNOWN_AIRLINE.to_string(),
            aircraft: UNKNOWN.to_string(),
            departure: Endpoint::unknown(),
            arrival: Endpoint::unknown(),
            status: FlightStatus::NotFound,
            progress: 0.0,
            position: Position::default(),
            altitude: 0.0,
            speed: 0.0,
            distance: Distance::default(),
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Derives the next snapshot of a moving flight.
    ///
    /// Progress creeps forward and is capped at 100, speed and altitude wander
    /// around their current values without dropping below the cruise floors,
    /// and the remaining distance only shrinks, down to zero. Every other field
    /// is carried over untouched.
    pub fn advance<R: Rng + ?Sized>(&self, rng: &mut R, limits: &TelemetryLimits) -> FlightRecord {
        let progress = (self.progress + sample(rng, 0.0, limits.max_progress_step)).min(100.0);
        let speed = (self.speed + sample(rng, -limits.speed_jitter, limits.speed_jitter))
            .max(limits.speed_floor);
        let altitude = (self.altitude
            + sample(rng, -limits.altitude_jitter, limits.altitude_jitter))
        .max(limits.altitude_floor);
        let remaining =
            (self.distance.remaining - sample(rng, 0.0, limits.max_distance_step)).max(0.0);

        FlightRecord {
            progress,
            speed,
            altitude,
            distance: Distance {
                total: self.distance.total,
                remaining: remaining.min(self.distance.total),
            },
            ..self.clone()
        }
    }

    /// Whether the flight has covered its whole route.
    pub fn has_arrived(&self) -> bool {
        self.progress >= 100.0
    }

    /// The snapshot of this flight once it is on the ground at its destination.
    pub fn landed(&self) -> FlightRecord {
        FlightRecord {
            status: FlightStatus::Landed,
            progress: 100.0,
            altitude: 0.0,
            speed: 0.0,
            distance: Distance {
                total: self.distance.total,
                remaining: 0.0,
            },
            ..self.clone()
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    rng.gen_range(low..=high)
}
