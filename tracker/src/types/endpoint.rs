/// One end of a route: the airport, its city, the scheduled time and the gate.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoint {
    pub airport: String,
    pub city: String,
    pub time: String,
    pub gate: String,
}

impl Endpoint {
    pub fn new(airport: &str, city: &str, time: &str, gate: &str) -> Self {
        Endpoint {
            airport: airport.to_string(),
            city: city.to_string(),
            time: time.to_string(),
            gate: gate.to_string(),
        }
    }

    /// The placeholder used by the NotFound record.
    pub fn unknown() -> Self {
        Endpoint::new(UNKNOWN, UNKNOWN, UNKNOWN, UNKNOWN)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::unknown()
    }
}

pub const UNKNOWN: &str = "Unknown";

/// A position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Position { lat, lng }
    }
}

/// Route length and what is left of it, in miles.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Distance {
    pub total: f64,
    pub remaining: f64,
}

impl Distance {
    /// Builds a distance, keeping `remaining` inside `[0, total]`.
    pub fn new(total: f64, remaining: f64) -> Self {
        let total = total.max(0.0);
        Distance {
            total,
            remaining: remaining.clamp(0.0, total),
        }
    }

    pub fn travelled(&self) -> f64 {
        self.total - self.remaining
    }
}
