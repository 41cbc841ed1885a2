use std::fmt;

/// Represents the statuses a tracked flight can report.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FlightStatus {
    EnRoute,
    Departed,
    Landed,
    Delayed,
    NotFound,
}

impl FlightStatus {
    /// Converts the `FlightStatus` variant to the label shown on the status card.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::EnRoute => "En Route",
            FlightStatus::Departed => "Departed",
            FlightStatus::Landed => "Landed",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::NotFound => "Flight Not Found",
        }
    }

    /// Whether a flight in this status is moving and gets live updates.
    pub fn is_live(&self) -> bool {
        matches!(self, FlightStatus::EnRoute | FlightStatus::Departed)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
