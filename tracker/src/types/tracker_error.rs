use std::fmt;

use super::flight_status::FlightStatus;

/// Failures of a remote record source. Kept apart from the NotFound sentinel:
/// an unknown flight is a valid answer, a `FetchError` is not.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    Network(String),
    Timeout,
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "network error: {}", msg),
            FetchError::Timeout => write!(f, "the flight lookup timed out"),
            FetchError::Parse(msg) => write!(f, "malformed flight data: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Represents errors that can occur while tracking a flight.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    EmptyQuery,
    Fetch(FetchError),
    Cancelled,
    NotLive(FlightStatus),
    InvalidConfig(String),
    LockError(String),
    TimerStartError(String),
    Other(String),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::EmptyQuery => write!(f, "Please enter a flight number."),
            TrackerError::Fetch(e) => write!(f, "Failed to fetch flight data: {}", e),
            TrackerError::Cancelled => write!(f, "The query was cancelled."),
            TrackerError::NotLive(status) => {
                write!(f, "Flight status '{}' has no live updates", status)
            }
            TrackerError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            TrackerError::LockError(msg) => write!(f, "Lock error: {}", msg),
            TrackerError::TimerStartError(msg) => write!(f, "Timer start error: {}", msg),
            TrackerError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for TrackerError {
    fn from(err: FetchError) -> Self {
        TrackerError::Fetch(err)
    }
}
