use std::collections::HashMap;

use super::endpoint::{Distance, Endpoint, Position};
use super::flight::FlightRecord;
use super::flight_status::FlightStatus;
use super::tracker_error::FetchError;

/// Somewhere flight records can be fetched from.
///
/// The query handler only talks to this trait, so a real backend can take the
/// place of the built-in table. Unknown flights are answered with
/// [`FlightRecord::not_found`], not with an error.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, flight_number: &str) -> Result<FlightRecord, FetchError>;
}

/// The built-in table of canned flights.
pub struct StaticStore {
    flights: HashMap<String, FlightRecord>,
}

impl StaticStore {
    pub fn new() -> Self {
        let flights = canned_flights()
            .into_iter()
            .map(|flight| (flight.flight_number.clone(), flight))
            .collect();
        StaticStore { flights }
    }

    /// Looks a flight up by its canonical upper-case number. Never fails: any
    /// key the table does not hold yields the NotFound record for that key.
    pub fn lookup(&self, key: &str) -> FlightRecord {
        self.flights
            .get(key)
            .cloned()
            .unwrap_or_else(|| FlightRecord::not_found(key))
    }

    /// Flight numbers the table knows, sorted.
    pub fn known_flights(&self) -> Vec<String> {
        let mut numbers: Vec<String> = self.flights.keys().cloned().collect();
        numbers.sort();
        numbers
    }
}

impl Default for StaticStore {
    fn default() -> Self {
        StaticStore::new()
    }
}

impl RecordSource for StaticStore {
    fn fetch(&self, flight_number: &str) -> Result<FlightRecord, FetchError> {
        Ok(self.lookup(flight_number))
    }
}

fn canned_flights() -> Vec<FlightRecord> {
    vec![
        FlightRecord {
            flight_number: "AA123".to_string(),
            airline: "American Airlines".to_string(),
            aircraft: "Boeing 737-800".to_string(),
            departure: Endpoint::new("JFK", "New York", "14:30", "A12"),
            arrival: Endpoint::new("LAX", "Los Angeles", "18:45", "B7"),
            status: FlightStatus::EnRoute,
            progress: 65.0,
            position: Position::new(39.8283, -98.5795),
            altitude: 35000.0,
            speed: 580.0,
            distance: Distance::new(2475.0, 866.0),
        },
        FlightRecord {
            flight_number: "UA456".to_string(),
            airline: "United Airlines".to_string(),
            aircraft: "Airbus A320".to_string(),
            departure: Endpoint::new("SFO", "San Francisco", "09:15", "C3"),
            arrival: Endpoint::new("ORD", "Chicago", "15:30", "D8"),
            status: FlightStatus::Departed,
            progress: 25.0,
            position: Position::new(40.7128, -112.0740),
            altitude: 32000.0,
            speed: 520.0,
            distance: Distance::new(1846.0, 1385.0),
        },
        FlightRecord {
            flight_number: "DL789".to_string(),
            airline: "Delta Air Lines".to_string(),
            aircraft: "Boeing 757-200".to_string(),
            departure: Endpoint::new("ATL", "Atlanta", "11:20", "E5"),
            arrival: Endpoint::new("MIA", "Miami", "13:45", "F2"),
            status: FlightStatus::Landed,
            progress: 100.0,
            position: Position::new(25.7617, -80.1918),
            altitude: 0.0,
            speed: 0.0,
            distance: Distance::new(594.0, 0.0),
        },
    ]
}
