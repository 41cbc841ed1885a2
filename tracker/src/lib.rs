pub mod display;
pub mod types;

pub use types::config::{TelemetryLimits, TrackerConfig};
pub use types::flight::FlightRecord;
pub use types::flight_status::FlightStatus;
pub use types::query::{PendingQuery, QueryHandler};
pub use types::scheduler::{CancelHandle, LiveUpdateScheduler};
pub use types::store::{RecordSource, StaticStore};
pub use types::tracker::{Tracker, ViewState};
pub use types::tracker_error::{FetchError, TrackerError};
