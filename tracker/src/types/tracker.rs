use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use logger::{Color, Logger};

use super::config::TrackerConfig;
use super::flight::FlightRecord;
use super::query::{normalize, QueryHandler};
use super::scheduler::{CancelHandle, LiveUpdateScheduler};
use super::store::RecordSource;
use super::tracker_error::{FetchError, TrackerError};

/// What the display should currently show.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    /// A lookup for this flight number is in progress.
    Loading(String),
    Showing(FlightRecord),
    Failed(String),
}

impl ViewState {
    pub fn record(&self) -> Option<&FlightRecord> {
        match self {
            ViewState::Showing(record) => Some(record),
            _ => None,
        }
    }
}

type Subscribers = Mutex<Vec<Sender<ViewState>>>;

/// A tracking session: one search box, one display.
///
/// The session owns the current view and the live-update loop feeding it.
/// Only the resolution of a search and the active loop ever write the view,
/// and a new search always stops the previous loop before it starts.
pub struct Tracker {
    queries: QueryHandler,
    scheduler: LiveUpdateScheduler,
    current: Arc<RwLock<ViewState>>,
    subscribers: Arc<Subscribers>,
    active: Mutex<Option<CancelHandle>>,
    logger: Option<Logger>,
}

impl Tracker {
    /// Creates a session reading flights from `source`.
    pub fn new(
        source: Arc<dyn RecordSource>,
        config: TrackerConfig,
        logger: Option<Logger>,
    ) -> Result<Self, TrackerError> {
        config.validate()?;

        Ok(Tracker {
            queries: QueryHandler::new(source, &config).with_logger(logger.clone()),
            scheduler: LiveUpdateScheduler::new(&config).with_logger(logger.clone()),
            current: Arc::new(RwLock::new(ViewState::Idle)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            active: Mutex::new(None),
            logger,
        })
    }

    /// Every later change of the view is sent to the returned receiver.
    pub fn subscribe(&self) -> Receiver<ViewState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn current(&self) -> Result<ViewState, TrackerError> {
        self.current
            .read()
            .map(|state| state.clone())
            .map_err(|_| TrackerError::LockError("Failed to read the current view.".to_string()))
    }

    pub fn current_record(&self) -> Option<FlightRecord> {
        self.current().ok().and_then(|state| state.record().cloned())
    }

    /// Whether live updates are running for the shown flight.
    pub fn is_live(&self) -> bool {
        match self.active.lock() {
            Ok(active) => active.as_ref().map(|h| h.is_active()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Looks a flight up and shows it, starting live updates when it is moving.
    ///
    /// Blank input is refused without touching the display. Any failure is
    /// shown as an error and ends this search; nothing is retried.
    pub fn search(&self, raw: &str) -> Result<FlightRecord, TrackerError> {
        let flight_number = normalize(raw).ok_or(TrackerError::EmptyQuery)?;

        self.stop_updates();
        publish(
            &self.current,
            &self.subscribers,
            ViewState::Loading(flight_number.clone()),
        );

        let result = self
            .queries
            .submit(&flight_number)
            .and_then(|pending| pending.wait());

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                self.log_failure(&flight_number, &e);
                publish(&self.current, &self.subscribers, ViewState::Failed(e.to_string()));
                return Err(e);
            }
        };

        if let Some(logger) = &self.logger {
            let _ = logger.info(
                &format!("{} resolved with status '{}'", record.flight_number, record.status),
                Color::Green,
            );
        }
        publish(
            &self.current,
            &self.subscribers,
            ViewState::Showing(record.clone()),
        );

        if record.is_live() {
            let current = Arc::clone(&self.current);
            let subscribers = Arc::clone(&self.subscribers);
            let handle = self.scheduler.start(record.clone(), move |next| {
                publish(&current, &subscribers, ViewState::Showing(next));
            })?;

            let mut active = self
                .active
                .lock()
                .map_err(|_| TrackerError::LockError("Failed to lock the live loop.".to_string()))?;
            *active = Some(handle);
        }

        Ok(record)
    }

    /// Stops the live-update loop, if one is running. The view keeps the last
    /// snapshot it received.
    pub fn stop_updates(&self) {
        let previous = match self.active.lock() {
            Ok(mut active) => active.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = previous {
            handle.cancel();
            if let Some(logger) = &self.logger {
                let _ = logger.info(
                    &format!("Live updates stopped for {}", handle.flight_number()),
                    Color::Yellow,
                );
            }
        }
    }

    /// Stops live updates and waits for outstanding lookups.
    pub fn shutdown(&self) {
        self.stop_updates();
        self.queries.join();
    }

    // A lookup that was given up on is a warning, a broken source an error.
    fn log_failure(&self, flight_number: &str, error: &TrackerError) {
        let Some(logger) = &self.logger else {
            return;
        };
        let message = format!("Search for {} failed: {}", flight_number, error);
        let _ = match error {
            TrackerError::Cancelled | TrackerError::Fetch(FetchError::Timeout) => {
                logger.warn(&message)
            }
            _ => logger.error(&message),
        };
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.stop_updates();
    }
}

fn publish(current: &RwLock<ViewState>, subscribers: &Subscribers, state: ViewState) {
    {
        let mut view = current.write().unwrap_or_else(PoisonError::into_inner);
        *view = state.clone();
    }
    let mut subscribers = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
    subscribers.retain(|tx| tx.send(state.clone()).is_ok());
}
