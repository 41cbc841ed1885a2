use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use logger::{Color, Logger};
use threadpool::ThreadPool;

use super::config::TrackerConfig;
use super::flight::FlightRecord;
use super::store::RecordSource;
use super::timer::CancelToken;
use super::tracker_error::{FetchError, TrackerError};

const QUERY_WORKERS: usize = 2;

const MAX_QUERY_WORKERS: usize = 16;

/// Trims and upper-cases a flight number typed by the user. `None` when
/// nothing is left to search for.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Resolves flight numbers against a [`RecordSource`] on a small worker pool,
/// after an artificial latency.
///
/// A timed-out query cannot interrupt a `fetch` that is blocked inside the
/// source, so its worker stays busy. The pool grows by one worker whenever
/// all of them are taken, up to `MAX_QUERY_WORKERS`; past that, new queries
/// wait in the queue and may time out there.
pub struct QueryHandler {
    source: Arc<dyn RecordSource>,
    pool: Mutex<ThreadPool>,
    delay: Duration,
    timeout: Duration,
    logger: Option<Logger>,
}

impl QueryHandler {
    pub fn new(source: Arc<dyn RecordSource>, config: &TrackerConfig) -> Self {
        QueryHandler {
            source,
            pool: Mutex::new(ThreadPool::with_name(
                "flight-query".to_string(),
                QUERY_WORKERS,
            )),
            delay: config.query_delay,
            timeout: config.query_timeout,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Option<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Starts looking up `raw`. The returned [`PendingQuery`] resolves once the
    /// latency has elapsed, or fails if it is cancelled or outlives the timeout.
    pub fn submit(&self, raw: &str) -> Result<PendingQuery, TrackerError> {
        let flight_number = normalize(raw).ok_or(TrackerError::EmptyQuery)?;

        let (tx, rx) = mpsc::channel();
        let token = CancelToken::new();
        let source = Arc::clone(&self.source);
        let worker_token = Arc::clone(&token);
        let worker_number = flight_number.clone();
        let delay = self.delay;
        let logger = self.logger.clone();

        if let Some(logger) = &self.logger {
            let _ = logger.info(&format!("Looking up flight {}", flight_number), Color::Blue);
        }

        let mut pool = self
            .pool
            .lock()
            .map_err(|_| TrackerError::LockError("Failed to lock the query pool.".to_string()))?;
        let workers = pool.max_count();
        if pool.active_count() + pool.queued_count() >= workers && workers < MAX_QUERY_WORKERS {
            pool.set_num_threads(workers + 1);
        }

        pool.execute(move || {
            if worker_token.wait(delay) {
                let _ = tx.send(Err(TrackerError::Cancelled));
                return;
            }

            let result = source.fetch(&worker_number).map_err(TrackerError::from);
            if let (Some(logger), Err(e)) = (&logger, &result) {
                let _ = logger.error(&format!("Lookup of {} failed: {}", worker_number, e));
            }

            if worker_token.is_cancelled() {
                let _ = tx.send(Err(TrackerError::Cancelled));
            } else {
                // The receiver may be gone already if the caller gave up.
                let _ = tx.send(result);
            }
        });

        Ok(PendingQuery {
            flight_number,
            receiver: rx,
            token,
            timeout: self.timeout,
        })
    }

    /// Waits for every submitted query to finish.
    pub fn join(&self) {
        let pool = self
            .pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        pool.join();
    }

    /// Number of workers the pool currently has.
    pub fn workers(&self) -> usize {
        self.pool
            .lock()
            .map(|pool| pool.max_count())
            .unwrap_or(QUERY_WORKERS)
    }
}

/// A lookup in progress.
pub struct PendingQuery {
    flight_number: String,
    receiver: Receiver<Result<FlightRecord, TrackerError>>,
    token: Arc<CancelToken>,
    timeout: Duration,
}

impl PendingQuery {
    /// The normalized flight number being looked up.
    pub fn flight_number(&self) -> &str {
        &self.flight_number
    }

    /// Aborts the lookup. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the query resolves.
    pub fn wait(self) -> Result<FlightRecord, TrackerError> {
        match self.receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.cancel();
                Err(TrackerError::Fetch(FetchError::Timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(TrackerError::Other(
                "The query worker stopped without an answer.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flight_status::FlightStatus;
    use crate::types::store::StaticStore;
    use std::thread;
    use std::time::Instant;

    fn fast_config() -> TrackerConfig {
        TrackerConfig {
            query_delay: Duration::from_millis(10),
            query_timeout: Duration::from_millis(2000),
            ..Default::default()
        }
    }

    fn handler(config: &TrackerConfig) -> QueryHandler {
        QueryHandler::new(Arc::new(StaticStore::new()), config)
    }

    struct BrokenSource;

    impl RecordSource for BrokenSource {
        fn fetch(&self, _: &str) -> Result<FlightRecord, FetchError> {
            Err(FetchError::Network("connection refused".to_string()))
        }
    }

    struct StuckSource;

    impl RecordSource for StuckSource {
        fn fetch(&self, flight_number: &str) -> Result<FlightRecord, FetchError> {
            thread::sleep(Duration::from_millis(300));
            Ok(FlightRecord::not_found(flight_number))
        }
    }

    struct PartlyStuckSource;

    impl RecordSource for PartlyStuckSource {
        fn fetch(&self, flight_number: &str) -> Result<FlightRecord, FetchError> {
            if flight_number.starts_with("STUCK") {
                thread::sleep(Duration::from_millis(500));
            }
            Ok(StaticStore::new().lookup(flight_number))
        }
    }

    #[test]
    fn stuck_lookups_do_not_starve_later_queries() {
        let config = TrackerConfig {
            query_delay: Duration::from_millis(1),
            query_timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let handler = QueryHandler::new(Arc::new(PartlyStuckSource), &config);

        for stuck in ["STUCK1", "STUCK2"] {
            let result = handler.submit(stuck).unwrap().wait();
            assert_eq!(result, Err(TrackerError::Fetch(FetchError::Timeout)));
        }

        let record = handler.submit("AA123").unwrap().wait().unwrap();
        assert_eq!(record, StaticStore::new().lookup("AA123"));
        assert!(handler.workers() > QUERY_WORKERS);
        handler.join();
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  aa123 "), Some("AA123".to_string()));
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn lowercase_query_resolves_to_the_canonical_record() {
        let record = handler(&fast_config()).submit("aa123").unwrap().wait().unwrap();
        assert_eq!(record, StaticStore::new().lookup("AA123"));
    }

    #[test]
    fn unknown_query_resolves_to_not_found() {
        let record = handler(&fast_config()).submit("zz000").unwrap().wait().unwrap();
        assert_eq!(record.flight_number, "ZZ000");
        assert_eq!(record.status, FlightStatus::NotFound);
        assert_eq!(record.progress, 0.0);
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(matches!(
            handler(&fast_config()).submit("  "),
            Err(TrackerError::EmptyQuery)
        ));
    }

    #[test]
    fn query_waits_for_the_configured_delay() {
        let config = TrackerConfig {
            query_delay: Duration::from_millis(80),
            ..fast_config()
        };
        let started = Instant::now();
        handler(&config).submit("DL789").unwrap().wait().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn cancelled_query_resolves_as_cancelled() {
        let config = TrackerConfig {
            query_delay: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
            ..Default::default()
        };
        let pending = handler(&config).submit("AA123").unwrap();
        pending.cancel();
        pending.cancel();
        assert_eq!(pending.wait(), Err(TrackerError::Cancelled));
    }

    #[test]
    fn source_errors_surface_as_fetch_errors() {
        let handler = QueryHandler::new(Arc::new(BrokenSource), &fast_config());
        let result = handler.submit("AA123").unwrap().wait();
        assert!(matches!(
            result,
            Err(TrackerError::Fetch(FetchError::Network(_)))
        ));
    }

    #[test]
    fn slow_source_times_out() {
        let config = TrackerConfig {
            query_delay: Duration::from_millis(1),
            query_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let handler = QueryHandler::new(Arc::new(StuckSource), &config);
        let result = handler.submit("AA123").unwrap().wait();
        assert_eq!(result, Err(TrackerError::Fetch(FetchError::Timeout)));
        handler.join();
    }
}
