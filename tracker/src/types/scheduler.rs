use std::sync::Arc;
use std::time::Duration;

use logger::{Color, Logger};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{TelemetryLimits, TrackerConfig};
use super::flight::FlightRecord;
use super::timer::Timer;
use super::tracker_error::TrackerError;

/// Drives the snapshot chain of a moving flight.
///
/// Each tick derives the next snapshot from the one emitted before it and
/// hands it to the caller's callback, on the scheduler's own thread, in order.
pub struct LiveUpdateScheduler {
    interval: Duration,
    land_on_arrival: bool,
    limits: TelemetryLimits,
    logger: Option<Logger>,
}

impl LiveUpdateScheduler {
    pub fn new(config: &TrackerConfig) -> Self {
        LiveUpdateScheduler {
            interval: config.tick_interval,
            land_on_arrival: config.land_on_arrival,
            limits: config.limits.clone(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Option<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Starts updating `initial`, which has to be a live flight.
    ///
    /// The status is only checked here. Later ticks never re-read it, so the
    /// loop ends only when cancelled or, with `land_on_arrival`, on landing.
    pub fn start(
        &self,
        initial: FlightRecord,
        on_tick: impl FnMut(FlightRecord) + Send + 'static,
    ) -> Result<CancelHandle, TrackerError> {
        self.start_with_rng(initial, StdRng::from_entropy(), on_tick)
    }

    /// Same as [`start`](Self::start), drawing the jitter from `rng`.
    pub fn start_with_rng<R: Rng + Send + 'static>(
        &self,
        initial: FlightRecord,
        mut rng: R,
        mut on_tick: impl FnMut(FlightRecord) + Send + 'static,
    ) -> Result<CancelHandle, TrackerError> {
        if !initial.is_live() {
            return Err(TrackerError::NotLive(initial.status));
        }

        let flight_number = initial.flight_number.clone();
        let land_on_arrival = self.land_on_arrival;
        let limits = self.limits.clone();
        let logger = self.logger.clone();
        let mut latest = initial;

        let timer = Timer::new(self.interval);
        timer.start(&format!("live-{}", flight_number), move |tick| {
            let mut next = latest.advance(&mut rng, &limits);
            let arrived = land_on_arrival && next.has_arrived();
            if arrived {
                next = next.landed();
            }

            if let Some(logger) = &logger {
                let _ = logger.debug(&format!(
                    "{} tick {}: progress {:.1}%, {:.0} mph, {:.0} ft, {:.0} mi left",
                    next.flight_number,
                    tick,
                    next.progress,
                    next.speed,
                    next.altitude,
                    next.distance.remaining
                ));
                if arrived {
                    let _ = logger.info(
                        &format!("{} has landed, live updates finished", next.flight_number),
                        Color::Green,
                    );
                }
            }

            latest = next.clone();
            on_tick(next);
            !arrived
        })?;

        if let Some(logger) = &self.logger {
            let _ = logger.info(
                &format!(
                    "Live updates started for {} every {} ms",
                    flight_number,
                    self.interval.as_millis()
                ),
                Color::Cyan,
            );
        }

        Ok(CancelHandle {
            timer,
            flight_number,
        })
    }
}

/// Stops a running live-update loop. Dropping the handle stops it as well.
pub struct CancelHandle {
    timer: Arc<Timer>,
    flight_number: String,
}

impl CancelHandle {
    /// Stops future ticks. Once this returns no tick is delivered anymore.
    /// Calling it again, or after the loop ended by itself, does nothing.
    pub fn cancel(&self) {
        self.timer.stop();
    }

    /// Whether the loop is still producing snapshots.
    pub fn is_active(&self) -> bool {
        self.timer.is_running()
    }

    pub fn flight_number(&self) -> &str {
        &self.flight_number
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.timer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flight_status::FlightStatus;
    use crate::types::store::StaticStore;
    use std::sync::mpsc;
    use std::thread;

    fn config(tick_millis: u64) -> TrackerConfig {
        TrackerConfig {
            tick_interval: Duration::from_millis(tick_millis),
            ..Default::default()
        }
    }

    #[test]
    fn refuses_flights_that_are_not_moving() {
        let scheduler = LiveUpdateScheduler::new(&config(5));
        let landed = StaticStore::new().lookup("DL789");
        assert_eq!(
            scheduler.start(landed, |_| {}).err(),
            Some(TrackerError::NotLive(FlightStatus::Landed))
        );
        let unknown = FlightRecord::not_found("ZZ000");
        assert!(scheduler.start(unknown, |_| {}).is_err());
    }

    #[test]
    fn each_tick_builds_on_the_previous_snapshot() {
        let (tx, rx) = mpsc::channel();
        let scheduler = LiveUpdateScheduler::new(&config(5));
        let initial = StaticStore::new().lookup("UA456");
        let handle = scheduler
            .start_with_rng(initial.clone(), StdRng::seed_from_u64(11), move |next| {
                let _ = tx.send(next);
            })
            .unwrap();

        let mut previous = initial;
        for _ in 0..5 {
            let next = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert!(next.progress >= previous.progress);
            assert!(next.progress - previous.progress <= 2.0);
            assert!(next.speed >= 450.0);
            assert!(next.altitude >= 25000.0);
            assert!(next.distance.remaining <= previous.distance.remaining);
            assert_eq!(next.status, FlightStatus::Departed);
            previous = next;
        }
        handle.cancel();
    }

    #[test]
    fn cancel_is_idempotent_and_final() {
        let (tx, rx) = mpsc::channel();
        let scheduler = LiveUpdateScheduler::new(&config(5));
        let handle = scheduler
            .start(StaticStore::new().lookup("AA123"), move |next| {
                let _ = tx.send(next);
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());

        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(40));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropping_the_handle_stops_the_loop() {
        let (tx, rx) = mpsc::channel();
        let scheduler = LiveUpdateScheduler::new(&config(5));
        let handle = scheduler
            .start(StaticStore::new().lookup("AA123"), move |next| {
                let _ = tx.send(next);
            })
            .unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        drop(handle);

        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(40));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn faithful_loop_keeps_ticking_past_arrival() {
        let (tx, rx) = mpsc::channel();
        let scheduler = LiveUpdateScheduler::new(&config(1));
        let mut nearly_there = StaticStore::new().lookup("AA123");
        nearly_there.progress = 99.5;
        let handle = scheduler
            .start(nearly_there, move |next| {
                let _ = tx.send(next);
            })
            .unwrap();

        let mut last = None;
        for _ in 0..20 {
            last = Some(rx.recv_timeout(Duration::from_secs(2)).unwrap());
        }
        let last = last.unwrap();
        assert!(last.progress <= 100.0);
        assert_eq!(last.status, FlightStatus::EnRoute);
        assert!(handle.is_active());
        handle.cancel();
    }

    #[test]
    fn landing_on_arrival_ends_the_loop() {
        let (tx, rx) = mpsc::channel();
        let scheduler = LiveUpdateScheduler::new(&TrackerConfig {
            land_on_arrival: true,
            limits: TelemetryLimits {
                max_progress_step: 100.0,
                ..Default::default()
            },
            ..config(1)
        });
        let handle = scheduler
            .start_with_rng(
                StaticStore::new().lookup("AA123"),
                StdRng::seed_from_u64(5),
                move |next| {
                    let _ = tx.send(next);
                },
            )
            .unwrap();

        let mut snapshots = Vec::new();
        while let Ok(next) = rx.recv_timeout(Duration::from_millis(300)) {
            snapshots.push(next);
        }
        let last = snapshots.last().unwrap();
        assert_eq!(last.status, FlightStatus::Landed);
        assert_eq!(last.progress, 100.0);
        assert_eq!(last.distance.remaining, 0.0);
        assert_eq!(
            snapshots
                .iter()
                .filter(|s| s.status == FlightStatus::Landed)
                .count(),
            1
        );
        assert!(!handle.is_active());
    }
}
