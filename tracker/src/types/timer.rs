use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use super::tracker_error::TrackerError;

/// A cancellation flag that sleeping threads can wait on.
///
/// `cancel` wakes every waiter at once, so a cancelled wait returns right away
/// instead of sleeping out the rest of its duration.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: Mutex<bool>,
    signal: Condvar,
}

impl CancelToken {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the token as cancelled. Calling it again is a no-op.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleeps for `duration` unless cancelled first. Returns `true` if the
    /// token was cancelled.
    pub fn wait(&self, duration: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .signal
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    // A panicking tick callback must not leave the token unusable.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A repeating timer running its callback on a dedicated thread.
///
/// Callbacks run with the timer's token locked, so once `stop` returns no
/// further callback is in progress or will start. A callback must not call
/// `stop` on its own timer; it returns `false` to end the loop instead.
pub struct Timer {
    interval: Duration,
    token: Arc<CancelToken>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Timer {
    /// Creates a new, not yet started, timer.
    pub fn new(interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            interval,
            token: CancelToken::new(),
            handle: Mutex::new(None),
        })
    }

    /// Starts the timer thread. `tick_callback` receives the tick count,
    /// starting at 1, and keeps the timer going for as long as it returns `true`.
    pub fn start(
        &self,
        name: &str,
        mut tick_callback: impl FnMut(usize) -> bool + Send + 'static,
    ) -> Result<(), TrackerError> {
        let mut handle_lock = self
            .handle
            .lock()
            .map_err(|_| TrackerError::LockError("Failed to lock the timer handle.".to_string()))?;
        if handle_lock.is_some() {
            return Err(TrackerError::TimerStartError(
                "The timer is already started.".to_string(),
            ));
        }

        let token = Arc::clone(&self.token);
        let interval = self.interval;

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut tick_count = 0;
                let mut cancelled = token.lock();
                loop {
                    let (guard, _) = token
                        .signal
                        .wait_timeout_while(cancelled, interval, |cancelled| !*cancelled)
                        .unwrap_or_else(PoisonError::into_inner);
                    cancelled = guard;
                    if *cancelled {
                        break;
                    }

                    tick_count += 1;
                    if !tick_callback(tick_count) {
                        *cancelled = true;
                        break;
                    }
                }
            })
            .map_err(|_| {
                TrackerError::TimerStartError("Failed to start the timer thread.".to_string())
            })?;

        *handle_lock = Some(handle);
        Ok(())
    }

    /// Stops the timer and waits for its thread to finish. Safe to call any
    /// number of times, before or after the timer ended on its own, but never
    /// from inside the tick callback: the callback holds the token lock.
    pub fn stop(&self) {
        self.token.cancel();

        let handle = match self.handle.lock() {
            Ok(mut handle_lock) => handle_lock.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Whether the timer thread is still ticking.
    pub fn is_running(&self) -> bool {
        let started = self.handle.lock().map(|h| h.is_some()).unwrap_or(false);
        started && !self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[test]
    fn cancelled_wait_returns_early() {
        let token = CancelToken::new();
        let waiter = Arc::clone(&token);
        let started = Instant::now();
        let sleeper = thread::spawn(move || waiter.wait(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(sleeper.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn uncancelled_wait_times_out() {
        let token = CancelToken::new();
        assert!(!token.wait(Duration::from_millis(5)));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn timer_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let timer = Timer::new(Duration::from_millis(5));
        timer
            .start("test-timer", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            })
            .unwrap();

        thread::sleep(Duration::from_millis(60));
        timer.stop();
        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0);
        assert!(!timer.is_running());

        thread::sleep(Duration::from_millis(30));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn callback_can_end_the_loop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let timer = Timer::new(Duration::from_millis(2));
        timer
            .start("test-timer", move |tick| {
                counter.store(tick, Ordering::SeqCst);
                tick < 3
            })
            .unwrap();

        thread::sleep(Duration::from_millis(60));
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!timer.is_running());
        timer.stop();
    }

    #[test]
    fn stop_waits_for_the_tick_in_progress() {
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);
        let timer = Timer::new(Duration::from_millis(1));
        timer
            .start("test-timer", move |_| {
                thread::sleep(Duration::from_millis(40));
                done.fetch_add(1, Ordering::SeqCst);
                true
            })
            .unwrap();

        thread::sleep(Duration::from_millis(10));
        timer.stop();
        let after_stop = finished.load(Ordering::SeqCst);
        assert!(after_stop >= 1);

        thread::sleep(Duration::from_millis(60));
        assert_eq!(finished.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn cannot_start_twice() {
        let timer = Timer::new(Duration::from_millis(50));
        timer.start("test-timer", |_| true).unwrap();
        assert!(matches!(
            timer.start("test-timer", |_| true),
            Err(TrackerError::TimerStartError(_))
        ));
        timer.stop();
        timer.stop();
    }
}
