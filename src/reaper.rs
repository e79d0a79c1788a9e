//! Background sweep thread shared by the expiring structures
//!
//! A [`Reaper`] runs one sweep closure on a named thread. Each sweep returns
//! how long to sleep before the next one; the sleep is a timed condvar wait,
//! so [`Reaper::notify`] (an earlier deadline appeared) and
//! [`Reaper::shutdown`] cut it short.
//!
//! The sweep runs while the stop flag's mutex is held. `notify` takes the
//! same mutex, so a wake-up issued between a sweep and the following wait
//! is not lost. Callers must release their own state locks before calling
//! `notify`.

use crate::error::{Result, SylvaError};
use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

pub(crate) struct Reaper {
    name: &'static str,
    signal: Arc<Signal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Reaper {
    /// Start a thread calling `sweep` until shutdown
    pub(crate) fn spawn<F>(name: &'static str, mut sweep: F) -> Result<Self>
    where
        F: FnMut() -> Duration + Send + 'static,
    {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker = Arc::clone(&signal);
        let handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!("{} started", name);
            let mut stopped = worker.stopped.lock();
            while !*stopped {
                let sleep = sweep();
                if *stopped {
                    break;
                }
                worker.wake.wait_for(&mut stopped, sleep);
            }
            debug!("{} stopped", name);
        })?;

        Ok(Self {
            name,
            signal,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Cut the current sleep short
    pub(crate) fn notify(&self) {
        let _stopped = self.signal.stopped.lock();
        self.signal.wake.notify_one();
    }

    /// Whether the thread has not been shut down yet
    pub(crate) fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Stop and join the thread; idempotent
    pub(crate) fn shutdown(&self) -> Result<()> {
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
            self.signal.wake.notify_all();
        }

        let Some(handle) = self.handle.lock().take() else {
            return Ok(());
        };
        handle.join().map_err(|_| {
            warn!("{} panicked before shutdown", self.name);
            SylvaError::resource_busy(self.name)
        })
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_sweeps_until_shutdown() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let reaper = Reaper::spawn("test-reaper", move || {
            seen.fetch_add(1, Ordering::SeqCst);
            Duration::from_millis(5)
        })
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        assert!(reaper.is_running());
        reaper.shutdown().unwrap();
        assert!(!reaper.is_running());

        let after = count.load(Ordering::SeqCst);
        assert!(after >= 2, "only {} sweeps", after);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after);
        assert!(reaper.shutdown().is_ok());
    }

    #[test]
    fn test_notify_wakes_long_sleep() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let reaper = Reaper::spawn("test-notify", move || {
            seen.fetch_add(1, Ordering::SeqCst);
            Duration::from_secs(60)
        })
        .unwrap();

        thread::sleep(Duration::from_millis(30));
        reaper.notify();
        thread::sleep(Duration::from_millis(30));
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_shutdown_interrupts_sleep() {
        let reaper = Reaper::spawn("test-shutdown", || Duration::from_secs(60)).unwrap();
        let started = std::time::Instant::now();
        reaper.shutdown().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_panicking_sweep_reports_busy() {
        let reaper = Reaper::spawn("test-panic", || panic!("sweep failed")).unwrap();
        thread::sleep(Duration::from_millis(30));
        let err = reaper.shutdown().unwrap_err();
        assert!(matches!(err, SylvaError::ResourceBusy { .. }));
    }
}
