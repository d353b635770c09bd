//! Timeout and panic containment for long-blocking native calls.
//!
//! Native calls cannot be cancelled. Calls that may block for the duration
//! of a hardware handshake (synchronization, waiting for an acquisition) can
//! be run on a dedicated thread instead: the caller stops waiting after the
//! timeout and the thread is left to finish on its own ("orphaned").
//!
//! The library must stay loaded while such a thread is still inside it, so
//! every watchdog counts its in-flight calls and [`Watchdog::wait_idle`]
//! lets the owner hold off unloading until they drain.

use crate::error::{NativeError, NativeResult};
use serde::{Deserialize, Serialize};
use crossbeam::channel::RecvTimeoutError;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global counter for orphaned threads from timed-out calls.
static ORPHANED_THREAD_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Maximum number of orphaned threads allowed before refusing new calls.
const MAX_ORPHANED_THREADS: usize = 10;

// Hand-off states between a caller and its worker thread.
const RUNNING: u8 = 0;
const FINISHED: u8 = 1;
const ABANDONED: u8 = 2;

/// Watchdog settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Maximum time to wait for a single call.
    #[serde(with = "millis", rename = "timeout_ms", default = "default_timeout")]
    pub timeout: Duration,

    /// Whether to contain panics raised on the worker thread.
    #[serde(default = "default_true")]
    pub catch_panics: bool,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            catch_panics: true,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Runs blocking calls on worker threads with a timeout.
#[derive(Clone, Debug, Default)]
pub struct Watchdog {
    config: WatchdogConfig,
    pending: Arc<AtomicUsize>,
}

impl Watchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Execute `f` on a worker thread and wait at most the configured timeout.
    pub fn run<F, R>(&self, f: F) -> NativeResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        // Check for too many orphaned threads before spawning a new one
        let orphaned_count = ORPHANED_THREAD_COUNT.load(Ordering::SeqCst);
        if orphaned_count >= MAX_ORPHANED_THREADS {
            return Err(NativeError::TooManyOrphanedThreads {
                count: orphaned_count,
                max: MAX_ORPHANED_THREADS,
            });
        }

        let timeout = self.config.timeout;
        let catch_panics = self.config.catch_panics;

        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = crossbeam::channel::bounded(1);
        // Whoever moves the call out of RUNNING owns the orphan bookkeeping
        let state = Arc::new(AtomicU8::new(RUNNING));
        let worker_state = Arc::clone(&state);

        std::thread::spawn(move || {
            let result = if catch_panics {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(f))
            } else {
                Ok(f())
            };

            pending.fetch_sub(1, Ordering::SeqCst);

            if worker_state
                .compare_exchange(RUNNING, FINISHED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let _ = tx.send(result);
            } else {
                ORPHANED_THREAD_COUNT.fetch_sub(1, Ordering::SeqCst);
            }
        });

        match rx.recv_timeout(timeout) {
            Ok(outcome) => unwind_outcome(outcome),
            Err(RecvTimeoutError::Timeout) => {
                // Counted before abandoning so the worker can never decrement first
                ORPHANED_THREAD_COUNT.fetch_add(1, Ordering::SeqCst);
                if state
                    .compare_exchange(RUNNING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    // Finished while the timeout fired; its result is on the way
                    ORPHANED_THREAD_COUNT.fetch_sub(1, Ordering::SeqCst);
                    return match rx.recv() {
                        Ok(outcome) => unwind_outcome(outcome),
                        Err(_) => Err(NativeError::Panicked("worker thread exited without a result".to_string())),
                    };
                }
                tracing::warn!(
                    orphaned_threads = ORPHANED_THREAD_COUNT.load(Ordering::SeqCst),
                    pending_calls = self.pending.load(Ordering::SeqCst),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "Native call timed out, thread orphaned"
                );
                Err(NativeError::Timeout(timeout))
            }
            // Only reachable when panics are not caught
            Err(RecvTimeoutError::Disconnected) => {
                Err(NativeError::Panicked("worker thread exited without a result".to_string()))
            }
        }
    }

    /// Calls of this watchdog still running (including orphaned ones).
    pub fn pending_calls(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until no call is in flight or `max_wait` elapsed.
    ///
    /// Returns whether the watchdog is idle.
    pub fn wait_idle(&self, max_wait: Duration) -> bool {
        let start = Instant::now();
        while self.pending.load(Ordering::SeqCst) > 0 {
            if start.elapsed() > max_wait {
                tracing::warn!(
                    pending_calls = self.pending.load(Ordering::SeqCst),
                    "Native calls still in flight"
                );
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        true
    }
}

fn unwind_outcome<R>(outcome: std::thread::Result<R>) -> NativeResult<R> {
    outcome.map_err(|panic_info| {
        let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        NativeError::Panicked(message)
    })
}

/// Current count of orphaned threads across all watchdogs.
pub fn orphaned_thread_count() -> usize {
    ORPHANED_THREAD_COUNT.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchdog(timeout_ms: u64) -> Watchdog {
        Watchdog::new(WatchdogConfig {
            timeout: Duration::from_millis(timeout_ms),
            catch_panics: true,
        })
    }

    #[test]
    fn test_watchdog_config_default() {
        let config = WatchdogConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.catch_panics);
    }

    #[test]
    fn test_result_is_returned() {
        let dog = watchdog(5_000);
        assert_eq!(dog.run(|| 20002).unwrap(), 20002);
        assert!(dog.wait_idle(Duration::from_secs(1)));
    }

    #[test]
    fn test_panic_is_contained() {
        let dog = watchdog(5_000);
        let err = dog.run(|| -> i32 { panic!("vendor code exploded") }).unwrap_err();
        assert!(matches!(err, NativeError::Panicked(ref m) if m == "vendor code exploded"));
    }

    #[test]
    fn test_timeout_then_drain() {
        let dog = watchdog(20);
        let err = dog
            .run(|| std::thread::sleep(Duration::from_millis(300)))
            .unwrap_err();
        assert!(matches!(err, NativeError::Timeout(_)));
        assert_eq!(dog.pending_calls(), 1);
        assert!(dog.wait_idle(Duration::from_secs(5)));
        assert_eq!(dog.pending_calls(), 0);
    }

    #[test]
    fn test_orphan_count_settles_when_calls_finish_at_the_deadline() {
        // Work that lasts as long as the timeout lands on either side of it
        let dog = watchdog(2);
        for _ in 0..50 {
            let _ = dog.run(|| std::thread::sleep(Duration::from_millis(2)));
            assert!(dog.wait_idle(Duration::from_secs(5)));
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        while orphaned_thread_count() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(orphaned_thread_count(), 0);
    }

    #[test]
    fn test_config_from_millis() {
        let config: WatchdogConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.catch_panics);
    }
}
