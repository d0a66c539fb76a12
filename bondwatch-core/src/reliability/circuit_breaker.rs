//! Circuit breaker guarding the notification channel.
//!
//! The breaker counts consecutive send failures. After [`MAX_FAILURES`] it
//! opens and every `check_state` call reports it as blocking until
//! [`RESET_TIME`] has passed since the last failure. The reset is evaluated
//! lazily inside `check_state`; there is no timer.
//!
//! Transition listeners registered with `on_open`/`on_close` are invoked
//! synchronously, after the internal lock has been released, so a listener
//! may call back into the breaker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Consecutive failures that open the breaker.
pub const MAX_FAILURES: u32 = 3;

/// Cooldown after the last failure before an open breaker closes again.
pub const RESET_TIME: Duration = Duration::from_secs(5 * 60);

/// Snapshot of the breaker's internal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircuitBreakerState {
    pub failure_count: u32,
    pub last_failure_at: Option<Instant>,
    pub is_open: bool,
}

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Listeners {
    on_open: Vec<Listener>,
    on_close: Vec<Listener>,
}

struct CircuitBreakerInner {
    max_failures: u32,
    reset_time: Duration,
    state: Mutex<CircuitBreakerState>,
    listeners: Mutex<Listeners>,
}

/// Shared handle to a circuit breaker.
///
/// Cloning is cheap; all clones observe the same state.
pub struct CircuitBreaker {
    inner: Arc<CircuitBreakerInner>,
}

impl Clone for CircuitBreaker {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("max_failures", &self.inner.max_failures)
            .field("reset_time", &self.inner.reset_time)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_limits(MAX_FAILURES, RESET_TIME)
    }

    pub fn with_limits(max_failures: u32, reset_time: Duration) -> Self {
        Self {
            inner: Arc::new(CircuitBreakerInner {
                max_failures,
                reset_time,
                state: Mutex::new(CircuitBreakerState::default()),
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    pub fn reset_time(&self) -> Duration {
        self.inner.reset_time
    }

    /// Register a callback fired on the closed to open transition.
    pub fn on_open(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners().on_open.push(Arc::new(listener));
    }

    /// Register a callback fired whenever an open breaker closes.
    pub fn on_close(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners().on_close.push(Arc::new(listener));
    }

    /// Drop every registered listener.
    pub fn clear_listeners(&self) {
        let mut listeners = self.listeners();
        listeners.on_open.clear();
        listeners.on_close.clear();
    }

    /// Returns `true` while the breaker blocks sends.
    ///
    /// An open breaker whose cooldown has elapsed is closed here, before the
    /// answer is computed.
    pub fn check_state(&self) -> bool {
        {
            let mut state = self.lock_state();
            let cooled_down = state
                .last_failure_at
                .is_some_and(|at| at.elapsed() >= self.inner.reset_time);
            if !(state.is_open && cooled_down) {
                return state.is_open;
            }
            *state = CircuitBreakerState::default();
        }

        info!("Circuit breaker closed after cooldown");
        self.emit_close();
        false
    }

    /// Count one failed send; opens the breaker at the threshold.
    pub fn record_failure(&self) {
        let opened = {
            let mut state = self.lock_state();
            state.failure_count = state.failure_count.saturating_add(1);
            state.last_failure_at = Some(Instant::now());
            if !state.is_open && state.failure_count >= self.inner.max_failures {
                state.is_open = true;
                true
            } else {
                false
            }
        };

        if opened {
            warn!(
                max_failures = self.inner.max_failures,
                reset_after_secs = self.inner.reset_time.as_secs(),
                "Circuit breaker opened"
            );
            self.emit_open();
        }
    }

    /// Clear the failure count and close the breaker.
    pub fn reset(&self) {
        let was_open = {
            let mut state = self.lock_state();
            let was_open = state.is_open;
            *state = CircuitBreakerState::default();
            was_open
        };

        if was_open {
            info!("Circuit breaker reset");
            self.emit_close();
        }
    }

    pub fn state(&self) -> CircuitBreakerState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, CircuitBreakerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_open(&self) {
        let callbacks = self.listeners().on_open.clone();
        for callback in callbacks {
            callback();
        }
    }

    fn emit_close(&self) {
        let callbacks = self.listeners().on_close.clone();
        for callback in callbacks {
            callback();
        }
    }
}
