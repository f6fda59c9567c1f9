//! Circuit breaker guarding a single downstream dependency.
//!
//! ```text
//! ┌────────┐ F consecutive failures ┌──────┐  cooldown elapsed  ┌───────────┐
//! │ Closed ├───────────────────────►│ Open ├───────────────────►│ Half-Open │
//! └────────┘                        └──────┘                    └─────┬─────┘
//!      ▲                                ▲      trial failure          │
//!      │                                └─────────────────────────────┤
//!      │             trial success                                    │
//!      └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers never see the downstream error: every failure, and every call
//! the breaker refuses, resolves to the caller's fallback value.
//!
//! While half-open exactly one trial call is in flight. Concurrent callers
//! get the fallback immediately instead of waiting on the trial. A trial
//! future dropped before it completes counts as a failed trial.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use common::CircuitBreakerConfig;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls flow through
    Closed,
    /// Calls are short-circuited to the fallback
    Open,
    /// One trial call decides whether to close again
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("CLOSED"),
            Self::Open => f.write_str("OPEN"),
            Self::HalfOpen => f.write_str("HALF_OPEN"),
        }
    }
}

/// Breaker tuning.
#[derive(Debug, Clone, Copy)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    /// Deadline applied to each guarded call; elapsing counts as a failure
    pub call_timeout: Option<Duration>,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            cooldown: Duration::from_secs(config.cooldown_seconds),
            call_timeout: config.call_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Point-in-time copy of the breaker's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub last_failure: Option<Instant>,
    pub open_until: Option<Instant>,
    pub trial_in_flight: bool,
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    open_until: Option<Instant>,
    trial_in_flight: bool,
    /// Bumped on every entry into `Closed`. Pass-through calls admitted under
    /// an older epoch no longer affect the counters.
    epoch: u64,
}

enum Admission {
    Pass(u64),
    Trial,
    Reject,
}

pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            circuit: Mutex::new(Circuit {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
                open_until: None,
                trial_in_flight: false,
                epoch: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &BreakerSettings {
        &self.settings
    }

    pub fn state(&self) -> CircuitState {
        self.circuit.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let circuit = self.circuit.lock();
        CircuitSnapshot {
            state: circuit.state,
            consecutive_failures: circuit.consecutive_failures,
            last_failure: circuit.last_failure,
            open_until: circuit.open_until,
            trial_in_flight: circuit.trial_in_flight,
        }
    }

    /// Run `op` through the breaker.
    ///
    /// Returns `op`'s value on success. On failure, timeout, or when the
    /// breaker refuses the call, returns `fallback()` instead.
    pub async fn call<T, E, Op, Fut, Fb>(&self, op: Op, fallback: Fb) -> T
    where
        Op: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        Fb: FnOnce() -> T,
    {
        match self.admit() {
            Admission::Reject => {
                debug!(breaker = %self.name, "Call short-circuited to fallback");
                fallback()
            }
            Admission::Pass(epoch) => match self.invoke(op()).await {
                Ok(value) => {
                    self.record_success(epoch);
                    value
                }
                Err(cause) => {
                    self.record_failure(epoch, &cause);
                    fallback()
                }
            },
            Admission::Trial => {
                let trial = TrialGuard {
                    breaker: self,
                    armed: true,
                };
                match self.invoke(op()).await {
                    Ok(value) => {
                        trial.settle(Ok(()));
                        value
                    }
                    Err(cause) => {
                        trial.settle(Err(&cause));
                        fallback()
                    }
                }
            }
        }
    }

    async fn invoke<T, E, Fut>(&self, fut: Fut) -> Result<T, String>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        match self.settings.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("call exceeded {} ms", limit.as_millis())),
            },
            None => fut.await.map_err(|e| e.to_string()),
        }
    }

    fn admit(&self) -> Admission {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();

        match circuit.state {
            CircuitState::Closed => Admission::Pass(circuit.epoch),
            CircuitState::Open => {
                if circuit.open_until.is_some_and(|until| now >= until) {
                    self.transition(&mut circuit, CircuitState::HalfOpen);
                    circuit.trial_in_flight = true;
                    Admission::Trial
                } else {
                    Admission::Reject
                }
            }
            CircuitState::HalfOpen if circuit.trial_in_flight => Admission::Reject,
            CircuitState::HalfOpen => {
                circuit.trial_in_flight = true;
                Admission::Trial
            }
        }
    }

    fn record_success(&self, epoch: u64) {
        let mut circuit = self.circuit.lock();
        if circuit.state == CircuitState::Closed && circuit.epoch == epoch {
            circuit.consecutive_failures = 0;
        }
    }

    fn record_failure(&self, epoch: u64, cause: &str) {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();
        if circuit.state != CircuitState::Closed || circuit.epoch != epoch {
            return;
        }

        circuit.consecutive_failures += 1;
        circuit.last_failure = Some(now);
        debug!(
            breaker = %self.name,
            failures = circuit.consecutive_failures,
            cause,
            "Downstream call failed"
        );

        if circuit.consecutive_failures >= self.settings.failure_threshold {
            self.open(&mut circuit, now);
        }
    }

    fn settle_trial(&self, outcome: Result<(), &str>) {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();
        circuit.trial_in_flight = false;

        match outcome {
            Ok(()) => {
                circuit.consecutive_failures = 0;
                circuit.open_until = None;
                circuit.epoch += 1;
                self.transition(&mut circuit, CircuitState::Closed);
            }
            Err(cause) => {
                circuit.last_failure = Some(now);
                debug!(breaker = %self.name, cause, "Trial call failed");
                self.open(&mut circuit, now);
            }
        }
    }

    fn open(&self, circuit: &mut Circuit, now: Instant) {
        circuit.open_until = Some(now + self.settings.cooldown);
        circuit.trial_in_flight = false;
        self.transition(circuit, CircuitState::Open);
    }

    fn transition(&self, circuit: &mut Circuit, to: CircuitState) {
        let from = circuit.state;
        circuit.state = to;

        warn!(
            breaker = %self.name,
            from = %from,
            to = %to,
            failures = circuit.consecutive_failures,
            cooldown_ms = self.settings.cooldown.as_millis() as u64,
            "circuit breaker state transition"
        );
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

/// Settles the half-open trial exactly once, even if the call is dropped.
struct TrialGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl TrialGuard<'_> {
    fn settle(mut self, outcome: Result<(), &str>) {
        self.armed = false;
        self.breaker.settle_trial(outcome);
    }
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.breaker.settle_trial(Err("trial call abandoned"));
        }
    }
}
