use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::GateConfig;
use crate::error::{GateError, GateResult, PermitKind};

#[derive(Debug, Default)]
struct GateState {
    exclusive: bool,
    in_flight: usize,
    stuck: bool,
}

/// Point-in-time view of the gate, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateSnapshot {
    pub exclusive: bool,
    pub in_flight: usize,
    pub stuck: bool,
}

/// Process-wide barrier between record mutations and whole-store operations.
///
/// State lives behind one mutex with one condition variable. Every state
/// change notifies all waiters; waiters additionally wake at least once per
/// poll interval and re-check their condition, so a lost wakeup delays a
/// caller but never hangs it.
pub struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
    config: GateConfig,
}

impl Gate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
            config,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Admit one mutation, waiting at most the configured timeout.
    pub fn acquire_mutation(&self) -> GateResult<MutationPermit<'_>> {
        self.acquire_mutation_within(self.config.timeout())
    }

    /// Admit one mutation once no exclusive holder is present.
    pub fn acquire_mutation_within(&self, timeout: Duration) -> GateResult<MutationPermit<'_>> {
        let started = Instant::now();
        let state = self.lock_state()?;
        let mut state = self.wait_while(state, PermitKind::Mutation, started, timeout, |s| {
            s.exclusive
        })?;
        state.in_flight += 1;
        Ok(MutationPermit { gate: self })
    }

    /// Claim exclusivity, waiting at most the configured timeout.
    pub fn acquire_exclusive(&self) -> GateResult<ExclusivePermit<'_>> {
        self.acquire_exclusive_within(self.config.timeout())
    }

    /// Claim exclusivity, then wait for admitted mutations to drain.
    ///
    /// From the moment the flag is set no new mutation is admitted. If the
    /// drain does not finish in time the claim is withdrawn and blocked
    /// mutations are woken before the timeout is returned.
    pub fn acquire_exclusive_within(&self, timeout: Duration) -> GateResult<ExclusivePermit<'_>> {
        let started = Instant::now();
        let state = self.lock_state()?;
        let mut state = self.wait_while(state, PermitKind::Exclusive, started, timeout, |s| {
            s.exclusive
        })?;
        state.exclusive = true;
        debug!(in_flight = state.in_flight, "exclusivity claimed; draining mutations");

        match self.wait_while(state, PermitKind::Exclusive, started, timeout, |s| {
            s.in_flight > 0
        }) {
            Ok(_drained) => Ok(ExclusivePermit { gate: self }),
            Err(err) => {
                self.state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .exclusive = false;
                self.changed.notify_all();
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> GateSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        GateSnapshot {
            exclusive: state.exclusive,
            in_flight: state.in_flight,
            stuck: state.stuck,
        }
    }

    fn lock_state(&self) -> GateResult<MutexGuard<'_, GateState>> {
        self.state.lock().map_err(|_| GateError::Stuck)
    }

    /// Guarded wait: returns once `blocked` is false, re-checking after every
    /// wakeup.
    fn wait_while<'a>(
        &'a self,
        mut state: MutexGuard<'a, GateState>,
        permit: PermitKind,
        started: Instant,
        timeout: Duration,
        blocked: impl Fn(&GateState) -> bool,
    ) -> GateResult<MutexGuard<'a, GateState>> {
        loop {
            if state.stuck {
                warn!(%permit, "refusing permit: gate is stuck");
                return Err(GateError::Stuck);
            }
            if !blocked(&state) {
                return Ok(state);
            }
            let waited = started.elapsed();
            if waited >= timeout {
                warn!(%permit, ?waited, "gate wait timed out");
                return Err(GateError::Timeout { permit, waited });
            }
            let slice = (timeout - waited).min(self.config.poll_interval());
            let (next, _) = self
                .changed
                .wait_timeout(state, slice)
                .map_err(|_| GateError::Stuck)?;
            state = next;
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("state", &self.snapshot())
            .field("config", &self.config)
            .finish()
    }
}

/// Held for the duration of one record mutation. Dropping it releases the
/// mutation slot.
#[derive(Debug)]
#[must_use = "the mutation slot is released as soon as the permit is dropped"]
pub struct MutationPermit<'a> {
    gate: &'a Gate,
}

impl Drop for MutationPermit<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.gate.changed.notify_all();
    }
}

/// Held for the duration of a whole-store operation. Dropping it reopens
/// the gate, unless the holder is unwinding from a panic, in which case the
/// gate is left stuck.
#[derive(Debug)]
#[must_use = "exclusivity is released as soon as the permit is dropped"]
pub struct ExclusivePermit<'a> {
    gate: &'a Gate,
}

impl Drop for ExclusivePermit<'_> {
    fn drop(&mut self) {
        let mut state = self.gate.state.lock().unwrap_or_else(PoisonError::into_inner);
        if std::thread::panicking() {
            state.stuck = true;
            warn!("exclusive holder panicked; gate is now stuck");
        } else {
            state.exclusive = false;
        }
        drop(state);
        self.gate.changed.notify_all();
    }
}
