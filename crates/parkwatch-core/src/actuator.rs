//! Barrier actuator state machine.
//!
//! ```text
//!          arm            (next tick)            elapsed >= open duration
//!  ┌──────┐ ───▶ ┌─────────┐ ── Open ──▶ ┌───────────┐ ── Close ──▶ ┌──────┐
//!  │ Idle │      │ Opening │             │ WaitClose │              │ Idle │
//!  └──────┘      └─────────┘             └───────────┘              └──────┘
//! ```
//!
//! The machine is a pure function of `(state, time in state, armed)`. It is
//! stepped once per tick before any network work, so barrier timing does not
//! depend on how long the rest of the tick takes. [`force_close`] overrides
//! any cycle in progress.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorState {
    /// Barrier closed, nothing pending.
    #[default]
    Idle,
    /// Armed; the open command goes out on the next step.
    Opening,
    /// Barrier open, waiting for the open duration to elapse.
    WaitClose,
}

/// A command for the actuator hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorCommand {
    /// Raise the barrier.
    Open,
    /// Lower the barrier.
    Close,
}

/// Result of stepping the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State after the step.
    pub state: ActuatorState,
    /// Command to issue, if any.
    pub command: Option<ActuatorCommand>,
}

impl Step {
    const fn hold(state: ActuatorState) -> Self {
        Self {
            state,
            command: None,
        }
    }

    /// Returns `true` if the step moved to a different state.
    #[must_use]
    pub fn changed(&self, from: ActuatorState) -> bool {
        self.state != from
    }
}

/// Advance the machine by one tick.
///
/// `elapsed` is the time spent in `state` so far. Arming is only honoured
/// from `Idle`; a cycle already in progress runs to completion.
#[must_use]
pub fn step(state: ActuatorState, elapsed: Duration, armed: bool, open_for: Duration) -> Step {
    match state {
        ActuatorState::Idle if armed => Step::hold(ActuatorState::Opening),
        ActuatorState::Idle => Step::hold(ActuatorState::Idle),
        ActuatorState::Opening => Step {
            state: ActuatorState::WaitClose,
            command: Some(ActuatorCommand::Open),
        },
        ActuatorState::WaitClose if elapsed >= open_for => Step {
            state: ActuatorState::Idle,
            command: Some(ActuatorCommand::Close),
        },
        ActuatorState::WaitClose => Step::hold(ActuatorState::WaitClose),
    }
}

/// Reset to `Idle` with an immediate close, whatever the current state.
#[must_use]
pub const fn force_close() -> Step {
    Step {
        state: ActuatorState::Idle,
        command: Some(ActuatorCommand::Close),
    }
}

/// Per-slot actuator bookkeeping: the current state and when it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierTimer {
    state: ActuatorState,
    entered_at: Instant,
    open_for: Duration,
}

impl BarrierTimer {
    /// Create an idle timer.
    #[must_use]
    pub const fn new(open_for: Duration, now: Instant) -> Self {
        Self {
            state: ActuatorState::Idle,
            entered_at: now,
            open_for,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ActuatorState {
        self.state
    }

    /// When the current state was entered.
    #[must_use]
    pub const fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Request an open cycle. The open command goes out on the next
    /// [`advance`](Self::advance). Ignored unless idle.
    pub fn arm(&mut self, now: Instant) {
        if self.state == ActuatorState::Idle {
            let next = step(self.state, Duration::ZERO, true, self.open_for);
            self.apply(next, now);
        }
    }

    /// Step the machine and return the command to issue, if any.
    pub fn advance(&mut self, now: Instant) -> Option<ActuatorCommand> {
        let elapsed = now.saturating_duration_since(self.entered_at);
        let next = step(self.state, elapsed, false, self.open_for);
        self.apply(next, now)
    }

    /// Force the barrier closed.
    pub fn force_close(&mut self, now: Instant) -> Option<ActuatorCommand> {
        self.apply(force_close(), now)
    }

    fn apply(&mut self, next: Step, now: Instant) -> Option<ActuatorCommand> {
        if next.changed(self.state) {
            self.state = next.state;
            self.entered_at = now;
        }
        next.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN_FOR: Duration = Duration::from_secs(3);

    #[test]
    fn idle_without_arm_holds() {
        let s = step(ActuatorState::Idle, Duration::from_secs(100), false, OPEN_FOR);
        assert_eq!(s, Step::hold(ActuatorState::Idle));
    }

    #[test]
    fn full_cycle() {
        let s = step(ActuatorState::Idle, Duration::ZERO, true, OPEN_FOR);
        assert_eq!(s.state, ActuatorState::Opening);
        assert_eq!(s.command, None);

        let s = step(ActuatorState::Opening, Duration::ZERO, false, OPEN_FOR);
        assert_eq!(s.state, ActuatorState::WaitClose);
        assert_eq!(s.command, Some(ActuatorCommand::Open));

        let s = step(ActuatorState::WaitClose, Duration::from_secs(1), false, OPEN_FOR);
        assert_eq!(s, Step::hold(ActuatorState::WaitClose));

        let s = step(ActuatorState::WaitClose, OPEN_FOR, false, OPEN_FOR);
        assert_eq!(s.state, ActuatorState::Idle);
        assert_eq!(s.command, Some(ActuatorCommand::Close));
    }

    #[test]
    fn arm_ignored_mid_cycle() {
        let s = step(ActuatorState::WaitClose, Duration::from_secs(1), true, OPEN_FOR);
        assert_eq!(s, Step::hold(ActuatorState::WaitClose));
    }

    #[test]
    fn timer_runs_on_simulated_clock() {
        let t0 = Instant::now();
        let mut timer = BarrierTimer::new(OPEN_FOR, t0);

        timer.arm(t0);
        assert_eq!(timer.state(), ActuatorState::Opening);

        let t1 = t0 + Duration::from_secs(5);
        assert_eq!(timer.advance(t1), Some(ActuatorCommand::Open));
        assert_eq!(timer.state(), ActuatorState::WaitClose);
        assert_eq!(timer.entered_at(), t1);

        // open duration counts from the open command, not the arm
        assert_eq!(timer.advance(t1 + Duration::from_secs(2)), None);
        assert_eq!(
            timer.advance(t1 + Duration::from_secs(3)),
            Some(ActuatorCommand::Close)
        );
        assert_eq!(timer.state(), ActuatorState::Idle);
        assert_eq!(timer.advance(t1 + Duration::from_secs(9)), None);
    }

    #[test]
    fn arm_mid_cycle_is_ignored() {
        let t0 = Instant::now();
        let mut timer = BarrierTimer::new(OPEN_FOR, t0);
        timer.arm(t0);
        timer.advance(t0);
        let opened_at = timer.entered_at();

        timer.arm(t0 + Duration::from_secs(1));
        assert_eq!(timer.state(), ActuatorState::WaitClose);
        assert_eq!(timer.entered_at(), opened_at);
    }

    #[test]
    fn force_close_overrides_cycle() {
        let t0 = Instant::now();
        let mut timer = BarrierTimer::new(OPEN_FOR, t0);
        timer.arm(t0);
        timer.advance(t0);
        assert_eq!(timer.state(), ActuatorState::WaitClose);

        assert_eq!(timer.force_close(t0), Some(ActuatorCommand::Close));
        assert_eq!(timer.state(), ActuatorState::Idle);
        assert_eq!(timer.advance(t0 + Duration::from_secs(10)), None);
    }

    #[test]
    fn force_close_cancels_pending_open() {
        let t0 = Instant::now();
        let mut timer = BarrierTimer::new(OPEN_FOR, t0);
        timer.arm(t0);
        assert_eq!(timer.force_close(t0), Some(ActuatorCommand::Close));
        assert_eq!(timer.advance(t0), None);
        assert_eq!(timer.state(), ActuatorState::Idle);
    }
}
