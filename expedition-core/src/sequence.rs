//! Cooperative timed sequences.
//!
//! Briefings, the vault ceremony and the post-mission pipeline are ordered
//! lists of `(action, gate)` steps. A step's action is released, then the
//! sequence suspends on its gate: a timer, an explicit "advance" signal
//! (dialogue continue), or nothing. The sequence never performs actions
//! itself; it hands them back to whoever drives it, which keeps the engine
//! single-threaded and the ordering deterministic.
//!
//! Cancelling a sequence drops every remaining step without releasing it.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

/// What a step waits for after its action is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Continue with the next step straight away.
    Immediate,
    /// Suspend for a fixed duration.
    Delay(Duration),
    /// Suspend until [`Sequence::signal_advance`] is called.
    Advance,
}

/// One step of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<A> {
    /// Action released when the step runs.
    pub action: A,
    /// Suspension after the action.
    pub gate: Gate,
}

/// What a running sequence is currently suspended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Time remaining on the current timer.
    Timer(Duration),
    /// Waiting for an advance signal.
    Signal,
}

/// Presentation cues released by engine sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cue", content = "value", rename_all = "snake_case")]
pub enum Cue {
    /// Play a companion dialogue line.
    Dialogue(String),
    /// Move the active mission from briefing into exploration.
    BeginExploration,
    /// Show a UI panel.
    ShowPanel(String),
    /// Return the player to the hub.
    ReturnToHub,
}

/// An ordered, cancellable list of steps.
#[derive(Debug, Clone)]
pub struct Sequence<A> {
    pending: VecDeque<Step<A>>,
    wait: Option<Wait>,
    started: bool,
    cancelled: bool,
}

impl<A> Sequence<A> {
    /// Create a sequence that has not started yet.
    #[must_use]
    pub fn new(steps: Vec<Step<A>>) -> Self {
        Self {
            pending: steps.into(),
            wait: None,
            started: false,
            cancelled: false,
        }
    }

    /// Append a step that continues immediately.
    #[must_use]
    pub fn then(mut self, action: A) -> Self {
        self.pending.push_back(Step {
            action,
            gate: Gate::Immediate,
        });
        self
    }

    /// Append a step followed by a timed suspension.
    #[must_use]
    pub fn then_wait(mut self, action: A, delay: Duration) -> Self {
        self.pending.push_back(Step {
            action,
            gate: Gate::Delay(delay),
        });
        self
    }

    /// Append a step followed by a wait for the advance signal.
    #[must_use]
    pub fn then_await_advance(mut self, action: A) -> Self {
        self.pending.push_back(Step {
            action,
            gate: Gate::Advance,
        });
        self
    }

    /// Start the sequence, releasing actions up to the first suspension.
    ///
    /// Calling `start` again has no effect.
    pub fn start(&mut self) -> Vec<A> {
        if self.started || self.cancelled {
            return Vec::new();
        }
        self.started = true;
        let mut out = Vec::new();
        self.run_until_suspended(Duration::ZERO, &mut out);
        out
    }

    /// Let `dt` elapse. Leftover time carries into consecutive timers.
    pub fn tick(&mut self, dt: Duration) -> Vec<A> {
        let mut out = Vec::new();
        if !self.started || self.cancelled {
            return out;
        }
        if let Some(Wait::Timer(remaining)) = self.wait {
            if dt < remaining {
                self.wait = Some(Wait::Timer(remaining - dt));
            } else {
                self.wait = None;
                self.run_until_suspended(dt - remaining, &mut out);
            }
        }
        out
    }

    /// Deliver an advance signal. Ignored unless the sequence waits for one.
    pub fn signal_advance(&mut self) -> Vec<A> {
        let mut out = Vec::new();
        if self.cancelled || self.wait != Some(Wait::Signal) {
            return out;
        }
        self.wait = None;
        self.run_until_suspended(Duration::ZERO, &mut out);
        out
    }

    /// Abort: remaining steps are discarded and never released.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending.clear();
        self.wait = None;
    }

    /// Current suspension, if any.
    #[must_use]
    pub fn waiting_on(&self) -> Option<Wait> {
        self.wait
    }

    /// Whether every step ran (or the sequence was cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cancelled || (self.started && self.wait.is_none() && self.pending.is_empty())
    }

    /// Whether [`Sequence::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Steps not yet released.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.pending.len()
    }

    fn run_until_suspended(&mut self, mut carry: Duration, out: &mut Vec<A>) {
        while let Some(step) = self.pending.pop_front() {
            out.push(step.action);
            match step.gate {
                Gate::Immediate => {}
                Gate::Delay(delay) if carry >= delay => carry -= delay,
                Gate::Delay(delay) => {
                    self.wait = Some(Wait::Timer(delay - carry));
                    return;
                }
                Gate::Advance => {
                    self.wait = Some(Wait::Signal);
                    return;
                }
            }
        }
    }
}
