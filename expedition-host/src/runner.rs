//! Async driver for cooperative sequences.
//!
//! A [`Sequence`] only knows about elapsed time and advance signals; the
//! [`SequenceRunner`] supplies both from tokio. Timed suspensions sleep,
//! signal suspensions wait on an mpsc channel fed by the dialogue UI, and a
//! `watch` flag aborts whatever is left of the sequence.
//!
//! The runner never spawns: it is awaited in place on the task that owns the
//! hub, so released actions run on the same thread as every other engine
//! mutation.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use expedition_core::sequence::{Sequence, Wait};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step was released.
    Finished,
    /// Cancelled before the end; remaining steps were dropped.
    Cancelled,
}

/// Sender side, held by the UI.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    advance: mpsc::Sender<()>,
    cancel: watch::Sender<bool>,
}

impl RunnerHandle {
    /// Press "continue". Returns `false` once the runner is gone.
    pub async fn advance(&self) -> bool {
        self.advance.send(()).await.is_ok()
    }

    /// Abort the running sequence and every later one.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }
}

/// Receiver side, owned by the task that drives sequences.
#[derive(Debug)]
pub struct SequenceRunner {
    advance: mpsc::Receiver<()>,
    cancel: watch::Receiver<bool>,
}

/// Create a connected handle/runner pair.
#[must_use]
pub fn channel(capacity: usize) -> (RunnerHandle, SequenceRunner) {
    let (advance_tx, advance_rx) = mpsc::channel(capacity.max(1));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    (
        RunnerHandle {
            advance: advance_tx,
            cancel: cancel_tx,
        },
        SequenceRunner {
            advance: advance_rx,
            cancel: cancel_rx,
        },
    )
}

impl SequenceRunner {
    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Drive `sequence` to the end, handing every released action to `perform`.
    ///
    /// Advance signals that arrive while the sequence is waiting on a timer
    /// are dropped. Dropping the [`RunnerHandle`] cancels.
    pub async fn run<A, F>(&mut self, mut sequence: Sequence<A>, mut perform: F) -> RunOutcome
    where
        F: FnMut(A),
    {
        if self.is_cancelled() {
            sequence.cancel();
            return RunOutcome::Cancelled;
        }
        sequence.start().into_iter().for_each(&mut perform);

        loop {
            let step = match sequence.waiting_on() {
                None => return RunOutcome::Finished,
                Some(Wait::Timer(delay)) => self.wait_timer(delay).await,
                Some(Wait::Signal) => self.wait_signal().await,
            };
            let released = match step {
                Step::Elapsed(delay) => sequence.tick(delay),
                Step::Advanced => sequence.signal_advance(),
                Step::Cancelled => {
                    debug!(remaining = sequence.remaining_steps(), "Sequence cancelled");
                    sequence.cancel();
                    return RunOutcome::Cancelled;
                }
            };
            released.into_iter().for_each(&mut perform);
        }
    }

    async fn wait_timer(&mut self, delay: Duration) -> Step {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => return Step::Elapsed(delay),
                signal = self.advance.recv() => {
                    if signal.is_none() {
                        return Step::Cancelled;
                    }
                    debug!("Advance ignored while a timer is pending");
                }
                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        return Step::Cancelled;
                    }
                }
            }
        }
    }

    async fn wait_signal(&mut self) -> Step {
        loop {
            tokio::select! {
                signal = self.advance.recv() => {
                    return match signal {
                        Some(()) => Step::Advanced,
                        None => Step::Cancelled,
                    };
                }
                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        return Step::Cancelled;
                    }
                }
            }
        }
    }
}

enum Step {
    Elapsed(Duration),
    Advanced,
    Cancelled,
}
