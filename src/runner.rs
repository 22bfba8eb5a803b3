//! Cooperative auto-run driver.
//!
//! The engine never waits or gives up on its own. [`AutoRunner`] repeatedly calls
//! [`TuringMachine::step`] with a delay between calls, checks a [`CancelToken`] before every
//! step and stops on the first terminal outcome. A cancelled run is left exactly as it was
//! after its last completed step and can be resumed by stepping again.

use crate::machine::TuringMachine;
use crate::types::Step;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// The default pause between automatic steps, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 300;
/// The smallest non-zero pause accepted between automatic steps, in milliseconds.
pub const MIN_DELAY_MS: u64 = 10;

/// Settings for an [`AutoRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Pause between steps. Zero disables pausing; other values are raised to
    /// [`MIN_DELAY_MS`].
    pub delay_ms: u64,
    /// Stop after this many steps in a single call to [`AutoRunner::run`].
    pub max_steps: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            max_steps: None,
        }
    }
}

impl RunnerConfig {
    /// Returns the effective delay between steps.
    pub fn delay(&self) -> Duration {
        match self.delay_ms {
            0 => Duration::ZERO,
            ms => Duration::from_millis(ms.max(MIN_DELAY_MS)),
        }
    }
}

/// A shared flag used to stop an auto-run from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arms the token so the same runner can be started again.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Why an auto-run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The machine returned a terminal outcome.
    Finished(Step),
    /// The token was cancelled before the next step.
    Cancelled,
    /// The configured step budget was used up.
    StepLimit,
}

/// Drives a machine step by step until it halts, is cancelled or hits the step budget.
#[derive(Debug, Clone, Default)]
pub struct AutoRunner {
    config: RunnerConfig,
    token: CancelToken,
}

impl AutoRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            token: CancelToken::new(),
        }
    }

    /// Returns a handle that cancels this runner.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs `machine`, calling `on_step` after every step with the outcome.
    ///
    /// Cancellation is checked before each step and again before each pause, so a
    /// cancelled run never loses a step that was already applied.
    pub fn run<F>(&self, machine: &mut TuringMachine, mut on_step: F) -> RunOutcome
    where
        F: FnMut(&TuringMachine, Step),
    {
        let delay = self.config.delay();
        let mut taken = 0usize;

        info!(state = machine.state(), ?delay, "auto-run started");

        loop {
            if self.token.is_cancelled() {
                info!(steps = taken, "auto-run cancelled");
                return RunOutcome::Cancelled;
            }

            if self.config.max_steps.is_some_and(|max| taken >= max) {
                info!(steps = taken, "auto-run step limit reached");
                return RunOutcome::StepLimit;
            }

            let step = machine.step();
            taken += 1;
            on_step(machine, step);

            if step.is_terminal() {
                debug!(%step, steps = taken, "auto-run finished");
                return RunOutcome::Finished(step);
            }

            if !delay.is_zero() && !self.token.is_cancelled() {
                thread::sleep(delay);
            }
        }
    }
}
