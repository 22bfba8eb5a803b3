//! This module defines the `TuringMachine` struct, which runs a single-tape deterministic
//! machine one transition at a time. It owns the tape, head position, current state and
//! verdict of the active run; the definition it executes is shared and never mutated.

use crate::definition::MachineDefinition;
use crate::types::{Step, Symbol, Verdict, BLANK};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Executes a [`MachineDefinition`] over an input string.
///
/// The tape is materialized lazily: it only holds the cells visited so far, and BLANK is
/// implied beyond both ends. After a move the head may sit one cell outside the
/// materialized range; the next [`step`](Self::step) extends the tape before reading.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    definition: Arc<MachineDefinition>,
    tape: Vec<Symbol>,
    head: isize,
    state: String,
    halted: bool,
    result: Option<Verdict>,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a machine for the given definition, ready to run on the empty input.
    pub fn new(definition: impl Into<Arc<MachineDefinition>>) -> Self {
        let definition = definition.into();
        let state = definition.start().to_string();

        Self {
            definition,
            tape: vec![BLANK],
            head: 0,
            state,
            halted: false,
            result: None,
            step_count: 0,
        }
    }

    /// Creates a machine and loads `input` in one go.
    pub fn with_input(definition: impl Into<Arc<MachineDefinition>>, input: &str) -> Self {
        let mut machine = Self::new(definition);
        machine.reset(input);
        machine
    }

    /// Replaces the current run with a fresh one over `input`.
    ///
    /// An empty input yields a tape holding a single BLANK.
    pub fn reset(&mut self, input: &str) {
        self.tape = input.chars().collect();
        if self.tape.is_empty() {
            self.tape.push(BLANK);
        }
        self.head = 0;
        self.state = self.definition.start().to_string();
        self.halted = false;
        self.result = None;
        self.step_count = 0;

        info!(input, state = %self.state, "machine reset");
    }

    /// Advances the run by exactly one transition.
    ///
    /// # Returns
    ///
    /// * `Step::Halt` if the run had already halted. Nothing changes.
    /// * `Step::Accept` if the current or resulting state is accepting.
    /// * `Step::Reject` if the current or resulting state is rejecting, or if no transition
    ///   is defined for the current state and symbol.
    /// * `Step::Running` otherwise.
    ///
    /// Accept is always checked before reject.
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Halt;
        }

        if let Some(step) = self.check_halting_state() {
            return step;
        }

        self.normalize_head();
        let index = self.head as usize;
        let symbol = self.tape[index];

        let Some(action) = self.definition.lookup(&self.state, symbol) else {
            debug!(state = %self.state, symbol = %symbol, "no transition defined, rejecting");
            return self.halt(Verdict::Rejected);
        };

        debug!(
            step = self.step_count + 1,
            state = %self.state,
            read = %symbol,
            write = %action.write,
            direction = %action.direction,
            next = %action.next,
            "applying transition"
        );

        self.tape[index] = action.write;
        self.head += action.direction.offset();
        self.state.clone_from(&action.next);
        self.step_count += 1;

        self.check_halting_state().unwrap_or(Step::Running)
    }

    /// Halts the run if the current state is accepting or rejecting, accept first.
    fn check_halting_state(&mut self) -> Option<Step> {
        if self.definition.is_accepting(&self.state) {
            Some(self.halt(Verdict::Accepted))
        } else if self.definition.is_rejecting(&self.state) {
            Some(self.halt(Verdict::Rejected))
        } else {
            None
        }
    }

    fn halt(&mut self, verdict: Verdict) -> Step {
        self.halted = true;
        self.result = Some(verdict);
        debug!(state = %self.state, %verdict, steps = self.step_count, "machine halted");

        match verdict {
            Verdict::Accepted => Step::Accept,
            Verdict::Rejected => Step::Reject,
        }
    }

    /// Brings the head back over a materialized cell by growing the tape by one BLANK.
    ///
    /// Moving off the left end prepends, which shifts every existing cell right by one.
    fn normalize_head(&mut self) {
        if self.head < 0 {
            self.tape.insert(0, BLANK);
            self.head = 0;
            trace!(len = self.tape.len(), "tape extended to the left");
        } else if self.head as usize >= self.tape.len() {
            self.tape.push(BLANK);
            trace!(len = self.tape.len(), "tape extended to the right");
        }
    }

    /// Returns the definition this machine executes.
    pub fn definition(&self) -> &Arc<MachineDefinition> {
        &self.definition
    }

    /// Returns the materialized tape cells.
    pub fn tape(&self) -> &[Symbol] {
        &self.tape
    }

    /// Returns the tape as a string, BLANKs included.
    pub fn tape_string(&self) -> String {
        self.tape.iter().collect()
    }

    /// Returns the raw head index. It may be `-1` or `tape().len()` right after a move.
    pub fn head(&self) -> isize {
        self.head
    }

    /// Returns the symbol under the head, BLANK if the head sits outside the tape.
    pub fn current_symbol(&self) -> Symbol {
        usize::try_from(self.head)
            .ok()
            .and_then(|i| self.tape.get(i).copied())
            .unwrap_or(BLANK)
    }

    /// Returns the current state of the run.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns whether the run has reached an accept or reject outcome.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the verdict, or `None` while the run is undetermined.
    pub fn result(&self) -> Option<Verdict> {
        self.result
    }

    /// Returns the number of transitions applied since the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns a normalized copy of the tape for display, padded with `padding` BLANKs on
    /// each side. The run itself is left untouched.
    ///
    /// | _ | 0 | 1 | _ |    padding = 1, tape = "01", head = 2
    ///               ^      view.head = 3
    pub fn view(&self, padding: usize) -> TapeView {
        let (left, right) = if self.head < 0 {
            (padding + 1, padding)
        } else if self.head as usize >= self.tape.len() {
            (padding, padding + 1)
        } else {
            (padding, padding)
        };

        let mut cells = Vec::with_capacity(left + self.tape.len() + right);
        cells.extend(std::iter::repeat(BLANK).take(left));
        cells.extend_from_slice(&self.tape);
        cells.extend(std::iter::repeat(BLANK).take(right));

        let head = (self.head.max(-1) + left as isize) as usize;

        TapeView { cells, head }
    }

    /// Returns a serializable picture of the run.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tape: self.tape_string(),
            head: self.head,
            state: self.state.clone(),
            halted: self.halted,
            result: self.result,
            steps: self.step_count,
        }
    }
}

/// A read-only, display-ready copy of the tape with the head inside `cells`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeView {
    pub cells: Vec<Symbol>,
    pub head: usize,
}

/// A serializable record of a run's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tape: String,
    pub head: isize,
    pub state: String,
    pub halted: bool,
    pub result: Option<Verdict>,
    pub steps: usize,
}
