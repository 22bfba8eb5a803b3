//! This module defines the core data structures and types shared by the engine, the parser
//! and the catalog: symbols, head directions, step outcomes, verdicts and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A single tape cell value.
pub type Symbol = char;

/// A state identifier. States are open string identifiers (`q0`, `qa`, ...).
pub type State = String;

/// The distinguished symbol for an unwritten cell. Never part of an input alphabet.
pub const BLANK: Symbol = '_';

/// Represents the possible directions the head can move after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Returns the head offset applied by this direction.
    pub fn offset(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }

    /// Parses the short notation used in machine files.
    ///
    /// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-' or 'S' for Stay.
    pub fn from_notation(s: &str) -> Option<Self> {
        match s {
            "<" | "L" => Some(Direction::Left),
            ">" | "R" => Some(Direction::Right),
            "-" | "S" => Some(Direction::Stay),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::Stay => "S",
        };
        f.write_str(s)
    }
}

/// Represents the outcome of a single call to [`crate::TuringMachine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// The machine entered (or was already sitting in) an accept state.
    Accept,
    /// The machine entered a reject state, or no transition was defined.
    Reject,
    /// A transition was applied and the machine keeps going.
    Running,
    /// The run had already halted; nothing happened.
    Halt,
}

impl Step {
    /// Every outcome except `Running` ends an auto-run loop.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Step::Running)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Accept => "accept",
            Step::Reject => "reject",
            Step::Running => "running",
            Step::Halt => "halt",
        };
        f.write_str(s)
    }
}

/// The final result of a halted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("ACCEPTED"),
            Verdict::Rejected => f.write_str("REJECTED"),
        }
    }
}

/// Represents the errors that can occur while building, parsing or loading machines.
///
/// A missing transition during a run is deliberately absent here: it is a rejection,
/// reported through [`Step::Reject`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The definition violates a structural precondition.
    #[error("Invalid machine definition: {0}")]
    InvalidDefinition(String),
    /// Some states are listed as both accepting and rejecting.
    #[error("States are both accepting and rejecting: {0:?}")]
    OverlappingHaltStates(Vec<String>),
    /// The start state is empty or never mentioned by the definition.
    #[error("Undefined start state: '{0}'")]
    UndefinedStartState(String),
    /// Two actions were supplied for the same (state, symbol) pair.
    #[error("Duplicate transition for state {state} and symbol '{symbol}'")]
    DuplicateTransition { state: String, symbol: Symbol },
    /// Indicates an error during the parsing of a machine file.
    #[error("Machine parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a problem with a parsed file's sections.
    #[error("Machine validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to reading machine files.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(left_json, "\"Left\"");

        let stay: Direction = serde_json::from_str("\"Stay\"").unwrap();
        assert_eq!(stay, Direction::Stay);
    }

    #[test]
    fn test_direction_notation() {
        assert_eq!(Direction::from_notation("L"), Some(Direction::Left));
        assert_eq!(Direction::from_notation(">"), Some(Direction::Right));
        assert_eq!(Direction::from_notation("-"), Some(Direction::Stay));
        assert_eq!(Direction::from_notation("X"), None);
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Stay.offset(), 0);
    }

    #[test]
    fn test_step_is_terminal() {
        assert!(Step::Accept.is_terminal());
        assert!(Step::Reject.is_terminal());
        assert!(Step::Halt.is_terminal());
        assert!(!Step::Running.is_terminal());
        assert_eq!(serde_json::to_string(&Step::Running).unwrap(), "\"running\"");
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::OverlappingHaltStates(vec!["q9".to_string()]);
        let msg = format!("{}", error);
        assert!(msg.contains("both accepting and rejecting"));
        assert!(msg.contains("q9"));

        let error = MachineError::DuplicateTransition {
            state: "q0".to_string(),
            symbol: 'a',
        };
        assert_eq!(
            error.to_string(),
            "Duplicate transition for state q0 and symbol 'a'"
        );
    }
}
