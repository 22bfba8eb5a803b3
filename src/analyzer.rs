//! This module provides functions for analyzing machine definitions before execution.
//!
//! [`validate`] enforces the preconditions every definition must satisfy and is run on
//! construction. [`lint`] reports suspicious but legal shapes, such as states that can never
//! be reached or rules that can never fire.

use crate::definition::MachineDefinition;
use crate::types::MachineError;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Represents a legal but suspicious property of a definition.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum Lint {
    /// States that are mentioned but cannot be reached from the start state.
    #[error("Unreachable states: {0:?}")]
    UnreachableStates(Vec<String>),
    /// Ordinary states entered by some rule but with no outgoing rules, so every run
    /// reaching them is rejected by omission.
    #[error("States without outgoing transitions always reject: {0:?}")]
    DeadEndStates(Vec<String>),
    /// Rules declared from accept or reject states; a run halts before reading them.
    #[error("Transitions from halting states never fire: {0:?}")]
    UnusedHaltingRules(Vec<String>),
}

/// Checks the hard preconditions of a definition.
///
/// # Returns
///
/// * `Ok(())` if the definition is usable.
/// * `Err(MachineError)` with the first violation found.
pub fn validate(definition: &MachineDefinition) -> Result<(), MachineError> {
    [check_halt_states_disjoint, check_start_state, check_state_names]
        .iter()
        .find_map(|f| f(definition).err())
        .map_or(Ok(()), Err)
}

/// Collects every lint that applies to the definition, in a stable order.
pub fn lint(definition: &MachineDefinition) -> Vec<Lint> {
    [
        check_unreachable_states,
        check_dead_end_states,
        check_unused_halting_rules,
    ]
    .iter()
    .filter_map(|f| f(definition))
    .collect()
}

/// Accept and reject sets must not share a state.
fn check_halt_states_disjoint(definition: &MachineDefinition) -> Result<(), MachineError> {
    let overlap: Vec<String> = definition
        .accept_states()
        .intersection(definition.reject_states())
        .cloned()
        .collect();

    if !overlap.is_empty() {
        return Err(MachineError::OverlappingHaltStates(overlap));
    }

    Ok(())
}

/// The start state must be named and must either have outgoing rules or be a halting state.
fn check_start_state(definition: &MachineDefinition) -> Result<(), MachineError> {
    let start = definition.start();

    let defined = !start.trim().is_empty()
        && (definition.transitions().source_states().contains(start)
            || definition.is_accepting(start)
            || definition.is_rejecting(start));

    if !defined {
        return Err(MachineError::UndefinedStartState(start.to_string()));
    }

    Ok(())
}

/// State names must be non-empty and free of whitespace.
fn check_state_names(definition: &MachineDefinition) -> Result<(), MachineError> {
    match definition
        .states()
        .into_iter()
        .find(|state| state.is_empty() || state.chars().any(char::is_whitespace))
    {
        Some(state) => Err(MachineError::InvalidDefinition(format!(
            "Malformed state name: '{state}'"
        ))),
        None => Ok(()),
    }
}

/// Walks the rules from the start state and reports states never visited.
fn check_unreachable_states(definition: &MachineDefinition) -> Option<Lint> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.start()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        // Halting states stop the run before any of their rules are read.
        if definition.is_accepting(state) || definition.is_rejecting(state) {
            continue;
        }

        for (key, action) in definition.transitions().iter() {
            if key.state == state && !visited.contains(action.next.as_str()) {
                queue.push(action.next.as_str());
            }
        }
    }

    let unreachable: Vec<String> = definition
        .states()
        .into_iter()
        .filter(|state| !visited.contains(state))
        .map(str::to_string)
        .collect();

    (!unreachable.is_empty()).then_some(Lint::UnreachableStates(unreachable))
}

fn check_dead_end_states(definition: &MachineDefinition) -> Option<Lint> {
    let sources = definition.transitions().source_states();

    let dead_ends: Vec<String> = definition
        .transitions()
        .target_states()
        .into_iter()
        .filter(|state| {
            !sources.contains(state)
                && !definition.is_accepting(state)
                && !definition.is_rejecting(state)
        })
        .map(str::to_string)
        .collect();

    (!dead_ends.is_empty()).then_some(Lint::DeadEndStates(dead_ends))
}

fn check_unused_halting_rules(definition: &MachineDefinition) -> Option<Lint> {
    let halting: BTreeSet<&str> = definition
        .transitions()
        .source_states()
        .into_iter()
        .filter(|state| definition.is_accepting(state) || definition.is_rejecting(state))
        .collect();

    (!halting.is_empty()).then(|| {
        Lint::UnusedHaltingRules(halting.into_iter().map(str::to_string).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TransitionTable;
    use crate::types::{Direction, BLANK};

    #[test]
    fn test_valid_definition_has_no_lints() {
        let definition = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "q0")
            .rule("q0", BLANK, BLANK, Direction::Stay, "qa")
            .rule("q0", 'b', 'b', Direction::Stay, "qr")
            .accept("qa")
            .reject("qr")
            .build()
            .unwrap();

        assert!(lint(&definition).is_empty());
    }

    #[test]
    fn test_overlapping_halt_states() {
        let result = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "q1")
            .accept("q1")
            .accept("q2")
            .reject("q2")
            .reject("q1")
            .build();

        assert_eq!(
            result,
            Err(MachineError::OverlappingHaltStates(vec![
                "q1".to_string(),
                "q2".to_string()
            ]))
        );
    }

    #[test]
    fn test_undefined_start_state() {
        let result = MachineDefinition::builder("missing")
            .rule("q0", 'a', 'a', Direction::Right, "q0")
            .build();
        assert_eq!(
            result,
            Err(MachineError::UndefinedStartState("missing".to_string()))
        );

        let result = MachineDefinition::new(TransitionTable::new(), "", ["qa"], ["qr"]);
        assert_eq!(result, Err(MachineError::UndefinedStartState(String::new())));
    }

    #[test]
    fn test_malformed_state_names() {
        let result = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "")
            .build();
        assert!(matches!(result, Err(MachineError::InvalidDefinition(_))));

        let result = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "q0")
            .accept("q a")
            .build();
        assert_eq!(
            result,
            Err(MachineError::InvalidDefinition(
                "Malformed state name: 'q a'".to_string()
            ))
        );
    }

    #[test]
    fn test_start_state_may_be_halting() {
        let definition = MachineDefinition::new(
            TransitionTable::new(),
            "qa",
            ["qa"],
            Vec::<String>::new(),
        );
        assert!(definition.is_ok());
    }

    #[test]
    fn test_unreachable_states() {
        let definition = MachineDefinition::builder("q0")
            .rule("q0", BLANK, BLANK, Direction::Stay, "qa")
            .rule("island", 'x', 'x', Direction::Right, "island")
            .accept("qa")
            .reject("qr")
            .build()
            .unwrap();

        assert_eq!(
            lint(&definition),
            vec![Lint::UnreachableStates(vec![
                "island".to_string(),
                "qr".to_string()
            ])]
        );
    }

    #[test]
    fn test_dead_end_states() {
        let definition = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "q1")
            .build()
            .unwrap();

        assert_eq!(
            lint(&definition),
            vec![Lint::DeadEndStates(vec!["q1".to_string()])]
        );
    }

    #[test]
    fn test_unused_halting_rules() {
        let definition = MachineDefinition::builder("q0")
            .rule("q0", 'a', 'a', Direction::Right, "qa")
            .rule("qa", 'b', 'b', Direction::Right, "q0")
            .accept("qa")
            .build()
            .unwrap();

        assert_eq!(
            lint(&definition),
            vec![Lint::UnusedHaltingRules(vec!["qa".to_string()])]
        );
    }

    #[test]
    fn test_lint_display() {
        let lint = Lint::DeadEndStates(vec!["q7".to_string()]);
        assert!(lint.to_string().contains("q7"));
    }
}
