//! Immutable machine definitions: the transition table plus the start, accept and reject
//! states. A definition is validated once on construction and never mutated afterwards, so
//! it can be shared read-only (behind an `Arc`) by any number of runs.

use crate::analyzer;
use crate::types::{Direction, MachineError, State, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The lookup key of the transition function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub state: State,
    pub symbol: Symbol,
}

impl TransitionKey {
    pub fn new(state: impl Into<State>, symbol: Symbol) -> Self {
        Self {
            state: state.into(),
            symbol,
        }
    }
}

/// What the machine does once a key matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Symbol written under the head.
    pub write: Symbol,
    /// Head movement applied after writing.
    pub direction: Direction,
    /// State entered after moving.
    pub next: State,
}

/// Flat form of one table entry, used for serialization and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub state: State,
    pub read: Symbol,
    pub write: Symbol,
    pub direction: Direction,
    pub next: State,
}

/// Deterministic transition function: at most one action per (state, symbol).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TransitionRule>", into = "Vec<TransitionRule>")]
pub struct TransitionTable {
    entries: HashMap<TransitionKey, Action>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule, refusing to overwrite an existing (state, symbol) entry.
    pub fn insert(&mut self, key: TransitionKey, action: Action) -> Result<(), MachineError> {
        if self.entries.contains_key(&key) {
            return Err(MachineError::DuplicateTransition {
                state: key.state,
                symbol: key.symbol,
            });
        }

        self.entries.insert(key, action);
        Ok(())
    }

    pub fn get(&self, state: &str, symbol: Symbol) -> Option<&Action> {
        self.entries.get(&TransitionKey::new(state, symbol))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransitionKey, &Action)> {
        self.entries.iter()
    }

    /// Returns every entry as a flat rule, sorted by state then read symbol.
    pub fn rules(&self) -> Vec<TransitionRule> {
        let mut rules: Vec<TransitionRule> = self
            .entries
            .iter()
            .map(|(key, action)| TransitionRule {
                state: key.state.clone(),
                read: key.symbol,
                write: action.write,
                direction: action.direction,
                next: action.next.clone(),
            })
            .collect();
        rules.sort_by(|a, b| (&a.state, a.read).cmp(&(&b.state, b.read)));
        rules
    }

    /// States that appear on the left-hand side of at least one rule.
    pub fn source_states(&self) -> BTreeSet<&str> {
        self.entries.keys().map(|k| k.state.as_str()).collect()
    }

    /// States that appear as the target of at least one rule.
    pub fn target_states(&self) -> BTreeSet<&str> {
        self.entries.values().map(|a| a.next.as_str()).collect()
    }
}

impl TryFrom<Vec<TransitionRule>> for TransitionTable {
    type Error = MachineError;

    /// Fails on the first repeated (state, symbol) pair.
    fn try_from(rules: Vec<TransitionRule>) -> Result<Self, Self::Error> {
        let mut table = TransitionTable::new();
        for rule in rules {
            table.insert(
                TransitionKey::new(rule.state, rule.read),
                Action {
                    write: rule.write,
                    direction: rule.direction,
                    next: rule.next,
                },
            )?;
        }

        Ok(table)
    }
}

impl From<TransitionTable> for Vec<TransitionRule> {
    fn from(table: TransitionTable) -> Self {
        table.rules()
    }
}

/// An immutable, validated machine definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDefinition")]
pub struct MachineDefinition {
    transitions: TransitionTable,
    start: State,
    accept: BTreeSet<State>,
    reject: BTreeSet<State>,
}

impl MachineDefinition {
    /// Creates a definition from its four parts and validates it.
    ///
    /// # Errors
    ///
    /// * `MachineError::OverlappingHaltStates` if a state is both accepting and rejecting.
    /// * `MachineError::UndefinedStartState` if the start state is empty or unknown.
    pub fn new<A, R>(
        transitions: TransitionTable,
        start: impl Into<State>,
        accept: A,
        reject: R,
    ) -> Result<Self, MachineError>
    where
        A: IntoIterator,
        A::Item: Into<State>,
        R: IntoIterator,
        R::Item: Into<State>,
    {
        let definition = Self {
            transitions,
            start: start.into(),
            accept: accept.into_iter().map(Into::into).collect(),
            reject: reject.into_iter().map(Into::into).collect(),
        };

        analyzer::validate(&definition)?;

        Ok(definition)
    }

    /// Starts a builder with the given start state.
    pub fn builder(start: impl Into<State>) -> DefinitionBuilder {
        DefinitionBuilder::new(start)
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept_states(&self) -> &BTreeSet<State> {
        &self.accept
    }

    pub fn reject_states(&self) -> &BTreeSet<State> {
        &self.reject
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept.contains(state)
    }

    pub fn is_rejecting(&self, state: &str) -> bool {
        self.reject.contains(state)
    }

    pub fn lookup(&self, state: &str, symbol: Symbol) -> Option<&Action> {
        self.transitions.get(state, symbol)
    }

    /// Every state mentioned anywhere in the definition, sorted.
    pub fn states(&self) -> BTreeSet<&str> {
        let mut states = self.transitions.source_states();
        states.extend(self.transitions.target_states());
        states.extend(self.accept.iter().map(String::as_str));
        states.extend(self.reject.iter().map(String::as_str));
        states.insert(self.start.as_str());
        states
    }
}

/// Unvalidated wire form; deserialization goes through [`MachineDefinition::new`].
#[derive(Deserialize)]
struct RawDefinition {
    transitions: TransitionTable,
    start: State,
    accept: BTreeSet<State>,
    reject: BTreeSet<State>,
}

impl TryFrom<RawDefinition> for MachineDefinition {
    type Error = MachineError;

    fn try_from(raw: RawDefinition) -> Result<Self, Self::Error> {
        MachineDefinition::new(raw.transitions, raw.start, raw.accept, raw.reject)
    }
}

/// Incremental construction of a [`MachineDefinition`].
///
/// ```
/// use tmsim::{Direction, MachineDefinition, BLANK};
///
/// let definition = MachineDefinition::builder("q0")
///     .rule("q0", 'a', 'a', Direction::Right, "q0")
///     .rule("q0", BLANK, BLANK, Direction::Stay, "qa")
///     .accept("qa")
///     .build()
///     .unwrap();
///
/// assert_eq!(definition.transitions().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    start: State,
    rules: Vec<TransitionRule>,
    accept: Vec<State>,
    reject: Vec<State>,
}

impl DefinitionBuilder {
    pub fn new(start: impl Into<State>) -> Self {
        Self {
            start: start.into(),
            rules: Vec::new(),
            accept: Vec::new(),
            reject: Vec::new(),
        }
    }

    pub fn rule(
        mut self,
        state: impl Into<State>,
        read: Symbol,
        write: Symbol,
        direction: Direction,
        next: impl Into<State>,
    ) -> Self {
        self.rules.push(TransitionRule {
            state: state.into(),
            read,
            write,
            direction,
            next: next.into(),
        });
        self
    }

    pub fn accept(mut self, state: impl Into<State>) -> Self {
        self.accept.push(state.into());
        self
    }

    pub fn reject(mut self, state: impl Into<State>) -> Self {
        self.reject.push(state.into());
        self
    }

    /// Builds the definition, failing on duplicate keys or invalid halting states.
    pub fn build(self) -> Result<MachineDefinition, MachineError> {
        let table = TransitionTable::try_from(self.rules)?;

        MachineDefinition::new(table, self.start, self.accept, self.reject)
    }
}
