//! This crate provides a deterministic single-tape Turing machine engine meant for
//! step-by-step visualization. It includes the engine itself, immutable machine definitions
//! with their validation, a parser and loader for `.tm` files, a bundled machine catalog,
//! a cooperative auto-run driver, and whole-string pattern checks backed by `regex`.

pub mod analyzer;
pub mod catalog;
pub mod definition;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod patterns;
pub mod runner;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and lint findings.
pub use analyzer::{lint, validate, Lint};
/// Re-exports the bundled catalog.
pub use catalog::{Catalog, ProgramInfo};
/// Re-exports definition types and their builder.
pub use definition::{
    Action, DefinitionBuilder, MachineDefinition, TransitionKey, TransitionRule, TransitionTable,
};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the engine and its read-only views.
pub use machine::{Snapshot, TapeView, TuringMachine};
/// Re-exports the `parse` function and the named `Program` it produces.
pub use parser::{parse, Program};
/// Re-exports the pattern checks.
pub use patterns::{full_match, PatternError, PatternInfo, PREDEFINED_PATTERNS};
/// Re-exports the auto-run driver.
pub use runner::{AutoRunner, CancelToken, RunOutcome, RunnerConfig};
/// Re-exports the shared vocabulary types.
pub use types::{Direction, MachineError, State, Step, Symbol, Verdict, BLANK};
