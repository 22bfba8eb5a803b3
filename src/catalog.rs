//! The bundled machine catalog.
//!
//! Definitions ship as `.tm` text embedded in the binary and are parsed once, on first
//! access. The catalog only supplies definitions; the engine runs any valid definition,
//! bundled or not.

use crate::parser::{parse, Program};
use crate::types::MachineError;
use lazy_static::lazy_static;
use tracing::error;

// Embedded catalog sources, in listing order.
const PROGRAM_TEXTS: [&str; 3] = [
    include_str!("../machines/zero-one.tm"),
    include_str!("../machines/ab-star.tm"),
    include_str!("../machines/an-bn.tm"),
];

lazy_static! {
    static ref PROGRAMS: Vec<(&'static str, Program)> = PROGRAM_TEXTS
        .iter()
        .filter_map(|text| match parse(text) {
            Ok(program) => Some((*text, program)),
            Err(e) => {
                error!("Failed to parse embedded machine: {e}");
                None
            }
        })
        .collect();
}

/// Summary of a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub start: String,
    pub state_count: usize,
    pub transition_count: usize,
}

pub struct Catalog;

impl Catalog {
    /// Returns every catalog program in listing order.
    pub fn programs() -> Vec<Program> {
        PROGRAMS.iter().map(|(_, p)| p.clone()).collect()
    }

    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_by_index(index: usize) -> Result<Program, MachineError> {
        PROGRAMS
            .get(index)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| {
                MachineError::ValidationError(format!("Machine index {} out of range", index))
            })
    }

    /// Get a program by its exact name
    pub fn get_by_name(name: &str) -> Result<Program, MachineError> {
        PROGRAMS
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| MachineError::ValidationError(format!("Machine '{}' not found", name)))
    }

    /// List all program names
    pub fn names() -> Vec<String> {
        PROGRAMS.iter().map(|(_, p)| p.name.clone()).collect()
    }

    pub fn info(index: usize) -> Result<ProgramInfo, MachineError> {
        let program = Self::get_by_index(index)?;
        let definition = &program.definition;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            start: definition.start().to_string(),
            state_count: definition.states().len(),
            transition_count: definition.transitions().len(),
        })
    }

    /// Returns the indices of programs whose name contains `query`, ignoring case.
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original `.tm` source of a program by its index
    pub fn text_by_index(index: usize) -> Result<&'static str, MachineError> {
        PROGRAMS.get(index).map(|(text, _)| *text).ok_or_else(|| {
            MachineError::ValidationError(format!("Machine text index {} out of range", index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::lint;
    use crate::machine::TuringMachine;
    use crate::types::{Step, Verdict};

    fn verdict(name: &str, input: &str) -> Verdict {
        let program = Catalog::get_by_name(name).unwrap();
        let mut machine = TuringMachine::with_input(program.definition, input);

        for _ in 0..10_000 {
            if machine.step().is_terminal() {
                break;
            }
        }

        machine.result().expect("catalog machines halt on short inputs")
    }

    #[test]
    fn test_all_embedded_programs_parse() {
        assert_eq!(Catalog::count(), PROGRAM_TEXTS.len());
    }

    #[test]
    fn test_embedded_programs_are_lint_free() {
        for program in Catalog::programs() {
            assert!(
                lint(&program.definition).is_empty(),
                "Machine '{}' has lints",
                program.name
            );
        }
    }

    #[test]
    fn test_program_names() {
        assert_eq!(Catalog::names(), vec!["0*1*", "(ab)*", "a^n b^n"]);
    }

    #[test]
    fn test_get_by_index_and_name() {
        assert_eq!(Catalog::get_by_index(0).unwrap().name, "0*1*");
        assert!(Catalog::get_by_index(999).is_err());
        assert!(Catalog::get_by_name("(ab)*").is_ok());
        assert!(Catalog::get_by_name("Nonexistent").is_err());
    }

    #[test]
    fn test_info() {
        let info = Catalog::info(0).unwrap();
        assert_eq!(info.name, "0*1*");
        assert_eq!(info.start, "q0");
        assert_eq!(info.state_count, 4);
        assert_eq!(info.transition_count, 6);
        assert!(Catalog::info(999).is_err());
    }

    #[test]
    fn test_search() {
        assert_eq!(Catalog::search("AB"), vec![1]);
        assert_eq!(Catalog::search("^n"), vec![2]);
        assert!(Catalog::search("nonexistent").is_empty());
    }

    #[test]
    fn test_text_by_index() {
        assert!(Catalog::text_by_index(1).unwrap().contains("name: (ab)*"));
        assert!(Catalog::text_by_index(5).is_err());
    }

    #[test]
    fn test_zero_one_language() {
        for input in ["", "0", "1", "0011", "000", "111"] {
            assert_eq!(verdict("0*1*", input), Verdict::Accepted, "input {input:?}");
        }
        for input in ["10", "0101", "0a"] {
            assert_eq!(verdict("0*1*", input), Verdict::Rejected, "input {input:?}");
        }
    }

    #[test]
    fn test_ab_star_language() {
        for input in ["", "ab", "abab"] {
            assert_eq!(verdict("(ab)*", input), Verdict::Accepted, "input {input:?}");
        }
        for input in ["a", "b", "aba", "abb", "ba"] {
            assert_eq!(verdict("(ab)*", input), Verdict::Rejected, "input {input:?}");
        }
    }

    #[test]
    fn test_an_bn_language() {
        for input in ["", "ab", "aabb", "aaabbb"] {
            assert_eq!(verdict("a^n b^n", input), Verdict::Accepted, "input {input:?}");
        }
        for input in ["a", "b", "aab", "abb", "ba", "abab"] {
            assert_eq!(verdict("a^n b^n", input), Verdict::Rejected, "input {input:?}");
        }
    }

    #[test]
    fn test_an_bn_marks_tape() {
        let program = Catalog::get_by_name("a^n b^n").unwrap();
        let mut machine = TuringMachine::with_input(program.definition, "aabb");

        while !machine.step().is_terminal() {}

        assert_eq!(machine.step(), Step::Halt);
        assert_eq!(machine.tape_string(), "XXYY_");
    }
}
