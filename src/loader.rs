//! This module provides the `ProgramLoader` struct, responsible for reading machine
//! definitions from files, directories and strings.

use crate::analyzer::lint;
use crate::parser::{parse, Program};
use crate::types::MachineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension of machine definition files.
pub const MACHINE_FILE_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading machine programs.
/// Every successfully parsed program is linted and the findings are logged as warnings.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read.
    /// * `Err(MachineError::ParseError)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "loading machine file");
        Self::load_program_from_string(&content)
    }

    /// Loads a single program from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<Program, MachineError> {
        let program = parse(content)?;
        report_lints(&program);
        Ok(program)
    }

    /// Loads every `.tm` file in a directory. Subdirectories and other files are skipped.
    ///
    /// Each element of the result is either the path and its program, or the error that
    /// prevented loading it.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| ext != MACHINE_FILE_EXTENSION)
                {
                    return None;
                }

                match Self::load_program(&path) {
                    Ok(program) => Some(Ok((path, program))),
                    Err(e) => Some(Err(MachineError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by(|a, b| match (a, b) {
            (Ok((pa, _)), Ok((pb, _))) => pa.cmp(pb),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}

fn report_lints(program: &Program) {
    for finding in lint(&program.definition) {
        warn!(machine = %program.name, "{finding}");
    }
}
