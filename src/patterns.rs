//! Whole-string pattern checks, delegated to the `regex` crate.
//!
//! This is independent of the machine engine and shares no state with it. Patterns are
//! anchored on both ends, so a check succeeds only when the entire input matches.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("Invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A bundled pattern and what it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternInfo {
    pub pattern: &'static str,
    pub description: &'static str,
}

/// The bundled patterns, in listing order.
pub const PREDEFINED_PATTERNS: [PatternInfo; 10] = [
    PatternInfo {
        pattern: "(a|b)*abb",
        description: "Over {a,b}: any string ending in \"abb\"",
    },
    PatternInfo {
        pattern: "0*1*",
        description: "Zero or more 0s followed by zero or more 1s (empty included)",
    },
    PatternInfo {
        pattern: "(ab)*",
        description: "\"ab\" repeated (empty included)",
    },
    PatternInfo {
        pattern: "1(01)*0",
        description: "Starts with 1, zero or more repetitions of 01, ends with 0",
    },
    PatternInfo {
        pattern: "(a|b)*a(a|b)*",
        description: "Over {a,b}: contains at least one \"a\"",
    },
    PatternInfo {
        pattern: "a*b*a*",
        description: "A block of a's, then b's, then a's (each block may be empty)",
    },
    PatternInfo {
        pattern: "(0|1)+00(0|1)*",
        description: "Binary strings containing \"00\" after at least one leading digit",
    },
    PatternInfo {
        pattern: "(aa|bb)*",
        description: "Pairs of equal symbols (aa or bb) repeated",
    },
    PatternInfo {
        pattern: "(a|b){3,}",
        description: "Length at least 3 over {a,b}",
    },
    PatternInfo {
        pattern: "aa|bb",
        description: "A single pair of equal symbols (aa or bb)",
    },
];

lazy_static! {
    static ref COMPILED: HashMap<&'static str, Regex> = PREDEFINED_PATTERNS
        .iter()
        .filter_map(|info| compile(info.pattern).ok().map(|re| (info.pattern, re)))
        .collect();
}

/// Compiles `pattern` anchored at both ends.
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| PatternError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Returns whether the whole of `input` matches `pattern`.
pub fn full_match(pattern: &str, input: &str) -> Result<bool, PatternError> {
    let matched = match COMPILED.get(pattern) {
        Some(re) => re.is_match(input),
        None => compile(pattern)?.is_match(input),
    };

    debug!(pattern, input, matched, "pattern check");
    Ok(matched)
}

/// Returns the description of a bundled pattern.
pub fn describe(pattern: &str) -> Option<&'static str> {
    PREDEFINED_PATTERNS
        .iter()
        .find(|info| info.pattern == pattern)
        .map(|info| info.description)
}
