//! This module provides the parser for `.tm` machine files, utilizing the `pest` crate.
//! It turns the grammar's parse tree into a named, validated [`MachineDefinition`].

use crate::{
    definition::{Action, MachineDefinition, TransitionKey, TransitionTable},
    types::{Direction, MachineError, State, Symbol, BLANK},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Derives a `PestParser` for the machine grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct MachineParser;

/// A machine definition together with its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The name shown in listings, e.g. `0*1*`.
    pub name: String,
    /// The definition executed by the engine.
    pub definition: MachineDefinition,
}

/// Parses the given input string into a `Program`.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(MachineError::ParseError)` on syntax errors and duplicated rules.
/// * `Err(MachineError::ValidationError)` if a mandatory section is missing.
/// * Any construction error of [`MachineDefinition::new`].
pub fn parse(input: &str) -> Result<Program, MachineError> {
    let root = MachineParser::parse(Rule::program, input.trim())
        .map_err(|e| MachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| MachineError::ValidationError("Empty machine definition".to_string()))?;

    parse_program(root)
}

/// Parses the top-level sections of a program.
///
/// The start state defaults to the first state block when no `start:` header is given.
fn parse_program(pair: Pair<Rule>) -> Result<Program, MachineError> {
    let mut name: Option<String> = None;
    let mut start: Option<State> = None;
    let mut accept: Vec<State> = Vec::new();
    let mut reject: Vec<State> = Vec::new();
    let mut table: Option<TransitionTable> = None;
    let mut first_state: Option<State> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_text(p)),
            Rule::start => start = Some(parse_text(p)),
            Rule::accept => accept = parse_state_list(p),
            Rule::reject => reject = parse_state_list(p),
            Rule::rules => table = Some(parse_rules(p, &mut first_state)?),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, "name")?;
    let table = check_required_rule(table, "rules")?;
    let start = start.or(first_state).ok_or_else(|| {
        MachineError::ValidationError("No start state and no state blocks".to_string())
    })?;

    let definition = MachineDefinition::new(table, start, accept, reject)?;

    Ok(Program { name, definition })
}

/// Parses the `rules:` section, recording the first state block seen.
fn parse_rules(
    pair: Pair<Rule>,
    first_state: &mut Option<State>,
) -> Result<TransitionTable, MachineError> {
    let mut table = TransitionTable::new();
    let mut blocks = HashSet::new();

    for block in pair.into_inner() {
        let span = block.as_span();
        let mut pairs = block.into_inner();
        let state = parse_string(&mut pairs)?;

        if !blocks.insert(state.clone()) {
            return Err(parse_error(
                &format!("Duplicate state block: {state}"),
                span,
            ));
        }

        if first_state.is_none() {
            *first_state = Some(state.clone());
        }

        for action in pairs {
            let span = action.as_span();
            let (read, action) = parse_action(action)?;

            table
                .insert(TransitionKey::new(state.clone(), read), action)
                .map_err(|e| parse_error(&e.to_string(), span))?;
        }
    }

    Ok(table)
}

/// Parses `read -> write, direction, next` into the read symbol and its action.
fn parse_action(pair: Pair<Rule>) -> Result<(Symbol, Action), MachineError> {
    let mut pairs = pair.into_inner();

    let read = parse_symbol(&parse_string(&mut pairs)?);
    let write = parse_symbol(&parse_string(&mut pairs)?);
    let direction = parse_direction(next_pair(&mut pairs)?)?;
    let next = parse_string(&mut pairs)?;

    Ok((
        read,
        Action {
            write,
            direction,
            next,
        },
    ))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, MachineError> {
    Direction::from_notation(pair.as_str()).ok_or_else(|| {
        parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            pair.as_span(),
        )
    })
}

/// Parses a single character symbol, handling quoted, escaped and unquoted forms.
fn parse_symbol(input: &str) -> Symbol {
    let inner = input
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(input);

    match inner.strip_prefix('\\') {
        Some(escaped) if !escaped.is_empty() => escaped.chars().next().unwrap_or(BLANK),
        _ => inner.chars().next().unwrap_or(BLANK),
    }
}

/// Collects the state names of an `accept:` or `reject:` header.
fn parse_state_list(pair: Pair<Rule>) -> Vec<State> {
    pair.into_inner()
        .flat_map(|states| states.into_inner())
        .map(|state| state.as_str().to_string())
        .collect()
}

/// Extracts the trimmed inner text of a header such as `name:` or `start:`.
fn parse_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

fn next_pair<'a>(pairs: &mut Pairs<'a, Rule>) -> Result<Pair<'a, Rule>, MachineError> {
    pairs
        .next()
        .ok_or_else(|| MachineError::ValidationError("Unexpected end of rule".to_string()))
}

/// Extracts the string content of the next `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>) -> Result<String, MachineError> {
    next_pair(pairs).map(|p| p.as_str().to_string())
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks that a header section is declared at most once.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), MachineError> {
    if !matches!(
        rule,
        Rule::name | Rule::start | Rule::accept | Rule::reject | Rule::rules
    ) {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, MachineError> {
    value.ok_or_else(|| MachineError::ValidationError(format!("Missing '{name}' section")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ONE: &str = r#"
name: 0*1*
start: q0
accept: qa
reject: qr
rules:
  q0:
    0 -> 0, R, q0
    1 -> 1, R, q1
    _ -> _, S, qa
  q1:
    1 -> 1, R, q1
    _ -> _, S, qa
    0 -> 0, S, qr
"#;

    #[test]
    fn test_parse_simple_program() {
        let program = parse(ZERO_ONE).unwrap();

        assert_eq!(program.name, "0*1*");
        let definition = &program.definition;
        assert_eq!(definition.start(), "q0");
        assert!(definition.is_accepting("qa"));
        assert!(definition.is_rejecting("qr"));
        assert_eq!(definition.transitions().len(), 6);

        let action = definition.lookup("q1", '0').unwrap();
        assert_eq!(action.write, '0');
        assert_eq!(action.direction, Direction::Stay);
        assert_eq!(action.next, "qr");
    }

    #[test]
    fn test_start_defaults_to_first_block() {
        let input = r#"
name: Default start
accept: done
rules:
  begin:
    a -> b, >, done
"#;
        let program = parse(input).unwrap();
        assert_eq!(program.definition.start(), "begin");
        assert!(program.definition.reject_states().is_empty());
    }

    #[test]
    fn test_parse_comments_and_quoted_symbols() {
        let input = r#"
# Replaces spaces with dashes.
name: Dashes   # trailing comment
accept: qa
rules:
  q0:
    ' ' -> '-', R, q0   # space becomes dash
    a -> a, R, q0

    _ -> _, -, qa
"#;
        let program = parse(input).unwrap();
        assert_eq!(program.name, "Dashes");

        let action = program.definition.lookup("q0", ' ').unwrap();
        assert_eq!(action.write, '-');
        assert_eq!(action.direction, Direction::Right);
        assert_eq!(
            program.definition.lookup("q0", BLANK).unwrap().direction,
            Direction::Stay
        );
    }

    #[test]
    fn test_multiple_halting_states() {
        let input = r#"
name: Many
accept: qa, qb
reject: qr1, qr2
rules:
  q0:
    a -> a, R, qa
    b -> b, R, qb
    c -> c, L, qr1
    d -> d, L, qr2
"#;
        let program = parse(input).unwrap();
        assert_eq!(program.definition.accept_states().len(), 2);
        assert_eq!(program.definition.reject_states().len(), 2);
    }

    #[test]
    fn test_missing_name() {
        let input = "accept: qa\nrules:\n  q0:\n    a -> a, R, qa";
        assert_eq!(
            parse(input),
            Err(MachineError::ValidationError(
                "Missing 'name' section".to_string()
            ))
        );
    }

    #[test]
    fn test_duplicate_header() {
        let input = "name: A\nname: B\nrules:\n  q0:\n    a -> a, R, q0";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, MachineError::ParseError(_)));
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_duplicate_transition() {
        let input = r#"
name: Dup
rules:
  q0:
    a -> a, R, q0
    a -> b, L, q0
"#;
        let err = parse(input).unwrap_err();
        assert!(matches!(err, MachineError::ParseError(_)));
        assert!(err.to_string().contains("Duplicate transition"));
    }

    #[test]
    fn test_duplicate_state_block() {
        let input = r#"
name: Dup
rules:
  q0:
    a -> a, R, q0
  q0:
    b -> b, R, q0
"#;
        let err = parse(input).unwrap_err();
        assert!(err.to_string().contains("Duplicate state block"));
    }

    #[test]
    fn test_overlapping_halt_states_rejected() {
        let input = r#"
name: Broken
accept: qx
reject: qx
rules:
  q0:
    a -> a, R, qx
"#;
        assert_eq!(
            parse(input),
            Err(MachineError::OverlappingHaltStates(vec!["qx".to_string()]))
        );
    }

    #[test]
    fn test_undefined_start_state_rejected() {
        let input = "name: X\nstart: nowhere\nrules:\n  q0:\n    a -> a, R, q0";
        assert_eq!(
            parse(input),
            Err(MachineError::UndefinedStartState("nowhere".to_string()))
        );
    }

    #[test]
    fn test_syntax_error() {
        let input = "name: X\nrules:\n  q0:\n    a => a, R, q0";
        assert!(matches!(parse(input), Err(MachineError::ParseError(_))));
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(parse_symbol("a"), 'a');
        assert_eq!(parse_symbol("' '"), ' ');
        assert_eq!(parse_symbol("'_'"), '_');
        assert_eq!(parse_symbol(r"'\''"), '\'');
        assert_eq!(parse_symbol(r"'\\'"), '\\');
        assert_eq!(parse_symbol(r"\"), '\\');
        assert_eq!(parse_symbol(""), BLANK);
    }

    #[test]
    fn test_parse_escaped_quote_symbols() {
        let input = r#"
name: Quotes
accept: qa
rules:
  q0:
    '\'' -> '\\', R, q0
    \ -> '\'', R, q0
    _ -> _, S, qa
"#;
        let program = parse(input).unwrap();

        let action = program.definition.lookup("q0", '\'').unwrap();
        assert_eq!(action.write, '\\');
        assert_eq!(program.definition.lookup("q0", '\\').unwrap().write, '\'');
    }
}
