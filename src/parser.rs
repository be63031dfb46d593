//! This module provides the parser for `.tm` machine definitions, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to parse the input into a `Definition`.

use crate::{
    analyzer::analyze,
    types::{Definition, Direction, Transition, TuringMachineError, DEFAULT_BLANK_SYMBOL},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeMap, BTreeSet, HashSet};

type Rules = BTreeMap<String, Vec<Transition>>;

/// Derives a `PestParser` for the definition grammar in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// Parses the given input string into a `Definition`.
///
/// This is the main entry point for parsing `.tm` definitions. Sections that are left out
/// are derived from the rules (see `parse_definition`). The parsed definition is analyzed
/// before being returned.
///
/// # Returns
///
/// * `Ok(Definition)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::ValidationError)` if the definition fails validation.
pub fn parse(input: &str) -> Result<Definition, TuringMachineError> {
    let root = DefinitionParser::parse(Rule::program, input.trim())
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty definition".to_string()))?;

    let definition = parse_definition(root)?;

    analyze(&definition)?;

    Ok(definition)
}

/// Builds a `Definition` from a `Pair<Rule::program>`.
///
/// `name`, `rules` and `accept` are required. The rest default as follows: `blank` to
/// `DEFAULT_BLANK_SYMBOL`, `initial` to the first rule block, `states` to every state
/// mentioned anywhere, `tape` to every symbol mentioned plus blank and input, and `input` to
/// the tape alphabet without blank.
fn parse_definition(pair: Pair<Rule>) -> Result<Definition, TuringMachineError> {
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut blank: Option<char> = None;
    let mut states: Option<BTreeSet<String>> = None;
    let mut input_alphabet: Option<BTreeSet<char>> = None;
    let mut tape_alphabet: Option<BTreeSet<char>> = None;
    let mut initial_state: Option<String> = None;
    let mut accepting_states: Option<BTreeSet<String>> = None;
    let mut rules: Option<Rules> = None;
    let mut first_state: Option<String> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_text(p)),
            Rule::description => description = Some(parse_text(p)),
            Rule::blank => blank = p.into_inner().next().map(|s| parse_symbol(s.as_str())),
            Rule::states => states = Some(parse_states(p)),
            Rule::input_alphabet => input_alphabet = Some(parse_symbols(p)),
            Rule::tape_alphabet => tape_alphabet = Some(parse_symbols(p)),
            Rule::initial => initial_state = p.into_inner().next().map(|s| s.as_str().into()),
            Rule::accept => accepting_states = Some(parse_states(p)),
            Rule::rules => rules = Some(parse_rules(p, &mut first_state)?),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, Rule::name)?;
    let rules = check_required_rule(rules, Rule::rules)?;
    let accepting_states = check_required_rule(accepting_states, Rule::accept)?;
    let initial_state = check_required_rule(initial_state.or(first_state), Rule::initial)?;
    let blank = blank.unwrap_or(DEFAULT_BLANK_SYMBOL);

    let states = states.unwrap_or_else(|| {
        let mut states: BTreeSet<String> = rules.keys().cloned().collect();
        states.extend(rules.values().flatten().map(|t| t.next_state.clone()));
        states.insert(initial_state.clone());
        states.extend(accepting_states.iter().cloned());
        states
    });

    let tape_alphabet = tape_alphabet.unwrap_or_else(|| {
        let mut symbols: BTreeSet<char> = rules
            .values()
            .flatten()
            .flat_map(|t| [t.read, t.write])
            .collect();
        symbols.insert(blank);
        symbols.extend(input_alphabet.iter().flatten().copied());
        symbols
    });

    let input_alphabet = input_alphabet.unwrap_or_else(|| {
        tape_alphabet
            .iter()
            .filter(|&&symbol| symbol != blank)
            .copied()
            .collect()
    });

    Ok(Definition {
        name,
        description: description.unwrap_or_default(),
        states,
        input_alphabet,
        tape_alphabet,
        rules,
        initial_state,
        blank,
        accepting_states,
    })
}

/// Parses the rules section from a `Pair<Rule::rules>`.
///
/// Records the first rule block's state in `first_state` and rejects a second block for a
/// state that already has one.
fn parse_rules(
    pair: Pair<Rule>,
    first_state: &mut Option<String>,
) -> Result<Rules, TuringMachineError> {
    let mut rules = Rules::new();

    for block in pair.into_inner() {
        let span = block.as_span();
        let mut inner = block.into_inner();
        let state: String = match inner.next() {
            Some(state) => state.as_str().into(),
            None => continue,
        };

        if first_state.is_none() {
            *first_state = Some(state.clone());
        }

        if rules.contains_key(&state) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {state}"),
                span,
            ));
        }

        let transitions = inner
            .filter(|p| p.as_rule() == Rule::transition)
            .map(parse_transition)
            .collect::<Result<Vec<_>, _>>()?;

        rules.insert(state, transitions);
    }

    Ok(rules)
}

/// Parses a single `read [-> write], direction, next` line.
///
/// If `write` is omitted, the transition writes back what it read.
fn parse_transition(pair: Pair<Rule>) -> Result<Transition, TuringMachineError> {
    let span = pair.as_span();
    let mut symbols = Vec::new();
    let mut direction = None;
    let mut next_state = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::symbol => symbols.push(parse_symbol(p.as_str())),
            Rule::direction => direction = Some(parse_direction(p)?),
            Rule::state => next_state = Some(p.as_str().to_string()),
            _ => {}
        }
    }

    match (symbols.as_slice(), direction, next_state) {
        (&[read], Some(direction), Some(next_state)) => Ok(Transition {
            read,
            write: read,
            direction,
            next_state,
        }),
        (&[read, write], Some(direction), Some(next_state)) => Ok(Transition {
            read,
            write,
            direction,
            next_state,
        }),
        _ => Err(parse_error("Malformed transition", span)),
    }
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-' or 'S' for Stay.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        "-" | "S" => Ok(Direction::Stay),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

/// Collects every `state` below the given pair.
fn parse_states(pair: Pair<Rule>) -> BTreeSet<String> {
    pair.into_inner()
        .flatten()
        .filter(|p| p.as_rule() == Rule::state)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Collects every `symbol` below the given pair.
fn parse_symbols(pair: Pair<Rule>) -> BTreeSet<char> {
    pair.into_inner()
        .flatten()
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| parse_symbol(p.as_str()))
        .collect()
}

/// Parses a single character symbol, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> char {
    input
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(input)
        .chars()
        .next()
        .unwrap_or(DEFAULT_BLANK_SYMBOL)
}

/// Extracts the trimmed free text of a `name` or `description` section.
fn parse_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// The keyword that introduces a top-level section.
fn keyword(rule: Rule) -> &'static str {
    match rule {
        Rule::name => "name",
        Rule::description => "description",
        Rule::blank => "blank",
        Rule::states => "states",
        Rule::input_alphabet => "input",
        Rule::tape_alphabet => "tape",
        Rule::initial => "initial",
        Rule::accept => "accept",
        Rule::rules => "rules",
        _ => "",
    }
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    if keyword(rule).is_empty() {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{}:\" declaration", keyword(rule)),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, rule: Rule) -> Result<T, TuringMachineError> {
    value.ok_or_else(|| {
        TuringMachineError::ValidationError(format!("Missing '{}' section", keyword(rule)))
    })
}
