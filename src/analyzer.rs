//! This module provides functions for analyzing machine definitions to detect inconsistencies
//! before execution. This includes checks for declared states, symbols inside the tape
//! alphabet, and transitions that would make the machine non-deterministic.

use crate::types::{Definition, TuringMachineError};
use std::collections::{BTreeSet, HashSet};

/// Represents various errors that can be found during the analysis of a definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The blank symbol is missing from the tape alphabet.
    BlankNotInTapeAlphabet(char),
    /// The input alphabet contains symbols outside the tape alphabet, or the blank symbol.
    InvalidInputAlphabet(Vec<char>),
    /// The initial state is not a declared state.
    InvalidStartState(String),
    /// Accepting states that are not declared states.
    UndeclaredAcceptingStates(Vec<String>),
    /// Rule sources or targets that are not declared states.
    UndeclaredStates(Vec<String>),
    /// Read or written symbols that are not in the tape alphabet.
    UndeclaredSymbols(Vec<char>),
    /// More than one transition for the same state and symbol.
    ConflictingTransitions(Vec<String>),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::BlankNotInTapeAlphabet(blank) => TuringMachineError::ValidationError(
                format!("Blank symbol '{}' is not in the tape alphabet", blank),
            ),
            AnalysisError::InvalidInputAlphabet(symbols) => {
                TuringMachineError::ValidationError(format!(
                    "Input alphabet contains blank or non-tape symbols: {:?}",
                    symbols
                ))
            }
            AnalysisError::InvalidStartState(state) => {
                TuringMachineError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::UndeclaredAcceptingStates(states) => {
                TuringMachineError::ValidationError(format!(
                    "Accepting states are not declared: {:?}",
                    states
                ))
            }
            AnalysisError::UndeclaredStates(states) => TuringMachineError::ValidationError(
                format!("Transitions reference undeclared states: {:?}", states),
            ),
            AnalysisError::UndeclaredSymbols(symbols) => TuringMachineError::ValidationError(
                format!("Transitions use symbols outside the tape alphabet: {:?}", symbols),
            ),
            AnalysisError::ConflictingTransitions(keys) => TuringMachineError::ValidationError(
                format!("Conflicting transitions for: {:?}", keys),
            ),
        }
    }
}

/// Analyzes a `Definition` for structural errors.
///
/// Every check runs; the first failure (in check order) is returned.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` if any rule is violated.
pub fn analyze(definition: &Definition) -> Result<(), TuringMachineError> {
    let errors = [
        check_blank,
        check_input_alphabet,
        check_valid_start_state,
        check_accepting_states,
        check_declared_states,
        check_tape_symbols,
        check_determinism,
    ]
    .iter()
    .filter_map(|f| f(definition).err())
    .collect::<Vec<_>>();

    match errors.into_iter().next() {
        Some(first_error) => Err(first_error.into()),
        None => Ok(()),
    }
}

/// Returns the declared states that cannot be reached from the initial state, sorted.
///
/// Unreachable states are harmless for execution, so this is a diagnostic rather than a check.
pub fn unreachable_states(definition: &Definition) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(transitions) = definition.rules.get(state) {
            for transition in transitions {
                if !visited.contains(transition.next_state.as_str()) {
                    queue.push(&transition.next_state);
                }
            }
        }
    }

    // BTreeSet iteration keeps the output sorted
    definition
        .states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect()
}

/// Checks that the blank symbol belongs to the tape alphabet.
fn check_blank(definition: &Definition) -> Result<(), AnalysisError> {
    if !definition.tape_alphabet.contains(&definition.blank) {
        return Err(AnalysisError::BlankNotInTapeAlphabet(definition.blank));
    }

    Ok(())
}

/// Checks that the input alphabet is a subset of the tape alphabet and excludes blank.
fn check_input_alphabet(definition: &Definition) -> Result<(), AnalysisError> {
    let invalid: Vec<char> = definition
        .input_alphabet
        .iter()
        .filter(|&&symbol| {
            symbol == definition.blank || !definition.tape_alphabet.contains(&symbol)
        })
        .copied()
        .collect();

    if !invalid.is_empty() {
        return Err(AnalysisError::InvalidInputAlphabet(invalid));
    }

    Ok(())
}

/// Checks that the initial state is declared.
fn check_valid_start_state(definition: &Definition) -> Result<(), AnalysisError> {
    if !definition.states.contains(&definition.initial_state) {
        return Err(AnalysisError::InvalidStartState(
            definition.initial_state.clone(),
        ));
    }

    Ok(())
}

/// Checks that every accepting state is declared.
fn check_accepting_states(definition: &Definition) -> Result<(), AnalysisError> {
    let undeclared: Vec<String> = definition
        .accepting_states
        .difference(&definition.states)
        .cloned()
        .collect();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredAcceptingStates(undeclared));
    }

    Ok(())
}

/// Checks that every rule source and every `next_state` is declared.
fn check_declared_states(definition: &Definition) -> Result<(), AnalysisError> {
    let undeclared: BTreeSet<String> = definition
        .rules
        .keys()
        .chain(definition.transitions().map(|(_, t)| &t.next_state))
        .filter(|state| !definition.states.contains(*state))
        .cloned()
        .collect();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredStates(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that every read and written symbol is in the tape alphabet.
fn check_tape_symbols(definition: &Definition) -> Result<(), AnalysisError> {
    let undeclared: BTreeSet<char> = definition
        .transitions()
        .flat_map(|(_, t)| [t.read, t.write])
        .filter(|symbol| !definition.tape_alphabet.contains(symbol))
        .collect();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredSymbols(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that no state has two transitions for the same symbol.
fn check_determinism(definition: &Definition) -> Result<(), AnalysisError> {
    let mut seen = HashSet::new();
    let mut conflicts = BTreeSet::new();

    for (state, transition) in definition.transitions() {
        if !seen.insert((state, transition.read)) {
            conflicts.insert(format!("({}, '{}')", state, transition.read));
        }
    }

    if !conflicts.is_empty() {
        return Err(AnalysisError::ConflictingTransitions(
            conflicts.into_iter().collect(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Transition};
    use std::collections::BTreeMap;

    fn create_transition(read: char, write: char, direction: Direction, next: &str) -> Transition {
        Transition {
            read,
            write,
            direction,
            next_state: next.to_string(),
        }
    }

    /// `(ab)*`: q0 -a-> q1 -b-> q0, blank in q0 accepts.
    fn create_test_definition() -> Definition {
        let mut rules = BTreeMap::new();
        rules.insert(
            "q0".to_string(),
            vec![
                create_transition('a', 'a', Direction::Right, "q1"),
                create_transition('_', '_', Direction::Stay, "accept"),
            ],
        );
        rules.insert(
            "q1".to_string(),
            vec![create_transition('b', 'b', Direction::Right, "q0")],
        );

        Definition {
            name: "(ab)*".to_string(),
            description: String::new(),
            states: ["q0", "q1", "accept"].iter().map(|s| s.to_string()).collect(),
            input_alphabet: ['a', 'b'].into_iter().collect(),
            tape_alphabet: ['a', 'b', '_'].into_iter().collect(),
            rules,
            initial_state: "q0".to_string(),
            blank: '_',
            accepting_states: ["accept".to_string()].into_iter().collect(),
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(analyze(&create_test_definition()).is_ok());
    }

    #[test]
    fn test_blank_not_in_tape_alphabet() {
        let mut definition = create_test_definition();
        definition.tape_alphabet.remove(&'_');

        assert_eq!(
            check_blank(&definition),
            Err(AnalysisError::BlankNotInTapeAlphabet('_'))
        );
    }

    #[test]
    fn test_input_alphabet_must_fit_tape_alphabet() {
        let mut definition = create_test_definition();
        definition.input_alphabet.insert('c');
        definition.input_alphabet.insert('_');

        assert_eq!(
            check_input_alphabet(&definition),
            Err(AnalysisError::InvalidInputAlphabet(vec!['_', 'c']))
        );
    }

    #[test]
    fn test_invalid_start_state() {
        let mut definition = create_test_definition();
        definition.initial_state = "start".to_string();

        assert_eq!(
            check_valid_start_state(&definition),
            Err(AnalysisError::InvalidStartState("start".to_string()))
        );
    }

    #[test]
    fn test_undeclared_accepting_states() {
        let mut definition = create_test_definition();
        definition.accepting_states.insert("done".to_string());

        assert_eq!(
            check_accepting_states(&definition),
            Err(AnalysisError::UndeclaredAcceptingStates(vec![
                "done".to_string()
            ]))
        );
    }

    #[test]
    fn test_undeclared_states() {
        let mut definition = create_test_definition();
        definition.rules.insert(
            "q9".to_string(),
            vec![create_transition('a', 'a', Direction::Left, "q8")],
        );

        assert_eq!(
            check_declared_states(&definition),
            Err(AnalysisError::UndeclaredStates(vec![
                "q8".to_string(),
                "q9".to_string()
            ]))
        );
    }

    #[test]
    fn test_undeclared_symbols() {
        let mut definition = create_test_definition();
        definition
            .rules
            .get_mut("q1")
            .unwrap()
            .push(create_transition('x', 'y', Direction::Right, "q0"));

        assert_eq!(
            check_tape_symbols(&definition),
            Err(AnalysisError::UndeclaredSymbols(vec!['x', 'y']))
        );
    }

    #[test]
    fn test_conflicting_transitions() {
        let mut definition = create_test_definition();
        definition
            .rules
            .get_mut("q0")
            .unwrap()
            .push(create_transition('a', 'b', Direction::Left, "q0"));

        assert_eq!(
            check_determinism(&definition),
            Err(AnalysisError::ConflictingTransitions(vec![
                "(q0, 'a')".to_string()
            ]))
        );
    }

    #[test]
    fn test_analyze_reports_first_error() {
        let mut definition = create_test_definition();
        definition.initial_state = "nowhere".to_string();
        definition.accepting_states.insert("ghost".to_string());

        let error = analyze(&definition).unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::ValidationError("Invalid start state: nowhere".to_string())
        );
    }

    #[test]
    fn test_analysis_error_conversion() {
        let error: TuringMachineError = AnalysisError::BlankNotInTapeAlphabet('#').into();
        assert_eq!(
            error.to_string(),
            "Definition validation error: Blank symbol '#' is not in the tape alphabet"
        );
    }

    #[test]
    fn test_unreachable_states() {
        let mut definition = create_test_definition();
        assert!(unreachable_states(&definition).is_empty());

        definition.states.insert("q3".to_string());
        definition.rules.insert(
            "q3".to_string(),
            vec![create_transition('a', 'a', Direction::Right, "q1")],
        );

        assert_eq!(unreachable_states(&definition), vec!["q3".to_string()]);
    }
}
