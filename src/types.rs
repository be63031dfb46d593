//! This module defines the core data structures and types used throughout the simulator,
//! including the machine definition, transitions, execution outcomes, and error types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::Rule;

/// The default blank symbol used on the tape.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB
/// The default step budget for a bounded run.
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// The number of cells shown on each side of the written tape range in a snapshot.
pub const DEFAULT_WINDOW_RADIUS: usize = 10;

/// The static configuration of a deterministic single-tape Turing machine.
///
/// A definition is plain data: it can be parsed from the `.tm` text format, decoded from
/// JSON, or built directly in code. It never changes once a machine has been constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Definition {
    /// The name of the machine, usually the language it recognizes.
    pub name: String,
    /// A free-form, human readable description.
    #[serde(default)]
    pub description: String,
    /// Every declared state identifier.
    pub states: BTreeSet<String>,
    /// Symbols an input string is expected to be made of.
    pub input_alphabet: BTreeSet<char>,
    /// Symbols that may appear on the tape. Includes the input alphabet and the blank symbol.
    pub tape_alphabet: BTreeSet<char>,
    /// Transition rules grouped by source state, in declaration order.
    pub rules: BTreeMap<String, Vec<Transition>>,
    /// The state the machine starts in after every load.
    pub initial_state: String,
    /// The symbol read from every position that has never been written.
    #[serde(default = "default_blank")]
    pub blank: char,
    /// States that halt the run with an accepting verdict as soon as they are entered.
    pub accepting_states: BTreeSet<String>,
}

fn default_blank() -> char {
    DEFAULT_BLANK_SYMBOL
}

impl Definition {
    /// Returns the total number of transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Iterates over every transition together with its source state.
    pub fn transitions(&self) -> impl Iterator<Item = (&str, &Transition)> {
        self.rules.iter().flat_map(|(state, transitions)| {
            transitions
                .iter()
                .map(move |transition| (state.as_str(), transition))
        })
    }

    /// Checks if `state` is one of the accepting states.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting_states.contains(state)
    }
}

/// A single transition rule.
///
/// When the machine is in the rule's source state and reads `read` under the head, it
/// writes `write`, moves the head in `direction` and enters `next_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The symbol that must be under the head.
    pub read: char,
    /// The symbol written in place of `read`.
    pub write: char,
    /// The direction the head moves after writing.
    pub direction: Direction,
    /// The state the machine transitions to.
    pub next_state: String,
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// The signed offset applied to the head position.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

/// The outcome of a run so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The machine has not halted yet.
    #[default]
    Undecided,
    /// The machine entered an accepting state.
    Accepted,
    /// The machine found no applicable transition, or ran out of its step budget.
    Rejected,
}

impl Verdict {
    /// Checks if the verdict is final.
    pub fn is_halted(self) -> bool {
        self != Verdict::Undecided
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a transition and may take another one.
    Continue,
    /// The machine has halted with the given verdict.
    Halt(Verdict),
}

impl Step {
    /// Returns `true` when execution may continue.
    pub fn can_continue(&self) -> bool {
        matches!(self, Step::Continue)
    }
}

/// Why a run ended with a rejecting verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No transition is defined for the state and the symbol under the head.
    NoTransition { state: String, symbol: char },
    /// The run did not halt within its step budget.
    StepLimit { limit: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoTransition { state, symbol } => {
                write!(f, "no transition for state {state} and symbol '{symbol}'")
            }
            Rejection::StepLimit { limit } => write!(f, "step limit of {limit} reached"),
        }
    }
}

/// A read-only view of a machine's run state, meant for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// The current state.
    pub state: String,
    /// The head position.
    pub head: i64,
    /// The symbol under the head.
    pub symbol: char,
    /// Transitions performed since the last load.
    pub step_count: usize,
    pub verdict: Verdict,
    /// Tape cells around the written range, keyed by position.
    pub tape: BTreeMap<i64, char>,
}

/// Represents various errors that can occur while loading, validating or feeding a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Indicates an error during the parsing of a `.tm` definition.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates that a definition is structurally inconsistent.
    #[error("Definition validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates that a JSON definition could not be decoded.
    #[error("Definition decoding error: {0}")]
    DecodeError(String),
    /// Indicates an input symbol outside of the input alphabet.
    #[error("Input symbol '{symbol}' at position {position} is not in the input alphabet")]
    InvalidInputSymbol { symbol: char, position: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let stay_json = serde_json::to_string(&Direction::Stay).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(stay_json, "\"Stay\"");

        let stay: Direction = serde_json::from_str(&stay_json).unwrap();
        assert_eq!(stay, Direction::Stay);
    }

    #[test]
    fn test_direction_offset() {
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Right.offset(), 1);
        assert_eq!(Direction::Stay.offset(), 0);
    }

    #[test]
    fn test_verdict_is_halted() {
        assert!(!Verdict::Undecided.is_halted());
        assert!(Verdict::Accepted.is_halted());
        assert!(Verdict::Rejected.is_halted());
        assert_eq!(Verdict::default(), Verdict::Undecided);
    }

    #[test]
    fn test_step_can_continue() {
        assert!(Step::Continue.can_continue());
        assert!(!Step::Halt(Verdict::Accepted).can_continue());
        assert!(!Step::Halt(Verdict::Rejected).can_continue());
    }

    #[test]
    fn test_definition_blank_defaults_when_missing() {
        let json = r#"{
            "name": "Tiny",
            "states": ["q0", "done"],
            "input_alphabet": ["a"],
            "tape_alphabet": ["a", "_"],
            "rules": { "q0": [{ "read": "a", "write": "a", "direction": "Right", "next_state": "done" }] },
            "initial_state": "q0",
            "accepting_states": ["done"]
        }"#;

        let definition: Definition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.blank, DEFAULT_BLANK_SYMBOL);
        assert_eq!(definition.description, "");
        assert_eq!(definition.transition_count(), 1);
        assert!(definition.is_accepting("done"));
        assert!(!definition.is_accepting("q0"));
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::NoTransition {
            state: "q2".to_string(),
            symbol: '_',
        };
        assert_eq!(rejection.to_string(), "no transition for state q2 and symbol '_'");
        assert_eq!(
            Rejection::StepLimit { limit: 10 }.to_string(),
            "step limit of 10 reached"
        );
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::InvalidInputSymbol {
            symbol: 'c',
            position: 2,
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("'c'"));
        assert!(error_msg.contains("position 2"));
    }
}
