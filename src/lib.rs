//! This crate provides the core logic for a deterministic single-tape Turing machine simulator.
//! It includes the sparse tape, the step/run engine, a parser and loader for machine
//! definitions, and an analyzer that validates definitions before execution.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, unreachable_states, AnalysisError};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
pub use tape::Tape;
/// Re-exports the definition and execution types.
pub use types::{
    Definition, Direction, Rejection, Snapshot, Step, Transition, TuringMachineError, Verdict,
    DEFAULT_MAX_STEPS, DEFAULT_WINDOW_RADIUS, MAX_DEFINITION_SIZE,
};
