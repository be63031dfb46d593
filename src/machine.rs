//! This module defines the `TuringMachine` struct, which simulates a deterministic single-tape
//! Turing machine. It owns the tape and the run state, and interprets the transition table
//! one step at a time.

use crate::analyzer::{analyze, unreachable_states};
use crate::tape::Tape;
use crate::types::{
    Definition, Rejection, Snapshot, Step, Transition, TuringMachineError, Verdict,
    DEFAULT_WINDOW_RADIUS,
};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Transition lookup: state, then symbol under the head.
type Table = HashMap<String, HashMap<char, Transition>>;

/// Represents a deterministic single-tape Turing machine.
///
/// The definition is fixed at construction. The run state (current state, head, tape, step
/// count, verdict) is reset by every call to `load`. A new machine starts loaded with the
/// empty input.
pub struct TuringMachine {
    definition: Definition,
    table: Table,
    state: String,
    head: i64,
    tape: Tape,
    step_count: usize,
    verdict: Verdict,
    rejection: Option<Rejection>,
}

impl TuringMachine {
    /// Creates a new `TuringMachine` without validating the definition.
    ///
    /// Undeclared states or symbols are not checked here. A transition into a state without
    /// rules simply rejects on the next step. If a state lists two transitions for the same
    /// symbol, the first one is used.
    pub fn new(definition: Definition) -> Self {
        let table = compile(&definition);
        let tape = Tape::new(&definition.blank.to_string(), definition.blank);

        Self {
            state: definition.initial_state.clone(),
            head: 0,
            tape,
            step_count: 0,
            verdict: Verdict::Undecided,
            rejection: None,
            table,
            definition,
        }
    }

    /// Creates a new `TuringMachine` after analyzing the definition.
    ///
    /// # Returns
    ///
    /// * `Ok(TuringMachine)` if the definition is consistent.
    /// * `Err(TuringMachineError::ValidationError)` describing the first problem found.
    pub fn try_new(definition: Definition) -> Result<Self, TuringMachineError> {
        analyze(&definition)?;

        let unreachable = unreachable_states(&definition);
        if !unreachable.is_empty() {
            warn!(machine = %definition.name, states = ?unreachable, "unreachable states");
        }

        Ok(Self::new(definition))
    }

    /// Loads `input` onto a fresh tape and resets the run state.
    ///
    /// Input symbols are not checked against the input alphabet. An empty input loads the
    /// blank symbol itself, so position 0 is always written.
    pub fn load(&mut self, input: &str) {
        let blank = self.definition.blank;
        self.tape = if input.is_empty() {
            Tape::new(&blank.to_string(), blank)
        } else {
            Tape::new(input, blank)
        };
        self.state = self.definition.initial_state.clone();
        self.head = 0;
        self.step_count = 0;
        self.verdict = Verdict::Undecided;
        self.rejection = None;

        debug!(machine = %self.definition.name, input, "input loaded");
    }

    /// Like `load`, but rejects symbols outside the input alphabet.
    ///
    /// On error the previous run state is left untouched.
    pub fn load_checked(&mut self, input: &str) -> Result<(), TuringMachineError> {
        if let Some((position, symbol)) = input
            .chars()
            .enumerate()
            .find(|(_, symbol)| !self.definition.input_alphabet.contains(symbol))
        {
            return Err(TuringMachineError::InvalidInputSymbol { symbol, position });
        }

        self.load(input);
        Ok(())
    }

    /// Executes a single step of the machine.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition was performed and the machine has not halted.
    /// * `Step::Halt(verdict)` if the machine was already halted, found no transition for the
    ///   current state and symbol (rejected), or entered an accepting state (accepted).
    pub fn step(&mut self) -> Step {
        if self.verdict.is_halted() {
            return Step::Halt(self.verdict);
        }

        let symbol = self.tape.read(self.head);

        let Some(transition) = self
            .table
            .get(&self.state)
            .and_then(|row| row.get(&symbol))
        else {
            debug!(
                state = %self.state,
                %symbol,
                steps = self.step_count,
                "no transition, rejecting"
            );
            self.rejection = Some(Rejection::NoTransition {
                state: self.state.clone(),
                symbol,
            });
            self.verdict = Verdict::Rejected;
            return Step::Halt(self.verdict);
        };

        trace!(
            state = %self.state,
            %symbol,
            head = self.head,
            write = %transition.write,
            next = %transition.next_state,
            "step"
        );

        self.tape.write(self.head, transition.write);
        self.head += transition.direction.offset();
        self.state.clone_from(&transition.next_state);
        self.step_count += 1;

        if self.definition.is_accepting(&self.state) {
            debug!(state = %self.state, steps = self.step_count, "accepted");
            self.verdict = Verdict::Accepted;
            return Step::Halt(self.verdict);
        }

        Step::Continue
    }

    /// Runs the machine until it halts or `step_count` reaches `max_steps`.
    ///
    /// A run that is still undecided when the budget is spent is rejected. Use `run_until` to
    /// keep such a run undecided.
    pub fn run(&mut self, max_steps: usize) -> Verdict {
        if self.run_until(max_steps) == Verdict::Undecided {
            debug!(steps = self.step_count, max_steps, "step limit reached, rejecting");
            self.rejection = Some(Rejection::StepLimit { limit: max_steps });
            self.verdict = Verdict::Rejected;
        }

        self.verdict
    }

    /// Runs the machine until it halts or `step_count` reaches `max_steps`, and returns the
    /// verdict as is. `Verdict::Undecided` means the budget ran out first.
    ///
    /// `max_steps` bounds the total step count since the last load, not the steps taken by
    /// this call.
    pub fn run_until(&mut self, max_steps: usize) -> Verdict {
        while self.step_count < max_steps {
            if !self.step().can_continue() {
                break;
            }
        }

        self.verdict
    }

    /// Returns a view of the run state with `DEFAULT_WINDOW_RADIUS` cells of context.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_with_radius(DEFAULT_WINDOW_RADIUS)
    }

    /// Returns a view of the run state with `radius` cells of context around the written range.
    pub fn snapshot_with_radius(&self, radius: usize) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            head: self.head,
            symbol: self.symbol(),
            step_count: self.step_count,
            verdict: self.verdict,
            tape: self.tape.window(radius),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the head position.
    pub fn head(&self) -> i64 {
        self.head
    }

    /// Returns the symbol under the head.
    pub fn symbol(&self) -> char {
        self.tape.read(self.head)
    }

    /// Returns the tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Returns the number of transitions performed since the last load.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns the verdict of the current run.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Returns why the run was rejected, if it was.
    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Checks if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.verdict.is_halted()
    }

    /// Returns the definition this machine was built from.
    pub fn definition(&self) -> &Definition {
        &self.definition
    }
}

/// Builds the lookup table. The first transition listed for a `(state, symbol)` pair wins.
fn compile(definition: &Definition) -> Table {
    let mut table = Table::new();

    for (state, transition) in definition.transitions() {
        table
            .entry(state.to_string())
            .or_default()
            .entry(transition.read)
            .or_insert_with(|| transition.clone());
    }

    table
}
