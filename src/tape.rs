//! This module defines the `Tape`, the machine's unbounded bidirectional storage.
//!
//! Only cells that have been written are stored. Every other position reads as the blank
//! symbol, so the tape behaves as if it were infinite in both directions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::RangeInclusive;

/// Sparse tape storage addressed by signed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: HashMap<i64, char>,
    blank: char,
    min: i64,
    max: i64,
}

impl Tape {
    /// Creates a tape holding `input` at positions `0..input.len()`.
    ///
    /// An empty input stores nothing; the written range is then `0..=0`.
    pub fn new(input: &str, blank: char) -> Self {
        let cells: HashMap<i64, char> = input
            .chars()
            .enumerate()
            .map(|(i, symbol)| (i as i64, symbol))
            .collect();
        let max = (cells.len() as i64 - 1).max(0);

        Self {
            cells,
            blank,
            min: 0,
            max,
        }
    }

    /// Returns the symbol at `position`, or the blank symbol if it was never written.
    pub fn read(&self, position: i64) -> char {
        self.cells.get(&position).copied().unwrap_or(self.blank)
    }

    /// Stores `symbol` at `position` and widens the written range if needed.
    pub fn write(&mut self, position: i64, symbol: char) {
        self.cells.insert(position, symbol);
        self.min = self.min.min(position);
        self.max = self.max.max(position);
    }

    /// Returns every cell from `min - radius` to `max + radius` inclusive.
    pub fn window(&self, radius: usize) -> BTreeMap<i64, char> {
        self.span(radius)
            .map(|position| (position, self.read(position)))
            .collect()
    }

    /// Positions covered by `window`. Saturates at the ends of the position space.
    fn span(&self, radius: usize) -> RangeInclusive<i64> {
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        self.min.saturating_sub(radius)..=self.max.saturating_add(radius)
    }

    /// Returns the smallest and largest positions ever written.
    pub fn bounds(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    /// Returns the blank symbol of this tape.
    pub fn blank(&self) -> char {
        self.blank
    }
}

/// Renders the written range, e.g. `aab_`.
impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for position in self.min..=self.max {
            write!(f, "{}", self.read(position))?;
        }
        Ok(())
    }
}
