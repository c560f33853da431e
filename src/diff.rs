//! Line normalization and directional set diffing
//!
//! Brain content is compared as a set of trimmed, non-empty lines.
//! Duplicate lines collapse and input ordering is discarded: only set
//! membership is contractual, never iteration order.

use std::collections::HashSet;
use std::fmt;

/// Direction label for a change set (source -> target).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ExecutionToQuality,
    QualityToExecution,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ExecutionToQuality => "execution->quality",
            Direction::QualityToExecution => "quality->execution",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lines present in a source but absent from its counterpart.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub direction: Direction,
    pub lines: Vec<String>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Reduce content to its set of normalized lines.
///
/// Splits on line boundaries (`\n` or `\r\n`), trims surrounding
/// whitespace per line, and discards empty lines.
pub fn normalized_lines(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compute the lines unique to `source` relative to `target`.
pub fn diff(source: &str, target: &str, direction: Direction) -> ChangeSet {
    let source_lines = normalized_lines(source);
    let target_lines = normalized_lines(target);

    let lines: Vec<String> = source_lines
        .into_iter()
        .filter(|line| !target_lines.contains(line))
        .collect();

    ChangeSet { direction, lines }
}
