//! Activity events emitted while a check runs.
//!
//! Callers pass a sink into the check instead of the engine writing to a
//! shared log, so concurrent checks never contend on state.

use serde::Serialize;
use std::collections::VecDeque;

use super::DiagnosticCode;

/// A named checker stage, in the order the runner executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Brackets,
    Version,
    Declaration,
    Syntax,
    Assignments,
    Ternary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Brackets => "brackets",
            Stage::Version => "version",
            Stage::Declaration => "declaration",
            Stage::Syntax => "syntax",
            Stage::Assignments => "assignments",
            Stage::Ternary => "ternary",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CheckEvent {
    Started {
        lines: usize,
    },
    BracketGateFailed {
        code: DiagnosticCode,
        line: usize,
    },
    StageFinished {
        stage: Stage,
        errors: usize,
        warnings: usize,
    },
    Finished {
        is_valid: bool,
        score: u8,
    },
}

impl std::fmt::Display for CheckEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckEvent::Started { lines } => write!(f, "analyzing {} lines", lines),
            CheckEvent::BracketGateFailed { code, line } => {
                write!(f, "bracket check failed ({} at line {}), skipping remaining checks", code, line)
            }
            CheckEvent::StageFinished {
                stage,
                errors,
                warnings,
            } => write!(f, "{}: {} error(s), {} warning(s)", stage, errors, warnings),
            CheckEvent::Finished { is_valid, score } => {
                let status = if *is_valid { "passed" } else { "failed" };
                write!(f, "static analysis {} with score {}", status, score)
            }
        }
    }
}

/// Receives events from a running check.
pub trait EventSink {
    fn record(&mut self, event: CheckEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: CheckEvent) {}
}

/// Ordered, append-only event buffer that keeps only the newest `capacity`
/// entries.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<CheckEvent>,
    capacity: usize,
    dropped: usize,
}

impl ActivityLog {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
            dropped: 0,
        }
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &CheckEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted to honour the capacity.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl EventSink for ActivityLog {
    fn record(&mut self, event: CheckEvent) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(event);
    }
}
