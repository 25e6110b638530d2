//! Error taxonomy for decoding and path scoring.

use std::fmt;
use thiserror::Error;

/// Which table entry a probability came from, named by identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbabilityEntry {
    Start { state: u64 },
    Emission { state: u64, observation: u64 },
    Transition { from: u64, to: u64 },
}

impl fmt::Display for ProbabilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbabilityEntry::Start { state } => write!(f, "start[{state}]"),
            ProbabilityEntry::Emission { state, observation } => {
                write!(f, "emission[{state} -> {observation}]")
            }
            ProbabilityEntry::Transition { from, to } => write!(f, "transition[{from} -> {to}]"),
        }
    }
}

/// Everything that can go wrong while decoding or scoring a path.
///
/// Variants fall in three groups:
/// - malformed input: [`NoObservations`](Self::NoObservations),
///   [`NoStates`](Self::NoStates),
///   [`InvalidProbability`](Self::InvalidProbability),
///   [`PathLengthMismatch`](Self::PathLengthMismatch),
///   [`MissingProbability`](Self::MissingProbability);
/// - a consistent model that cannot explain the observations:
///   [`NoValidInitStates`](Self::NoValidInitStates),
///   [`PathBroken`](Self::PathBroken), [`NoValidPath`](Self::NoValidPath);
/// - a decoder defect: [`BrokenBacktrack`](Self::BrokenBacktrack).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("observation sequence is empty")]
    NoObservations,

    #[error("model has no states")]
    NoStates,

    #[error("no state has both a start and an emission probability for the first observation")]
    NoValidInitStates,

    #[error("invalid {space} probability {value} at {entry}")]
    InvalidProbability {
        entry: ProbabilityEntry,
        value: f64,
        space: &'static str,
    },

    /// No state can explain the observation at `step` given the layer before it.
    #[error("no state explains observation {step} from the states reachable before it")]
    PathBroken { step: usize },

    #[error("no state is reachable at the final observation")]
    NoValidPath,

    /// Backtracking found no predecessor for `state` (identity) at `step`.
    #[error("internal error: no predecessor recorded for state {state} at step {step}")]
    BrokenBacktrack { step: usize, state: u64 },

    #[error("path has {actual} states but the model has {expected} observations")]
    PathLengthMismatch { expected: usize, actual: usize },

    #[error("path uses {0}, which has no probability")]
    MissingProbability(ProbabilityEntry),
}

impl DecodeError {
    /// True for errors that indicate a bug in the decoder rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, DecodeError::BrokenBacktrack { .. })
    }

    /// True when the model is well-formed but makes the observations impossible.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            DecodeError::NoValidInitStates | DecodeError::PathBroken { .. } | DecodeError::NoValidPath
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecodeError>;
