//! Error types for the CodeFight engine.
//!
//! Errors only surface at the edges of a match: while registering scripts,
//! while placing a match, or when inspecting state that does not exist.
//! Instruction execution itself has no failure path.

use crate::program::ProgramIdentity;
use thiserror::Error;

/// Errors raised while configuring the engine or registering programs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Opcode mnemonic not present in the instruction table
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(String),

    /// Script text could not be parsed into (opcode, A, B) triples
    #[error("Malformed script: {0}")]
    MalformedScript(String),

    /// Script has no instructions at all
    #[error("Script for '{0}' is empty")]
    EmptyScript(String),

    /// Program name is empty or contains the id separator
    #[error("Invalid program name: '{0}'")]
    InvalidName(String),

    /// A program with this name is already registered
    #[error("Program '{0}' is already registered")]
    DuplicateProgram(String),

    /// No registered program with this name
    #[error("Program '{0}' is not registered")]
    UnknownProgram(String),

    /// Script cannot fit into the arena next to a single opponent
    #[error("Script for '{name}' has {len} instructions, at most {max} fit")]
    ScriptTooLong { name: String, len: usize, max: usize },

    /// Arena size outside the addressable range
    #[error("Invalid arena size: {0}")]
    InvalidArenaSize(usize),

    /// Not enough symbol pairs to run a match
    #[error("At least {required} symbol pairs are required, got {actual}")]
    NotEnoughSymbols { required: usize, actual: usize },

    /// Configuration cannot change while a match is placed
    #[error("Cannot change configuration while a match is in progress")]
    MatchInProgress,
}

/// Errors raised while placing a match into the arena.
///
/// When any of these is returned the match has not started and the
/// arena is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Selected name is not registered
    #[error("Unknown program: {0}")]
    UnknownProgram(String),

    /// Selected name collides with the `name#id` labelling of copies
    #[error("Ambiguous program selection: {0}")]
    AmbiguousSelection(String),

    /// Fewer programs than a match needs
    #[error("A match needs at least {required} programs, got {actual}")]
    TooFewPrograms { required: usize, actual: usize },

    /// More programs than there are symbol pairs
    #[error("At most {max} programs can play, got {actual}")]
    TooManyPrograms { max: usize, actual: usize },

    /// A script does not fit into its slot
    #[error("Program '{label}' needs {len} cells but its slot holds {slot}")]
    ScriptExceedsSlot { label: String, len: usize, slot: usize },

    /// After placement every cell still holds the filler opcode
    #[error("Arena contains no executable instruction")]
    NoExecutableInstruction,

    /// A match is already placed
    #[error("A match is already in progress")]
    MatchInProgress,
}

/// Errors raised by read-only queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// No match has been placed
    #[error("No match is in progress")]
    NoMatch,

    /// No placed program carries this label
    #[error("Program not found: {0}")]
    ProgramNotFound(String),
}

impl InspectError {
    /// Creates a not-found error for an identity.
    pub fn not_found(identity: &ProgramIdentity) -> Self {
        Self::ProgramNotFound(identity.to_string())
    }
}
