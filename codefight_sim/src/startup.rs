//! Startup argument validation.
//!
//! The positional tokens are `SIZE U S C N P1 B1 P2 B2 ...`: the arena
//! size, four display symbols, then one symbol and one bomb symbol per
//! program slot.

use codefight_core::{EngineConfig, ProgramSymbols};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Smallest arena the shell accepts.
pub const MIN_ARENA_SIZE: usize = 7;

/// Largest arena the shell accepts.
pub const MAX_ARENA_SIZE: usize = 1337;

/// Size, four display symbols and two program symbol pairs.
pub const MIN_TOKENS: usize = 9;

const DISPLAY_SYMBOL_COUNT: usize = 4;

/// Errors in the startup tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("at least {} start up arguments are required, got {0}", MIN_TOKENS)]
    TooFewTokens(usize),

    #[error("start up arguments must be the size followed by symbol pairs, got {0} tokens")]
    UnpairedSymbols(usize),

    #[error("the arena size '{0}' is not a number")]
    InvalidSize(String),

    #[error("the arena size {0} is outside {}..={}", MIN_ARENA_SIZE, MAX_ARENA_SIZE)]
    SizeOutOfRange(usize),

    #[error("the start up argument '{0}' is not unique")]
    DuplicateToken(String),
}

/// Symbols used by the arena overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySymbols {
    /// Cell nobody has loaded or written
    pub unchanged: String,

    /// Brackets the detailed window in the overview
    pub window: String,

    /// Pointer of the program that runs next
    pub current: String,

    /// Pointers of the other alive programs
    pub next: String,
}

impl Default for DisplaySymbols {
    fn default() -> Self {
        Self {
            unchanged: ".".to_string(),
            window: "|".to_string(),
            current: "@".to_string(),
            next: "*".to_string(),
        }
    }
}

/// Validated startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupConfig {
    pub arena_size: usize,
    pub display: DisplaySymbols,
    pub program_symbols: Vec<ProgramSymbols>,
}

impl StartupConfig {
    /// Validates the positional tokens.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, StartupError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();

        if tokens.len() < MIN_TOKENS {
            return Err(StartupError::TooFewTokens(tokens.len()));
        }
        if tokens.len() % 2 == 0 {
            return Err(StartupError::UnpairedSymbols(tokens.len()));
        }

        let mut seen = HashSet::new();
        for token in &tokens {
            if !seen.insert(*token) {
                return Err(StartupError::DuplicateToken(token.to_string()));
            }
        }

        let arena_size: usize = tokens[0]
            .parse()
            .map_err(|_| StartupError::InvalidSize(tokens[0].to_string()))?;
        if !(MIN_ARENA_SIZE..=MAX_ARENA_SIZE).contains(&arena_size) {
            return Err(StartupError::SizeOutOfRange(arena_size));
        }

        let display = DisplaySymbols {
            unchanged: tokens[1].to_string(),
            window: tokens[2].to_string(),
            current: tokens[3].to_string(),
            next: tokens[4].to_string(),
        };

        let program_symbols = tokens[1 + DISPLAY_SYMBOL_COUNT..]
            .chunks_exact(2)
            .map(|pair| ProgramSymbols::new(pair[0], pair[1]))
            .collect();

        Ok(Self {
            arena_size,
            display,
            program_symbols,
        })
    }

    /// Engine configuration matching these tokens.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.arena_size).with_symbols(self.program_symbols.clone())
    }
}
