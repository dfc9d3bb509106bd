//! Programs: registered scripts and their match-local copies.

use crate::arena::addr;
use crate::error::ConfigurationError;
use crate::instruction_table::InstructionTable;
use crate::opcode::Instruction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Id carried by programs whose name is unique within a match.
pub const UNIQUE_ID: i32 = -1;

/// Separator between name and id when a duplicate copy is labelled.
pub const ID_SEPARATOR: char = '#';

/// Stable key distinguishing placed programs, including duplicate copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramIdentity {
    name: String,
    id: i32,
}

impl ProgramIdentity {
    /// Identity of a program that appears once in its match.
    pub fn unique(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: UNIQUE_ID,
        }
    }

    /// Identity of one of several copies of the same program.
    pub fn numbered(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_unique(&self) -> bool {
        self.id == UNIQUE_ID
    }
}

impl fmt::Display for ProgramIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unique() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}{}{}", self.name, ID_SEPARATOR, self.id)
        }
    }
}

/// Display symbols assigned to a program when a match starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSymbols {
    pub symbol: String,
    pub bomb_symbol: String,
}

impl ProgramSymbols {
    pub fn new(symbol: impl Into<String>, bomb_symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bomb_symbol: bomb_symbol.into(),
        }
    }
}

/// A program: its script plus the runtime state of one match.
///
/// Registered templates are never alive. [`Program::instantiate`] produces
/// the match-local copy the scheduler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    identity: ProgramIdentity,
    script: Vec<Instruction>,
    symbols: Option<ProgramSymbols>,
    pointer: usize,
    alive: bool,
    round_counter: u32,
}

impl Program {
    /// Creates a registered template from a validated script.
    pub fn new(name: impl Into<String>, script: Vec<Instruction>) -> Self {
        Self {
            identity: ProgramIdentity::unique(name),
            script,
            symbols: None,
            pointer: 0,
            alive: false,
            round_counter: 0,
        }
    }

    /// Clones this template into a live match copy starting at `pointer`.
    pub fn instantiate(&self, id: i32, symbols: ProgramSymbols, pointer: usize) -> Self {
        Self {
            identity: ProgramIdentity::numbered(self.identity.name(), id),
            script: self.script.clone(),
            symbols: Some(symbols),
            pointer,
            alive: true,
            round_counter: 0,
        }
    }

    pub fn identity(&self) -> &ProgramIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn script(&self) -> &[Instruction] {
        &self.script
    }

    pub fn symbols(&self) -> Option<&ProgramSymbols> {
        self.symbols.as_ref()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn round_counter(&self) -> u32 {
        self.round_counter
    }

    /// Flips the alive flag. Only STOP does this.
    pub fn toggle_alive(&mut self) {
        self.alive = !self.alive;
    }

    /// Moves the pointer `delta` cells, wrapping at the arena edge.
    pub fn advance(&mut self, delta: i64, size: NonZeroUsize) {
        self.pointer = addr(self.pointer as i64 + delta, size);
    }

    /// Sets the pointer to an arbitrary (wrapping) address.
    pub fn jump_to(&mut self, target: i64, size: NonZeroUsize) {
        self.pointer = addr(target, size);
    }

    pub(crate) fn complete_round(&mut self) {
        self.round_counter = self.round_counter.saturating_add(1);
    }
}

/// Read-only view of a placed program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    pub identity: ProgramIdentity,
    pub alive: bool,
    pub round_counter: u32,
    pub pointer: usize,

    /// Instruction at the pointer; only reported while alive
    pub next_instruction: Option<Instruction>,
}

/// Parses the comma-separated script form `OP,A,B,OP,A,B,...`.
///
/// Opcode names are validated against `table`.
pub fn parse_script(text: &str, table: &InstructionTable) -> Result<Vec<Instruction>, ConfigurationError> {
    let fields: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    if fields.len() % 3 != 0 {
        return Err(ConfigurationError::MalformedScript(format!(
            "expected OP,A,B triples, got {} fields",
            fields.len()
        )));
    }

    fields
        .chunks_exact(3)
        .map(|triple| {
            let opcode = table.resolve(triple[0])?;
            let a = parse_operand(triple[1])?;
            let b = parse_operand(triple[2])?;
            Ok(Instruction::new(opcode, a, b))
        })
        .collect()
}

fn parse_operand(field: &str) -> Result<i32, ConfigurationError> {
    field
        .parse::<i32>()
        .map_err(|_| ConfigurationError::MalformedScript(format!("'{}' is not an integer operand", field)))
}
