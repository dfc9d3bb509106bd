//! Opcodes and instruction triples.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The nine instruction mnemonics understood by the engine.
///
/// Declaration order is significant: randomized seeding indexes into
/// [`OpCode::ALL`], so reordering variants changes seeded arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    /// Toggle the executing program's alive flag
    Stop,

    /// Copy a cell relative to the pointer
    MovR,

    /// Copy a cell through an indirection cell
    MovI,

    /// Add operand A into operand B of the current cell
    Add,

    /// Add operand A into operand B of a relative cell
    AddR,

    /// Unconditional relative jump
    Jmp,

    /// Jump if a relative cell's operand B is zero
    Jmz,

    /// Skip the next instruction on mismatch
    Cmp,

    /// Exchange operand A of one cell with operand B of another
    Swap,
}

impl OpCode {
    /// All opcodes in table order.
    pub const ALL: [OpCode; 9] = [
        OpCode::Stop,
        OpCode::MovR,
        OpCode::MovI,
        OpCode::Add,
        OpCode::AddR,
        OpCode::Jmp,
        OpCode::Jmz,
        OpCode::Cmp,
        OpCode::Swap,
    ];

    /// Returns the textual mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Stop => "STOP",
            OpCode::MovR => "MOV_R",
            OpCode::MovI => "MOV_I",
            OpCode::Add => "ADD",
            OpCode::AddR => "ADD_R",
            OpCode::Jmp => "JMP",
            OpCode::Jmz => "JMZ",
            OpCode::Cmp => "CMP",
            OpCode::Swap => "SWAP",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl FromStr for OpCode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpCode::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic() == s)
            .ok_or_else(|| ConfigurationError::UnknownOpcode(s.to_string()))
    }
}

/// One `(opcode, A, B)` triple, as stored in a script or a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: OpCode,
    pub a: i32,
    pub b: i32,
}

impl Instruction {
    /// Creates a new instruction.
    pub const fn new(opcode: OpCode, a: i32, b: i32) -> Self {
        Self { opcode, a, b }
    }

    /// The filler instruction with zero operands.
    pub const fn filler(opcode: OpCode) -> Self {
        Self::new(opcode, 0, 0)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.opcode, self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_round_trip() {
        for op in OpCode::ALL {
            assert_eq!(op.mnemonic().parse::<OpCode>().unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_mnemonic() {
        let err = "NOP".parse::<OpCode>().unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownOpcode("NOP".to_string()));

        // Mnemonics are case sensitive
        assert!("stop".parse::<OpCode>().is_err());
    }

    #[test]
    fn test_instruction_display() {
        let instr = Instruction::new(OpCode::MovI, -3, 7);
        assert_eq!(instr.to_string(), "MOV_I|-3|7");
    }
}
