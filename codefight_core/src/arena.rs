//! The circular memory arena.
//!
//! Every address is resolved through [`addr`], which maps any `i64` onto
//! `0..size`. Operand sums are widened to `i64` before wrapping, so no
//! address computation can overflow and no access can go out of bounds.

use crate::opcode::{Instruction, OpCode};
use crate::program::ProgramIdentity;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Resolves any integer index onto the arena `0..size`.
///
/// Equivalent to `((index mod size) + size) mod size`.
pub fn addr(index: i64, size: NonZeroUsize) -> usize {
    // Arena sizes are bounded by `i32::MAX` at configuration time
    index.rem_euclid(size.get() as i64) as usize
}

/// One memory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub opcode: OpCode,
    pub operand_a: i32,
    pub operand_b: i32,

    /// Program that last wrote or loaded this cell
    pub last_modified_by: Option<ProgramIdentity>,

    /// True once an instruction wrote here after the last placement
    pub touched_since_placement: bool,
}

impl Cell {
    /// Creates an unowned, untouched cell holding `instruction`.
    pub fn new(instruction: Instruction) -> Self {
        Self {
            opcode: instruction.opcode,
            operand_a: instruction.a,
            operand_b: instruction.b,
            last_modified_by: None,
            touched_since_placement: false,
        }
    }

    /// Returns the `(opcode, A, B)` triple held by this cell.
    pub fn instruction(&self) -> Instruction {
        Instruction::new(self.opcode, self.operand_a, self.operand_b)
    }

    /// Returns true if this cell was planted during the match and would
    /// halt or strand a program that executes it.
    pub fn is_bomb(&self) -> bool {
        if !self.touched_since_placement {
            return false;
        }
        match self.opcode {
            OpCode::Stop => true,
            OpCode::Jmp => self.operand_a == 0,
            OpCode::Jmz => self.operand_a == 0 && self.operand_b == 0,
            _ => false,
        }
    }
}

/// A partial write to a cell. Unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellUpdate {
    pub opcode: Option<OpCode>,
    pub operand_a: Option<i32>,
    pub operand_b: Option<i32>,
}

impl CellUpdate {
    /// Overwrites the full triple.
    pub fn instruction(instruction: Instruction) -> Self {
        Self {
            opcode: Some(instruction.opcode),
            operand_a: Some(instruction.a),
            operand_b: Some(instruction.b),
        }
    }

    /// Overwrites operand A only.
    pub fn operand_a(value: i32) -> Self {
        Self {
            operand_a: Some(value),
            ..Default::default()
        }
    }

    /// Overwrites operand B only.
    pub fn operand_b(value: i32) -> Self {
        Self {
            operand_b: Some(value),
            ..Default::default()
        }
    }
}

/// Read-only view of a cell handed out to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Resolved address in `0..size`
    pub address: usize,
    pub opcode: OpCode,
    pub operand_a: i32,
    pub operand_b: i32,
    pub last_modified_by: Option<ProgramIdentity>,
    pub touched_since_placement: bool,
}

/// Fixed-length circular array of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArena {
    cells: Vec<Cell>,
    size: NonZeroUsize,
}

impl MemoryArena {
    /// Creates an arena of `size` cells, all holding `filler` with zero operands.
    pub fn new(size: NonZeroUsize, filler: OpCode) -> Self {
        Self {
            cells: vec![Cell::new(Instruction::filler(filler)); size.get()],
            size,
        }
    }

    /// Number of cells.
    pub fn size(&self) -> NonZeroUsize {
        self.size
    }

    /// Resolves an index against this arena.
    pub fn resolve(&self, index: i64) -> usize {
        addr(index, self.size)
    }

    /// Reads the cell at `index` (wrapping).
    pub fn read(&self, index: i64) -> &Cell {
        &self.cells[self.resolve(index)]
    }

    /// Applies `update` to the cell at `index` (wrapping) and records `author`
    /// as the cell's provenance.
    pub fn write(&mut self, index: i64, update: CellUpdate, author: &ProgramIdentity) {
        let slot = self.resolve(index);
        let cell = &mut self.cells[slot];
        if let Some(opcode) = update.opcode {
            cell.opcode = opcode;
        }
        if let Some(a) = update.operand_a {
            cell.operand_a = a;
        }
        if let Some(b) = update.operand_b {
            cell.operand_b = b;
        }
        cell.last_modified_by = Some(author.clone());
        cell.touched_since_placement = true;
    }

    /// Loads a script instruction during placement.
    ///
    /// Records ownership without marking the cell as touched.
    pub fn place(&mut self, index: i64, instruction: Instruction, owner: &ProgramIdentity) {
        let slot = self.resolve(index);
        let mut cell = Cell::new(instruction);
        cell.last_modified_by = Some(owner.clone());
        self.cells[slot] = cell;
    }

    /// Replaces the cell at `index` with a fresh, unowned one.
    pub(crate) fn reset_cell(&mut self, index: usize, instruction: Instruction) {
        let slot = self.resolve(index as i64);
        self.cells[slot] = Cell::new(instruction);
    }

    /// Returns a snapshot of the cell at `index`.
    pub fn snapshot(&self, index: i64) -> CellSnapshot {
        let address = self.resolve(index);
        let cell = &self.cells[address];
        CellSnapshot {
            address,
            opcode: cell.opcode,
            operand_a: cell.operand_a,
            operand_b: cell.operand_b,
            last_modified_by: cell.last_modified_by.clone(),
            touched_since_placement: cell.touched_since_placement,
        }
    }

    /// Iterates cells in address order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Counts cells whose opcode differs from `filler`.
    pub fn count_non_filler(&self, filler: OpCode) -> usize {
        self.cells.iter().filter(|c| c.opcode != filler).count()
    }
}
