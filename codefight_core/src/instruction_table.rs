//! The instruction table: opcode registry and per-opcode semantics.
//!
//! Every behavior is a total function of the arena and the executing
//! program. Addresses are computed in `i64` and wrapped by the arena, and
//! arithmetic results are folded back by [`ArithmeticMode::reduce`], so no
//! instruction can fail or panic.
//!
//! # Semantics
//!
//! `P` is the executing program's pointer, `A`/`B` the operands of the cell
//! at `P`.
//!
//! ```text
//! STOP   toggle alive                                   pointer unchanged
//! MOV_R  cell(P+B) := cell(P+A)                         +1
//! MOV_I  cell(P+B + cell(P+B).B) := cell(P+A)           +1
//! ADD    cell(P).B := A + B                             +1
//! ADD_R  cell(P+B).B := A + cell(P+B).B                 +1
//! JMP    pointer := P+A                                 absolute
//! JMZ    if cell(P+B).B == 0 { pointer := P+A }         else +1
//! CMP    if cell(P+A).A != cell(P+B).B { skip one }     +1 or +2
//! SWAP   cell(P+A).A <-> cell(P+B).B                    +1
//! ```

use crate::arena::{CellUpdate, MemoryArena};
use crate::error::ConfigurationError;
use crate::opcode::{Instruction, OpCode};
use crate::program::Program;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// How ADD and ADD_R fold a widened sum back into an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArithmeticMode {
    /// Result is the sum modulo the arena size, in `0..size`
    #[default]
    ArenaModulo,

    /// Result wraps around the signed 32-bit range
    Wrapping,
}

impl ArithmeticMode {
    /// Folds `sum` into the operand domain.
    pub fn reduce(self, sum: i64, size: NonZeroUsize) -> i32 {
        match self {
            ArithmeticMode::ArenaModulo => sum.rem_euclid(size.get() as i64) as i32,
            ArithmeticMode::Wrapping => sum as i32,
        }
    }
}

/// Result of executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// Address the instruction was fetched from
    pub at: usize,

    /// Instruction that ran
    pub instruction: Instruction,
}

/// Immutable registry of the nine opcodes.
///
/// Built once per engine and passed by reference to everything that needs
/// to resolve mnemonics or enumerate opcodes.
#[derive(Debug, Clone)]
pub struct InstructionTable {
    opcodes: Vec<OpCode>,
    by_name: HashMap<&'static str, OpCode>,
    filler: OpCode,
}

impl InstructionTable {
    /// The standard table with STOP as filler.
    pub fn standard() -> Self {
        let opcodes = OpCode::ALL.to_vec();
        let by_name = opcodes.iter().map(|op| (op.mnemonic(), *op)).collect();
        Self {
            opcodes,
            by_name,
            filler: OpCode::Stop,
        }
    }

    /// Resolves a mnemonic.
    pub fn resolve(&self, name: &str) -> Result<OpCode, ConfigurationError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownOpcode(name.to_string()))
    }

    /// Opcodes in declaration order.
    pub fn opcodes(&self) -> &[OpCode] {
        &self.opcodes
    }

    /// Number of opcodes.
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Opcode used to fill unused cells.
    pub fn filler(&self) -> OpCode {
        self.filler
    }

    /// Executes the instruction at `program`'s pointer.
    pub fn execute(
        &self,
        arena: &mut MemoryArena,
        program: &mut Program,
        arithmetic: ArithmeticMode,
    ) -> Execution {
        let size = arena.size();
        let at = program.pointer();
        let p = at as i64;
        let current = arena.read(p).instruction();
        let a = current.a as i64;
        let b = current.b as i64;
        let author = program.identity().clone();

        match current.opcode {
            OpCode::Stop => {
                program.toggle_alive();
            }
            OpCode::MovR => {
                let source = arena.read(p + a).instruction();
                arena.write(p + b, CellUpdate::instruction(source), &author);
                program.advance(1, size);
            }
            OpCode::MovI => {
                let source = arena.read(p + a).instruction();
                let intermediate = p + b;
                let target = intermediate + arena.read(intermediate).operand_b as i64;
                arena.write(target, CellUpdate::instruction(source), &author);
                program.advance(1, size);
            }
            OpCode::Add => {
                let result = arithmetic.reduce(a + b, size);
                arena.write(p, CellUpdate::operand_b(result), &author);
                program.advance(1, size);
            }
            OpCode::AddR => {
                let target = p + b;
                let sum = a + arena.read(target).operand_b as i64;
                let result = arithmetic.reduce(sum, size);
                arena.write(target, CellUpdate::operand_b(result), &author);
                program.advance(1, size);
            }
            OpCode::Jmp => {
                program.jump_to(p + a, size);
            }
            OpCode::Jmz => {
                if arena.read(p + b).operand_b == 0 {
                    program.jump_to(p + a, size);
                } else {
                    program.advance(1, size);
                }
            }
            OpCode::Cmp => {
                let first = arena.read(p + a).operand_a;
                let second = arena.read(p + b).operand_b;
                let step = if first != second { 2 } else { 1 };
                program.advance(step, size);
            }
            OpCode::Swap => {
                let first = p + a;
                let second = p + b;
                let first_a = arena.read(first).operand_a;
                let second_b = arena.read(second).operand_b;
                arena.write(first, CellUpdate::operand_a(second_b), &author);
                arena.write(second, CellUpdate::operand_b(first_a), &author);
                program.advance(1, size);
            }
        }

        Execution {
            at,
            instruction: current,
        }
    }
}

impl Default for InstructionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{ProgramIdentity, ProgramSymbols, UNIQUE_ID};

    const SIZE: usize = 10;

    fn size() -> NonZeroUsize {
        NonZeroUsize::new(SIZE).unwrap()
    }

    /// Arena of STOP filler with `code` placed from address `start`.
    fn setup(code: &[Instruction], start: usize) -> (MemoryArena, Program) {
        let mut arena = MemoryArena::new(size(), OpCode::Stop);
        let program = Program::new("t", code.to_vec())
            .instantiate(UNIQUE_ID, ProgramSymbols::new("T", "t"), start);
        for (offset, instr) in code.iter().enumerate() {
            arena.place((start + offset) as i64, *instr, program.identity());
        }
        (arena, program)
    }

    fn run(arena: &mut MemoryArena, program: &mut Program) -> Execution {
        InstructionTable::standard().execute(arena, program, ArithmeticMode::default())
    }

    #[test]
    fn test_table_lists_nine_opcodes() {
        let table = InstructionTable::standard();
        assert_eq!(table.len(), 9);
        assert_eq!(table.opcodes()[0], OpCode::Stop);
        assert_eq!(table.filler(), OpCode::Stop);
        assert_eq!(table.resolve("ADD_R").unwrap(), OpCode::AddR);
        assert!(table.resolve("HALT").is_err());
    }

    #[test]
    fn test_stop_toggles_alive() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Stop, 3, 4)], 2);
        let before = arena.clone();

        run(&mut arena, &mut program);

        assert!(!program.is_alive());
        assert_eq!(program.pointer(), 2);
        assert_eq!(arena, before);
    }

    #[test]
    fn test_mov_r_copies_triple() {
        let code = [
            Instruction::new(OpCode::MovR, 1, 3),
            Instruction::new(OpCode::Add, 7, -2),
        ];
        let (mut arena, mut program) = setup(&code, 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(3).instruction(), Instruction::new(OpCode::Add, 7, -2));
        assert_eq!(arena.read(3).last_modified_by.as_ref(), Some(program.identity()));
        assert!(arena.read(3).touched_since_placement);
        assert_eq!(program.pointer(), 1);
    }

    #[test]
    fn test_mov_r_self_copy_wraps() {
        // The classic imp: MOV_R 0 1 copies itself forward
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::MovR, 0, 1)], 9);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(0).instruction(), Instruction::new(OpCode::MovR, 0, 1));
        assert_eq!(program.pointer(), 0);
    }

    #[test]
    fn test_mov_i_follows_intermediate() {
        let code = [
            Instruction::new(OpCode::MovI, 2, 1),
            Instruction::new(OpCode::Jmp, 0, 4), // intermediate: B=4 → target 1+4=5
            Instruction::new(OpCode::Swap, 8, 9), // source
        ];
        let (mut arena, mut program) = setup(&code, 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(5).instruction(), Instruction::new(OpCode::Swap, 8, 9));
        assert_eq!(arena.read(5).last_modified_by.as_ref(), Some(program.identity()));
        assert!(arena.read(5).touched_since_placement);
        assert!(!arena.read(1).touched_since_placement);
        assert_eq!(program.pointer(), 1);
    }

    #[test]
    fn test_add_reduces_modulo_arena() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Add, 8, 5)], 0);

        run(&mut arena, &mut program);

        // (8 + 5) mod 10
        assert_eq!(arena.read(0).operand_b, 3);
        assert_eq!(arena.read(0).operand_a, 8);
        assert_eq!(arena.read(0).last_modified_by.as_ref(), Some(program.identity()));
        assert!(arena.read(0).touched_since_placement);
        assert_eq!(program.pointer(), 1);
    }

    #[test]
    fn test_add_negative_sum_is_non_negative() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Add, -4, 1)], 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(0).operand_b, 7);
    }

    #[test]
    fn test_add_wrapping_mode() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Add, i32::MAX, 1)], 0);

        InstructionTable::standard().execute(&mut arena, &mut program, ArithmeticMode::Wrapping);

        assert_eq!(arena.read(0).operand_b, i32::MIN);
    }

    #[test]
    fn test_add_overflow_is_total_in_arena_mode() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Add, i32::MAX, i32::MAX)], 0);

        run(&mut arena, &mut program);

        let expected = ((i32::MAX as i64) * 2).rem_euclid(SIZE as i64) as i32;
        assert_eq!(arena.read(0).operand_b, expected);
    }

    #[test]
    fn test_add_r_targets_relative_cell() {
        let code = [
            Instruction::new(OpCode::AddR, 4, 2),
            Instruction::new(OpCode::Stop, 0, 0),
            Instruction::new(OpCode::Jmp, 0, 3),
        ];
        let (mut arena, mut program) = setup(&code, 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(2).operand_b, 7);
        assert_eq!(arena.read(2).opcode, OpCode::Jmp);
        assert_eq!(arena.read(2).last_modified_by.as_ref(), Some(program.identity()));
        assert!(arena.read(2).touched_since_placement);

        // the executing cell itself is left alone
        assert_eq!(arena.read(0).operand_b, 2);
        assert!(!arena.read(0).touched_since_placement);
        assert_eq!(program.pointer(), 1);
    }

    #[test]
    fn test_jmp_relative() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Jmp, -3, 0)], 1);

        run(&mut arena, &mut program);

        assert_eq!(program.pointer(), 8);
        assert_eq!(arena.read(8).last_modified_by, None);
    }

    #[test]
    fn test_jmp_zero_is_noop() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Jmp, 0, 9)], 4);
        let before = arena.clone();

        for _ in 0..5 {
            run(&mut arena, &mut program);
            assert_eq!(program.pointer(), 4);
        }
        assert!(program.is_alive());
        assert_eq!(arena, before);
    }

    #[test]
    fn test_jmz_taken_jumps_without_extra_advance() {
        // check cell = P+1 whose B is 0
        let code = [
            Instruction::new(OpCode::Jmz, 5, 1),
            Instruction::new(OpCode::Add, 3, 0),
        ];
        let (mut arena, mut program) = setup(&code, 0);
        let before = arena.clone();

        run(&mut arena, &mut program);

        assert_eq!(program.pointer(), 5);
        assert_eq!(arena, before);
    }

    #[test]
    fn test_jmz_not_taken_advances_once() {
        let code = [
            Instruction::new(OpCode::Jmz, 5, 1),
            Instruction::new(OpCode::Add, 3, 2),
        ];
        let (mut arena, mut program) = setup(&code, 0);
        let before = arena.clone();

        run(&mut arena, &mut program);

        assert_eq!(program.pointer(), 1);
        assert_eq!(arena, before);
    }

    #[test]
    fn test_cmp_match_advances_once() {
        // first = P+1 (A = 6), second = P+2 (B = 6)
        let code = [
            Instruction::new(OpCode::Cmp, 1, 2),
            Instruction::new(OpCode::Add, 6, 0),
            Instruction::new(OpCode::Add, 0, 6),
        ];
        let (mut arena, mut program) = setup(&code, 0);
        let before = arena.clone();

        run(&mut arena, &mut program);

        assert_eq!(program.pointer(), 1);
        assert_eq!(arena, before);
    }

    #[test]
    fn test_cmp_mismatch_skips_one() {
        let code = [
            Instruction::new(OpCode::Cmp, 1, 2),
            Instruction::new(OpCode::Add, 6, 0),
            Instruction::new(OpCode::Add, 0, 5),
        ];
        let (mut arena, mut program) = setup(&code, 8);

        run(&mut arena, &mut program);

        assert_eq!(program.pointer(), 0);
    }

    #[test]
    fn test_swap_exchanges_a_and_b() {
        let code = [
            Instruction::new(OpCode::Swap, 1, 2),
            Instruction::new(OpCode::Add, 11, 12),
            Instruction::new(OpCode::Add, 21, 22),
        ];
        let (mut arena, mut program) = setup(&code, 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(1).instruction(), Instruction::new(OpCode::Add, 22, 12));
        assert_eq!(arena.read(2).instruction(), Instruction::new(OpCode::Add, 21, 11));
        for address in [1, 2] {
            let cell = arena.read(address);
            assert_eq!(cell.last_modified_by.as_ref(), Some(program.identity()));
            assert!(cell.touched_since_placement);
        }
        assert!(!arena.read(0).touched_since_placement);
        assert_eq!(program.pointer(), 1);
    }

    #[test]
    fn test_swap_same_cell() {
        let code = [
            Instruction::new(OpCode::Swap, 1, 1),
            Instruction::new(OpCode::Add, 3, 4),
        ];
        let (mut arena, mut program) = setup(&code, 0);

        run(&mut arena, &mut program);

        assert_eq!(arena.read(1).instruction(), Instruction::new(OpCode::Add, 4, 3));
    }

    #[test]
    fn test_control_opcodes_leave_arena_untouched() {
        for op in [OpCode::Stop, OpCode::Jmp, OpCode::Jmz, OpCode::Cmp] {
            for &(a, b) in &[(0, 0), (1, 2), (-3, 7)] {
                let code = [Instruction::new(op, a, b), Instruction::new(OpCode::Add, 0, 4)];
                let (mut arena, mut program) = setup(&code, 5);
                let before = arena.clone();

                run(&mut arena, &mut program);

                assert_eq!(arena, before, "{} {} {}", op, a, b);
            }
        }
    }

    #[test]
    fn test_extreme_operands_never_panic() {
        let table = InstructionTable::standard();
        for op in OpCode::ALL {
            for &(a, b) in &[(i32::MAX, i32::MAX), (i32::MIN, i32::MIN), (i32::MAX, i32::MIN)] {
                let (mut arena, mut program) = setup(&[Instruction::new(op, a, b)], 3);
                for mode in [ArithmeticMode::ArenaModulo, ArithmeticMode::Wrapping] {
                    let mut arena = arena.clone();
                    let mut program = program.clone();
                    table.execute(&mut arena, &mut program, mode);
                    assert!(program.pointer() < SIZE);
                }
                table.execute(&mut arena, &mut program, ArithmeticMode::default());
            }
        }
    }

    #[test]
    fn test_execution_reports_fetch() {
        let (mut arena, mut program) = setup(&[Instruction::new(OpCode::Jmp, 2, 0)], 6);

        let exec = run(&mut arena, &mut program);

        assert_eq!(exec.at, 6);
        assert_eq!(exec.instruction, Instruction::new(OpCode::Jmp, 2, 0));
        assert_eq!(program.identity(), &ProgramIdentity::unique("t"));
    }
}
