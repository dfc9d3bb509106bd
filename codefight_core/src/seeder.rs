//! Arena seeding: filler or deterministic pseudo-random content.

use crate::arena::MemoryArena;
use crate::instruction_table::InstructionTable;
use crate::opcode::Instruction;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a fresh arena is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitMode {
    /// Every cell holds the filler opcode with zero operands
    #[default]
    Fill,

    /// Every cell is drawn from a generator seeded with `seed`
    Randomized { seed: i64 },
}

impl fmt::Display for InitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMode::Fill => write!(f, "INIT_MODE_STOP"),
            InitMode::Randomized { seed } => write!(f, "INIT_MODE_RANDOM {}", seed),
        }
    }
}

/// Fills arenas according to an [`InitMode`].
pub struct ArenaSeeder<'t> {
    table: &'t InstructionTable,
    mode: InitMode,
}

impl<'t> ArenaSeeder<'t> {
    pub fn new(table: &'t InstructionTable, mode: InitMode) -> Self {
        Self { table, mode }
    }

    /// Overwrites every cell of `arena`, clearing all provenance.
    pub fn seed(&self, arena: &mut MemoryArena) {
        match self.mode {
            InitMode::Fill => self.fill(arena),
            InitMode::Randomized { seed } => self.randomize(arena, seed),
        }
    }

    fn fill(&self, arena: &mut MemoryArena) {
        let filler = Instruction::filler(self.table.filler());
        for index in 0..arena.size().get() {
            arena.reset_cell(index, filler);
        }
    }

    /// Three draws per cell, in order: opcode index, operand A, operand B.
    /// All three are bounded by the opcode count.
    fn randomize(&self, arena: &mut MemoryArena, seed: i64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        let opcodes = self.table.opcodes();
        // u32 bounds keep the sample stream identical across platforms
        let bound = opcodes.len() as u32;

        for index in 0..arena.size().get() {
            let opcode = opcodes[rng.gen_range(0..bound) as usize];
            let a = rng.gen_range(0..bound) as i32;
            let b = rng.gen_range(0..bound) as i32;
            arena.reset_cell(index, Instruction::new(opcode, a, b));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::CellUpdate;
    use crate::opcode::OpCode;
    use crate::program::ProgramIdentity;
    use proptest::prelude::*;
    use std::num::NonZeroUsize;

    fn arena(n: usize) -> MemoryArena {
        MemoryArena::new(NonZeroUsize::new(n).unwrap(), OpCode::Stop)
    }

    #[test]
    fn test_fill_resets_everything() {
        let table = InstructionTable::standard();
        let mut a = arena(12);
        let who = ProgramIdentity::unique("w");
        a.write(3, CellUpdate::instruction(Instruction::new(OpCode::Add, 1, 2)), &who);

        ArenaSeeder::new(&table, InitMode::Fill).seed(&mut a);

        for cell in a.iter() {
            assert_eq!(cell.instruction(), Instruction::filler(OpCode::Stop));
            assert_eq!(cell.last_modified_by, None);
            assert!(!cell.touched_since_placement);
        }
    }

    #[test]
    fn test_random_operands_bounded_by_opcode_count() {
        let table = InstructionTable::standard();
        let mut a = arena(500);

        ArenaSeeder::new(&table, InitMode::Randomized { seed: 7 }).seed(&mut a);

        let bound = table.len() as i32;
        for cell in a.iter() {
            assert!((0..bound).contains(&cell.operand_a));
            assert!((0..bound).contains(&cell.operand_b));
            assert_eq!(cell.last_modified_by, None);
        }
        // 500 draws over nine opcodes hit more than one
        assert!(a.count_non_filler(OpCode::Stop) > 0);
    }

    #[test]
    fn test_different_seeds_differ() {
        let table = InstructionTable::standard();
        let mut a = arena(64);
        let mut b = arena(64);

        ArenaSeeder::new(&table, InitMode::Randomized { seed: 1 }).seed(&mut a);
        ArenaSeeder::new(&table, InitMode::Randomized { seed: 2 }).seed(&mut b);

        assert_ne!(a, b);
    }

    #[test]
    fn test_init_mode_display() {
        assert_eq!(InitMode::Fill.to_string(), "INIT_MODE_STOP");
        assert_eq!(InitMode::Randomized { seed: -12 }.to_string(), "INIT_MODE_RANDOM -12");
    }

    proptest! {
        #[test]
        fn prop_random_seeding_is_deterministic(seed in any::<i64>(), n in 1usize..300) {
            let table = InstructionTable::standard();
            let mut first = arena(n);
            let mut second = arena(n);

            ArenaSeeder::new(&table, InitMode::Randomized { seed }).seed(&mut first);
            ArenaSeeder::new(&table, InitMode::Randomized { seed }).seed(&mut second);

            prop_assert_eq!(first, second);
        }
    }
}
