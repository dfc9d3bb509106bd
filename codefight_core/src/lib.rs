//! CodeFight Core - Circular-Arena Instruction Engine
//!
//! Several programs share one wrap-around memory arena and take turns
//! executing a fixed nine-opcode instruction set, each trying to outlast
//! the others:
//! 1. **Addressing**: every integer resolves onto the arena, so no access can fail
//! 2. **Scheduling**: a FIFO round-robin runs exactly one instruction per turn
//! 3. **Provenance**: every write records which program made it

pub mod arena;
pub mod engine;
pub mod error;
pub mod instruction_table;
pub mod opcode;
pub mod program;
pub mod registry;
pub mod scheduler;
pub mod seeder;

// Re-export key types for convenience
pub use arena::{addr, Cell, CellSnapshot, MemoryArena};
pub use engine::{Engine, EngineConfig, MatchSummary, MIN_PROGRAMS};
pub use error::{ConfigurationError, InspectError, PlacementError};
pub use instruction_table::{ArithmeticMode, InstructionTable};
pub use opcode::{Instruction, OpCode};
pub use program::{parse_script, Program, ProgramIdentity, ProgramSnapshot, ProgramSymbols};
pub use registry::ProgramHandle;
pub use scheduler::{Elimination, SchedulerState, StepBudget, StepReport};
pub use seeder::InitMode;
