//! Round-robin turn engine.
//!
//! The scheduler owns the match-local program copies. Alive programs wait
//! in a FIFO queue; each turn pops the head, executes exactly one
//! instruction and either requeues it at the tail or records its
//! elimination. Eliminated programs stay in the roster for reporting but
//! never return to the queue.

use crate::arena::MemoryArena;
use crate::instruction_table::{ArithmeticMode, InstructionTable};
use crate::program::{Program, ProgramIdentity, ProgramSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, trace};

/// How many turns a single [`Scheduler::step`] call may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepBudget {
    /// At most this many turns
    Turns(u64),

    /// Until no program is alive
    Unbounded,
}

impl StepBudget {
    /// Maps a raw count; negative values mean unbounded.
    pub fn from_count(count: i64) -> Self {
        if count < 0 {
            StepBudget::Unbounded
        } else {
            StepBudget::Turns(count as u64)
        }
    }

    fn allows(&self, executed: u64) -> bool {
        match self {
            StepBudget::Turns(limit) => executed < *limit,
            StepBudget::Unbounded => true,
        }
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        StepBudget::Turns(1)
    }
}

/// A program leaving the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elimination {
    pub identity: ProgramIdentity,

    /// Completed rounds before the STOP that ended it
    pub final_round_counter: u32,
}

/// Outcome of one [`Scheduler::step`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Programs eliminated during this call, in order
    pub eliminations: Vec<Elimination>,

    /// Turns actually executed
    pub turns_executed: u64,
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// No match placed
    Idle,

    /// At least one program alive
    Running,

    /// Match placed, every program eliminated
    Finished,
}

/// A contiguous region of the arena assigned to one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: usize,
    pub len: usize,
}

/// Splits `size` cells into `count` evenly spaced slots.
///
/// Each slot holds `size / count` cells; the last absorbs the remainder.
pub fn plan_slots(size: usize, count: usize) -> Vec<Slot> {
    if count == 0 {
        return Vec::new();
    }
    let base = size / count;
    (0..count)
        .map(|i| {
            let start = base * i;
            let len = if i + 1 == count { size - start } else { base };
            Slot { start, len }
        })
        .collect()
}

/// The round-robin turn engine.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    /// Every placed program, in placement order
    roster: Vec<Program>,

    /// Roster indices of alive programs, head runs next
    queue: VecDeque<usize>,

    placed: bool,
    turns: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads each program's script at its pointer and queues it.
    ///
    /// Programs must already carry their match identity and start pointer.
    /// Queue order is placement order.
    pub fn place_match(&mut self, arena: &mut MemoryArena, programs: Vec<Program>) {
        self.reset();

        for program in &programs {
            let start = program.pointer() as i64;
            for (offset, instruction) in program.script().iter().enumerate() {
                arena.place(start + offset as i64, *instruction, program.identity());
            }
            debug!(
                "Placed {} ({} instructions) at {}",
                program.identity(),
                program.script().len(),
                program.pointer()
            );
        }

        self.queue = (0..programs.len()).collect();
        self.roster = programs;
        self.placed = true;

        info!("Match placed with {} programs", self.roster.len());
    }

    /// Runs turns until the budget is spent or no program is alive.
    pub fn step(
        &mut self,
        table: &InstructionTable,
        arena: &mut MemoryArena,
        budget: StepBudget,
        arithmetic: ArithmeticMode,
    ) -> StepReport {
        let mut report = StepReport::default();

        while budget.allows(report.turns_executed) {
            let Some(index) = self.queue.pop_front() else {
                break;
            };
            let program = &mut self.roster[index];

            if program.round_counter() == 0 {
                skip_leading_filler(table, arena, program);
            }

            let execution = table.execute(arena, program, arithmetic);
            trace!(
                "Turn {}: {} ran {} at {}",
                self.turns,
                program.identity(),
                execution.instruction,
                execution.at
            );

            if program.is_alive() {
                program.complete_round();
                self.queue.push_back(index);
            } else {
                info!(
                    "{} stopped after {} rounds",
                    program.identity(),
                    program.round_counter()
                );
                report.eliminations.push(Elimination {
                    identity: program.identity().clone(),
                    final_round_counter: program.round_counter(),
                });
            }

            report.turns_executed += 1;
            self.turns = self.turns.saturating_add(1);
        }

        if self.placed && self.queue.is_empty() && report.turns_executed > 0 {
            info!("Match finished after {} turns", self.turns);
        }

        report
    }

    /// Clears every placed program.
    pub fn reset(&mut self) {
        self.roster.clear();
        self.queue.clear();
        self.placed = false;
        self.turns = 0;
    }

    pub fn state(&self) -> SchedulerState {
        if !self.placed {
            SchedulerState::Idle
        } else if self.queue.is_empty() {
            SchedulerState::Finished
        } else {
            SchedulerState::Running
        }
    }

    /// Returns true while at least one program is alive.
    pub fn any_alive(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Total turns executed since placement.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Every placed program in placement order.
    pub fn roster(&self) -> &[Program] {
        &self.roster
    }

    /// Alive programs in the order they will run.
    pub fn queue(&self) -> impl Iterator<Item = &Program> {
        self.queue.iter().map(move |&i| &self.roster[i])
    }

    /// Looks up a placed program.
    pub fn find(&self, identity: &ProgramIdentity) -> Option<&Program> {
        self.roster.iter().find(|p| p.identity() == identity)
    }

    /// Builds a read-only snapshot of a placed program.
    pub fn snapshot(&self, identity: &ProgramIdentity, arena: &MemoryArena) -> Option<ProgramSnapshot> {
        self.find(identity).map(|program| ProgramSnapshot {
            identity: program.identity().clone(),
            alive: program.is_alive(),
            round_counter: program.round_counter(),
            pointer: program.pointer(),
            next_instruction: program
                .is_alive()
                .then(|| arena.read(program.pointer() as i64).instruction()),
        })
    }
}

/// On a program's first turn, steps over unowned filler STOP cells.
///
/// Cells loaded by any program carry provenance and are never skipped, so a
/// script that starts with STOP still halts. The walk is bounded by the
/// arena size.
///
/// Matches placed through [`Engine::start_match`](crate::Engine::start_match)
/// never reach this walk: every copy starts on its own loaded cell, and every
/// runtime write stamps provenance too. It only fires when a scheduler is
/// handed a copy whose pointer rests on untouched filler.
fn skip_leading_filler(table: &InstructionTable, arena: &MemoryArena, program: &mut Program) {
    let size = arena.size();
    for _ in 0..size.get() {
        let cell = arena.read(program.pointer() as i64);
        if cell.opcode != table.filler() || cell.last_modified_by.is_some() {
            return;
        }
        program.advance(1, size);
    }
}
