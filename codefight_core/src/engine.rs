//! The engine facade.
//!
//! `Engine` owns the instruction table, the program registry, the arena and
//! the scheduler, and is the only surface the shell talks to. A match moves
//! through idle, running and finished; it stays placed after every program
//! has stopped until [`Engine::end_match`] or [`Engine::reset_match`].

use crate::arena::{CellSnapshot, MemoryArena};
use crate::error::{ConfigurationError, InspectError, PlacementError};
use crate::instruction_table::{ArithmeticMode, InstructionTable};
use crate::opcode::Instruction;
use crate::program::{parse_script, Program, ProgramIdentity, ProgramSnapshot, ProgramSymbols, ID_SEPARATOR, UNIQUE_ID};
use crate::registry::{ProgramHandle, ProgramRegistry};
use crate::scheduler::{plan_slots, Scheduler, SchedulerState, StepBudget, StepReport};
use crate::seeder::{ArenaSeeder, InitMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

/// Smallest number of programs a match can hold.
pub const MIN_PROGRAMS: usize = 2;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of arena cells, fixed for the lifetime of the engine
    pub arena_size: usize,

    /// How the arena is seeded before each match
    pub init_mode: InitMode,

    /// How ADD and ADD_R fold their sums
    pub arithmetic: ArithmeticMode,

    /// Symbol pairs handed to programs in placement order
    pub symbols: Vec<ProgramSymbols>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let symbols = ["A", "B", "C", "D", "E", "F", "G", "H"]
            .iter()
            .map(|s| ProgramSymbols::new(*s, s.to_lowercase()))
            .collect();
        Self {
            arena_size: 100,
            init_mode: InitMode::default(),
            arithmetic: ArithmeticMode::default(),
            symbols,
        }
    }
}

impl EngineConfig {
    /// Creates a default configuration with the given arena size.
    pub fn new(arena_size: usize) -> Self {
        Self {
            arena_size,
            ..Default::default()
        }
    }

    /// Sets the initial seeding mode.
    pub fn with_init_mode(mut self, mode: InitMode) -> Self {
        self.init_mode = mode;
        self
    }

    /// Sets the ADD/ADD_R reduction rule.
    pub fn with_arithmetic(mut self, arithmetic: ArithmeticMode) -> Self {
        self.arithmetic = arithmetic;
        self
    }

    /// Replaces the symbol palette.
    pub fn with_symbols(mut self, symbols: Vec<ProgramSymbols>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Checks the arena size and symbol palette.
    pub fn validate(&self) -> Result<NonZeroUsize, ConfigurationError> {
        let size = NonZeroUsize::new(self.arena_size)
            .filter(|n| n.get() <= i32::MAX as usize)
            .ok_or(ConfigurationError::InvalidArenaSize(self.arena_size))?;

        if self.symbols.len() < MIN_PROGRAMS {
            return Err(ConfigurationError::NotEnoughSymbols {
                required: MIN_PROGRAMS,
                actual: self.symbols.len(),
            });
        }
        Ok(size)
    }
}

/// Who was still running and who had stopped when a match ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub running: Vec<ProgramIdentity>,
    pub stopped: Vec<ProgramIdentity>,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |ids: &[ProgramIdentity]| {
            ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };

        let mut lines = Vec::new();
        if !self.running.is_empty() {
            lines.push(format!("Running AIs: {}", join(&self.running)));
        }
        if !self.stopped.is_empty() {
            lines.push(format!("Stopped AIs: {}", join(&self.stopped)));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

/// The CodeFight engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    size: NonZeroUsize,
    table: InstructionTable,
    registry: ProgramRegistry,
    arena: MemoryArena,
    scheduler: Scheduler,
}

impl Engine {
    /// Creates an engine and seeds its arena.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        let size = config.validate()?;
        let table = InstructionTable::standard();
        let mut arena = MemoryArena::new(size, table.filler());
        ArenaSeeder::new(&table, config.init_mode).seed(&mut arena);

        info!(
            "Engine ready: {} cells, {}, {:?} arithmetic",
            size, config.init_mode, config.arithmetic
        );

        Ok(Self {
            config,
            size,
            table,
            registry: ProgramRegistry::new(),
            arena,
            scheduler: Scheduler::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn arena_size(&self) -> usize {
        self.size.get()
    }

    pub fn arena(&self) -> &MemoryArena {
        &self.arena
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// True while a match is placed, finished or not.
    pub fn in_match(&self) -> bool {
        self.scheduler.state() != SchedulerState::Idle
    }

    /// Longest script a program may have: half the arena, rounded up.
    pub fn max_script_len(&self) -> usize {
        self.size.get().div_ceil(2)
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Registers a parsed script under `name`.
    pub fn register_program(
        &mut self,
        name: &str,
        script: Vec<Instruction>,
    ) -> Result<ProgramHandle, ConfigurationError> {
        if self.in_match() {
            return Err(ConfigurationError::MatchInProgress);
        }
        let handle = self.registry.register(name, script, self.max_script_len())?;
        info!("Registered program {} ({} instructions)", handle.name, handle.script_len);
        Ok(handle)
    }

    /// Parses `OP,A,B,...` text and registers it under `name`.
    pub fn register_script(&mut self, name: &str, text: &str) -> Result<ProgramHandle, ConfigurationError> {
        let script = self.parse_script(text)?;
        self.register_program(name, script)
    }

    /// Parses `OP,A,B,...` text against this engine's instruction table.
    pub fn parse_script(&self, text: &str) -> Result<Vec<Instruction>, ConfigurationError> {
        parse_script(text, &self.table)
    }

    /// Removes a registered program.
    pub fn unregister_program(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.in_match() {
            return Err(ConfigurationError::MatchInProgress);
        }
        self.registry.unregister(name)?;
        info!("Removed program {}", name);
        Ok(())
    }

    /// Registered program names in registration order.
    pub fn registered(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Changes how the arena is seeded.
    ///
    /// Returns the previous mode. The arena is re-seeded immediately.
    pub fn set_init_mode(&mut self, mode: InitMode) -> Result<InitMode, ConfigurationError> {
        if self.in_match() {
            return Err(ConfigurationError::MatchInProgress);
        }
        let previous = std::mem::replace(&mut self.config.init_mode, mode);
        self.reseed();
        info!("Init mode changed from {} to {}", previous, mode);
        Ok(previous)
    }

    // ========================================================================
    // MATCH LIFECYCLE
    // ========================================================================

    /// Places a copy of every selected program and starts the match.
    ///
    /// Selecting the same name more than once places numbered copies. On
    /// error nothing changes.
    pub fn start_match(&mut self, selected: &[&str]) -> Result<(), PlacementError> {
        if self.in_match() {
            return Err(PlacementError::MatchInProgress);
        }
        if selected.len() < MIN_PROGRAMS {
            return Err(PlacementError::TooFewPrograms {
                required: MIN_PROGRAMS,
                actual: selected.len(),
            });
        }
        if selected.len() > self.config.symbols.len() {
            return Err(PlacementError::TooManyPrograms {
                max: self.config.symbols.len(),
                actual: selected.len(),
            });
        }

        let mut templates = Vec::with_capacity(selected.len());
        for name in selected {
            if name.contains(ID_SEPARATOR) {
                return Err(PlacementError::AmbiguousSelection(name.to_string()));
            }
            let template = self
                .registry
                .get(name)
                .ok_or_else(|| PlacementError::UnknownProgram(name.to_string()))?;
            templates.push(template);
        }

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for name in selected {
            *occurrences.entry(*name).or_default() += 1;
        }

        let slots = plan_slots(self.size.get(), selected.len());
        let mut next_id: HashMap<&str, i32> = HashMap::new();
        let mut copies: Vec<Program> = Vec::with_capacity(selected.len());

        for (i, (template, slot)) in templates.iter().zip(&slots).enumerate() {
            let name = template.name();
            let id = if occurrences.get(name).copied().unwrap_or(0) > 1 {
                let counter = next_id.entry(name).or_insert(0);
                let id = *counter;
                *counter += 1;
                id
            } else {
                UNIQUE_ID
            };

            let copy = template.instantiate(id, self.config.symbols[i].clone(), slot.start);
            if copy.script().len() > slot.len {
                return Err(PlacementError::ScriptExceedsSlot {
                    label: copy.identity().to_string(),
                    len: copy.script().len(),
                    slot: slot.len,
                });
            }
            copies.push(copy);
        }

        let mut arena = MemoryArena::new(self.size, self.table.filler());
        ArenaSeeder::new(&self.table, self.config.init_mode).seed(&mut arena);
        let mut scheduler = Scheduler::new();
        scheduler.place_match(&mut arena, copies);

        if arena.count_non_filler(self.table.filler()) == 0 {
            return Err(PlacementError::NoExecutableInstruction);
        }

        self.arena = arena;
        self.scheduler = scheduler;

        let labels: Vec<String> = self.scheduler.roster().iter().map(|p| p.identity().to_string()).collect();
        info!("Match started: {}", labels.join(", "));
        Ok(())
    }

    /// Runs up to `budget` turns.
    pub fn step(&mut self, budget: StepBudget) -> StepReport {
        if !self.in_match() {
            warn!("step called with no match in progress");
            return StepReport::default();
        }

        let report = self
            .scheduler
            .step(&self.table, &mut self.arena, budget, self.config.arithmetic);

        debug!(
            "Stepped {} turns, {} eliminations",
            report.turns_executed,
            report.eliminations.len()
        );
        report
    }

    /// True while at least one program is alive.
    pub fn any_alive(&self) -> bool {
        self.scheduler.any_alive()
    }

    /// Turns executed since the match was placed.
    pub fn turns(&self) -> u64 {
        self.scheduler.turns()
    }

    /// Clears the match and re-seeds the arena under the current mode.
    pub fn reset_match(&mut self) {
        self.scheduler.reset();
        self.reseed();
        debug!("Match reset");
    }

    /// Summarizes the placed programs, then resets.
    pub fn end_match(&mut self) -> Result<MatchSummary, InspectError> {
        if !self.in_match() {
            return Err(InspectError::NoMatch);
        }

        let mut summary = MatchSummary::default();
        for program in self.scheduler.roster() {
            let identity = program.identity().clone();
            if program.is_alive() {
                summary.running.push(identity);
            } else {
                summary.stopped.push(identity);
            }
        }

        self.reset_match();
        info!(
            "Match ended: {} running, {} stopped",
            summary.running.len(),
            summary.stopped.len()
        );
        Ok(summary)
    }

    fn reseed(&mut self) {
        ArenaSeeder::new(&self.table, self.config.init_mode).seed(&mut self.arena);
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    /// Reads one cell; any integer address is valid.
    pub fn inspect_cell(&self, address: i64) -> CellSnapshot {
        self.arena.snapshot(address)
    }

    /// Reports the state of a placed program.
    pub fn inspect_program(&self, identity: &ProgramIdentity) -> Result<ProgramSnapshot, InspectError> {
        if !self.in_match() {
            return Err(InspectError::NoMatch);
        }
        self.scheduler
            .snapshot(identity, &self.arena)
            .ok_or_else(|| InspectError::not_found(identity))
    }

    /// Resolves a `name` or `name#id` label to a placed program.
    pub fn find_program(&self, label: &str) -> Result<ProgramIdentity, InspectError> {
        if !self.in_match() {
            return Err(InspectError::NoMatch);
        }
        self.scheduler
            .roster()
            .iter()
            .map(Program::identity)
            .find(|identity| identity.to_string() == label)
            .cloned()
            .ok_or_else(|| InspectError::ProgramNotFound(label.to_string()))
    }

    /// Every placed program in placement order.
    pub fn roster(&self) -> &[Program] {
        self.scheduler.roster()
    }

    /// Alive programs in the order they will run.
    pub fn queue(&self) -> impl Iterator<Item = &Program> {
        self.scheduler.queue()
    }

    /// Looks up the placed program carrying `identity`.
    pub fn placed(&self, identity: &ProgramIdentity) -> Option<&Program> {
        self.scheduler.find(identity)
    }
}

// ============================================================================
// TESTS
// ============================================================================
