//! Line-oriented command shell.
//!
//! Each input line is one command followed by space-separated arguments.
//! Commands are gated on whether a match is in progress, parsed into a
//! [`Command`], then run against the [`Engine`].

use crate::render;
use crate::startup::{DisplaySymbols, StartupConfig};
use codefight_core::{
    ConfigurationError, Engine, InitMode, InspectError, PlacementError, ProgramSnapshot, StepBudget,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Smallest seed accepted by `set-init-mode`.
pub const MIN_SEED: i64 = -1337;

/// Largest seed accepted by `set-init-mode`.
pub const MAX_SEED: i64 = 1337;

/// Prefix printed before every error line.
pub const ERROR_PREFIX: &str = "Error, ";

/// Printed once at startup.
pub const WELCOME_MESSAGE: &str = "Welcome to CodeFight 2024. Enter 'help' for more details.";

const INIT_MODE_STOP: &str = "INIT_MODE_STOP";
const INIT_MODE_RANDOM: &str = "INIT_MODE_RANDOM";

// ============================================================================
// ERRORS
// ============================================================================

/// Errors reported to the user. None of them ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("command '{0}' not found!")]
    UnknownCommand(String),

    #[error("wrong number of arguments for command '{0}'!")]
    WrongArgumentCount(String),

    #[error("the game must be running to use the command '{0}'!")]
    RequiresRunning(String),

    #[error("the game must be stopped to use the command '{0}'!")]
    RequiresStopped(String),

    #[error("'{value}' is not a valid argument for '{command}'")]
    InvalidArgument { command: String, value: String },

    #[error("the position {position} is not within the storage size {size}!")]
    PositionOutOfRange { position: usize, size: usize },

    #[error("the entered init type '{0}' does not exist!")]
    UnknownInitMode(String),

    #[error("the seed {0} is outside {}..={}", MIN_SEED, MAX_SEED)]
    SeedOutOfRange(i64),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Inspect(#[from] InspectError),
}

// ============================================================================
// COMMANDS
// ============================================================================

/// When a command may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Running,
    Stopped,
    Always,
}

impl Requirement {
    fn describe(&self) -> &'static str {
        match self {
            Requirement::Running => "This command can only be used while the game is running.",
            Requirement::Stopped => "This command can only be used while the game is stopped.",
            Requirement::Always => "This command can always be used.",
        }
    }
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddAi { name: String, script: String },
    RemoveAi { name: String },
    SetInitMode(InitMode),
    StartGame(Vec<String>),
    Next(StepBudget),
    ShowMemory(Option<usize>),
    ShowAi(String),
    EndGame,
    Help,
    Quit,
}

/// Command names in alphabetical order, as listed by `help`.
pub const COMMAND_NAMES: [&str; 10] = [
    "add-ai",
    "end-game",
    "help",
    "next",
    "quit",
    "remove-ai",
    "set-init-mode",
    "show-ai",
    "show-memory",
    "start-game",
];

fn requirement_of(name: &str) -> Requirement {
    match name {
        "add-ai" | "remove-ai" | "set-init-mode" | "start-game" => Requirement::Stopped,
        "next" | "show-memory" | "show-ai" | "end-game" => Requirement::Running,
        _ => Requirement::Always,
    }
}

fn description_of(name: &str) -> &'static str {
    match name {
        "add-ai" => "adds a uniquely named AI. Arguments: [Name] [Command name],[int],[int],...",
        "remove-ai" => "removes a previously added AI. Arguments: [Name]",
        "set-init-mode" => "chooses how the storage is filled: INIT_MODE_STOP or INIT_MODE_RANDOM [seed].",
        "start-game" => "starts a new game with at least two previously added AIs.",
        "next" => "runs the given number of steps, one if omitted; a negative number runs until every AI stopped.",
        "show-memory" => "shows an overview of the storage, or a detailed view starting at the given position.",
        "show-ai" => "shows the status of a playing AI. Arguments: [Name] or [Name]#[id]",
        "end-game" => "ends the running game and lists running and stopped AIs.",
        "help" => "lists the commands available right now.",
        "quit" => "quits the program.",
        _ => "",
    }
}

impl Command {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Self, ShellError> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let arity = |n: usize| {
            if args.len() == n {
                Ok(())
            } else {
                Err(ShellError::WrongArgumentCount(name.to_string()))
            }
        };

        match name {
            "add-ai" => {
                arity(2)?;
                Ok(Command::AddAi {
                    name: args[0].to_string(),
                    script: args[1].to_string(),
                })
            }
            "remove-ai" => {
                arity(1)?;
                Ok(Command::RemoveAi { name: args[0].to_string() })
            }
            "set-init-mode" => parse_init_mode(name, &args).map(Command::SetInitMode),
            "start-game" => {
                if args.is_empty() {
                    return Err(ShellError::WrongArgumentCount(name.to_string()));
                }
                Ok(Command::StartGame(args.iter().map(|s| s.to_string()).collect()))
            }
            "next" => match args.as_slice() {
                [] => Ok(Command::Next(StepBudget::Turns(1))),
                [count] => parse_number::<i64>(name, count).map(|n| Command::Next(StepBudget::from_count(n))),
                _ => Err(ShellError::WrongArgumentCount(name.to_string())),
            },
            "show-memory" => match args.as_slice() {
                [] => Ok(Command::ShowMemory(None)),
                [position] => parse_number::<usize>(name, position).map(|p| Command::ShowMemory(Some(p))),
                _ => Err(ShellError::WrongArgumentCount(name.to_string())),
            },
            "show-ai" => {
                arity(1)?;
                Ok(Command::ShowAi(args[0].to_string()))
            }
            "end-game" => arity(0).map(|_| Command::EndGame),
            "help" => arity(0).map(|_| Command::Help),
            "quit" => arity(0).map(|_| Command::Quit),
            other => Err(ShellError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AddAi { .. } => "add-ai",
            Command::RemoveAi { .. } => "remove-ai",
            Command::SetInitMode(_) => "set-init-mode",
            Command::StartGame(_) => "start-game",
            Command::Next(_) => "next",
            Command::ShowMemory(_) => "show-memory",
            Command::ShowAi(_) => "show-ai",
            Command::EndGame => "end-game",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }

    pub fn requirement(&self) -> Requirement {
        requirement_of(self.name())
    }
}

fn parse_number<T: std::str::FromStr>(command: &str, value: &str) -> Result<T, ShellError> {
    value.parse().map_err(|_| ShellError::InvalidArgument {
        command: command.to_string(),
        value: value.to_string(),
    })
}

fn parse_init_mode(command: &str, args: &[&str]) -> Result<InitMode, ShellError> {
    match args {
        [INIT_MODE_STOP] => Ok(InitMode::Fill),
        [INIT_MODE_RANDOM, seed] => {
            let seed: i64 = parse_number(command, seed)?;
            if !(MIN_SEED..=MAX_SEED).contains(&seed) {
                return Err(ShellError::SeedOutOfRange(seed));
            }
            Ok(InitMode::Randomized { seed })
        }
        [INIT_MODE_STOP, ..] | [INIT_MODE_RANDOM, ..] | [] => {
            Err(ShellError::WrongArgumentCount(command.to_string()))
        }
        [mode, ..] => Err(ShellError::UnknownInitMode(mode.to_string())),
    }
}

// ============================================================================
// SHELL
// ============================================================================

/// Machine-readable session state, printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub arena_size: usize,
    pub init_mode: InitMode,
    pub registered: Vec<String>,
    pub in_match: bool,
    pub turns: u64,
    pub programs: Vec<ProgramSnapshot>,
}

/// The interactive session.
pub struct Shell {
    engine: Engine,
    display: DisplaySymbols,

    /// Upper bound applied to unbounded `next` calls
    turn_cap: Option<u64>,

    running: bool,
}

impl Shell {
    /// Builds a session from validated startup tokens.
    pub fn new(startup: &StartupConfig) -> Result<Self, ShellError> {
        let engine = Engine::new(startup.engine_config())?;
        Ok(Self::with_engine(engine, startup.display.clone()))
    }

    /// Wraps an existing engine.
    pub fn with_engine(engine: Engine, display: DisplaySymbols) -> Self {
        Self {
            engine,
            display,
            turn_cap: None,
            running: true,
        }
    }

    /// Caps how many turns `next -1` may run.
    pub fn with_turn_cap(mut self, cap: Option<u64>) -> Self {
        self.turn_cap = cap;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// False once `quit` ran.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs one input line. `Ok(None)` means nothing to print.
    pub fn execute(&mut self, line: &str) -> Result<Option<String>, ShellError> {
        let command = Command::parse(line)?;
        self.check_requirement(&command)?;
        debug!("Executing {:?}", command);
        self.run(command)
    }

    fn check_requirement(&self, command: &Command) -> Result<(), ShellError> {
        let in_match = self.engine.in_match();
        match command.requirement() {
            Requirement::Running if !in_match => Err(ShellError::RequiresRunning(command.name().to_string())),
            Requirement::Stopped if in_match => Err(ShellError::RequiresStopped(command.name().to_string())),
            _ => Ok(()),
        }
    }

    fn run(&mut self, command: Command) -> Result<Option<String>, ShellError> {
        match command {
            Command::AddAi { name, script } => {
                let handle = self.engine.register_script(&name, &script)?;
                Ok(Some(handle.name))
            }
            Command::RemoveAi { name } => {
                self.engine.unregister_program(&name)?;
                Ok(Some(name))
            }
            Command::SetInitMode(mode) => {
                let previous = self.engine.set_init_mode(mode)?;
                if previous == InitMode::Fill && mode == InitMode::Fill {
                    return Ok(None);
                }
                Ok(Some(format!("Changed init mode from {} to {}", previous, mode)))
            }
            Command::StartGame(names) => {
                let selected: Vec<&str> = names.iter().map(String::as_str).collect();
                self.engine.start_match(&selected)?;
                Ok(Some("Game started.".to_string()))
            }
            Command::Next(budget) => {
                let budget = match (budget, self.turn_cap) {
                    (StepBudget::Unbounded, Some(cap)) => StepBudget::Turns(cap),
                    (budget, _) => budget,
                };
                let report = self.engine.step(budget);
                if report.eliminations.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(render::render_eliminations(&report.eliminations)))
                }
            }
            Command::ShowMemory(None) => Ok(Some(render::render_overview(&self.engine, &self.display))),
            Command::ShowMemory(Some(position)) => {
                let size = self.engine.arena_size();
                if position >= size {
                    return Err(ShellError::PositionOutOfRange { position, size });
                }
                Ok(Some(render::render_detail(&self.engine, &self.display, position)))
            }
            Command::ShowAi(label) => {
                let identity = self.engine.find_program(&label)?;
                let snapshot = self.engine.inspect_program(&identity)?;
                Ok(Some(render::render_program(&snapshot)))
            }
            Command::EndGame => {
                let summary = self.engine.end_match()?;
                Ok(Some(summary.to_string()))
            }
            Command::Help => Ok(Some(self.help())),
            Command::Quit => {
                info!("Quitting");
                self.running = false;
                Ok(None)
            }
        }
    }

    /// Descriptions of the commands usable in the current state.
    fn help(&self) -> String {
        let in_match = self.engine.in_match();
        COMMAND_NAMES
            .iter()
            .filter(|name| match requirement_of(name) {
                Requirement::Running => in_match,
                Requirement::Stopped => !in_match,
                Requirement::Always => true,
            })
            .map(|name| format!("{}: {} {}", name, requirement_of(name).describe(), description_of(name)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Current session state.
    pub fn summary(&self) -> SessionSummary {
        let programs = self
            .engine
            .roster()
            .iter()
            .filter_map(|p| self.engine.inspect_program(p.identity()).ok())
            .collect();

        SessionSummary {
            arena_size: self.engine.arena_size(),
            init_mode: self.engine.config().init_mode,
            registered: self.engine.registered().iter().map(|s| s.to_string()).collect(),
            in_match: self.engine.in_match(),
            turns: self.engine.turns(),
            programs,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
