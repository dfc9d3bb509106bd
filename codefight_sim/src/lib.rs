//! CodeFight Shell
//!
//! The interactive surface around `codefight_core`: startup token
//! validation, the line-oriented command shell, and text rendering of the
//! arena and its programs.
//!
//! # Usage
//!
//! ```ignore
//! use codefight_sim::{Shell, StartupConfig};
//!
//! let startup = StartupConfig::from_tokens(&["10", ".", "|", "@", "*", "A", "a", "B", "b"])?;
//! let mut shell = Shell::new(&startup)?;
//! shell.execute("add-ai imp MOV_R,0,1")?;
//! ```

pub mod render;
pub mod shell;
pub mod startup;

pub use shell::{Command, SessionSummary, Shell, ShellError, ERROR_PREFIX, WELCOME_MESSAGE};
pub use startup::{DisplaySymbols, StartupConfig, StartupError};
