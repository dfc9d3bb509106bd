//! Registry of program templates.
//!
//! Templates outlive matches. A match only ever receives clones.

use crate::error::ConfigurationError;
use crate::opcode::Instruction;
use crate::program::{Program, ID_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Receipt returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramHandle {
    pub name: String,
    pub script_len: usize,
}

/// Named program templates, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct ProgramRegistry {
    programs: BTreeMap<u64, Program>,
    next_key: u64,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template after checking name and script against `max_len`.
    pub fn register(
        &mut self,
        name: &str,
        script: Vec<Instruction>,
        max_len: usize,
    ) -> Result<ProgramHandle, ConfigurationError> {
        if name.trim().is_empty() || name.contains(ID_SEPARATOR) {
            return Err(ConfigurationError::InvalidName(name.to_string()));
        }
        if self.contains(name) {
            return Err(ConfigurationError::DuplicateProgram(name.to_string()));
        }
        if script.is_empty() {
            return Err(ConfigurationError::EmptyScript(name.to_string()));
        }
        if script.len() > max_len {
            return Err(ConfigurationError::ScriptTooLong {
                name: name.to_string(),
                len: script.len(),
                max: max_len,
            });
        }

        let handle = ProgramHandle {
            name: name.to_string(),
            script_len: script.len(),
        };
        self.programs.insert(self.next_key, Program::new(name, script));
        self.next_key += 1;

        debug!("Registered {} ({} instructions)", handle.name, handle.script_len);
        Ok(handle)
    }

    /// Removes a template.
    pub fn unregister(&mut self, name: &str) -> Result<Program, ConfigurationError> {
        let key = self
            .programs
            .iter()
            .find(|(_, p)| p.name() == name)
            .map(|(k, _)| *k)
            .ok_or_else(|| ConfigurationError::UnknownProgram(name.to_string()))?;

        self.programs
            .remove(&key)
            .ok_or_else(|| ConfigurationError::UnknownProgram(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Program> {
        self.programs.values().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.programs.values().map(Program::name).collect()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::OpCode;

    fn script(n: usize) -> Vec<Instruction> {
        vec![Instruction::new(OpCode::Jmp, 0, 0); n]
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = ProgramRegistry::new();
        let handle = reg.register("imp", script(2), 5).unwrap();

        assert_eq!(handle, ProgramHandle { name: "imp".into(), script_len: 2 });
        assert!(reg.contains("imp"));
        assert_eq!(reg.get("imp").unwrap().script().len(), 2);
        assert!(!reg.get("imp").unwrap().is_alive());
    }

    #[test]
    fn test_names_keep_registration_order() {
        let mut reg = ProgramRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            reg.register(name, script(1), 5).unwrap();
        }
        assert_eq!(reg.names(), vec!["zeta", "alpha", "mid"]);

        reg.unregister("alpha").unwrap();
        reg.register("alpha", script(1), 5).unwrap();
        assert_eq!(reg.names(), vec!["zeta", "mid", "alpha"]);
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut reg = ProgramRegistry::new();
        for bad in ["", "  ", "a#1", "#"] {
            assert_eq!(
                reg.register(bad, script(1), 5),
                Err(ConfigurationError::InvalidName(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_rejects_duplicates_and_bad_scripts() {
        let mut reg = ProgramRegistry::new();
        reg.register("imp", script(1), 5).unwrap();

        assert_eq!(
            reg.register("imp", script(1), 5),
            Err(ConfigurationError::DuplicateProgram("imp".into()))
        );
        assert_eq!(
            reg.register("empty", vec![], 5),
            Err(ConfigurationError::EmptyScript("empty".into()))
        );
        assert_eq!(
            reg.register("long", script(6), 5),
            Err(ConfigurationError::ScriptTooLong { name: "long".into(), len: 6, max: 5 })
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unregister_unknown() {
        let mut reg = ProgramRegistry::new();
        assert_eq!(
            reg.unregister("ghost").unwrap_err(),
            ConfigurationError::UnknownProgram("ghost".into())
        );
        assert!(reg.is_empty());
    }
}
