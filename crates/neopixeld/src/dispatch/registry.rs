//! Name-to-command lookup built once at startup.

use std::collections::BTreeMap;

use tracing::debug;

use neopixel_wire::CommandEnvelope;

use super::DISPATCH_TARGET;
use super::command::{Command, CommandKind};
use super::errors::{DispatchError, RegistryError};

/// Read-only map from wire names to command kinds.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, CommandKind>,
}

impl CommandRegistry {
    /// Registers every built-in command.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommandName`] if two built-ins share
    /// a name.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_kinds(&CommandKind::ALL)
    }

    /// Registers `kinds` in order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommandName`] when a name is
    /// registered twice.
    pub fn from_kinds(kinds: &[CommandKind]) -> Result<Self, RegistryError> {
        let mut commands = BTreeMap::new();
        for kind in kinds {
            let name = kind.command_name();
            if commands.insert(name, *kind).is_some() {
                return Err(RegistryError::DuplicateCommandName { name });
            }
        }
        debug!(
            target: DISPATCH_TARGET,
            commands = ?commands.keys().collect::<Vec<_>>(),
            "command registry built"
        );
        Ok(Self { commands })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Resolves `envelope` to a validated command without running it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownCommand`] for unregistered names and
    /// [`DispatchError::Arguments`] when the arguments are invalid.
    pub fn build_command(&self, envelope: &CommandEnvelope) -> Result<Command, DispatchError> {
        let kind = self
            .commands
            .get(envelope.name.as_str())
            .copied()
            .ok_or_else(|| DispatchError::UnknownCommand {
                name: envelope.name.clone(),
            })?;
        kind.build(envelope).map_err(|source| DispatchError::Arguments {
            command: kind.command_name(),
            source,
        })
    }
}
