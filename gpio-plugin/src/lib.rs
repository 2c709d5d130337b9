//! Command group shared by the `gpio` host and its plugins.
//!
//! A plugin exposes a [`Registrar`] that receives the host's [`CommandGroup`]
//! and attaches one or more [`PluginCommand`]s to it. The host then builds the
//! `clap` command tree from the group and dispatches the parsed arguments back
//! to the matching command.

#![forbid(unsafe_code)]

use std::error::Error;
use std::fmt::{Debug, Formatter};

use clap::{ArgMatches, Command};
use log::debug;
use thiserror::Error;

/// A specialized [`Result`] type for command group operations.
pub type GroupResult<T> = Result<T, GroupError>;

/// Signature of a plugin entry point.
pub type Registrar = fn(&mut CommandGroup) -> GroupResult<()>;

/// Errors raised by a [`CommandGroup`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    /// A command with this name is already in the group.
    #[error("command `{0}` is already registered")]
    DuplicateCommand(String),
    /// The parsed arguments selected a command the group does not hold.
    #[error("no command named `{0}` is registered")]
    UnknownCommand(String),
    /// No subcommand was selected.
    #[error("no command given")]
    MissingCommand,
}

/// A named unit of CLI behavior that can be attached to a [`CommandGroup`].
pub trait PluginCommand: Send + Sync {
    /// Name the command is invoked by.
    fn name(&self) -> &'static str;

    /// Argument definition of the command.
    ///
    /// The group renames the returned command to [`PluginCommand::name`].
    fn command(&self) -> Command;

    /// Runs the command with the arguments `clap` matched for it.
    fn run(&self, matches: &ArgMatches) -> Result<(), Box<dyn Error>>;
}

/// A mutable, ordered collection of named commands owned by the host.
pub struct CommandGroup {
    name: &'static str,
    about: &'static str,
    version: Option<&'static str>,
    commands: Vec<Box<dyn PluginCommand>>,
}

impl Debug for CommandGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGroup")
            .field("name", &self.name)
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: &'static str, about: &'static str) -> Self {
        Self {
            name,
            about,
            version: None,
            commands: Vec::new(),
        }
    }

    /// Sets the version reported by `--version`.
    #[must_use]
    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    /// Attaches a command under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::DuplicateCommand`] if a command with the same name is
    /// already present. The group is left unchanged in that case.
    pub fn add_command(&mut self, command: Box<dyn PluginCommand>) -> GroupResult<()> {
        let name = command.name();
        if self.contains(name) {
            return Err(GroupError::DuplicateCommand(name.to_string()));
        }

        debug!("Adding command `{name}` to `{}`", self.name);
        self.commands.push(command);
        Ok(())
    }

    /// Runs each registrar against this group, in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first registrar error.
    pub fn load_plugins(&mut self, registrars: &[Registrar]) -> GroupResult<()> {
        for register in registrars {
            register(self)?;
        }
        Ok(())
    }

    /// Whether a command named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The command registered as `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn PluginCommand> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| &**c)
    }

    /// Names of all commands, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the root `clap` command with every registered command as a subcommand.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut root = Command::new(self.name)
            .about(self.about)
            .subcommand_required(true)
            .arg_required_else_help(true);
        if let Some(version) = self.version {
            root = root.version(version);
        }

        self.commands
            .iter()
            .fold(root, |root, c| root.subcommand(c.command().name(c.name())))
    }

    /// Runs the subcommand selected in `matches`.
    ///
    /// # Errors
    ///
    /// Fails if no subcommand was selected, if it is not registered, or if the
    /// command itself fails.
    pub fn dispatch(&self, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
        let (name, sub_matches) = matches.subcommand().ok_or(GroupError::MissingCommand)?;
        let command = self
            .get(name)
            .ok_or_else(|| GroupError::UnknownCommand(name.to_string()))?;

        debug!("Dispatching to `{name}`");
        command.run(sub_matches)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use clap::{Arg, ArgMatches, Command};

    use super::*;

    struct Echo {
        name: &'static str,
        runs: Arc<AtomicUsize>,
    }

    impl Echo {
        fn boxed(name: &'static str) -> Box<dyn PluginCommand> {
            Box::new(Self {
                name,
                runs: Arc::default(),
            })
        }
    }

    impl PluginCommand for Echo {
        fn name(&self) -> &'static str {
            self.name
        }

        fn command(&self) -> Command {
            Command::new("placeholder").arg(Arg::new("value").required(true))
        }

        fn run(&self, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
            assert!(matches.get_one::<String>("value").is_some());
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn group() -> CommandGroup {
        CommandGroup::new("host", "test host")
    }

    #[test]
    fn add_and_lookup() {
        let mut group = group();
        assert!(group.is_empty());

        group.add_command(Echo::boxed("a")).unwrap();
        group.add_command(Echo::boxed("b")).unwrap();

        assert_eq!(group.len(), 2);
        assert_eq!(group.names(), vec!["a", "b"]);
        assert!(group.contains("a"));
        assert!(!group.contains("c"));
        assert_eq!(group.get("b").map(PluginCommand::name), Some("b"));
    }

    #[test]
    fn duplicate_is_rejected() {
        let mut group = group();
        group.add_command(Echo::boxed("a")).unwrap();

        let err = group.add_command(Echo::boxed("a")).unwrap_err();
        assert_eq!(err, GroupError::DuplicateCommand("a".to_string()));
        assert_eq!(group.names(), vec!["a"]);
    }

    #[test]
    fn load_plugins_stops_at_first_error() {
        fn first(group: &mut CommandGroup) -> GroupResult<()> {
            group.add_command(Echo::boxed("first"))
        }
        fn second(group: &mut CommandGroup) -> GroupResult<()> {
            group.add_command(Echo::boxed("second"))
        }

        let mut group = group();
        let err = group.load_plugins(&[first, first, second]).unwrap_err();
        assert_eq!(err, GroupError::DuplicateCommand("first".to_string()));
        assert_eq!(group.names(), vec!["first"]);
    }

    #[test]
    fn subcommands_take_registered_name() {
        let mut group = group();
        group.add_command(Echo::boxed("echo")).unwrap();

        let root = group.command();
        let names: Vec<_> = root.get_subcommands().map(Command::get_name).collect();
        assert_eq!(names, vec!["echo"]);
    }

    #[test]
    fn dispatch_runs_selected_command() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut group = group();
        group
            .add_command(Box::new(Echo {
                name: "echo",
                runs: Arc::clone(&runs),
            }))
            .unwrap();
        group.add_command(Echo::boxed("other")).unwrap();

        let matches = group
            .command()
            .try_get_matches_from(["host", "echo", "hi"])
            .unwrap();
        group.dispatch(&matches).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_without_subcommand() {
        let group = group();
        let matches = Command::new("host").get_matches_from(["host"]);

        let err = group.dispatch(&matches).unwrap_err();
        assert_eq!(err.to_string(), GroupError::MissingCommand.to_string());
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        let mut group = group();
        group.add_command(Echo::boxed("echo")).unwrap();

        assert!(group.command().try_get_matches_from(["host"]).is_err());
    }
}
