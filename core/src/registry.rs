//! Command registry and scanner lookup tables.

use std::collections::HashMap;

use crate::{
    Command, CommandRef, GlobalCommand, GlobalModifierCommand, GroupCommand, SchemaError,
    SubCommand, validate_command,
};

/// Owned set of declared commands.
///
/// Every command is validated on registration, and names, short aliases and
/// joined `group:member` names are kept unique across the whole registry.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let mut registry = CommandRegistry::new();
/// registry.register(Command::Sub(SubCommand::new("build"))).unwrap();
/// registry
///     .register(Command::Modifier(GlobalModifierCommand::new(
///         GlobalCommand::new("verbose").with_alias('v'),
///         10,
///     )))
///     .unwrap();
///
/// assert_eq!(registry.len(), 2);
/// assert!(registry.find("build").is_some());
///
/// // Names are unique across command kinds
/// let err = registry.register(Command::Global(GlobalCommand::new("build"))).unwrap_err();
/// assert_eq!(err, SchemaError::DuplicateCommand("build".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a list of commands.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found.
    pub fn with_commands(commands: impl IntoIterator<Item = Command>) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for command in commands {
            registry.register(command)?;
        }
        Ok(registry)
    }

    /// Validates and adds a command.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error of the command, or a duplicate
    /// error if its name, alias or member names clash with a registered one.
    pub fn register(&mut self, command: Command) -> Result<(), SchemaError> {
        if let Some(err) = validate_command(&command).into_iter().next() {
            return Err(err);
        }

        let mut table = CommandTable::new();
        for existing in self.commands.iter().chain(std::iter::once(&command)) {
            table.insert(existing)?;
        }

        self.commands.push(command);
        Ok(())
    }

    /// All registered commands, in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finds a parseable command by name or joined `group:member` name.
    pub fn find(&self, name: &str) -> Option<CommandRef<'_>> {
        if let Some((group, member)) = name.split_once(':') {
            return self.commands.iter().find_map(|command| match command {
                Command::Group(g) if g.name == group => g
                    .members
                    .iter()
                    .find(|m| m.name == member)
                    .map(CommandRef::Sub),
                _ => None,
            });
        }
        self.commands
            .iter()
            .filter(|command| command.name() == name)
            .find_map(Command::as_command_ref)
    }

    /// Modifier commands not owned by any service provider.
    pub fn modifiers(&self) -> impl Iterator<Item = &GlobalModifierCommand> {
        self.commands.iter().filter_map(|command| match command {
            Command::Modifier(modifier) => Some(modifier),
            _ => None,
        })
    }

    /// Lookup table of sub-commands, groups and non-modifier global commands.
    pub fn command_table(&self) -> CommandTable<'_> {
        let mut table = CommandTable::new();
        for command in &self.commands {
            match command {
                Command::Sub(sub) => {
                    table.sub_commands.insert(&sub.name, sub);
                }
                Command::Group(group) => table.add_group(group),
                Command::Global(global) => table.add_global(global, CommandRef::Global(global)),
                Command::Modifier(_) => {}
            }
        }
        table
    }

    /// Lookup table of the registry's modifier commands.
    pub fn modifier_table(&self) -> CommandTable<'_> {
        let mut table = CommandTable::new();
        for modifier in self.modifiers() {
            table.add_global(&modifier.command, CommandRef::Modifier(modifier));
        }
        table
    }
}

/// Read-only lookup view over a set of commands, as consumed by the scanner.
///
/// Global and modifier commands are found by long name (`--name`) or short
/// alias (`-x`); sub-commands by plain name; group members by joined
/// `group:member` name.
///
/// # Examples
///
/// ```
/// use command_resolve_core::*;
///
/// let db = GroupCommand::new("db").with_member(SubCommand::new("migrate"));
/// let help = GlobalCommand::new("help").with_alias('h');
/// let commands = vec![Command::Group(db), Command::Global(help)];
///
/// let table = CommandTable::from_commands(&commands).unwrap();
/// assert!(table.is_group("db"));
/// assert_eq!(table.member("db:migrate").map(|(_, m)| m.name.as_str()), Some("migrate"));
/// assert_eq!(table.alias('h').map(|c| c.name()), Some("help"));
/// assert!(table.sub_command("db").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandTable<'a> {
    globals: HashMap<&'a str, CommandRef<'a>>,
    aliases: HashMap<char, CommandRef<'a>>,
    sub_commands: HashMap<&'a str, &'a SubCommand>,
    members: HashMap<String, (&'a GroupCommand, &'a SubCommand)>,
    groups: HashMap<&'a str, &'a GroupCommand>,
}

impl<'a> CommandTable<'a> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from commands, rejecting duplicate names and aliases.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateCommand`] or
    /// [`SchemaError::DuplicateCommandAlias`] on the first clash.
    pub fn from_commands(commands: impl IntoIterator<Item = &'a Command>) -> Result<Self, SchemaError> {
        let mut table = Self::new();
        for command in commands {
            table.insert(command)?;
        }
        Ok(table)
    }

    /// Builds a table from modifier commands, rejecting duplicates.
    ///
    /// # Errors
    ///
    /// See [`from_commands`](Self::from_commands).
    pub fn from_modifiers(
        modifiers: impl IntoIterator<Item = &'a GlobalModifierCommand>,
    ) -> Result<Self, SchemaError> {
        let mut table = Self::new();
        for modifier in modifiers {
            table.insert_modifier(modifier)?;
        }
        Ok(table)
    }

    /// Adds a modifier command owned outside the registry.
    ///
    /// # Errors
    ///
    /// Returns a duplicate error if its name or alias is already taken.
    pub fn insert_modifier(&mut self, modifier: &'a GlobalModifierCommand) -> Result<(), SchemaError> {
        self.insert_global(&modifier.command, CommandRef::Modifier(modifier))
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// Returns a duplicate error if any name or alias is already taken.
    pub fn insert(&mut self, command: &'a Command) -> Result<(), SchemaError> {
        match command {
            Command::Sub(sub) => {
                self.ensure_name_free(&sub.name)?;
                self.sub_commands.insert(&sub.name, sub);
            }
            Command::Group(group) => {
                self.ensure_name_free(&group.name)?;
                for member in &group.members {
                    if self.members.contains_key(&group.joined_name(member)) {
                        return Err(SchemaError::DuplicateCommand(group.joined_name(member)));
                    }
                }
                self.add_group(group);
            }
            Command::Global(global) => self.insert_global(global, CommandRef::Global(global))?,
            Command::Modifier(modifier) => {
                self.insert_global(&modifier.command, CommandRef::Modifier(modifier))?;
            }
        }
        Ok(())
    }

    fn insert_global(
        &mut self,
        global: &'a GlobalCommand,
        command: CommandRef<'a>,
    ) -> Result<(), SchemaError> {
        self.ensure_name_free(&global.name)?;
        if let Some(alias) = global.short_alias {
            if self.aliases.contains_key(&alias) {
                return Err(SchemaError::DuplicateCommandAlias(alias));
            }
        }
        self.add_global(global, command);
        Ok(())
    }

    fn ensure_name_free(&self, name: &str) -> Result<(), SchemaError> {
        if self.globals.contains_key(name)
            || self.sub_commands.contains_key(name)
            || self.groups.contains_key(name)
        {
            return Err(SchemaError::DuplicateCommand(name.to_string()));
        }
        Ok(())
    }

    fn add_global(&mut self, global: &'a GlobalCommand, command: CommandRef<'a>) {
        self.globals.insert(&global.name, command);
        if let Some(alias) = global.short_alias {
            self.aliases.insert(alias, command);
        }
    }

    fn add_group(&mut self, group: &'a GroupCommand) {
        self.groups.insert(&group.name, group);
        for member in &group.members {
            self.members.insert(group.joined_name(member), (group, member));
        }
    }

    /// Global or modifier command by long name (without `--`).
    pub fn global(&self, name: &str) -> Option<CommandRef<'a>> {
        self.globals.get(name).copied()
    }

    /// Global or modifier command by short alias (without `-`).
    pub fn alias(&self, alias: char) -> Option<CommandRef<'a>> {
        self.aliases.get(&alias).copied()
    }

    /// Sub-command by plain name.
    pub fn sub_command(&self, name: &str) -> Option<&'a SubCommand> {
        self.sub_commands.get(name).copied()
    }

    /// Group member by joined `group:member` name.
    pub fn member(&self, joined_name: &str) -> Option<(&'a GroupCommand, &'a SubCommand)> {
        self.members.get(joined_name).copied()
    }

    /// Returns `true` if `name` is a group command.
    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Returns `true` if the table holds no commands.
    pub fn is_empty(&self) -> bool {
        self.globals.is_empty() && self.sub_commands.is_empty() && self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::{GlobalArgument, OptionArgument, PrimitiveType};

    use super::*;

    fn sample_registry() -> CommandRegistry {
        CommandRegistry::with_commands([
            Command::Sub(SubCommand::new("build")),
            Command::Group(
                GroupCommand::new("db")
                    .with_member(SubCommand::new("migrate"))
                    .with_member(SubCommand::new("seed")),
            ),
            Command::Global(GlobalCommand::new("help").with_alias('h')),
            Command::Modifier(GlobalModifierCommand::new(
                GlobalCommand::new("log-level")
                    .with_alias('l')
                    .with_argument(GlobalArgument::new("level", PrimitiveType::string())),
                5,
            )),
        ])
        .unwrap()
    }

    #[test]
    fn test_register_rejects_invalid_command() {
        let mut registry = CommandRegistry::new();
        let sub = SubCommand::new("run")
            .with_option(OptionArgument::primitive("a b", PrimitiveType::string()));
        assert_eq!(
            registry.register(Command::Sub(sub)),
            Err(SchemaError::InvalidName("a b".to_string()))
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate_alias() {
        let mut registry = sample_registry();
        let err = registry
            .register(Command::Global(GlobalCommand::new("hide").with_alias('h')))
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateCommandAlias('h'));
    }

    #[test]
    fn test_tables_split_modifiers_from_commands() {
        let registry = sample_registry();

        let commands = registry.command_table();
        assert!(commands.sub_command("build").is_some());
        assert!(commands.global("help").is_some());
        assert!(commands.global("log-level").is_none());
        assert!(commands.member("db:seed").is_some());

        let modifiers = registry.modifier_table();
        assert_eq!(modifiers.alias('l').and_then(|c| c.execute_priority()), Some(5));
        assert!(modifiers.sub_command("build").is_none());
    }

    #[test]
    fn test_find_by_joined_name() {
        let registry = sample_registry();
        assert_eq!(registry.find("db:migrate").map(|c| c.name()), Some("migrate"));
        assert!(registry.find("db").is_none());
        assert!(registry.find("db:nope").is_none());
        assert_eq!(registry.find("log-level").map(|c| c.name()), Some("log-level"));
    }

    #[test]
    fn test_from_modifiers_rejects_duplicates() {
        let a = GlobalModifierCommand::new(GlobalCommand::new("trace"), 1);
        let b = GlobalModifierCommand::new(GlobalCommand::new("trace"), 2);
        assert_eq!(
            CommandTable::from_modifiers([&a, &b]).unwrap_err(),
            SchemaError::DuplicateCommand("trace".to_string())
        );
    }

    #[test]
    fn test_insert_modifier_checks_registry_names() {
        let registry = sample_registry();
        let build = GlobalModifierCommand::new(GlobalCommand::new("build"), 0);
        let hush = GlobalModifierCommand::new(GlobalCommand::new("hush").with_alias('l'), 0);
        let trace = GlobalModifierCommand::new(GlobalCommand::new("trace").with_alias('t'), 0);
        let mut table = CommandTable::from_commands(registry.commands()).unwrap();

        assert_eq!(
            table.insert_modifier(&build).unwrap_err(),
            SchemaError::DuplicateCommand("build".to_string())
        );

        assert_eq!(table.insert_modifier(&hush).unwrap_err(), SchemaError::DuplicateCommandAlias('l'));

        table.insert_modifier(&trace).unwrap();
        assert_eq!(table.alias('t').map(|c| c.name()), Some("trace"));
    }
}
