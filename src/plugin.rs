use gpio_plugin::{CommandGroup, GroupResult};

use crate::PmtilesCommand;

/// Registers the `pmtiles` command with the host's command group.
///
/// This is the plugin entry point and has the [`gpio_plugin::Registrar`] signature.
///
/// # Errors
///
/// Passes on whatever the group reports, such as a `pmtiles` command that is
/// already registered.
pub fn register_commands(group: &mut CommandGroup) -> GroupResult<()> {
    group.add_command(Box::new(PmtilesCommand))
}
