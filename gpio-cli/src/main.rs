use std::error::Error;
use std::process::ExitCode;

use gpio_plugin::{CommandGroup, Registrar};
use log::{debug, error};

/// Plugins compiled into this binary, registered in this order.
const PLUGINS: &[Registrar] = &[gpio_pmtiles::register_commands];

fn main() -> ExitCode {
    // Initialize logger from RUST_LOG environment variable
    // Example: RUST_LOG=debug gpio pmtiles show ...
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Command failed: {err:?}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut cli = CommandGroup::new("gpio", "GeoParquet tools with plugin commands")
        .with_version(env!("CARGO_PKG_VERSION"));
    cli.load_plugins(PLUGINS)?;
    debug!("Loaded commands: {:?}", cli.names());

    let matches = cli.command().get_matches();
    cli.dispatch(&matches)
}
