//! The `pmtiles` command and its subcommands.

mod show;
mod tile;

use std::error::Error;

use clap::{ArgMatches, CommandFactory as _, FromArgMatches as _, Parser, Subcommand};
use gpio_plugin::PluginCommand;
use reqwest::Client;

#[derive(Parser, Debug)]
#[command(name = "pmtiles")]
#[command(about = "Inspect and read PMTiles archives", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect a local or remote archive
    Show(show::Args),
    /// Write a single tile to stdout or a file
    Tile(tile::Args),
}

/// The `pmtiles` command object registered by [`crate::register_commands`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PmtilesCommand;

impl PluginCommand for PmtilesCommand {
    fn name(&self) -> &'static str {
        "pmtiles"
    }

    fn command(&self) -> clap::Command {
        Args::command()
    }

    fn run(&self, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
        let args = Args::from_arg_matches(matches)?;

        // The host is synchronous, so each invocation gets its own runtime
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            match args.command {
                Commands::Show(args) => show::run(args).await,
                Commands::Tile(args) => tile::run(args).await,
            }
        })
    }
}

fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(format!("gpio-pmtiles/{}", env!("CARGO_PKG_VERSION")))
        .build()
}
