//! `PMTiles` plugin for the `gpio` command line tool.
//!
//! The plugin entry point is [`register_commands`], which attaches the
//! `pmtiles` command to the host's command group. The rest of the crate is the
//! read-only archive access that command is built on.

#![forbid(unsafe_code)]

mod tile;
pub use tile::{MAX_ZOOM, TileCoord};

mod header;
pub use crate::header::{Compression, Header, TileType};

mod directory;
pub use directory::{DirEntry, Directory};

mod error;
pub use error::{PmtError, PmtResult};

mod backend;
pub use backend::{HttpBackend, MmapBackend};

pub mod async_reader;
pub use async_reader::{AsyncBackend, AsyncPmTilesReader};

pub mod commands;
pub use commands::PmtilesCommand;

mod plugin;
pub use plugin::register_commands;
