//! Tile subcommand
//!
//! Write the bytes of one tile to stdout or a file.

use std::error::Error;
use std::io::{self, Write as _};
use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use log::info;

use super::{http_client, is_url};
use crate::{AsyncBackend, AsyncPmTilesReader, HttpBackend, MmapBackend, TileCoord};

#[derive(Parser, Debug)]
#[command(about = "Write a single tile to stdout or a file")]
pub struct Args {
    /// Path to `PMTiles` archive (local file or HTTP URL)
    #[arg(value_name = "PATH")]
    path: String,
    /// Zoom level
    z: u8,
    /// Tile column
    x: u32,
    /// Tile row
    y: u32,
    /// Write the tile to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Undo the archive's tile compression before writing
    #[arg(long)]
    decompress: bool,
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let coord = TileCoord::new(args.z, args.x, args.y)?;

    let tile = if is_url(&args.path) {
        let backend = HttpBackend::try_from(http_client()?, args.path.as_str())?;
        let reader = AsyncPmTilesReader::try_from_source(backend).await?;
        fetch(&reader, coord, args.decompress).await?
    } else {
        let backend = MmapBackend::try_from(args.path.as_str()).await?;
        let reader = AsyncPmTilesReader::try_from_source(backend).await?;
        fetch(&reader, coord, args.decompress).await?
    };

    let Some(tile) = tile else {
        return Err(format!("tile {coord} not found").into());
    };

    if let Some(output) = args.output {
        std::fs::write(&output, &tile)?;
        info!("Wrote {} bytes of tile {coord} to {}", tile.len(), output.display());
    } else {
        let mut out = io::stdout().lock();
        out.write_all(&tile)?;
        out.flush()?;
    }

    Ok(())
}

async fn fetch<B: AsyncBackend + Send + Sync>(
    reader: &AsyncPmTilesReader<B>,
    coord: TileCoord,
    decompress: bool,
) -> Result<Option<Bytes>, Box<dyn Error>> {
    Ok(if decompress {
        reader.get_tile_decompressed(coord).await?
    } else {
        reader.get_tile(coord).await?
    })
}
