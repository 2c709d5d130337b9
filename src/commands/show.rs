//! Show subcommand
//!
//! Inspect a local or remote `PMTiles` archive.

use std::error::Error;
use std::io::{self, Write};

use clap::Parser;

use super::{http_client, is_url};
use crate::{AsyncBackend, AsyncPmTilesReader, HttpBackend, MmapBackend};

#[derive(Parser, Debug)]
#[command(about = "Inspect a local or remote archive")]
pub struct Args {
    /// Path to `PMTiles` archive (local file or HTTP URL)
    #[arg(value_name = "PATH")]
    path: String,

    /// Print only the archive metadata as JSON
    #[arg(long)]
    metadata: bool,
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout().lock();

    // Open archive (support both local files and HTTP URLs)
    if is_url(&args.path) {
        let backend = HttpBackend::try_from(http_client()?, args.path.as_str())?;
        let reader = AsyncPmTilesReader::try_from_source(backend).await?;
        print(&reader, args.metadata, &mut out).await?;
    } else {
        let backend = MmapBackend::try_from(args.path.as_str()).await?;
        let reader = AsyncPmTilesReader::try_from_source(backend).await?;
        print(&reader, args.metadata, &mut out).await?;
    }

    Ok(())
}

async fn print<B: AsyncBackend + Send + Sync>(
    reader: &AsyncPmTilesReader<B>,
    metadata_only: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    if metadata_only {
        writeln!(out, "{}", reader.get_metadata().await?)?;
    } else {
        print_archive_info(reader, out).await?;
    }
    Ok(())
}

async fn print_archive_info<B: AsyncBackend + Send + Sync>(
    reader: &AsyncPmTilesReader<B>,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let header = reader.get_header();

    writeln!(out, "pmtiles spec version: {}", header.spec_version())?;
    writeln!(out, "tile type: {}", header.tile_type.name())?;
    writeln!(
        out,
        "bounds: (long: {:.6}, lat: {:.6}) (long: {:.6}, lat: {:.6})",
        header.min_longitude, header.min_latitude, header.max_longitude, header.max_latitude
    )?;
    writeln!(out, "min zoom: {}", header.min_zoom)?;
    writeln!(out, "max zoom: {}", header.max_zoom)?;
    writeln!(
        out,
        "center: (long: {:.6}, lat: {:.6})",
        header.center_longitude, header.center_latitude
    )?;
    writeln!(out, "center zoom: {}", header.center_zoom)?;

    for (label, count) in [
        ("addressed tiles count", header.n_addressed_tiles()),
        ("tile entries count", header.n_tile_entries()),
        ("tile contents count", header.n_tile_contents()),
    ] {
        match count {
            Some(n) => writeln!(out, "{label}: {n}")?,
            None => writeln!(out, "{label}: unknown")?,
        }
    }

    writeln!(out, "clustered: {}", header.clustered())?;
    writeln!(
        out,
        "internal compression: {}",
        header.internal_compression().name()
    )?;
    writeln!(out, "tile compression: {}", header.tile_compression.name())?;

    if let Ok(metadata) = reader.get_metadata().await
        && !metadata.is_empty()
    {
        write_metadata(&metadata, out)?;
    }

    Ok(())
}

/// Writes one `key value` line per top-level metadata entry.
fn write_metadata(metadata: &str, out: &mut impl Write) -> io::Result<()> {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(metadata)
    {
        for (key, value) in obj {
            let value_str = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    "<object...>".to_string()
                }
                _ => value.to_string(),
            };
            writeln!(out, "{key} {value_str}")?;
        }
    } else {
        writeln!(out, "Expected metadata as json object but got: {metadata}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{print, write_metadata};
    use crate::AsyncPmTilesReader;
    use crate::tests::{RASTER_FILE, VECTOR_FILE};

    async fn render(file: &str, metadata_only: bool) -> String {
        let reader = AsyncPmTilesReader::new_with_path(file).await.unwrap();
        let mut out = Vec::new();
        print(&reader, metadata_only, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn show_raster() {
        let out = render(RASTER_FILE, false).await;

        assert!(out.contains("pmtiles spec version: 3\n"));
        assert!(out.contains("tile type: png\n"));
        assert!(out.contains(
            "bounds: (long: -180.000000, lat: -85.000000) (long: 180.000000, lat: 85.000000)\n"
        ));
        assert!(out.contains("min zoom: 0\nmax zoom: 1\n"));
        assert!(out.contains("addressed tiles count: 5\n"));
        assert!(out.contains("tile entries count: 4\n"));
        assert!(out.contains("clustered: true\n"));
        assert!(out.contains("internal compression: gzip\n"));
        assert!(out.contains("tile compression: none\n"));
        assert!(out.contains("name raster fixture\n"));
        assert!(out.contains("vector_layers <object...>\n"));
    }

    #[tokio::test]
    async fn show_vector() {
        let out = render(VECTOR_FILE, false).await;

        assert!(out.contains("tile type: mvt\n"));
        assert!(out.contains("tile compression: gzip\n"));
        assert!(out.contains("description gzip tiles\n"));
    }

    #[tokio::test]
    async fn metadata_only() {
        let out = render(VECTOR_FILE, true).await;

        assert!(!out.contains("tile type"));
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["description"], "gzip tiles");
    }

    #[test]
    fn metadata_values() {
        let mut out = Vec::new();
        write_metadata(r#"{"a": 1, "b": true, "c": [1], "d": {"e": 2}}"#, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "a 1\nb true\nc <object...>\nd <object...>\n"
        );
    }

    #[test]
    fn metadata_not_an_object() {
        let mut out = Vec::new();
        write_metadata("[1, 2]", &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Expected metadata as json object but got: [1, 2]\n"
        );
    }
}
