use std::num::NonZeroU64;

use bytes::{Buf, Bytes};

use crate::{PmtError, PmtResult};

pub(crate) const MAX_INITIAL_BYTES: usize = 16_384;
pub(crate) const HEADER_SIZE: usize = 127;

/// Fixed-size header at the start of every v3 archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub(crate) version: u8,
    pub(crate) root_offset: u64,
    pub(crate) root_length: u64,
    pub(crate) metadata_offset: u64,
    pub(crate) metadata_length: u64,
    pub(crate) leaf_offset: u64,
    pub(crate) leaf_length: u64,
    pub(crate) data_offset: u64,
    pub(crate) data_length: u64,
    pub(crate) n_addressed_tiles: Option<NonZeroU64>,
    pub(crate) n_tile_entries: Option<NonZeroU64>,
    pub(crate) n_tile_contents: Option<NonZeroU64>,
    pub(crate) clustered: bool,
    pub(crate) internal_compression: Compression,
    /// Compression of the tile payloads.
    pub tile_compression: Compression,
    /// Format of the tile payloads.
    pub tile_type: TileType,
    /// Lowest zoom level with tiles.
    pub min_zoom: u8,
    /// Highest zoom level with tiles.
    pub max_zoom: u8,
    /// Western edge of the bounds, in degrees.
    pub min_longitude: f32,
    /// Southern edge of the bounds, in degrees.
    pub min_latitude: f32,
    /// Eastern edge of the bounds, in degrees.
    pub max_longitude: f32,
    /// Northern edge of the bounds, in degrees.
    pub max_latitude: f32,
    /// Zoom level to show first.
    pub center_zoom: u8,
    /// Longitude to show first, in degrees.
    pub center_longitude: f32,
    /// Latitude to show first, in degrees.
    pub center_latitude: f32,
}

/// Compression applied to tiles or to the internal directories and metadata.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Compression {
    /// Not declared by the archive.
    Unknown,
    /// Stored as-is.
    None,
    /// Gzip
    Gzip,
    /// Brotli
    Brotli,
    /// Zstandard
    Zstd,
}

impl Compression {
    /// Lowercase name, matching go-pmtiles output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Brotli => "brotli",
            Compression::Zstd => "zstd",
            Compression::None => "none",
            Compression::Unknown => "unknown",
        }
    }
}

impl TryFrom<u8> for Compression {
    type Error = PmtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Compression::Unknown),
            1 => Ok(Compression::None),
            2 => Ok(Compression::Gzip),
            3 => Ok(Compression::Brotli),
            4 => Ok(Compression::Zstd),
            _ => Err(PmtError::InvalidCompression),
        }
    }
}

/// Format of the tile payloads.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TileType {
    /// Not declared by the archive.
    Unknown,
    /// Mapbox Vector Tile
    Mvt,
    /// PNG image
    Png,
    /// JPEG image
    Jpeg,
    /// WebP image
    Webp,
    /// AVIF image
    Avif,
}

impl TileType {
    /// Lowercase name, matching go-pmtiles output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TileType::Mvt => "mvt",
            TileType::Png => "png",
            TileType::Jpeg => "jpeg",
            TileType::Webp => "webp",
            TileType::Avif => "avif",
            TileType::Unknown => "unknown",
        }
    }
}

impl TryFrom<u8> for TileType {
    type Error = PmtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TileType::Unknown),
            1 => Ok(TileType::Mvt),
            2 => Ok(TileType::Png),
            3 => Ok(TileType::Jpeg),
            4 => Ok(TileType::Webp),
            5 => Ok(TileType::Avif),
            _ => Err(PmtError::InvalidTileType),
        }
    }
}

static V3_MAGIC: &str = "PMTiles";
static V2_MAGIC: &str = "PM";

impl Header {
    #[expect(clippy::cast_precision_loss)]
    fn read_coordinate_part<B: Buf>(mut buf: B) -> f32 {
        buf.get_i32_le() as f32 / 10_000_000.
    }

    /// Parses the first [`HEADER_SIZE`] bytes of an archive.
    ///
    /// # Errors
    ///
    /// Fails on a wrong magic number, a pre-v3 archive, truncated input, or
    /// unknown compression or tile type values.
    pub fn try_from_bytes(mut bytes: Bytes) -> PmtResult<Self> {
        if !bytes.starts_with(V3_MAGIC.as_bytes()) {
            return Err(if bytes.starts_with(V2_MAGIC.as_bytes()) {
                PmtError::UnsupportedPmTilesVersion
            } else {
                PmtError::InvalidMagicNumber
            });
        }
        // The `get_*` calls below panic on an exhausted buffer
        if bytes.len() < HEADER_SIZE {
            return Err(PmtError::InvalidHeader);
        }
        bytes.advance(V3_MAGIC.len());

        Ok(Self {
            version: bytes.get_u8(),
            root_offset: bytes.get_u64_le(),
            root_length: bytes.get_u64_le(),
            metadata_offset: bytes.get_u64_le(),
            metadata_length: bytes.get_u64_le(),
            leaf_offset: bytes.get_u64_le(),
            leaf_length: bytes.get_u64_le(),
            data_offset: bytes.get_u64_le(),
            data_length: bytes.get_u64_le(),
            n_addressed_tiles: NonZeroU64::new(bytes.get_u64_le()),
            n_tile_entries: NonZeroU64::new(bytes.get_u64_le()),
            n_tile_contents: NonZeroU64::new(bytes.get_u64_le()),
            clustered: bytes.get_u8() == 1,
            internal_compression: bytes.get_u8().try_into()?,
            tile_compression: bytes.get_u8().try_into()?,
            tile_type: bytes.get_u8().try_into()?,
            min_zoom: bytes.get_u8(),
            max_zoom: bytes.get_u8(),
            min_longitude: Self::read_coordinate_part(&mut bytes),
            min_latitude: Self::read_coordinate_part(&mut bytes),
            max_longitude: Self::read_coordinate_part(&mut bytes),
            max_latitude: Self::read_coordinate_part(&mut bytes),
            center_zoom: bytes.get_u8(),
            center_longitude: Self::read_coordinate_part(&mut bytes),
            center_latitude: Self::read_coordinate_part(&mut bytes),
        })
    }

    /// Format version, always 3.
    #[must_use]
    pub fn spec_version(&self) -> u8 {
        self.version
    }

    /// Number of tiles the archive can return, counting each tile of a run.
    #[must_use]
    pub fn n_addressed_tiles(&self) -> Option<NonZeroU64> {
        self.n_addressed_tiles
    }

    /// Number of non-leaf directory entries.
    #[must_use]
    pub fn n_tile_entries(&self) -> Option<NonZeroU64> {
        self.n_tile_entries
    }

    /// Number of distinct tile payloads.
    #[must_use]
    pub fn n_tile_contents(&self) -> Option<NonZeroU64> {
        self.n_tile_contents
    }

    /// Whether tile data is ordered by tile ID.
    #[must_use]
    pub fn clustered(&self) -> bool {
        self.clustered
    }

    /// Compression of the directories and metadata.
    #[must_use]
    pub fn internal_compression(&self) -> Compression {
        self.internal_compression
    }
}
