use std::string::FromUtf8Error;

use thiserror::Error;

use crate::Compression;

/// A specialized [`Result`] type for `PMTiles` operations.
pub type PmtResult<T> = Result<T, PmtError>;

/// Errors that can occur while reading `PMTiles` archives.
#[derive(Debug, Error)]
pub enum PmtError {
    /// The data does not start with the archive magic.
    #[error("Invalid magic number")]
    InvalidMagicNumber,
    /// A pre-v3 archive.
    #[error("Invalid PMTiles version")]
    UnsupportedPmTilesVersion,
    /// A compression byte outside the known values.
    #[error("Invalid compression")]
    InvalidCompression,
    /// A known compression this crate cannot decode.
    #[error("Unsupported compression {0:?}")]
    UnsupportedCompression(Compression),
    /// A directory entry or byte range that does not fit the archive.
    #[error("Invalid PMTiles entry")]
    InvalidEntry,
    /// A truncated header or out-of-range header offsets.
    #[error("Invalid header")]
    InvalidHeader,
    /// Metadata that is not UTF-8.
    #[error("Invalid metadata UTF-8 encoding: {0}")]
    InvalidMetadataUtf8Encoding(#[from] FromUtf8Error),
    /// A tile type byte outside the known values.
    #[error("Invalid tile type")]
    InvalidTileType,
    /// A `z/x/y` outside the tile pyramid.
    #[error("Invalid tile coordinate z={0} x={1} y={2}")]
    InvalidTileCoordinate(u8, u32, u32),
    /// I/O failure while reading or decompressing.
    #[error("IO Error {0}")]
    Reading(#[from] std::io::Error),
    /// The local file could not be opened or mapped.
    #[error("Unable to open mmap file")]
    UnableToOpenMmapFile,
    /// A backend returned fewer bytes than required.
    #[error("Unexpected number of bytes returned [expected: {0}, received: {1}].")]
    UnexpectedNumberOfBytesReturned(usize, usize),
    /// The server ignored the `Range` header.
    #[error("Range requests unsupported")]
    RangeRequestsUnsupported,
    /// The server returned more bytes than requested.
    #[error("HTTP response body is too long, Response {0}B > requested {1}B")]
    ResponseBodyTooLong(usize, usize),
    /// HTTP transport or status failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A request header could not be built.
    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}
