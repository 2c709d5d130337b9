//! Async archive reading on top of a random-access [`AsyncBackend`].

use std::future::Future;

use bytes::Bytes;
use log::debug;
use tokio::io::AsyncReadExt as _;

use crate::header::{HEADER_SIZE, MAX_INITIAL_BYTES};
use crate::{Compression, DirEntry, Directory, Header, PmtError, PmtResult, TileCoord};

/// Leaf directories nested deeper than this mark the archive as corrupt.
const MAX_LEAF_DEPTH: u8 = 4;

/// Reads tiles and metadata from an archive through an [`AsyncBackend`].
pub struct AsyncPmTilesReader<B> {
    backend: B,
    header: Header,
    root_directory: Directory,
}

fn to_usize(value: u64) -> PmtResult<usize> {
    usize::try_from(value).map_err(|_| PmtError::InvalidEntry)
}

/// Absolute byte range of `entry` inside the section at `section_offset`.
///
/// The entry must lie within the first `section_length` bytes of the section.
fn entry_range(
    section_offset: u64,
    section_length: u64,
    entry: &DirEntry,
) -> PmtResult<(usize, usize)> {
    let length = u64::from(entry.length);
    let end = entry
        .offset
        .checked_add(length)
        .ok_or(PmtError::InvalidEntry)?;
    if end > section_length {
        return Err(PmtError::InvalidEntry);
    }
    let offset = section_offset
        .checked_add(entry.offset)
        .ok_or(PmtError::InvalidEntry)?;

    Ok((to_usize(offset)?, to_usize(length)?))
}

impl<B: AsyncBackend + Sync + Send> AsyncPmTilesReader<B> {
    /// Creates a new reader from a specified source and validates the provided `PMTiles` archive is valid.
    ///
    /// Note: Prefer using `new_with_*` methods.
    pub async fn try_from_source(backend: B) -> PmtResult<Self> {
        // Read up to 16,384 bytes, which holds the header and usually the whole root directory.
        let initial_bytes = backend.read(0, MAX_INITIAL_BYTES).await?;
        let header_length = initial_bytes.len().min(HEADER_SIZE);
        let header = Header::try_from_bytes(initial_bytes.slice(..header_length))?;

        let root_offset = to_usize(header.root_offset)?;
        let root_length = to_usize(header.root_length)?;
        let root_end = root_offset
            .checked_add(root_length)
            .ok_or(PmtError::InvalidHeader)?;
        let directory_bytes = if root_end <= initial_bytes.len() {
            initial_bytes.slice(root_offset..root_end)
        } else {
            backend.read_exact(root_offset, root_length).await?
        };

        let root_directory =
            Self::read_compressed_directory(header.internal_compression, directory_bytes).await?;
        debug!("Opened archive with {root_directory:?} in the root");

        Ok(Self {
            backend,
            header,
            root_directory,
        })
    }

    /// Fetches tile data as stored in the archive.
    pub async fn get_tile(&self, coord: TileCoord) -> PmtResult<Option<Bytes>> {
        self.get_tile_by_id(coord.tile_id()).await
    }

    /// Fetches tile data by its Hilbert tile ID.
    pub async fn get_tile_by_id(&self, tile_id: u64) -> PmtResult<Option<Bytes>> {
        let Some(entry) = self.find_tile_entry(tile_id).await? else {
            return Ok(None);
        };

        let (offset, length) =
            entry_range(self.header.data_offset, self.header.data_length, &entry)?;

        Ok(Some(self.backend.read_exact(offset, length).await?))
    }

    /// Fetches tile bytes from the archive.
    /// If the tile is compressed, it will be decompressed.
    pub async fn get_tile_decompressed(&self, coord: TileCoord) -> PmtResult<Option<Bytes>> {
        Ok(if let Some(data) = self.get_tile(coord).await? {
            Some(Self::decompress(self.header.tile_compression, data).await?)
        } else {
            None
        })
    }

    /// Access header information.
    pub fn get_header(&self) -> &Header {
        &self.header
    }

    /// Gets metadata from the archive.
    ///
    /// Note: the format requires valid JSON, but this method returns it as a [String].
    pub async fn get_metadata(&self) -> PmtResult<String> {
        if self.header.metadata_length == 0 {
            return Ok(String::new());
        }
        self.header
            .metadata_offset
            .checked_add(self.header.metadata_length)
            .ok_or(PmtError::InvalidHeader)?;
        let offset = to_usize(self.header.metadata_offset)?;
        let length = to_usize(self.header.metadata_length)?;
        let metadata = self.backend.read_exact(offset, length).await?;

        let decompressed_metadata =
            Self::decompress(self.header.internal_compression, metadata).await?;

        Ok(String::from_utf8(decompressed_metadata.to_vec())?)
    }

    /// Locates a tile entry, descending through leaf directories.
    async fn find_tile_entry(&self, tile_id: u64) -> PmtResult<Option<DirEntry>> {
        let Some(mut entry) = self.root_directory.find_tile_id(tile_id).cloned() else {
            return Ok(None);
        };

        let mut depth = 0;
        while entry.is_leaf() {
            if depth == MAX_LEAF_DEPTH {
                return Err(PmtError::InvalidEntry);
            }
            depth += 1;

            let (offset, length) =
                entry_range(self.header.leaf_offset, self.header.leaf_length, &entry)?;
            debug!("Reading leaf directory at {offset} (depth {depth}) for tile {tile_id}");
            let dir = self.read_directory(offset, length).await?;

            match dir.find_tile_id(tile_id) {
                Some(next) => entry = next.clone(),
                None => return Ok(None),
            }
        }

        Ok(Some(entry))
    }

    async fn read_directory(&self, offset: usize, length: usize) -> PmtResult<Directory> {
        let data = self.backend.read_exact(offset, length).await?;
        Self::read_compressed_directory(self.header.internal_compression, data).await
    }

    async fn read_compressed_directory(
        compression: Compression,
        bytes: Bytes,
    ) -> PmtResult<Directory> {
        let decompressed_bytes = Self::decompress(compression, bytes).await?;
        Directory::try_from(decompressed_bytes)
    }

    async fn decompress(compression: Compression, bytes: Bytes) -> PmtResult<Bytes> {
        if compression == Compression::None {
            return Ok(bytes);
        }

        let mut decompressed_bytes = Vec::with_capacity(bytes.len() * 2);
        match compression {
            Compression::Gzip => {
                async_compression::tokio::bufread::GzipDecoder::new(&bytes[..])
                    .read_to_end(&mut decompressed_bytes)
                    .await?;
            }
            v => Err(PmtError::UnsupportedCompression(v))?,
        }

        Ok(Bytes::from(decompressed_bytes))
    }
}

/// Random-access byte source an archive is read from.
pub trait AsyncBackend {
    /// Reads exactly `length` bytes starting at `offset`
    fn read_exact(
        &self,
        offset: usize,
        length: usize,
    ) -> impl Future<Output = PmtResult<Bytes>> + Send
    where
        Self: Sync,
    {
        async move {
            let data = self.read(offset, length).await?;

            if data.len() == length {
                Ok(data)
            } else {
                Err(PmtError::UnexpectedNumberOfBytesReturned(
                    length,
                    data.len(),
                ))
            }
        }
    }

    /// Reads up to `length` bytes starting at `offset`.
    fn read(&self, offset: usize, length: usize) -> impl Future<Output = PmtResult<Bytes>> + Send;
}
