use std::io;
use std::path::Path;

use bytes::{Buf, Bytes};
use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt as _, AsyncOptions};
use log::trace;

use crate::async_reader::{AsyncBackend, AsyncPmTilesReader};
use crate::{PmtError, PmtResult};

impl AsyncPmTilesReader<MmapBackend> {
    /// Creates a new `PMTiles` reader from a file path using the async mmap backend.
    ///
    /// Fails if `path` does not exist or is an invalid archive.
    pub async fn new_with_path<P: AsRef<Path>>(path: P) -> PmtResult<Self> {
        let backend = MmapBackend::try_from(path).await?;

        Self::try_from_source(backend).await
    }
}

/// Local archive access through a read-only memory map.
pub struct MmapBackend {
    file: AsyncMmapFile,
}

impl MmapBackend {
    /// Maps the file at `p`.
    ///
    /// # Errors
    ///
    /// Returns [`PmtError::UnableToOpenMmapFile`] if the file cannot be opened or mapped.
    pub async fn try_from<P: AsRef<Path>>(p: P) -> PmtResult<Self> {
        Ok(Self {
            file: AsyncMmapFile::open_with_options(p, AsyncOptions::new().read(true))
                .await
                .map_err(|_| PmtError::UnableToOpenMmapFile)?,
        })
    }
}

impl From<fmmap::error::Error> for PmtError {
    fn from(_: fmmap::error::Error) -> Self {
        Self::Reading(io::Error::from(io::ErrorKind::UnexpectedEof))
    }
}

impl AsyncBackend for MmapBackend {
    async fn read_exact(&self, offset: usize, length: usize) -> PmtResult<Bytes> {
        trace!("mmap read_exact offset={offset} length={length}");
        let end = offset.checked_add(length);
        if end.is_some_and(|end| end <= self.file.len()) {
            Ok(self.file.reader(offset)?.copy_to_bytes(length))
        } else {
            Err(PmtError::Reading(io::Error::from(
                io::ErrorKind::UnexpectedEof,
            )))
        }
    }

    async fn read(&self, offset: usize, length: usize) -> PmtResult<Bytes> {
        trace!("mmap read offset={offset} length={length}");
        if offset >= self.file.len() {
            return Ok(Bytes::new());
        }
        let mut reader = self.file.reader(offset)?;
        let read_length = length.min(reader.len());

        Ok(reader.copy_to_bytes(read_length))
    }
}
