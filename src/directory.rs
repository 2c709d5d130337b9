use std::fmt::{Debug, Formatter};

use bytes::{Buf, Bytes};
use varint_rs::VarintReader;

use crate::{PmtError, PmtResult};

/// A decoded root or leaf directory.
#[derive(Default, Clone)]
pub struct Directory {
    pub(crate) entries: Vec<DirEntry>,
}

impl Debug for Directory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Directory [entries: {}]", self.entries.len()))
    }
}

impl Directory {
    /// Finds the entry covering `tile_id`.
    ///
    /// A leaf pointer is returned as-is; the caller decides whether to descend.
    #[must_use]
    pub fn find_tile_id(&self, tile_id: u64) -> Option<&DirEntry> {
        match self.entries.binary_search_by(|e| e.tile_id.cmp(&tile_id)) {
            Ok(idx) => self.entries.get(idx),
            Err(next_id) => {
                let previous = self.entries.get(next_id.checked_sub(1)?)?;
                if previous.is_leaf()
                    || tile_id - previous.tile_id < u64::from(previous.run_length)
                {
                    Some(previous)
                } else {
                    None
                }
            }
        }
    }
}

impl TryFrom<Bytes> for Directory {
    type Error = PmtError;

    fn try_from(buffer: Bytes) -> PmtResult<Self> {
        let mut buffer = buffer.reader();
        let n_entries = buffer.read_usize_varint()?;
        // Every entry takes at least one byte in each of the four columns
        if n_entries > buffer.get_ref().remaining() / 4 {
            return Err(PmtError::InvalidEntry);
        }

        let mut entries = vec![DirEntry::default(); n_entries];

        // Read tile IDs
        let mut next_tile_id = 0;
        for entry in &mut entries {
            next_tile_id = buffer
                .read_u64_varint()?
                .checked_add(next_tile_id)
                .ok_or(PmtError::InvalidEntry)?;
            entry.tile_id = next_tile_id;
        }

        // Read Run Lengths
        for entry in &mut entries {
            entry.run_length = buffer.read_u32_varint()?;
        }

        // Read Lengths
        for entry in &mut entries {
            entry.length = buffer.read_u32_varint()?;
        }

        // Read Offsets
        let mut last_entry: Option<&DirEntry> = None;
        for entry in &mut entries {
            let offset = buffer.read_u64_varint()?;
            entry.offset = if offset == 0 {
                let e = last_entry.ok_or(PmtError::InvalidEntry)?;
                e.offset
                    .checked_add(u64::from(e.length))
                    .ok_or(PmtError::InvalidEntry)?
            } else {
                offset - 1
            };
            last_entry = Some(entry);
        }

        Ok(Directory { entries })
    }
}

/// One run of tiles, or a pointer to a leaf directory when `run_length` is 0.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub(crate) tile_id: u64,
    pub(crate) offset: u64,
    pub(crate) length: u32,
    pub(crate) run_length: u32,
}

impl DirEntry {
    pub(crate) fn is_leaf(&self) -> bool {
        self.run_length == 0
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::{DirEntry, Directory};
    use crate::PmtError;

    fn entry(tile_id: u64, run_length: u32) -> DirEntry {
        DirEntry {
            tile_id,
            offset: tile_id * 10,
            length: 10,
            run_length,
        }
    }

    #[test]
    fn decode_with_contiguous_offsets() {
        // 3 entries: ids 0, 1, 5; runs 1, 3, 0; lengths 6, 6, 20; offsets 0, (contiguous), 100
        let raw = Bytes::from_static(&[3, 0, 1, 4, 1, 3, 0, 6, 6, 20, 1, 0, 101]);
        let dir = Directory::try_from(raw).unwrap();

        assert_eq!(dir.entries.len(), 3);
        assert_eq!(dir.entries[1].tile_id, 1);
        assert_eq!(dir.entries[1].offset, 6);
        assert_eq!(dir.entries[2].tile_id, 5);
        assert_eq!(dir.entries[2].offset, 100);
        assert!(dir.entries[2].is_leaf());
    }

    #[test]
    fn first_offset_cannot_be_contiguous() {
        let raw = Bytes::from_static(&[1, 0, 1, 6, 0]);
        assert!(matches!(
            Directory::try_from(raw),
            Err(PmtError::InvalidEntry)
        ));
    }

    #[test]
    fn truncated_directory() {
        // One entry whose tile ID varint never terminates
        let raw = Bytes::from_static(&[1, 0x80, 0x80, 0x80, 0x80]);
        assert!(matches!(Directory::try_from(raw), Err(PmtError::Reading(_))));
    }

    #[rstest]
    #[case::too_few_bytes(&[2, 0])]
    #[case::huge_count(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x40])]
    #[case::count_near_2_pow_30(&[0x80, 0x80, 0x80, 0x80, 0x04, 0, 0, 0, 0])]
    fn rejects_entry_count_larger_than_buffer(#[case] raw: &'static [u8]) {
        assert!(matches!(
            Directory::try_from(Bytes::from_static(raw)),
            Err(PmtError::InvalidEntry)
        ));
    }

    #[test]
    fn rejects_overflowing_tile_id() {
        // Second delta pushes the running tile ID past u64::MAX
        let mut raw = vec![2, 1];
        raw.extend([0xff; 9]);
        raw.push(0x01);
        raw.extend([1, 1, 1, 1, 1, 1]);
        assert!(matches!(
            Directory::try_from(Bytes::from(raw)),
            Err(PmtError::InvalidEntry)
        ));
    }

    #[test]
    fn rejects_overflowing_contiguous_offset() {
        // First offset is u64::MAX - 1, the second is "previous + length"
        let mut raw = vec![2, 0, 1, 1, 1, 4, 4];
        raw.extend([0xff; 9]);
        raw.push(0x01);
        raw.push(0);
        assert!(matches!(
            Directory::try_from(Bytes::from(raw)),
            Err(PmtError::InvalidEntry)
        ));
    }

    #[test]
    fn find_in_runs() {
        let dir = Directory {
            entries: vec![entry(2, 1), entry(3, 3), entry(10, 1)],
        };

        assert_eq!(dir.find_tile_id(0), None);
        assert_eq!(dir.find_tile_id(2), Some(&dir.entries[0]));
        assert_eq!(dir.find_tile_id(4), Some(&dir.entries[1]));
        assert_eq!(dir.find_tile_id(5), Some(&dir.entries[1]));
        assert_eq!(dir.find_tile_id(6), None);
        assert_eq!(dir.find_tile_id(11), None);
    }

    #[test]
    fn find_returns_leaf_pointer() {
        let dir = Directory {
            entries: vec![entry(0, 0), entry(100, 0)],
        };

        assert_eq!(dir.find_tile_id(42), Some(&dir.entries[0]));
        assert_eq!(dir.find_tile_id(1_000), Some(&dir.entries[1]));
    }

    #[test]
    fn empty_directory() {
        let dir = Directory::try_from(Bytes::from_static(&[0])).unwrap();
        assert_eq!(dir.find_tile_id(0), None);
    }
}
