use std::fmt::{Display, Formatter};

use crate::{PmtError, PmtResult};

/// Highest zoom level a tile ID can address.
pub const MAX_ZOOM: u8 = 31;

/// A tile address in the `z/x/y` scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    z: u8,
    x: u32,
    y: u32,
}

impl TileCoord {
    /// Creates a coordinate, checking that `x` and `y` fit in zoom level `z`.
    ///
    /// # Errors
    ///
    /// Returns [`PmtError::InvalidTileCoordinate`] if `z > 31` or `x`/`y` are `>= 2^z`.
    pub fn new(z: u8, x: u32, y: u32) -> PmtResult<Self> {
        if z > MAX_ZOOM {
            return Err(PmtError::InvalidTileCoordinate(z, x, y));
        }
        let size = 1_u64 << z;
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(PmtError::InvalidTileCoordinate(z, x, y));
        }
        Ok(Self { z, x, y })
    }

    /// Zoom level.
    #[must_use]
    pub fn z(&self) -> u8 {
        self.z
    }

    /// Column, counted from the west.
    #[must_use]
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row, counted from the north.
    #[must_use]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// Position of this tile along the Hilbert curve, counted across all lower zoom levels.
    #[must_use]
    pub fn tile_id(&self) -> u64 {
        if self.z == 0 {
            return 0;
        }

        // Number of tiles in all zoom levels below z: (4^z - 1) / 3
        let base_id = ((1_u64 << (2 * u32::from(self.z))) - 1) / 3;
        base_id + fast_hilbert::xy2h(self.x, self.y, self.z)
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
