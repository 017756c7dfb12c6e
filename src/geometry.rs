//! Tiling arithmetic for Winograd F(2,3).
//!
//! Every 2x2 output tile is produced from a 4x4 input patch, so a valid 3x3
//! convolution over an `H x W` image yields `(H-2) x (W-2)` outputs covered by
//! `ceil((H-2)/2) x ceil((W-2)/2)` tiles.

use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};
use crate::problem::ProblemShape;

/// Output tile edge (m)
pub const OUTPUT_TILE: usize = 2;

/// Filter edge (r)
pub const FILTER_SIZE: usize = 3;

/// Transform-domain tile edge, m + r - 1
pub const ALPHA: usize = OUTPUT_TILE + FILTER_SIZE - 1;

/// Elements in one transform-domain tile
pub const TILE_ELEMENTS: usize = ALPHA * ALPHA;

/// Shapes derived from a [`ProblemShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGeometry {
    pub out_h: usize,
    pub out_w: usize,
    pub num_h_tiles: usize,
    pub num_w_tiles: usize,
    /// Total spatial tiles, `num_h_tiles * num_w_tiles`
    pub p: usize,
    pub alpha: usize,
}

impl TileGeometry {
    /// Derive the tiling for `shape`.
    ///
    /// Fails with `InvalidShape` when H or W is odd, or too small to hold a
    /// single 4x4 patch.
    pub fn new(shape: &ProblemShape) -> Result<Self> {
        for (name, extent) in [("H", shape.h), ("W", shape.w)] {
            if extent % 2 != 0 {
                return Err(WinogradError::invalid_shape(
                    name.to_string(),
                    format!("{} is odd; the image extent must be even", extent),
                ));
            }
            if extent < ALPHA {
                return Err(WinogradError::invalid_shape(
                    name.to_string(),
                    format!("{} is smaller than the {}x{} input patch", extent, ALPHA, ALPHA),
                ));
            }
        }

        let out_h = shape.h - FILTER_SIZE + 1;
        let out_w = shape.w - FILTER_SIZE + 1;
        let num_h_tiles = out_h.div_ceil(OUTPUT_TILE);
        let num_w_tiles = out_w.div_ceil(OUTPUT_TILE);

        Ok(Self {
            out_h,
            out_w,
            num_h_tiles,
            num_w_tiles,
            p: num_h_tiles * num_w_tiles,
            alpha: ALPHA,
        })
    }

    /// Flat index of the tile at tile-row `th`, tile-column `tw`
    #[inline]
    pub fn tile_index(&self, th: usize, tw: usize) -> usize {
        th * self.num_w_tiles + tw
    }

    /// Number of output values per channel
    pub fn output_plane(&self) -> usize {
        self.out_h * self.out_w
    }
}
