//! Position quantization for vertex fusion.
//!
//! Vertices closer than the cell size usually map to the same key, which lets
//! edge and vertex identities survive seams and duplicated positions.

use crate::core::types::Vec3;

/// Quantized position key
pub type PositionKey = [i32; 3];

/// Quantized edge key, endpoints ordered so (a, b) == (b, a)
pub type EdgeKey = (PositionKey, PositionKey);

/// Maps positions onto a uniform grid of `cell_size`
#[derive(Clone, Copy, Debug)]
pub struct PositionQuantizer {
    inv_cell: f32,
}

impl PositionQuantizer {
    /// Smallest usable cell; zero budgets fall back to this
    pub const MIN_CELL: f32 = 1e-6;

    pub fn new(cell_size: f32) -> Self {
        let cell = if cell_size.is_finite() { cell_size.max(Self::MIN_CELL) } else { Self::MIN_CELL };
        Self { inv_cell: 1.0 / cell }
    }

    pub fn cell_size(&self) -> f32 {
        1.0 / self.inv_cell
    }

    /// Cell containing `p`.
    ///
    /// Two points closer than a cell can still land on either side of a
    /// cell boundary; use [`Self::neighborhood_keys`] where that matters.
    pub fn key(&self, p: Vec3) -> PositionKey {
        let q = (p * self.inv_cell).floor();
        [q.x as i32, q.y as i32, q.z as i32]
    }

    /// Cells touched by the cell-sized box centered on `p`. Any point
    /// within half a cell of `p` (per axis) has its key in this set.
    pub fn neighborhood_keys(&self, p: Vec3) -> [PositionKey; 8] {
        let half = 0.5 * self.cell_size();
        let mut keys = [[0; 3]; 8];
        for (i, key) in keys.iter_mut().enumerate() {
            let offset = Vec3::new(
                if i & 1 == 0 { -half } else { half },
                if i & 2 == 0 { -half } else { half },
                if i & 4 == 0 { -half } else { half },
            );
            *key = self.key(p + offset);
        }
        keys
    }

    /// Order-independent edge key; `None` if both ends fuse to one cell
    pub fn edge_key(&self, a: Vec3, b: Vec3) -> Option<EdgeKey> {
        let ka = self.key(a);
        let kb = self.key(b);
        match ka.cmp(&kb) {
            std::cmp::Ordering::Less => Some((ka, kb)),
            std::cmp::Ordering::Greater => Some((kb, ka)),
            std::cmp::Ordering::Equal => None,
        }
    }
}
