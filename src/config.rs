//! Tuning knobs for the cube and its drag interaction.

/// Configuration for a cube lattice and the interaction built on it.
///
/// Dimensions are block counts along X/Y/Z. The presence mask, when
/// non-empty, must contain `count_x * count_y * count_z` entries in
/// linear-index order; masked-off cells produce no instance (sparse
/// cube support). An empty mask means every cell is present.
#[derive(Clone, Debug)]
pub struct CubeConfig {
    /// Block counts along X, Y, Z.
    pub dimensions: [usize; 3],
    /// Per-cell presence, linear-index order; empty means all present.
    pub layout_mask: Vec<bool>,
    /// Edge length of one block in world units.
    pub block_size: f32,
    /// Animated rotation speed in degrees per second.
    pub rotation_speed: f32,
    /// Accumulated drag distance (pixels) required before a drag commits
    /// to a target face.
    pub drag_threshold: f32,
    /// Pixels of drag per quarter turn.
    pub drag_sensitivity: f32,
    /// Absolute drag angle (degrees) above which a release snaps to a
    /// full quarter turn instead of back to zero.
    pub snap_threshold: f32,
    /// Vertical offset of decorative top parts above their block.
    pub top_part_offset: f32,
    /// Uniform scale applied to decorative top parts.
    pub top_part_scale: f32,
    /// Default number of scramble moves.
    pub scramble_moves: usize,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            dimensions: [3, 3, 3],
            layout_mask: Vec::new(),
            block_size: 100.0,
            rotation_speed: 360.0,
            drag_threshold: 10.0,
            drag_sensitivity: 150.0,
            snap_threshold: 45.0,
            top_part_offset: 10.0,
            top_part_scale: 1.0,
            scramble_moves: 20,
        }
    }
}

impl CubeConfig {
    /// Number of lattice cells, present or not.
    pub fn cell_count(&self) -> usize {
        self.dimensions[0] * self.dimensions[1] * self.dimensions[2]
    }

    /// Whether the cell at the given linear index is present.
    pub fn cell_present(&self, linear_index: usize) -> bool {
        self.layout_mask.get(linear_index).copied().unwrap_or(true)
    }
}
