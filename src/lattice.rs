//! Cube lattice model: grid of unit blocks as instance transforms.
//!
//! The lattice is pure data plus geometric queries. It owns one rigid
//! transform per present cell and one optional decorative attachment per
//! top-face cell, and answers face-membership and indexing questions.
//! All transform mutation goes through the rotation engine in
//! [`crate::cube`].

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::config::CubeConfig;
use crate::face::{Axis, Face};

/// Rigid transform of one instance: position, orientation, uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
            scale: 1.0,
        }
    }
}

/// One block instance: its live transform and the post-construction
/// transform it is restored to on reset.
#[derive(Clone, Debug)]
pub struct Instance {
    pub transform: Transform,
    pub initial: Transform,
}

/// Decorative sub-component riding on top of a block instance.
///
/// Attachments follow every rotation whose affected set contains their
/// backing instance, around the same pivot.
#[derive(Clone, Debug)]
pub struct Attachment {
    /// Index of the backing block instance.
    pub instance: usize,
    pub transform: Transform,
    pub initial: Transform,
}

/// NxMxP grid of unit blocks held as a flat instance collection.
#[derive(Clone, Debug)]
pub struct CubeLattice {
    config: CubeConfig,
    instances: Vec<Instance>,
    attachments: Vec<Attachment>,
}

impl CubeLattice {
    /// Builds the lattice and its instances from the configuration.
    pub fn new(config: CubeConfig) -> Self {
        let mut lattice = Self {
            config,
            instances: Vec::new(),
            attachments: Vec::new(),
        };
        lattice.rebuild();
        lattice
    }

    /// Rebuilds all instances from the configured dimensions and mask.
    ///
    /// Masked-off cells are skipped silently and contribute no instance.
    /// Replaces any existing instances and attachments.
    pub fn rebuild(&mut self) {
        let [cx, cy, cz] = self.config.dimensions;
        self.instances.clear();
        self.attachments.clear();

        for z in 0..cz {
            for y in 0..cy {
                for x in 0..cx {
                    if !self.config.cell_present(self.linear_index(x, y, z)) {
                        continue;
                    }
                    let position = self.cell_position(x, y, z);
                    let transform = Transform::from_position(position);
                    let instance_index = self.instances.len();
                    self.instances.push(Instance {
                        transform,
                        initial: transform,
                    });

                    // Top-face cells carry a decorative part above the block.
                    if z == cz - 1 {
                        let offset = self.config.block_size * 0.5 + self.config.top_part_offset;
                        let part = Transform {
                            position: position + Vector3::new(0.0, 0.0, offset),
                            rotation: UnitQuaternion::identity(),
                            scale: self.config.top_part_scale,
                        };
                        self.attachments.push(Attachment {
                            instance: instance_index,
                            transform: part,
                            initial: part,
                        });
                    }
                }
            }
        }
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub(crate) fn attachments_mut(&mut self) -> &mut [Attachment] {
        &mut self.attachments
    }

    /// Linear cell index for grid coordinates:
    /// `x + y * countX + z * countX * countY`.
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        let [cx, cy, _] = self.config.dimensions;
        x + y * cx + z * cx * cy
    }

    /// Local-space center of the cell at the given grid coordinates.
    ///
    /// Deterministic from the coordinates:
    /// `(coord - (dim - 1) / 2) * block_size` along each axis.
    pub fn cell_position(&self, x: usize, y: usize, z: usize) -> Point3<f32> {
        let [cx, cy, cz] = self.config.dimensions;
        let size = self.config.block_size;
        Point3::new(
            (x as f32 - (cx as f32 - 1.0) * 0.5) * size,
            (y as f32 - (cy as f32 - 1.0) * 0.5) * size,
            (z as f32 - (cz as f32 - 1.0) * 0.5) * size,
        )
    }

    /// Recovers grid coordinates from a world-space point by converting
    /// to fractional lattice coordinates and rounding to the nearest
    /// cell. Returns `None` when the point rounds outside the grid.
    pub fn grid_coords_for_point(&self, point: Point3<f32>) -> Option<(usize, usize, usize)> {
        let [cx, cy, cz] = self.config.dimensions;
        let size = self.config.block_size;
        let fx = point.x / size + (cx as f32 - 1.0) * 0.5;
        let fy = point.y / size + (cy as f32 - 1.0) * 0.5;
        let fz = point.z / size + (cz as f32 - 1.0) * 0.5;
        let (x, y, z) = (fx.round(), fy.round(), fz.round());
        if x < 0.0 || y < 0.0 || z < 0.0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= cx || y >= cy || z >= cz {
            return None;
        }
        Some((x, y, z))
    }

    /// Faces the block at the given grid coordinates belongs to.
    ///
    /// Along each axis the block is on the min outer face at coordinate
    /// 0, the max outer face at `dim - 1`, and the middle-layer face
    /// otherwise. Never empty for in-range coordinates; up to three
    /// faces for corner blocks.
    pub fn face_membership(&self, x: usize, y: usize, z: usize) -> Vec<Face> {
        let [cx, cy, cz] = self.config.dimensions;
        let mut faces = Vec::with_capacity(3);

        faces.push(if x == 0 {
            Face::Front
        } else if x == cx - 1 {
            Face::Back
        } else {
            Face::Standing
        });
        faces.push(if y == 0 {
            Face::Left
        } else if y == cy - 1 {
            Face::Right
        } else {
            Face::Middle
        });
        faces.push(if z == 0 {
            Face::Bottom
        } else if z == cz - 1 {
            Face::Top
        } else {
            Face::Equatorial
        });

        // A 1-thick dimension puts min and max at the same coordinate;
        // the min label wins above.
        faces
    }

    /// Layer index along the face's axis.
    ///
    /// Max-side outer faces map to `dim - 1`, min-side to 0, middle
    /// layers to 1 (the original's convention, meaningful for
    /// three-layer dimensions).
    pub fn layer_index(&self, face: Face) -> usize {
        let [cx, cy, cz] = self.config.dimensions;
        match face {
            Face::Top => cz - 1,
            Face::Bottom | Face::Front | Face::Left => 0,
            Face::Back => cx - 1,
            Face::Right => cy - 1,
            Face::Equatorial | Face::Standing | Face::Middle => 1,
        }
    }

    /// Number of layers along an axis.
    pub fn layer_count(&self, axis: Axis) -> usize {
        self.config.dimensions[axis.dimension_index()]
    }

    /// Expected local-space coordinate along `axis` for instances in the
    /// given layer.
    pub fn layer_coordinate(&self, axis: Axis, layer: usize) -> f32 {
        let dim = self.layer_count(axis);
        (layer as f32 - (dim as f32 - 1.0) * 0.5) * self.config.block_size
    }
}
