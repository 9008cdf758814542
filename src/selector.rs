//! Layer selection from a pick result.
//!
//! Given the faces a picked block belongs to and the hit normal of the
//! pick ray, decides which physical face was struck and which faces a
//! drag can actually twist.

use nalgebra::{Point3, Vector3};

use crate::face::Face;

/// Pick result delivered by the host's ray provider.
///
/// The crate performs no scene raycasting of its own; the host resolves
/// the pointer position against its scene and hands over the hit.
#[derive(Clone, Copy, Debug)]
pub struct PickHit {
    /// World-space impact point on the struck block.
    pub world_point: Point3<f32>,
    /// World-space surface normal at the impact point.
    pub world_normal: Vector3<f32>,
    /// Index of the struck block instance.
    pub instance: usize,
}

/// Resolves which face the ray actually struck.
///
/// Among the block's candidate faces, picks the one whose table normal
/// has the largest dot product with the hit normal. This is independent
/// of which faces the block belongs to topologically: a corner block
/// belongs to three faces but the ray struck exactly one of them.
pub fn resolve_hit_face(candidates: &[Face], hit_normal: &Vector3<f32>) -> Option<Face> {
    let mut best: Option<(Face, f32)> = None;
    for &face in candidates {
        let dot = face.normal().dot(hit_normal);
        if best.is_none_or(|(_, best_dot)| dot > best_dot) {
            best = Some((face, dot));
        }
    }
    best.map(|(face, _)| face)
}

/// Faces a drag on this block can twist.
///
/// The struck face and its mechanical opposite are removed from the
/// candidates: dragging "into" or "out of" the screen cannot be told
/// apart from a 2D gesture. If the removal empties the set (possible
/// for a 1-layer-thick cube along some axis), falls back to the full
/// candidate set so the resolver is never left without a choice.
pub fn target_faces(candidates: &[Face], hit_face: Face) -> Vec<Face> {
    let opposite = hit_face.opposite();
    let targets: Vec<Face> = candidates
        .iter()
        .copied()
        .filter(|&face| face != hit_face && face != opposite)
        .collect();
    if targets.is_empty() {
        candidates.to_vec()
    } else {
        targets
    }
}
