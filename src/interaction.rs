//! Drag session orchestration.
//!
//! Walks one pointer drag through its lifecycle: pick on pointer-down,
//! threshold gating and face locking while the pointer moves, continuous
//! drag-follow rotation once committed, and the snap to the nearest
//! quarter turn on release. The cube is passed in by the host; the
//! interaction never goes looking for one.

use nalgebra::Vector2;

use crate::cube::MagicCube;
use crate::face::{Axis, Face};
use crate::gesture::{GestureResolver, ScreenProjector};
use crate::selector::{resolve_hit_face, target_faces, PickHit};

/// Residual angles below this are applied directly instead of animated.
const ANGLE_EPSILON: f32 = 1e-3;

/// A drag that has committed to a target face.
#[derive(Clone, Copy, Debug)]
struct Committed {
    face: Face,
    axis: Axis,
    layer: usize,
    /// Current absolute drag angle in degrees, clamped to ±90.
    angle: f32,
}

/// One pointer-down-to-pointer-up session.
#[derive(Debug)]
struct DragSession {
    hit_face: Face,
    resolver: GestureResolver,
    committed: Option<Committed>,
}

/// Drag session state machine.
///
/// Idle until [`Self::begin`] accepts a pick; awaiting the commit
/// threshold until the accumulated drag distance crosses it; committed
/// until [`Self::release`] (or [`Self::cancel`]) tears the session down.
/// Teardown always runs through the same path, whatever the exit.
#[derive(Debug, Default)]
pub struct DragInteraction {
    session: Option<DragSession>,
}

impl DragInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag session is active.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The face the session has committed to, if any.
    pub fn committed_face(&self) -> Option<Face> {
        self.session
            .as_ref()
            .and_then(|s| s.committed.map(|c| c.face))
    }

    /// Current absolute drag angle of a committed session, in degrees.
    pub fn current_angle(&self) -> Option<f32> {
        self.session
            .as_ref()
            .and_then(|s| s.committed.map(|c| c.angle))
    }

    /// Starts a session from a pick delivered by the host's ray provider.
    ///
    /// Rejected while the cube animates (rotations are serialized), and
    /// when the hit does not resolve to a lattice cell; both are no-ops,
    /// the worst outcome being that this drag does nothing.
    pub fn begin(&mut self, cube: &mut MagicCube, hit: &PickHit) -> bool {
        if self.session.is_some() {
            // The release for the previous drag never arrived; rewind it
            // rather than leaving the layer mid-angle.
            log::debug!("stale drag session cancelled by new pointer-down");
            self.cancel(cube);
        }
        if cube.is_animating() {
            log::debug!("drag ignored: rotation in flight");
            return false;
        }
        let Some((x, y, z)) = cube.lattice().grid_coords_for_point(hit.world_point) else {
            log::debug!("drag ignored: hit point {:?} is outside the lattice", hit.world_point);
            return false;
        };

        let candidates = cube.lattice().face_membership(x, y, z);
        let Some(hit_face) = resolve_hit_face(&candidates, &hit.world_normal) else {
            return false;
        };
        let targets = target_faces(&candidates, hit_face);
        log::debug!(
            "drag begun on block ({x}, {y}, {z}): hit {hit_face:?}, targets {targets:?}"
        );

        self.session = Some(DragSession {
            hit_face,
            resolver: GestureResolver::new(targets),
            committed: None,
        });
        true
    }

    /// Feeds one pointer-move delta (pixels) into the session.
    ///
    /// Below the commit threshold the cube shows no response. Crossing
    /// it locks the target face through the gesture resolver; from then
    /// on every move recomputes the absolute drag angle and feeds it to
    /// the engine's continuous rotation.
    pub fn update(
        &mut self,
        cube: &mut MagicCube,
        projector: &dyn ScreenProjector,
        delta: Vector2<f32>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.resolver.accumulate(delta);

        if session.committed.is_none() {
            if session.resolver.total_distance() < cube.config().drag_threshold {
                return;
            }
            let Some(face) = session.resolver.lock(projector, cube.center()) else {
                // No candidate projected usefully; stay uncommitted and
                // treat the gesture as a pan.
                return;
            };
            let axis = face.axis();
            let layer = cube.lattice().layer_index(face);
            if !cube.begin_layer_rotation(axis, layer) {
                self.teardown(cube);
                return;
            }
            session.committed = Some(Committed {
                face,
                axis,
                layer,
                angle: 0.0,
            });
        }

        let (hit_face, drag) = (session.hit_face, session.resolver.accumulated());
        if let Some(committed) = session.committed.as_mut() {
            committed.angle = drag_angle(
                committed.face,
                hit_face,
                drag,
                cube.config().drag_sensitivity,
            );
            let (axis, layer, angle) = (committed.axis, committed.layer, committed.angle);
            cube.set_layer_rotation(axis, layer, angle);
        }
    }

    /// Ends the session on pointer-up.
    ///
    /// An uncommitted session is a tap: the layer never moved, nothing
    /// to undo. A committed session snaps: past the snap threshold the
    /// residual to the nearest quarter turn is animated, otherwise the
    /// layer animates back to zero.
    pub fn release(&mut self, cube: &mut MagicCube) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        if let Some(committed) = session.committed {
            let final_angle = snap_angle(committed.angle, cube.config().snap_threshold);
            let residual = final_angle - committed.angle;
            if residual.abs() > ANGLE_EPSILON {
                cube.rotate_layer(committed.axis, committed.layer, residual);
            } else {
                cube.set_layer_rotation(committed.axis, committed.layer, final_angle);
            }
        }
        self.teardown(cube);
    }

    /// Aborts the session, rewinding any applied rotation.
    ///
    /// For abnormal exits (pointer capture lost, host shutdown): the
    /// layer is returned to its snapshot and the session torn down.
    pub fn cancel(&mut self, cube: &mut MagicCube) {
        if let Some(committed) = self.session.as_ref().and_then(|s| s.committed) {
            cube.set_layer_rotation(committed.axis, committed.layer, 0.0);
        }
        self.teardown(cube);
    }

    /// The one exit path every way out of a session goes through.
    fn teardown(&mut self, cube: &mut MagicCube) {
        self.session = None;
        cube.end_layer_rotation_drag();
    }
}

/// Absolute drag angle for a committed target face.
///
/// Reproduces the original sign table: top/bottom/equatorial targets
/// read the screen-X drag component, everything else reads screen Y,
/// negated by default so dragging matches the rotation visually. The
/// sign flips when the struck face is Left, or when it is Back and the
/// target is a left/right face, keeping the rotation direction
/// consistent with the drag regardless of which side the camera sees.
fn drag_angle(target: Face, hit_face: Face, drag: Vector2<f32>, sensitivity: f32) -> f32 {
    let raw = match target {
        Face::Top | Face::Bottom | Face::Equatorial => -(drag.x / sensitivity) * 90.0,
        _ => {
            let flipped = hit_face == Face::Left
                || (hit_face == Face::Back && matches!(target, Face::Left | Face::Right));
            let component = (drag.y / sensitivity) * 90.0;
            if flipped { component } else { -component }
        }
    };
    raw.clamp(-90.0, 90.0)
}

/// Snap law: past the threshold the angle snaps to a signed quarter
/// turn, otherwise back to zero. Exactly at the threshold snaps to zero.
fn snap_angle(angle: f32, threshold: f32) -> f32 {
    if angle.abs() > threshold {
        90.0_f32.copysign(angle)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn snap_law() {
        assert_relative_eq!(snap_angle(50.0, 45.0), 90.0);
        assert_relative_eq!(snap_angle(30.0, 45.0), 0.0);
        assert_relative_eq!(snap_angle(-50.0, 45.0), -90.0);
        assert_relative_eq!(snap_angle(-30.0, 45.0), 0.0);
        // Exactly at the threshold: strictly-greater rule, snaps to zero.
        assert_relative_eq!(snap_angle(45.0, 45.0), 0.0);
        assert_relative_eq!(snap_angle(-45.0, 45.0), 0.0);
    }

    #[test]
    fn horizontal_faces_read_screen_x() {
        let drag = Vector2::new(100.0, 0.0);
        assert_relative_eq!(drag_angle(Face::Top, Face::Front, drag, 150.0), -60.0);
        assert_relative_eq!(drag_angle(Face::Bottom, Face::Front, drag, 150.0), -60.0);
        assert_relative_eq!(drag_angle(Face::Equatorial, Face::Front, drag, 150.0), -60.0);
        // Screen Y is ignored for these targets.
        let vertical = Vector2::new(0.0, 100.0);
        assert_relative_eq!(drag_angle(Face::Top, Face::Front, vertical, 150.0), 0.0);
    }

    #[test]
    fn side_faces_read_screen_y() {
        let drag = Vector2::new(0.0, 75.0);
        assert_relative_eq!(drag_angle(Face::Front, Face::Right, drag, 150.0), -45.0);
        assert_relative_eq!(drag_angle(Face::Standing, Face::Right, drag, 150.0), -45.0);
        assert_relative_eq!(drag_angle(Face::Middle, Face::Front, drag, 150.0), -45.0);
    }

    #[test]
    fn sign_flips_for_left_and_back_viewpoints() {
        let drag = Vector2::new(0.0, 75.0);
        // Viewed from the left, vertical drags flip.
        assert_relative_eq!(drag_angle(Face::Front, Face::Left, drag, 150.0), 45.0);
        assert_relative_eq!(drag_angle(Face::Standing, Face::Left, drag, 150.0), 45.0);
        // Viewed from the back, only left/right targets flip.
        assert_relative_eq!(drag_angle(Face::Left, Face::Back, drag, 150.0), 45.0);
        assert_relative_eq!(drag_angle(Face::Right, Face::Back, drag, 150.0), 45.0);
        assert_relative_eq!(drag_angle(Face::Standing, Face::Back, drag, 150.0), -45.0);
    }

    #[test]
    fn angle_is_clamped_to_a_quarter_turn() {
        let drag = Vector2::new(1000.0, 0.0);
        assert_relative_eq!(drag_angle(Face::Top, Face::Front, drag, 150.0), -90.0);
        assert_relative_eq!(
            drag_angle(Face::Top, Face::Front, -drag, 150.0),
            90.0
        );
    }
}
