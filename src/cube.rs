//! Layer rotation engine.
//!
//! Owns the lattice's instance collection and is the only writer of its
//! transforms. Three rotation modes share one pivot-rotation primitive:
//! continuous absolute-angle positioning for drag-follow, animated
//! finite-duration jobs for programmatic turns and release snapping,
//! and the incremental per-tick step the jobs are built from.
//!
//! All rotations are serialized: at most one animated job is in flight,
//! scramble moves queue behind it, and a continuous drag session cannot
//! begin while a job animates.

use std::collections::VecDeque;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use rand::Rng;

use crate::config::CubeConfig;
use crate::face::Axis;
use crate::lattice::{CubeLattice, Transform};

/// Animated jobs finish once this many degrees remain.
const REMAINING_EPSILON: f32 = 1e-3;

/// Fired when an animated rotation reaches zero remaining degrees.
///
/// Carries no permutation payload; hosts needing solved-state detection
/// query the lattice themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationComplete {
    pub axis: Axis,
    pub layer: usize,
}

/// An in-flight animated rotation. At most one exists at a time.
#[derive(Clone, Debug)]
struct RotationJob {
    axis: Axis,
    layer: usize,
    remaining_degrees: f32,
    /// Affected instances, frozen at job start.
    affected: Vec<usize>,
}

/// Snapshot-backed state of a continuous drag rotation.
///
/// Every per-frame angle is applied against these bases, never
/// compounded frame over frame, so repeated updates cannot drift.
#[derive(Clone, Debug)]
struct DragRotation {
    axis: Axis,
    layer: usize,
    pivot: Point3<f32>,
    affected: Vec<usize>,
    /// Pre-rotation transforms of `affected`, index-parallel.
    base_transforms: Vec<Transform>,
    /// Attachment index and pre-rotation transform for attachments whose
    /// backing instance is affected.
    attachment_bases: Vec<(usize, Transform)>,
}

/// The cube: lattice plus rotation state.
#[derive(Debug)]
pub struct MagicCube {
    lattice: CubeLattice,
    job: Option<RotationJob>,
    drag: Option<DragRotation>,
    pending_moves: VecDeque<(Axis, usize, f32)>,
    completed: Vec<RotationComplete>,
}

impl MagicCube {
    pub fn new(config: CubeConfig) -> Self {
        Self {
            lattice: CubeLattice::new(config),
            job: None,
            drag: None,
            pending_moves: VecDeque::new(),
            completed: Vec::new(),
        }
    }

    pub fn lattice(&self) -> &CubeLattice {
        &self.lattice
    }

    pub fn config(&self) -> &CubeConfig {
        self.lattice.config()
    }

    /// Local-space center of the lattice; the projection anchor for
    /// gesture resolution.
    pub fn center(&self) -> Point3<f32> {
        Point3::origin()
    }

    /// Whether an animated job is in flight or queued.
    pub fn is_animating(&self) -> bool {
        self.job.is_some() || !self.pending_moves.is_empty()
    }

    /// Whether a continuous drag rotation session is active.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Completion events accumulated since the last drain.
    pub fn drain_completed(&mut self) -> Vec<RotationComplete> {
        std::mem::take(&mut self.completed)
    }

    /// Instances whose live local coordinate along `axis` matches the
    /// layer's expected offset.
    ///
    /// Scans the live transforms with a tolerance that absorbs
    /// floating-point drift from prior turns. Recomputed on every call:
    /// completed quarter turns permanently change which instances occupy
    /// a layer slot, so membership must never be cached across sessions.
    pub fn collect_layer_instances(&self, axis: Axis, layer: usize) -> Vec<usize> {
        let expected = self.lattice.layer_coordinate(axis, layer);
        let tolerance = self.lattice.config().block_size * 0.25;
        let component = axis.dimension_index();
        self.lattice
            .instances()
            .iter()
            .enumerate()
            .filter(|(_, instance)| {
                (instance.transform.position[component] - expected).abs() <= tolerance
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Centroid of the given instances' current positions.
    ///
    /// The live average keeps rotation visually correct for off-center
    /// or sparse lattices where the geometric center would not.
    fn pivot_of(&self, affected: &[usize]) -> Point3<f32> {
        if affected.is_empty() {
            return Point3::origin();
        }
        let mut sum = Vector3::zeros();
        for &index in affected {
            sum += self.lattice.instances()[index].transform.position.coords;
        }
        Point3::from(sum / affected.len() as f32)
    }

    /// Starts a continuous drag rotation session for `(axis, layer)`.
    ///
    /// Snapshots the affected instances' transforms (and those of any
    /// attachments riding on them) and fixes the pivot for the session.
    /// Rejected while an animated job is in flight or queued, and for an
    /// out-of-range layer. Returns whether a session is now active for
    /// this pair.
    pub fn begin_layer_rotation(&mut self, axis: Axis, layer: usize) -> bool {
        if let Some(drag) = &self.drag {
            if drag.axis == axis && drag.layer == layer {
                return true;
            }
            log::warn!(
                "drag rotation on {:?}/{} replaces unfinished session on {:?}/{}",
                axis,
                layer,
                drag.axis,
                drag.layer
            );
            // The old layer must not be left frozen mid-angle; its
            // off-grid positions would escape later layer collection.
            self.rewind_drag();
        }
        if self.is_animating() {
            log::warn!("drag rotation on {axis:?}/{layer} rejected: animation in flight");
            return false;
        }
        if layer >= self.lattice.layer_count(axis) {
            log::warn!("drag rotation rejected: layer {layer} out of range on {axis:?}");
            return false;
        }

        let affected = self.collect_layer_instances(axis, layer);
        let pivot = self.pivot_of(&affected);
        let base_transforms = affected
            .iter()
            .map(|&index| self.lattice.instances()[index].transform)
            .collect();
        let attachment_bases = self
            .lattice
            .attachments()
            .iter()
            .enumerate()
            .filter(|(_, attachment)| affected.contains(&attachment.instance))
            .map(|(index, attachment)| (index, attachment.transform))
            .collect();

        self.drag = Some(DragRotation {
            axis,
            layer,
            pivot,
            affected,
            base_transforms,
            attachment_bases,
        });
        true
    }

    /// Positions the layer at an absolute angle relative to the session
    /// snapshot.
    ///
    /// Starts a session if none is active for this pair. The transforms
    /// are computed directly from the snapshot rather than incrementally,
    /// so the call is idempotent for a repeated angle, callers may scrub
    /// the angle freely in either direction, and an angle of zero
    /// restores the snapshot exactly.
    pub fn set_layer_rotation(&mut self, axis: Axis, layer: usize, angle_degrees: f32) {
        let session_matches = self
            .drag
            .as_ref()
            .is_some_and(|drag| drag.axis == axis && drag.layer == layer);
        if !session_matches && !self.begin_layer_rotation(axis, layer) {
            return;
        }
        let Some(drag) = self.drag.take() else {
            return;
        };

        let delta = axis_rotation(axis, angle_degrees);
        for (&index, base) in drag.affected.iter().zip(&drag.base_transforms) {
            self.lattice.instances_mut()[index].transform = rotate_about(base, &delta, &drag.pivot);
        }
        for &(index, ref base) in &drag.attachment_bases {
            self.lattice.attachments_mut()[index].transform =
                rotate_about(base, &delta, &drag.pivot);
        }

        self.drag = Some(drag);
    }

    /// Tears down the continuous drag session, if any.
    ///
    /// The single exit path for every way a drag can end, normal or
    /// aborted: releases the snapshot and the affected-instance list and
    /// leaves the live transforms as the resting baseline.
    pub fn end_layer_rotation_drag(&mut self) {
        self.drag = None;
    }

    /// Restores the drag session's snapshot transforms and drops it.
    fn rewind_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        for (&index, base) in drag.affected.iter().zip(&drag.base_transforms) {
            self.lattice.instances_mut()[index].transform = *base;
        }
        for &(index, ref base) in &drag.attachment_bases {
            self.lattice.attachments_mut()[index].transform = *base;
        }
    }

    /// Starts an animated rotation of `total_degrees` on a layer.
    ///
    /// Rejected (no state change, logged) while another job is in flight
    /// or when the layer is out of range for the axis. The affected
    /// instances are frozen at job start; each tick advances the
    /// rotation by at most `rotation_speed * dt` degrees until the
    /// remainder reaches zero, then a [`RotationComplete`] event fires.
    pub fn rotate_layer(&mut self, axis: Axis, layer: usize, total_degrees: f32) -> bool {
        if self.job.is_some() {
            log::warn!("rotate_layer({axis:?}, {layer}) rejected: job already in flight");
            return false;
        }
        if layer >= self.lattice.layer_count(axis) {
            log::warn!("rotate_layer rejected: layer {layer} out of range on {axis:?}");
            return false;
        }

        let affected = self.collect_layer_instances(axis, layer);
        self.job = Some(RotationJob {
            axis,
            layer,
            remaining_degrees: total_degrees,
            affected,
        });
        true
    }

    /// Queues `moves` random quarter turns.
    ///
    /// Moves are played back one at a time by [`Self::tick`]; each waits
    /// for the previous job to complete, so the animated-job mutual
    /// exclusion is never violated.
    pub fn scramble(&mut self, moves: usize) {
        self.scramble_with_rng(moves, &mut rand::thread_rng());
    }

    /// [`Self::scramble`] with the configured move count.
    pub fn scramble_default(&mut self) {
        let moves = self.config().scramble_moves;
        self.scramble(moves);
    }

    /// [`Self::scramble`] with a caller-supplied source of randomness.
    pub fn scramble_with_rng<R: Rng>(&mut self, moves: usize, rng: &mut R) {
        for _ in 0..moves {
            let axis = match rng.gen_range(0..3) {
                0 => Axis::X,
                1 => Axis::Y,
                _ => Axis::Z,
            };
            let layer = rng.gen_range(0..self.lattice.layer_count(axis));
            let degrees = if rng.gen_bool(0.5) { 90.0 } else { -90.0 };
            self.pending_moves.push_back((axis, layer, degrees));
        }
    }

    /// Discards all rotation state and reinstates the exact
    /// post-construction transforms.
    pub fn reset(&mut self) {
        self.job = None;
        self.drag = None;
        self.pending_moves.clear();
        self.completed.clear();
        for instance in self.lattice.instances_mut() {
            instance.transform = instance.initial;
        }
        for attachment in self.lattice.attachments_mut() {
            attachment.transform = attachment.initial;
        }
    }

    /// Advances rotation state by one frame.
    ///
    /// Pops the next queued move when no job and no drag session is
    /// active (queued moves wait out a live drag rather than fight its
    /// snapshot); otherwise advances the in-flight job by
    /// `sign(remaining) * min(speed * dt, |remaining|)` degrees. All affected instances are updated from the same pivot
    /// within the call, so a renderer never observes a partially rotated
    /// layer. Completion leaves the resting transforms as the permanent
    /// baseline, fires the completion event, and clears any active drag
    /// session.
    pub fn tick(&mut self, dt: f32) {
        if self.job.is_none() && self.drag.is_none() {
            if let Some((axis, layer, degrees)) = self.pending_moves.pop_front() {
                // Queued moves collect their layer when they start, not
                // when they were enqueued; earlier turns may have moved
                // blocks into or out of the slot.
                if !self.rotate_layer(axis, layer, degrees) {
                    log::warn!("queued move on {axis:?}/{layer} dropped");
                }
            }
        }

        let Some(mut job) = self.job.take() else {
            return;
        };

        let speed = self.lattice.config().rotation_speed;
        let step = job.remaining_degrees.signum()
            * (speed * dt).min(job.remaining_degrees.abs());

        if step != 0.0 {
            let pivot = self.pivot_of(&job.affected);
            let delta = axis_rotation(job.axis, step);
            for &index in &job.affected {
                let base = self.lattice.instances()[index].transform;
                self.lattice.instances_mut()[index].transform =
                    rotate_about(&base, &delta, &pivot);
            }
            let attachment_count = self.lattice.attachments().len();
            for index in 0..attachment_count {
                let attachment = &self.lattice.attachments()[index];
                if !job.affected.contains(&attachment.instance) {
                    continue;
                }
                let base = attachment.transform;
                self.lattice.attachments_mut()[index].transform =
                    rotate_about(&base, &delta, &pivot);
            }
            job.remaining_degrees -= step;
        }

        if job.remaining_degrees.abs() <= REMAINING_EPSILON {
            self.completed.push(RotationComplete {
                axis: job.axis,
                layer: job.layer,
            });
            // The turn permanently changed layer membership; any drag
            // snapshot taken before it is stale.
            self.drag = None;
        } else {
            self.job = Some(job);
        }
    }
}

/// Quaternion for a rotation of `degrees` about a lattice axis.
fn axis_rotation(axis: Axis, degrees: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis.unit()), degrees.to_radians())
}

/// Rigid rotation of a transform about a pivot: the offset from the
/// pivot is rotated and re-added, the delta is premultiplied onto the
/// orientation, scale is untouched.
fn rotate_about(base: &Transform, delta: &UnitQuaternion<f32>, pivot: &Point3<f32>) -> Transform {
    let offset = base.position - pivot;
    Transform {
        position: pivot + delta.transform_vector(&offset),
        rotation: delta * base.rotation,
        scale: base.scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn cube() -> MagicCube {
        MagicCube::new(CubeConfig::default())
    }

    /// Runs ticks until the queue and job drain, with a safety cap.
    fn run_to_idle(cube: &mut MagicCube) {
        for _ in 0..1000 {
            if !cube.is_animating() {
                return;
            }
            cube.tick(1.0 / 60.0);
        }
        panic!("cube did not settle");
    }

    #[test]
    fn layer_collection_matches_grid() {
        let cube = cube();
        // A 3x3x3 has nine blocks per layer.
        for layer in 0..3 {
            assert_eq!(cube.collect_layer_instances(Axis::Z, layer).len(), 9);
            assert_eq!(cube.collect_layer_instances(Axis::X, layer).len(), 9);
        }
    }

    #[test]
    fn pivot_distances_are_preserved() {
        let mut cube = cube();
        let affected = cube.collect_layer_instances(Axis::Y, 0);
        let pivot = cube.pivot_of(&affected);
        let before: Vec<f32> = affected
            .iter()
            .map(|&i| (cube.lattice().instances()[i].transform.position - pivot).norm())
            .collect();

        cube.set_layer_rotation(Axis::Y, 0, 37.0);
        for (&index, &distance) in affected.iter().zip(&before) {
            let after = (cube.lattice().instances()[index].transform.position - pivot).norm();
            assert_relative_eq!(after, distance, epsilon = 1e-3);
        }
    }

    #[test]
    fn non_members_are_untouched() {
        let mut cube = cube();
        let affected = cube.collect_layer_instances(Axis::Z, 2);
        let before: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();

        cube.set_layer_rotation(Axis::Z, 2, 63.0);
        for (index, original) in before.iter().enumerate() {
            if affected.contains(&index) {
                continue;
            }
            assert_eq!(cube.lattice().instances()[index].transform, *original);
        }
    }

    #[test]
    fn absolute_positioning_is_idempotent() {
        let mut cube = cube();
        cube.set_layer_rotation(Axis::X, 1, 30.0);
        let first: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();
        cube.set_layer_rotation(Axis::X, 1, 30.0);
        let second: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_angle_restores_the_snapshot() {
        let mut cube = cube();
        let before: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();

        // Scrub through several angles, including past zero.
        for angle in [15.0, 80.0, -45.0, 5.0, 0.0] {
            cube.set_layer_rotation(Axis::Z, 0, angle);
        }
        for (instance, original) in cube.lattice().instances().iter().zip(&before) {
            assert_eq!(instance.transform, *original);
        }
    }

    #[test]
    fn animated_jobs_are_mutually_exclusive() {
        let mut cube = cube();
        assert!(cube.rotate_layer(Axis::Z, 0, 90.0));
        cube.tick(0.01);
        let mid: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();

        // The second request is rejected and the in-flight job's state
        // is unchanged.
        assert!(!cube.rotate_layer(Axis::X, 1, 90.0));
        let after: Vec<Transform> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();
        assert_eq!(mid, after);

        run_to_idle(&mut cube);
        assert_eq!(
            cube.drain_completed(),
            vec![RotationComplete {
                axis: Axis::Z,
                layer: 0
            }]
        );
    }

    #[test]
    fn out_of_range_layer_is_rejected() {
        let mut cube = cube();
        assert!(!cube.rotate_layer(Axis::Y, 3, 90.0));
        assert!(!cube.is_animating());
    }

    #[test]
    fn completed_quarter_turn_updates_layer_membership() {
        let mut cube = cube();
        let front_before = cube.collect_layer_instances(Axis::X, 0);
        assert!(cube.rotate_layer(Axis::Z, 2, 90.0));
        run_to_idle(&mut cube);

        // Top-layer blocks that were in the front column moved; the
        // front layer is still fully populated, but by different
        // instances.
        let front_after = cube.collect_layer_instances(Axis::X, 0);
        assert_eq!(front_after.len(), 9);
        assert_ne!(front_before, front_after);
    }

    #[test]
    fn rotation_advances_at_the_configured_speed() {
        let mut config = CubeConfig::default();
        config.rotation_speed = 90.0;
        let mut cube = MagicCube::new(config);
        assert!(cube.rotate_layer(Axis::Z, 0, 90.0));

        // Half a second at 90 deg/s leaves half the turn outstanding.
        for _ in 0..5 {
            cube.tick(0.1);
        }
        assert!(cube.is_animating());
        assert!(cube.drain_completed().is_empty());

        for _ in 0..6 {
            cube.tick(0.1);
        }
        assert!(!cube.is_animating());
        assert_eq!(cube.drain_completed().len(), 1);
    }

    #[test]
    fn scramble_moves_run_serially_and_all_complete() {
        let mut cube = cube();
        let mut rng = rand::rngs::mock::StepRng::new(7, 11);
        cube.scramble_with_rng(5, &mut rng);
        assert!(cube.is_animating());
        run_to_idle(&mut cube);
        assert_eq!(cube.drain_completed().len(), 5);

        // Every block is still on some layer slot along every axis.
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let mut covered = 0;
            for layer in 0..3 {
                covered += cube.collect_layer_instances(axis, layer).len();
            }
            assert_eq!(covered, 27);
        }
    }

    #[test]
    fn queued_moves_wait_for_an_active_drag() {
        let mut cube = cube();
        assert!(cube.begin_layer_rotation(Axis::Z, 2));
        cube.set_layer_rotation(Axis::Z, 2, 30.0);

        let mut rng = rand::rngs::mock::StepRng::new(3, 13);
        cube.scramble_with_rng(2, &mut rng);
        let held: Vec<_> = cube
            .lattice()
            .instances()
            .iter()
            .map(|i| i.transform)
            .collect();
        for _ in 0..5 {
            cube.tick(1.0 / 60.0);
        }

        // The queue waits out the drag: nothing moved, nothing completed,
        // and the session still holds its snapshot.
        assert!(cube.is_dragging());
        assert!(cube.drain_completed().is_empty());
        for (instance, before) in cube.lattice().instances().iter().zip(&held) {
            assert_eq!(instance.transform, *before);
        }

        cube.set_layer_rotation(Axis::Z, 2, 0.0);
        cube.end_layer_rotation_drag();
        run_to_idle(&mut cube);
        assert_eq!(cube.drain_completed().len(), 2);
    }

    #[test]
    fn replacing_a_drag_session_rewinds_the_old_layer() {
        let mut cube = cube();
        assert!(cube.begin_layer_rotation(Axis::Z, 2));
        cube.set_layer_rotation(Axis::Z, 2, 40.0);

        // A session on a different pair replaces the old one; the old
        // layer must return to its snapshot, not freeze mid-angle.
        assert!(cube.begin_layer_rotation(Axis::X, 0));
        for instance in cube.lattice().instances() {
            assert_eq!(instance.transform, instance.initial);
        }
        for attachment in cube.lattice().attachments() {
            assert_eq!(attachment.transform, attachment.initial);
        }
        // Layer collection sees clean grid coordinates again.
        assert_eq!(cube.collect_layer_instances(Axis::Z, 2).len(), 9);
        cube.end_layer_rotation_drag();
    }

    #[test]
    fn reset_restores_initial_transforms() {
        let mut cube = cube();
        assert!(cube.rotate_layer(Axis::Y, 2, 90.0));
        run_to_idle(&mut cube);
        cube.set_layer_rotation(Axis::Z, 0, 33.0);
        cube.reset();

        assert!(!cube.is_animating());
        assert!(!cube.is_dragging());
        for instance in cube.lattice().instances() {
            assert_eq!(instance.transform, instance.initial);
        }
        for attachment in cube.lattice().attachments() {
            assert_eq!(attachment.transform, attachment.initial);
        }
    }

    #[test]
    fn drag_is_rejected_while_animating() {
        let mut cube = cube();
        assert!(cube.rotate_layer(Axis::Z, 0, 90.0));
        assert!(!cube.begin_layer_rotation(Axis::X, 0));
        // The rejected drag must not have disturbed anything.
        assert!(!cube.is_dragging());
    }

    #[test]
    fn attachments_follow_their_layer() {
        let mut cube = cube();
        let attachment_z = cube.lattice().attachments()[0].transform.position.z;
        cube.set_layer_rotation(Axis::X, 0, 90.0);

        // Attachments ride on top-layer blocks; the front column of the
        // top layer rotated away from the top.
        let moved = cube
            .lattice()
            .attachments()
            .iter()
            .filter(|a| (a.transform.position.z - attachment_z).abs() > 1.0)
            .count();
        assert_eq!(moved, 3);
        cube.end_layer_rotation_drag();
    }

    #[test]
    fn quarter_turn_lands_blocks_back_on_grid() {
        let mut cube = cube();
        assert!(cube.rotate_layer(Axis::Z, 1, -90.0));
        run_to_idle(&mut cube);

        let size = cube.config().block_size;
        for &index in &cube.collect_layer_instances(Axis::Z, 1) {
            let position = cube.lattice().instances()[index].transform.position;
            for component in [position.x, position.y] {
                let cells = component / size;
                assert_abs_diff_eq!(cells, cells.round(), epsilon = 1e-2);
            }
        }
    }
}
