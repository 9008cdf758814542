//! Gesture-to-face resolution.
//!
//! Maps an accumulated 2D drag to the target face whose screen-space
//! rotation direction it best matches. Ideal directions are recomputed
//! through the live camera projection every time a lock is attempted,
//! so the resolver stays correct under arbitrary camera orientation.

use nalgebra::{Point3, Vector2};

use crate::face::Face;

/// Distance along the rotate direction at which the reference point is
/// placed before projecting; far enough from the center to survive
/// projection rounding near the cube.
const DIRECTION_OFFSET: f32 = 100.0;

/// Screen directions shorter than this after projection carry no usable
/// orientation and are excluded from scoring.
const MIN_SCREEN_DIRECTION: f32 = 1e-4;

/// World-to-screen projection supplied by the host.
///
/// Returns `None` when the point is behind the camera or outside the
/// frustum, in which case the candidate relying on it is skipped.
pub trait ScreenProjector {
    fn project(&self, world: Point3<f32>) -> Option<Vector2<f32>>;
}

/// Resolver state: a lock is one-way for the remainder of the drag.
#[derive(Clone, Copy, Debug, PartialEq)]
enum GestureState {
    Undecided,
    Locked(Face),
}

/// Accumulates a screen-space drag and picks the best-matching target
/// face once asked to lock.
#[derive(Clone, Debug)]
pub struct GestureResolver {
    targets: Vec<Face>,
    accumulated: Vector2<f32>,
    total_distance: f32,
    state: GestureState,
}

impl GestureResolver {
    pub fn new(targets: Vec<Face>) -> Self {
        Self {
            targets,
            accumulated: Vector2::zeros(),
            total_distance: 0.0,
            state: GestureState::Undecided,
        }
    }

    /// Adds one pointer-move delta to the running drag.
    pub fn accumulate(&mut self, delta: Vector2<f32>) {
        self.accumulated += delta;
        self.total_distance += delta.norm();
    }

    /// Net drag vector since the session started.
    pub fn accumulated(&self) -> Vector2<f32> {
        self.accumulated
    }

    /// Total traveled pointer distance since the session started.
    pub fn total_distance(&self) -> f32 {
        self.total_distance
    }

    /// The locked target face, if any.
    pub fn locked(&self) -> Option<Face> {
        match self.state {
            GestureState::Locked(face) => Some(face),
            GestureState::Undecided => None,
        }
    }

    /// Attempts to lock a target face from the accumulated drag.
    ///
    /// For each target face, projects `cube_center` and a point offset
    /// from it along the face's rotate direction, and scores the face by
    /// the absolute dot product of the normalized drag with the
    /// normalized projected direction. Candidates whose projection fails
    /// or degenerates are excluded; if every candidate is excluded no
    /// face is locked and the gesture stays a no-op pan.
    ///
    /// Once locked, subsequent calls return the locked face without
    /// rescoring; re-entering the undecided state takes a new resolver.
    pub fn lock(
        &mut self,
        projector: &dyn ScreenProjector,
        cube_center: Point3<f32>,
    ) -> Option<Face> {
        if let GestureState::Locked(face) = self.state {
            return Some(face);
        }

        let drag = self.accumulated;
        if drag.norm() <= f32::EPSILON {
            return None;
        }
        let drag_dir = drag.normalize();

        let Some(center_screen) = projector.project(cube_center) else {
            log::warn!("cube center failed to project; gesture treated as pan");
            return None;
        };

        let mut best: Option<(Face, f32)> = None;
        for &face in &self.targets {
            let reference = cube_center + face.rotate_direction() * DIRECTION_OFFSET;
            let Some(reference_screen) = projector.project(reference) else {
                log::debug!("rotate direction for {face:?} projects off-screen; excluded");
                continue;
            };
            let screen_dir = reference_screen - center_screen;
            if screen_dir.norm() < MIN_SCREEN_DIRECTION {
                log::debug!("rotate direction for {face:?} degenerates on screen; excluded");
                continue;
            }
            let score = drag_dir.dot(&screen_dir.normalize()).abs();
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((face, score));
            }
        }

        if let Some((face, _)) = best {
            self.state = GestureState::Locked(face);
            Some(face)
        } else {
            None
        }
    }
}
