//! Face and axis labels for the cube lattice.
//!
//! The nine symbolic faces cover the six outer faces plus the three
//! middle-layer labels used when a dimension has interior layers. Every
//! face maps to a fixed normal, rotation axis, and rotate-direction
//! vector through lookup tables; nothing here depends on lattice size
//! except the layer index, which lives on the lattice itself.

use nalgebra::Vector3;

/// One of the three lattice axes a layer can rotate around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Unit vector for this axis.
    pub fn unit(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// Index into a `[countX, countY, countZ]` dimension triple.
    pub fn dimension_index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Symbolic face of the cube.
///
/// Six outer faces plus the three middle-layer labels: `Equatorial`
/// (between top and bottom), `Standing` (between front and back) and
/// `Middle` (between left and right). The middle labels only apply when
/// the corresponding dimension is at least 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Top,
    Bottom,
    Front,
    Back,
    Left,
    Right,
    Equatorial,
    Standing,
    Middle,
}

impl Face {
    /// All nine faces, outer faces first.
    pub const ALL: [Face; 9] = [
        Face::Top,
        Face::Bottom,
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
        Face::Equatorial,
        Face::Standing,
        Face::Middle,
    ];

    /// The six outer faces.
    pub const OUTER: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
    ];

    /// Outward unit normal for outer faces; the convention normal of the
    /// bounding outer face for middle layers.
    pub fn normal(self) -> Vector3<f32> {
        match self {
            Face::Top | Face::Equatorial => Vector3::new(0.0, 0.0, 1.0),
            Face::Bottom => Vector3::new(0.0, 0.0, -1.0),
            Face::Front | Face::Standing => Vector3::new(-1.0, 0.0, 0.0),
            Face::Back => Vector3::new(1.0, 0.0, 0.0),
            Face::Left | Face::Middle => Vector3::new(0.0, -1.0, 0.0),
            Face::Right => Vector3::new(0.0, 1.0, 0.0),
        }
    }

    /// The axis a twist of this face rotates around.
    pub fn axis(self) -> Axis {
        match self {
            Face::Top | Face::Bottom | Face::Equatorial => Axis::Z,
            Face::Front | Face::Back | Face::Standing => Axis::X,
            Face::Left | Face::Right | Face::Middle => Axis::Y,
        }
    }

    /// Velocity direction of a canonical reference point under positive
    /// rotation about the face's axis. Projected to screen space by the
    /// gesture resolver to obtain the ideal drag direction.
    pub fn rotate_direction(self) -> Vector3<f32> {
        match self.axis() {
            // rotation about Z moves a +X point toward +Y
            Axis::Z => Vector3::new(0.0, 1.0, 0.0),
            // rotation about X moves a +Y point toward +Z
            Axis::X => Vector3::new(0.0, 0.0, 1.0),
            // rotation about Y moves a +Z point toward +X
            Axis::Y => Vector3::new(1.0, 0.0, 0.0),
        }
    }

    /// Mechanically opposite outer face.
    ///
    /// Only defined for the six outer faces; middle-layer faces return
    /// themselves. Callers must treat a returned middle-layer face as a
    /// misuse sentinel, not as a meaningful opposite.
    pub fn opposite(self) -> Face {
        match self {
            Face::Top => Face::Bottom,
            Face::Bottom => Face::Top,
            Face::Front => Face::Back,
            Face::Back => Face::Front,
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            other => other,
        }
    }

    /// Whether this is one of the six outer faces.
    pub fn is_outer(self) -> bool {
        !matches!(self, Face::Equatorial | Face::Standing | Face::Middle)
    }
}
