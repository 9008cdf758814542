//! Interactive logic for a virtual Rubik's-style cube.
//!
//! The crate covers the hard middle of cube interaction: deciding which
//! face and layer a 2D drag gesture means despite perspective ambiguity,
//! and rotating exactly the affected slice of instanced geometry around
//! its pivot, continuously while the drag follows the pointer and
//! animated for programmatic turns and release snapping.
//!
//! The host owns everything around it: raycasting the pointer into the
//! scene (delivered as a [`selector::PickHit`]), projecting world points
//! to the screen (the [`gesture::ScreenProjector`] trait), camera
//! control, and rendering. A typical frame loop feeds pointer events to
//! a [`interaction::DragInteraction`], ticks the [`cube::MagicCube`],
//! and drains completion events.

pub mod config;
pub mod cube;
pub mod face;
pub mod gesture;
pub mod interaction;
pub mod lattice;
pub mod selector;

pub use config::CubeConfig;
pub use cube::{MagicCube, RotationComplete};
pub use face::{Axis, Face};
pub use gesture::ScreenProjector;
pub use interaction::DragInteraction;
pub use lattice::{CubeLattice, Transform};
pub use selector::PickHit;
