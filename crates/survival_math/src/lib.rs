//! # survival_math
//!
//! Math helpers for the survival simulation. Re-exports [`glam`] for linear
//! algebra and defines the small amount of movement geometry the tick
//! pipeline needs.

pub mod footprint;
pub mod heading;

// Re-export glam types for convenience.
pub use glam::{IVec3, Vec2, Vec3};

pub use footprint::Footprint;
pub use heading::{clamp_horizontal, forward_vector, planar_velocity, right_vector};
