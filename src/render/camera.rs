//! Viewer position for the transparency pass
//!
//! Depth sorting, sprite billboarding and the skybox only need the eye
//! position. Orientation and projection belong to the host renderer.

use super::math::Vec3;

/// Eye position in world units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub position: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}
