//! Rendering primitives shared by the geometry pipeline
//!
//! - `math` - Vec3, Vec2, BoundingBox and the Mat4 helpers used to place instances
//! - `types` - Color, Color15, BlendMode, TextureMode
//! - `camera` - eye position for depth sorting and billboarding

pub mod camera;
pub mod math;
pub mod types;

pub use camera::Camera;
pub use math::{
    Vec2, Vec3, Mat4, BoundingBox,
    mat4_translation, mat4_rotation_y, mat4_scale_xyz, mat4_mul, mat4_transform_point,
};
pub use types::{BlendMode, Color, Color15, TextureMode};
