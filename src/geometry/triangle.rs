//! Triangle types produced by the mesh assembler

use serde::{Deserialize, Serialize};

use crate::render::{
    mat4_transform_point, BlendMode, BoundingBox, Color, Mat4, TextureMode, Vec2, Vec3,
};

/// Vertex of an opaque mesh buffer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub colour: Color,
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2, colour: Color) -> Self {
        Self { position, normal, uv, colour }
    }
}

/// Normal of the plane through the first three points, from normalised edges
pub fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).normalize().cross((v2 - v0).normalize())
}

/// Triangle used for picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionTriangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
    pub normal: Vec3,
}

impl CollisionTriangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self {
            v0,
            v1,
            v2,
            normal: (v2 - v1).cross(v1 - v0),
        }
    }

    /// Same corners, opposite winding
    pub fn reversed(&self) -> Self {
        Self::new(self.v2, self.v1, self.v0)
    }

    /// Distance along `direction` at which the ray crosses the triangle
    ///
    /// Both windings are hit; callers wanting front faces check `normal`.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let p = direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let from_v0 = origin - self.v0;
        let u = from_v0.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = from_v0.cross(edge1);
        let v = direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = edge2.dot(q) * inv_det;
        (distance > 0.0).then_some(distance)
    }
}

/// Texture value of a triangle drawn without a texture
pub const UNTEXTURED: u32 = u32::MAX;

/// Triangle queued for the transparency pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransparentTriangle {
    pub vertices: [Vec3; 3],
    pub uvs: [Vec2; 3],
    pub colours: [Color; 3],
    /// Tile index, or `UNTEXTURED`
    pub texture: u32,
    pub texture_mode: TextureMode,
    pub blend_mode: BlendMode,
    /// Sort key: centre of the triangle's bounding box
    pub position: Vec3,
}

impl TransparentTriangle {
    pub fn new(vertices: [Vec3; 3], uvs: [Vec2; 3], texture: u32, blend_mode: BlendMode) -> Self {
        Self {
            vertices,
            uvs,
            colours: [Color::WHITE; 3],
            texture,
            texture_mode: TextureMode::Textured,
            blend_mode,
            position: centre_of(&vertices),
        }
    }

    /// Flat coloured triangle, alpha blended
    pub fn untextured(vertices: [Vec3; 3], colour: Color) -> Self {
        Self {
            vertices,
            uvs: [Vec2::ZERO; 3],
            colours: [colour; 3],
            texture: UNTEXTURED,
            texture_mode: TextureMode::Untextured,
            blend_mode: BlendMode::Normal,
            position: centre_of(&vertices),
        }
    }

    /// Corners in opposite winding, UVs and colours following their corners
    pub fn reversed(&self) -> Self {
        let mut reversed = *self;
        reversed.vertices.reverse();
        reversed.uvs.reverse();
        reversed.colours.reverse();
        reversed
    }

    pub fn normal(&self) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        face_normal(v0, v1, v2)
    }

    /// Copy moved into world space, optionally tinted
    pub fn transform(&self, matrix: &Mat4, colour_override: Color, use_colour_override: bool) -> Self {
        let vertices = self.vertices.map(|v| mat4_transform_point(matrix, v));
        Self {
            vertices,
            colours: if use_colour_override { [colour_override; 3] } else { self.colours },
            position: centre_of(&vertices),
            ..*self
        }
    }
}

fn centre_of(vertices: &[Vec3; 3]) -> Vec3 {
    BoundingBox::from_points(vertices.iter().copied()).centre()
}
