//! Mesh assembly
//!
//! `MeshAssembler` takes decoded faces and the vertex pool of one mesh record
//! and builds:
//!
//! - per-tile index lists for opaque textured faces
//! - one untextured index list for flat coloured faces
//! - `TransparentTriangle`s for anything with a blend mode
//! - collision triangles for picking
//!
//! Positions are converted from file units to world units on the way in.

use serde::{Deserialize, Serialize};

use crate::decode::{
    decode_coloured, decode_rectangles, decode_triangles, ColouredFace, NormalizedFace,
    INITIAL_TEXTURE,
};
use crate::level::{LevelFormat, MeshRecord, SpriteTexture, Vertex, SCALE_X, SCALE_Y, SCALE_Z};
use crate::render::{BlendMode, BoundingBox, Color, Vec2, Vec3};
use crate::texture::TextureSource;

use super::triangle::{face_normal, CollisionTriangle, MeshVertex, TransparentTriangle};

/// Triangles a face is split into, as corner indices
const QUAD_TRIANGLES: [[usize; 3]; 2] = [[0, 1, 2], [2, 3, 0]];
const TRIANGLE_TRIANGLES: [[usize; 3]; 1] = [[0, 1, 2]];

fn face_triangles<const N: usize>() -> &'static [[usize; 3]] {
    if N == 4 {
        &QUAD_TRIANGLES
    } else {
        &TRIANGLE_TRIANGLES
    }
}

/// File units to world units
pub fn convert_vertex(vertex: &Vertex) -> Vec3 {
    Vec3::new(
        vertex.x as f32 / SCALE_X,
        vertex.y as f32 / SCALE_Y,
        vertex.z as f32 / SCALE_Z,
    )
}

/// Look up a face's corners in the pool, `None` if any index is out of range
fn face_positions<const N: usize>(indices: &[u16; N], pool: &[Vertex]) -> Option<[Vec3; N]> {
    let mut positions = [Vec3::ZERO; N];
    for (position, &index) in positions.iter_mut().zip(indices) {
        *position = convert_vertex(pool.get(index as usize)?);
    }
    Some(positions)
}

/// Nearest hit of a pick ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub distance: f32,
    pub position: Vec3,
}

/// Assembled geometry for one mesh record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<MeshVertex>,
    tile_indices: Vec<Vec<u32>>,
    untextured_indices: Vec<u32>,
    transparent_triangles: Vec<TransparentTriangle>,
    collision_triangles: Vec<CollisionTriangle>,
    bounding_box: BoundingBox,
}

impl Mesh {
    pub fn new(
        vertices: Vec<MeshVertex>,
        tile_indices: Vec<Vec<u32>>,
        untextured_indices: Vec<u32>,
        transparent_triangles: Vec<TransparentTriangle>,
        collision_triangles: Vec<CollisionTriangle>,
    ) -> Self {
        let bounding_box = BoundingBox::from_points(
            vertices
                .iter()
                .map(|v| v.position)
                .chain(transparent_triangles.iter().flat_map(|t| t.vertices)),
        );
        Self {
            vertices,
            tile_indices,
            untextured_indices,
            transparent_triangles,
            collision_triangles,
            bounding_box,
        }
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Index list for each tile; tiles with no opaque faces have an empty list
    pub fn tile_indices(&self) -> &[Vec<u32>] {
        &self.tile_indices
    }

    pub fn untextured_indices(&self) -> &[u32] {
        &self.untextured_indices
    }

    pub fn transparent_triangles(&self) -> &[TransparentTriangle] {
        &self.transparent_triangles
    }

    pub fn collision_triangles(&self) -> &[CollisionTriangle] {
        &self.collision_triangles
    }

    /// Covers opaque vertices and transparent triangles; zero-sized when empty
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.transparent_triangles.is_empty()
    }

    /// Cast a ray against the collision triangles in mesh space
    ///
    /// Only triangles facing the ray are tested. Returns the nearest hit.
    pub fn pick(&self, origin: Vec3, direction: Vec3) -> Option<PickResult> {
        let distance = self
            .collision_triangles
            .iter()
            .filter(|tri| direction.dot(tri.normal) < 0.0)
            .filter_map(|tri| tri.intersect(origin, direction))
            .min_by(|a, b| a.total_cmp(b))?;

        Some(PickResult {
            distance,
            position: origin + direction * distance,
        })
    }
}

/// Accumulates faces into the buffers of a `Mesh`
#[derive(Debug, Default)]
pub struct MeshAssembler {
    transparent_collision: bool,
    vertices: Vec<MeshVertex>,
    tile_indices: Vec<Vec<u32>>,
    untextured_indices: Vec<u32>,
    transparent_triangles: Vec<TransparentTriangle>,
    collision_triangles: Vec<CollisionTriangle>,
}

impl MeshAssembler {
    /// `transparent_collision` controls whether transparent faces can be picked
    pub fn new(transparent_collision: bool) -> Self {
        Self {
            transparent_collision,
            ..Default::default()
        }
    }

    pub fn add_rectangle(&mut self, face: &NormalizedFace<4>, pool: &[Vertex]) -> bool {
        self.add_textured(face, pool)
    }

    pub fn add_triangle(&mut self, face: &NormalizedFace<3>, pool: &[Vertex]) -> bool {
        self.add_textured(face, pool)
    }

    pub fn add_coloured_rectangle(&mut self, face: &ColouredFace<4>, colour: Color, pool: &[Vertex]) -> bool {
        self.add_coloured(face, colour, pool)
    }

    pub fn add_coloured_triangle(&mut self, face: &ColouredFace<3>, colour: Color, pool: &[Vertex]) -> bool {
        self.add_coloured(face, colour, pool)
    }

    /// Returns false (and adds nothing) if the face references a vertex
    /// outside the pool
    fn add_textured<const N: usize>(&mut self, face: &NormalizedFace<N>, pool: &[Vertex]) -> bool {
        let Some(positions) = face_positions(&face.vertices, pool) else {
            log::warn!("skipping textured face with vertices {:?}: pool has {}", face.vertices, pool.len());
            return false;
        };

        if face.blend_mode.is_transparent() {
            self.add_transparent(face, &positions);
            if self.transparent_collision {
                self.add_collision::<N>(&positions, face.double_sided);
            }
            return true;
        }

        let base = self.push_vertices(&positions, |i| face.uvs[i], Color::WHITE);
        let tile = face.tile as usize;
        if tile >= self.tile_indices.len() {
            self.tile_indices.resize_with(tile + 1, Vec::new);
        }
        push_indices::<N>(&mut self.tile_indices[tile], base, face.double_sided);
        self.add_collision::<N>(&positions, face.double_sided);
        true
    }

    fn add_coloured<const N: usize>(&mut self, face: &ColouredFace<N>, colour: Color, pool: &[Vertex]) -> bool {
        let Some(positions) = face_positions(&face.vertices, pool) else {
            log::warn!("skipping coloured face with vertices {:?}: pool has {}", face.vertices, pool.len());
            return false;
        };

        let base = self.push_vertices(&positions, |_| Vec2::ZERO, colour);
        push_indices::<N>(&mut self.untextured_indices, base, face.double_sided);
        self.add_collision::<N>(&positions, face.double_sided);
        true
    }

    fn add_transparent<const N: usize>(&mut self, face: &NormalizedFace<N>, positions: &[Vec3; N]) {
        let triangles: Vec<TransparentTriangle> = face_triangles::<N>()
            .iter()
            .map(|corners| {
                TransparentTriangle::new(
                    corners.map(|c| positions[c]),
                    corners.map(|c| face.uvs[c]),
                    face.tile,
                    face.blend_mode,
                )
            })
            .collect();

        if face.double_sided {
            let reversed: Vec<TransparentTriangle> = triangles.iter().map(|t| t.reversed()).collect();
            self.transparent_triangles.extend(triangles);
            self.transparent_triangles.extend(reversed);
        } else {
            self.transparent_triangles.extend(triangles);
        }
    }

    fn add_collision<const N: usize>(&mut self, positions: &[Vec3; N], double_sided: bool) {
        let triangles = face_triangles::<N>();
        for [a, b, c] in triangles {
            self.collision_triangles
                .push(CollisionTriangle::new(positions[*a], positions[*b], positions[*c]));
        }
        if double_sided {
            for [a, b, c] in triangles {
                self.collision_triangles
                    .push(CollisionTriangle::new(positions[*c], positions[*b], positions[*a]));
            }
        }
    }

    /// Push one vertex per corner sharing the face normal; returns the first index
    fn push_vertices<const N: usize>(
        &mut self,
        positions: &[Vec3; N],
        uv: impl Fn(usize) -> Vec2,
        colour: Color,
    ) -> u32 {
        let base = self.vertices.len() as u32;
        let normal = face_normal(positions[0], positions[1], positions[2]);
        self.vertices.extend(
            positions
                .iter()
                .enumerate()
                .map(|(i, &position)| MeshVertex::new(position, normal, uv(i), colour)),
        );
        base
    }

    pub fn finish(self) -> Mesh {
        Mesh::new(
            self.vertices,
            self.tile_indices,
            self.untextured_indices,
            self.transparent_triangles,
            self.collision_triangles,
        )
    }
}

/// Forward triangles first, then the reversed set for double-sided faces
fn push_indices<const N: usize>(indices: &mut Vec<u32>, base: u32, double_sided: bool) {
    let triangles = face_triangles::<N>();
    for corners in triangles {
        indices.extend(corners.iter().map(|&c| base + c as u32));
    }
    if double_sided {
        for corners in triangles {
            indices.extend(corners.iter().rev().map(|&c| base + c as u32));
        }
    }
}

/// Build the mesh for one record
///
/// Textured faces are decoded in record order, rectangles then triangles,
/// with the fallback texture carried across both lists.
pub fn create_mesh<T: TextureSource + ?Sized>(
    record: &MeshRecord,
    format: &LevelFormat,
    textures: &T,
    transparent_collision: bool,
) -> Mesh {
    let mut assembler = MeshAssembler::new(transparent_collision);
    let pool = &record.vertices;

    let (rectangles, previous) = decode_rectangles(&record.textured_rectangles, format, textures, INITIAL_TEXTURE);
    let (triangles, _) = decode_triangles(&record.textured_triangles, format, textures, previous);

    for face in &rectangles {
        assembler.add_rectangle(face, pool);
    }
    for face in &triangles {
        assembler.add_triangle(face, pool);
    }
    for raw in &record.coloured_rectangles {
        let face = decode_coloured(raw);
        assembler.add_coloured_rectangle(&face, textures.palette_colour(face.colour), pool);
    }
    for raw in &record.coloured_triangles {
        let face = decode_coloured(raw);
        assembler.add_coloured_triangle(&face, textures.palette_colour(face.colour), pool);
    }

    let mesh = assembler.finish();
    log::trace!(
        "mesh: {} vertices, {} transparent, {} collision",
        mesh.vertices.len(),
        mesh.transparent_triangles.len(),
        mesh.collision_triangles.len()
    );
    mesh
}

/// Unit cube centred on the origin, white and untextured
pub fn create_cube_mesh() -> Mesh {
    let down = Vec3::new(0.0, -1.0, 0.0);
    let up = Vec3::new(0.0, 1.0, 0.0);
    let left = Vec3::new(-1.0, 0.0, 0.0);
    let right = Vec3::new(1.0, 0.0, 0.0);
    let forward = Vec3::new(0.0, 0.0, -1.0);
    let backward = Vec3::new(0.0, 0.0, 1.0);

    let faces: [(Vec3, [(f32, f32, f32); 4]); 6] = [
        (down, [(-0.5, 0.5, -0.5), (0.5, 0.5, -0.5), (0.5, 0.5, 0.5), (-0.5, 0.5, 0.5)]),
        (left, [(0.5, -0.5, -0.5), (0.5, -0.5, 0.5), (0.5, 0.5, 0.5), (0.5, 0.5, -0.5)]),
        (right, [(-0.5, 0.5, -0.5), (-0.5, 0.5, 0.5), (-0.5, -0.5, 0.5), (-0.5, -0.5, -0.5)]),
        (forward, [(0.5, 0.5, 0.5), (0.5, -0.5, 0.5), (-0.5, 0.5, 0.5), (-0.5, -0.5, 0.5)]),
        (backward, [(0.5, -0.5, -0.5), (0.5, 0.5, -0.5), (-0.5, 0.5, -0.5), (-0.5, -0.5, -0.5)]),
        (up, [(0.5, -0.5, 0.5), (0.5, -0.5, -0.5), (-0.5, -0.5, -0.5), (-0.5, -0.5, 0.5)]),
    ];

    let vertices = faces
        .iter()
        .flat_map(|(normal, corners)| {
            corners.iter().map(move |&(x, y, z)| {
                MeshVertex::new(Vec3::new(x, y, z), *normal, Vec2::ZERO, Color::WHITE)
            })
        })
        .collect();

    // The +z face is laid out as a strip, not a fan
    let indices = vec![
        0, 1, 2, 2, 3, 0,
        4, 5, 6, 6, 7, 4,
        8, 9, 10, 10, 11, 8,
        12, 13, 14, 13, 15, 14,
        16, 17, 18, 18, 19, 16,
        20, 21, 22, 22, 23, 20,
    ];

    Mesh::new(vertices, Vec::new(), indices, Vec::new(), Vec::new())
}

/// Where a sprite sits relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpriteOffsetMode {
    /// Room sprites stand on the floor of their sector
    #[default]
    RoomSprite,
    /// Entity sprites are centred above the entity's position
    Entity,
}

/// Unit billboard quad plus the transform that sizes and places it
#[derive(Debug, Clone)]
pub struct SpriteMesh {
    pub mesh: Mesh,
    /// Per-axis scale from the sprite's side extents
    pub scale: Vec3,
    /// Translation applied after scaling
    pub offset: Vec3,
}

/// Build a billboard for a sprite texture record
pub fn create_sprite_mesh(sprite: &SpriteTexture, offset_mode: SpriteOffsetMode) -> SpriteMesh {
    let u = sprite.x as f32 / 256.0;
    let v = sprite.y as f32 / 256.0;
    let width = sprite.texel_width() as f32 / 256.0;
    let height = sprite.texel_height() as f32 / 256.0;

    let corners = [
        (Vec3::new(-0.5, -0.5, 0.0), Vec2::new(u, v + height)),
        (Vec3::new(0.5, -0.5, 0.0), Vec2::new(u + width, v + height)),
        (Vec3::new(-0.5, 0.5, 0.0), Vec2::new(u, v)),
        (Vec3::new(0.5, 0.5, 0.0), Vec2::new(u + width, v)),
    ];
    let triangle = |[a, b, c]: [usize; 3]| {
        TransparentTriangle::new(
            [corners[a].0, corners[b].0, corners[c].0],
            [corners[a].1, corners[b].1, corners[c].1],
            sprite.tile as u32,
            BlendMode::Normal,
        )
    };
    let transparent = vec![triangle([0, 1, 2]), triangle([2, 1, 3])];

    let object_width = (sprite.right as f32 - sprite.left as f32) / SCALE_X;
    let object_height = (sprite.bottom as f32 - sprite.top as f32) / SCALE_Y;
    let offset = match offset_mode {
        SpriteOffsetMode::RoomSprite => Vec3::new(0.0, (1.0 - object_height) * 0.5, 0.0),
        SpriteOffsetMode::Entity => Vec3::new(0.0, object_height / -2.0, 0.0),
    };

    SpriteMesh {
        mesh: Mesh::new(Vec::new(), Vec::new(), Vec::new(), transparent, Vec::new()),
        scale: Vec3::new(object_width, object_height, 1.0),
        offset,
    }
}
