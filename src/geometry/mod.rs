//! Mesh Assembler
//!
//! - `triangle` - mesh vertices, collision and transparent triangles
//! - `mesh` - the assembler, assembled meshes, picking, cube and sprite meshes

pub mod mesh;
pub mod triangle;

pub use mesh::{
    Mesh, MeshAssembler, PickResult, SpriteMesh, SpriteOffsetMode,
    convert_vertex, create_cube_mesh, create_mesh, create_sprite_mesh,
};
pub use triangle::{face_normal, CollisionTriangle, MeshVertex, TransparentTriangle, UNTEXTURED};
