//! Raw level records and their little-endian readers
//!
//! - `types` - format tags, faces, vertices, object textures, palettes
//! - `records` - byteorder readers for the PC record layouts

pub mod records;
pub mod types;

pub use records::{
    RecordError,
    read_mesh, read_face, read_vertex, read_object_texture, read_object_textures,
    read_sprite_texture, read_animated_textures, read_palettes,
};
pub use types::{
    AnimatedTextures, Face, FormatRevision, LevelFormat, LevelVersion, MeshRecord,
    ObjectTexture, ObjectTextureVertex, Palette, PaletteEntry, Platform, Rectangle,
    SpriteTexture, Triangle, Vertex,
};

/// File units per world unit on each axis
pub const SCALE_X: f32 = 1024.0;
pub const SCALE_Y: f32 = 1024.0;
pub const SCALE_Z: f32 = 1024.0;
