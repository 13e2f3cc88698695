//! Level textures
//!
//! ## Overview
//!
//! - **TileAtlas**: CPU-side storage for level pages and remapped tiles
//! - **Remapper**: copies each referenced atlas region into a tile of its own
//!   and rewrites UVs, with a second pass for UV animated sequences
//! - **LevelTextureStorage**: object texture table plus palettes, answering
//!   tile/UV/colour queries with replacements taking priority
//!
//! ## Lookup order
//!
//! Animated UV replacement, then plain replacement, then the raw object
//! texture table.

mod atlas;
mod remap;
mod storage;

pub use atlas::{AtlasError, TexelRect, TileAtlas, TileStore, TEXTILE_SIZE};
pub use remap::{
    AnimatedUvReplacement, TextureReplacement, TextureReplacements,
    build_replacements, remap_animated_uvs, remap_object_textures, texel_bounds,
};
pub use storage::{LevelTextureStorage, TextureSource, UvConversion};
