//! tomb-geometry: level geometry for the classic Tomb Raider formats
//!
//! Turns raw mesh and texture records into renderable buffers:
//! - Face decoding across five versions and four platforms
//! - Atlas remapping so every referenced region gets a tile of its own
//! - Mesh assembly into per-tile index lists, transparent and collision triangles
//! - Per-frame depth sorting and batching of transparent triangles
//!
//! GPU upload and drawing stay with the caller, behind `TransparencyTarget`
//! and the plain buffers on `Mesh`.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod render;
pub mod level;
pub mod texture;
pub mod decode;
pub mod geometry;
pub mod transparency;
pub mod settings;

pub use geometry::{create_mesh, Mesh, MeshAssembler};
pub use settings::{GeometrySettings, SettingsError};
pub use texture::{LevelTextureStorage, TextureSource, TileAtlas};
pub use transparency::{TransparencyBuffer, TransparencyContributor, TransparencyTarget};
