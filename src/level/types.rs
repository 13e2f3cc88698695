//! Raw level records
//!
//! These mirror the on-disk structures closely. Nothing here interprets the
//! packed fields; that is the decoder's job.

use serde::{Deserialize, Serialize};

// =============================================================================
// Format tags
// =============================================================================

/// Major format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LevelVersion {
    #[default]
    Tomb1,
    Tomb2,
    Tomb3,
    Tomb4,
    Tomb5,
}

/// Hardware platform the level was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    Pc,
    Psx,
    Saturn,
    Dreamcast,
}

/// Oddball builds that need extra UV handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormatRevision {
    #[default]
    Standard,
    /// The PC demo of the first game
    Tr1PcDemo,
    /// Pre-release builds of the fourth game's format
    Tr4Prerelease,
}

/// Everything the decoder needs to know about where records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LevelFormat {
    pub version: LevelVersion,
    pub platform: Platform,
    pub revision: FormatRevision,
}

impl LevelFormat {
    pub fn new(version: LevelVersion, platform: Platform) -> Self {
        Self { version, platform, revision: FormatRevision::Standard }
    }

    pub fn with_revision(mut self, revision: FormatRevision) -> Self {
        self.revision = revision;
        self
    }

    /// Untextured faces only exist before the fourth game
    pub fn has_coloured_faces(&self) -> bool {
        self.version < LevelVersion::Tomb4
    }

    /// Mesh faces carry an effects word from the fourth game on
    pub fn has_face_effects(&self) -> bool {
        self.version >= LevelVersion::Tomb4
    }
}

// =============================================================================
// Geometry records
// =============================================================================

/// Vertex in file units (1024 per sector)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Vertex {
    pub fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

/// Face with N vertices
///
/// `texture` is an object texture index for textured faces and a palette
/// reference for coloured faces; both carry flags in the high bits.
/// `effects` is zero for formats without face effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face<const N: usize> {
    #[serde(with = "serde_arrays")]
    pub vertices: [u16; N],
    pub texture: u16,
    pub effects: u16,
}

pub type Rectangle = Face<4>;
pub type Triangle = Face<3>;

impl<const N: usize> Face<N> {
    pub fn new(vertices: [u16; N], texture: u16) -> Self {
        Self { vertices, texture, effects: 0 }
    }

    pub fn with_effects(mut self, effects: u16) -> Self {
        self.effects = effects;
        self
    }
}

/// serde only derives arrays up to fixed sizes for concrete types, so const-generic
/// arrays go through a sequence.
mod serde_arrays {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(v: &[u16; N], s: S) -> Result<S::Ok, S::Error> {
        v.as_slice().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(d: D) -> Result<[u16; N], D::Error> {
        let v = Vec::<u16>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::custom(format!("expected {} vertex indices, got {}", N, len)))
    }
}

/// A whole mesh as read from the mesh data block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshRecord {
    pub centre: Vertex,
    pub collision_radius: i32,
    pub vertices: Vec<Vertex>,
    pub textured_rectangles: Vec<Rectangle>,
    pub textured_triangles: Vec<Triangle>,
    pub coloured_rectangles: Vec<Rectangle>,
    pub coloured_triangles: Vec<Triangle>,
}

// =============================================================================
// Texture records
// =============================================================================

/// One UV corner of an object texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectTextureVertex {
    pub x_frac: u8,
    pub x_whole: u8,
    pub y_frac: u8,
    pub y_whole: u8,
}

impl ObjectTextureVertex {
    pub fn new(x_whole: u8, y_whole: u8) -> Self {
        Self { x_frac: 0, x_whole, y_frac: 0, y_whole }
    }

    fn is_zero(&self) -> bool {
        self.x_frac == 0 && self.x_whole == 0 && self.y_frac == 0 && self.y_whole == 0
    }
}

/// Atlas sub-rectangle referenced by faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectTexture {
    /// 0 opaque, 1 alpha tested, 2 additive (and more in later games)
    pub attribute: u16,
    /// Tile index in the low 15 bits, flag bits above
    pub tile_and_flag: u16,
    pub vertices: [ObjectTextureVertex; 4],
}

impl ObjectTexture {
    pub fn tile(&self) -> u16 {
        self.tile_and_flag & 0x7FFF
    }

    /// Triangular object textures leave the fourth corner zeroed
    pub fn is_triangle(&self) -> bool {
        self.vertices[3].is_zero()
    }

    /// Corners that are actually used
    pub fn used_vertices(&self) -> &[ObjectTextureVertex] {
        if self.is_triangle() {
            &self.vertices[..3]
        } else {
            &self.vertices
        }
    }
}

/// Sprite image placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpriteTexture {
    pub tile: u16,
    pub x: u8,
    pub y: u8,
    /// Stored as `(pixels - 1) * 256 + 255`
    pub width: u16,
    pub height: u16,
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

impl SpriteTexture {
    /// Texels from the left edge texel to the right one (pixels minus one)
    pub fn texel_width(&self) -> u32 {
        self.width.saturating_sub(255) as u32 / 256
    }

    pub fn texel_height(&self) -> u32 {
        self.height.saturating_sub(255) as u32 / 256
    }
}

/// Animated texture cycles
///
/// The first `uv_count` sequences scroll their UVs rather than swapping frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatedTextures {
    pub sequences: Vec<Vec<u16>>,
    pub uv_count: u8,
}

impl AnimatedTextures {
    pub fn uv_sequences(&self) -> impl Iterator<Item = (usize, &Vec<u16>)> {
        self.sequences.iter().enumerate().take(self.uv_count as usize)
    }
}

// =============================================================================
// Palettes
// =============================================================================

/// 8-bit RGB palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PaletteEntry {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Level palettes
///
/// `colours` is the 256-entry 8-bit palette. For first-game PlayStation levels
/// the loader fills it with one sampled colour per coloured-face reference.
/// `colours16` is the 16-bit palette of the second and third games.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub colours: Vec<PaletteEntry>,
    pub colours16: Vec<PaletteEntry>,
}
