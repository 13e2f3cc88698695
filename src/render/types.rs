//! Core types shared by the mesh and transparency code

use serde::{Deserialize, Serialize};

// =============================================================================
// Colors
// =============================================================================

/// Floating point RGBA color, as uploaded to the vertex buffers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    /// Translucent tint used for portals
    pub const PORTAL: Color = Color { r: 1.0, g: 0.0, b: 0.0, a: 0.5 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create from 8-bit channels, fully opaque
    pub fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Colour word of a Saturn coloured face: `xRRRRRGGGGGBBBBB`
///
/// The top bit belongs to the face record, not the colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color15(pub u16);

impl Color15 {
    fn channel(self, shift: u16) -> f32 {
        ((self.0 >> shift) & 0x1F) as f32 / 31.0
    }

    pub fn to_color(self) -> Color {
        Color::new(self.channel(10), self.channel(5), self.channel(0), 1.0)
    }
}

// =============================================================================
// Blend and texture modes
// =============================================================================

/// How a face is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Opaque, drawn through the per-tile index buffers
    #[default]
    None,
    /// Standard alpha blending
    Normal,
    /// Additive glow (fire, light shafts)
    Additive,
}

impl BlendMode {
    pub fn is_transparent(self) -> bool {
        self != BlendMode::None
    }
}

/// Whether a triangle samples a tile or draws flat colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureMode {
    #[default]
    Textured,
    Untextured,
}
