//! Level texture storage
//!
//! Owns the object texture table and palettes for one level and answers tile,
//! UV and colour queries, consulting the remapper's replacements first.

use serde::{Deserialize, Serialize};

use crate::level::{AnimatedTextures, LevelFormat, LevelVersion, ObjectTexture, Palette, PaletteEntry, Platform};
use crate::render::{Color, Color15, Vec2};
use crate::settings::GeometrySettings;

use super::atlas::TileStore;
use super::remap::{build_replacements, TextureReplacements};

/// Read access to object textures, as the decoder sees them
///
/// Out of range indices never panic: tiles and attributes read as 0 and UVs
/// as zero.
pub trait TextureSource {
    fn num_object_textures(&self) -> u32;

    /// Resolved tile index
    fn tile(&self, texture: u32) -> u32;

    /// Raw tile word including flag bits
    fn tile_flags(&self, texture: u32) -> u16;

    fn uv(&self, texture: u32, corner: usize) -> Vec2;

    fn attribute(&self, texture: u32) -> u16;

    /// Flat colour for a coloured face reference (already masked to 15 bits)
    fn palette_colour(&self, _colour: u16) -> Color {
        Color::WHITE
    }
}

impl TextureSource for [ObjectTexture] {
    fn num_object_textures(&self) -> u32 {
        self.len() as u32
    }

    fn tile(&self, texture: u32) -> u32 {
        self.get(texture as usize).map_or(0, |t| t.tile() as u32)
    }

    fn tile_flags(&self, texture: u32) -> u16 {
        self.get(texture as usize).map_or(0, |t| t.tile_and_flag)
    }

    fn uv(&self, texture: u32, corner: usize) -> Vec2 {
        match self.get(texture as usize).and_then(|t| t.vertices.get(corner)) {
            Some(v) => UvConversion::Official.convert(v.x_whole, v.x_frac, v.y_whole, v.y_frac),
            None => Vec2::ZERO,
        }
    }

    fn attribute(&self, texture: u32) -> u16 {
        self.get(texture as usize).map_or(0, |t| t.attribute)
    }
}

/// How object texture corners become UVs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UvConversion {
    /// Shipped levels: the fraction byte is a signed nudge of a whole texel
    #[default]
    Official,
    /// Custom levels: the fraction byte is 1/256 of a texel
    Custom,
}

impl UvConversion {
    pub fn convert(self, x_whole: u8, x_frac: u8, y_whole: u8, y_frac: u8) -> Vec2 {
        match self {
            UvConversion::Official => Vec2::new(
                (x_whole as f32 + x_frac as i8 as f32) / 255.0,
                (y_whole as f32 + y_frac as i8 as f32) / 255.0,
            ),
            UvConversion::Custom => Vec2::new(
                (x_whole as f32 + x_frac as f32 / 256.0) / 256.0,
                (y_whole as f32 + y_frac as f32 / 256.0) / 256.0,
            ),
        }
    }

    /// Custom if any corner uses a fraction other than 0, 1 or 255
    pub fn detect(textures: &[ObjectTexture]) -> Self {
        let custom = textures.iter().flat_map(|t| t.vertices.iter()).any(|v| {
            (v.x_frac > 1 && v.x_frac < 255) || (v.y_frac > 1 && v.y_frac < 255)
        });
        if custom {
            UvConversion::Custom
        } else {
            UvConversion::Official
        }
    }
}

/// Object textures, palettes and replacements for one level
#[derive(Debug, Clone, Default)]
pub struct LevelTextureStorage {
    format: LevelFormat,
    object_textures: Vec<ObjectTexture>,
    palette: Palette,
    uv_conversion: UvConversion,
    replacements: TextureReplacements,
}

impl LevelTextureStorage {
    pub fn new(format: LevelFormat, object_textures: Vec<ObjectTexture>, palette: Palette) -> Self {
        Self {
            format,
            object_textures,
            palette,
            uv_conversion: UvConversion::Official,
            replacements: TextureReplacements::new(),
        }
    }

    /// Build storage for a freshly loaded level and run the remap passes
    pub fn load<S: TileStore>(
        format: LevelFormat,
        object_textures: Vec<ObjectTexture>,
        palette: Palette,
        animated: &AnimatedTextures,
        store: &mut S,
        settings: &GeometrySettings,
    ) -> Self {
        let mut storage = Self::new(format, object_textures, palette);
        if settings.texture_mode_detection {
            storage.uv_conversion = UvConversion::detect(&storage.object_textures);
        }
        storage.replacements = build_replacements(&storage.object_textures, animated, store, settings);
        log::debug!(
            "loaded {} object textures, uv conversion {:?}",
            storage.object_textures.len(),
            storage.uv_conversion
        );
        storage
    }

}

impl TextureSource for LevelTextureStorage {
    fn num_object_textures(&self) -> u32 {
        self.object_textures.len() as u32
    }

    fn tile(&self, texture: u32) -> u32 {
        self.replacements
            .tile(texture)
            .unwrap_or_else(|| self.object_textures.as_slice().tile(texture))
    }

    fn tile_flags(&self, texture: u32) -> u16 {
        self.object_textures.as_slice().tile_flags(texture)
    }

    fn uv(&self, texture: u32, corner: usize) -> Vec2 {
        if let Some(uv) = self.replacements.uv(texture, corner) {
            return uv;
        }
        match self.object_textures.get(texture as usize).and_then(|t| t.vertices.get(corner)) {
            Some(v) => self.uv_conversion.convert(v.x_whole, v.x_frac, v.y_whole, v.y_frac),
            None => Vec2::ZERO,
        }
    }

    fn attribute(&self, texture: u32) -> u16 {
        self.object_textures.as_slice().attribute(texture)
    }

    /// Palette choice by format:
    ///
    /// - Saturn stores the 15-bit colour directly
    /// - the fourth game on has no palette, so white
    /// - the second and third games index the 16-bit palette with the high byte
    /// - first game PlayStation levels index the sampled colour list directly
    /// - first game PC indexes the 8-bit palette with the low byte
    fn palette_colour(&self, texture: u16) -> Color {
        if self.format.platform == Platform::Saturn {
            return Color15(texture).to_color();
        }
        if self.format.version >= LevelVersion::Tomb4 {
            return Color::WHITE;
        }

        let entry = if self.format.version > LevelVersion::Tomb1 {
            self.palette.colours16.get((texture >> 8) as usize)
        } else if self.format.platform == Platform::Psx {
            self.palette.colours.get(texture as usize)
        } else {
            self.palette.colours.get((texture & 0xFF) as usize)
        };

        match entry {
            Some(&PaletteEntry { red, green, blue }) => Color::from_rgb888(red, green, blue),
            None => {
                log::trace!("no palette entry for colour {:#06x}", texture);
                Color::BLACK
            }
        }
    }
}
