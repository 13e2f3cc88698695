//! Tile storage for texture atlases
//!
//! Level textiles are 256x256 pages. The remapper appends cropped tiles after
//! them, so tile indices below `textile_count` always refer to the original
//! pages.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};

/// Size of a level textile page
pub const TEXTILE_SIZE: u32 = 256;

/// Error type for atlas operations
#[derive(Debug)]
pub enum AtlasError {
    IoError(std::io::Error),
    ImageError(image::ImageError),
    MissingTile(u32),
    InvalidTextile(usize),
}

impl From<std::io::Error> for AtlasError {
    fn from(e: std::io::Error) -> Self {
        AtlasError::IoError(e)
    }
}

impl From<image::ImageError> for AtlasError {
    fn from(e: image::ImageError) -> Self {
        AtlasError::ImageError(e)
    }
}

impl std::fmt::Display for AtlasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasError::IoError(e) => write!(f, "IO error: {}", e),
            AtlasError::ImageError(e) => write!(f, "Image error: {}", e),
            AtlasError::MissingTile(i) => write!(f, "No tile with index {}", i),
            AtlasError::InvalidTextile(len) => {
                write!(f, "Textile has {} pixels, expected {}", len, TEXTILE_SIZE * TEXTILE_SIZE)
            }
        }
    }
}

/// Integer texel rectangle, inclusive of `x + width - 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TexelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TexelRect {
    /// Rectangle covering both corners (inclusive)
    pub fn from_corners(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn max_x(&self) -> u32 {
        self.x + self.width - 1
    }

    pub fn max_y(&self) -> u32 {
        self.y + self.height - 1
    }

    pub fn union(&self, other: &TexelRect) -> TexelRect {
        TexelRect::from_corners(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }
}

/// Somewhere tiles live
///
/// `copy_region` defaults to a CPU crop. A GPU-backed store can override it
/// to copy directly between textures.
pub trait TileStore {
    fn tile_count(&self) -> u32;

    fn tile_pixels(&self, index: u32) -> Option<&RgbaImage>;

    /// Append a tile and return its index
    fn add_tile(&mut self, tile: RgbaImage) -> u32;

    /// Copy `rect` of `source` into a new tile. `None` if the source does not exist.
    fn copy_region(&mut self, source: u32, rect: TexelRect) -> Option<u32> {
        let tile = self.tile_pixels(source)?;
        let cropped = imageops::crop_imm(tile, rect.x, rect.y, rect.width, rect.height).to_image();
        Some(self.add_tile(cropped))
    }
}

/// CPU-side tile atlas
#[derive(Debug, Clone, Default)]
pub struct TileAtlas {
    tiles: Vec<RgbaImage>,
    textile_count: u32,
}

impl TileAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level page from 0xAARRGGBB pixels
    pub fn add_textile(&mut self, pixels: &[u32]) -> Result<u32, AtlasError> {
        if pixels.len() != (TEXTILE_SIZE * TEXTILE_SIZE) as usize {
            return Err(AtlasError::InvalidTextile(pixels.len()));
        }
        let bytes: Vec<u8> = pixels
            .iter()
            .flat_map(|&p| {
                let [a, r, g, b] = p.to_be_bytes();
                [r, g, b, a]
            })
            .collect();
        let image = RgbaImage::from_raw(TEXTILE_SIZE, TEXTILE_SIZE, bytes)
            .ok_or(AtlasError::InvalidTextile(pixels.len()))?;
        self.textile_count += 1;
        Ok(self.add_tile(image))
    }

    /// Number of original level pages
    pub fn textile_count(&self) -> u32 {
        self.textile_count
    }

    /// Copy of a tile with every pixel forced opaque
    pub fn opaque_tile(&self, index: u32) -> Option<RgbaImage> {
        let mut tile = self.tile_pixels(index)?.clone();
        for Rgba([_, _, _, a]) in tile.pixels_mut() {
            *a = 255;
        }
        Some(tile)
    }

    /// Write a tile out as PNG for inspection
    pub fn export_png<P: AsRef<Path>>(&self, index: u32, path: P) -> Result<(), AtlasError> {
        let tile = self.tile_pixels(index).ok_or(AtlasError::MissingTile(index))?;
        tile.save(path.as_ref())?;
        Ok(())
    }
}

impl TileStore for TileAtlas {
    fn tile_count(&self) -> u32 {
        self.tiles.len() as u32
    }

    fn tile_pixels(&self, index: u32) -> Option<&RgbaImage> {
        self.tiles.get(index as usize)
    }

    fn add_tile(&mut self, tile: RgbaImage) -> u32 {
        self.tiles.push(tile);
        self.tiles.len() as u32 - 1
    }
}
