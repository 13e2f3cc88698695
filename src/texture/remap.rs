//! Atlas remapping
//!
//! Every object texture gets its referenced sub-rectangle copied into a tile
//! of its own, so sampling can never bleed into neighbouring regions. UV
//! animated sequences then get one shared tile covering the whole scroll area.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::level::{AnimatedTextures, ObjectTexture};
use crate::render::Vec2;
use crate::settings::GeometrySettings;

use super::atlas::{TexelRect, TileStore};

/// Object texture moved to a dedicated tile
#[derive(Debug, Clone, PartialEq)]
pub struct TextureReplacement {
    pub source_tile: u32,
    pub tile: u32,
    pub uvs: [Vec2; 4],
}

/// Frame of a UV animated sequence moved to the sequence's isolated tile
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedUvReplacement {
    pub sequence: u32,
    pub object_texture: u32,
    pub new_tile: u32,
    pub uvs: [Vec2; 4],
}

/// All replacements for a level, keyed by object texture index
///
/// Lookups prefer the animated entry, then the plain one.
#[derive(Debug, Clone, Default)]
pub struct TextureReplacements {
    plain: HashMap<u32, TextureReplacement>,
    animated: HashMap<u32, AnimatedUvReplacement>,
}

impl TextureReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_plain(&mut self, texture: u32, replacement: TextureReplacement) {
        self.plain.insert(texture, replacement);
    }

    pub fn insert_animated(&mut self, texture: u32, replacement: AnimatedUvReplacement) {
        self.animated.insert(texture, replacement);
    }

    pub fn plain(&self, texture: u32) -> Option<&TextureReplacement> {
        self.plain.get(&texture)
    }

    pub fn animated(&self, texture: u32) -> Option<&AnimatedUvReplacement> {
        self.animated.get(&texture)
    }

    pub fn tile(&self, texture: u32) -> Option<u32> {
        if let Some(a) = self.animated.get(&texture) {
            return Some(a.new_tile);
        }
        self.plain.get(&texture).map(|p| p.tile)
    }

    pub fn uv(&self, texture: u32, corner: usize) -> Option<Vec2> {
        if let Some(a) = self.animated.get(&texture) {
            return a.uvs.get(corner).copied();
        }
        self.plain.get(&texture).and_then(|p| p.uvs.get(corner).copied())
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty() && self.animated.is_empty()
    }
}

/// Whole-texel bounding rectangle of the corners an object texture uses
///
/// Fractions are ignored. Official levels mark far corners with a 0xFF
/// fraction (one texel short), so the crop keeps that last column or row and
/// the remapped UVs run to its far edge.
pub fn texel_bounds(texture: &ObjectTexture) -> TexelRect {
    let used = texture.used_vertices();
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0, 0);
    for v in used {
        min_x = min_x.min(v.x_whole as u32);
        min_y = min_y.min(v.y_whole as u32);
        max_x = max_x.max(v.x_whole as u32);
        max_y = max_y.max(v.y_whole as u32);
    }
    TexelRect::from_corners(min_x, min_y, max_x, max_y)
}

/// `(value - min) / (extent - 1)`, zero for a one texel extent
fn normalise(value: u32, min: u32, extent: u32) -> f32 {
    if extent <= 1 {
        return 0.0;
    }
    (value - min) as f32 / (extent - 1) as f32
}

/// UVs of each used corner relative to `rect`; unused corners stay zero
fn remap_uvs(texture: &ObjectTexture, rect: &TexelRect) -> [Vec2; 4] {
    let mut uvs = [Vec2::ZERO; 4];
    for (uv, v) in uvs.iter_mut().zip(texture.used_vertices()) {
        *uv = Vec2::new(
            normalise(v.x_whole as u32, rect.x, rect.width),
            normalise(v.y_whole as u32, rect.y, rect.height),
        );
    }
    uvs
}

/// Give every object texture a tightly cropped tile
///
/// Identical regions share one tile.
///
/// # Panics
///
/// If an object texture references a tile the store does not have.
pub fn remap_object_textures<S: TileStore>(
    textures: &[ObjectTexture],
    store: &mut S,
    replacements: &mut TextureReplacements,
) {
    let mut regions: HashMap<(u32, TexelRect), u32> = HashMap::new();

    for (index, texture) in textures.iter().enumerate() {
        let source_tile = texture.tile() as u32;
        let rect = texel_bounds(texture);

        let tile = match regions.entry((source_tile, rect)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let Some(tile) = store.copy_region(source_tile, rect) else {
                    panic!("object texture {} references missing tile {}", index, source_tile);
                };
                *e.insert(tile)
            }
        };

        replacements.insert_plain(
            index as u32,
            TextureReplacement { source_tile, tile, uvs: remap_uvs(texture, &rect) },
        );
    }

    log::debug!(
        "remapped {} object textures into {} tiles",
        textures.len(),
        regions.len()
    );
}

/// Give each UV animated sequence one tile covering every frame
///
/// Frames outside the object texture table and sequences spanning several
/// source tiles are skipped.
pub fn remap_animated_uvs<S: TileStore>(
    animated: &AnimatedTextures,
    textures: &[ObjectTexture],
    store: &mut S,
    replacements: &mut TextureReplacements,
) {
    let mut isolated = 0;

    for (sequence, frames) in animated.uv_sequences() {
        let valid: Vec<(u32, &ObjectTexture)> = frames
            .iter()
            .filter_map(|&f| match textures.get(f as usize) {
                Some(t) => Some((f as u32, t)),
                None => {
                    log::warn!("animated sequence {} references missing object texture {}", sequence, f);
                    None
                }
            })
            .collect();

        let Some(&(_, first)) = valid.first() else {
            continue;
        };
        let source_tile = first.tile();
        if valid.iter().any(|(_, t)| t.tile() != source_tile) {
            log::warn!("animated sequence {} spans more than one tile, not isolated", sequence);
            continue;
        }

        let union = valid
            .iter()
            .map(|(_, t)| texel_bounds(t))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| texel_bounds(first));

        let Some(new_tile) = store.copy_region(source_tile as u32, union) else {
            log::warn!("animated sequence {} references missing tile {}", sequence, source_tile);
            continue;
        };

        isolated += valid.len();
        for (index, texture) in valid {
            replacements.insert_animated(
                index,
                AnimatedUvReplacement {
                    sequence: sequence as u32,
                    object_texture: index,
                    new_tile,
                    uvs: remap_uvs(texture, &union),
                },
            );
        }
    }

    log::debug!("isolated {} uv animated frames", isolated);
}

/// Run whichever remap passes the settings enable
pub fn build_replacements<S: TileStore>(
    textures: &[ObjectTexture],
    animated: &AnimatedTextures,
    store: &mut S,
    settings: &GeometrySettings,
) -> TextureReplacements {
    let mut replacements = TextureReplacements::new();
    if settings.remap_textures {
        remap_object_textures(textures, store, &mut replacements);
    }
    if settings.remap_animated_uvs {
        remap_animated_uvs(animated, textures, store, &mut replacements);
    }
    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::ObjectTextureVertex;
    use crate::texture::atlas::{TileAtlas, TEXTILE_SIZE};

    fn atlas_with_pages(pages: usize) -> TileAtlas {
        let mut atlas = TileAtlas::new();
        for _ in 0..pages {
            atlas.add_textile(&vec![0xFF00_0000; (TEXTILE_SIZE * TEXTILE_SIZE) as usize]).unwrap();
        }
        atlas
    }

    fn square(tile: u16, x: u8, y: u8, size: u8) -> ObjectTexture {
        let max_x = x + size - 1;
        let max_y = y + size - 1;
        ObjectTexture {
            attribute: 0,
            tile_and_flag: tile,
            vertices: [
                ObjectTextureVertex::new(x, y),
                ObjectTextureVertex::new(max_x, y),
                ObjectTextureVertex::new(max_x, max_y),
                ObjectTextureVertex::new(x, max_y),
            ],
        }
    }

    #[test]
    fn test_remap_four_by_four_region() {
        let mut atlas = atlas_with_pages(1);
        let textures = [square(0, 10, 10, 4)];
        let mut replacements = TextureReplacements::new();
        remap_object_textures(&textures, &mut atlas, &mut replacements);

        let r = replacements.plain(0).unwrap();
        assert_eq!(r.source_tile, 0);
        assert_eq!(r.tile, 1);
        assert_eq!(atlas.tile_pixels(r.tile).unwrap().dimensions(), (4, 4));
        assert_eq!(r.uvs[0], Vec2::new(0.0, 0.0));
        assert_eq!(r.uvs[1], Vec2::new(1.0, 0.0));
        assert_eq!(r.uvs[2], Vec2::new(1.0, 1.0));
        assert_eq!(r.uvs[3], Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_identical_regions_share_a_tile() {
        let mut atlas = atlas_with_pages(2);
        let textures = [square(0, 0, 0, 8), square(0, 0, 0, 8), square(1, 0, 0, 8)];
        let mut replacements = TextureReplacements::new();
        remap_object_textures(&textures, &mut atlas, &mut replacements);

        assert_eq!(replacements.tile(0), replacements.tile(1));
        assert_ne!(replacements.tile(0), replacements.tile(2));
        // two pages plus two distinct regions
        assert_eq!(atlas.tile_count(), 4);
    }

    #[test]
    fn test_triangle_and_single_texel() {
        let mut atlas = atlas_with_pages(1);
        let mut tri = square(0, 4, 4, 3);
        tri.vertices[3] = ObjectTextureVertex::default();
        let dot = ObjectTexture {
            vertices: [
                ObjectTextureVertex::new(9, 9),
                ObjectTextureVertex::new(9, 9),
                ObjectTextureVertex::new(9, 9),
                ObjectTextureVertex::new(9, 9),
            ],
            ..Default::default()
        };
        let mut replacements = TextureReplacements::new();
        remap_object_textures(&[tri, dot], &mut atlas, &mut replacements);

        let t = replacements.plain(0).unwrap();
        assert_eq!(t.uvs[2], Vec2::new(1.0, 1.0));
        assert_eq!(t.uvs[3], Vec2::ZERO);
        assert_eq!(replacements.plain(1).unwrap().uvs, [Vec2::ZERO; 4]);
    }

    #[test]
    #[should_panic(expected = "missing tile")]
    fn test_missing_source_tile_panics() {
        let mut atlas = atlas_with_pages(1);
        remap_object_textures(&[square(5, 0, 0, 4)], &mut atlas, &mut TextureReplacements::new());
    }

    #[test]
    fn test_animated_sequence_covers_all_frames() {
        let mut atlas = atlas_with_pages(1);
        let textures = [square(0, 0, 0, 4), square(0, 0, 4, 4), square(0, 64, 64, 4)];
        let animated = AnimatedTextures { sequences: vec![vec![0, 1], vec![2]], uv_count: 1 };

        let mut replacements = TextureReplacements::new();
        remap_animated_uvs(&animated, &textures, &mut atlas, &mut replacements);
        assert!(replacements.animated(2).is_none());
        assert!(replacements.plain(0).is_none());

        let first = replacements.animated(0).unwrap();
        let second = replacements.animated(1).unwrap();
        assert_eq!(first.new_tile, second.new_tile);
        assert_eq!(atlas.tile_pixels(first.new_tile).unwrap().dimensions(), (4, 8));
        // frame 1 sits in the lower half of the shared tile
        assert_eq!(second.uvs[0], Vec2::new(0.0, 4.0 / 7.0));
        assert_eq!(second.uvs[2], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_texel_bounds_ignore_fractions() {
        let mut texture = square(0, 10, 10, 4);
        texture.vertices[1].x_frac = 0xFF;
        texture.vertices[2].x_frac = 0xFF;
        texture.vertices[2].y_frac = 0xFF;
        texture.vertices[3].y_frac = 0xFF;
        assert_eq!(texel_bounds(&texture), TexelRect::from_corners(10, 10, 13, 13));

        let mut atlas = atlas_with_pages(1);
        let mut replacements = TextureReplacements::new();
        remap_object_textures(&[texture], &mut atlas, &mut replacements);
        let r = replacements.plain(0).unwrap();
        assert_eq!(atlas.tile_pixels(r.tile).unwrap().dimensions(), (4, 4));
        assert_eq!(r.uvs[2], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_animated_replacement_takes_precedence() {
        let mut atlas = atlas_with_pages(1);
        let textures = [square(0, 0, 0, 4), square(0, 0, 4, 4)];
        let animated = AnimatedTextures { sequences: vec![vec![0, 1]], uv_count: 1 };

        let replacements = build_replacements(&textures, &animated, &mut atlas, &GeometrySettings::default());
        let plain = replacements.plain(0).unwrap();
        let anim = replacements.animated(0).unwrap();
        assert_ne!(plain.tile, anim.new_tile);
        assert_eq!(replacements.tile(0), Some(anim.new_tile));
        assert_eq!(replacements.uv(0, 3), Some(Vec2::new(0.0, 3.0 / 7.0)));
        assert_eq!(replacements.tile(9), None);
    }

    #[test]
    fn test_passes_can_be_disabled() {
        let mut atlas = atlas_with_pages(1);
        let textures = [square(0, 0, 0, 4)];
        let animated = AnimatedTextures { sequences: vec![vec![0]], uv_count: 1 };
        let settings = GeometrySettings {
            remap_textures: false,
            remap_animated_uvs: false,
            ..Default::default()
        };
        let replacements = build_replacements(&textures, &animated, &mut atlas, &settings);
        assert!(replacements.is_empty());
        assert_eq!(atlas.tile_count(), 1);
    }
}
