//! Binary record decoder
//!
//! Turns raw face records into `NormalizedFace`s. Decoding is a fold: each
//! call takes the previously resolved texture index and returns the one it
//! resolved, which is what an out-of-range index falls back to.

use crate::level::{Face, LevelFormat, Rectangle, Triangle};
use crate::render::{BlendMode, Vec2};
use crate::texture::TextureSource;

use super::fixups::{
    determine_blend_mode, extract_texture_index, reorder_legacy_uvs, reorders_negative_tiles,
    swap_rectangle_uvs, swaps_rectangle_uvs, triangle_op_code, uses_double_sided_bit,
    COLOURED_INDEX_MASK, DOUBLE_SIDED_BIT, TRIANGLE_CORNERS,
};

/// Fallback texture before any face has been decoded
pub const INITIAL_TEXTURE: u32 = 0;

/// Textured face ready for assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFace<const N: usize> {
    pub vertices: [u16; N],
    pub object_texture: u32,
    pub tile: u32,
    pub uvs: [Vec2; N],
    pub blend_mode: BlendMode,
    pub double_sided: bool,
}

pub type NormalizedRectangle = NormalizedFace<4>;
pub type NormalizedTriangle = NormalizedFace<3>;

/// Untextured face drawn with a flat palette colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColouredFace<const N: usize> {
    pub vertices: [u16; N],
    /// Palette reference, already masked to 15 bits
    pub colour: u16,
    pub double_sided: bool,
}

/// Resolve a face's texture index, falling back to `previous` when it is out of range
fn resolve_texture<T: TextureSource + ?Sized>(
    raw: u16,
    format: &LevelFormat,
    textures: &T,
    previous: u32,
) -> u32 {
    let index = extract_texture_index(raw, format) as u32;
    if index >= textures.num_object_textures() {
        log::trace!("texture {} out of range, using {}", index, previous);
        return previous;
    }
    index
}

fn double_sided(raw: u16, format: &LevelFormat) -> bool {
    uses_double_sided_bit(format) && raw & DOUBLE_SIDED_BIT != 0
}

/// Decode one textured rectangle
///
/// Returns the face and the texture index to pass to the next call.
pub fn decode_rectangle<T: TextureSource + ?Sized>(
    raw: &Rectangle,
    format: &LevelFormat,
    textures: &T,
    previous_texture: u32,
) -> (NormalizedRectangle, u32) {
    let texture = resolve_texture(raw.texture, format, textures, previous_texture);

    let mut uvs = [0, 1, 2, 3].map(|corner| textures.uv(texture, corner));
    if swaps_rectangle_uvs(format) {
        uvs = swap_rectangle_uvs(uvs);
    }
    if reorders_negative_tiles(format) && (textures.tile_flags(texture) as i16) < 0 {
        uvs = reorder_legacy_uvs(uvs);
    }

    let face = NormalizedFace {
        vertices: raw.vertices,
        object_texture: texture,
        tile: textures.tile(texture),
        uvs,
        blend_mode: determine_blend_mode(textures.attribute(texture), raw.effects),
        double_sided: double_sided(raw.texture, format),
    };
    (face, texture)
}

/// Decode one textured triangle
///
/// The op code above the index mask picks which three object texture corners
/// are used.
pub fn decode_triangle<T: TextureSource + ?Sized>(
    raw: &Triangle,
    format: &LevelFormat,
    textures: &T,
    previous_texture: u32,
) -> (NormalizedTriangle, u32) {
    let texture = resolve_texture(raw.texture, format, textures, previous_texture);
    let corners = TRIANGLE_CORNERS[triangle_op_code(raw.texture, format)];

    let face = NormalizedFace {
        vertices: raw.vertices,
        object_texture: texture,
        tile: textures.tile(texture),
        uvs: corners.map(|corner| textures.uv(texture, corner)),
        blend_mode: determine_blend_mode(textures.attribute(texture), raw.effects),
        double_sided: double_sided(raw.texture, format),
    };
    (face, texture)
}

/// Decode a run of rectangles, threading the fallback texture through
pub fn decode_rectangles<T: TextureSource + ?Sized>(
    raw: &[Rectangle],
    format: &LevelFormat,
    textures: &T,
    previous_texture: u32,
) -> (Vec<NormalizedRectangle>, u32) {
    let mut previous = previous_texture;
    let faces = raw
        .iter()
        .map(|r| {
            let (face, next) = decode_rectangle(r, format, textures, previous);
            previous = next;
            face
        })
        .collect();
    (faces, previous)
}

/// Decode a run of triangles, threading the fallback texture through
pub fn decode_triangles<T: TextureSource + ?Sized>(
    raw: &[Triangle],
    format: &LevelFormat,
    textures: &T,
    previous_texture: u32,
) -> (Vec<NormalizedTriangle>, u32) {
    let mut previous = previous_texture;
    let faces = raw
        .iter()
        .map(|t| {
            let (face, next) = decode_triangle(t, format, textures, previous);
            previous = next;
            face
        })
        .collect();
    (faces, previous)
}

/// 15-bit colour reference of an untextured face
pub fn coloured_index(raw: u16) -> u16 {
    raw & COLOURED_INDEX_MASK
}

/// Decode an untextured face
pub fn decode_coloured<const N: usize>(raw: &Face<N>) -> ColouredFace<N> {
    ColouredFace {
        vertices: raw.vertices,
        colour: coloured_index(raw.texture),
        double_sided: raw.texture & DOUBLE_SIDED_BIT != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{FormatRevision, LevelVersion, ObjectTexture, ObjectTextureVertex, Platform};

    fn pc(version: LevelVersion) -> LevelFormat {
        LevelFormat::new(version, Platform::Pc)
    }

    /// Object textures whose corners all differ, so reordering is visible
    fn table(count: u16) -> Vec<ObjectTexture> {
        (0..count)
            .map(|i| ObjectTexture {
                attribute: 0,
                tile_and_flag: i,
                vertices: [
                    ObjectTextureVertex::new(10, 10),
                    ObjectTextureVertex::new(20, 10),
                    ObjectTextureVertex::new(20, 20),
                    ObjectTextureVertex::new(10, 20),
                ],
            })
            .collect()
    }

    #[test]
    fn test_valid_rectangle_matches_table() {
        let textures = table(4);
        let raw = Rectangle::new([0, 1, 2, 3], 2);
        let (face, next) = decode_rectangle(&raw, &pc(LevelVersion::Tomb1), textures.as_slice(), INITIAL_TEXTURE);

        assert_eq!(next, 2);
        assert_eq!(face.object_texture, 2);
        assert_eq!(face.tile, textures.as_slice().tile(2));
        for corner in 0..4 {
            assert_eq!(face.uvs[corner], textures.as_slice().uv(2, corner));
        }
        assert_eq!(face.blend_mode, BlendMode::None);
        assert!(!face.double_sided);
    }

    #[test]
    fn test_all_invalid_indices_fall_back_to_initial() {
        let textures = table(2);
        let raw: Vec<Rectangle> = [5, 100, 0x3FFF, 7]
            .iter()
            .map(|&t| Rectangle::new([0, 1, 2, 3], t))
            .collect();
        let (faces, last) = decode_rectangles(&raw, &pc(LevelVersion::Tomb2), textures.as_slice(), INITIAL_TEXTURE);

        assert_eq!(faces.len(), 4);
        assert!(faces.iter().all(|f| f.object_texture == 0));
        assert_eq!(last, 0);
    }

    #[test]
    fn test_empty_table_does_not_panic() {
        let textures: Vec<ObjectTexture> = Vec::new();
        let raw = Triangle::new([0, 1, 2], 9);
        let (face, next) = decode_triangle(&raw, &pc(LevelVersion::Tomb3), textures.as_slice(), INITIAL_TEXTURE);
        assert_eq!(next, 0);
        assert_eq!(face.tile, 0);
        assert_eq!(face.uvs, [Vec2::ZERO; 3]);
    }

    #[test]
    fn test_invalid_index_uses_previous_valid() {
        let textures = table(3);
        let raw: Vec<Rectangle> = [1, 99, 2, 50]
            .iter()
            .map(|&t| Rectangle::new([0, 1, 2, 3], t))
            .collect();
        let (faces, last) = decode_rectangles(&raw, &pc(LevelVersion::Tomb1), textures.as_slice(), INITIAL_TEXTURE);
        let indices: Vec<u32> = faces.iter().map(|f| f.object_texture).collect();
        assert_eq!(indices, vec![1, 1, 2, 2]);
        assert_eq!(last, 2);
    }

    #[test]
    fn test_psx_rectangle_swap_and_mask() {
        let textures = table(4);
        let format = LevelFormat::new(LevelVersion::Tomb2, Platform::Psx);
        // bit 13 is above the 13-bit mask
        let raw = Rectangle::new([0, 1, 2, 3], 0x2003);
        let (face, _) = decode_rectangle(&raw, &format, textures.as_slice(), INITIAL_TEXTURE);

        let t = textures.as_slice();
        assert_eq!(face.object_texture, 3);
        assert_eq!(face.uvs, [t.uv(3, 1), t.uv(3, 0), t.uv(3, 3), t.uv(3, 2)]);
    }

    #[test]
    fn test_legacy_reorder_on_negative_tile() {
        let mut textures = table(2);
        textures[1].tile_and_flag = 0x8001;
        let format = pc(LevelVersion::Tomb4).with_revision(FormatRevision::Tr4Prerelease);
        let t = textures.as_slice();

        let (flipped, _) = decode_rectangle(&Rectangle::new([0, 1, 2, 3], 1), &format, t, 0);
        assert_eq!(flipped.uvs, [t.uv(1, 3), t.uv(1, 2), t.uv(1, 1), t.uv(1, 0)]);
        assert_eq!(flipped.tile, 1);

        let (plain, _) = decode_rectangle(&Rectangle::new([0, 1, 2, 3], 0), &format, t, 0);
        assert_eq!(plain.uvs, [t.uv(0, 0), t.uv(0, 1), t.uv(0, 2), t.uv(0, 3)]);
    }

    #[test]
    fn test_double_sided_bit() {
        let textures = table(2);
        let raw = Rectangle::new([0, 1, 2, 3], 0x8001);

        let (face, _) = decode_rectangle(&raw, &pc(LevelVersion::Tomb3), textures.as_slice(), 0);
        assert!(face.double_sided);
        assert_eq!(face.object_texture, 1);

        let saturn = LevelFormat::new(LevelVersion::Tomb1, Platform::Saturn);
        let (face, _) = decode_rectangle(&raw, &saturn, textures.as_slice(), 0);
        assert!(!face.double_sided);
    }

    #[test]
    fn test_saturn_triangles() {
        let textures = table(4);
        let t = textures.as_slice();
        let saturn = LevelFormat::new(LevelVersion::Tomb1, Platform::Saturn);
        let raw = [
            // op code 3, index 2: a 14-bit mask would read 0x2002
            Triangle::new([0, 1, 2], 0x6002),
            // op code 7 with bit 15 set: signed index 0x1FFF is out of range
            Triangle::new([0, 1, 2], 0xE001),
        ];
        let (faces, last) = decode_triangles(&raw, &saturn, t, INITIAL_TEXTURE);

        assert_eq!(faces[0].object_texture, 2);
        assert_eq!(faces[0].tile, 2);
        assert_eq!(faces[0].uvs, [t.uv(2, 3), t.uv(2, 0), t.uv(2, 1)]);

        assert_eq!(faces[1].object_texture, 2);
        assert_eq!(faces[1].uvs, [t.uv(2, 3), t.uv(2, 2), t.uv(2, 1)]);
        assert!(faces.iter().all(|f| !f.double_sided));
        assert_eq!(last, 2);
    }

    #[test]
    fn test_effects_force_additive() {
        let mut textures = table(1);
        textures[0].attribute = 1;
        let raw = Triangle::new([0, 1, 2], 0).with_effects(1);
        let (face, _) = decode_triangle(&raw, &pc(LevelVersion::Tomb4), textures.as_slice(), 0);
        assert_eq!(face.blend_mode, BlendMode::Additive);

        let raw = Triangle::new([0, 1, 2], 0);
        let (face, _) = decode_triangle(&raw, &pc(LevelVersion::Tomb4), textures.as_slice(), 0);
        assert_eq!(face.blend_mode, BlendMode::Normal);
    }

    #[test]
    fn test_triangle_op_code_rotation() {
        let textures = table(2);
        let t = textures.as_slice();

        let psx = LevelFormat::new(LevelVersion::Tomb3, Platform::Psx);
        let (face, _) = decode_triangle(&Triangle::new([0, 1, 2], (2 << 13) | 1), &psx, t, 0);
        assert_eq!(face.object_texture, 1);
        assert_eq!(face.uvs, [t.uv(1, 2), t.uv(1, 3), t.uv(1, 0)]);

        let dc = LevelFormat::new(LevelVersion::Tomb4, Platform::Dreamcast);
        let (face, _) = decode_triangle(&Triangle::new([0, 1, 2], (1 << 14) | 1), &dc, t, 0);
        assert_eq!(face.uvs, [t.uv(1, 1), t.uv(1, 2), t.uv(1, 3)]);

        let (face, _) = decode_triangle(&Triangle::new([0, 1, 2], 1), &pc(LevelVersion::Tomb2), t, 0);
        assert_eq!(face.uvs, [t.uv(1, 0), t.uv(1, 1), t.uv(1, 2)]);
    }

    #[test]
    fn test_coloured_faces() {
        let face = decode_coloured(&Triangle::new([4, 5, 6], 0x9234));
        assert_eq!(face.colour, 0x1234);
        assert!(face.double_sided);
        assert_eq!(face.vertices, [4, 5, 6]);
        assert_eq!(coloured_index(0x7FFF), 0x7FFF);
    }
}
