//! Platform and version quirks of the face records
//!
//! These tables reproduce what the original hardware renderers did. Some look
//! arbitrary; keep them exactly as they are.

use crate::level::{FormatRevision, LevelFormat, LevelVersion, Platform};
use crate::render::{BlendMode, Vec2};

/// Coloured faces keep 15 bits of colour reference
pub const COLOURED_INDEX_MASK: u16 = 0x7FFF;

/// High bit of a face's texture word
pub const DOUBLE_SIDED_BIT: u16 = 0x8000;

/// Textured index mask: 13 bits on the consoles with op codes, 14 elsewhere
pub fn textured_index_mask(format: &LevelFormat) -> u16 {
    match format.platform {
        Platform::Psx | Platform::Saturn => 0x1FFF,
        Platform::Pc | Platform::Dreamcast => 0x3FFF,
    }
}

/// First game console builds store the index as a signed value
pub fn uses_signed_index(format: &LevelFormat) -> bool {
    format.version == LevelVersion::Tomb1
        && matches!(format.platform, Platform::Psx | Platform::Saturn)
}

/// Object texture index of a textured face, before any fallback
pub fn extract_texture_index(raw: u16, format: &LevelFormat) -> u16 {
    let value = if uses_signed_index(format) {
        (raw as i16).unsigned_abs()
    } else {
        raw
    };
    value & textured_index_mask(format)
}

/// Builds whose rectangles list UV corners in pairs swapped (0<->1, 2<->3)
const RECTANGLE_UV_SWAP: [(LevelVersion, Platform); 2] = [
    (LevelVersion::Tomb1, Platform::Saturn),
    (LevelVersion::Tomb2, Platform::Psx),
];

pub fn swaps_rectangle_uvs(format: &LevelFormat) -> bool {
    RECTANGLE_UV_SWAP.contains(&(format.version, format.platform))
}

pub fn swap_rectangle_uvs(uvs: [Vec2; 4]) -> [Vec2; 4] {
    [uvs[1], uvs[0], uvs[3], uvs[2]]
}

/// The PC demo and the pre-release fourth game mirror the UV order of object
/// textures whose tile word is negative
pub fn reorders_negative_tiles(format: &LevelFormat) -> bool {
    match format.revision {
        FormatRevision::Tr1PcDemo => format.platform == Platform::Pc,
        FormatRevision::Tr4Prerelease => true,
        FormatRevision::Standard => false,
    }
}

pub fn reorder_legacy_uvs(uvs: [Vec2; 4]) -> [Vec2; 4] {
    [uvs[3], uvs[2], uvs[1], uvs[0]]
}

/// Saturn uses bit 15 for something else
pub fn uses_double_sided_bit(format: &LevelFormat) -> bool {
    format.platform != Platform::Saturn
}

/// Object texture corners feeding the three triangle UV slots, by op code.
/// Codes 0-3 rotate through the corners, 4-7 do the same with the winding
/// mirrored.
pub const TRIANGLE_CORNERS: [[usize; 3]; 8] = [
    [0, 1, 2],
    [1, 2, 3],
    [2, 3, 0],
    [3, 0, 1],
    [0, 3, 2],
    [1, 0, 3],
    [2, 1, 0],
    [3, 2, 1],
];

/// Op code from the bits above the index mask: 3 bits on PlayStation and
/// Saturn, 2 on Dreamcast, none on PC
pub fn triangle_op_code(raw: u16, format: &LevelFormat) -> usize {
    match format.platform {
        Platform::Psx | Platform::Saturn => ((raw >> 13) & 0x7) as usize,
        Platform::Dreamcast => ((raw >> 14) & 0x3) as usize,
        Platform::Pc => 0,
    }
}

/// Effects bit 0 forces additive; otherwise the attribute decides
/// (0 opaque, 2 additive, anything else alpha blended)
pub fn determine_blend_mode(attribute: u16, effects: u16) -> BlendMode {
    if effects & 0x1 != 0 {
        return BlendMode::Additive;
    }
    match attribute {
        0 => BlendMode::None,
        2 => BlendMode::Additive,
        _ => BlendMode::Normal,
    }
}
