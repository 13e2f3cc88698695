//! Face record decoding
//!
//! - `decoder` - textured and coloured faces into normalized faces
//! - `fixups` - per platform/version index masks, UV reorders and blend rules

pub mod decoder;
pub mod fixups;

pub use decoder::{
    ColouredFace, NormalizedFace, NormalizedRectangle, NormalizedTriangle, INITIAL_TEXTURE,
    coloured_index, decode_coloured, decode_rectangle, decode_rectangles, decode_triangle,
    decode_triangles,
};
pub use fixups::{determine_blend_mode, extract_texture_index};
