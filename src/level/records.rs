//! Little-endian record readers
//!
//! Parses the PC layouts of the mesh, object texture, sprite and animated
//! texture blocks. Console layouts are converted to these records by the
//! level loader before they reach this crate.

use std::io::{self, Read};

use byteorder::{ReadBytesExt, LE};

use super::types::{
    AnimatedTextures, Face, LevelFormat, LevelVersion, MeshRecord, ObjectTexture,
    ObjectTextureVertex, Palette, PaletteEntry, SpriteTexture, Vertex,
};

/// Error type for record parsing
#[derive(Debug)]
pub enum RecordError {
    IoError(io::Error),
    /// Input ended in the middle of a record
    Truncated(&'static str),
    /// A count field was negative or implausibly large
    InvalidCount { what: &'static str, count: i64 },
}

impl From<io::Error> for RecordError {
    fn from(e: io::Error) -> Self {
        RecordError::IoError(e)
    }
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::IoError(e) => write!(f, "IO error: {}", e),
            RecordError::Truncated(what) => write!(f, "Truncated record: {}", what),
            RecordError::InvalidCount { what, count } => {
                write!(f, "Invalid {} count: {}", what, count)
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// Upper bound on any single list, well above anything the games shipped
const MAX_LIST_LEN: i64 = 0x10000;

/// Map an early EOF to `Truncated`, leave other IO errors alone
fn context<T>(result: io::Result<T>, what: &'static str) -> Result<T, RecordError> {
    result.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => RecordError::Truncated(what),
        _ => RecordError::IoError(e),
    })
}

fn check_count(count: i64, what: &'static str) -> Result<usize, RecordError> {
    if !(0..=MAX_LIST_LEN).contains(&count) {
        return Err(RecordError::InvalidCount { what, count });
    }
    Ok(count as usize)
}

fn read_list<R: Read, T>(
    reader: &mut R,
    count: usize,
    what: &'static str,
    mut read_one: impl FnMut(&mut R) -> io::Result<T>,
) -> Result<Vec<T>, RecordError> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(context(read_one(reader), what)?);
    }
    Ok(items)
}

pub fn read_vertex<R: Read>(reader: &mut R) -> io::Result<Vertex> {
    Ok(Vertex {
        x: reader.read_i16::<LE>()?,
        y: reader.read_i16::<LE>()?,
        z: reader.read_i16::<LE>()?,
    })
}

/// Read a face; `with_effects` selects the layout with a trailing effects word
pub fn read_face<R: Read, const N: usize>(reader: &mut R, with_effects: bool) -> io::Result<Face<N>> {
    let mut vertices = [0u16; N];
    for v in vertices.iter_mut() {
        *v = reader.read_u16::<LE>()?;
    }
    let texture = reader.read_u16::<LE>()?;
    let effects = if with_effects { reader.read_u16::<LE>()? } else { 0 };
    Ok(Face { vertices, texture, effects })
}

/// Read one mesh from the mesh data block
pub fn read_mesh<R: Read>(reader: &mut R, format: &LevelFormat) -> Result<MeshRecord, RecordError> {
    let centre = context(read_vertex(reader), "mesh centre")?;
    let collision_radius = context(reader.read_i32::<LE>(), "mesh collision radius")?;

    let vertex_count = check_count(context(reader.read_i16::<LE>(), "mesh vertex count")? as i64, "vertex")?;
    let vertices = read_list(reader, vertex_count, "mesh vertices", read_vertex)?;

    // Positive: normals. Negative: one light value per vertex.
    let normal_count = context(reader.read_i16::<LE>(), "mesh normal count")?;
    if normal_count > 0 {
        read_list(reader, normal_count as usize, "mesh normals", read_vertex)?;
    } else {
        let lights = normal_count.unsigned_abs() as usize;
        read_list(reader, lights, "mesh lights", |r| r.read_i16::<LE>())?;
    }

    let effects = format.has_face_effects();
    let mut mesh = MeshRecord { centre, collision_radius, vertices, ..Default::default() };

    let count = check_count(context(reader.read_i16::<LE>(), "rectangle count")? as i64, "textured rectangle")?;
    mesh.textured_rectangles = read_list(reader, count, "textured rectangles", |r| read_face(r, effects))?;

    let count = check_count(context(reader.read_i16::<LE>(), "triangle count")? as i64, "textured triangle")?;
    mesh.textured_triangles = read_list(reader, count, "textured triangles", |r| read_face(r, effects))?;

    if format.has_coloured_faces() {
        let count = check_count(context(reader.read_i16::<LE>(), "rectangle count")? as i64, "coloured rectangle")?;
        mesh.coloured_rectangles = read_list(reader, count, "coloured rectangles", |r| read_face(r, false))?;

        let count = check_count(context(reader.read_i16::<LE>(), "triangle count")? as i64, "coloured triangle")?;
        mesh.coloured_triangles = read_list(reader, count, "coloured triangles", |r| read_face(r, false))?;
    }

    Ok(mesh)
}

/// Read one object texture record
///
/// The fourth game appends a flags word and the original placement; the fifth
/// adds two bytes of padding after that.
pub fn read_object_texture<R: Read>(reader: &mut R, version: LevelVersion) -> io::Result<ObjectTexture> {
    let attribute = reader.read_u16::<LE>()?;
    let tile_and_flag = reader.read_u16::<LE>()?;
    if version >= LevelVersion::Tomb4 {
        reader.read_u16::<LE>()?;
    }

    let mut vertices = [ObjectTextureVertex::default(); 4];
    for v in vertices.iter_mut() {
        v.x_frac = reader.read_u8()?;
        v.x_whole = reader.read_u8()?;
        v.y_frac = reader.read_u8()?;
        v.y_whole = reader.read_u8()?;
    }

    if version >= LevelVersion::Tomb4 {
        // original u, v, width, height
        for _ in 0..4 {
            reader.read_u32::<LE>()?;
        }
    }
    if version >= LevelVersion::Tomb5 {
        reader.read_u16::<LE>()?;
    }

    Ok(ObjectTexture { attribute, tile_and_flag, vertices })
}

/// Read a u32-counted object texture list
pub fn read_object_textures<R: Read>(reader: &mut R, version: LevelVersion) -> Result<Vec<ObjectTexture>, RecordError> {
    let count = check_count(context(reader.read_u32::<LE>(), "object texture count")? as i64, "object texture")?;
    read_list(reader, count, "object textures", |r| read_object_texture(r, version))
}

pub fn read_sprite_texture<R: Read>(reader: &mut R) -> io::Result<SpriteTexture> {
    Ok(SpriteTexture {
        tile: reader.read_u16::<LE>()?,
        x: reader.read_u8()?,
        y: reader.read_u8()?,
        width: reader.read_u16::<LE>()?,
        height: reader.read_u16::<LE>()?,
        left: reader.read_i16::<LE>()?,
        top: reader.read_i16::<LE>()?,
        right: reader.read_i16::<LE>()?,
        bottom: reader.read_i16::<LE>()?,
    })
}

/// Read the animated texture block
///
/// Layout: u32 word count, u16 sequence count, then per sequence a u16
/// holding `frames - 1` followed by the frame indices. From the fourth game a
/// u8 UV-animated sequence count follows.
pub fn read_animated_textures<R: Read>(reader: &mut R, version: LevelVersion) -> Result<AnimatedTextures, RecordError> {
    context(reader.read_u32::<LE>(), "animated texture word count")?;
    let sequence_count = context(reader.read_u16::<LE>(), "animated sequence count")? as usize;

    let mut sequences = Vec::with_capacity(sequence_count);
    for _ in 0..sequence_count {
        let frames = context(reader.read_u16::<LE>(), "animated sequence length")? as usize + 1;
        sequences.push(read_list(reader, frames, "animated frames", |r| r.read_u16::<LE>())?);
    }

    let uv_count = if version >= LevelVersion::Tomb4 {
        context(reader.read_u8(), "animated uv count")?
    } else {
        0
    };

    Ok(AnimatedTextures { sequences, uv_count })
}

/// Read the 256-entry VGA palette (6 bits per channel, expanded to 8)
pub fn read_palette8<R: Read>(reader: &mut R) -> Result<Vec<PaletteEntry>, RecordError> {
    read_list(reader, 256, "palette", |r| {
        Ok(PaletteEntry::new(r.read_u8()? << 2, r.read_u8()? << 2, r.read_u8()? << 2))
    })
}

/// Read the 256-entry 16-bit palette (RGBA, alpha unused)
pub fn read_palette16<R: Read>(reader: &mut R) -> Result<Vec<PaletteEntry>, RecordError> {
    read_list(reader, 256, "palette16", |r| {
        let entry = PaletteEntry::new(r.read_u8()?, r.read_u8()?, r.read_u8()?);
        r.read_u8()?;
        Ok(entry)
    })
}

/// Read whichever palettes the version stores, in file order
pub fn read_palettes<R: Read>(reader: &mut R, version: LevelVersion) -> Result<Palette, RecordError> {
    let mut palette = Palette::default();
    if version < LevelVersion::Tomb4 {
        palette.colours = read_palette8(reader)?;
    }
    if version == LevelVersion::Tomb2 || version == LevelVersion::Tomb3 {
        palette.colours16 = read_palette16(reader)?;
    }
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::types::Platform;
    use std::io::Cursor;

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_i16(buf: &mut Vec<u8>, v: i16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn tr2_mesh_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        // centre + radius
        push_i16(&mut buf, 0);
        push_i16(&mut buf, 0);
        push_i16(&mut buf, 0);
        buf.extend_from_slice(&100i32.to_le_bytes());
        // 4 vertices
        push_i16(&mut buf, 4);
        for (x, z) in [(0, 0), (1024, 0), (1024, 1024), (0, 1024)] {
            push_i16(&mut buf, x);
            push_i16(&mut buf, 0);
            push_i16(&mut buf, z);
        }
        // -4 means lights
        push_i16(&mut buf, -4);
        for _ in 0..4 {
            push_i16(&mut buf, 0x1000);
        }
        // one textured rectangle
        push_i16(&mut buf, 1);
        for v in [0, 1, 2, 3] {
            push_u16(&mut buf, v);
        }
        push_u16(&mut buf, 0x8002);
        // no textured triangles
        push_i16(&mut buf, 0);
        // no coloured rectangles, one coloured triangle
        push_i16(&mut buf, 0);
        push_i16(&mut buf, 1);
        for v in [0, 1, 2] {
            push_u16(&mut buf, v);
        }
        push_u16(&mut buf, 0x0300);
        buf
    }

    #[test]
    fn test_read_mesh_tr2() {
        let bytes = tr2_mesh_bytes();
        let format = LevelFormat::new(LevelVersion::Tomb2, Platform::Pc);
        let mesh = read_mesh(&mut Cursor::new(&bytes), &format).unwrap();

        assert_eq!(mesh.collision_radius, 100);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.vertices[2], Vertex::new(1024, 0, 1024));
        assert_eq!(mesh.textured_rectangles.len(), 1);
        assert_eq!(mesh.textured_rectangles[0].texture, 0x8002);
        assert_eq!(mesh.textured_rectangles[0].effects, 0);
        assert!(mesh.textured_triangles.is_empty());
        assert_eq!(mesh.coloured_triangles.len(), 1);
        assert_eq!(mesh.coloured_triangles[0].texture, 0x0300);
    }

    #[test]
    fn test_read_mesh_truncated() {
        let mut bytes = tr2_mesh_bytes();
        bytes.truncate(bytes.len() - 3);
        let format = LevelFormat::new(LevelVersion::Tomb2, Platform::Pc);
        let result = read_mesh(&mut Cursor::new(&bytes), &format);
        assert!(matches!(result, Err(RecordError::Truncated("coloured triangles"))));
    }

    #[test]
    fn test_read_mesh_negative_count() {
        let mut buf = vec![0u8; 10];
        push_i16(&mut buf, -5);
        let format = LevelFormat::new(LevelVersion::Tomb1, Platform::Pc);
        let result = read_mesh(&mut Cursor::new(&buf), &format);
        assert!(matches!(result, Err(RecordError::InvalidCount { what: "vertex", count: -5 })));
    }

    #[test]
    fn test_read_object_texture_tr4_layout() {
        let mut buf = Vec::new();
        push_u16(&mut buf, 2);
        push_u16(&mut buf, 0x8007);
        push_u16(&mut buf, 0xFFFF); // new flags
        for i in 0..4u8 {
            buf.extend_from_slice(&[0, 10 + i, 0, 20 + i]);
        }
        buf.extend_from_slice(&[0u8; 16]);
        push_u16(&mut buf, 0xABCD); // next record starts here

        let mut cursor = Cursor::new(&buf);
        let tex = read_object_texture(&mut cursor, LevelVersion::Tomb4).unwrap();
        assert_eq!(tex.attribute, 2);
        assert_eq!(tex.tile(), 7);
        assert_eq!(tex.vertices[3].x_whole, 13);
        assert_eq!(tex.vertices[3].y_whole, 23);
        assert_eq!(cursor.read_u16::<LE>().unwrap(), 0xABCD);
    }

    #[test]
    fn test_read_animated_textures() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7u32.to_le_bytes());
        push_u16(&mut buf, 2);
        push_u16(&mut buf, 1);
        push_u16(&mut buf, 4);
        push_u16(&mut buf, 5);
        push_u16(&mut buf, 2);
        push_u16(&mut buf, 6);
        push_u16(&mut buf, 7);
        push_u16(&mut buf, 8);
        buf.push(1);

        let anim = read_animated_textures(&mut Cursor::new(&buf), LevelVersion::Tomb4).unwrap();
        assert_eq!(anim.sequences, vec![vec![4, 5], vec![6, 7, 8]]);
        assert_eq!(anim.uv_count, 1);
        assert_eq!(anim.uv_sequences().count(), 1);
    }

    #[test]
    fn test_read_palette8_expands_channels() {
        let mut buf = vec![0u8; 256 * 3];
        buf[3] = 63;
        buf[4] = 32;
        buf[5] = 1;
        let palette = read_palette8(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(palette[1], PaletteEntry::new(252, 128, 4));
    }
}
