//! Per-frame transparency accumulation
//!
//! Triangles are added by the scene every frame, sorted back to front, then
//! flattened into one vertex array with a run list that groups neighbours
//! sharing a texture and blend mode. Each run is one draw call.
//!
//! ```text
//! Empty --add--> Accumulating --sort--> Sorted --render--> Rendered
//!   ^                                                          |
//!   +------------------------------reset-----------------------+
//! ```

use crate::geometry::{MeshVertex, TransparentTriangle};
use crate::render::{BlendMode, TextureMode, Vec3};

/// Where the buffer is in its frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferState {
    #[default]
    Empty,
    Accumulating,
    Sorted,
    Rendered,
}

/// Consecutive sorted triangles drawn with one texture and blend mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRun {
    pub texture: u32,
    pub texture_mode: TextureMode,
    pub blend_mode: BlendMode,
    /// Number of triangles
    pub count: u32,
}

impl TextureRun {
    fn accepts(&self, triangle: &TransparentTriangle) -> bool {
        self.texture == triangle.texture
            && self.texture_mode == triangle.texture_mode
            && self.blend_mode == triangle.blend_mode
    }
}

/// GPU side of the transparency pass
pub trait TransparencyTarget {
    /// Upload the staged vertices for this frame
    fn bind_vertices(&mut self, vertices: &[MeshVertex]);

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn bind_texture(&mut self, tile: u32);

    fn bind_untextured(&mut self);

    /// Draw `count` vertices starting at `start`
    fn draw(&mut self, count: u32, start: u32);
}

/// Accumulates transparent triangles for one frame
#[derive(Debug, Default)]
pub struct TransparencyBuffer {
    triangles: Vec<TransparentTriangle>,
    runs: Vec<TextureRun>,
    vertices: Vec<MeshVertex>,
    state: BufferState,
}

impl TransparencyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn add(&mut self, triangle: TransparentTriangle) {
        debug_assert!(
            matches!(self.state, BufferState::Empty | BufferState::Accumulating),
            "add after sort (state {:?})",
            self.state
        );
        if !matches!(self.state, BufferState::Empty | BufferState::Accumulating) {
            return;
        }
        self.triangles.push(triangle);
        self.state = BufferState::Accumulating;
    }

    /// Order triangles farthest first from `eye` and rebuild the runs
    ///
    /// The sort is stable, so triangles at equal distance keep the order they
    /// were added in. Sorting again without adding is a no-op.
    pub fn sort(&mut self, eye: Vec3) {
        self.triangles.sort_by(|a, b| {
            let da = eye.distance_squared(a.position);
            let db = eye.distance_squared(b.position);
            db.total_cmp(&da)
        });
        self.complete();
        self.state = BufferState::Sorted;
    }

    /// Stage three vertices per triangle and build the run list in one pass
    fn complete(&mut self) {
        self.runs.clear();
        self.vertices.clear();
        self.vertices.reserve(self.triangles.len() * 3);

        for triangle in &self.triangles {
            match self.runs.last_mut() {
                Some(run) if run.accepts(triangle) => run.count += 1,
                _ => self.runs.push(TextureRun {
                    texture: triangle.texture,
                    texture_mode: triangle.texture_mode,
                    blend_mode: triangle.blend_mode,
                    count: 1,
                }),
            }

            let normal = triangle.normal();
            for i in 0..3 {
                self.vertices.push(MeshVertex::new(
                    triangle.vertices[i],
                    normal,
                    triangle.uvs[i],
                    triangle.colours[i],
                ));
            }
        }
    }

    pub fn triangles(&self) -> &[TransparentTriangle] {
        &self.triangles
    }

    pub fn runs(&self) -> &[TextureRun] {
        &self.runs
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Issue one draw per run
    ///
    /// Alpha blending is set up front and only changed when a run's blend
    /// mode differs from the previous run's. With `ignore_blend` the blend
    /// state is left entirely to the caller.
    pub fn render<T: TransparencyTarget + ?Sized>(&mut self, target: &mut T, ignore_blend: bool) {
        debug_assert!(
            matches!(self.state, BufferState::Sorted | BufferState::Rendered | BufferState::Empty),
            "render before sort"
        );
        if self.state == BufferState::Accumulating {
            return;
        }
        if self.state == BufferState::Sorted {
            self.state = BufferState::Rendered;
        }
        if self.vertices.is_empty() {
            return;
        }

        target.bind_vertices(&self.vertices);
        if !ignore_blend {
            target.set_blend_mode(BlendMode::Normal);
        }

        let mut start = 0;
        let mut previous = BlendMode::Normal;
        for run in &self.runs {
            if run.blend_mode != previous && !ignore_blend {
                target.set_blend_mode(run.blend_mode);
            }
            previous = run.blend_mode;

            match run.texture_mode {
                TextureMode::Untextured => target.bind_untextured(),
                TextureMode::Textured => target.bind_texture(run.texture),
            }
            target.draw(run.count * 3, start);
            start += run.count * 3;
        }
    }

    /// Drop everything for the next frame
    pub fn reset(&mut self) {
        self.triangles.clear();
        self.runs.clear();
        self.vertices.clear();
        self.state = BufferState::Empty;
    }
}
