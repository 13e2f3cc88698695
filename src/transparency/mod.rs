//! Transparency Compositor
//!
//! - `buffer` - per-frame accumulation, depth sort, run batching and drawing
//! - `contributors` - scene objects that add triangles each frame
//!
//! A frame looks like:
//!
//! ```ignore
//! buffer.reset();
//! for contributor in &scene {
//!     contributor.get_transparent_triangles(&mut buffer, &camera, colour);
//! }
//! buffer.sort(camera.position);
//! buffer.render(&mut target, false);
//! ```

pub mod buffer;
pub mod contributors;

pub use buffer::{BufferState, TextureRun, TransparencyBuffer, TransparencyTarget};
pub use contributors::{billboard, MeshInstance, Portal, Skybox, Sprite, TransparencyContributor};
