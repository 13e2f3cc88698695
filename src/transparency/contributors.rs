//! Scene objects that feed the transparency buffer
//!
//! Each contributor copies its transparent triangles into the buffer once per
//! frame, moved into world space and tinted with the colour it is given.

use std::rc::Rc;

use crate::geometry::{Mesh, SpriteMesh, TransparentTriangle};
use crate::render::{
    mat4_mul, mat4_rotation_y, mat4_scale_xyz, mat4_translation, Camera, Color, Mat4, Vec3,
};
use crate::settings::GeometrySettings;

use super::buffer::TransparencyBuffer;

/// Anything that draws transparent geometry
pub trait TransparencyContributor {
    fn get_transparent_triangles(&self, buffer: &mut TransparencyBuffer, camera: &Camera, colour: Color);
}

/// World transform of a quad turned about Y to face the camera
///
/// The quad is scaled, then offset, then rotated and moved to `position`.
pub fn billboard(position: Vec3, offset: Vec3, scale: Vec3, camera: &Camera) -> Mat4 {
    let to_camera = camera.position - position;
    let yaw = to_camera.x.atan2(to_camera.z);
    let placed = mat4_mul(&mat4_translation(position), &mat4_rotation_y(yaw));
    let local = mat4_mul(&mat4_translation(offset), &mat4_scale_xyz(scale));
    mat4_mul(&placed, &local)
}

fn add_transformed(
    buffer: &mut TransparencyBuffer,
    triangles: &[TransparentTriangle],
    world: &Mat4,
    colour: Color,
) {
    for triangle in triangles {
        buffer.add(triangle.transform(world, colour, true));
    }
}

/// Entity or static mesh placed in the level
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Rc<Mesh>,
    pub world: Mat4,
    pub visible: bool,
}

impl MeshInstance {
    pub fn new(mesh: Rc<Mesh>, world: Mat4) -> Self {
        Self { mesh, world, visible: true }
    }
}

impl TransparencyContributor for MeshInstance {
    fn get_transparent_triangles(&self, buffer: &mut TransparencyBuffer, _camera: &Camera, colour: Color) {
        if !self.visible {
            return;
        }
        add_transformed(buffer, self.mesh.transparent_triangles(), &self.world, colour);
    }
}

/// Sprite drawn as a camera-facing quad
#[derive(Debug, Clone)]
pub struct Sprite {
    pub mesh: Rc<SpriteMesh>,
    pub position: Vec3,
    pub visible: bool,
}

impl Sprite {
    pub fn new(mesh: Rc<SpriteMesh>, position: Vec3) -> Self {
        Self { mesh, position, visible: true }
    }
}

impl TransparencyContributor for Sprite {
    fn get_transparent_triangles(&self, buffer: &mut TransparencyBuffer, camera: &Camera, colour: Color) {
        if !self.visible {
            return;
        }
        let world = billboard(self.position, self.mesh.offset, self.mesh.scale, camera);
        add_transformed(buffer, self.mesh.mesh.transparent_triangles(), &world, colour);
    }
}

/// Opening between two rooms, shown as a translucent quad
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    /// Corners relative to the room
    pub vertices: [Vec3; 4],
    pub room_offset: Vec3,
}

impl Portal {
    pub fn new(vertices: [Vec3; 4], room_offset: Vec3) -> Self {
        Self { vertices, room_offset }
    }
}

impl TransparencyContributor for Portal {
    /// Portals ignore the tint and always use `Color::PORTAL`
    fn get_transparent_triangles(&self, buffer: &mut TransparencyBuffer, _camera: &Camera, _colour: Color) {
        let v = self.vertices.map(|v| v + self.room_offset);
        buffer.add(TransparentTriangle::untextured([v[0], v[1], v[2]], Color::PORTAL));
        buffer.add(TransparentTriangle::untextured([v[2], v[3], v[0]], Color::PORTAL));
    }
}

/// Sky model that follows the camera
#[derive(Debug, Clone)]
pub struct Skybox {
    pub mesh: Rc<Mesh>,
    /// Vertical shift applied on top of the camera position
    pub offset: f32,
}

impl Skybox {
    pub fn new(mesh: Rc<Mesh>, offset: f32) -> Self {
        Self { mesh, offset }
    }

    pub fn from_settings(mesh: Rc<Mesh>, settings: &GeometrySettings) -> Self {
        Self::new(mesh, settings.skybox_offset)
    }

    pub fn world(&self, camera: &Camera) -> Mat4 {
        mat4_translation(camera.position + Vec3::new(0.0, self.offset, 0.0))
    }
}

impl TransparencyContributor for Skybox {
    fn get_transparent_triangles(&self, buffer: &mut TransparencyBuffer, camera: &Camera, colour: Color) {
        add_transformed(buffer, self.mesh.transparent_triangles(), &self.world(camera), colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{create_sprite_mesh, SpriteOffsetMode};
    use crate::level::SpriteTexture;
    use crate::render::{BlendMode, TextureMode, Vec2};

    fn transparent_mesh() -> Rc<Mesh> {
        let triangle = TransparentTriangle::new(
            [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            [Vec2::ZERO; 3],
            2,
            BlendMode::Additive,
        );
        Rc::new(Mesh::new(Vec::new(), Vec::new(), Vec::new(), vec![triangle], Vec::new()))
    }

    #[test]
    fn test_mesh_instance_transforms_and_tints() {
        let tint = Color::new(0.5, 0.5, 0.5, 1.0);
        let instance = MeshInstance::new(transparent_mesh(), mat4_translation(Vec3::new(0.0, 0.0, 10.0)));
        let mut buffer = TransparencyBuffer::new();
        instance.get_transparent_triangles(&mut buffer, &Camera::new(), tint);

        let added = &buffer.triangles()[0];
        assert_eq!(added.vertices[1], Vec3::new(1.0, 0.0, 10.0));
        assert_eq!(added.position, Vec3::new(0.5, 0.5, 10.0));
        assert_eq!(added.colours, [tint; 3]);
        assert_eq!(added.blend_mode, BlendMode::Additive);
    }

    #[test]
    fn test_hidden_instance_adds_nothing() {
        let mut instance = MeshInstance::new(transparent_mesh(), mat4_translation(Vec3::ZERO));
        instance.visible = false;
        let mut buffer = TransparencyBuffer::new();
        instance.get_transparent_triangles(&mut buffer, &Camera::new(), Color::WHITE);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_portal_is_two_untextured_triangles() {
        let portal = Portal::new(
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Vec3::new(5.0, 0.0, 0.0),
        );
        let mut buffer = TransparencyBuffer::new();
        portal.get_transparent_triangles(&mut buffer, &Camera::new(), Color::WHITE);

        let tris = buffer.triangles();
        assert_eq!(tris.len(), 2);
        assert!(tris.iter().all(|t| t.texture_mode == TextureMode::Untextured));
        assert!(tris.iter().all(|t| t.colours == [Color::PORTAL; 3]));
        assert_eq!(tris[1].vertices[0], Vec3::new(6.0, 1.0, 0.0));
    }

    #[test]
    fn test_sprite_faces_camera() {
        let sprite_texture = SpriteTexture {
            width: 255,
            height: 255,
            left: -512,
            top: -1024,
            right: 512,
            bottom: 0,
            ..Default::default()
        };
        let sprite = Sprite::new(
            Rc::new(create_sprite_mesh(&sprite_texture, SpriteOffsetMode::Entity)),
            Vec3::ZERO,
        );
        // camera off to +x: the quad turns so its plane is x = 0
        let camera = Camera::at(Vec3::new(10.0, 0.0, 0.0));
        let mut buffer = TransparencyBuffer::new();
        sprite.get_transparent_triangles(&mut buffer, &camera, Color::WHITE);

        assert_eq!(buffer.triangles().len(), 2);
        for tri in buffer.triangles() {
            for v in tri.vertices {
                assert!(v.x.abs() < 0.0001);
                assert!(v.y >= -1.0001 && v.y <= 0.0001);
            }
        }
    }

    #[test]
    fn test_skybox_follows_camera() {
        let settings = GeometrySettings { skybox_offset: -2.0, ..Default::default() };
        let skybox = Skybox::from_settings(transparent_mesh(), &settings);
        let camera = Camera::at(Vec3::new(3.0, 4.0, 5.0));
        let mut buffer = TransparencyBuffer::new();
        skybox.get_transparent_triangles(&mut buffer, &camera, Color::WHITE);
        assert_eq!(buffer.triangles()[0].vertices[0], Vec3::new(3.0, 2.0, 5.0));
    }
}
