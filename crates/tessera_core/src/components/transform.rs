use crate::define_component;
use crate::ecs::Entity;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// World-space placement of an entity.
///
/// Rotation is kept as raw `[x, y, z, w]` so the record stays 4-byte
/// aligned and padding-free; use `rotation_quat`/`set_rotation`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TransformComponent {
    pub entity: Entity,
    pub position: Vec3,
    pub rotation: [f32; 4],
    pub scale: Vec3,
}

define_component!(TransformComponent, 1, "Transform");

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY.to_array(),
            scale: Vec3::ONE,
        }
    }
}

impl TransformComponent {
    #[inline]
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_array(self.rotation)
    }

    #[inline]
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize().to_array();
    }

    /// Local-to-world matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }
}
