use crate::components::TransformComponent;
use crate::define_component;
use crate::ecs::Entity;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Perspective camera. Its placement comes from the entity's transform.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraComponent {
    pub entity: Entity,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

define_component!(CameraComponent, 2, "Camera");

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            fov_y_radians: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraComponent {
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, transform: &TransformComponent) -> Mat4 {
        self.projection() * transform.matrix().inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn point_in_front_of_camera_lands_in_clip_volume() {
        let camera = CameraComponent::default();
        let transform = TransformComponent {
            position: Vec3::new(0.0, 0.0, 5.0),
            ..Default::default()
        };
        let clip = camera.view_projection(&transform) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
