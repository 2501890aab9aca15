use crate::define_component;
use crate::ecs::Entity;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Simulation state mirrored from the physics engine.
///
/// `body` is the engine's rigid-body handle; the body itself is never
/// stored here. `inverse_mass == 0` marks a static body.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PhysicsComponent {
    pub entity: Entity,
    pub velocity: Vec3,
    pub inverse_mass: f32,
    pub body: u32,
    pub gravity_scale: f32,
}

define_component!(PhysicsComponent, 4, "Physics");

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            velocity: Vec3::ZERO,
            inverse_mass: 1.0,
            body: 0,
            gravity_scale: 1.0,
        }
    }
}

impl PhysicsComponent {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }
}
