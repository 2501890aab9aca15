use crate::define_component;
use crate::ecs::Entity;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Textured quad. `texture` is an opaque handle owned by the renderer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteComponent {
    pub entity: Entity,
    pub texture: u32,
    pub color: [f32; 4],
    pub size: Vec2,
}

define_component!(SpriteComponent, 3, "Sprite");

impl Default for SpriteComponent {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            texture: 0,
            color: [1.0; 4],
            size: Vec2::ONE,
        }
    }
}
