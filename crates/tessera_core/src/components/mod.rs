//! Stock components
//!
//! Plain `#[repr(C)]` records with the owning entity first. Anything heavier
//! than POD (GPU resources, physics bodies, scripts) lives outside the ECS
//! and is referred to by an opaque handle.

mod camera;
mod physics;
mod selectable;
mod sprite;
mod transform;

pub use camera::CameraComponent;
pub use physics::PhysicsComponent;
pub use selectable::SelectableComponent;
pub use sprite::SpriteComponent;
pub use transform::TransformComponent;

use crate::ecs::ComponentManager;

/// Register a pool for every stock component.
pub fn register_all(manager: &mut ComponentManager, reserve: usize) {
    manager.add_component_type::<TransformComponent>(reserve);
    manager.add_component_type::<CameraComponent>(reserve);
    manager.add_component_type::<SpriteComponent>(reserve);
    manager.add_component_type::<PhysicsComponent>(reserve);
    manager.add_component_type::<SelectableComponent>(reserve);
}
