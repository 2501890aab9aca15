//! Write simulated motion back into transforms

use crate::components::{PhysicsComponent, TransformComponent};
use crate::ecs::ComponentManager;
use glam::Vec3;

/// Earth gravity along -Y.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Advance every entity with a transform and a physics component by `dt`
/// seconds (semi-implicit Euler). Static bodies keep their velocity.
/// Returns the number of entities stepped.
pub fn integrate(manager: &mut ComponentManager, dt: f32, gravity: Vec3) -> usize {
    let mut stepped = 0;
    let mut it = manager.begin::<(TransformComponent, PhysicsComponent)>();
    while it.next() {
        let (Some(transform), Some(physics)) = it.components_mut() else {
            continue;
        };
        if !physics.is_static() {
            physics.velocity += gravity * physics.gravity_scale * dt;
        }
        transform.position += physics.velocity * dt;
        stepped += 1;
    }
    tracing::trace!(stepped, dt, "physics integrated");
    stepped
}
