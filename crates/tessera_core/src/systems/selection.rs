//! Ray picking over selectable entities

use crate::components::{SelectableComponent, TransformComponent};
use crate::ecs::{ComponentManager, Entity};
use glam::Vec3;

/// Distance along a normalized ray to the first hit on a sphere, if any.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    [-b - sqrt, -b + sqrt].into_iter().find(|&t| t >= 0.0)
}

/// Select the nearest selectable hit by the ray and clear every other
/// selection. Returns the picked entity.
pub fn pick(manager: &mut ComponentManager, origin: Vec3, direction: Vec3) -> Option<Entity> {
    let dir = direction.try_normalize()?;

    let mut nearest: Option<(f32, Entity)> = None;
    let mut it = manager.begin::<(TransformComponent, SelectableComponent)>();
    while it.next() {
        let (Some(transform), Some(selectable)) =
            (it.get::<TransformComponent>(), it.get::<SelectableComponent>())
        else {
            continue;
        };
        let radius = selectable.radius * transform.scale.max_element();
        if let Some(t) = ray_sphere(origin, dir, transform.position, radius) {
            if nearest.map_or(true, |(best, _)| t < best) {
                nearest = Some((t, it.entity()));
            }
        }
    }

    let picked = nearest.map(|(_, entity)| entity);
    let mut it = manager.begin::<(SelectableComponent,)>();
    while it.next() {
        let entity = it.entity();
        if let Some(selectable) = it.get_mut::<SelectableComponent>() {
            selectable.set_selected(Some(entity) == picked);
        }
    }
    if let Some(entity) = picked {
        tracing::debug!(entity = %entity, "picked entity");
    }
    picked
}
