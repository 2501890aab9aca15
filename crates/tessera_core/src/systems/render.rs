//! Gather per-frame sprite instances for the renderer

use crate::components::{SpriteComponent, TransformComponent};
use crate::ecs::{ComponentManager, Entity};
use bytemuck::{Pod, Zeroable};

/// One GPU-facing sprite instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub texture: u32,
    pub entity: Entity,
    pub _pad: [u32; 2],
}

/// Every sprite with a transform, in entity order. Sprite size scales the
/// model matrix on X/Y.
pub fn gather_sprites(manager: &mut ComponentManager) -> Vec<SpriteInstance> {
    let mut instances = Vec::new();
    let mut it = manager.begin::<(TransformComponent, SpriteComponent)>();
    while it.next() {
        let (Some(transform), Some(sprite)) =
            (it.get::<TransformComponent>(), it.get::<SpriteComponent>())
        else {
            continue;
        };
        let mut scaled = *transform;
        scaled.scale.x *= sprite.size.x;
        scaled.scale.y *= sprite.size.y;
        instances.push(SpriteInstance {
            model: scaled.matrix().to_cols_array_2d(),
            color: sprite.color,
            texture: sprite.texture,
            entity: it.entity(),
            _pad: [0; 2],
        });
    }
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_all;
    use glam::{Mat4, Vec2, Vec3};

    #[test]
    fn instances_follow_entity_order_and_sprite_size() {
        let mut m = ComponentManager::new();
        register_all(&mut m, 4);

        let a = {
            let mut it = m.add_entity::<(TransformComponent, SpriteComponent)>();
            it.get_mut::<SpriteComponent>().unwrap().size = Vec2::new(2.0, 3.0);
            it.entity()
        };
        m.add_components::<(TransformComponent,)>(Entity::INVALID);
        let c = {
            let mut it = m.add_entity::<(TransformComponent, SpriteComponent)>();
            it.get_mut::<TransformComponent>().unwrap().position = Vec3::X;
            it.get_mut::<SpriteComponent>().unwrap().texture = 7;
            it.entity()
        };

        let instances = gather_sprites(&mut m);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].entity, a);
        assert_eq!(
            Mat4::from_cols_array_2d(&instances[0].model),
            Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0))
        );
        assert_eq!(instances[1].entity, c);
        assert_eq!(instances[1].texture, 7);
        assert_eq!(std::mem::size_of::<SpriteInstance>() % 16, 0);
        assert!(!bytemuck::cast_slice::<SpriteInstance, u8>(&instances).is_empty());
    }
}
