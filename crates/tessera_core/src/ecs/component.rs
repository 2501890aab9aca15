// component.rs - Component trait and runtime registration
//
// Components are identified by explicit u32 ids assigned at definition
// time, not by addresses. The global registry remembers which Rust type
// claimed each id so two different types can never share one.

use crate::ecs::{EcsError, Entity};
use bytemuck::Pod;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::mem::{align_of, size_of};
use std::sync::{PoisonError, RwLock};

pub type ComponentId = u32;

/// Metadata describing a component's memory layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub id: ComponentId,
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub type_id: TypeId,
}

/// Global registry of every component type seen by any manager in the process.
static REGISTRY: Lazy<RwLock<HashMap<ComponentId, ComponentMeta>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Record a component's metadata.
///
/// Registering the same type twice is a no-op. Registering a different type
/// under an id that is already taken fails with `ComponentIdCollision`.
pub fn register_component(meta: ComponentMeta) -> Result<(), EcsError> {
    let mut map = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(prev) = map.get(&meta.id) {
        if prev.type_id != meta.type_id {
            return Err(EcsError::ComponentIdCollision {
                id: meta.id,
                existing: prev.name,
                requested: meta.name,
            });
        }
        // Same type, same layout: nothing to do.
        debug_assert_eq!(prev.size, meta.size);
        return Ok(());
    }
    map.insert(meta.id, meta);
    Ok(())
}

/// Look up component metadata by id.
pub fn meta_of(id: ComponentId) -> Option<ComponentMeta> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned()
}

/// Human-readable name for an id, `"<unregistered>"` if unknown.
pub fn name_of(id: ComponentId) -> &'static str {
    meta_of(id).map_or("<unregistered>", |m| m.name)
}

/// Trait for POD components.
///
/// `Pod` makes "trivially copyable, no owning pointers" a compile-time
/// requirement: a component holding a `Box`, a reference or padding bytes
/// does not implement it. Every component carries its owning entity, and
/// that field must come first in the layout (`#[repr(C)]`).
///
/// Components must not hold addresses of other components: pool storage
/// moves when it grows. Hold a `ComponentPtr` outside the component instead.
pub trait Component: Pod + Default + Send + Sync {
    /// Globally unique component id.
    const ID: ComponentId;

    /// Human-readable name for debugging.
    const NAME: &'static str;

    /// The entity that owns this component.
    fn entity(&self) -> Entity;

    fn set_entity(&mut self, entity: Entity);

    fn meta() -> ComponentMeta {
        ComponentMeta {
            id: Self::ID,
            name: Self::NAME,
            size: size_of::<Self>(),
            align: align_of::<Self>(),
            type_id: TypeId::of::<Self>(),
        }
    }

    /// Register this component's layout with the global registry.
    fn ensure_registered() -> Result<(), EcsError> {
        register_component(Self::meta())
    }
}

/// Whether `T` stores its owning entity in its first four bytes.
pub(crate) fn entity_is_leading_field<T: Component>() -> bool {
    const PROBE: Entity = Entity::from_raw(0x5EED_0001);
    let mut probe = T::default();
    probe.set_entity(PROBE);
    let bytes = bytemuck::bytes_of(&probe);
    bytes.len() >= size_of::<Entity>() && &bytes[..size_of::<Entity>()] == bytemuck::bytes_of(&PROBE)
}

/// Implement `Component` for a `#[repr(C)]` POD struct whose first field
/// holds its owning `Entity`. The field is assumed to be named `entity`
/// unless given explicitly.
///
/// # Example
/// ```ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
/// struct Health { entity: Entity, value: f32 }
///
/// define_component!(Health, 42, "Health");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $id:expr, $name:expr) => {
        $crate::define_component!($ty, $id, $name, entity);
    };
    ($ty:ty, $id:expr, $name:expr, $field:ident) => {
        impl $crate::ecs::Component for $ty {
            const ID: $crate::ecs::ComponentId = $id;
            const NAME: &'static str = $name;

            #[inline]
            fn entity(&self) -> $crate::ecs::Entity {
                self.$field
            }

            #[inline]
            fn set_entity(&mut self, entity: $crate::ecs::Entity) {
                self.$field = entity;
            }
        }
    };
}
