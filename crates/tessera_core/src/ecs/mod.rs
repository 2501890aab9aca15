//! Entity Component System
//!
//! Components of one type live packed in a `ComponentPool`, sorted by
//! owning entity. The `ComponentManager` owns every pool and drives
//! multi-pool sweeps through `EntityIterator`. `ComponentPtr` keeps a
//! reference to one component alive across pool growth and removals.
//!
//! ```ignore
//! let mut manager = ComponentManager::new();
//! manager.add_component_type::<TransformComponent>(1024);
//!
//! let mut it = manager.add_entity::<(TransformComponent,)>();
//! it.get_mut::<TransformComponent>().unwrap().position.x = 1.0;
//!
//! let mut it = manager.begin::<(TransformComponent,)>();
//! while it.next() {
//!     // ...
//! }
//! ```

mod component;
mod entity;
mod error;
mod iter;
mod manager;
mod pool;
mod ptr;
mod set;

pub use component::{meta_of, name_of, register_component, Component, ComponentId, ComponentMeta};
pub use entity::Entity;
pub use error::EcsError;
pub use iter::{EntityCursor, EntityIterator, IterMode};
pub use manager::ComponentManager;
pub use pool::{ComponentPool, ErasedPool, Insertion, PoolStats};
pub use ptr::ComponentPtr;
pub use set::ComponentSet;
