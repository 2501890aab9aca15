// ptr.rs - Long-lived component handles
//
// A ComponentPtr is a generation-checked index: it caches where its
// component lived together with the pool version at that time. While the
// version is unchanged the cached index is used as is; after any growth or
// removal it re-resolves by entity id.

use crate::ecs::{Component, ComponentManager, ComponentPool, Entity};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

/// Weak, self-healing reference to one entity's `T`.
///
/// Survives pool growth and removals of other components. Once the entity
/// loses its `T`, every access returns `None`.
pub struct ComponentPtr<T: Component> {
    entity: Entity,
    version: Cell<u64>,
    index: Cell<Option<usize>>,
    _component: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentPtr<T> {
    /// Handle to `entity`'s live `T`. `None` if it has none.
    pub fn new(manager: &ComponentManager, entity: Entity) -> Option<Self> {
        let pool = manager.pool::<T>()?;
        let index = pool.position(entity)?;
        Some(Self {
            entity,
            version: Cell::new(pool.version()),
            index: Cell::new(Some(index)),
            _component: PhantomData,
        })
    }

    /// A handle that resolves nothing until assigned.
    pub fn null() -> Self {
        Self {
            entity: Entity::INVALID,
            version: Cell::new(0),
            index: Cell::new(None),
            _component: PhantomData,
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Repoint at `entity`'s `T`, snapshotting the current pool version.
    /// Returns false (and leaves the handle null) if there is none.
    pub fn assign(&mut self, manager: &ComponentManager, entity: Entity) -> bool {
        match Self::new(manager, entity) {
            Some(fresh) => {
                *self = fresh;
                true
            }
            None => {
                *self = Self::null();
                false
            }
        }
    }

    /// Whether the cached index predates the pool's current layout.
    pub fn is_stale(&self, manager: &ComponentManager) -> bool {
        manager
            .pool::<T>()
            .map_or(true, |pool| pool.version() != self.version.get())
    }

    fn resolve(&self, manager: &ComponentManager, pool: &ComponentPool<T>) -> Option<usize> {
        if pool.version() != self.version.get() {
            let index = pool.position(self.entity);
            tracing::trace!(
                component = T::NAME,
                entity = %self.entity,
                from = self.version.get(),
                to = pool.version(),
                found = index.is_some(),
                "component pointer re-resolved"
            );
            manager.record_rescan();
            self.index.set(index);
            self.version.set(pool.version());
        }

        let index = self.index.get()?;
        let owner = pool.get_at(index)?.entity();
        (owner == self.entity).then_some(index)
    }

    /// The component, re-resolved first if the pool changed since the last
    /// access.
    pub fn get<'m>(&self, manager: &'m ComponentManager) -> Option<&'m T> {
        let pool = manager.pool::<T>()?;
        let index = self.resolve(manager, pool)?;
        pool.get_at(index)
    }

    pub fn get_mut<'m>(&self, manager: &'m mut ComponentManager) -> Option<&'m mut T> {
        let index = {
            let pool = manager.pool::<T>()?;
            self.resolve(manager, pool)?
        };
        manager.pool_mut::<T>()?.get_at_mut(index)
    }
}

impl<T: Component> Clone for ComponentPtr<T> {
    /// Copies the cached version and index without re-validating them.
    fn clone(&self) -> Self {
        Self {
            entity: self.entity,
            version: self.version.clone(),
            index: self.index.clone(),
            _component: PhantomData,
        }
    }
}

impl<T: Component> Default for ComponentPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Component> fmt::Debug for ComponentPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPtr")
            .field("component", &T::NAME)
            .field("entity", &self.entity)
            .field("version", &self.version.get())
            .field("index", &self.index.get())
            .finish()
    }
}
