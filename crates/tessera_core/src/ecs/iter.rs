// iter.rs - Multi-pool entity iteration
//
// A cursor walks N pools at once, one column per requested type. Every
// column only moves forward, so a full sweep costs O(total components)
// regardless of how sparse the id range is.

use crate::ecs::{Component, ComponentId, ComponentManager, ComponentPool, ComponentPtr, ComponentSet, Entity};
use std::marker::PhantomData;

/// Which entities a sweep visits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IterMode {
    /// Entities owning every requested component.
    MatchAll,
    /// Entities owning at least one requested component.
    MatchAny,
}

/// Position of one requested type inside its pool. `None` once the pool is
/// exhausted for the rest of the sweep.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Column {
    pub(crate) id: ComponentId,
    pub(crate) index: Option<usize>,
}

/// Borrow-free iteration state, advanced by `ComponentManager::next`.
///
/// Starts positioned one before the first candidate (`Entity::INVALID`).
/// An exhausted cursor also reports `Entity::INVALID` and has no live column.
#[derive(Debug, Clone)]
pub struct EntityCursor {
    entity: Entity,
    mode: IterMode,
    pub(crate) columns: Vec<Column>,
}

impl EntityCursor {
    pub(crate) fn new(entity: Entity, mode: IterMode, columns: Vec<Column>) -> Self {
        Self {
            entity,
            mode,
            columns,
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    #[inline]
    pub fn mode(&self) -> IterMode {
        self.mode
    }

    /// True iff every column still points into its pool.
    pub fn valid(&self) -> bool {
        self.columns.iter().all(|c| c.index.is_some())
    }

    pub fn is_exhausted(&self) -> bool {
        !self.entity.is_valid() && self.columns.iter().all(|c| c.index.is_none())
    }

    #[inline]
    pub(crate) fn column_index(&self, column: usize) -> Option<usize> {
        self.columns.get(column).and_then(|c| c.index)
    }

    #[inline]
    pub(crate) fn index_of(&self, id: ComponentId) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.id == id)
            .and_then(|c| c.index)
    }

    #[inline]
    pub(crate) fn set_entity(&mut self, entity: Entity) {
        self.entity = entity;
    }

    pub(crate) fn exhaust(&mut self) {
        self.entity = Entity::INVALID;
        for column in &mut self.columns {
            column.index = None;
        }
    }
}

impl ComponentManager {
    /// Advance `cursor` to the next entity satisfying its mode. Returns
    /// false once the sweep is exhausted.
    ///
    /// Entities come out in strictly increasing id order, never twice.
    pub fn next(&self, cursor: &mut EntityCursor) -> bool {
        loop {
            let target = cursor.entity.successor();
            if target == cursor.entity {
                // Id space saturated, nothing beyond.
                cursor.exhaust();
                return false;
            }

            let mut found_all = true;
            let mut any_exhausted = false;
            let mut highest = Entity::INVALID;
            let mut lowest: Option<Entity> = None;

            for column in &mut cursor.columns {
                let Some(pool) = self.erased_pool(column.id) else {
                    column.index = None;
                    found_all = false;
                    any_exhausted = true;
                    continue;
                };

                column.index = column.index.and_then(|i| pool.seek(i, target));
                match column.index.and_then(|i| pool.entity_at(i)) {
                    Some(entity) => {
                        highest = highest.max(entity);
                        lowest = Some(lowest.map_or(entity, |l| l.min(entity)));
                        if entity != target {
                            found_all = false;
                        }
                    }
                    None => {
                        column.index = None;
                        found_all = false;
                        any_exhausted = true;
                    }
                }
            }

            match cursor.mode {
                IterMode::MatchAll => {
                    if found_all {
                        cursor.entity = target;
                        return true;
                    }
                    if any_exhausted {
                        cursor.exhaust();
                        return false;
                    }
                    // Every column is live and at or past the target; nothing
                    // below the highest of them can own all components.
                    cursor.entity = highest.predecessor();
                }
                IterMode::MatchAny => match lowest {
                    Some(entity) => {
                        cursor.entity = entity;
                        return true;
                    }
                    None => {
                        cursor.exhaust();
                        return false;
                    }
                },
            }
        }
    }
}

/// A short-lived sweep over the entities owning the components in `Q`.
///
/// Holds the manager mutably, so no component can be added or removed
/// while it lives. Drive it with `next()`:
///
/// ```ignore
/// let mut it = manager.begin::<(TransformComponent, PhysicsComponent)>();
/// while it.next() {
///     let (transform, physics) = it.components_mut();
///     // ...
/// }
/// ```
pub struct EntityIterator<'m, Q: ComponentSet> {
    manager: &'m mut ComponentManager,
    cursor: EntityCursor,
    _set: PhantomData<fn() -> Q>,
}

impl<'m, Q: ComponentSet> EntityIterator<'m, Q> {
    pub(crate) fn new(manager: &'m mut ComponentManager, cursor: EntityCursor) -> Self {
        Self {
            manager,
            cursor,
            _set: PhantomData,
        }
    }

    /// Advance to the next matching entity. False once exhausted.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.manager.next(&mut self.cursor)
    }

    /// Current entity; `Entity::INVALID` before the first `next()` of a
    /// sweep and after exhaustion.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.cursor.entity()
    }

    /// True iff every requested type still has a live position in its pool.
    #[inline]
    pub fn valid(&self) -> bool {
        self.cursor.valid()
    }

    /// True iff the current entity owns every requested component.
    pub fn is_match(&self) -> bool {
        let entity = self.cursor.entity();
        entity.is_valid()
            && self.cursor.columns.iter().all(|c| {
                c.index
                    .zip(self.manager.erased_pool(c.id))
                    .and_then(|(i, pool)| pool.entity_at(i))
                    == Some(entity)
            })
    }

    #[inline]
    pub fn mode(&self) -> IterMode {
        self.cursor.mode()
    }

    pub fn cursor(&self) -> &EntityCursor {
        &self.cursor
    }

    /// Read-only access to the rest of the world during the sweep.
    pub fn manager(&self) -> &ComponentManager {
        &*self.manager
    }

    fn index_for<T: Component>(&self, pool: &ComponentPool<T>) -> Option<usize> {
        let index = self.cursor.index_of(T::ID)?;
        let owner = pool.get_at(index)?.entity();
        (owner == self.cursor.entity()).then_some(index)
    }

    /// The current entity's `T`, or `None` if it lacks one (or `T` is not
    /// part of this sweep). The owner is re-checked on every call.
    pub fn get<T: Component>(&self) -> Option<&T> {
        let pool = self.manager.pool::<T>()?;
        let index = self.index_for(pool)?;
        pool.get_at(index)
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        let index = {
            let pool = self.manager.pool::<T>()?;
            self.index_for(pool)?
        };
        self.manager.pool_mut::<T>()?.get_at_mut(index)
    }

    /// Every requested component of the current entity, mutably, at once.
    pub fn components_mut(&mut self) -> Q::Refs<'_> {
        Q::fetch(self.manager, &self.cursor)
    }

    /// A long-lived handle to the current entity's `T`.
    pub fn ptr<T: Component>(&self) -> Option<ComponentPtr<T>> {
        self.get::<T>()?;
        ComponentPtr::new(&*self.manager, self.cursor.entity())
    }
}

impl<Q: ComponentSet> std::fmt::Debug for EntityIterator<'_, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityIterator")
            .field("components", &Q::names())
            .field("cursor", &self.cursor)
            .finish()
    }
}
