// pool.rs - Packed per-type component storage
//
// One pool holds every component of a single type in a contiguous Vec,
// ordered by owning entity id. A version counter is bumped on every
// structural change that can move an element, so cached indices know
// when to re-resolve.

use crate::ecs::{Component, ComponentId, Entity};
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeSet;

/// Read-only snapshot of one pool, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub id: ComponentId,
    pub name: &'static str,
    pub len: usize,
    pub capacity: usize,
    pub version: u64,
    pub pending: usize,
}

/// Outcome of attaching a component to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Index of the entity's component in the pool.
    pub index: usize,
    /// False if the entity already had this component (left untouched).
    pub created: bool,
    /// True if the insert grew the buffer or shifted existing elements
    /// (version bumped).
    pub relocated: bool,
}

/// Storage for all components of type `T`.
///
/// Invariants:
/// - entity ids strictly increase along `components` (one component per
///   entity, no duplicates)
/// - `version` increases whenever an element may have changed address:
///   reallocation on growth, a mid-pool insert, or any removal
/// - storage order follows insertion order only while entities are
///   attached in increasing id order; attaching to an older entity inserts
///   it mid-pool (shifting the tail, version bumped) so sweeps stay sorted
pub struct ComponentPool<T: Component> {
    components: Vec<T>,
    version: u64,
    pending_dead: BTreeSet<Entity>,
}

impl<T: Component> ComponentPool<T> {
    /// Create a pool with room for `reserve` components before the first
    /// reallocation.
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            components: Vec::with_capacity(reserve),
            version: 0,
            pending_dead: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.components.capacity()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.components
    }

    /// Mutable access to the packed components. Owning entities must not be
    /// rewritten through this slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Index of `entity`'s component, if present.
    pub fn position(&self, entity: Entity) -> Option<usize> {
        if !entity.is_valid() {
            return None;
        }
        self.components
            .binary_search_by_key(&entity, |c| c.entity())
            .ok()
    }

    /// Component owned by `entity`, if any.
    pub fn find_component(&self, entity: Entity) -> Option<&T> {
        self.position(entity).map(|i| &self.components[i])
    }

    pub fn find_component_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.position(entity).map(move |i| &mut self.components[i])
    }

    #[inline]
    pub fn get_at(&self, index: usize) -> Option<&T> {
        self.components.get(index)
    }

    #[inline]
    pub fn get_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.components.get_mut(index)
    }

    /// Attach a default-constructed component to `entity`.
    ///
    /// Entities arriving in increasing id order are appended. An entity older
    /// than the current tail is inserted at its sorted position, which shifts
    /// the tail and bumps the version.
    pub fn insert(&mut self, entity: Entity) -> Insertion {
        debug_assert!(entity.is_valid(), "cannot attach a component to the invalid entity");

        let index = match self.components.last() {
            Some(last) if last.entity() >= entity => {
                match self.components.binary_search_by_key(&entity, |c| c.entity()) {
                    Ok(index) => {
                        return Insertion {
                            index,
                            created: false,
                            relocated: false,
                        }
                    }
                    Err(index) => index,
                }
            }
            _ => self.components.len(),
        };

        let mut component = T::default();
        component.set_entity(entity);

        let base = self.components.as_ptr();
        let capacity = self.components.capacity();
        let appended = index == self.components.len();
        if appended {
            self.components.push(component);
        } else {
            self.components.insert(index, component);
        }

        let relocated = !appended
            || capacity != self.components.capacity()
            || base != self.components.as_ptr();
        if relocated {
            self.version += 1;
            tracing::trace!(
                component = T::NAME,
                version = self.version,
                capacity = self.components.capacity(),
                "component pool relocated"
            );
        }

        Insertion {
            index,
            created: true,
            relocated,
        }
    }

    /// Remove `entity`'s component immediately, preserving the order (and
    /// contents) of every other component.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let index = self.position(entity)?;
        let removed = self.components.remove(index);
        self.version += 1;
        Some(removed)
    }

    /// Queue `entity`'s component for the next `cleanup` pass.
    pub fn mark_dead(&mut self, entity: Entity) -> bool {
        entity.is_valid() && self.pending_dead.insert(entity)
    }

    pub fn pending(&self) -> impl Iterator<Item = Entity> + '_ {
        self.pending_dead.iter().copied()
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending_dead.len()
    }

    /// Drop every component whose entity is queued, calling `deleter` on each
    /// before it goes. One compaction pass regardless of how many are
    /// queued. Returns the number removed.
    pub fn cleanup<F>(&mut self, mut deleter: F) -> usize
    where
        F: FnMut(&mut T),
    {
        if self.pending_dead.is_empty() {
            return 0;
        }

        let before = self.components.len();
        let pending = &self.pending_dead;
        self.components.retain_mut(|c| {
            if pending.contains(&c.entity()) {
                deleter(c);
                false
            } else {
                true
            }
        });
        self.pending_dead.clear();

        let removed = before - self.components.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            id: T::ID,
            name: T::NAME,
            len: self.components.len(),
            capacity: self.components.capacity(),
            version: self.version,
            pending: self.pending_dead.len(),
        }
    }
}

/// Type-erased view of a pool: the per-column operations the manager and
/// the iterator run without knowing the component type.
pub trait ErasedPool: Any {
    fn component_id(&self) -> ComponentId;

    fn name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn version(&self) -> u64;

    /// Owning entity of the component at `index`.
    fn entity_at(&self, index: usize) -> Option<Entity>;

    /// First index at or after `from` whose entity is `>= target`, scanning
    /// forward. `None` once the scan runs off the end.
    fn seek(&self, from: usize, target: Entity) -> Option<usize>;

    /// Index of `entity`'s component, if present.
    fn position(&self, entity: Entity) -> Option<usize>;

    fn contains(&self, entity: Entity) -> bool {
        self.position(entity).is_some()
    }

    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn mark_dead(&mut self, entity: Entity) -> bool;

    fn stats(&self) -> PoolStats;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn component_id(&self) -> ComponentId {
        T::ID
    }

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    fn entity_at(&self, index: usize) -> Option<Entity> {
        self.components.get(index).map(|c| c.entity())
    }

    fn seek(&self, from: usize, target: Entity) -> Option<usize> {
        let mut index = from;
        while index < self.components.len() {
            if self.components[index].entity() >= target {
                return Some(index);
            }
            index += 1;
        }
        None
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        ComponentPool::position(self, entity)
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn mark_dead(&mut self, entity: Entity) -> bool {
        ComponentPool::mark_dead(self, entity)
    }

    fn stats(&self) -> PoolStats {
        ComponentPool::stats(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
