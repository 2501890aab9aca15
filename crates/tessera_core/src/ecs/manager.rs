// manager.rs - Owner of every component pool
//
// The manager maps component ids to pools, hands out entity ids, and is
// the entry point for attaching, detaching, finding and sweeping
// components. Precondition violations (unregistered or duplicate types)
// panic; the `try_*` variants return them as `EcsError`.

use crate::ecs::component::{entity_is_leading_field, name_of};
use crate::ecs::iter::Column;
use crate::ecs::set::{assert_distinct, check_distinct};
use crate::ecs::{
    Component, ComponentId, ComponentPool, ComponentPtr, ComponentSet, EcsError, Entity,
    EntityCursor, EntityIterator, ErasedPool, IterMode, PoolStats,
};
use crate::ecs::entity::EntityAllocator;
use crate::settings::EcsSettings;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tessera_metrics::Counter;

/// Entity and component storage for one simulation.
///
/// Single-threaded: all mutation and iteration happen on the thread that
/// owns the manager. Pools live as long as the manager; component types
/// are never unregistered.
pub struct ComponentManager {
    pools: HashMap<ComponentId, Box<dyn ErasedPool>>,
    entities: EntityAllocator,
    removed: HashSet<Entity>,
    settings: EcsSettings,
    counters: RefCell<Counter>,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::with_settings(EcsSettings::default())
    }

    pub fn with_settings(settings: EcsSettings) -> Self {
        Self {
            pools: HashMap::new(),
            entities: EntityAllocator::new(),
            removed: HashSet::new(),
            settings,
            counters: RefCell::new(Counter::new()),
        }
    }

    pub fn settings(&self) -> &EcsSettings {
        &self.settings
    }

    // ------------------------------------------------------------------
    // Component types
    // ------------------------------------------------------------------

    /// Register a pool for `T` with room for `reserve` components (or the
    /// configured override, if larger).
    pub fn try_add_component_type<T: Component>(&mut self, reserve: usize) -> Result<(), EcsError> {
        if self.pools.contains_key(&T::ID) {
            return Err(EcsError::DuplicateComponentType {
                id: T::ID,
                name: T::NAME,
            });
        }
        self.create_pool::<T>(reserve)
    }

    /// Register a pool for `T`.
    ///
    /// # Panics
    /// If `T` is already registered with this manager, or its id is taken
    /// by another type.
    pub fn add_component_type<T: Component>(&mut self, reserve: usize) {
        if let Err(err) = self.try_add_component_type::<T>(reserve) {
            panic!("{err}");
        }
    }

    fn create_pool<T: Component>(&mut self, reserve: usize) -> Result<(), EcsError> {
        T::ensure_registered()?;
        if !entity_is_leading_field::<T>() {
            return Err(EcsError::EntityNotLeading { name: T::NAME });
        }

        let reserve = self.settings.reserve_for(T::NAME, reserve);
        self.pools
            .insert(T::ID, Box::new(ComponentPool::<T>::with_capacity(reserve)));
        tracing::debug!(component = T::NAME, id = T::ID, reserve, "registered component pool");
        Ok(())
    }

    /// True iff every member of `Q` has a pool.
    pub fn has_component_type<Q: ComponentSet>(&self) -> bool {
        Q::ids().iter().all(|id| self.pools.contains_key(id))
    }

    fn check_registered(&self, ids: &[ComponentId]) -> Result<(), EcsError> {
        match ids.iter().find(|id| !self.pools.contains_key(id)) {
            Some(&id) => Err(EcsError::UnregisteredComponent {
                id,
                name: name_of(id),
            }),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    /// The pool for `T`, created with the configured default reserve if it
    /// does not exist yet.
    ///
    /// # Panics
    /// If `T` cannot be registered (id collision, entity not leading).
    pub fn get_pool<T: Component>(&mut self) -> &mut ComponentPool<T> {
        self.try_get_pool::<T>().unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible `get_pool`: reports why a missing pool could not be created.
    pub fn try_get_pool<T: Component>(&mut self) -> Result<&mut ComponentPool<T>, EcsError> {
        if !self.pools.contains_key(&T::ID) {
            self.create_pool::<T>(self.settings.default_reserve)?;
        }
        self.pool_mut::<T>().ok_or_else(|| EcsError::ComponentIdCollision {
            id: T::ID,
            existing: name_of(T::ID),
            requested: T::NAME,
        })
    }

    /// The pool for `T`, if registered.
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&T::ID)?
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(&T::ID)?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    pub(crate) fn pool_ptr<T: Component>(&mut self) -> Option<*mut ComponentPool<T>> {
        self.pool_mut::<T>().map(|pool| pool as *mut ComponentPool<T>)
    }

    #[inline]
    pub(crate) fn erased_pool(&self, id: ComponentId) -> Option<&dyn ErasedPool> {
        self.pools.get(&id).map(|pool| pool.as_ref())
    }

    // ------------------------------------------------------------------
    // Entities and components
    // ------------------------------------------------------------------

    /// Create an entity owning a default instance of every member of `Q`,
    /// returning an iterator positioned on it.
    ///
    /// # Panics
    /// If a member of `Q` is listed twice or cannot get a pool.
    pub fn add_entity<Q: ComponentSet>(&mut self) -> EntityIterator<'_, Q> {
        let entity = self.add_components::<Q>(Entity::INVALID);
        tracing::trace!(entity = %entity, components = ?Q::names(), "spawned entity");
        self.find_entity::<Q>(entity)
    }

    /// Attach the members of `Q` to `entity`, or to a fresh entity when
    /// given `Entity::INVALID`. Components the entity already owns are left
    /// untouched. Returns the entity the components were attached to.
    ///
    /// Nothing is allocated or attached unless every member can get a pool.
    pub fn try_add_components<Q: ComponentSet>(&mut self, entity: Entity) -> Result<Entity, EcsError> {
        check_distinct(&Q::ids())?;
        if entity.is_valid() {
            if !self.entities.is_allocated(entity) {
                return Err(EcsError::InvalidEntity { entity });
            }
            if self.removed.contains(&entity) {
                return Err(EcsError::RemovedEntity { entity });
            }
        }
        Q::prepare(self)?;

        let entity = if entity.is_valid() {
            entity
        } else {
            self.entities.allocate()
        };
        Q::attach(self, entity);
        Ok(entity)
    }

    /// # Panics
    /// If `entity` was never allocated here or has been removed, or a member
    /// of `Q` is listed twice or cannot get a pool.
    pub fn add_components<Q: ComponentSet>(&mut self, entity: Entity) -> Entity {
        self.try_add_components::<Q>(entity)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    pub(crate) fn attach<T: Component>(&mut self, entity: Entity) {
        let insertion = self.get_pool::<T>().insert(entity);
        if insertion.relocated {
            self.counters.get_mut().increment("pool.relocate", 1);
        }
    }

    pub(crate) fn detach<T: Component>(&mut self, entity: Entity) -> bool {
        let removed = self
            .pool_mut::<T>()
            .is_some_and(|pool| pool.remove(entity).is_some());
        if removed {
            self.counters.get_mut().increment("pool.remove", 1);
        }
        removed
    }

    /// Detach the members of `Q` from `entity` immediately. Returns how many
    /// the entity owned.
    pub fn remove_components<Q: ComponentSet>(&mut self, entity: Entity) -> usize {
        Q::detach(self, entity)
    }

    /// Remove every component of `entity` from every pool. Its id is never
    /// handed out again. Returns the number of components removed.
    pub fn remove_entity(&mut self, entity: Entity) -> usize {
        if !entity.is_valid() {
            return 0;
        }

        let removed = self
            .pools
            .values_mut()
            .filter_map(|pool| pool.remove_entity(entity).then_some(()))
            .count();

        let newly_removed = self.entities.is_allocated(entity) && self.removed.insert(entity);
        let counters = self.counters.get_mut();
        if newly_removed {
            counters.increment("entity.remove", 1);
        }
        counters.increment("pool.remove", removed as u64);
        tracing::debug!(entity = %entity, components = removed, "removed entity");
        removed
    }

    /// Whether `entity` went through `remove_entity`.
    pub fn is_removed(&self, entity: Entity) -> bool {
        self.removed.contains(&entity)
    }

    /// Entities allocated and not removed.
    pub fn entity_count(&self) -> usize {
        self.entities.allocated() as usize - self.removed.len()
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.find_component(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pool_mut::<T>()?.find_component_mut(entity)
    }

    /// A long-lived handle to `entity`'s `T`.
    pub fn ptr<T: Component>(&self, entity: Entity) -> Option<ComponentPtr<T>> {
        ComponentPtr::new(self, entity)
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    fn seed(&self, ids: Vec<ComponentId>, mode: IterMode) -> EntityCursor {
        let columns = ids
            .into_iter()
            .map(|id| Column {
                id,
                index: self
                    .erased_pool(id)
                    .filter(|pool| pool.len() > 0)
                    .map(|_| 0),
            })
            .collect();
        EntityCursor::new(Entity::INVALID, mode, columns)
    }

    /// A fresh cursor over `Q`, for driving with `next` directly.
    pub fn try_cursor<Q: ComponentSet>(&self, mode: IterMode) -> Result<EntityCursor, EcsError> {
        let ids = Q::ids();
        check_distinct(&ids)?;
        self.check_registered(&ids)?;
        Ok(self.seed(ids, mode))
    }

    pub fn try_begin_with<Q: ComponentSet>(
        &mut self,
        mode: IterMode,
    ) -> Result<EntityIterator<'_, Q>, EcsError> {
        let cursor = self.try_cursor::<Q>(mode)?;
        Ok(EntityIterator::new(self, cursor))
    }

    pub fn try_begin<Q: ComponentSet>(&mut self) -> Result<EntityIterator<'_, Q>, EcsError> {
        self.try_begin_with::<Q>(IterMode::MatchAll)
    }

    /// Sweep, in increasing id order, every entity owning all of `Q`.
    ///
    /// # Panics
    /// If any member of `Q` is not registered or is listed twice.
    pub fn begin<Q: ComponentSet>(&mut self) -> EntityIterator<'_, Q> {
        self.try_begin_with::<Q>(IterMode::MatchAll)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Sweep every entity owning at least one member of `Q`.
    ///
    /// # Panics
    /// If any member of `Q` is not registered.
    pub fn begin_any<Q: ComponentSet>(&mut self) -> EntityIterator<'_, Q> {
        self.try_begin_with::<Q>(IterMode::MatchAny)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// An iterator positioned on `entity` if it owns every member of `Q`.
    /// Otherwise the iterator is exhausted: `entity()` returns
    /// `Entity::INVALID` and `valid()` is false.
    pub fn find_entity<Q: ComponentSet>(&mut self, entity: Entity) -> EntityIterator<'_, Q> {
        let ids = Q::ids();
        assert_distinct(&ids);
        let mut cursor = self.seed(ids, IterMode::MatchAll);

        let positions: Option<Vec<usize>> = cursor
            .columns
            .iter()
            .map(|column| self.erased_pool(column.id)?.position(entity))
            .collect();
        match positions {
            Some(positions) => {
                for (column, index) in cursor.columns.iter_mut().zip(positions) {
                    column.index = Some(index);
                }
                cursor.set_entity(entity);
            }
            None => cursor.exhaust(),
        }

        EntityIterator::new(self, cursor)
    }

    /// Run `f` on every entity owning all of `Q`, in increasing id order.
    /// Returns the number of entities visited.
    ///
    /// # Panics
    /// If any member of `Q` is not registered.
    pub fn for_each<Q, F>(&mut self, mut f: F) -> usize
    where
        Q: ComponentSet,
        F: for<'a> FnMut(Entity, Q::Refs<'a>),
    {
        let mut it = self.begin::<Q>();
        let mut visited = 0;
        while it.next() {
            let entity = it.entity();
            f(entity, it.components_mut());
            visited += 1;
        }
        visited
    }

    // ------------------------------------------------------------------
    // Deferred removal
    // ------------------------------------------------------------------

    /// Queue `entity`'s `T` for the next `cleanup_components::<T>` pass.
    /// Returns false if the entity has no `T` or is already queued.
    pub fn queue_removal<T: Component>(&mut self, entity: Entity) -> bool {
        self.pool_mut::<T>()
            .is_some_and(|pool| pool.position(entity).is_some() && pool.mark_dead(entity))
    }

    /// Queue every component `entity` owns. Returns how many pools queued it.
    pub fn queue_entity_removal(&mut self, entity: Entity) -> usize {
        self.pools
            .values_mut()
            .filter(|pool| pool.contains(entity))
            .filter_map(|pool| pool.mark_dead(entity).then_some(()))
            .count()
    }

    /// Drop every queued `T`, calling `deleter` on each first, in one
    /// compaction pass. Returns the number removed.
    pub fn try_cleanup_components<T, F>(&mut self, deleter: F) -> Result<usize, EcsError>
    where
        T: Component,
        F: FnMut(&mut T),
    {
        let pool = self.pool_mut::<T>().ok_or(EcsError::UnregisteredComponent {
            id: T::ID,
            name: T::NAME,
        })?;
        let removed = pool.cleanup(deleter);
        if removed > 0 {
            self.counters.get_mut().increment("pool.cleanup", removed as u64);
            tracing::debug!(component = T::NAME, removed, "cleaned up queued components");
        }
        Ok(removed)
    }

    /// # Panics
    /// If `T` is not registered.
    pub fn cleanup_components<T, F>(&mut self, deleter: F) -> usize
    where
        T: Component,
        F: FnMut(&mut T),
    {
        self.try_cleanup_components::<T, F>(deleter)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Snapshot of every pool, ordered by component id.
    pub fn diagnostics(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self.pools.values().map(|pool| pool.stats()).collect();
        stats.sort_by_key(|s| s.id);
        stats
    }

    /// One `info!` line per pool, if enabled in the settings.
    pub fn log_diagnostics(&self) {
        if !self.settings.log_diagnostics {
            return;
        }
        tracing::info!(
            entities = self.entity_count(),
            pools = self.pools.len(),
            "component manager"
        );
        for s in self.diagnostics() {
            tracing::info!(
                component = s.name,
                id = s.id,
                len = s.len,
                capacity = s.capacity,
                version = s.version,
                pending = s.pending,
                "pool"
            );
        }
    }

    /// Event counters (relocations, removals, pointer re-resolutions).
    /// Empty unless built with the `metrics` feature.
    pub fn counters(&self) -> Counter {
        self.counters.borrow().clone()
    }

    pub(crate) fn record_rescan(&self) {
        self.counters.borrow_mut().increment("ptr.rescan", 1);
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentManager")
            .field("entities", &self.entity_count())
            .field("pools", &self.diagnostics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
    struct Position {
        entity: Entity,
        x: f32,
        y: f32,
    }
    crate::define_component!(Position, 9_200, "Position");

    #[repr(C)]
    #[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
    struct Velocity {
        entity: Entity,
        x: f32,
        y: f32,
    }
    crate::define_component!(Velocity, 9_201, "Velocity");

    #[repr(C)]
    #[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
    struct Tag {
        entity: Entity,
    }
    crate::define_component!(Tag, 9_202, "Tag");

    #[repr(C)]
    #[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
    struct Backwards {
        value: u32,
        entity: Entity,
    }
    crate::define_component!(Backwards, 9_203, "Backwards");

    fn manager() -> ComponentManager {
        let mut m = ComponentManager::new();
        m.add_component_type::<Position>(4);
        m.add_component_type::<Velocity>(4);
        m.add_component_type::<Tag>(4);
        m
    }

    fn sweep<Q: ComponentSet>(m: &mut ComponentManager) -> Vec<u32> {
        let mut seen = Vec::new();
        let mut it = m.begin::<Q>();
        while it.next() {
            seen.push(it.entity().id());
        }
        seen
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut m = manager();
        let err = m.try_add_component_type::<Position>(1).unwrap_err();
        assert_eq!(
            err,
            EcsError::DuplicateComponentType { id: 9_200, name: "Position" }
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut m = manager();
        m.add_component_type::<Position>(1);
    }

    #[test]
    fn entity_must_lead_the_layout() {
        let mut m = ComponentManager::new();
        let err = m.try_add_component_type::<Backwards>(1).unwrap_err();
        assert_eq!(err, EcsError::EntityNotLeading { name: "Backwards" });
    }

    #[test]
    fn failed_add_allocates_nothing() {
        let mut m = ComponentManager::new();
        let err = m
            .try_add_components::<(Backwards,)>(Entity::INVALID)
            .unwrap_err();
        assert_eq!(err, EcsError::EntityNotLeading { name: "Backwards" });
        assert_eq!(m.entity_count(), 0);

        m.add_component_type::<Position>(1);
        let err = m
            .try_add_components::<(Position, Backwards)>(Entity::INVALID)
            .unwrap_err();
        assert_eq!(err, EcsError::EntityNotLeading { name: "Backwards" });
        assert_eq!(m.entity_count(), 0);
        assert!(m.pool::<Position>().unwrap().is_empty());

        let e = m.add_components::<(Position,)>(Entity::INVALID);
        assert_eq!(e, Entity::from_raw(1));
    }

    #[test]
    #[should_panic(expected = "must store its owning entity")]
    fn add_entity_with_bad_layout_panics() {
        let mut m = ComponentManager::new();
        let _ = m.add_entity::<(Backwards,)>();
    }

    #[test]
    fn repeated_members_are_errors_on_fallible_paths() {
        let mut m = manager();
        assert_eq!(
            m.try_add_components::<(Position, Position)>(Entity::INVALID),
            Err(EcsError::DuplicateMember { name: "Position" })
        );
        assert_eq!(m.entity_count(), 0);
        let err = m.try_begin::<(Tag, Velocity, Tag)>().unwrap_err();
        assert_eq!(err, EcsError::DuplicateMember { name: "Tag" });
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn repeated_members_panic_in_begin() {
        let mut m = manager();
        let _ = m.begin::<(Tag, Tag)>();
    }

    #[test]
    fn has_component_type_checks_every_member() {
        let mut m = ComponentManager::new();
        m.add_component_type::<Position>(1);
        assert!(m.has_component_type::<(Position,)>());
        assert!(!m.has_component_type::<(Position, Velocity)>());
    }

    #[test]
    fn add_entity_positions_iterator_on_new_entity() {
        let mut m = manager();
        let mut it = m.add_entity::<(Position, Velocity)>();
        assert_eq!(it.entity(), Entity::from_raw(1));
        assert!(it.valid());
        assert!(it.is_match());
        it.get_mut::<Position>().unwrap().x = 4.0;
        let e = it.entity();
        assert_eq!(m.get::<Position>(e).unwrap().x, 4.0);
        assert_eq!(m.get::<Velocity>(e).unwrap().entity, e);
    }

    #[test]
    fn add_components_to_invalid_allocates() {
        let mut m = manager();
        let e = m.add_components::<(Tag,)>(Entity::INVALID);
        assert!(e.is_valid());
        assert_eq!(m.add_components::<(Position,)>(e), e);
        assert!(m.get::<Position>(e).is_some());
        assert!(m.get::<Tag>(e).is_some());
    }

    #[test]
    fn add_components_rejects_unknown_and_removed_entities() {
        let mut m = manager();
        let unknown = Entity::from_raw(77);
        assert_eq!(
            m.try_add_components::<(Tag,)>(unknown),
            Err(EcsError::InvalidEntity { entity: unknown })
        );

        let e = m.add_components::<(Tag,)>(Entity::INVALID);
        m.remove_entity(e);
        assert_eq!(
            m.try_add_components::<(Tag,)>(e),
            Err(EcsError::RemovedEntity { entity: e })
        );
    }

    #[test]
    fn get_pool_creates_missing_pool() {
        let mut m = ComponentManager::new();
        assert!(m.pool::<Tag>().is_none());
        let capacity = m.get_pool::<Tag>().capacity();
        assert!(capacity >= m.settings().default_reserve);
        assert!(m.has_component_type::<(Tag,)>());
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn begin_on_unregistered_type_panics() {
        let mut m = ComponentManager::new();
        m.add_component_type::<Position>(1);
        let _ = m.begin::<(Position, Velocity)>();
    }

    #[test]
    fn try_begin_reports_unregistered_type() {
        let mut m = ComponentManager::new();
        m.add_component_type::<Position>(1);
        let err = m.try_begin::<(Position, Velocity)>().unwrap_err();
        assert_eq!(err, EcsError::UnregisteredComponent { id: 9_201, name: "Velocity" });
    }

    #[test]
    fn match_all_skips_partial_entities() {
        let mut m = manager();
        let a = m.add_components::<(Position, Velocity)>(Entity::INVALID);
        let _b = m.add_components::<(Position,)>(Entity::INVALID);
        let _c = m.add_components::<(Velocity,)>(Entity::INVALID);
        let d = m.add_components::<(Velocity, Position)>(Entity::INVALID);
        assert_eq!(sweep::<(Position, Velocity)>(&mut m), vec![a.id(), d.id()]);
    }

    #[test]
    fn match_all_over_empty_pool_is_exhausted() {
        let mut m = manager();
        m.add_components::<(Position,)>(Entity::INVALID);
        let mut it = m.begin::<(Position, Tag)>();
        assert!(!it.valid());
        assert!(!it.next());
        assert_eq!(it.entity(), Entity::INVALID);
        assert!(!it.next());
    }

    #[test]
    fn match_any_visits_partial_entities_with_gaps() {
        let mut m = manager();
        let a = m.add_components::<(Position,)>(Entity::INVALID);
        let b = m.add_components::<(Tag,)>(Entity::INVALID);
        let c = m.add_components::<(Position, Velocity)>(Entity::INVALID);
        let d = m.add_components::<(Velocity,)>(Entity::INVALID);

        let mut seen = Vec::new();
        let mut it = m.begin_any::<(Position, Velocity)>();
        while it.next() {
            seen.push((
                it.entity(),
                it.get::<Position>().is_some(),
                it.get::<Velocity>().is_some(),
            ));
        }
        assert_eq!(seen, vec![(a, true, false), (c, true, true), (d, false, true)]);
        assert!(!seen.iter().any(|(e, _, _)| *e == b));
    }

    #[test]
    fn components_mut_borrows_all_members() {
        let mut m = manager();
        let e = {
            let mut it = m.add_entity::<(Position, Velocity)>();
            let (_, vel) = it.components_mut();
            let vel = vel.unwrap();
            vel.x = 1.5;
            vel.y = -2.0;
            it.entity()
        };

        let visited = m.for_each::<(Position, Velocity), _>(
            |_: Entity, (pos, vel): (Option<&mut Position>, Option<&mut Velocity>)| {
            let (pos, vel) = (pos.unwrap(), vel.unwrap());
            pos.x += vel.x;
            pos.y += vel.y;
        },
        );
        assert_eq!(visited, 1);
        let pos = m.get::<Position>(e).unwrap();
        assert_eq!((pos.x, pos.y), (1.5, -2.0));
    }

    #[test]
    fn get_on_type_outside_the_sweep_is_none() {
        let mut m = manager();
        m.add_components::<(Position, Tag)>(Entity::INVALID);
        let mut it = m.begin::<(Position,)>();
        assert!(it.next());
        assert!(it.get::<Position>().is_some());
        assert!(it.get::<Tag>().is_none());
    }

    #[test]
    fn find_entity_hits_and_misses() {
        let mut m = manager();
        let a = m.add_components::<(Position, Velocity)>(Entity::INVALID);
        let b = m.add_components::<(Position,)>(Entity::INVALID);

        let it = m.find_entity::<(Position, Velocity)>(a);
        assert_eq!(it.entity(), a);
        assert!(it.valid());

        let it = m.find_entity::<(Position, Velocity)>(b);
        assert_ne!(it.entity(), b);
        assert!(!it.valid());
        assert!(it.get::<Position>().is_none());
    }

    #[test]
    fn find_entity_continues_the_sweep() {
        let mut m = manager();
        let ids: Vec<Entity> = (0..4)
            .map(|_| m.add_components::<(Tag,)>(Entity::INVALID))
            .collect();
        let mut it = m.find_entity::<(Tag,)>(ids[1]);
        assert!(it.next());
        assert_eq!(it.entity(), ids[2]);
        assert!(it.next());
        assert_eq!(it.entity(), ids[3]);
        assert!(!it.next());
    }

    #[test]
    fn remove_entity_clears_every_pool() {
        let mut m = manager();
        let a = m.add_components::<(Position, Velocity, Tag)>(Entity::INVALID);
        let b = m.add_components::<(Position, Tag)>(Entity::INVALID);
        assert_eq!(m.remove_entity(a), 3);
        assert!(m.is_removed(a));
        assert_eq!(m.entity_count(), 1);
        assert!(m.get::<Position>(a).is_none());
        assert!(m.get::<Tag>(b).is_some());

        let next = m.add_components::<(Tag,)>(Entity::INVALID);
        assert!(next > b);
        assert_ne!(next, a);
    }

    #[test]
    fn remove_components_only_touches_listed_types() {
        let mut m = manager();
        let e = m.add_components::<(Position, Tag)>(Entity::INVALID);
        assert_eq!(m.remove_components::<(Position, Velocity)>(e), 1);
        assert!(m.get::<Position>(e).is_none());
        assert!(m.get::<Tag>(e).is_some());
    }

    #[test]
    fn out_of_order_attach_keeps_sweep_sorted() {
        let mut m = manager();
        let a = m.add_components::<(Tag,)>(Entity::INVALID);
        let b = m.add_components::<(Position, Tag)>(Entity::INVALID);
        m.add_components::<(Position,)>(a);
        assert_eq!(sweep::<(Position, Tag)>(&mut m), vec![a.id(), b.id()]);
    }

    #[test]
    fn cleanup_removes_queued_components_once() {
        let mut m = manager();
        let ids: Vec<Entity> = (0..5)
            .map(|_| m.add_components::<(Tag, Position)>(Entity::INVALID))
            .collect();
        assert!(m.queue_removal::<Tag>(ids[1]));
        assert!(!m.queue_removal::<Tag>(ids[1]));
        assert!(!m.queue_removal::<Velocity>(ids[1]));
        assert_eq!(m.queue_entity_removal(ids[3]), 2);

        let mut deleted = Vec::new();
        let removed = m.cleanup_components::<Tag, _>(|tag| deleted.push(tag.entity));
        assert_eq!(removed, 2);
        assert_eq!(deleted, vec![ids[1], ids[3]]);
        assert_eq!(m.cleanup_components::<Tag, _>(|_| {}), 0);

        // Position keeps its own queue until its own cleanup.
        assert!(m.get::<Position>(ids[3]).is_some());
        assert_eq!(m.pool::<Position>().unwrap().pending_len(), 1);
        assert_eq!(m.cleanup_components::<Position, _>(|_| {}), 1);
        assert!(m.get::<Position>(ids[3]).is_none());
    }

    #[test]
    fn cleanup_on_unregistered_type_is_an_error() {
        let mut m = ComponentManager::new();
        let err = m.try_cleanup_components::<Tag, _>(|_| {}).unwrap_err();
        assert_eq!(err, EcsError::UnregisteredComponent { id: 9_202, name: "Tag" });
    }

    #[test]
    fn diagnostics_are_sorted_and_read_only() {
        let mut m = manager();
        m.add_components::<(Tag,)>(Entity::INVALID);
        let before = m.diagnostics();
        m.log_diagnostics();
        let after = m.diagnostics();
        assert_eq!(before, after);
        let ids: Vec<ComponentId> = after.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9_200, 9_201, 9_202]);
        assert_eq!(after[2].len, 1);
    }

    #[test]
    fn settings_override_reserve() {
        let mut settings = EcsSettings::default();
        settings.reserve.insert("Position".to_string(), 256);
        let mut m = ComponentManager::with_settings(settings);
        m.add_component_type::<Position>(8);
        assert!(m.pool::<Position>().unwrap().capacity() >= 256);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn counters_track_relocations_and_removals() {
        let mut m = ComponentManager::new();
        m.add_component_type::<Tag>(1);
        let a = m.add_components::<(Tag,)>(Entity::INVALID);
        m.add_components::<(Tag,)>(Entity::INVALID);
        m.remove_components::<(Tag,)>(a);
        let counters = m.counters();
        assert!(counters.get("pool.relocate") >= 1);
        assert_eq!(counters.get("pool.remove"), 1);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn entity_removal_is_counted_once() {
        let mut m = manager();
        let e = m.add_components::<(Tag,)>(Entity::INVALID);
        m.remove_entity(e);
        m.remove_entity(e);
        m.remove_entity(Entity::from_raw(500));
        assert_eq!(m.counters().get("entity.remove"), 1);
        assert_eq!(m.entity_count(), 0);
    }
}
