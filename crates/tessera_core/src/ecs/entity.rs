//! Entity identifiers
//!
//! An entity is nothing but a number. It owns no storage of its own and
//! only means something through the components tagged with it. Ids are
//! handed out by a counter that only ever increments, so an id is never
//! reissued during a run, even after the entity has been removed.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Entity handle (opaque id).
///
/// `Entity::INVALID` (0) never denotes a live entity; it doubles as the
/// "allocate a fresh id" argument of `ComponentManager::add_components`
/// and as the cursor value of an exhausted iterator.
#[repr(transparent)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct Entity(u32);

impl Entity {
    pub const INVALID: Entity = Entity(0);

    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// The next id in sequence. Saturates instead of wrapping back to
    /// `INVALID`.
    #[inline]
    pub(crate) const fn successor(&self) -> Entity {
        Entity(self.0.saturating_add(1))
    }

    #[inline]
    pub(crate) const fn predecessor(&self) -> Entity {
        Entity(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Monotonic id source.
#[derive(Debug)]
pub(crate) struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    pub(crate) fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate a fresh id. Running out of ids is fatal: wrapping would
    /// reissue ids that may still be live.
    pub(crate) fn allocate(&mut self) -> Entity {
        let id = self.next;
        self.next = id
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted after {id}"));
        Entity(id)
    }

    /// Number of ids handed out so far.
    pub(crate) fn allocated(&self) -> u32 {
        self.next - 1
    }

    pub(crate) fn is_allocated(&self, entity: Entity) -> bool {
        entity.is_valid() && entity.0 < self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_never_reuses_ids() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a, Entity::from_raw(1));
        assert_eq!(b, Entity::from_raw(2));
        assert!(a < b);
        assert_eq!(alloc.allocated(), 2);
        assert!(alloc.is_allocated(b));
        assert!(!alloc.is_allocated(Entity::from_raw(3)));
        assert!(!alloc.is_allocated(Entity::INVALID));
    }

    #[test]
    fn invalid_is_zero() {
        assert!(!Entity::INVALID.is_valid());
        assert_eq!(Entity::default(), Entity::INVALID);
        assert_eq!(Entity::INVALID.successor(), Entity::from_raw(1));
        assert_eq!(Entity::INVALID.predecessor(), Entity::INVALID);
        assert_eq!(Entity::from_raw(7).to_string(), "e7");
    }
}
