// set.rs - Variadic component lists
//
// `ComponentSet` stands in for the `T1..Tn` parameter lists of the manager
// API. It is implemented for tuples of one to eight component types.

use crate::ecs::{Component, ComponentId, ComponentManager, ComponentPool, EcsError, EntityCursor, Entity};

mod sealed {
    pub trait Sealed {}
}

/// A tuple of distinct component types, e.g. `(TransformComponent,)` or
/// `(TransformComponent, CameraComponent)`.
pub trait ComponentSet: sealed::Sealed + 'static {
    /// One `Option<&mut T>` per member, `None` where the current entity
    /// lacks that component.
    type Refs<'a>;

    /// Member ids in declaration order.
    fn ids() -> Vec<ComponentId>;

    /// Member names in declaration order.
    fn names() -> Vec<&'static str>;

    /// Make sure every member has a pool, creating missing ones with the
    /// configured default reserve.
    #[doc(hidden)]
    fn prepare(manager: &mut ComponentManager) -> Result<(), EcsError>;

    /// Attach a default instance of every member to `entity`, in
    /// declaration order. Every member must have a pool.
    #[doc(hidden)]
    fn attach(manager: &mut ComponentManager, entity: Entity);

    /// Detach every member from `entity`. Returns how many were present.
    #[doc(hidden)]
    fn detach(manager: &mut ComponentManager, entity: Entity) -> usize;

    /// Borrow every member of the cursor's current entity at once.
    #[doc(hidden)]
    fn fetch<'a>(manager: &'a mut ComponentManager, cursor: &EntityCursor) -> Self::Refs<'a>;
}

/// A component type may appear only once per set. Two `&mut` into the same
/// pool would alias.
pub(crate) fn check_distinct(ids: &[ComponentId]) -> Result<(), EcsError> {
    for (i, id) in ids.iter().enumerate() {
        if ids[i + 1..].contains(id) {
            return Err(EcsError::DuplicateMember {
                name: crate::ecs::component::name_of(*id),
            });
        }
    }
    Ok(())
}

/// # Panics
/// If a component type appears twice in `ids`.
pub(crate) fn assert_distinct(ids: &[ComponentId]) {
    if let Err(err) = check_distinct(ids) {
        panic!("{err}");
    }
}

/// # Safety
/// `pool` must be `None` or point to a live pool that nothing else borrows
/// for `'a`.
#[inline]
unsafe fn fetch_one<'a, T: Component>(
    pool: Option<*mut ComponentPool<T>>,
    cursor: &EntityCursor,
    column: usize,
) -> Option<&'a mut T> {
    let pool = unsafe { &mut *pool? };
    let index = cursor.column_index(column)?;
    let entity = cursor.entity();
    pool.get_at_mut(index).filter(|c| c.entity() == entity)
}

macro_rules! impl_component_set {
    ($($T:ident $idx:tt),+) => {
        impl<$($T: Component),+> sealed::Sealed for ($($T,)+) {}

        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            type Refs<'a> = ($(Option<&'a mut $T>,)+);

            fn ids() -> Vec<ComponentId> {
                vec![$($T::ID),+]
            }

            fn names() -> Vec<&'static str> {
                vec![$($T::NAME),+]
            }

            fn prepare(manager: &mut ComponentManager) -> Result<(), EcsError> {
                $( manager.try_get_pool::<$T>()?; )+
                Ok(())
            }

            fn attach(manager: &mut ComponentManager, entity: Entity) {
                $( manager.attach::<$T>(entity); )+
            }

            fn detach(manager: &mut ComponentManager, entity: Entity) -> usize {
                let mut removed = 0;
                $( if manager.detach::<$T>(entity) { removed += 1; } )+
                removed
            }

            fn fetch<'a>(manager: &'a mut ComponentManager, cursor: &EntityCursor) -> Self::Refs<'a> {
                assert_distinct(&Self::ids());
                let pools = ($(manager.pool_ptr::<$T>(),)+);
                // SAFETY: ids are distinct, so every pointer targets a different
                // boxed pool, and `manager` stays mutably borrowed for 'a.
                unsafe { ($(fetch_one::<$T>(pools.$idx, cursor, $idx),)+) }
            }
        }
    };
}

impl_component_set!(A 0);
impl_component_set!(A 0, B 1);
impl_component_set!(A 0, B 1, C 2);
impl_component_set!(A 0, B 1, C 2, D 3);
impl_component_set!(A 0, B 1, C 2, D 3, E 4);
impl_component_set!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_component_set!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_component_set!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "listed twice")]
    fn duplicate_ids_panic() {
        assert_distinct(&[1, 2, 1]);
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let err = check_distinct(&[4, 5, 5]).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateMember { .. }));
    }

    #[test]
    fn distinct_ids_pass() {
        assert_distinct(&[1, 2, 3]);
        assert_distinct(&[]);
        assert_eq!(check_distinct(&[7]), Ok(()));
    }
}
