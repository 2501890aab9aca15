use crate::ecs::{ComponentId, Entity};
use thiserror::Error;

/// Precondition failures of the component manager.
///
/// These indicate programming errors. The panicking entry points
/// (`add_component_type`, `begin`, `cleanup_components`, ...) raise them as
/// panics carrying this message; the `try_*` variants hand them back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EcsError {
    #[error("component '{name}' (id {id}) is not registered with this manager")]
    UnregisteredComponent { id: ComponentId, name: &'static str },

    #[error("component '{name}' (id {id}) is already registered with this manager")]
    DuplicateComponentType { id: ComponentId, name: &'static str },

    #[error("component id {id} is claimed by '{existing}', cannot register '{requested}'")]
    ComponentIdCollision {
        id: ComponentId,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("component '{name}' listed twice in one component set")]
    DuplicateMember { name: &'static str },

    #[error("component '{name}' must store its owning entity as its first field")]
    EntityNotLeading { name: &'static str },

    #[error("entity {entity} was never allocated by this manager")]
    InvalidEntity { entity: Entity },

    #[error("entity {entity} has been removed and cannot take new components")]
    RemovedEntity { entity: Entity },
}
