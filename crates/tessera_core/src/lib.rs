//! Tessera Engine Core
//!
//! Contains the fundamental simulation building blocks:
//! - Entity Component System (ECS) over packed per-type component pools
//! - Stock components and the systems that consume them
//! - Deterministic fixed-tick time
//! - ECS settings

pub mod components;
pub mod ecs;
pub mod settings;
pub mod systems;
pub mod time;

pub use bytemuck;
pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
