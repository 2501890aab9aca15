//! Stock systems
//!
//! Each runs one short-lived sweep per call on the simulation thread. None
//! of them adds or removes components while its iterator is alive.

pub mod physics;
pub mod render;
pub mod selection;
