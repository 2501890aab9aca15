use crate::define_component;
use crate::ecs::Entity;
use bytemuck::{Pod, Zeroable};

/// Pickable bounding sphere around the entity's transform.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SelectableComponent {
    pub entity: Entity,
    pub radius: f32,
    /// Non-zero when selected (`u32` keeps the record POD).
    pub selected: u32,
}

define_component!(SelectableComponent, 5, "Selectable");

impl Default for SelectableComponent {
    fn default() -> Self {
        Self {
            entity: Entity::INVALID,
            radius: 0.5,
            selected: 0,
        }
    }
}

impl SelectableComponent {
    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected != 0
    }

    #[inline]
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected as u32;
    }
}
