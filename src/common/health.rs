//! Health sink shared by enemies and the wielder.

use bevy::prelude::*;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Health {
    pub hp: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { hp: max, max }
    }

    #[inline]
    pub fn take_damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
    }

    #[inline]
    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount.max(0.0)).min(self.max);
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}
