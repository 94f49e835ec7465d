//! Read-only view of stakes for outside gameplay code.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::{Projectile, ProjectileState};
use super::impale::ImpaleStack;

#[derive(SystemParam)]
pub struct ProjectileStatus<'w, 's> {
    stakes: Query<'w, 's, (&'static ProjectileState, &'static ImpaleStack, &'static Projectile)>,
}

impl ProjectileStatus<'_, '_> {
    pub fn state(&self, stake: Entity) -> Option<ProjectileState> {
        self.stakes.get(stake).ok().map(|(s, ..)| *s)
    }

    pub fn impaled_count(&self, stake: Entity) -> usize {
        self.stakes.get(stake).map_or(0, |(_, stack, _)| stack.len())
    }

    /// Enemy the stake is stuck in.
    pub fn host(&self, stake: Entity) -> Option<Entity> {
        self.stakes.get(stake).ok().and_then(|(.., p)| p.host)
    }
}
