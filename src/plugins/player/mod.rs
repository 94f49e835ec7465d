//! Wielder plugin: the entity that throws stakes and gets them back.
//!
//! Input is not handled here. Anything that wants a throw writes a `ThrowRequest`; anything
//! that wants stakes back writes a `RecallRequest`.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{health::Health, layers::Layer, state::GameState};

/// Stake ammunition carried by a wielder.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Wielder {
    pub ammo: u32,
    pub max_ammo: u32,
}

impl Wielder {
    pub fn new(max_ammo: u32) -> Self {
        Self { ammo: max_ammo, max_ammo }
    }

    /// Take one stake out of the quiver. `false` when empty.
    pub fn try_spend(&mut self) -> bool {
        if self.ammo == 0 {
            return false;
        }
        self.ammo -= 1;
        true
    }

    pub fn recover_ammo(&mut self, count: u32) {
        self.ammo = (self.ammo + count).min(self.max_ammo);
    }

    pub fn on_execution_success(&mut self, health: Option<&mut Health>, heal: f32, ammo_reward: u32) {
        if let Some(hp) = health {
            hp.heal(heal);
        }
        self.recover_ammo(ammo_reward);
    }
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn);
}

fn spawn(mut commands: Commands) {
    let layers = CollisionLayers::new(Layer::Wielder, [Layer::World, Layer::Enemy]);

    commands.spawn((
        Name::new("Wielder"),
        Wielder::new(3),
        Health::new(10.0),
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -200.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));
}

#[cfg(test)]
mod tests;
