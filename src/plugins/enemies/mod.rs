//! Enemies plugin: training targets plus the per-enemy state stakes act on.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! FACTS live in components:
//!    - `Health` and `EnemyController` are what stakes damage, stack and stun.
//!    - `Extent` is the measured body size a stake uses to space enemies on its shaft.
//!    - `Bound` is a timed slow left behind by a binding stake.
//!
//! RULES mutate facts in predictable places:
//!    - the stake collision / retrieval systems write damage, stacks, stuns and debuffs.
//!    - this module ticks timers down, bleeds speed off bound enemies and removes the dead.
//!
//! An enemy still attached to a stake (`Impaled`) or dragged by one (`Tethered`) is never
//! despawned here. Its stake owns its body until it lets go; the enemy dies on the first fixed
//! step after release.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::{health::Health, layers::Layer, state::GameState};
use crate::plugins::projectiles::components::Impaled;
use crate::plugins::projectiles::retrieval::Tethered;

mod components;

pub use components::*;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_targets);

    app.add_systems(
        FixedUpdate,
        (tick_stuns, tick_bindings, slow_bound_enemies).run_if(in_state(GameState::InGame)),
    );

    // Structural cleanup after every fixed-step writer has run.
    app.add_systems(
        PostUpdate,
        despawn_dead_enemies.run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

/// Spawn a row of stationary training targets.
fn spawn_targets(mut commands: Commands) {
    let enemy_layers = CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Wielder, Layer::Stake],
    );

    let side = 32.0;
    for (i, x) in [-120.0, -60.0, 0.0, 60.0, 120.0].into_iter().enumerate() {
        commands.spawn((
            Name::new(format!("EnemyTarget{i}")),
            Enemy,
            Health::new(6.0),
            EnemyController::new(3),
            Extent::square(side),
            Sprite {
                color: Color::srgb(0.9, 0.25, 0.25),
                custom_size: Some(Vec2::splat(side)),
                ..default()
            },
            Transform::from_xyz(x, 160.0, 1.0),
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::rectangle(side, side),
            enemy_layers,
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

// -----------------------------------------------------------------------------
// Timers
// -----------------------------------------------------------------------------

fn tick_stuns(time: Res<Time<Fixed>>, mut q: Query<&mut EnemyController>) {
    for mut ctrl in &mut q {
        let Some(stun) = ctrl.stun.as_mut() else {
            continue;
        };
        stun.tick(time.delta());
        if stun.is_finished() {
            ctrl.stun = None;
        }
    }
}

fn tick_bindings(time: Res<Time<Fixed>>, mut commands: Commands, mut q: Query<(Entity, &mut Bound)>) {
    for (e, mut bound) in &mut q {
        bound.timer.tick(time.delta());
        if bound.timer.is_finished() {
            commands.entity(e).remove::<Bound>();
        }
    }
}

fn slow_bound_enemies(
    time: Res<Time<Fixed>>,
    mut q: Query<(&Bound, &mut LinearVelocity), With<Enemy>>,
) {
    let dt = time.delta_secs();
    for (bound, mut vel) in &mut q {
        vel.0 *= bound.step_scale(dt);
    }
}

// -----------------------------------------------------------------------------
// Cleanup
// -----------------------------------------------------------------------------

fn despawn_dead_enemies(
    mut commands: Commands,
    q: Query<(Entity, &Health), (With<Enemy>, Without<Impaled>, Without<Tethered>)>,
) {
    for (e, hp) in &q {
        if hp.is_dead() {
            commands.entity(e).despawn();
        }
    }
}

#[cfg(test)]
mod tests;
