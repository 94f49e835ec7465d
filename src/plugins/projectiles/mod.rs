//! Projectiles plugin: pooled stakes with pluggable collision and retrieval behaviours.
//!
//! # Data flow (big picture)
//! ```text
//!   Update schedule (variable dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producer: throw_stakes                                                │
//!│      - reads: ThrowRequest, Wielder + Transform                            │
//!│      - writes: SpawnProjectile                                             │
//!│                                                                            │
//!│  (B) Consumer: allocate_from_pools                                         │
//!│      - reads: SpawnProjectile                                              │
//!│      - mutates: PoolRegistry (lazy pool creation, free lists)              │
//!│      - inserts: Projectile, PooledFrom, Flying state, velocity, layers     │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (C) tick_lifetimes        expired flights drop in place or despawn        │
//!│  (D) start_recalls         RecallRequest -> Returning + ReturnFlight       │
//!│  (E) drive_returns / conclude_returns / pull_tethered                      │
//!│  (F) update_tether_lines / reap_orphan_lines                               │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedPostUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (G) Physics emits CollisionStart messages (Avian)                         │
//!│                                                                            │
//!│  (H) process_stake_collisions / process_tether_wall_hits                   │
//!│      - Stick / Impale / return-path hits, damage + HitEffect               │
//!│                                                                            │
//!│  (I) force_detach, release_impaled, follow_stuck/impaling_stakes           │
//!│      - attachments composed from the stake's transform                     │
//!│                                                                            │
//!│  (J) Commit: commit_despawns                                               │
//!│      - reads: DespawnProjectile                                            │
//!│      - lets go of held enemies, then PoolRegistry::despawn                 │
//!└────────────────────────────────────────────────────────────────────────────┘
//!
//! Feedback loop:
//!   commit pushes the stake back into its pool's free list
//!   allocator pops it again for the next throw
//! ```
//!
//! # Why messages instead of direct pool access?
//! Producers never borrow `ResMut<PoolRegistry>`. They only enqueue intent, and the allocator and
//! the commit are the single writers of the pools.

pub mod collision;
pub mod components;
pub mod impale;
pub mod lifecycle;
pub mod pool;
pub mod query;
pub mod registry;
pub mod retrieval;
pub mod targets;
pub mod template;
pub mod tether;

pub mod allocator;
pub mod commit;
pub mod messages;
pub mod request;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        let default_pool_size = app
            .world()
            .get_resource::<Tunables>()
            .map_or_else(|| Tunables::default().default_pool_size, |t| t.default_pool_size);

        let mut templates = template::ProjectileTemplates::default();
        let arsenal = template::Arsenal::register(&mut templates);

        app.insert_resource(registry::PoolRegistry::new(default_pool_size))
            .insert_resource(templates)
            .insert_resource(arsenal);

        app.add_message::<messages::SpawnProjectile>()
            .add_message::<messages::DespawnProjectile>()
            .add_message::<messages::ThrowRequest>()
            .add_message::<messages::RecallRequest>()
            .add_message::<messages::ForceDetach>()
            .add_message::<messages::ReleaseImpaled>()
            .add_message::<messages::HitEffect>();

        app.add_systems(OnEnter(GameState::InGame), prewarm_arsenal)
            .add_systems(OnExit(GameState::InGame), registry::teardown_pools);

        // Update-phase pipeline: throw -> allocate
        app.add_systems(
            Update,
            (request::throw_stakes, allocator::allocate_from_pools)
                .chain()
                .run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedUpdate,
            (
                lifecycle::tick_lifetimes,
                retrieval::start_recalls,
                retrieval::drive_returns,
                retrieval::conclude_returns,
                retrieval::pull_tethered,
                tether::update_tether_lines,
                tether::reap_orphan_lines,
            )
                .chain()
                .run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedPostUpdate,
            (
                collision::process_stake_collisions,
                retrieval::process_tether_wall_hits,
                lifecycle::force_detach,
                lifecycle::release_impaled,
                lifecycle::follow_stuck_stakes,
                lifecycle::follow_impaling_stakes,
                commit::commit_despawns,
            )
                .chain()
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
    }
}

/// Pre-spawn a pool for every stock template so the first throws don't construct entities.
fn prewarm_arsenal(
    mut commands: Commands,
    mut registry: ResMut<registry::PoolRegistry>,
    templates: Res<template::ProjectileTemplates>,
    arsenal: Res<template::Arsenal>,
) {
    for id in [arsenal.stake, arsenal.skewer, arsenal.binder] {
        if let Err(err) = registry.get_or_create_pool(&mut commands, &templates, id, None) {
            error!("{err}");
        }
    }
}
