//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `stake_combat::game::configure_headless` to install gameplay plugins.

#![allow(dead_code)]

use std::time::Duration;

use avian2d::prelude::*;
use bevy::asset::AssetPlugin;
use bevy::ecs::message::Messages;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use stake_combat::plugins::projectiles::messages::{
    DespawnProjectile, ForceDetach, HitEffect, RecallRequest, ReleaseImpaled, SpawnProjectile,
    ThrowRequest,
};

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    stake_combat::game::configure_headless(&mut app);
    app
}

/// Bare world with every message buffer the stake systems touch.
pub fn world_with_messages() -> World {
    let mut world = World::new();
    world.init_resource::<Messages<CollisionStart>>();
    world.init_resource::<Messages<SpawnProjectile>>();
    world.init_resource::<Messages<DespawnProjectile>>();
    world.init_resource::<Messages<ThrowRequest>>();
    world.init_resource::<Messages<RecallRequest>>();
    world.init_resource::<Messages<ForceDetach>>();
    world.init_resource::<Messages<ReleaseImpaled>>();
    world.init_resource::<Messages<HitEffect>>();
    world
}

pub fn run_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

pub fn set_fixed_delta(world: &mut World, dt: f32) {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    world.insert_resource(t);
}

pub fn clear<M: Message>(world: &mut World) {
    world.resource_mut::<Messages<M>>().clear();
}
