//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; applying them is normally handled by
//! `ApplyDeferred` / schedule boundaries. We call `world.flush()` after running so queued commands
//! are applied before assertions.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::plugins::projectiles::messages::{
    DespawnProjectile, ForceDetach, HitEffect, RecallRequest, ReleaseImpaled, SpawnProjectile,
    ThrowRequest,
};

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Make sure every message buffer the stake systems read or write exists.
pub fn init_messages(world: &mut World) {
    world.init_resource::<Messages<CollisionStart>>();
    world.init_resource::<Messages<SpawnProjectile>>();
    world.init_resource::<Messages<DespawnProjectile>>();
    world.init_resource::<Messages<ThrowRequest>>();
    world.init_resource::<Messages<RecallRequest>>();
    world.init_resource::<Messages<ForceDetach>>();
    world.init_resource::<Messages<ReleaseImpaled>>();
    world.init_resource::<Messages<HitEffect>>();
}

/// Drop every buffered message of type `M`.
///
/// `run_system_once` builds a fresh reader each call, so stale messages would be read again.
pub fn clear_messages<M: Message>(world: &mut World) {
    world.resource_mut::<Messages<M>>().clear();
}

/// A `Time<Fixed>` that reports `dt` seconds as its last delta.
pub fn fixed_time_with_delta(dt: f32) -> Time<Fixed> {
    let mut t = Time::<Fixed>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}
