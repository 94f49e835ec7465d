use bevy::prelude::*;

use super::*;
use crate::common::test_utils::{fixed_time_with_delta, run_system_once};
use crate::plugins::projectiles::components::Impaled;

#[test]
fn spawn_targets_creates_measured_enemies() {
    let mut world = World::new();
    run_system_once(&mut world, spawn_targets);

    let mut q = world.query::<(&Enemy, &Health, &Extent, &EnemyController)>();
    assert_eq!(q.iter(&world).count(), 5);
    for (_, hp, extent, ctrl) in q.iter(&world) {
        assert_eq!(hp.hp, hp.max);
        assert_eq!(extent.half, Vec2::splat(16.0));
        assert_eq!(ctrl.hit_stacks, 0);
    }
}

#[test]
fn groggy_needs_enough_stacks_and_ends_with_execution() {
    let source = World::new().spawn_empty().id();
    let mut ctrl = EnemyController::new(2);

    ctrl.register_hit(1, source);
    assert!(!ctrl.is_groggy());
    ctrl.register_hit(1, source);
    assert!(ctrl.is_groggy());
    assert_eq!(ctrl.last_hit_by, Some(source));

    assert_eq!(ctrl.consume_stacks(5), 2);
    ctrl.mark_executed();
    ctrl.register_hit(3, source);
    assert!(!ctrl.is_groggy());
}

#[test]
fn longer_stun_wins() {
    let mut ctrl = EnemyController::new(3);
    ctrl.apply_stun(2.0);
    ctrl.apply_stun(0.5);
    let remaining = ctrl.stun.as_ref().unwrap().remaining_secs();
    assert!((remaining - 2.0).abs() < 1e-5);
}

#[test]
fn stun_and_binding_wear_off() {
    let mut world = World::new();
    world.insert_resource(fixed_time_with_delta(1.0));

    let mut ctrl = EnemyController::new(3);
    ctrl.apply_stun(0.5);
    let e = world.spawn((ctrl, Bound::new(0.5, 0.6))).id();

    run_system_once(&mut world, tick_stuns);
    run_system_once(&mut world, tick_bindings);

    assert!(world.get::<EnemyController>(e).unwrap().stun.is_none());
    assert!(world.get::<Bound>(e).is_none());
}

#[test]
fn bound_enemies_lose_speed_over_time() {
    let mut world = World::new();
    world.insert_resource(fixed_time_with_delta(1.0));

    let bound = world
        .spawn((Enemy, Bound::new(2.0, 0.6), LinearVelocity(Vec2::new(10.0, 0.0))))
        .id();
    let free = world.spawn((Enemy, LinearVelocity(Vec2::new(10.0, 0.0)))).id();

    run_system_once(&mut world, slow_bound_enemies);

    assert!((world.get::<LinearVelocity>(bound).unwrap().0.x - 4.0).abs() < 1e-4);
    assert_eq!(world.get::<LinearVelocity>(free).unwrap().0.x, 10.0);
}

#[test]
fn dead_enemies_on_a_stake_are_kept_until_released() {
    let mut world = World::new();
    let stake = world.spawn_empty().id();

    let mut dead = Health::new(1.0);
    dead.take_damage(5.0);

    let free = world.spawn((Enemy, dead.clone())).id();
    let held = world.spawn((Enemy, dead, Impaled { by: stake })).id();

    run_system_once(&mut world, despawn_dead_enemies);

    assert!(world.get_entity(free).is_err());
    assert!(world.get_entity(held).is_ok());
}
