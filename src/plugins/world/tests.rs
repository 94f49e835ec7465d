use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::test_utils::run_system_once;

#[test]
fn spawns_walls_on_enter() {
    let mut world = World::new();
    run_system_once(&mut world, super::spawn_arena);

    let walls = world
        .query::<(&Name, &RigidBody, &CollisionLayers)>()
        .iter(&world)
        .filter(|(n, rb, layers)| {
            n.as_str().starts_with("Wall")
                && matches!(**rb, RigidBody::Static)
                && layers.memberships.has_all(Layer::World)
        })
        .count();
    assert_eq!(walls, 4);
}

#[test]
fn walls_stop_stakes() {
    let layers = super::wall_layers();
    assert!(layers.filters.has_all(Layer::Stake));
    assert!(layers.filters.has_all(Layer::Enemy));
}
