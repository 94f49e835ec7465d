mod common;

use bevy::prelude::*;
use stake_combat::common::state::GameState;
use stake_combat::plugins::enemies::Enemy;
use stake_combat::plugins::player::Wielder;
use stake_combat::plugins::projectiles::registry::PoolRegistry;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }
}

#[test]
fn entering_the_game_spawns_the_arena_and_prewarms_the_arsenal() {
    let mut app = common::app_headless();

    for _ in 0..5 {
        app.update();
    }

    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::InGame
    );

    let world = app.world_mut();
    assert_eq!(world.query::<&Wielder>().iter(world).count(), 1);
    assert_eq!(world.query::<&Enemy>().iter(world).count(), 5);
    assert_eq!(world.resource::<PoolRegistry>().pool_count(), 3);
}
