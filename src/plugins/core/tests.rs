use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::core;

#[test]
fn inserts_resources() {
    let mut app = App::new();
    core::plugin(&mut app);

    let tunables = app.world().get_resource::<Tunables>().unwrap();
    assert!(tunables.default_pool_size > 0);
    assert!(app.world().get_resource::<ClearColor>().is_some());
}

#[test]
fn keeps_preinserted_tunables() {
    let mut app = App::new();
    app.insert_resource(Tunables {
        default_pool_size: 2,
        ..default()
    });
    core::plugin(&mut app);
    assert_eq!(app.world().resource::<Tunables>().default_pool_size, 2);
}
