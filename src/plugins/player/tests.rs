use bevy::prelude::*;

use crate::common::health::Health;
use crate::common::test_utils::run_system_once;

use super::Wielder;

#[test]
fn spawn_creates_armed_wielder() {
    let mut world = World::new();
    run_system_once(&mut world, super::spawn);

    let w = world.query::<&Wielder>().single(&world).unwrap();
    assert_eq!(w.ammo, w.max_ammo);
}

#[test]
fn spending_stops_at_empty_and_recovery_caps_at_max() {
    let mut w = Wielder::new(2);
    assert!(w.try_spend());
    assert!(w.try_spend());
    assert!(!w.try_spend());

    w.recover_ammo(5);
    assert_eq!(w.ammo, 2);
}

#[test]
fn execution_success_heals_and_pays_ammo() {
    let mut w = Wielder::new(3);
    w.ammo = 0;
    let mut hp = Health::new(10.0);
    hp.take_damage(4.0);

    w.on_execution_success(Some(&mut hp), 3.0, 2);

    assert_eq!(hp.hp, 9.0);
    assert_eq!(w.ammo, 2);
}
