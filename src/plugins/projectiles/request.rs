use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::player::Wielder;

use super::messages::{SpawnProjectile, ThrowRequest};

/// Producer: turn a throw into a spawn request at the wielder's muzzle.
///
/// This system does **not** touch the pools. A wielder without ammo throws nothing.
pub fn throw_stakes(
    mut reader: MessageReader<ThrowRequest>,
    mut q_wielders: Query<(&mut Wielder, &Transform)>,
    tunables: Res<Tunables>,
    mut writer: MessageWriter<SpawnProjectile>,
) {
    for req in reader.read() {
        let Ok((mut wielder, tf)) = q_wielders.get_mut(req.wielder) else {
            debug!("throw from {} ignored: not a wielder", req.wielder);
            continue;
        };

        let dir = req.direction.try_normalize().unwrap_or(Vec2::X);
        if !wielder.try_spend() {
            debug!("throw from {} ignored: out of ammo", req.wielder);
            continue;
        }

        writer.write(SpawnProjectile {
            template: Some(req.template),
            pos: tf.translation.truncate() + dir * tunables.muzzle_offset,
            rotation: dir.to_angle(),
            tint: req.tint,
            owner: Some(req.wielder),
        });
    }
}
