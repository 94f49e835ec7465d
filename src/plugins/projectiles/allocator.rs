//! Spawn consumer: lease stakes from the pools.
//!
//! The only system that grows or drains a pool's free list on the way out. Requests naming an
//! unknown template are dropped by the registry (with an `error!`), so nothing here branches on
//! configuration.

use bevy::prelude::*;

use super::messages::SpawnProjectile;
use super::registry::PoolRegistry;
use super::template::ProjectileTemplates;

pub fn allocate_from_pools(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    templates: Res<ProjectileTemplates>,
    mut reader: MessageReader<SpawnProjectile>,
) {
    for req in reader.read() {
        if let Some(e) = registry.spawn(&mut commands, &templates, req) {
            debug!("leased stake {e} at {:?}", req.pos);
        }
    }
}
