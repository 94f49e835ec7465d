//! Return commit: recycle stakes back into their pools.
//!
//! Everything a stake still holds is let go here before the pool's release writes the
//! inactive invariants:
//! - impaled enemies get their bodies back with their old velocity
//! - a tether line still owned by a return flight is despawned
//!
//! Duplicate requests for the same stake within one step are folded. A request for a stake
//! that is already back in its pool is ignored.

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{Projectile, ProjectileState, ReleaseMode};
use super::impale::ImpaleStack;
use super::messages::DespawnProjectile;
use super::pool::PooledFrom;
use super::registry::PoolRegistry;
use super::retrieval::ReturnFlight;
use super::targets::CombatTargets;
use crate::plugins::enemies::Enemy;

pub fn commit_despawns(
    mut registry: ResMut<PoolRegistry>,
    mut reader: MessageReader<DespawnProjectile>,
    mut q: Query<
        (
            Option<&mut Projectile>,
            Option<&ProjectileState>,
            Option<&mut ImpaleStack>,
            Option<&Transform>,
            Option<&PooledFrom>,
            Option<&ReturnFlight>,
        ),
        Without<Enemy>,
    >,
    mut targets: CombatTargets,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for DespawnProjectile(e) in reader.read().copied() {
        if !seen.insert(e) {
            continue;
        }

        let Ok((projectile, state, stack, tf, tag, flight)) = q.get_mut(e) else {
            registry.despawn(&mut targets.commands, e, None);
            continue;
        };

        if state == Some(&ProjectileState::Inactive) {
            debug!("stake {e} is already pooled; ignoring despawn");
            continue;
        }

        if let (Some(mut stack), Some(tf)) = (stack, tf) {
            for entry in stack.drain() {
                targets.release_entry(&entry, tf, ReleaseMode::Resume);
            }
        }
        if let Some(mut projectile) = projectile {
            projectile.host = None;
        }
        if let Some(line) = flight.and_then(|f| f.line) {
            targets.commands.entity(line).try_despawn();
        }

        registry.despawn(&mut targets.commands, e, tag.copied());
    }
}
