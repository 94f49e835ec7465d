//! Per-step upkeep of live stakes: flight lifetime, attachment composition, forced detach.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{Projectile, ProjectileState, ReleaseMode, StuckTo};
use super::impale::{to_world, ImpaleStack};
use super::messages::{DespawnProjectile, ForceDetach, ReleaseImpaled};
use super::targets::CombatTargets;
use super::template::ProjectileTemplates;

/// Expire stakes whose flight lasted too long.
///
/// A retrievable stake drops where it is and waits for a recall. Anything else is discarded,
/// even when already stuck. Returning stakes are timed by their `ReturnFlight` instead.
pub fn tick_lifetimes(
    time: Res<Time<Fixed>>,
    templates: Res<ProjectileTemplates>,
    mut q: Query<(
        Entity,
        &mut Projectile,
        &mut ProjectileState,
        &mut ImpaleStack,
        &Transform,
        &mut LinearVelocity,
    )>,
    mut targets: CombatTargets,
    mut despawns: MessageWriter<DespawnProjectile>,
) {
    let dt = time.delta();

    for (e, mut projectile, mut state, mut stack, tf, mut vel) in &mut q {
        let Some(template) = templates.get(projectile.template) else {
            continue;
        };

        let ticking = match *state {
            ProjectileState::Flying | ProjectileState::Impaling => true,
            ProjectileState::Stuck => !template.retrievable,
            ProjectileState::Inactive | ProjectileState::Returning => false,
        };
        if !ticking || !projectile.lifetime.tick(dt).just_finished() {
            continue;
        }

        for entry in stack.drain() {
            targets.release_entry(&entry, tf, ReleaseMode::Resume);
        }

        if template.retrievable {
            debug!("stake {e} ran out of flight; dropping in place");
            vel.0 = Vec2::ZERO;
            *state = ProjectileState::Stuck;
        } else {
            projectile.host = None;
            despawns.write(DespawnProjectile(e));
        }
    }
}

pub fn follow_stuck_stakes(
    mut commands: Commands,
    mut q: Query<(Entity, &mut Projectile, &StuckTo, &mut Transform)>,
    q_hosts: Query<&Transform, Without<Projectile>>,
) {
    for (e, mut projectile, stuck, mut tf) in &mut q {
        match q_hosts.get(stuck.target) {
            Ok(host) => {
                let p = host.translation.truncate() + stuck.offset;
                tf.translation.x = p.x;
                tf.translation.y = p.y;
            }
            Err(_) => {
                debug!("stake {e}: host {} is gone; staying put", stuck.target);
                projectile.host = None;
                commands.entity(e).remove::<StuckTo>();
            }
        }
    }
}

/// Carry impaled enemies along the shaft.
pub fn follow_impaling_stakes(
    mut q: Query<(Entity, &Transform, &mut ImpaleStack), With<Projectile>>,
    mut targets: CombatTargets,
) {
    for (e, tf, mut stack) in &mut q {
        if stack.is_empty() {
            continue;
        }

        let pruned = stack.retain_alive(|enemy| targets.exists(enemy));
        if pruned > 0 {
            debug!("stake {e}: pruned {pruned} vanished impale entries");
        }

        for entry in stack.entries() {
            targets.place(entry.enemy, to_world(tf, entry.local));
        }
    }
}

/// Drop everything a stake holds. An impaling stake keeps flying on its own.
pub fn force_detach(
    mut reader: MessageReader<ForceDetach>,
    mut q: Query<(&mut Projectile, &mut ProjectileState, &mut ImpaleStack, &Transform)>,
    mut targets: CombatTargets,
) {
    for ForceDetach(e) in reader.read().copied() {
        let Ok((mut projectile, mut state, mut stack, tf)) = q.get_mut(e) else {
            debug!("force detach: {e} is not a stake");
            continue;
        };

        if projectile.host.take().is_some() {
            targets.commands.entity(e).remove::<StuckTo>();
        }
        for entry in stack.drain() {
            targets.release_entry(&entry, tf, ReleaseMode::Resume);
        }
        if *state == ProjectileState::Impaling {
            *state = ProjectileState::Flying;
        }
    }
}

/// Single-entry release. The remaining entries keep their offsets.
pub fn release_impaled(
    mut reader: MessageReader<ReleaseImpaled>,
    mut q: Query<(&mut ProjectileState, &mut ImpaleStack, &Transform), With<Projectile>>,
    mut targets: CombatTargets,
) {
    for ReleaseImpaled { stake, enemy } in reader.read().copied() {
        let Ok((mut state, mut stack, tf)) = q.get_mut(stake) else {
            debug!("release: {stake} is not a stake");
            continue;
        };
        let Some(entry) = stack.remove(enemy) else {
            debug!("release: {enemy} is not on stake {stake}");
            continue;
        };

        targets.release_entry(&entry, tf, ReleaseMode::Pinned);
        if stack.is_empty() && *state == ProjectileState::Impaling {
            *state = ProjectileState::Flying;
        }
    }
}
