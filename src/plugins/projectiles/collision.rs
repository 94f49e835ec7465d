//! Contact resolution for stakes.
//!
//! `process_stake_collisions` reads Avian's `CollisionStart` messages once per fixed step and
//! routes each (stake, other) touch exactly once:
//! - stake in flight  -> the template's [`CollisionBehavior`]
//! - stake returning  -> the template's retrieval behaviour (`on_return_path_hit`)
//! - anything else    -> ignored
//!
//! Messages arrive in contact order, so impale insertion order is contact order.

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{Projectile, ProjectileState, ReleaseMode, StuckTo};
use super::impale::{flight_axis, tip_world, to_local, to_world, ImpaleStack};
use super::messages::DespawnProjectile;
use super::retrieval::{self, ReturnFlight};
use super::targets::CombatTargets;
use super::template::{ProjectileTemplate, ProjectileTemplates};
use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::plugins::enemies::Enemy;
use crate::plugins::player::Wielder;

// -----------------------------------------------------------------------------
// Behaviours
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Default)]
pub enum CollisionBehavior {
    /// Stop in the first enemy or wall touched.
    #[default]
    Stick,
    /// Skewer enemies and keep flying until a wall.
    Impale(ImpaleTuning),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImpaleTuning {
    pub max_count: usize,
    pub spacing: f32,
    /// Velocity scale applied when an impale succeeds.
    pub speed_multiplier: f32,
    /// `false`: only the first impale of a flight accelerates.
    pub accelerate_every_impale: bool,
    pub wall_impact_damage: f32,
    pub wall_stun_secs: Option<f32>,
    /// Fraction of an entity's half extent it may sink into a wall.
    pub wall_clamp_fraction: f32,
}

impl Default for ImpaleTuning {
    fn default() -> Self {
        Self {
            max_count: 3,
            spacing: 4.0,
            speed_multiplier: 1.25,
            accelerate_every_impale: false,
            wall_impact_damage: 2.0,
            wall_stun_secs: Some(1.0),
            wall_clamp_fraction: 0.4,
        }
    }
}

/// Mutable view of one stake while a contact is being resolved.
pub struct StakeCtx<'a> {
    pub entity: Entity,
    pub projectile: &'a mut Projectile,
    pub state: &'a mut ProjectileState,
    pub stack: &'a mut ImpaleStack,
    pub transform: &'a mut Transform,
    pub velocity: &'a mut LinearVelocity,
    pub template: &'a ProjectileTemplate,
}

impl CollisionBehavior {
    pub fn on_enemy(&self, stake: &mut StakeCtx, targets: &mut CombatTargets, enemy: Entity) {
        match self {
            Self::Stick => stick_in_enemy(stake, targets, enemy),
            Self::Impale(tuning) => {
                if !impale_enemy(stake, targets, enemy, tuning) {
                    debug!("stake {}: could not impale {enemy}", stake.entity);
                }
            }
        }
    }

    pub fn on_wall(&self, stake: &mut StakeCtx, targets: &mut CombatTargets) {
        halt(stake);
        if let Self::Impale(tuning) = self {
            wall_impact(stake, targets, tuning);
        }
        *stake.state = ProjectileState::Stuck;
    }
}

#[inline]
fn halt(stake: &mut StakeCtx) {
    stake.velocity.0 = Vec2::ZERO;
}

fn stick_in_enemy(stake: &mut StakeCtx, targets: &mut CombatTargets, enemy: Entity) {
    let t = stake.template;
    targets.strike(enemy, stake.entity, t.damage, 1, t.hit_stop, t.shake);

    halt(stake);
    if let Some(host_pos) = targets.position(enemy) {
        let offset = stake.transform.translation.truncate() - host_pos;
        targets
            .commands
            .entity(stake.entity)
            .insert(StuckTo { target: enemy, offset });
        stake.projectile.host = Some(enemy);
    }
    *stake.state = ProjectileState::Stuck;
}

/// Put `enemy` on the shaft. The stake keeps flying.
///
/// An enemy already held by another stake is left alone.
pub fn impale_enemy(
    stake: &mut StakeCtx,
    targets: &mut CombatTargets,
    enemy: Entity,
    tuning: &ImpaleTuning,
) -> bool {
    if !stake.stack.can_accept(enemy) {
        return false;
    }

    let axis = flight_axis(stake.transform);
    let Some((backup, extent)) = targets.capture(enemy, axis) else {
        return false;
    };

    let contact = tip_world(stake.transform, stake.template.tip_offset);
    let contact_local = to_local(stake.transform, contact);
    if !stake.stack.try_impale(enemy, contact_local, extent, backup) {
        return false;
    }

    targets.seize(enemy);
    targets.mark_impaled(enemy, stake.entity);
    for entry in stake.stack.entries() {
        targets.place(entry.enemy, to_world(stake.transform, entry.local));
    }

    let t = stake.template;
    targets.strike(enemy, stake.entity, t.damage, 1, t.hit_stop, t.shake);

    *stake.state = ProjectileState::Impaling;
    if !stake.projectile.accelerated || tuning.accelerate_every_impale {
        stake.velocity.0 *= tuning.speed_multiplier;
        stake.projectile.accelerated = true;
    }
    true
}

/// Pin every impaled enemy at the wall: clamp, hurt, stun, release.
pub fn wall_impact(stake: &mut StakeCtx, targets: &mut CombatTargets, tuning: &ImpaleTuning) {
    if stake.stack.is_empty() {
        return;
    }

    stake.stack.clamp_to_wall(tuning.wall_clamp_fraction);

    for entry in stake.stack.drain() {
        targets.damage(entry.enemy, tuning.wall_impact_damage);
        if let Some(secs) = tuning.wall_stun_secs {
            targets.stun(entry.enemy, secs);
        }
        targets.release_entry(&entry, stake.transform, ReleaseMode::Pinned);
    }
}

// -----------------------------------------------------------------------------
// System
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets_of(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

#[inline]
fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

pub fn process_stake_collisions(
    mut started: MessageReader<CollisionStart>,
    templates: Res<ProjectileTemplates>,
    q_is_stake: Query<(), With<Projectile>>,
    mut q_stakes: Query<(
        &mut Projectile,
        &mut ProjectileState,
        &mut ImpaleStack,
        &mut Transform,
        &mut LinearVelocity,
        Option<&mut ReturnFlight>,
    )>,
    q_layers: Query<&CollisionLayers>,
    q_is_enemy: Query<(), With<Enemy>>,
    mut q_wielders: Query<(&mut Wielder, Option<&mut Health>), Without<Enemy>>,
    mut targets: CombatTargets,
    mut despawns: MessageWriter<DespawnProjectile>,
    // Per-step dedupe of (stake, other) pairs.
    mut seen: Local<HashSet<(Entity, Entity)>>,
) {
    seen.clear();
    targets.begin_contacts();

    for ev in started.read() {
        let (t1, t2) = targets_of(ev);

        let s1 = q_is_stake.contains(t1.collider);
        let s2 = q_is_stake.contains(t2.collider);
        if !(s1 ^ s2) {
            continue; // must be exactly one stake
        }
        let (stake_side, other_side) = if s1 { (t1, t2) } else { (t2, t1) };
        let stake_e = stake_side.collider;
        let other = other_side.gameplay_owner();

        if !seen.insert((stake_e, other)) {
            continue;
        }

        let Ok((mut projectile, mut state, mut stack, mut tf, mut vel, flight)) =
            q_stakes.get_mut(stake_e)
        else {
            continue;
        };

        let Some(template) = templates.get(projectile.template) else {
            warn!("stake {stake_e} references a missing template; aborting its flight");
            despawns.write(DespawnProjectile(stake_e));
            continue;
        };

        let is_wall = q_layers
            .get(other_side.collider)
            .is_ok_and(|l| is_in_layer(l, Layer::World));
        let is_enemy = q_is_enemy.contains(other);
        if !is_wall && !is_enemy {
            continue;
        }

        match *state {
            ProjectileState::Flying | ProjectileState::Impaling => {
                let mut ctx = StakeCtx {
                    entity: stake_e,
                    projectile: &mut *projectile,
                    state: &mut *state,
                    stack: &mut *stack,
                    transform: &mut *tf,
                    velocity: &mut *vel,
                    template,
                };
                if is_wall {
                    template.collision.on_wall(&mut ctx, &mut targets);
                } else {
                    template.collision.on_enemy(&mut ctx, &mut targets, other);
                }
            }
            ProjectileState::Returning if is_enemy => {
                let Some(mut flight) = flight else {
                    continue;
                };
                retrieval::on_return_path_hit(
                    &template.retrieval,
                    template,
                    stake_e,
                    &mut *flight,
                    other,
                    projectile.wielder,
                    &mut targets,
                    &mut q_wielders,
                );
            }
            _ => {}
        }
    }
}
