//! Recall: bringing a stuck or impaling stake back to its wielder.
//!
//! # Flow
//! ```text
//!  RecallRequest ──> start_recalls ──> RetrievalBehavior::start
//!                                       - frees host / stack (Pull keeps one enemy on a tether)
//!                                       - state = Returning, insert ReturnFlight (+ TetherLine)
//!
//!  every fixed step:
//!    drive_returns      move toward the recipient, decide Arrived / TimedOut / Aborted
//!    conclude_returns   pay ammo back, drop the line, write DespawnProjectile
//!    pull_tethered      drag the held enemy, or let go once the flight is over
//!    process_tether_wall_hits   one-shot slam damage for a dragged enemy
//! ```
//!
//! A return is a per-step state machine, not a task. Its progress (`elapsed`) lives on the
//! `ReturnFlight` component, and every resumption re-checks that the stake is still returning
//! and the recipient still exists. Anything it created (line, tether) is released on every exit:
//! the normal exits release it in `conclude_returns`; a stake despawned from elsewhere leaves an
//! orphan that `reap_orphan_lines` / `pull_tethered` clean up on the next step.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::collision::StakeCtx;
use super::components::{Projectile, ProjectileState, ReleaseMode, StuckTo};
use super::impale::ImpaleStack;
use super::messages::{DespawnProjectile, RecallRequest};
use super::targets::CombatTargets;
use super::tether::spawn_line;
use super::template::{ProjectileTemplate, ProjectileTemplates};
use crate::common::health::Health;
use crate::common::layers::Layer;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::Enemy;
use crate::plugins::player::Wielder;

// -----------------------------------------------------------------------------
// Behaviours
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Default)]
pub enum RetrievalBehavior {
    /// Fly straight back.
    #[default]
    Simple,
    /// Drag one held enemy back on a tether.
    Pull(PullTuning),
    /// Slow everything the stake held or hits on the way.
    Binding(BindingTuning),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PullTuning {
    /// Speed the held enemy is dragged at.
    pub force: f32,
    /// The drag stops this close to the recipient.
    pub min_distance: f32,
    pub wall_damage: f32,
}

impl Default for PullTuning {
    fn default() -> Self {
        Self {
            force: 600.0,
            min_distance: 36.0,
            wall_damage: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindingTuning {
    pub duration: f32,
    /// Fraction of speed bled off per second while bound.
    pub slow: f32,
}

impl Default for BindingTuning {
    fn default() -> Self {
        Self {
            duration: 2.0,
            slow: 0.6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnOutcome {
    Arrived,
    TimedOut,
    Aborted,
}

/// Progress of one return trip.
#[derive(Component, Debug, Clone)]
pub struct ReturnFlight {
    pub recipient: Entity,
    pub speed: f32,
    pub elapsed: f32,
    pub max_secs: f32,
    /// Enemies already struck on this trip.
    pub hits: Vec<Entity>,
    pub line: Option<Entity>,
    pub outcome: Option<ReturnOutcome>,
}

impl ReturnFlight {
    pub fn new(recipient: Entity, template: &ProjectileTemplate) -> Self {
        Self {
            recipient,
            speed: template.return_speed,
            elapsed: 0.0,
            max_secs: template.max_return_secs,
            hits: Vec::new(),
            line: None,
            outcome: None,
        }
    }
}

/// An enemy being dragged behind a returning stake. Not an attachment: the enemy keeps its own
/// dynamic body and is steered through its velocity.
#[derive(Component, Debug, Clone)]
pub struct Tethered {
    pub stake: Entity,
    pub force: f32,
    pub min_distance: f32,
    pub wall_damage: f32,
    pub slammed: bool,
}

impl RetrievalBehavior {
    #[inline]
    fn draws_line(&self) -> bool {
        !matches!(self, Self::Simple)
    }

    /// Begin the return of `stake` to `recipient`.
    pub fn start(
        &self,
        stake: &mut StakeCtx,
        recipient: Entity,
        recipient_pos: Vec2,
        targets: &mut CombatTargets,
        tunables: &Tunables,
    ) {
        let host = stake.projectile.host.take();
        if host.is_some() {
            targets.commands.entity(stake.entity).remove::<StuckTo>();
        }

        match self {
            Self::Simple => release_stack(stake.stack, stake.transform, targets),
            Self::Pull(tuning) => {
                // The host, or else the enemy nearest the tip, goes on the tether.
                // A host another stake is carrying stays with that stake.
                let held = match host.filter(|h| !targets.is_held(*h)) {
                    Some(h) => Some(h),
                    None => stake.stack.pop_tip().map(|entry| {
                        targets.release_entry(&entry, stake.transform, ReleaseMode::Pinned);
                        entry.enemy
                    }),
                };
                release_stack(stake.stack, stake.transform, targets);

                if let Some(enemy) = held.filter(|e| targets.exists(*e)) {
                    targets.commands.entity(enemy).try_insert((
                        Tethered {
                            stake: stake.entity,
                            force: tuning.force,
                            min_distance: tuning.min_distance,
                            wall_damage: tuning.wall_damage,
                            slammed: false,
                        },
                        CollisionEventsEnabled,
                    ));
                }
            }
            Self::Binding(tuning) => {
                let held = host.into_iter().chain(stake.stack.entries().iter().map(|e| e.enemy));
                for enemy in held.collect::<Vec<_>>() {
                    targets.bind(enemy, tuning.duration, tuning.slow);
                }
                release_stack(stake.stack, stake.transform, targets);
            }
        }

        stake.velocity.0 = Vec2::ZERO;
        *stake.state = ProjectileState::Returning;

        let mut flight = ReturnFlight::new(recipient, stake.template);
        if self.draws_line() {
            let from = stake.transform.translation.truncate();
            flight.line = Some(spawn_line(
                &mut targets.commands,
                stake.entity,
                from,
                recipient_pos,
                stake.template.color,
                tunables.tether_thickness,
            ));
        }
        targets.commands.entity(stake.entity).insert(flight);
    }
}

fn release_stack(stack: &mut ImpaleStack, stake_tf: &Transform, targets: &mut CombatTargets) {
    for entry in stack.drain() {
        targets.release_entry(&entry, stake_tf, ReleaseMode::Pinned);
    }
}

/// A returning stake ran into `enemy`.
#[allow(clippy::too_many_arguments)]
pub fn on_return_path_hit(
    behavior: &RetrievalBehavior,
    template: &ProjectileTemplate,
    stake: Entity,
    flight: &mut ReturnFlight,
    enemy: Entity,
    wielder: Option<Entity>,
    targets: &mut CombatTargets,
    wielders: &mut Query<(&mut Wielder, Option<&mut Health>), Without<Enemy>>,
) {
    if flight.hits.contains(&enemy) {
        return;
    }
    flight.hits.push(enemy);

    let damage = template.damage * template.return_damage_ratio;
    targets.strike(enemy, stake, damage, 1, template.hit_stop, template.shake);

    if let RetrievalBehavior::Binding(tuning) = behavior {
        targets.bind(enemy, tuning.duration, tuning.slow);
    }

    if targets.execute_if_groggy(enemy) {
        info!("stake {stake} executed {enemy}");
        let Some(w) = wielder else {
            return;
        };
        match wielders.get_mut(w) {
            Ok((mut wielder, mut hp)) => wielder.on_execution_success(
                hp.as_deref_mut(),
                template.execution_heal,
                template.execution_ammo_reward,
            ),
            Err(_) => debug!("execution by stake {stake}: wielder {w} is gone"),
        }
    }
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

pub fn start_recalls(
    mut reader: MessageReader<RecallRequest>,
    templates: Res<ProjectileTemplates>,
    tunables: Res<Tunables>,
    mut q_stakes: Query<(
        Entity,
        &mut Projectile,
        &mut ProjectileState,
        &mut ImpaleStack,
        &mut Transform,
        &mut LinearVelocity,
    )>,
    q_recipients: Query<&Transform, (Without<Projectile>, Without<Enemy>)>,
    mut targets: CombatTargets,
    mut despawns: MessageWriter<DespawnProjectile>,
) {
    for req in reader.read() {
        let recipient_pos = q_recipients.get(req.wielder).ok().map(|tf| tf.translation.truncate());

        for (e, mut projectile, mut state, mut stack, mut tf, mut vel) in &mut q_stakes {
            if projectile.wielder != Some(req.wielder) || !state.recallable() {
                continue;
            }

            let Some(template) = templates.get(projectile.template) else {
                warn!("stake {e} references a missing template; aborting its flight");
                despawns.write(DespawnProjectile(e));
                continue;
            };
            if !template.retrievable {
                continue;
            }

            let Some(recipient_pos) = recipient_pos else {
                warn!("recall for missing wielder {}; discarding stake {e}", req.wielder);
                despawns.write(DespawnProjectile(e));
                continue;
            };

            let mut ctx = StakeCtx {
                entity: e,
                projectile: &mut *projectile,
                state: &mut *state,
                stack: &mut *stack,
                transform: &mut *tf,
                velocity: &mut *vel,
                template,
            };
            template
                .retrieval
                .start(&mut ctx, req.wielder, recipient_pos, &mut targets, &tunables);
        }
    }
}

pub fn drive_returns(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut q: Query<(&mut Transform, &mut LinearVelocity, &ProjectileState, &mut ReturnFlight), With<Projectile>>,
    q_recipients: Query<&Transform, Without<Projectile>>,
) {
    let dt = time.delta_secs();

    for (mut tf, mut vel, state, mut flight) in &mut q {
        if flight.outcome.is_some() {
            continue;
        }
        if *state != ProjectileState::Returning {
            flight.outcome = Some(ReturnOutcome::Aborted);
            continue;
        }
        let Ok(recipient) = q_recipients.get(flight.recipient) else {
            flight.outcome = Some(ReturnOutcome::Aborted);
            continue;
        };

        vel.0 = Vec2::ZERO;
        flight.elapsed += dt;

        let pos = tf.translation.truncate();
        let to = recipient.translation.truncate() - pos;
        let dist = to.length();
        let step = flight.speed * dt;

        if dist <= tunables.catch_radius + step {
            tf.translation.x = recipient.translation.x;
            tf.translation.y = recipient.translation.y;
            flight.outcome = Some(ReturnOutcome::Arrived);
            continue;
        }

        let dir = to / dist;
        tf.translation += (dir * step).extend(0.0);
        tf.rotation = Quat::from_rotation_z(dir.to_angle());

        if flight.elapsed >= flight.max_secs {
            flight.outcome = Some(ReturnOutcome::TimedOut);
        }
    }
}

pub fn conclude_returns(
    mut commands: Commands,
    q: Query<(Entity, &Projectile, &ReturnFlight)>,
    mut q_wielders: Query<&mut Wielder>,
    mut despawns: MessageWriter<DespawnProjectile>,
) {
    for (e, projectile, flight) in &q {
        let Some(outcome) = flight.outcome else {
            continue;
        };

        if outcome != ReturnOutcome::Aborted {
            if let Some(mut w) = projectile.wielder.and_then(|w| q_wielders.get_mut(w).ok()) {
                w.recover_ammo(1);
            }
        } else {
            warn!("return of stake {e} aborted");
        }

        if let Some(line) = flight.line {
            commands.entity(line).try_despawn();
        }
        commands.entity(e).remove::<ReturnFlight>();
        despawns.write(DespawnProjectile(e));
    }
}

pub fn pull_tethered(
    time: Res<Time<Fixed>>,
    q_tethered: Query<(Entity, &Tethered)>,
    q_flights: Query<&ReturnFlight>,
    q_recipients: Query<&Transform, (Without<Enemy>, Without<Projectile>)>,
    mut targets: CombatTargets,
) {
    let dt = time.delta_secs();

    for (enemy, tether) in &q_tethered {
        let recipient = q_flights
            .get(tether.stake)
            .ok()
            .filter(|f| f.outcome.is_none())
            .and_then(|f| q_recipients.get(f.recipient).ok());

        let (Some(recipient), Some(pos)) = (recipient, targets.position(enemy)) else {
            targets.set_velocity(enemy, Vec2::ZERO);
            targets.commands.entity(enemy).try_remove::<Tethered>();
            continue;
        };

        let to = recipient.translation.truncate() - pos;
        let dist = to.length();
        if dist <= tether.min_distance {
            targets.set_velocity(enemy, Vec2::ZERO);
            continue;
        }

        // Never overshoot the stop distance within one step.
        let speed = tether.force.min((dist - tether.min_distance) / dt.max(f32::EPSILON));
        targets.set_velocity(enemy, to / dist * speed);
    }
}

pub fn process_tether_wall_hits(
    mut started: MessageReader<CollisionStart>,
    mut q_tethered: Query<&mut Tethered>,
    q_layers: Query<&CollisionLayers>,
    mut targets: CombatTargets,
) {
    for ev in started.read() {
        let sides = [
            (ev.body1.unwrap_or(ev.collider1), ev.collider2),
            (ev.body2.unwrap_or(ev.collider2), ev.collider1),
        ];

        for (enemy, other_collider) in sides {
            let Ok(mut tether) = q_tethered.get_mut(enemy) else {
                continue;
            };
            let hit_wall = q_layers
                .get(other_collider)
                .is_ok_and(|l| l.memberships.has_all(Layer::World));
            if !hit_wall || tether.slammed {
                continue;
            }

            tether.slammed = true;
            targets.damage(enemy, tether.wall_damage);
            debug!("tethered {enemy} slammed into a wall");
        }
    }
}
