//! Everything a stake does *to* an enemy, behind one `SystemParam`.
//!
//! Queries here never touch stakes (`Without<Projectile>`), which keeps them disjoint from the
//! `&mut Transform` stake queries of the systems that embed this param.
//!
//! Missing collaborator components degrade per effect: no `Health` means no damage, no
//! `EnemyController` means no stacks or stun, no `Extent` means a zero-length body. Only a
//! missing rigid body makes an enemy unusable for capture, because there would be nothing to
//! restore afterwards.
//!
//! `RigidBody` is an immutable component in Avian, so mode switches go through
//! `insert` and land when the commands are applied.
//!
//! An enemy is held by at most one stake: capture refuses anything already `Impaled` or
//! `Tethered`, and anything seized earlier in the same system run (its marker is still queued).

use avian2d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{BodyBackup, Impaled, Projectile, ReleaseMode};
use super::impale::{extent_along, to_world, ImpaleEntry};
use super::messages::HitEffect;
use super::retrieval::Tethered;
use crate::common::health::Health;
use crate::plugins::enemies::{Bound, Enemy, EnemyController, Extent};

#[derive(SystemParam)]
pub struct CombatTargets<'w, 's> {
    bodies: Query<
        'w,
        's,
        (
            &'static mut Transform,
            &'static RigidBody,
            &'static mut LinearVelocity,
            Option<&'static ChildOf>,
            Option<&'static Extent>,
        ),
        (With<Enemy>, Without<Projectile>),
    >,
    vitals: Query<
        'w,
        's,
        (Option<&'static mut Health>, Option<&'static mut EnemyController>),
        (With<Enemy>, Without<Projectile>),
    >,
    held: Query<'w, 's, (), (With<Enemy>, Or<(With<Impaled>, With<Tethered>)>)>,
    globals: Query<'w, 's, &'static GlobalTransform>,
    pub commands: Commands<'w, 's>,
    effects: MessageWriter<'w, HitEffect>,
    // Seized during this run, markers not applied yet.
    pending: Local<'s, HashSet<Entity>>,
}

impl CombatTargets<'_, '_> {
    #[inline]
    pub fn exists(&self, enemy: Entity) -> bool {
        self.bodies.contains(enemy)
    }

    #[inline]
    pub fn position(&self, enemy: Entity) -> Option<Vec2> {
        self.bodies.get(enemy).ok().map(|(tf, ..)| tf.translation.truncate())
    }

    /// `true` while another stake has the enemy impaled or on a tether.
    #[inline]
    pub fn is_held(&self, enemy: Entity) -> bool {
        self.held.contains(enemy) || self.pending.contains(&enemy)
    }

    /// Forget seizures from an earlier run. Their markers are applied by now.
    pub fn begin_contacts(&mut self) {
        self.pending.clear();
    }

    /// Record the enemy's physics state and its extent along `axis`.
    ///
    /// `None` when the enemy has no body to take over or is already held elsewhere.
    pub fn capture(&self, enemy: Entity, axis: Vec2) -> Option<(BodyBackup, f32)> {
        if self.is_held(enemy) {
            debug!("enemy {enemy} is already held by a stake");
            return None;
        }
        let (tf, body, vel, parent, extent) = self.bodies.get(enemy).ok()?;

        let extent = match extent {
            Some(ex) => extent_along(ex.half, tf.rotation, axis),
            None => {
                debug!("enemy {enemy} has no Extent; treating it as zero-length");
                0.0
            }
        };

        let backup = BodyBackup {
            body: *body,
            velocity: vel.0,
            parent: parent.map(|p| p.parent()),
        };
        Some((backup, extent))
    }

    /// Switch off the enemy's own simulation: kinematic, motionless, detached from any parent.
    ///
    /// Its transform is rewritten into world space so later placement can overwrite it directly.
    pub fn seize(&mut self, enemy: Entity) {
        let Ok((mut tf, _, mut vel, parent, _)) = self.bodies.get_mut(enemy) else {
            return;
        };

        vel.0 = Vec2::ZERO;
        if parent.is_some() {
            if let Ok(global) = self.globals.get(enemy) {
                *tf = global.compute_transform();
            }
        }

        let mut ec = self.commands.entity(enemy);
        ec.try_insert(RigidBody::Kinematic);
        if parent.is_some() {
            ec.try_remove::<ChildOf>();
        }
        self.pending.insert(enemy);
    }

    /// Mark `enemy` as riding on `stake`.
    pub fn mark_impaled(&mut self, enemy: Entity, stake: Entity) {
        self.commands.entity(enemy).try_insert(Impaled { by: stake });
    }

    pub fn place(&mut self, enemy: Entity, world: Vec2) {
        if let Ok((mut tf, ..)) = self.bodies.get_mut(enemy) {
            tf.translation.x = world.x;
            tf.translation.y = world.y;
        }
    }

    pub fn set_velocity(&mut self, enemy: Entity, v: Vec2) {
        if let Ok((_, _, mut vel, ..)) = self.bodies.get_mut(enemy) {
            vel.0 = v;
        }
    }

    /// Damage + hit stacks + feedback for one strike.
    pub fn strike(&mut self, enemy: Entity, source: Entity, damage: f32, stacks: u32, hit_stop: f32, shake: f32) {
        let Ok((hp, ctrl)) = self.vitals.get_mut(enemy) else {
            return;
        };

        match hp {
            Some(mut hp) => hp.take_damage(damage),
            None => debug!("enemy {enemy} has no Health; damage skipped"),
        }
        match ctrl {
            Some(mut ctrl) => ctrl.register_hit(stacks, source),
            None => debug!("enemy {enemy} has no EnemyController; hit stacks skipped"),
        }

        let position = self.position(enemy).unwrap_or_default();
        self.effects.write(HitEffect {
            source,
            hit_stop,
            shake,
            position,
        });
    }

    /// Plain damage with no stacks and no feedback (wall slams, ticks).
    pub fn damage(&mut self, enemy: Entity, amount: f32) {
        if let Ok((Some(mut hp), _)) = self.vitals.get_mut(enemy) {
            hp.take_damage(amount);
        }
    }

    pub fn stun(&mut self, enemy: Entity, duration: f32) {
        if let Ok((_, Some(mut ctrl))) = self.vitals.get_mut(enemy) {
            ctrl.apply_stun(duration);
        }
    }

    pub fn bind(&mut self, enemy: Entity, duration: f32, slow: f32) {
        if self.exists(enemy) {
            self.commands.entity(enemy).try_insert(Bound::new(duration, slow));
        }
    }

    /// Consume a groggy enemy's stacks and mark it executed. `false` if it wasn't groggy.
    pub fn execute_if_groggy(&mut self, enemy: Entity) -> bool {
        let Ok((_, Some(mut ctrl))) = self.vitals.get_mut(enemy) else {
            return false;
        };
        if !ctrl.is_groggy() {
            return false;
        }
        let stacks = ctrl.hit_stacks;
        ctrl.consume_stacks(stacks);
        ctrl.mark_executed();
        true
    }

    /// Hand the enemy back to the simulation at its current world position.
    pub fn restore(&mut self, enemy: Entity, backup: &BodyBackup, mode: ReleaseMode) {
        let Ok((mut tf, _, mut vel, ..)) = self.bodies.get_mut(enemy) else {
            return;
        };

        vel.0 = match mode {
            ReleaseMode::Pinned => Vec2::ZERO,
            ReleaseMode::Resume => backup.velocity,
        };
        self.pending.remove(&enemy);

        let mut ec = self.commands.entity(enemy);
        ec.try_insert(backup.body);
        ec.try_remove::<(Impaled, Tethered)>();

        let Some(parent) = backup.parent else {
            return;
        };
        match self.globals.get(parent) {
            Ok(parent_global) => {
                *tf = GlobalTransform::from(*tf).reparented_to(parent_global);
                ec.try_insert(ChildOf(parent));
            }
            Err(_) => debug!("enemy {enemy}: former parent {parent} is gone; staying in world space"),
        }
    }

    /// Release one stack entry where it visually sits on `stake_tf`.
    pub fn release_entry(&mut self, entry: &ImpaleEntry, stake_tf: &Transform, mode: ReleaseMode) {
        self.place(entry.enemy, to_world(stake_tf, entry.local));
        self.restore(entry.enemy, &entry.backup, mode);
    }
}
