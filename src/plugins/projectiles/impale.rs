//! Impaled-entity stack: the ordered chain of enemies skewered on one stake.
//!
//! # Frame
//! Every offset here is in the stake's local frame: +X is the flight axis and points at the tip,
//! the stake origin is (0, 0). Enemies are not re-parented in the scene graph; each entry stores
//! its local offset and `follow_impaling_stakes` composes the world transform once per fixed step.
//!
//! # Invariants
//! - `len() <= capacity()`
//! - an enemy appears at most once
//! - `entries` is insertion order; the newest entry sits at the tip, earlier ones were pushed
//!   back by `extent + spacing` each time something was added in front of them
//!
//! ```text
//!   tail                                           tip
//!    |<- E1 ->|  spacing  |<- E2 ->|  spacing  |<- E3 ->|>
//! ```
//!
//! The structure itself is pure data. Side effects (body capture, damage, release) live in
//! [`CombatTargets`](super::targets::CombatTargets) and are applied only after the stack accepted
//! or produced an entry.

use bevy::prelude::*;

use super::components::BodyBackup;

#[derive(Debug, Clone, PartialEq)]
pub struct ImpaleEntry {
    pub enemy: Entity,
    pub local: Vec2,
    /// Half the enemy's extent along the flight axis, measured at impale time.
    pub half_extent: f32,
    pub backup: BodyBackup,
}

/// Lowest local x an entry of `half_extent` may keep once the stake hits a wall.
#[inline]
pub fn penetration_limit(half_extent: f32, fraction: f32) -> f32 {
    -fraction * half_extent
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ImpaleStack {
    entries: Vec<ImpaleEntry>,
    capacity: usize,
    spacing: f32,
}

impl ImpaleStack {
    pub fn new(capacity: usize, spacing: f32) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            spacing,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn contains(&self, enemy: Entity) -> bool {
        self.entries.iter().any(|e| e.enemy == enemy)
    }

    #[inline]
    pub fn can_accept(&self, enemy: Entity) -> bool {
        !self.is_full() && !self.contains(enemy)
    }

    pub fn entries(&self) -> &[ImpaleEntry] {
        &self.entries
    }

    pub fn get(&self, enemy: Entity) -> Option<&ImpaleEntry> {
        self.entries.iter().find(|e| e.enemy == enemy)
    }

    /// Put `enemy` on the shaft so its leading edge touches `contact_local`.
    ///
    /// Returns `false` without touching the stack when full or when `enemy` is already on it.
    pub fn try_impale(
        &mut self,
        enemy: Entity,
        contact_local: Vec2,
        extent: f32,
        backup: BodyBackup,
    ) -> bool {
        if !self.can_accept(enemy) {
            return false;
        }

        let half_extent = extent.max(0.0) * 0.5;
        let local = Vec2::new(contact_local.x - half_extent, contact_local.y);

        if !self.entries.is_empty() {
            let shift = extent.max(0.0) + self.spacing;
            for entry in &mut self.entries {
                entry.local.x -= shift;
            }
        }

        self.entries.push(ImpaleEntry {
            enemy,
            local,
            half_extent,
            backup,
        });
        true
    }

    /// Pull every entry lying behind `-fraction * half_extent` forward to exactly that limit.
    /// Entries at or ahead of their limit keep their offsets.
    pub fn clamp_to_wall(&mut self, fraction: f32) {
        for entry in &mut self.entries {
            entry.local.x = entry.local.x.max(penetration_limit(entry.half_extent, fraction));
        }
    }

    /// Take one entry off the shaft. The others keep their offsets.
    pub fn remove(&mut self, enemy: Entity) -> Option<ImpaleEntry> {
        let idx = self.entries.iter().position(|e| e.enemy == enemy)?;
        Some(self.entries.remove(idx))
    }

    /// Take the entry nearest the tip.
    pub fn pop_tip(&mut self) -> Option<ImpaleEntry> {
        self.entries.pop()
    }

    /// Empty the stack, oldest entry first.
    pub fn drain(&mut self) -> Vec<ImpaleEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Drop entries whose enemy no longer exists. Returns how many were dropped.
    pub fn retain_alive(&mut self, mut alive: impl FnMut(Entity) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| alive(e.enemy));
        before - self.entries.len()
    }
}

// -----------------------------------------------------------------------------
// Frame conversion
// -----------------------------------------------------------------------------

/// Unit flight direction of a stake in world space.
#[inline]
pub fn flight_axis(tf: &Transform) -> Vec2 {
    (tf.rotation * Vec3::X).truncate()
}

#[inline]
pub fn to_local(tf: &Transform, world: Vec2) -> Vec2 {
    (tf.rotation.inverse() * (world.extend(tf.translation.z) - tf.translation)).truncate()
}

#[inline]
pub fn to_world(tf: &Transform, local: Vec2) -> Vec2 {
    (tf.translation + tf.rotation * local.extend(0.0)).truncate()
}

/// World position of a stake's tip.
#[inline]
pub fn tip_world(tf: &Transform, tip_offset: f32) -> Vec2 {
    to_world(tf, Vec2::new(tip_offset, 0.0))
}

/// Full extent of a box of `half_size`, rotated by `rotation`, measured along `axis`.
#[inline]
pub fn extent_along(half_size: Vec2, rotation: Quat, axis: Vec2) -> f32 {
    let a = (rotation.inverse() * axis.extend(0.0)).truncate();
    2.0 * (a.x.abs() * half_size.x + a.y.abs() * half_size.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avian2d::prelude::RigidBody;

    fn backup() -> BodyBackup {
        BodyBackup {
            body: RigidBody::Dynamic,
            velocity: Vec2::ZERO,
            parent: None,
        }
    }

    fn enemies(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn first_entry_leading_edge_lands_on_contact() {
        let e = enemies(1);
        let mut stack = ImpaleStack::new(3, 0.3);

        assert!(stack.try_impale(e[0], Vec2::new(2.0, 0.0), 1.0, backup()));
        assert_eq!(stack.entries()[0].local, Vec2::new(1.5, 0.0));
        assert_eq!(stack.entries()[0].half_extent, 0.5);
    }

    #[test]
    fn second_entry_pushes_first_back_by_extent_plus_spacing() {
        let e = enemies(2);
        let mut stack = ImpaleStack::new(3, 0.3);

        stack.try_impale(e[0], Vec2::new(0.5, 0.0), 1.0, backup());
        let before = stack.entries()[0].local.x;
        stack.try_impale(e[1], Vec2::new(0.5, 0.0), 2.0, backup());

        let order: Vec<Entity> = stack.entries().iter().map(|x| x.enemy).collect();
        assert_eq!(order, vec![e[0], e[1]]);
        assert!((stack.entries()[0].local.x - (before - 2.3)).abs() < 1e-6);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn rejects_duplicates_and_overflow_without_mutation() {
        let e = enemies(3);
        let mut stack = ImpaleStack::new(2, 0.3);

        assert!(stack.try_impale(e[0], Vec2::ZERO, 1.0, backup()));
        let snapshot = stack.clone();
        assert!(!stack.try_impale(e[0], Vec2::ZERO, 1.0, backup()));
        assert_eq!(stack, snapshot);

        assert!(stack.try_impale(e[1], Vec2::ZERO, 1.0, backup()));
        let snapshot = stack.clone();
        assert!(!stack.try_impale(e[2], Vec2::ZERO, 1.0, backup()));
        assert_eq!(stack, snapshot);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn zero_capacity_stack_accepts_nothing() {
        let e = enemies(1);
        let mut stack = ImpaleStack::new(0, 0.0);
        assert!(!stack.try_impale(e[0], Vec2::ZERO, 1.0, backup()));
        assert!(stack.is_empty());
    }

    #[test]
    fn wall_clamp_pulls_deep_entries_to_the_limit_and_leaves_the_rest() {
        let e = enemies(2);
        let mut stack = ImpaleStack::new(2, 0.0);

        // Unit extent: the first lands at -1.0 after the push-back, the second at 0.0.
        stack.try_impale(e[0], Vec2::new(0.5, 0.0), 1.0, backup());
        stack.try_impale(e[1], Vec2::new(0.5, 0.0), 1.0, backup());
        assert_eq!(stack.entries()[0].local.x, -1.0);

        stack.clamp_to_wall(0.4);

        assert!((stack.entries()[0].local.x - -0.2).abs() < 1e-6);
        assert_eq!(stack.entries()[1].local.x, 0.0);
    }

    #[test]
    fn wall_clamp_fraction_is_configurable() {
        let e = enemies(1);
        let mut stack = ImpaleStack::new(1, 0.0);
        stack.try_impale(e[0], Vec2::new(-3.0, 0.0), 2.0, backup());

        stack.clamp_to_wall(1.0);
        assert!((stack.entries()[0].local.x - penetration_limit(1.0, 1.0)).abs() < 1e-6);
    }

    #[test]
    fn remove_and_pop_tip_keep_other_offsets() {
        let e = enemies(3);
        let mut stack = ImpaleStack::new(3, 0.3);
        for &x in &e {
            stack.try_impale(x, Vec2::new(0.5, 0.0), 1.0, backup());
        }
        let tail = stack.entries()[0].local;

        let mid = stack.remove(e[1]).unwrap();
        assert_eq!(mid.enemy, e[1]);
        assert_eq!(stack.pop_tip().unwrap().enemy, e[2]);
        assert_eq!(stack.entries()[0].local, tail);
        assert!(stack.remove(e[1]).is_none());
    }

    #[test]
    fn frame_conversion_round_trips_through_rotation() {
        let tf = Transform::from_xyz(10.0, -4.0, 2.0)
            .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));

        let local = to_local(&tf, Vec2::new(10.0, 1.0));
        assert!((local - Vec2::new(5.0, 0.0)).length() < 1e-5);
        assert!((to_world(&tf, local) - Vec2::new(10.0, 1.0)).length() < 1e-5);
        assert!((flight_axis(&tf) - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn extent_depends_on_approach_axis() {
        let half = Vec2::new(2.0, 0.5);
        assert!((extent_along(half, Quat::IDENTITY, Vec2::X) - 4.0).abs() < 1e-6);
        assert!((extent_along(half, Quat::IDENTITY, Vec2::Y) - 1.0).abs() < 1e-6);
    }
}
