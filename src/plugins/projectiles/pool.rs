//! Per-template object pool.
//!
//! # Invariants
//! Inactive instances (in `free`) must be:
//! - hidden
//! - velocity = 0
//! - collide with nothing (filters empty)
//! - `ProjectileState::Inactive`
//!
//! Activation and deactivation overwrite component values instead of toggling
//! `RigidBodyDisabled` / `ColliderDisabled` markers.
//!
//! Every instance is either in `free` or in `leased`, never both. Releasing something that is
//! already free is refused, so the free list never holds an entity twice.
//!
//! Only [`PoolRegistry`](super::registry::PoolRegistry) may call `acquire` / `release`; the
//! methods are crate-private for that reason.

use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use thiserror::Error;

use super::collision::CollisionBehavior;
use super::components::{PooledProjectile, ProjectileState, StuckTo};
use super::impale::ImpaleStack;
use super::retrieval::ReturnFlight;
use super::template::{ProjectileTemplate, TemplateId};
use crate::common::layers::Layer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(pub(crate) u32);

impl PoolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Back-reference tag: which pool leased this instance.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PooledFrom(pub PoolId);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("instance {0} carries no pool tag")]
    Untagged(Entity),
    #[error("instance {instance} belongs to pool {owner:?}, not {releasing:?}")]
    ForeignInstance {
        instance: Entity,
        owner: PoolId,
        releasing: PoolId,
    },
    #[error("instance {instance} is already free in pool {pool:?}")]
    AlreadyFree { instance: Entity, pool: PoolId },
    #[error("instance {instance} is tagged with unknown pool {pool:?}")]
    UnknownPool { instance: Entity, pool: PoolId },
    #[error("template {0:?} is not registered")]
    UnknownTemplate(TemplateId),
}

#[inline]
pub fn active_stake_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Stake, [Layer::World, Layer::Enemy])
}

/// “Disabled” without structural changes: empty filters means we collide with nothing.
#[inline]
pub fn inactive_stake_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Stake, [] as [Layer; 0])
}

#[inline]
pub(crate) fn stack_for(template: &ProjectileTemplate) -> ImpaleStack {
    match &template.collision {
        CollisionBehavior::Impale(tuning) => ImpaleStack::new(tuning.max_count, tuning.spacing),
        CollisionBehavior::Stick => ImpaleStack::new(0, 0.0),
    }
}

#[derive(Debug)]
pub struct ProjectilePool {
    id: PoolId,
    template: TemplateId,
    free: Vec<Entity>,
    leased: HashSet<Entity>,
    constructed: HashSet<Entity>,
}

impl ProjectilePool {
    pub(crate) fn new(id: PoolId, template: TemplateId) -> Self {
        Self {
            id,
            template,
            free: Vec::new(),
            leased: HashSet::default(),
            constructed: HashSet::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> PoolId {
        self.id
    }

    #[inline]
    pub fn template(&self) -> TemplateId {
        self.template
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn leased(&self) -> usize {
        self.leased.len()
    }

    #[inline]
    pub fn is_leased(&self, instance: Entity) -> bool {
        self.leased.contains(&instance)
    }

    /// Total entities this pool ever constructed.
    #[inline]
    pub fn constructed(&self) -> usize {
        self.constructed.len()
    }

    /// Pre-spawn `count` inactive instances.
    pub(crate) fn prewarm(&mut self, commands: &mut Commands, template: &ProjectileTemplate, count: usize) {
        self.free.reserve(count);
        for _ in 0..count {
            let e = self.construct(commands, template);
            self.free.push(e);
        }
    }

    fn construct(&mut self, commands: &mut Commands, template: &ProjectileTemplate) -> Entity {
        let e = commands
            .spawn((
                Name::new(format!("{}(Pooled)", template.name)),
                PooledProjectile,
                ProjectileState::Inactive,
                stack_for(template),
                Sprite {
                    color: template.color,
                    custom_size: Some(Vec2::new(template.tip_offset * 2.0, template.radius * 2.0)),
                    ..default()
                },
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::Hidden,
                RigidBody::Dynamic,
                Collider::circle(template.radius),
                Sensor,
                inactive_stake_layers(),
                LinearVelocity(Vec2::ZERO),
                // Inactive stakes won't collide anyway because layers are empty.
                CollisionEventsEnabled,
            ))
            .id();
        self.constructed.insert(e);
        e
    }

    /// Wake a free instance (or construct one) at `pos`, facing `rotation` radians.
    pub(crate) fn acquire(
        &mut self,
        commands: &mut Commands,
        template: &ProjectileTemplate,
        pos: Vec2,
        rotation: f32,
    ) -> Entity {
        let e = match self.free.pop() {
            Some(e) => e,
            None => self.construct(commands, template),
        };

        let dir = Vec2::from_angle(rotation);
        commands.entity(e).insert((
            Visibility::Visible,
            Transform::from_translation(pos.extend(2.0)).with_rotation(Quat::from_rotation_z(rotation)),
            LinearVelocity(dir * template.speed),
            ProjectileState::Flying,
            stack_for(template),
            active_stake_layers(),
        ));

        self.leased.insert(e);
        e
    }

    /// Deactivate `instance` and put it back on the free list.
    ///
    /// Refused when the tag names another pool, when this pool never built `instance`, or when
    /// `instance` is already free. The free list is never scanned.
    pub(crate) fn release(
        &mut self,
        commands: &mut Commands,
        instance: Entity,
        tag: Option<PooledFrom>,
    ) -> Result<(), PoolError> {
        let PooledFrom(owner) = tag.ok_or(PoolError::Untagged(instance))?;
        if owner != self.id || !self.constructed.contains(&instance) {
            return Err(PoolError::ForeignInstance {
                instance,
                owner,
                releasing: self.id,
            });
        }
        if !self.leased.remove(&instance) {
            return Err(PoolError::AlreadyFree {
                instance,
                pool: self.id,
            });
        }

        commands
            .entity(instance)
            .insert((
                ProjectileState::Inactive,
                Visibility::Hidden,
                LinearVelocity(Vec2::ZERO),
                inactive_stake_layers(),
            ))
            .remove::<(StuckTo, ReturnFlight)>();

        self.free.push(instance);
        Ok(())
    }
}
