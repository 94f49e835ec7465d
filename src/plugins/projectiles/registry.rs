//! Process-wide pool directory.
//!
//! # Ownership
//! The registry is the single owner of every [`ProjectilePool`]. Outside code reaches the pools
//! only through three entry points:
//! - `get_or_create_pool`: idempotent per [`TemplateId`]
//! - `spawn`: pool lookup + acquire + back-reference tag + optional tint
//! - `despawn`: tag lookup + release, degrading to plain destruction (or to a no-op for an
//!   instance that is already back in its pool)
//!
//! Systems normally don't call these directly either; they write `SpawnProjectile` /
//! `DespawnProjectile` messages and the allocator / commit systems are the only writers.
//!
//! The resource is inserted by `ProjectilesPlugin::build`; [`teardown_pools`] empties it and
//! destroys every pooled entity when the game state is left.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use super::components::{PooledProjectile, Projectile};
use super::messages::SpawnProjectile;
use super::pool::{PoolError, PoolId, PooledFrom, ProjectilePool};
use super::template::{ProjectileTemplates, TemplateId};

#[derive(Resource, Debug)]
pub struct PoolRegistry {
    pools: Vec<ProjectilePool>,
    by_template: HashMap<TemplateId, PoolId>,
    default_size: usize,
}

impl PoolRegistry {
    pub fn new(default_size: usize) -> Self {
        Self {
            pools: Vec::new(),
            by_template: HashMap::default(),
            default_size,
        }
    }

    #[inline]
    pub fn pool(&self, id: PoolId) -> Option<&ProjectilePool> {
        self.pools.get(id.index())
    }

    #[inline]
    pub fn pool_for(&self, template: TemplateId) -> Option<&ProjectilePool> {
        self.by_template.get(&template).and_then(|id| self.pool(*id))
    }

    #[inline]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The pool for `template`, creating (and pre-warming) it on first use.
    ///
    /// `initial_size` falls back to the template's own pool size, then the registry default.
    pub fn get_or_create_pool(
        &mut self,
        commands: &mut Commands,
        templates: &ProjectileTemplates,
        template: TemplateId,
        initial_size: Option<usize>,
    ) -> Result<PoolId, PoolError> {
        if let Some(id) = self.by_template.get(&template) {
            return Ok(*id);
        }

        let def = templates
            .get(template)
            .ok_or(PoolError::UnknownTemplate(template))?;

        let id = PoolId(self.pools.len() as u32);
        let size = initial_size.or(def.pool_size).unwrap_or(self.default_size);

        let mut pool = ProjectilePool::new(id, template);
        pool.prewarm(commands, def, size);
        info!("created pool {id:?} for '{}' ({size} pre-spawned)", def.name);

        self.pools.push(pool);
        self.by_template.insert(template, id);
        Ok(id)
    }

    /// Lease a stake for `req`. Returns `None` (after logging) if the template is absent.
    pub fn spawn(
        &mut self,
        commands: &mut Commands,
        templates: &ProjectileTemplates,
        req: &SpawnProjectile,
    ) -> Option<Entity> {
        let Some(template_id) = req.template else {
            error!("spawn requested without a template");
            return None;
        };
        let Some(def) = templates.get(template_id) else {
            error!("{}", PoolError::UnknownTemplate(template_id));
            return None;
        };

        let pool_id = match self.get_or_create_pool(commands, templates, template_id, None) {
            Ok(id) => id,
            Err(err) => {
                error!("{err}");
                return None;
            }
        };

        let e = self.pools[pool_id.index()].acquire(commands, def, req.pos, req.rotation);

        commands.entity(e).insert((
            PooledFrom(pool_id),
            Projectile::launch(template_id, req.owner, def.lifetime_secs),
            Sprite {
                color: req.tint.unwrap_or(def.color),
                custom_size: Some(Vec2::new(def.tip_offset * 2.0, def.radius * 2.0)),
                ..default()
            },
        ));

        Some(e)
    }

    /// Return `instance` to the pool named by its tag.
    ///
    /// Never fails: an untagged or foreign instance is logged and destroyed. A repeated release
    /// of an instance that is already free only logs.
    pub fn despawn(&mut self, commands: &mut Commands, instance: Entity, tag: Option<PooledFrom>) {
        let result = match tag {
            None => Err(PoolError::Untagged(instance)),
            Some(PooledFrom(pool)) => match self.pools.get_mut(pool.index()) {
                Some(p) => p.release(commands, instance, tag),
                None => Err(PoolError::UnknownPool { instance, pool }),
            },
        };

        match result {
            Ok(()) => {}
            Err(err @ PoolError::AlreadyFree { .. }) => debug!("{err}; ignoring"),
            Err(err) => {
                warn!("{err}; destroying instead of pooling");
                commands.entity(instance).try_despawn();
            }
        }
    }

    /// Forget all pools. The caller despawns the pooled entities.
    pub fn clear(&mut self) {
        self.pools.clear();
        self.by_template.clear();
    }
}

/// Session teardown: destroy every pooled stake, leased or free, and reset the directory.
pub fn teardown_pools(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    q: Query<Entity, With<PooledProjectile>>,
) {
    for e in &q {
        commands.entity(e).try_despawn();
    }
    registry.clear();
}
