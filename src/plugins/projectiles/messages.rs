//! Buffered requests into, and feedback out of, the stake systems.
//!
//! Producers only write intent. The consumers that own the mutation are:
//! - `SpawnProjectile`  -> `allocator::allocate_from_pools`
//! - `DespawnProjectile` -> `commit::commit_despawns`
//! - `ThrowRequest`     -> `request::throw_stakes`
//! - `RecallRequest`    -> `retrieval::start_recalls`
//! - `ForceDetach`      -> `lifecycle::force_detach`
//! - `ReleaseImpaled`   -> `lifecycle::release_impaled`
//!
//! `HitEffect` goes the other way: fire-and-forget feedback for whoever draws particles or
//! shakes the camera. Nothing in here reads it back.

use bevy::prelude::*;

use super::template::TemplateId;

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnProjectile {
    pub template: Option<TemplateId>,
    pub pos: Vec2,
    /// Facing, radians. The stake flies along this angle.
    pub rotation: f32,
    pub tint: Option<Color>,
    pub owner: Option<Entity>,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DespawnProjectile(pub Entity);

#[derive(Message, Clone, Copy, Debug)]
pub struct ThrowRequest {
    pub wielder: Entity,
    pub template: TemplateId,
    pub direction: Vec2,
    pub tint: Option<Color>,
}

/// Call back every recallable stake thrown by `wielder`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecallRequest {
    pub wielder: Entity,
}

/// Drop whatever the stake holds: its host enemy and every impaled enemy.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForceDetach(pub Entity);

/// Take one enemy off a stake's shaft and let it go where it sits.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseImpaled {
    pub stake: Entity,
    pub enemy: Entity,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct HitEffect {
    pub source: Entity,
    pub hit_stop: f32,
    pub shake: f32,
    pub position: Vec2,
}
