use avian2d::prelude::*;
use bevy::prelude::*;

use super::template::TemplateId;

/// Marker on every entity a pool constructed, leased or not.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledProjectile;

/// Lifecycle of one stake.
///
/// ```text
/// Inactive ──spawn──> Flying ──enemy (Stick) / wall──> Stuck ──recall──> Returning ──> Inactive
///                        │                               ^
///                        └──enemy (Impale)──> Impaling ──┘ wall
/// ```
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    /// Sitting in a pool free list.
    #[default]
    Inactive,
    Flying,
    /// Flying with at least one enemy on the shaft.
    Impaling,
    Stuck,
    Returning,
}

impl ProjectileState {
    /// States in which a contact is resolved by the collision behaviour.
    #[inline]
    pub fn in_flight(self) -> bool {
        matches!(self, Self::Flying | Self::Impaling)
    }

    /// States from which a recall may start.
    #[inline]
    pub fn recallable(self) -> bool {
        matches!(self, Self::Stuck | Self::Impaling)
    }
}

/// Per-flight data, reset every time the instance leaves its pool.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub template: TemplateId,
    pub wielder: Option<Entity>,
    pub lifetime: Timer,
    /// Enemy the stake is stuck in, if any.
    pub host: Option<Entity>,
    /// Set once the impale acceleration has been applied this flight.
    pub accelerated: bool,
}

impl Projectile {
    pub fn launch(template: TemplateId, wielder: Option<Entity>, lifetime_secs: f32) -> Self {
        Self {
            template,
            wielder,
            lifetime: Timer::from_seconds(lifetime_secs.max(0.0), TimerMode::Once),
            host: None,
            accelerated: false,
        }
    }
}

/// A stake riding along with the enemy it is stuck in.
///
/// `offset` is the stake's world-space offset from the host captured at the moment of impact.
#[derive(Component, Debug, Clone, Copy)]
pub struct StuckTo {
    pub target: Entity,
    pub offset: Vec2,
}

/// Marker on an enemy currently on a stake's shaft.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impaled {
    pub by: Entity,
}

/// Physics state of an enemy captured before a stake took control of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyBackup {
    pub body: RigidBody,
    pub velocity: Vec2,
    pub parent: Option<Entity>,
}

/// How an enemy's motion resumes when a stake lets go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Stays where it sits with zero velocity (wall pin, recall).
    Pinned,
    /// Picks up the velocity it had before it was captured (aborted flight).
    Resume,
}
