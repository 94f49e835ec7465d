use bevy::prelude::*;

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Measured half-size of an enemy's body, used to space it on a stake.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub half: Vec2,
}

impl Extent {
    pub fn square(side: f32) -> Self {
        Self {
            half: Vec2::splat(side * 0.5),
        }
    }
}

/// Combat bookkeeping for one enemy: hit stacks, stun, execution.
#[derive(Component, Debug, Clone)]
pub struct EnemyController {
    pub hit_stacks: u32,
    /// Stacks at which the enemy becomes groggy (executable).
    pub groggy_at: u32,
    pub stun: Option<Timer>,
    pub executed: bool,
    pub last_hit_by: Option<Entity>,
}

impl EnemyController {
    pub fn new(groggy_at: u32) -> Self {
        Self {
            hit_stacks: 0,
            groggy_at,
            stun: None,
            executed: false,
            last_hit_by: None,
        }
    }

    pub fn register_hit(&mut self, stacks: u32, source: Entity) {
        self.hit_stacks = self.hit_stacks.saturating_add(stacks);
        self.last_hit_by = Some(source);
    }

    /// Remove up to `count` stacks, returning how many were actually removed.
    pub fn consume_stacks(&mut self, count: u32) -> u32 {
        let taken = count.min(self.hit_stacks);
        self.hit_stacks -= taken;
        taken
    }

    #[inline]
    pub fn is_groggy(&self) -> bool {
        !self.executed && self.groggy_at > 0 && self.hit_stacks >= self.groggy_at
    }

    /// Longest stun wins; a shorter stun never cuts a running one short.
    pub fn apply_stun(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        let remaining = self.stun.as_ref().map_or(0.0, |t| t.remaining_secs());
        if duration > remaining {
            self.stun = Some(Timer::from_seconds(duration, TimerMode::Once));
        }
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn mark_executed(&mut self) {
        self.executed = true;
    }
}

/// Timed slow from a binding stake. `slow` is the fraction of speed bled off per second.
#[derive(Component, Debug, Clone)]
pub struct Bound {
    pub timer: Timer,
    pub slow: f32,
}

impl Bound {
    pub fn new(duration: f32, slow: f32) -> Self {
        Self {
            timer: Timer::from_seconds(duration.max(0.0), TimerMode::Once),
            slow: slow.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn speed_multiplier(&self) -> f32 {
        1.0 - self.slow
    }

    /// Velocity scale for one step of `dt` seconds.
    #[inline]
    pub fn step_scale(&self, dt: f32) -> f32 {
        self.speed_multiplier().powf(dt)
    }
}
