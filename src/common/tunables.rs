//! Tunable global constants.
//!
//! Per-stake numbers live on `ProjectileTemplate`; this resource only holds the
//! values shared by every template.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    /// Pre-spawned instances for a template that does not pick its own pool size.
    pub default_pool_size: usize,
    /// A returning stake closer than this to its recipient has arrived.
    pub catch_radius: f32,
    /// Distance in front of the wielder where thrown stakes appear.
    pub muzzle_offset: f32,
    pub tether_thickness: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            default_pool_size: 16,
            catch_radius: 12.0,
            muzzle_offset: 18.0,
            tether_thickness: 2.0,
        }
    }
}
