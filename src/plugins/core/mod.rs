//! Core plugin: global tunables and the backdrop colour.
//!
//! Registered first: physics reads `Tunables` while it is being built.

use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    // Keep tunables an embedding app inserted before us.
    app.init_resource::<Tunables>();
    app.insert_resource(ClearColor(Color::srgb(0.06, 0.05, 0.08)));
}

#[cfg(test)]
mod tests;
