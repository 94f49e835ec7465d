//! World plugin: spawns the arena walls stakes pin enemies against.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;

const HALF_W: f32 = 480.0;
const HALF_H: f32 = 320.0;
const THICKNESS: f32 = 30.0;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_arena);
}

/// Layers every wall uses. Stakes identify walls by the `World` membership.
#[inline]
pub fn wall_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::World, [Layer::Wielder, Layer::Enemy, Layer::Stake])
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);

    let mut spawn_wall = |name: &str, pos: Vec2, size: Vec2| {
        commands.spawn((
            Name::new(name.to_owned()),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers(),
            DespawnOnExit(GameState::InGame),
        ));
    };

    let horizontal = Vec2::new(HALF_W * 2.0 + THICKNESS * 2.0, THICKNESS);
    let vertical = Vec2::new(THICKNESS, HALF_H * 2.0);

    spawn_wall("WallTop", Vec2::new(0.0, HALF_H + THICKNESS * 0.5), horizontal);
    spawn_wall("WallBottom", Vec2::new(0.0, -HALF_H - THICKNESS * 0.5), horizontal);
    spawn_wall("WallLeft", Vec2::new(-HALF_W - THICKNESS * 0.5, 0.0), vertical);
    spawn_wall("WallRight", Vec2::new(HALF_W + THICKNESS * 0.5, 0.0), vertical);
}

#[cfg(test)]
mod tests;
