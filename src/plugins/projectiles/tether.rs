//! The visible line between a returning stake and its wielder.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use super::components::Projectile;
use super::retrieval::ReturnFlight;
use crate::common::state::GameState;

const LINE_Z: f32 = 1.5;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TetherLine {
    pub owner: Entity,
}

/// Transform that stretches a unit-length sprite from `from` to `to`.
pub fn span_transform(from: Vec2, to: Vec2, z: f32) -> Transform {
    let d = to - from;
    let len = d.length();
    let angle = if len > f32::EPSILON { d.to_angle() } else { 0.0 };

    Transform {
        translation: ((from + to) * 0.5).extend(z),
        rotation: Quat::from_rotation_z(angle),
        scale: Vec3::new(len, 1.0, 1.0),
    }
}

pub fn spawn_line(
    commands: &mut Commands,
    owner: Entity,
    from: Vec2,
    to: Vec2,
    color: Color,
    thickness: f32,
) -> Entity {
    commands
        .spawn((
            Name::new("TetherLine"),
            TetherLine { owner },
            Sprite {
                color,
                custom_size: Some(Vec2::new(1.0, thickness)),
                ..default()
            },
            span_transform(from, to, LINE_Z),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

pub fn update_tether_lines(
    mut q_lines: Query<(&TetherLine, &mut Transform), Without<Projectile>>,
    q_flights: Query<(&Transform, &ReturnFlight), With<Projectile>>,
    q_anchors: Query<&Transform, (Without<Projectile>, Without<TetherLine>)>,
) {
    for (line, mut tf) in &mut q_lines {
        let Ok((stake_tf, flight)) = q_flights.get(line.owner) else {
            continue;
        };
        let Ok(anchor) = q_anchors.get(flight.recipient) else {
            continue;
        };
        *tf = span_transform(
            stake_tf.translation.truncate(),
            anchor.translation.truncate(),
            LINE_Z,
        );
    }
}

/// Lines whose stake stopped returning (or vanished) have nothing left to draw.
pub fn reap_orphan_lines(
    mut commands: Commands,
    q_lines: Query<(Entity, &TetherLine)>,
    q_flights: Query<&ReturnFlight>,
) {
    for (e, line) in &q_lines {
        let owned = q_flights
            .get(line.owner)
            .is_ok_and(|f| f.line == Some(e) && f.outcome.is_none());
        if !owned {
            commands.entity(e).try_despawn();
        }
    }
}
