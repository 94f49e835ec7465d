//! One skewer's whole life through the public systems: throw, impale three, bounce the fourth,
//! pin them on a wall, recall, return to the pool.

mod common;

use avian2d::prelude::*;
use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;
use stake_combat::common::health::Health;
use stake_combat::common::layers::Layer;
use stake_combat::common::tunables::Tunables;
use stake_combat::plugins::enemies::{Enemy, EnemyController, Extent};
use stake_combat::plugins::player::Wielder;
use stake_combat::plugins::projectiles::collision::{self, CollisionBehavior, ImpaleTuning};
use stake_combat::plugins::projectiles::components::{Impaled, ProjectileState};
use stake_combat::plugins::projectiles::impale::ImpaleStack;
use stake_combat::plugins::projectiles::messages::{RecallRequest, ThrowRequest};
use stake_combat::plugins::projectiles::registry::PoolRegistry;
use stake_combat::plugins::projectiles::retrieval::{self, ReturnFlight};
use stake_combat::plugins::projectiles::template::{ProjectileTemplate, ProjectileTemplates};
use stake_combat::plugins::projectiles::{allocator, commit, request};

fn touch(world: &mut World, a: Entity, b: Entity) {
    world.write_message(CollisionStart {
        collider1: a,
        collider2: b,
        body1: Some(a),
        body2: Some(b),
    });
}

#[test]
fn skewer_lifecycle() {
    let mut world = common::world_with_messages();

    let mut templates = ProjectileTemplates::default();
    let skewer = templates.add(ProjectileTemplate {
        name: "Skewer".into(),
        tip_offset: 0.5,
        pool_size: Some(2),
        collision: CollisionBehavior::Impale(ImpaleTuning {
            max_count: 3,
            spacing: 0.3,
            ..default()
        }),
        ..default()
    });
    world.insert_resource(templates);
    world.insert_resource(Tunables::default());
    world.insert_resource(PoolRegistry::new(8));
    common::set_fixed_delta(&mut world, 1.0 / 64.0);

    // Pre-warm so the first throw reuses an instance.
    {
        let mut registry = world.remove_resource::<PoolRegistry>().unwrap();
        let templates = world.remove_resource::<ProjectileTemplates>().unwrap();
        let mut queue = CommandQueue::default();
        registry
            .get_or_create_pool(&mut Commands::new(&mut queue, &world), &templates, skewer, None)
            .unwrap();
        queue.apply(&mut world);
        world.insert_resource(registry);
        world.insert_resource(templates);
    }

    let wielder = world
        .spawn((Wielder::new(1), Health::new(10.0), Transform::from_xyz(-18.0, 0.0, 1.0)))
        .id();

    world.write_message(ThrowRequest {
        wielder,
        template: skewer,
        direction: Vec2::X,
        tint: None,
    });
    common::run_once(&mut world, request::throw_stakes);
    common::run_once(&mut world, allocator::allocate_from_pools);

    let stake = world
        .query::<(Entity, &ProjectileState)>()
        .iter(&world)
        .find(|(_, s)| **s == ProjectileState::Flying)
        .map(|(e, _)| e)
        .unwrap();
    assert_eq!(world.get::<Wielder>(wielder).unwrap().ammo, 0);
    assert_eq!(world.get::<Transform>(stake).unwrap().translation.truncate(), Vec2::ZERO);

    let enemies: Vec<Entity> = (0..4)
        .map(|i| {
            world
                .spawn((
                    Enemy,
                    Health::new(10.0),
                    EnemyController::new(5),
                    Extent::square(1.0),
                    Transform::from_xyz(1.0 + i as f32, 0.0, 1.0),
                    RigidBody::Dynamic,
                    LinearVelocity::ZERO,
                ))
                .id()
        })
        .collect();
    for &e in &enemies {
        touch(&mut world, stake, e);
    }
    common::run_once(&mut world, collision::process_stake_collisions);
    common::clear::<CollisionStart>(&mut world);

    let stack = world.get::<ImpaleStack>(stake).unwrap();
    assert_eq!(stack.len(), 3);
    let xs: Vec<f32> = stack.entries().iter().map(|e| e.local.x).collect();
    for (x, expected) in xs.iter().zip([-2.6, -1.3, 0.0]) {
        assert!((x - expected).abs() < 1e-4);
    }
    assert!(world.get::<Impaled>(enemies[3]).is_none());

    let wall = world
        .spawn(CollisionLayers::new(Layer::World, [Layer::Stake]))
        .id();
    touch(&mut world, stake, wall);
    common::run_once(&mut world, collision::process_stake_collisions);
    common::clear::<CollisionStart>(&mut world);

    assert_eq!(*world.get::<ProjectileState>(stake).unwrap(), ProjectileState::Stuck);
    for (&e, x) in enemies[..3].iter().zip([-0.2, -0.2, 0.0]) {
        assert!(world.get::<Impaled>(e).is_none());
        assert_eq!(*world.get::<RigidBody>(e).unwrap(), RigidBody::Dynamic);
        assert!(world.get::<EnemyController>(e).unwrap().is_stunned());
        // Pinned where the wall clamp left them.
        assert!((world.get::<Transform>(e).unwrap().translation.x - x).abs() < 1e-4);
    }

    world.write_message(RecallRequest { wielder });
    common::run_once(&mut world, retrieval::start_recalls);
    assert_eq!(*world.get::<ProjectileState>(stake).unwrap(), ProjectileState::Returning);

    common::run_once(&mut world, retrieval::drive_returns);
    assert!(world.get::<ReturnFlight>(stake).unwrap().outcome.is_some());
    common::run_once(&mut world, retrieval::conclude_returns);
    common::run_once(&mut world, commit::commit_despawns);

    assert_eq!(world.get::<Wielder>(wielder).unwrap().ammo, 1);
    assert_eq!(*world.get::<ProjectileState>(stake).unwrap(), ProjectileState::Inactive);
    let pool = world.resource::<PoolRegistry>().pool_for(skewer).unwrap();
    assert_eq!(pool.leased(), 0);
    assert_eq!(pool.free_len(), 2);
    assert_eq!(pool.constructed(), 2);
}
