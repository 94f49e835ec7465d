//! Authoring-time stake templates.
//!
//! A template is immutable once added to [`ProjectileTemplates`]. Every stake instance carries
//! only the [`TemplateId`] it was spawned from and looks the numbers up on demand.
//!
//! Identity is the id handed out by `add`, never the field values: two templates that compare
//! equal field-by-field still get two ids, and therefore two pools.

use bevy::prelude::*;

use super::collision::CollisionBehavior;
use super::retrieval::RetrievalBehavior;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u32);

impl TemplateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileTemplate {
    pub name: String,
    pub damage: f32,
    pub speed: f32,
    pub lifetime_secs: f32,
    pub retrievable: bool,
    pub radius: f32,
    /// Local +X distance from the stake origin to its tip (the contact point).
    pub tip_offset: f32,
    pub color: Color,
    /// Pre-spawn count for this template's pool. `None` uses `Tunables::default_pool_size`.
    pub pool_size: Option<usize>,

    pub hit_stop: f32,
    pub shake: f32,

    pub return_speed: f32,
    /// Fraction of `damage` dealt to enemies struck on the way back.
    pub return_damage_ratio: f32,
    pub max_return_secs: f32,
    pub execution_heal: f32,
    pub execution_ammo_reward: u32,

    pub collision: CollisionBehavior,
    pub retrieval: RetrievalBehavior,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self {
            name: "Stake".into(),
            damage: 2.0,
            speed: 900.0,
            lifetime_secs: 1.5,
            retrievable: true,
            radius: 4.0,
            tip_offset: 10.0,
            color: Color::srgb(0.85, 0.75, 0.55),
            pool_size: None,
            hit_stop: 0.04,
            shake: 0.2,
            return_speed: 1400.0,
            return_damage_ratio: 0.5,
            max_return_secs: 1.0,
            execution_heal: 1.0,
            execution_ammo_reward: 1,
            collision: CollisionBehavior::Stick,
            retrieval: RetrievalBehavior::Simple,
        }
    }
}

/// Registry of every template the game knows about.
#[derive(Resource, Debug, Default, Clone)]
pub struct ProjectileTemplates {
    templates: Vec<ProjectileTemplate>,
}

impl ProjectileTemplates {
    pub fn add(&mut self, template: ProjectileTemplate) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(template);
        id
    }

    #[inline]
    pub fn get(&self, id: TemplateId) -> Option<&ProjectileTemplate> {
        self.templates.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The stock stakes.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Arsenal {
    pub stake: TemplateId,
    pub skewer: TemplateId,
    pub binder: TemplateId,
}

impl Arsenal {
    pub fn register(templates: &mut ProjectileTemplates) -> Self {
        use super::collision::ImpaleTuning;
        use super::retrieval::{BindingTuning, PullTuning};

        let stake = templates.add(ProjectileTemplate::default());

        let skewer = templates.add(ProjectileTemplate {
            name: "Skewer".into(),
            damage: 1.0,
            speed: 780.0,
            color: Color::srgb(0.7, 0.8, 0.95),
            collision: CollisionBehavior::Impale(ImpaleTuning::default()),
            retrieval: RetrievalBehavior::Pull(PullTuning::default()),
            ..default()
        });

        let binder = templates.add(ProjectileTemplate {
            name: "Binder".into(),
            damage: 1.5,
            color: Color::srgb(0.6, 0.95, 0.6),
            retrieval: RetrievalBehavior::Binding(BindingTuning::default()),
            ..default()
        });

        Self { stake, skewer, binder }
    }
}
