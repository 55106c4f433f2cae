use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{LevelEvent, OccupantId, Vec2};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Ghost,
    Pellet,
}

/// Registration keys: concrete kinds plus the groups they fall into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollisionKey {
    Player,
    Ghost,
    Pellet,
    Mover,
    Any,
}

impl EntityKind {
    pub fn ancestry(self) -> &'static [CollisionKey] {
        match self {
            Self::Player => &[CollisionKey::Player, CollisionKey::Mover, CollisionKey::Any],
            Self::Ghost => &[CollisionKey::Ghost, CollisionKey::Mover, CollisionKey::Any],
            Self::Pellet => &[CollisionKey::Pellet, CollisionKey::Any],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Occupant(OccupantId),
    Pellet(Vec2),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Participant {
    pub kind: EntityKind,
    pub entity: Entity,
}

impl Participant {
    pub fn occupant(kind: EntityKind, id: OccupantId) -> Self {
        Self {
            kind,
            entity: Entity::Occupant(id),
        }
    }

    pub fn pellet(at: Vec2) -> Self {
        Self {
            kind: EntityKind::Pellet,
            entity: Entity::Pellet(at),
        }
    }

    pub fn occupant_id(&self) -> Option<OccupantId> {
        match self.entity {
            Entity::Occupant(id) => Some(id),
            Entity::Pellet(_) => None,
        }
    }
}

pub type CollisionHandler<S> = Arc<dyn Fn(&mut S, Participant, Participant) + Send + Sync>;

pub struct CollisionMap<S> {
    handlers: HashMap<CollisionKey, HashMap<CollisionKey, CollisionHandler<S>>>,
}

impl<S: 'static> Default for CollisionMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> CollisionMap<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The reversed pair gets the same handler with arguments swapped back.
    pub fn on_collision<F>(&mut self, collider: CollisionKey, collidee: CollisionKey, handler: F)
    where
        F: Fn(&mut S, Participant, Participant) + Send + Sync + 'static,
    {
        self.on_collision_with(collider, collidee, true, handler);
    }

    pub fn on_collision_with<F>(
        &mut self,
        collider: CollisionKey,
        collidee: CollisionKey,
        symmetric: bool,
        handler: F,
    ) where
        F: Fn(&mut S, Participant, Participant) + Send + Sync + 'static,
    {
        let handler: CollisionHandler<S> = Arc::new(handler);
        if symmetric {
            let forward = Arc::clone(&handler);
            let inverse: CollisionHandler<S> =
                Arc::new(move |scene: &mut S, collider: Participant, collidee: Participant| {
                    forward(scene, collidee, collider)
                });
            self.add_handler(collidee, collider, inverse);
        }
        self.add_handler(collider, collidee, handler);
    }

    fn add_handler(
        &mut self,
        collider: CollisionKey,
        collidee: CollisionKey,
        handler: CollisionHandler<S>,
    ) {
        self.handlers
            .entry(collider)
            .or_default()
            .insert(collidee, handler);
    }

    pub fn resolve(
        &self,
        collider: EntityKind,
        collidee: EntityKind,
    ) -> Option<(CollisionKey, CollisionKey)> {
        let (collider_key, row) = collider
            .ancestry()
            .iter()
            .find_map(|key| self.handlers.get(key).map(|row| (*key, row)))?;
        let collidee_key = collidee
            .ancestry()
            .iter()
            .copied()
            .find(|key| row.contains_key(key))?;
        Some((collider_key, collidee_key))
    }

    pub fn handle(&self, scene: &mut S, collider: Participant, collidee: Participant) -> bool {
        let Some((collider_key, collidee_key)) = self.resolve(collider.kind, collidee.kind) else {
            return false;
        };
        let Some(handler) = self
            .handlers
            .get(&collider_key)
            .and_then(|row| row.get(&collidee_key))
        else {
            return false;
        };
        handler(scene, collider, collidee);
        true
    }
}

pub fn player_versus_ghost(world: &mut World, player: Participant, _ghost: Participant) {
    let Some(id) = player.occupant_id() else {
        return;
    };
    let Some(state) = world.player_mut(id) else {
        return;
    };
    if !state.is_alive() {
        return;
    }
    state.set_alive(false);
    world.push_event(LevelEvent::PlayerDied { player: id });
}

pub fn player_versus_pellet(world: &mut World, player: Participant, pellet: Participant) {
    let (Some(id), Entity::Pellet(at)) = (player.occupant_id(), pellet.entity) else {
        return;
    };
    if world.player(id).is_none() {
        return;
    }
    let Some(eaten) = world.board_mut().remove_pellet(at) else {
        return;
    };
    if let Some(state) = world.player_mut(id) {
        state.add_points(eaten.points());
    }
}

pub fn default_collisions() -> CollisionMap<World> {
    let mut map = CollisionMap::new();
    map.on_collision(CollisionKey::Player, CollisionKey::Ghost, player_versus_ghost);
    map.on_collision(CollisionKey::Player, CollisionKey::Pellet, player_versus_pellet);
    map
}
