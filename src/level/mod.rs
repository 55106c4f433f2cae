use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::board::Board;
use crate::collision::{default_collisions, CollisionMap};
use crate::occupant::{Body, Ghost, Occupant, Player};
use crate::sprite::GhostColor;
use crate::types::{
    Direction, GhostView, LevelEvent, LevelSnapshot, MoveOutcome, OccupantId, PlayerView, Vec2,
};
use crate::world::World;

mod dispatch;
mod ghost_system;

/// Callbacks run after the move lock is released and may call back into the
/// level. When moves race, whichever caller is already delivering hands out
/// the other caller's events too, so `move_occupant` can return before its
/// own events have reached observers.
pub trait LevelObserver: Send + Sync {
    fn player_died(&self, player: OccupantId);
    fn level_completed(&self);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("board has no player spawn squares")]
    NoPlayerSpawn,
    #[error("square {0:?} does not accept this occupant")]
    Inaccessible(Vec2),
    #[error("unknown occupant {0:?}")]
    UnknownOccupant(OccupantId),
    #[error("occupant {0:?} is not on the board")]
    NotPlaced(OccupantId),
    #[error("occupant {0:?} is not a player")]
    NotAPlayer(OccupantId),
}

struct LevelState {
    world: World,
    collisions: CollisionMap<World>,
    players: Vec<OccupantId>,
    ghosts: Vec<OccupantId>,
    spawn_cursor: usize,
}

impl LevelState {
    fn next_spawn_point(&mut self) -> Result<Vec2, LevelError> {
        let spawns = self.world.board().player_spawns();
        if spawns.is_empty() {
            return Err(LevelError::NoPlayerSpawn);
        }
        let square = spawns[self.spawn_cursor % spawns.len()];
        self.spawn_cursor = (self.spawn_cursor + 1) % spawns.len();
        Ok(square)
    }

    fn all_players_dead(&self) -> bool {
        self.players
            .iter()
            .all(|id| !self.world.player(*id).is_some_and(Player::is_alive))
    }

    fn is_completed(&self) -> bool {
        if self.all_players_dead() {
            return false;
        }
        self.world.board().pellet_count() == 0
    }

    fn apply_move(&mut self, id: OccupantId, direction: Direction) -> Result<MoveOutcome, LevelError> {
        if self.is_completed() {
            return Ok(MoveOutcome::Frozen);
        }
        let occupant = self
            .world
            .occupant(id)
            .ok_or(LevelError::UnknownOccupant(id))?;
        let from = occupant.square().ok_or(LevelError::NotPlaced(id))?;
        let destination = self
            .world
            .board()
            .neighbour(from, direction)
            .ok_or(LevelError::NotPlaced(id))?;
        let mover = self
            .world
            .participant(id)
            .ok_or(LevelError::UnknownOccupant(id))?;

        let already_there: Vec<_> = self
            .world
            .participants_at(destination)
            .into_iter()
            .filter(|other| other.occupant_id() != Some(id))
            .collect();

        let moved = self.world.occupy(id, destination);
        if let Some(occupant) = self.world.occupant_mut(id) {
            occupant.set_direction(direction);
        }
        if !moved {
            return Ok(MoveOutcome::Blocked);
        }

        for other in already_there {
            self.collisions.handle(&mut self.world, mover, other);
        }
        debug_assert!(self.world.invariant());

        if self.is_completed() {
            self.world.push_event(LevelEvent::LevelCompleted);
        }
        Ok(MoveOutcome::Moved)
    }

    fn player_view(&self, id: OccupantId) -> Option<PlayerView> {
        let occupant = self.world.occupant(id)?;
        let player = occupant.as_player()?;
        let at = occupant.square()?;
        Some(PlayerView {
            id,
            x: at.x,
            y: at.y,
            dir: occupant.direction(),
            score: player.score(),
            alive: player.is_alive(),
            death_frame: player.death_animation().frame(),
        })
    }

    fn ghost_view(&self, id: OccupantId) -> Option<GhostView> {
        let occupant = self.world.occupant(id)?;
        let ghost = occupant.as_ghost()?;
        let at = occupant.square()?;
        Some(GhostView {
            id,
            x: at.x,
            y: at.y,
            dir: occupant.direction(),
            color: ghost.color(),
        })
    }
}

pub struct Level {
    state: Mutex<LevelState>,
    pending: Mutex<VecDeque<LevelEvent>>,
    dispatching: Mutex<()>,
    observers: RwLock<Vec<Arc<dyn LevelObserver>>>,
}

impl Level {
    pub fn new(board: Board) -> Self {
        Self::with_collisions(board, default_collisions())
    }

    pub fn with_collisions(mut board: Board, collisions: CollisionMap<World>) -> Self {
        if !board.is_connected() {
            board.connect_grid();
        }
        Self {
            state: Mutex::new(LevelState {
                world: World::new(board),
                collisions,
                players: Vec::new(),
                ghosts: Vec::new(),
                spawn_cursor: 0,
            }),
            pending: Mutex::new(VecDeque::new()),
            dispatching: Mutex::new(()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn register_player(&self, player: Player) -> Result<OccupantId, LevelError> {
        let mut state = self.state.lock();
        let at = state.next_spawn_point()?;
        let id = state
            .world
            .spawn(Body::Player(player), at)
            .ok_or(LevelError::Inaccessible(at))?;
        state.players.push(id);
        Ok(id)
    }

    pub fn add_ghost(&self, ghost: Ghost, at: Vec2) -> Result<OccupantId, LevelError> {
        let mut state = self.state.lock();
        let id = state
            .world
            .spawn(Body::Ghost(ghost), at)
            .ok_or(LevelError::Inaccessible(at))?;
        state.ghosts.push(id);
        Ok(id)
    }

    pub fn spawn_ghosts(&self) -> Vec<OccupantId> {
        let spawns = self.state.lock().world.board().ghost_spawns();
        spawns
            .into_iter()
            .enumerate()
            .filter_map(|(index, at)| self.add_ghost(Ghost::new(GhostColor::nth(index)), at).ok())
            .collect()
    }

    /// Facing changes even when the move is blocked; nothing moves once the
    /// level is completed.
    pub fn move_occupant(
        &self,
        id: OccupantId,
        direction: Direction,
    ) -> Result<MoveOutcome, LevelError> {
        let outcome = self.queue_move(id, direction);
        self.drain_events();
        outcome
    }

    /// Applies the move and queues its events without delivering them.
    /// Callers must follow up with `drain_events`.
    pub(crate) fn queue_move(
        &self,
        id: OccupantId,
        direction: Direction,
    ) -> Result<MoveOutcome, LevelError> {
        let mut state = self.state.lock();
        let outcome = state.apply_move(id, direction);
        let events = state.world.take_events();
        self.enqueue(events);
        outcome
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().is_completed()
    }

    pub fn remaining_pellets(&self) -> usize {
        self.state.lock().world.board().pellet_count()
    }

    pub fn players(&self) -> Vec<OccupantId> {
        self.state.lock().players.clone()
    }

    pub fn ghosts(&self) -> Vec<OccupantId> {
        self.state.lock().ghosts.clone()
    }

    pub fn player_view(&self, id: OccupantId) -> Option<PlayerView> {
        self.state.lock().player_view(id)
    }

    pub fn occupant(&self, id: OccupantId) -> Option<Occupant> {
        self.state.lock().world.occupant(id).cloned()
    }

    pub fn pellet_at(&self, at: Vec2) -> Option<u32> {
        self.state
            .lock()
            .world
            .board()
            .pellet(at)
            .map(|pellet| pellet.points())
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        let state = self.state.lock();
        let board = state.world.board();
        LevelSnapshot {
            width: board.width(),
            height: board.height(),
            tiles: board.tile_rows(),
            completed: state.is_completed(),
            remaining_pellets: board.pellet_count(),
            players: state
                .players
                .iter()
                .filter_map(|id| state.player_view(*id))
                .collect(),
            ghosts: state
                .ghosts
                .iter()
                .filter_map(|id| state.ghost_view(*id))
                .collect(),
        }
    }

    /// Forces the player alive and steps it one square west with no
    /// collision rules. Returns whether the player moved.
    pub fn revive_player(&self, id: OccupantId) -> Result<bool, LevelError> {
        let mut state = self.state.lock();
        let world = &mut state.world;
        let here = world
            .occupant(id)
            .ok_or(LevelError::UnknownOccupant(id))?
            .square()
            .ok_or(LevelError::NotPlaced(id))?;
        world
            .player_mut(id)
            .ok_or(LevelError::NotAPlayer(id))?
            .set_alive(true);
        let moved = world
            .board()
            .neighbour(here, Direction::West)
            .is_some_and(|west| world.occupy(id, west));
        Ok(moved)
    }

    pub fn tick_animations(&self) {
        let mut state = self.state.lock();
        let roster = state.players.clone();
        for id in roster {
            if let Some(player) = state.world.player_mut(id) {
                if !player.is_alive() {
                    player.death_animation_mut().advance();
                }
            }
        }
    }
}
