use rand::Rng;

use crate::board::Board;
use crate::collision::EntityKind;
use crate::sprite::{DeathAnimation, GhostColor, Sprite};
use crate::types::{Direction, OccupantId, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    score: u32,
    alive: bool,
    death_animation: DeathAnimation,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(DeathAnimation::default())
    }
}

impl Player {
    pub fn new(death_animation: DeathAnimation) -> Self {
        Self {
            score: 0,
            alive: true,
            death_animation,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// The death animation restarts only on the alive -> dead edge.
    pub fn set_alive(&mut self, alive: bool) {
        if self.alive && !alive {
            self.death_animation.restart();
        }
        self.alive = alive;
    }

    pub fn death_animation(&self) -> &DeathAnimation {
        &self.death_animation
    }

    pub fn death_animation_mut(&mut self) -> &mut DeathAnimation {
        &mut self.death_animation
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ghost {
    color: GhostColor,
}

impl Ghost {
    pub fn new(color: GhostColor) -> Self {
        Self { color }
    }

    pub fn color(&self) -> GhostColor {
        self.color
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Player(Player),
    Ghost(Ghost),
}

#[derive(Clone, Debug)]
pub struct Occupant {
    id: OccupantId,
    square: Option<Vec2>,
    direction: Direction,
    body: Body,
}

impl Occupant {
    pub fn new(id: OccupantId, body: Body) -> Self {
        Self {
            id,
            square: None,
            direction: Direction::West,
            body,
        }
    }

    pub fn id(&self) -> OccupantId {
        self.id
    }

    pub fn square(&self) -> Option<Vec2> {
        self.square
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn kind(&self) -> EntityKind {
        match self.body {
            Body::Player(_) => EntityKind::Player,
            Body::Ghost(_) => EntityKind::Ghost,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.body {
            Body::Player(player) => Some(player),
            Body::Ghost(_) => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.body {
            Body::Player(player) => Some(player),
            Body::Ghost(_) => None,
        }
    }

    pub fn as_ghost(&self) -> Option<&Ghost> {
        match &self.body {
            Body::Ghost(ghost) => Some(ghost),
            Body::Player(_) => None,
        }
    }

    pub fn sprite(&self) -> Sprite {
        match &self.body {
            Body::Player(player) if player.is_alive() => Sprite::PacMan {
                dir: self.direction,
            },
            Body::Player(player) => player.death_animation().sprite(),
            Body::Ghost(ghost) => Sprite::Ghost {
                color: ghost.color(),
                dir: self.direction,
            },
        }
    }

    pub fn occupy(&mut self, board: &mut Board, target: Vec2) -> bool {
        let accessible = board
            .square(target)
            .is_some_and(|square| square.is_accessible_to(self));
        if !accessible {
            return false;
        }

        self.leave_current_square(board);
        let placed = board
            .square_mut(target)
            .is_some_and(|square| square.put(self));
        debug_assert!(placed);
        self.square = Some(target);
        debug_assert!(self.invariant(board));
        true
    }

    pub fn leave_current_square(&mut self, board: &mut Board) {
        if let Some(current) = self.square.take() {
            if let Some(square) = board.square_mut(current) {
                square.remove(self.id);
            }
        }
        debug_assert!(self.invariant(board));
    }

    pub(crate) fn invariant(&self, board: &Board) -> bool {
        match self.square {
            Some(pos) => board
                .square(pos)
                .is_some_and(|square| square.contains(self.id)),
            None => board.squares().all(|square| !square.contains(self.id)),
        }
    }

    pub fn next_move<R: Rng + ?Sized>(&self, board: &Board, rng: &mut R) -> Option<Direction> {
        if self.as_ghost().is_none() {
            return None;
        }
        let here = self.square?;
        let start = rng.random_range(0..Direction::ALL.len());
        (0..Direction::ALL.len())
            .map(|offset| Direction::ALL[(start + offset) % Direction::ALL.len()])
            .find(|dir| {
                board
                    .neighbour(here, *dir)
                    .and_then(|pos| board.square(pos))
                    .is_some_and(|square| square.is_accessible_to(self))
            })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::map_parser::MapParser;

    fn board(rows: &[&str]) -> Board {
        MapParser::new().parse_lines(rows).expect("map parses")
    }

    #[test]
    fn occupy_open_square_updates_both_sides() {
        let mut board = board(&["   "]);
        let mut ghost = Occupant::new(OccupantId(1), Body::Ghost(Ghost::default()));
        assert!(ghost.occupy(&mut board, Vec2::new(0, 0)));
        assert!(ghost.occupy(&mut board, Vec2::new(2, 0)));

        assert_eq!(ghost.square(), Some(Vec2::new(2, 0)));
        let origin = board.square_at(0, 0).expect("square");
        assert!(origin.occupants().is_empty());
        let target = board.square_at(2, 0).expect("square");
        assert_eq!(target.occupants(), &[OccupantId(1)]);
    }

    #[test]
    fn occupy_wall_keeps_previous_square() {
        let mut board = board(&[" # "]);
        let mut player = Occupant::new(OccupantId(0), Body::Player(Player::default()));
        assert!(player.occupy(&mut board, Vec2::new(0, 0)));
        assert!(!player.occupy(&mut board, Vec2::new(1, 0)));
        assert_eq!(player.square(), Some(Vec2::new(0, 0)));
        assert!(board
            .square_at(0, 0)
            .is_some_and(|square| square.contains(OccupantId(0))));
        assert!(board
            .square_at(1, 0)
            .is_some_and(|square| square.occupants().is_empty()));
    }

    #[test]
    fn leave_current_square_is_idempotent() {
        let mut board = board(&["  "]);
        let mut ghost = Occupant::new(OccupantId(0), Body::Ghost(Ghost::default()));
        ghost.leave_current_square(&mut board);
        assert!(ghost.occupy(&mut board, Vec2::new(1, 0)));
        ghost.leave_current_square(&mut board);
        ghost.leave_current_square(&mut board);
        assert_eq!(ghost.square(), None);
        assert!(board.squares().all(|square| square.occupants().is_empty()));
    }

    #[test]
    fn default_facing_is_west() {
        let ghost = Occupant::new(OccupantId(0), Body::Ghost(Ghost::default()));
        assert_eq!(ghost.direction(), Direction::West);
    }

    #[test]
    fn death_animation_restarts_once_per_death() {
        let mut player = Player::default();
        player.set_alive(false);
        player.set_alive(false);
        assert_eq!(player.death_animation().restarts(), 1);
        player.set_alive(true);
        player.set_alive(false);
        assert_eq!(player.death_animation().restarts(), 2);
    }

    #[test]
    fn dead_player_shows_dying_sprite() {
        let mut occupant = Occupant::new(OccupantId(0), Body::Player(Player::default()));
        occupant.set_direction(Direction::North);
        assert_eq!(
            occupant.sprite(),
            Sprite::PacMan {
                dir: Direction::North
            }
        );
        if let Some(player) = occupant.as_player_mut() {
            player.set_alive(false);
        }
        assert_eq!(occupant.sprite(), Sprite::PacManDying { frame: 0 });
    }

    #[test]
    fn ghost_only_picks_accessible_neighbours() {
        let mut board = board(&["###", "#  ", "###"]);
        let mut ghost = Occupant::new(OccupantId(0), Body::Ghost(Ghost::default()));
        assert!(ghost.occupy(&mut board, Vec2::new(1, 1)));
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(ghost.next_move(&board, &mut rng), Some(Direction::East));
        }
    }

    #[test]
    fn ghost_explores_every_open_direction() {
        let mut board = board(&["   ", "   ", "   "]);
        let mut ghost = Occupant::new(OccupantId(0), Body::Ghost(Ghost::default()));
        assert!(ghost.occupy(&mut board, Vec2::new(1, 1)));
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Some(dir) = ghost.next_move(&board, &mut rng) {
                seen.insert(dir);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn enclosed_ghost_has_no_move() {
        let mut board = board(&["###", "# #", "###"]);
        let mut ghost = Occupant::new(OccupantId(0), Body::Ghost(Ghost::default()));
        assert!(ghost.occupy(&mut board, Vec2::new(1, 1)));
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(ghost.next_move(&board, &mut rng), None);
    }

    #[test]
    fn players_get_no_random_move() {
        let mut board = board(&["   "]);
        let mut player = Occupant::new(OccupantId(0), Body::Player(Player::default()));
        assert!(player.occupy(&mut board, Vec2::new(1, 0)));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(player.next_move(&board, &mut rng), None);
    }
}
