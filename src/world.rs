use crate::board::Board;
use crate::collision::Participant;
use crate::occupant::{Body, Occupant, Player};
use crate::types::{LevelEvent, OccupantId, Vec2};

#[derive(Clone, Debug)]
pub struct World {
    board: Board,
    occupants: Vec<Occupant>,
    events: Vec<LevelEvent>,
}

impl World {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            occupants: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn insert(&mut self, body: Body) -> OccupantId {
        let id = OccupantId(self.occupants.len());
        self.occupants.push(Occupant::new(id, body));
        id
    }

    pub fn spawn(&mut self, body: Body, at: Vec2) -> Option<OccupantId> {
        let id = OccupantId(self.occupants.len());
        let mut occupant = Occupant::new(id, body);
        if !occupant.occupy(&mut self.board, at) {
            return None;
        }
        self.occupants.push(occupant);
        Some(id)
    }

    pub fn occupant(&self, id: OccupantId) -> Option<&Occupant> {
        self.occupants.get(id.0)
    }

    pub fn occupant_mut(&mut self, id: OccupantId) -> Option<&mut Occupant> {
        self.occupants.get_mut(id.0)
    }

    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.occupants.iter()
    }

    pub fn player(&self, id: OccupantId) -> Option<&Player> {
        self.occupant(id)?.as_player()
    }

    pub fn player_mut(&mut self, id: OccupantId) -> Option<&mut Player> {
        self.occupant_mut(id)?.as_player_mut()
    }

    pub fn participant(&self, id: OccupantId) -> Option<Participant> {
        let occupant = self.occupant(id)?;
        Some(Participant::occupant(occupant.kind(), id))
    }

    /// Occupants in arrival order, then the pellet.
    pub fn participants_at(&self, pos: Vec2) -> Vec<Participant> {
        let Some(square) = self.board.square(pos) else {
            return Vec::new();
        };
        let mut out: Vec<Participant> = square
            .occupants()
            .iter()
            .filter_map(|id| self.participant(*id))
            .collect();
        if square.pellet().is_some() {
            out.push(Participant::pellet(pos));
        }
        out
    }

    pub fn occupy(&mut self, id: OccupantId, pos: Vec2) -> bool {
        let Some(occupant) = self.occupants.get_mut(id.0) else {
            return false;
        };
        occupant.occupy(&mut self.board, pos)
    }

    pub fn leave(&mut self, id: OccupantId) {
        if let Some(occupant) = self.occupants.get_mut(id.0) {
            occupant.leave_current_square(&mut self.board);
        }
    }

    pub fn push_event(&mut self, event: LevelEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Squares and occupants agree about who stands where.
    pub fn invariant(&self) -> bool {
        let squares_agree = self.board.squares().all(|square| {
            square.occupants().iter().all(|id| {
                self.occupant(*id)
                    .is_some_and(|occupant| occupant.square() == Some(square.position()))
            })
        });
        let occupants_agree = self.occupants.iter().all(|occupant| match occupant.square() {
            Some(pos) => self
                .board
                .square(pos)
                .is_some_and(|square| square.contains(occupant.id())),
            None => true,
        });
        squares_agree && occupants_agree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::EntityKind;
    use crate::map_parser::MapParser;
    use crate::occupant::Ghost;

    fn world(rows: &[&str]) -> World {
        World::new(MapParser::new().parse_lines(rows).expect("map parses"))
    }

    #[test]
    fn participants_list_occupants_before_pellet() {
        let mut world = world(&[". "]);
        let first = world.insert(Body::Ghost(Ghost::default()));
        let second = world.insert(Body::Player(Player::default()));
        assert!(world.occupy(first, Vec2::new(0, 0)));
        assert!(world.occupy(second, Vec2::new(0, 0)));

        let kinds: Vec<EntityKind> = world
            .participants_at(Vec2::new(0, 0))
            .iter()
            .map(|participant| participant.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Ghost, EntityKind::Player, EntityKind::Pellet]
        );
        assert!(world.participants_at(Vec2::new(1, 0)).is_empty());
        assert!(world.participants_at(Vec2::new(9, 9)).is_empty());
    }

    #[test]
    fn invariant_holds_across_moves() {
        let mut world = world(&["   ", " # "]);
        let ids: Vec<OccupantId> = (0..3)
            .map(|_| world.insert(Body::Ghost(Ghost::default())))
            .collect();
        for (step, id) in ids.iter().cycle().take(12).enumerate() {
            let x = (step % 3) as i32;
            let y = (step % 2) as i32;
            world.occupy(*id, Vec2::new(x, y));
            assert!(world.invariant());
        }
        world.leave(ids[0]);
        assert!(world.invariant());
        assert_eq!(world.occupant(ids[0]).and_then(Occupant::square), None);
    }

    #[test]
    fn unknown_occupant_cannot_move() {
        let mut world = world(&["  "]);
        assert!(!world.occupy(OccupantId(42), Vec2::new(0, 0)));
        assert!(world.participant(OccupantId(42)).is_none());
    }
}
