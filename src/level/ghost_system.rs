use rand::Rng;

use super::Level;
use crate::types::{Direction, MoveOutcome, OccupantId};

impl Level {
    pub fn ghost_next_move<R: Rng + ?Sized>(
        &self,
        id: OccupantId,
        rng: &mut R,
    ) -> Option<Direction> {
        let state = self.state.lock();
        let occupant = state.world.occupant(id)?;
        occupant.next_move(state.world.board(), rng)
    }

    pub fn step_ghosts<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(OccupantId, MoveOutcome)> {
        let mut outcomes = Vec::new();
        for id in self.ghosts() {
            let Some(direction) = self.ghost_next_move(id, rng) else {
                continue;
            };
            if let Ok(outcome) = self.move_occupant(id, direction) {
                outcomes.push((id, outcome));
            }
        }
        outcomes
    }
}
