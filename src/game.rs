use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::level::{Level, LevelError, LevelObserver};
use crate::occupant::Player;
use crate::types::{Direction, MoveOutcome, OccupantId, PlayerView};

/// Stops the session as soon as the level reports a death or a win.
struct SessionObserver {
    in_progress: Arc<AtomicBool>,
}

impl LevelObserver for SessionObserver {
    fn player_died(&self, _player: OccupantId) {
        self.in_progress.store(false, Ordering::SeqCst);
    }

    fn level_completed(&self) {
        self.in_progress.store(false, Ordering::SeqCst);
    }
}

pub struct Game {
    level: Arc<Level>,
    player: OccupantId,
    in_progress: Arc<AtomicBool>,
    move_lock: Mutex<()>,
    observer: Arc<dyn LevelObserver>,
}

impl Game {
    pub fn new(level: Arc<Level>, player: Player) -> Result<Self, LevelError> {
        let player = level.register_player(player)?;
        let in_progress = Arc::new(AtomicBool::new(false));
        let observer: Arc<dyn LevelObserver> = Arc::new(SessionObserver {
            in_progress: Arc::clone(&in_progress),
        });
        level.add_observer(Arc::clone(&observer));
        Ok(Self {
            level,
            player,
            in_progress,
            move_lock: Mutex::new(()),
            observer,
        })
    }

    pub fn start(&self) {
        self.in_progress.store(true, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.in_progress.store(false, Ordering::SeqCst);
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    pub fn up(&self) -> Result<Option<MoveOutcome>, LevelError> {
        self.step(Direction::North)
    }

    pub fn down(&self) -> Result<Option<MoveOutcome>, LevelError> {
        self.step(Direction::South)
    }

    pub fn left(&self) -> Result<Option<MoveOutcome>, LevelError> {
        self.step(Direction::West)
    }

    pub fn right(&self) -> Result<Option<MoveOutcome>, LevelError> {
        self.step(Direction::East)
    }

    /// `None` while the session is stopped. Observers are notified after the
    /// session's own lock is released, so they may drive the session.
    pub fn step(&self, direction: Direction) -> Result<Option<MoveOutcome>, LevelError> {
        let outcome = {
            let _guard = self.move_lock.lock();
            if !self.is_in_progress() {
                return Ok(None);
            }
            self.level.queue_move(self.player, direction)
        };
        self.level.drain_events();
        let outcome = outcome?;
        // Another caller may still be delivering our events.
        if self.level.is_completed() || self.player_view().is_some_and(|view| !view.alive) {
            self.stop();
        }
        Ok(Some(outcome))
    }

    /// Does not restart the session.
    pub fn revive(&self) -> Result<bool, LevelError> {
        let _guard = self.move_lock.lock();
        self.level.revive_player(self.player)
    }

    pub fn player(&self) -> OccupantId {
        self.player
    }

    pub fn players(&self) -> Vec<OccupantId> {
        vec![self.player]
    }

    pub fn player_view(&self) -> Option<PlayerView> {
        self.level.player_view(self.player)
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.level.remove_observer(&self.observer);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::map_parser::MapParser;
    use crate::occupant::Ghost;
    use crate::types::Vec2;

    fn game(rows: &[&str]) -> Game {
        let level = Level::new(MapParser::new().parse_lines(rows).expect("map parses"));
        Game::new(Arc::new(level), Player::default()).expect("game")
    }

    #[test]
    fn moves_are_ignored_until_started() {
        let game = game(&["P..", "..."]);
        assert!(!game.is_in_progress());
        assert_eq!(game.right(), Ok(None));
        assert_eq!(game.player_view().map(|view| view.x), Some(0));

        game.start();
        assert_eq!(game.right(), Ok(Some(MoveOutcome::Moved)));
        assert_eq!(game.player_view().map(|view| view.score), Some(10));

        game.stop();
        assert_eq!(game.down(), Ok(None));
    }

    #[test]
    fn directions_map_to_compass_points() {
        let game = game(&["...", ".P.", "..."]);
        game.start();
        game.up().expect("move");
        assert_eq!(game.player_view().map(|view| (view.x, view.y)), Some((1, 0)));
        game.left().expect("move");
        assert_eq!(game.player_view().map(|view| (view.x, view.y)), Some((0, 0)));
        game.down().expect("move");
        assert_eq!(game.player_view().map(|view| (view.x, view.y)), Some((0, 1)));
        game.right().expect("move");
        assert_eq!(game.player_view().map(|view| (view.x, view.y)), Some((1, 1)));
    }

    #[test]
    fn eating_everything_stops_the_session() {
        let game = game(&["P."]);
        game.start();
        game.right().expect("move");
        assert!(game.level().is_completed());
        assert!(!game.is_in_progress());
    }

    #[test]
    fn death_stops_the_session_and_revive_brings_the_player_back() {
        let game = game(&["P G.", "####"]);
        game.level()
            .add_ghost(Ghost::default(), Vec2::new(2, 0))
            .expect("ghost");
        game.start();
        game.right().expect("move");
        game.right().expect("move");
        assert!(!game.is_in_progress());
        assert!(game.player_view().is_some_and(|view| !view.alive));

        assert_eq!(game.revive(), Ok(true));
        let view = game.player_view().expect("view");
        assert!(view.alive);
        assert_eq!((view.x, view.y), (1, 0));
        assert!(!game.is_in_progress());
    }

    #[test]
    fn dropping_the_game_unregisters_its_observer() {
        let level = Arc::new(Level::new(
            MapParser::new().parse_str("P.").expect("map parses"),
        ));
        let game = Game::new(Arc::clone(&level), Player::default()).expect("game");
        assert_eq!(game.players(), vec![game.player()]);
        assert_eq!(level.observer_count(), 1);
        drop(game);
        assert_eq!(level.observer_count(), 0);
        assert_eq!(level.players().len(), 1);
    }

    #[test]
    fn observer_can_steer_the_game_from_a_callback() {
        struct Steer {
            game: Mutex<Option<Arc<Game>>>,
            calls: AtomicUsize,
        }

        impl LevelObserver for Steer {
            fn player_died(&self, _player: OccupantId) {}

            fn level_completed(&self) {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let game = self.game.lock().clone();
                if let Some(game) = game {
                    assert_eq!(game.left(), Ok(None));
                    game.start();
                    assert_eq!(game.left(), Ok(Some(MoveOutcome::Frozen)));
                    game.stop();
                }
            }
        }

        let level = Arc::new(Level::new(
            MapParser::new().parse_str("P..").expect("map parses"),
        ));
        let game = Arc::new(Game::new(Arc::clone(&level), Player::default()).expect("game"));
        let steer = Arc::new(Steer {
            game: Mutex::new(Some(Arc::clone(&game))),
            calls: AtomicUsize::new(0),
        });
        level.add_observer(steer.clone());

        let (done, finished) = std::sync::mpsc::channel();
        let worker = {
            let game = Arc::clone(&game);
            std::thread::spawn(move || {
                game.start();
                let first = game.right();
                let second = game.right();
                let _ = done.send((first, second));
            })
        };
        let (first, second) = finished
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("moves return while an observer drives the game");
        worker.join().expect("worker thread");
        assert_eq!(first, Ok(Some(MoveOutcome::Moved)));
        assert_eq!(second, Ok(Some(MoveOutcome::Moved)));
        assert_eq!(steer.calls.load(Ordering::SeqCst), 1);
        assert!(!game.is_in_progress());
        steer.game.lock().take();
    }

    #[test]
    fn completing_move_stops_the_session_even_if_delivery_is_deferred() {
        let game = game(&["P."]);
        let busy = game.level().hold_delivery();
        game.start();
        assert_eq!(game.right(), Ok(Some(MoveOutcome::Moved)));
        assert!(!game.is_in_progress());
        drop(busy);
    }
}
