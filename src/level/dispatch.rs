use std::sync::Arc;

use super::{Level, LevelObserver};
use crate::types::LevelEvent;

impl Level {
    pub fn add_observer(&self, observer: Arc<dyn LevelObserver>) {
        self.observers.write().push(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn LevelObserver>) {
        let mut observers = self.observers.write();
        if let Some(index) = observers
            .iter()
            .position(|other| same_observer(other, observer))
        {
            observers.remove(index);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Called with the move lock held, which fixes the order of events.
    pub(super) fn enqueue(&self, events: Vec<LevelEvent>) {
        if events.is_empty() {
            return;
        }
        self.pending.lock().extend(events);
    }

    /// Only one caller delivers at a time; anyone arriving meanwhile leaves
    /// its events to that caller.
    pub(crate) fn drain_events(&self) {
        loop {
            let Some(delivering) = self.dispatching.try_lock() else {
                return;
            };
            while let Some(event) = self.next_pending() {
                let observers: Vec<Arc<dyn LevelObserver>> = self.observers.read().clone();
                for observer in &observers {
                    match event {
                        LevelEvent::PlayerDied { player } => observer.player_died(player),
                        LevelEvent::LevelCompleted => observer.level_completed(),
                    }
                }
            }
            drop(delivering);
            // Something may have been queued between the last pop and unlock.
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }

    fn next_pending(&self) -> Option<LevelEvent> {
        self.pending.lock().pop_front()
    }

    /// Stands in for another caller that is busy delivering.
    #[cfg(test)]
    pub(crate) fn hold_delivery(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.dispatching.lock()
    }
}

fn same_observer(a: &Arc<dyn LevelObserver>, b: &Arc<dyn LevelObserver>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::map_parser::MapParser;
    use crate::occupant::{Ghost, Player};
    use crate::types::{Direction, OccupantId, Vec2};

    #[derive(Default)]
    struct Counter {
        deaths: AtomicUsize,
        completions: AtomicUsize,
    }

    impl LevelObserver for Counter {
        fn player_died(&self, _player: OccupantId) {
            self.deaths.fetch_add(1, Ordering::SeqCst);
        }

        fn level_completed(&self) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn every_observer_hears_every_event_in_registration_order() {
        struct Tagged {
            tag: usize,
            log: Arc<Mutex<Vec<usize>>>,
        }

        impl LevelObserver for Tagged {
            fn player_died(&self, _player: OccupantId) {
                self.log.lock().push(self.tag);
            }

            fn level_completed(&self) {}
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let level = Level::new(MapParser::new().parse_str("P G.").expect("map parses"));
        for tag in 0..3 {
            level.add_observer(Arc::new(Tagged {
                tag,
                log: Arc::clone(&log),
            }));
        }
        let player = level.register_player(Player::default()).expect("spawn");
        level
            .add_ghost(Ghost::default(), Vec2::new(2, 0))
            .expect("ghost");
        level.move_occupant(player, Direction::East).expect("move");
        level.move_occupant(player, Direction::East).expect("move");
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn observer_list_is_a_plain_list() {
        let level = Level::new(MapParser::new().parse_str("P.").expect("map parses"));
        let counter = Arc::new(Counter::default());
        let handle: Arc<dyn LevelObserver> = counter.clone();
        level.add_observer(handle.clone());
        level.add_observer(handle.clone());
        let player = level.register_player(Player::default()).expect("spawn");
        level.move_occupant(player, Direction::East).expect("move");
        assert_eq!(counter.completions.load(Ordering::SeqCst), 2);
        assert_eq!(counter.deaths.load(Ordering::SeqCst), 0);

        level.remove_observer(&handle);
        assert_eq!(level.observer_count(), 1);
        level.remove_observer(&handle);
        assert_eq!(level.observer_count(), 0);
        level.remove_observer(&handle);
        assert_eq!(level.observer_count(), 0);
    }

    #[test]
    fn events_are_delivered_after_the_lock_is_released() {
        struct Peek {
            level: Arc<Level>,
            saw_unlocked: AtomicUsize,
        }

        impl LevelObserver for Peek {
            fn player_died(&self, _player: OccupantId) {}

            fn level_completed(&self) {
                if self.level.state.try_lock().is_some() {
                    self.saw_unlocked.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let level = Arc::new(Level::new(MapParser::new().parse_str("P.").expect("map parses")));
        let peek = Arc::new(Peek {
            level: Arc::clone(&level),
            saw_unlocked: AtomicUsize::new(0),
        });
        level.add_observer(peek.clone());
        let player = level.register_player(Player::default()).expect("spawn");
        level.move_occupant(player, Direction::East).expect("move");
        assert_eq!(peek.saw_unlocked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn busy_deliverer_keeps_events_queued_until_it_drains() {
        let level = Level::new(MapParser::new().parse_str("P.").expect("map parses"));
        let counter = Arc::new(Counter::default());
        level.add_observer(counter.clone());
        let player = level.register_player(Player::default()).expect("spawn");

        let busy = level.hold_delivery();
        level.move_occupant(player, Direction::East).expect("move");
        assert!(level.is_completed());
        assert_eq!(counter.completions.load(Ordering::SeqCst), 0);

        drop(busy);
        level.drain_events();
        assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
    }
}
