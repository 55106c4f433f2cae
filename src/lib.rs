pub mod board;
pub mod collision;
pub mod constants;
pub mod game;
pub mod level;
pub mod log;
pub mod map_parser;
pub mod occupant;
pub mod render;
pub mod sprite;
pub mod types;
pub mod world;

pub use game::Game;
pub use level::{Level, LevelError, LevelObserver};
pub use map_parser::{MapError, MapParser};
