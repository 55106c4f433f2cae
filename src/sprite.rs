use serde::Serialize;

use crate::constants::DEATH_ANIMATION_FRAMES;
use crate::types::Direction;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    #[default]
    Red,
    Pink,
    Cyan,
    Orange,
}

impl GhostColor {
    pub const ALL: [GhostColor; 4] = [
        GhostColor::Red,
        GhostColor::Pink,
        GhostColor::Cyan,
        GhostColor::Orange,
    ];

    pub fn nth(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sprite {
    Floor,
    Wall,
    Pellet,
    PacMan { dir: Direction },
    PacManDying { frame: usize },
    Ghost { color: GhostColor, dir: Direction },
}

impl Sprite {
    pub fn glyph(self) -> char {
        match self {
            Self::Floor => ' ',
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PacMan { dir } => match dir {
                Direction::North => 'v',
                Direction::South => '^',
                Direction::East => '<',
                Direction::West => '>',
            },
            Self::PacManDying { frame } => {
                const DYING: [char; 4] = ['x', 'X', '*', '.'];
                let step = frame * DYING.len() / DEATH_ANIMATION_FRAMES;
                DYING[step.min(DYING.len() - 1)]
            }
            Self::Ghost { .. } => 'G',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeathAnimation {
    frames: usize,
    frame: usize,
    restarts: u32,
}

impl Default for DeathAnimation {
    fn default() -> Self {
        Self::new(DEATH_ANIMATION_FRAMES)
    }
}

impl DeathAnimation {
    pub fn new(frames: usize) -> Self {
        Self {
            frames: frames.max(1),
            frame: 0,
            restarts: 0,
        }
    }

    pub fn restart(&mut self) {
        self.frame = 0;
        self.restarts += 1;
    }

    /// Advances one frame and holds on the last one.
    pub fn advance(&mut self) {
        if self.frame + 1 < self.frames {
            self.frame += 1;
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn sprite(&self) -> Sprite {
        Sprite::PacManDying { frame: self.frame }
    }
}
