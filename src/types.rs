use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    /// Also the order ghosts scan exits in.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn delta_x(self) -> i32 {
        match self {
            Self::East => 1,
            Self::West => -1,
            Self::North | Self::South => 0,
        }
    }

    /// +y points down the screen.
    pub fn delta_y(self) -> i32 {
        match self {
            Self::South => 1,
            Self::North => -1,
            Self::East | Self::West => 0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::South => 1,
            Self::West => 2,
            Self::East => 3,
        }
    }

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" | "w" | "north" => Some(Self::North),
            "down" | "s" | "south" => Some(Self::South),
            "left" | "a" | "west" => Some(Self::West),
            "right" | "d" | "east" => Some(Self::East),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OccupantId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelEvent {
    PlayerDied {
        #[serde(rename = "playerId")]
        player: OccupantId,
    },
    LevelCompleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The level was already completed; nothing happened.
    Frozen,
    /// Destination not accessible. Facing still changed.
    Blocked,
    Moved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: OccupantId,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub score: u32,
    pub alive: bool,
    #[serde(rename = "deathFrame")]
    pub death_frame: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GhostView {
    pub id: OccupantId,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub color: crate::sprite::GhostColor,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelSnapshot {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    pub completed: bool,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: usize,
    pub players: Vec<PlayerView>,
    pub ghosts: Vec<GhostView>,
}
