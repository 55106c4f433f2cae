use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::board::{Board, Pellet, Square};
use crate::types::Vec2;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid map: a map must have at least 1 row")]
    NoRows,
    #[error("invalid map: a map must have at least 1 column")]
    NoColumns,
    #[error("invalid map: row {row} has {found} columns, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid map: unknown character {ch:?} at ({x}, {y})")]
    InvalidCharacter { ch: char, x: usize, y: usize },
    #[error("unable to read map: {0}")]
    Io(#[from] std::io::Error),
}

/// `#` wall, space floor, `.` pellet, `G` ghost spawn, `P` player spawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapParser {
    pellet: Pellet,
}

impl MapParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pellet_points(points: u32) -> Self {
        Self {
            pellet: Pellet::new(points),
        }
    }

    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<Board, MapError> {
        let Some(first) = lines.first() else {
            return Err(MapError::NoRows);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(MapError::NoColumns);
        }

        let mut rows = Vec::with_capacity(lines.len());
        let mut player_spawns = Vec::new();
        let mut ghost_spawns = Vec::new();
        for (y, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(MapError::NotRectangular {
                    row: y,
                    expected: width,
                    found,
                });
            }
            let mut row = Vec::with_capacity(width);
            for (x, ch) in line.chars().enumerate() {
                let pos = Vec2::new(x as i32, y as i32);
                let square = match ch {
                    '#' => Square::wall(),
                    ' ' => Square::open(),
                    '.' => Square::open().with_pellet(self.pellet),
                    'G' => {
                        ghost_spawns.push(pos);
                        Square::open()
                    }
                    'P' => {
                        player_spawns.push(pos);
                        Square::open()
                    }
                    other => return Err(MapError::InvalidCharacter { ch: other, x, y }),
                };
                row.push(square);
            }
            rows.push(row);
        }

        let mut board = Board::from_rows(rows, player_spawns, ghost_spawns)?;
        board.connect_grid();
        Ok(board)
    }

    pub fn parse_str(&self, text: &str) -> Result<Board, MapError> {
        let lines: Vec<&str> = text.lines().collect();
        self.parse_lines(&lines)
    }

    pub fn load_map(&self, path: &Path) -> Result<Board, MapError> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }
}
