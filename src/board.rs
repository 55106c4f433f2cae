use crate::constants::PELLET_POINTS;
use crate::map_parser::MapError;
use crate::occupant::Occupant;
use crate::sprite::Sprite;
use crate::types::{Direction, OccupantId, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SquareKind {
    Open,
    Wall,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pellet {
    points: u32,
}

impl Default for Pellet {
    fn default() -> Self {
        Self::new(PELLET_POINTS)
    }
}

impl Pellet {
    pub fn new(points: u32) -> Self {
        Self { points }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn sprite(&self) -> Sprite {
        Sprite::Pellet
    }
}

#[derive(Clone, Debug)]
pub struct Square {
    position: Vec2,
    kind: SquareKind,
    neighbours: [Option<Vec2>; 4],
    pellet: Option<Pellet>,
    occupants: Vec<OccupantId>,
}

impl Square {
    pub fn new(kind: SquareKind) -> Self {
        Self {
            position: Vec2::new(0, 0),
            kind,
            neighbours: [None; 4],
            pellet: None,
            occupants: Vec::new(),
        }
    }

    pub fn open() -> Self {
        Self::new(SquareKind::Open)
    }

    pub fn wall() -> Self {
        Self::new(SquareKind::Wall)
    }

    pub fn with_pellet(mut self, pellet: Pellet) -> Self {
        self.pellet = Some(pellet);
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn kind(&self) -> SquareKind {
        self.kind
    }

    pub fn sprite(&self) -> Sprite {
        match self.kind {
            SquareKind::Open => Sprite::Floor,
            SquareKind::Wall => Sprite::Wall,
        }
    }

    pub fn is_accessible_to(&self, _occupant: &Occupant) -> bool {
        match self.kind {
            SquareKind::Open => true,
            SquareKind::Wall => false,
        }
    }

    pub fn neighbour(&self, direction: Direction) -> Option<Vec2> {
        self.neighbours[direction.index()]
    }

    pub fn pellet(&self) -> Option<&Pellet> {
        self.pellet.as_ref()
    }

    pub fn occupants(&self) -> &[OccupantId] {
        &self.occupants
    }

    pub fn contains(&self, id: OccupantId) -> bool {
        self.occupants.contains(&id)
    }

    /// Adds the occupant unless it is already listed. Reports accessibility,
    /// not whether the list changed.
    pub(crate) fn put(&mut self, occupant: &Occupant) -> bool {
        if !self.is_accessible_to(occupant) {
            return false;
        }
        if !self.occupants.contains(&occupant.id()) {
            self.occupants.push(occupant.id());
        }
        true
    }

    pub(crate) fn remove(&mut self, id: OccupantId) -> Option<OccupantId> {
        let index = self.occupants.iter().position(|other| *other == id)?;
        Some(self.occupants.remove(index))
    }

    fn attach(&mut self, neighbour: Vec2, direction: Direction) {
        self.neighbours[direction.index()] = Some(neighbour);
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    width: i32,
    height: i32,
    squares: Vec<Square>,
    player_spawns: Vec<Vec2>,
    ghost_spawns: Vec<Vec2>,
    pellet_count: usize,
    connected: bool,
}

impl Board {
    pub fn from_rows(
        rows: Vec<Vec<Square>>,
        player_spawns: Vec<Vec2>,
        ghost_spawns: Vec<Vec2>,
    ) -> Result<Self, MapError> {
        let height = rows.len();
        if height == 0 {
            return Err(MapError::NoRows);
        }
        let width = rows[0].len();
        if width == 0 {
            return Err(MapError::NoColumns);
        }
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != width)
            .map(|(index, row)| (index, row.len()))
        {
            return Err(MapError::NotRectangular {
                row,
                expected: width,
                found,
            });
        }

        let mut squares = Vec::with_capacity(width * height);
        for (y, row) in rows.into_iter().enumerate() {
            for (x, mut square) in row.into_iter().enumerate() {
                square.position = Vec2::new(x as i32, y as i32);
                squares.push(square);
            }
        }
        let pellet_count = squares.iter().filter(|s| s.pellet.is_some()).count();

        Ok(Self {
            width: width as i32,
            height: height as i32,
            squares,
            player_spawns,
            ghost_spawns,
            pellet_count,
            connected: false,
        })
    }

    /// Wires every square to its four toroidally wrapped neighbours.
    pub fn connect_grid(&mut self) {
        debug_assert!(!self.connected, "connect_grid called twice");
        let (w, h) = (self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                let index = self.index(x, y);
                for dir in Direction::ALL {
                    let nx = (w + x + dir.delta_x()) % w;
                    let ny = (h + y + dir.delta_y()) % h;
                    self.squares[index].attach(Vec2::new(nx, ny), dir);
                }
            }
        }
        self.connected = true;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn square(&self, pos: Vec2) -> Option<&Square> {
        if !self.contains(pos) {
            return None;
        }
        self.squares.get(self.index(pos.x, pos.y))
    }

    pub fn square_at(&self, x: i32, y: i32) -> Option<&Square> {
        self.square(Vec2::new(x, y))
    }

    pub(crate) fn square_mut(&mut self, pos: Vec2) -> Option<&mut Square> {
        if !self.contains(pos) {
            return None;
        }
        let index = self.index(pos.x, pos.y);
        self.squares.get_mut(index)
    }

    pub fn squares(&self) -> impl Iterator<Item = &Square> {
        self.squares.iter()
    }

    pub fn neighbour(&self, pos: Vec2, direction: Direction) -> Option<Vec2> {
        self.square(pos)?.neighbour(direction)
    }

    pub fn player_spawns(&self) -> Vec<Vec2> {
        self.player_spawns.clone()
    }

    pub fn ghost_spawns(&self) -> Vec<Vec2> {
        self.ghost_spawns.clone()
    }

    pub fn pellet(&self, pos: Vec2) -> Option<&Pellet> {
        self.square(pos)?.pellet()
    }

    pub fn set_pellet(&mut self, pos: Vec2, pellet: Pellet) -> Option<Pellet> {
        let square = self.square_mut(pos)?;
        let previous = square.pellet.replace(pellet);
        if previous.is_none() {
            self.pellet_count += 1;
        }
        previous
    }

    pub fn remove_pellet(&mut self, pos: Vec2) -> Option<Pellet> {
        let removed = self.square_mut(pos)?.pellet.take();
        if removed.is_some() {
            self.pellet_count -= 1;
        }
        removed
    }

    pub fn pellet_count(&self) -> usize {
        self.pellet_count
    }

    pub fn tile_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .filter_map(|x| self.square_at(x, y))
                    .map(|square| match square.pellet() {
                        Some(pellet) => pellet.sprite().glyph(),
                        None => square.sprite().glyph(),
                    })
                    .collect()
            })
            .collect()
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }
}
