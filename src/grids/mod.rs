pub mod maze_grid;
pub mod shared;

use bitflags::bitflags;

pub use maze_grid::Grid;
pub use shared::SharedGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, coords: Coordinates) -> bool {
        coords.x >= 0
            && coords.y >= 0
            && (coords.x as usize) < self.width
            && (coords.y as usize) < self.height
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Position of a cell in the maze, x grows to the right and y grows down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves one grid step along `direction`.
    ///
    /// Only a single flag moves the coordinates. An empty or combined
    /// value holds position.
    pub fn step(self, direction: Direction) -> Self {
        if direction == Direction::UP {
            Self::new(self.x, self.y - 1)
        } else if direction == Direction::DOWN {
            Self::new(self.x, self.y + 1)
        } else if direction == Direction::LEFT {
            Self::new(self.x - 1, self.y)
        } else if direction == Direction::RIGHT {
            Self::new(self.x + 1, self.y)
        } else {
            self
        }
    }
}

impl From<(i32, i32)> for Coordinates {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

bitflags! {
    /// Open passages out of a cell. The empty value means no connection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Direction: u8 {
        const UP = 0b0001;
        const DOWN = 0b0010;
        const LEFT = 0b0100;
        const RIGHT = 0b1000;
    }
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::UP,
        Direction::DOWN,
        Direction::LEFT,
        Direction::RIGHT,
    ];

    /// Mirror of a single flag, used to open the matching passage on the
    /// neighboring cell. Anything else maps to itself.
    pub fn opposite(self) -> Self {
        if self == Direction::UP {
            Direction::DOWN
        } else if self == Direction::DOWN {
            Direction::UP
        } else if self == Direction::LEFT {
            Direction::RIGHT
        } else if self == Direction::RIGHT {
            Direction::LEFT
        } else {
            self
        }
    }
}

/// One grid position together with its passage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub directions: Direction,
    pub coords: Coordinates,
}

impl Cell {
    pub fn new(directions: Direction, coords: Coordinates) -> Self {
        Self { directions, coords }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.directions.is_empty()
    }
}
