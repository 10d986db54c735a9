use crate::error::SessionError;
use crate::grids::{Cell, Coordinates, Dimensions, Direction};

/// Largest side accepted for a maze, keeps the logical surface well inside
/// `u32` and the vertex count sane.
pub const MAX_SIDE: usize = 4096;

pub fn validate_dims(width: usize, height: usize) -> Result<(), SessionError> {
    if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
        return Err(SessionError::InvalidDimensions { width, height });
    }
    Ok(())
}

pub struct Grid {
    pub dims: Dimensions,

    // one entry per cell, row major
    cells: Vec<Direction>,

    entry: Coordinates,
    exit: Coordinates,
}

impl Grid {
    pub fn with_dims(
        width: usize,
        height: usize,
        entry: Coordinates,
        exit: Coordinates,
    ) -> Result<Self, SessionError> {
        validate_dims(width, height)?;

        let dims = Dimensions::new(width, height);
        for (name, coords) in [("entry", entry), ("exit", exit)] {
            if !dims.contains(coords) {
                return Err(SessionError::OutOfBounds {
                    name,
                    x: coords.x,
                    y: coords.y,
                    width,
                    height,
                });
            }
        }

        Ok(Self {
            cells: vec![Direction::empty(); dims.cell_count()],
            dims,
            entry,
            exit,
        })
    }

    #[inline]
    pub fn entry(&self) -> Coordinates {
        self.entry
    }

    #[inline]
    pub fn exit(&self) -> Coordinates {
        self.exit
    }

    #[inline]
    fn index_of(&self, coords: Coordinates) -> usize {
        debug_assert!(self.dims.contains(coords), "{:?} outside grid", coords);
        (self.dims.width * coords.y as usize) + coords.x as usize
    }

    #[inline]
    pub fn contains(&self, coords: Coordinates) -> bool {
        self.dims.contains(coords)
    }

    #[inline]
    pub fn get_cell(&self, coords: Coordinates) -> Cell {
        Cell::new(self.cells[self.index_of(coords)], coords)
    }

    /// Replaces the passages of one cell, returning the previous ones.
    #[inline]
    pub fn set_cell(&mut self, coords: Coordinates, directions: Direction) -> Direction {
        let index = self.index_of(coords);
        let prev = self.cells[index];
        self.cells[index] = directions;
        prev
    }

    /// Opens the passage leaving `coords` along `direction` and the
    /// matching passage on the neighbor. Returns the neighbor, or `None`
    /// when the step leaves the grid, in which case nothing changes.
    pub fn open_passage(&mut self, coords: Coordinates, direction: Direction) -> Option<Coordinates> {
        let neighbor = coords.step(direction);
        if neighbor == coords || !self.contains(neighbor) {
            return None;
        }

        let here = self.index_of(coords);
        let there = self.index_of(neighbor);
        self.cells[here] |= direction;
        self.cells[there] |= direction.opposite();

        Some(neighbor)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let width = self.dims.width;
        self.cells.iter().enumerate().map(move |(index, directions)| {
            let coords = Coordinates::new((index % width) as i32, (index / width) as i32);
            Cell::new(*directions, coords)
        })
    }

    pub fn connected_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(Cell::is_connected)
    }

    pub fn clear(&mut self) {
        self.cells = vec![Direction::empty(); self.cells.len()];
    }
}
