use std::thread;

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::GeneratorConfig;
use crate::driver::CancellationToken;
use crate::error::{GenerationError, SessionError};
use crate::generators::{find_way_to_exit, open_grid, seeded_rng, MazeGenerator};
use crate::grids::{Coordinates, Direction, SharedGrid};

/// Randomized depth first search: walk to a random unvisited neighbor,
/// carving as it goes, and back up along the stack at dead ends.
pub struct Backtracker {
    grid: SharedGrid,
    config: GeneratorConfig,
    rng: StdRng,
    visited: Vec<bool>,
    stack: Vec<Coordinates>,
    way_to_exit: Option<Vec<Direction>>,
    pub done: bool,
}

impl Backtracker {
    pub fn new(width: usize, height: usize, config: GeneratorConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let mut rng = seeded_rng(&config);
        let grid = open_grid(width, height, &mut rng)?;

        let entry = grid.entry();
        let mut visited = vec![false; width * height];
        visited[entry.y as usize * width + entry.x as usize] = true;

        Ok(Self {
            grid,
            config,
            rng,
            visited,
            stack: vec![entry],
            way_to_exit: None,
            done: false,
        })
    }

    #[inline]
    fn index_of(&self, coords: Coordinates) -> usize {
        coords.y as usize * self.grid.dims().width + coords.x as usize
    }

    /// Advances by one move. Returns true if a passage was carved, false for
    /// a backtrack or once done.
    pub fn step_generation(&mut self) -> bool {
        let current = match self.stack.last() {
            Some(current) => *current,
            None => {
                self.done = true;
                return false;
            }
        };

        let dims = self.grid.dims();
        let unvisited: Vec<Direction> = Direction::CARDINALS
            .iter()
            .copied()
            .filter(|direction| {
                let next = current.step(*direction);
                dims.contains(next) && !self.visited[self.index_of(next)]
            })
            .collect();

        match unvisited.choose(&mut self.rng) {
            Some(direction) => {
                if let Some(next) = self.grid.open_passage(current, *direction) {
                    let index = self.index_of(next);
                    self.visited[index] = true;
                    self.stack.push(next);
                }
                true
            }
            None => {
                self.stack.pop();
                self.done = self.stack.is_empty();
                false
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl MazeGenerator for Backtracker {
    fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    fn generate(&mut self, token: &CancellationToken) -> Result<(), GenerationError> {
        let mut carved = 0usize;
        while !self.done {
            if token.is_cancelled() {
                debug!("backtracker cancelled after {} passages", carved);
                return Err(GenerationError::Cancelled);
            }

            if self.step_generation() {
                carved += 1;
                if !self.config.step_delay.is_zero() {
                    thread::sleep(self.config.step_delay);
                }
            }
        }

        debug!("backtracker carved {} passages", carved);
        if token.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        self.way_to_exit = self.grid.read(find_way_to_exit);
        Ok(())
    }

    fn way_to_exit(&self) -> Option<&[Direction]> {
        self.way_to_exit.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::test_support::assert_perfect_maze;
    use std::time::Duration;

    fn config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            seed: Some(seed),
            step_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn carves_a_perfect_maze() {
        let mut generator = Backtracker::new(12, 9, config(3)).unwrap();

        generator.generate(&CancellationToken::new()).unwrap();

        assert!(generator.is_done());
        let way = generator.way_to_exit().expect("way to exit").to_vec();
        assert!(!way.is_empty());
        assert_perfect_maze(generator.grid(), &way);
    }

    #[test]
    fn same_seed_same_maze() {
        let mut first = Backtracker::new(8, 8, config(42)).unwrap();
        let mut second = Backtracker::new(8, 8, config(42)).unwrap();

        first.generate(&CancellationToken::new()).unwrap();
        second.generate(&CancellationToken::new()).unwrap();

        assert_eq!(first.grid().entry(), second.grid().entry());
        assert_eq!(first.grid().connected_cells(), second.grid().connected_cells());
        assert_eq!(first.way_to_exit(), second.way_to_exit());
    }

    #[test]
    fn stops_when_cancelled() {
        let mut generator = Backtracker::new(6, 6, config(1)).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(generator.generate(&token), Err(GenerationError::Cancelled));
        assert_eq!(generator.grid().connected_cells().len(), 0);
        assert!(generator.way_to_exit().is_none());
    }

    #[test]
    fn cancelled_after_last_step_skips_the_way_to_exit() {
        let mut generator = Backtracker::new(5, 4, config(6)).unwrap();
        while !generator.is_done() {
            generator.step_generation();
        }
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(generator.generate(&token), Err(GenerationError::Cancelled));
        assert!(generator.way_to_exit().is_none());
        assert_eq!(generator.grid().connected_cells().len(), 20);
    }

    #[test]
    fn single_cell_is_done_immediately() {
        let mut generator = Backtracker::new(1, 1, config(9)).unwrap();

        generator.generate(&CancellationToken::new()).unwrap();

        assert_eq!(generator.way_to_exit(), Some(&[][..]));
        assert_eq!(generator.grid().connected_cells().len(), 0);
    }

    #[test]
    fn rejects_an_empty_grid() {
        assert!(matches!(
            Backtracker::new(0, 4, config(0)),
            Err(SessionError::InvalidDimensions { .. })
        ));
    }
}
