use std::thread;

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::GeneratorConfig;
use crate::driver::CancellationToken;
use crate::error::{GenerationError, SessionError};
use crate::generators::{find_way_to_exit, open_grid, seeded_rng, MazeGenerator};
use crate::grids::{Coordinates, Direction, SharedGrid};

/// Random walk that carves a passage whenever it steps into a cell it has
/// never seen. Slow to finish, but the resulting spanning tree is uniform.
pub struct AldousBroder {
    grid: SharedGrid,
    config: GeneratorConfig,
    visited: Vec<bool>,
    remaining: usize,
    rng: StdRng,
    current_cell: Coordinates,
    way_to_exit: Option<Vec<Direction>>,
    pub done: bool,
}

impl AldousBroder {
    pub fn new(width: usize, height: usize, config: GeneratorConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let mut rng = seeded_rng(&config);
        let grid = open_grid(width, height, &mut rng)?;

        let current_cell = grid.entry();
        let mut visited = vec![false; width * height];
        visited[current_cell.y as usize * width + current_cell.x as usize] = true;

        Ok(Self {
            grid,
            config,
            visited,
            remaining: width * height - 1,
            rng,
            current_cell,
            way_to_exit: None,
            done: width * height == 1,
        })
    }

    /// Moves the walker once. Returns true if the move carved a passage.
    pub fn step_generation(&mut self) -> bool {
        if self.remaining == 0 {
            self.done = true;
            return false;
        }

        let dims = self.grid.dims();
        let current = self.current_cell;
        let neighbor = loop {
            let direction = *Direction::CARDINALS
                .choose(&mut self.rng)
                .unwrap_or(&Direction::RIGHT);
            let next = current.step(direction);
            if dims.contains(next) {
                break (direction, next);
            }
        };

        let (direction, next) = neighbor;
        let index = next.y as usize * dims.width + next.x as usize;
        let carved = !self.visited[index];
        if carved {
            self.grid.open_passage(current, direction);
            self.visited[index] = true;
            self.remaining -= 1;
        }

        self.current_cell = next;
        self.done = self.remaining == 0;
        carved
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl MazeGenerator for AldousBroder {
    fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    fn generate(&mut self, token: &CancellationToken) -> Result<(), GenerationError> {
        while !self.done {
            if token.is_cancelled() {
                debug!("aldous-broder cancelled with {} cells left", self.remaining);
                return Err(GenerationError::Cancelled);
            }

            if self.step_generation() && !self.config.step_delay.is_zero() {
                thread::sleep(self.config.step_delay);
            }
        }

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
