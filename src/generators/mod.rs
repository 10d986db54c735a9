pub mod aldous_broder;
pub mod backtracker;

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::driver::CancellationToken;
use crate::error::{GenerationError, SessionError};
use crate::grids::{maze_grid, Coordinates, Direction, Grid, SharedGrid};

use aldous_broder::AldousBroder;
use backtracker::Backtracker;

/// A maze generator the driver can run off the display thread.
///
/// The grid, with its entry and exit, exists from construction on.
/// `generate` carves it in place through the [`SharedGrid`], which fires the
/// change notifier for every touched cell, and must check `token` at least
/// once per step.
pub trait MazeGenerator: Send {
    fn grid(&self) -> &SharedGrid;

    fn generate(&mut self, token: &CancellationToken) -> Result<(), GenerationError>;

    /// Steps from entry to exit, known once `generate` returned `Ok`.
    fn way_to_exit(&self) -> Option<&[Direction]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Backtracker,
    AldousBroder,
}

pub fn new_generator(
    kind: GeneratorKind,
    width: usize,
    height: usize,
    config: &GeneratorConfig,
) -> Result<Box<dyn MazeGenerator>, SessionError> {
    Ok(match kind {
        GeneratorKind::Backtracker => Box::new(Backtracker::new(width, height, config.clone())?),
        GeneratorKind::AldousBroder => {
            Box::new(AldousBroder::new(width, height, config.clone())?)
        }
    })
}

pub(crate) fn seeded_rng(config: &GeneratorConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Builds the shared grid with the entry on the left edge and the exit on
/// the right edge, each on a random row.
pub(crate) fn open_grid<R: Rng>(
    width: usize,
    height: usize,
    rng: &mut R,
) -> Result<SharedGrid, SessionError> {
    maze_grid::validate_dims(width, height)?;

    let entry = Coordinates::new(0, rng.gen_range(0, height) as i32);
    let exit = Coordinates::new(width as i32 - 1, rng.gen_range(0, height) as i32);

    Ok(SharedGrid::new(Grid::with_dims(width, height, entry, exit)?))
}

/// Breadth first search from entry to exit through open passages.
///
/// Returns the single-step directions to follow from the entry, empty when
/// entry and exit coincide, `None` when the exit can't be reached.
pub fn find_way_to_exit(grid: &Grid) -> Option<Vec<Direction>> {
    let width = grid.dims.width;
    let index_of = |coords: Coordinates| coords.y as usize * width + coords.x as usize;

    let entry = grid.entry();
    let exit = grid.exit();

    // direction taken to reach each cell
    let mut came_by: Vec<Option<Direction>> = vec![None; grid.dims.cell_count()];
    let mut seen = vec![false; grid.dims.cell_count()];
    let mut queue = VecDeque::new();

    seen[index_of(entry)] = true;
    queue.push_back(entry);

    while let Some(current) = queue.pop_front() {
        if current == exit {
            break;
        }

        let open = grid.get_cell(current).directions;
        for direction in Direction::CARDINALS.iter().copied() {
            if !open.contains(direction) {
                continue;
            }
            let next = current.step(direction);
            if !grid.contains(next) || seen[index_of(next)] {
                continue;
            }
            seen[index_of(next)] = true;
            came_by[index_of(next)] = Some(direction);
            queue.push_back(next);
        }
    }

    if !seen[index_of(exit)] {
        return None;
    }

    let mut path = Vec::new();
    let mut cursor = exit;
    while let Some(direction) = came_by[index_of(cursor)] {
        path.push(direction);
        cursor = cursor.step(direction.opposite());
    }
    path.reverse();

    Some(path)
}
