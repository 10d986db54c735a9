use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::grids::{Cell, Coordinates, Dimensions, Direction, Grid};
use crate::notifier::{ChangeNotifier, SubscriptionId};

struct Inner {
    grid: Mutex<Grid>,
    notifier: ChangeNotifier,

    // fixed at creation, readable without the lock
    dims: Dimensions,
    entry: Coordinates,
    exit: Coordinates,
}

/// Handle to the one grid of a session.
///
/// Readers and the writer go through the same grid-wide mutex. Mutations
/// fire the change notifier only once the lock has been dropped, so an
/// observer may read the grid again without deadlocking.
#[derive(Clone)]
pub struct SharedGrid {
    inner: Arc<Inner>,
}

impl SharedGrid {
    pub fn new(grid: Grid) -> Self {
        let dims = grid.dims;
        let entry = grid.entry();
        let exit = grid.exit();

        Self {
            inner: Arc::new(Inner {
                grid: Mutex::new(grid),
                notifier: ChangeNotifier::new(),
                dims,
                entry,
                exit,
            }),
        }
    }

    #[inline]
    pub fn dims(&self) -> Dimensions {
        self.inner.dims
    }

    #[inline]
    pub fn entry(&self) -> Coordinates {
        self.inner.entry
    }

    #[inline]
    pub fn exit(&self) -> Coordinates {
        self.inner.exit
    }

    // every write keeps each cell consistent, a poisoned lock still guards a
    // usable grid
    fn lock(&self) -> MutexGuard<'_, Grid> {
        self.inner.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with the grid locked.
    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Grid) -> R,
    {
        let grid = self.lock();
        f(&grid)
    }

    /// Copies every connected cell in one critical section.
    pub fn connected_cells(&self) -> Vec<Cell> {
        self.read(|grid| grid.connected_cells().collect())
    }

    pub fn get_cell(&self, coords: Coordinates) -> Cell {
        self.read(|grid| grid.get_cell(coords))
    }

    pub fn set_cell(&self, coords: Coordinates, directions: Direction) -> Direction {
        let prev = {
            let mut grid = self.lock();
            grid.set_cell(coords, directions)
        };

        if prev != directions {
            self.inner.notifier.notify(coords);
        }
        prev
    }

    /// Carves a passage between `coords` and its neighbor along
    /// `direction`. Both cells change in the same critical section.
    pub fn open_passage(&self, coords: Coordinates, direction: Direction) -> Option<Coordinates> {
        let neighbor = {
            let mut grid = self.lock();
            grid.open_passage(coords, direction)
        }?;

        self.inner.notifier.notify(coords);
        self.inner.notifier.notify(neighbor);
        Some(neighbor)
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(Coordinates) + Send + Sync + 'static,
    {
        self.inner.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.notifier.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn shared(width: usize, height: usize) -> SharedGrid {
        let grid = Grid::with_dims(
            width,
            height,
            Coordinates::new(0, 0),
            Coordinates::new(width as i32 - 1, 0),
        )
        .unwrap();
        SharedGrid::new(grid)
    }

    #[test]
    fn observers_can_read_the_grid_they_were_told_about() {
        let grid = shared(4, 4);
        let observed = Arc::new(Mutex::new(Vec::new()));

        // would deadlock if notify fired while the writer still held the lock
        let reader = grid.clone();
        let sink = observed.clone();
        grid.subscribe(move |coords| {
            let cell = reader.get_cell(coords);
            sink.lock().unwrap().push(cell);
        });

        grid.open_passage(Coordinates::new(1, 1), Direction::DOWN);

        let observed = observed.lock().unwrap();
        assert_eq!(
            *observed,
            vec![
                Cell::new(Direction::DOWN, Coordinates::new(1, 1)),
                Cell::new(Direction::UP, Coordinates::new(1, 2)),
            ]
        );
    }

    #[test]
    fn unchanged_writes_do_not_notify() {
        let grid = shared(2, 2);
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        grid.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        grid.set_cell(Coordinates::new(0, 0), Direction::RIGHT);
        grid.set_cell(Coordinates::new(0, 0), Direction::RIGHT);
        grid.open_passage(Coordinates::new(0, 0), Direction::UP);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn readers_never_see_half_a_passage() {
        let grid = shared(64, 1);
        let writer = grid.clone();

        let handle = thread::spawn(move || {
            for x in 0..63 {
                writer.open_passage(Coordinates::new(x, 0), Direction::RIGHT);
            }
        });

        for _ in 0..200 {
            let cells = grid.connected_cells();
            for cell in &cells {
                if cell.directions.contains(Direction::RIGHT) {
                    let right = cell.coords.step(Direction::RIGHT);
                    let neighbor = cells.iter().find(|c| c.coords == right);
                    assert!(neighbor.map_or(false, |c| c.directions.contains(Direction::LEFT)));
                }
            }
        }

        handle.join().unwrap();
        assert_eq!(grid.connected_cells().len(), 64);
    }
}
