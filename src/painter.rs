//! Paints the maze and the way to its exit onto a [`Canvas`].
//!
//! Cell `(x, y)` owns the 2x2 block of logical pixels anchored at
//! `(2x, 2y)`. Its center `(2x + 1, 2y + 1)` is lit whenever the cell has a
//! passage, and each edge pixel next to the center is lit when the passage
//! in that direction is open. Unlit pixels are the walls, and the whole
//! logical surface is `(2W + 1) x (2H + 1)`.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::canvas::{Canvas, Color, Rect, RectF, SurfaceSize, SurfaceTransform};
use crate::driver::PathOverlay;
use crate::grids::{Cell, Coordinates, Dimensions, Direction, SharedGrid};
use crate::redraw::RedrawRequester;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub way: Color,
    pub way_to_exit: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::BLACK,
            way: Color::WHITE,
            way_to_exit: Color::GOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    Painted { cells: usize, path_steps: usize },
    /// Called off the display thread, a redraw was queued instead.
    Requeued,
    /// Zero sized surface, nothing to do.
    Skipped,
}

pub struct Renderer {
    grid: SharedGrid,
    overlay: Arc<PathOverlay>,
    redraw: RedrawRequester,
    palette: Palette,

    // the display thread, the only one allowed to touch a canvas
    owner: ThreadId,
}

impl Renderer {
    /// Binds the renderer to the calling thread.
    pub fn new(
        grid: SharedGrid,
        overlay: Arc<PathOverlay>,
        redraw: RedrawRequester,
        palette: Palette,
    ) -> Self {
        Self {
            grid,
            overlay,
            redraw,
            palette,
            owner: thread::current().id(),
        }
    }

    pub fn logical_size(&self) -> SurfaceSize {
        logical_size(self.grid.dims())
    }

    pub fn is_display_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Draws one full frame.
    pub fn paint<C: Canvas + ?Sized>(&self, canvas: &mut C) -> PaintOutcome {
        if !self.is_display_thread() {
            self.redraw.request();
            return PaintOutcome::Requeued;
        }

        let physical = canvas.size();
        if physical.is_empty() {
            return PaintOutcome::Skipped;
        }

        let logical = self.logical_size();
        let mut surface = LogicalSurface::new(canvas, logical);

        surface.canvas.clear(self.palette.background);
        surface.canvas.push_transform(SurfaceTransform::fit(
            RectF::new(0.0, 0.0, logical.width as f32, logical.height as f32),
            RectF::new(0.0, 0.0, physical.width as f32, physical.height as f32),
        ));

        let entry = self.grid.entry();
        let exit = self.grid.exit();

        surface.fill(self.palette.way, entry_marker(entry));
        surface.fill(self.palette.way, exit_marker(exit));

        let way = self.palette.way;
        let cells = self.grid.read(|grid| {
            let mut count = 0;
            for cell in grid.connected_cells() {
                draw_maze_cell(&mut surface, way, cell);
                count += 1;
            }
            count
        });

        let mut path_steps = 0;
        if let Some(way_to_exit) = self.overlay.visible_path() {
            let color = self.palette.way_to_exit;
            surface.fill(color, entry_marker(entry));

            let mut coords = entry;
            for direction in way_to_exit.iter().copied() {
                draw_maze_cell(&mut surface, color, Cell::new(direction, coords));
                coords = coords.step(direction);
            }

            surface.fill(color, exit_cap(exit));
            path_steps = way_to_exit.len();
        }

        surface.canvas.pop_transform();

        PaintOutcome::Painted { cells, path_steps }
    }
}

/// Logical pixel size for a maze of `dims`.
pub fn logical_size(dims: Dimensions) -> SurfaceSize {
    SurfaceSize::new(dims.width as u32 * 2 + 1, dims.height as u32 * 2 + 1)
}

/// Every coordinate the cursor visits walking `steps` from `entry`,
/// starting with `entry` itself.
pub fn walk_path(entry: Coordinates, steps: &[Direction]) -> Vec<Coordinates> {
    let mut visited = Vec::with_capacity(steps.len() + 1);
    let mut coords = entry;
    visited.push(coords);
    for direction in steps {
        coords = coords.step(*direction);
        visited.push(coords);
    }
    visited
}

fn entry_marker(entry: Coordinates) -> Rect {
    Rect::pixel(entry.x * 2, entry.y * 2 + 1)
}

fn exit_marker(exit: Coordinates) -> Rect {
    Rect::pixel(exit.x * 2 + 2, exit.y * 2 + 1)
}

// closes the path from the exit cell's center through its right edge
fn exit_cap(exit: Coordinates) -> Rect {
    Rect::new(exit.x * 2 + 1, exit.y * 2 + 1, 2, 1)
}

/// Canvas wrapper that refuses to paint outside the logical surface. A
/// rectangle out there means a cell outside the grid, which is a bug.
pub struct LogicalSurface<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    size: SurfaceSize,
}

impl<'a, C: Canvas + ?Sized> LogicalSurface<'a, C> {
    pub fn new(canvas: &'a mut C, size: SurfaceSize) -> Self {
        Self { canvas, size }
    }

    pub fn fill(&mut self, color: Color, rect: Rect) {
        assert!(
            rect.x >= 0
                && rect.y >= 0
                && rect.x as u32 + rect.width <= self.size.width
                && rect.y as u32 + rect.height <= self.size.height,
            "{:?} is outside the {}x{} maze surface",
            rect,
            self.size.width,
            self.size.height
        );
        self.canvas.fill_rect(color, rect);
    }
}

/// Center pixel of the cell plus one edge pixel per open passage.
pub fn draw_maze_cell<C: Canvas + ?Sized>(surface: &mut LogicalSurface<'_, C>, color: Color, cell: Cell) {
    let Cell { directions, coords } = cell;
    let (x, y) = (coords.x, coords.y);

    surface.fill(color, Rect::pixel(x * 2 + 1, y * 2 + 1));

    if directions.contains(Direction::DOWN) {
        surface.fill(color, Rect::pixel(x * 2 + 1, y * 2 + 2));
    }

    if directions.contains(Direction::LEFT) {
        surface.fill(color, Rect::pixel(x * 2, y * 2 + 1));
    }

    if directions.contains(Direction::RIGHT) {
        surface.fill(color, Rect::pixel(x * 2 + 2, y * 2 + 1));
    }

    if directions.contains(Direction::UP) {
        surface.fill(color, Rect::pixel(x * 2 + 1, y * 2));
    }
}
