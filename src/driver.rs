//! Runs a maze generator off the display thread and turns its result into
//! the way-to-exit overlay.
//!
//! The driver owns one cancellation token per session. Generation runs as a
//! future on a single-worker [`ThreadPool`]; when it completes without being
//! cancelled the driver asks the generator for the way to the exit exactly
//! once, publishes it into a [`PathOverlay`] and requests one redraw.
//! Failures and cancellation never reach the renderer, the overlay simply
//! stays hidden.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::executor::{block_on, ThreadPool};
use futures::future::{FutureExt, RemoteHandle};
use log::{debug, info, warn};

use crate::error::{GenerationError, SessionError};
use crate::generators::MazeGenerator;
use crate::grids::{Direction, SharedGrid};
use crate::notifier::SubscriptionId;
use crate::painter::{Palette, Renderer};
use crate::redraw::RedrawRequester;

/// Cooperative cancellation flag shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// What became of the way-to-exit overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayStatus {
    /// Generation still running.
    Pending,
    Ready { steps: usize },
    /// Generation finished but the generator had no way to the exit.
    NoPath,
    Cancelled,
    Failed { reason: String },
}

/// The way to the exit, written once and then only read.
///
/// The path itself sits in a [`OnceLock`]. `show_path` is raised after the
/// path is stored, so a reader that sees the flag sees the whole path.
pub struct PathOverlay {
    path: OnceLock<Vec<Direction>>,
    show_path: AtomicBool,
    status: Mutex<OverlayStatus>,
}

impl Default for PathOverlay {
    fn default() -> Self {
        Self {
            path: OnceLock::new(),
            show_path: AtomicBool::new(false),
            status: Mutex::new(OverlayStatus::Pending),
        }
    }
}

impl PathOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the way to the exit. Returns true if the overlay became
    /// visible, false for an empty path or if a path was already stored.
    pub fn publish(&self, path: Vec<Direction>) -> bool {
        if path.is_empty() {
            self.set_status(OverlayStatus::NoPath);
            return false;
        }

        let steps = path.len();
        if self.path.set(path).is_err() {
            return false;
        }
        self.show_path.store(true, Ordering::Release);
        self.set_status(OverlayStatus::Ready { steps });
        true
    }

    pub fn is_visible(&self) -> bool {
        self.show_path.load(Ordering::Acquire)
    }

    pub fn visible_path(&self) -> Option<&[Direction]> {
        if !self.is_visible() {
            return None;
        }
        self.path.get().map(Vec::as_slice)
    }

    pub fn status(&self) -> OverlayStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: OverlayStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

pub struct GenerationDriver {
    grid: SharedGrid,
    overlay: Arc<PathOverlay>,
    redraw: RedrawRequester,
    token: CancellationToken,
    subscription: SubscriptionId,

    generator: Option<Box<dyn MazeGenerator>>,
    pool: ThreadPool,
    task: Option<RemoteHandle<OverlayStatus>>,
}

impl GenerationDriver {
    /// Takes the generator's grid and routes every cell change to `redraw`.
    pub fn new(
        generator: Box<dyn MazeGenerator>,
        redraw: RedrawRequester,
    ) -> Result<Self, SessionError> {
        let grid = generator.grid().clone();

        let pool = ThreadPool::builder()
            .pool_size(1)
            .name_prefix("maze-gen-")
            .create()
            .map_err(|err| SessionError::Executor {
                reason: err.to_string(),
            })?;

        let trigger = redraw.clone();
        let subscription = grid.subscribe(move |_| trigger.request());

        let dims = grid.dims();
        info!(
            "maze session {}x{}, entry {:?}, exit {:?}",
            dims.width,
            dims.height,
            grid.entry(),
            grid.exit()
        );

        Ok(Self {
            grid,
            overlay: Arc::new(PathOverlay::new()),
            redraw,
            token: CancellationToken::new(),
            subscription,
            generator: Some(generator),
            pool,
            task: None,
        })
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    pub fn overlay(&self) -> Arc<PathOverlay> {
        self.overlay.clone()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn status(&self) -> OverlayStatus {
        self.overlay.status()
    }

    /// A renderer for this session bound to the calling thread, which
    /// becomes the display thread.
    pub fn renderer(&self, palette: Palette) -> Renderer {
        Renderer::new(
            self.grid.clone(),
            self.overlay.clone(),
            self.redraw.clone(),
            palette,
        )
    }

    /// The generation run as a future. Yields `None` once the generator has
    /// been handed out, a session generates exactly once.
    pub fn generate(
        &mut self,
        token: CancellationToken,
    ) -> Option<impl Future<Output = OverlayStatus> + Send + 'static> {
        let mut generator = self.generator.take()?;
        let overlay = self.overlay.clone();
        let redraw = self.redraw.clone();

        Some(async move {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(&token)))
                .unwrap_or_else(|_| {
                    Err(GenerationError::Failed {
                        reason: "generator panicked".to_string(),
                    })
                });

            complete(outcome, generator.as_ref(), &token, &overlay, &redraw)
        })
    }

    /// Spawns generation on the background executor. Returns false if it
    /// was already started.
    pub fn start(&mut self) -> bool {
        let future = match self.generate(self.token.clone()) {
            Some(future) => future,
            None => return false,
        };

        let (task, handle) = future.remote_handle();
        self.pool.spawn_ok(task);
        self.task = Some(handle);
        true
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Blocks until the background run is over.
    pub fn wait(&mut self) -> OverlayStatus {
        if let Some(task) = self.task.take() {
            return block_on(task);
        }
        self.overlay.status()
    }

    /// Cancels generation and waits for the background task, no grid
    /// write happens after this returns.
    pub fn shutdown(mut self) -> OverlayStatus {
        info!("shutting down maze session");
        self.cancel();
        let status = self.wait();
        self.grid.unsubscribe(self.subscription);
        status
    }
}

impl Drop for GenerationDriver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

fn complete(
    outcome: Result<(), GenerationError>,
    generator: &dyn MazeGenerator,
    token: &CancellationToken,
    overlay: &PathOverlay,
    redraw: &RedrawRequester,
) -> OverlayStatus {
    match outcome {
        Err(GenerationError::Cancelled) => {
            info!("generation cancelled, no way to exit");
            overlay.set_status(OverlayStatus::Cancelled);
        }
        Err(GenerationError::Failed { reason }) => {
            warn!("generation failed: {}", reason);
            overlay.set_status(OverlayStatus::Failed { reason });
        }
        // cancelled right as the last step landed, the session is ending
        Ok(()) if token.is_cancelled() => {
            info!("generation finished after cancellation, skipping way to exit");
            overlay.set_status(OverlayStatus::Cancelled);
        }
        Ok(()) => {
            let path = generator
                .way_to_exit()
                .map(<[Direction]>::to_vec)
                .unwrap_or_default();

            let steps = path.len();
            if overlay.publish(path) {
                info!("way to exit ready, {} steps", steps);
                redraw.request();
            } else {
                debug!("no way to exit to be drawn");
            }
        }
    }

    overlay.status()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, PixelBuffer};
    use crate::grids::{Coordinates, Grid};
    use crate::painter::PaintOutcome;
    use crate::redraw::{self, DisplayMessage};
    use crossbeam_channel::Receiver;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Carves a straight corridor along row 0, one cell per step.
    struct Corridor {
        grid: SharedGrid,
        path: Option<Vec<Direction>>,
        // released by the test to let each step through
        gate: Option<Receiver<()>>,
        steps_taken: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Corridor {
        fn new(width: usize) -> Self {
            let grid = Grid::with_dims(
                width,
                1,
                Coordinates::new(0, 0),
                Coordinates::new(width as i32 - 1, 0),
            )
            .unwrap();
            Self {
                grid: SharedGrid::new(grid),
                path: None,
                gate: None,
                steps_taken: Arc::new(AtomicUsize::new(0)),
                fail: false,
            }
        }
    }

    impl MazeGenerator for Corridor {
        fn grid(&self) -> &SharedGrid {
            &self.grid
        }

        fn generate(&mut self, token: &CancellationToken) -> Result<(), GenerationError> {
            if self.fail {
                return Err(GenerationError::Failed {
                    reason: "no luck".to_string(),
                });
            }

            let width = self.grid.dims().width as i32;
            for x in 0..width - 1 {
                if let Some(gate) = &self.gate {
                    let _ = gate.recv_timeout(Duration::from_secs(5));
                }
                if token.is_cancelled() {
                    return Err(GenerationError::Cancelled);
                }
                self.grid.open_passage(Coordinates::new(x, 0), Direction::RIGHT);
                self.steps_taken.fetch_add(1, Ordering::SeqCst);
            }

            self.path = Some(vec![Direction::RIGHT; (width - 1) as usize]);
            Ok(())
        }

        fn way_to_exit(&self) -> Option<&[Direction]> {
            self.path.as_deref()
        }
    }

    fn paint(renderer: &Renderer) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(renderer.logical_size());
        renderer.paint(&mut buffer);
        buffer
    }

    #[test]
    fn completed_run_publishes_the_way_to_exit() {
        let (redraw, rx) = redraw::channel();
        let mut driver = GenerationDriver::new(Box::new(Corridor::new(3)), redraw.clone()).unwrap();
        let renderer = driver.renderer(Palette::default());

        assert!(driver.start());
        assert!(!driver.start());
        assert_eq!(driver.wait(), OverlayStatus::Ready { steps: 2 });

        assert!(rx.try_iter().count() >= 1);
        assert!(redraw.take());

        let buffer = paint(&renderer);
        assert_eq!(buffer.positions_of(Color::GOLD), (0..7).map(|x| (x, 1)).collect::<Vec<_>>());
    }

    #[test]
    fn failures_leave_the_overlay_hidden() {
        let (redraw, _rx) = redraw::channel();
        let mut corridor = Corridor::new(4);
        corridor.fail = true;
        let mut driver = GenerationDriver::new(Box::new(corridor), redraw).unwrap();

        driver.start();

        assert_eq!(
            driver.wait(),
            OverlayStatus::Failed {
                reason: "no luck".to_string()
            }
        );
        assert!(!driver.overlay().is_visible());
    }

    #[test]
    fn empty_way_to_exit_requests_no_redraw() {
        let (redraw, rx) = redraw::channel();
        // a single cell has nothing to carve and an empty way out
        let mut driver = GenerationDriver::new(Box::new(Corridor::new(1)), redraw.clone()).unwrap();

        driver.start();

        assert_eq!(driver.wait(), OverlayStatus::NoPath);
        assert_eq!(rx.try_iter().count(), 0);
        assert_eq!(redraw.requests(), 0);
        assert!(driver.overlay().visible_path().is_none());
    }

    #[test]
    fn cancelling_mid_run_never_computes_a_path() {
        let (redraw, _rx) = redraw::channel();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let mut corridor = Corridor::new(10);
        corridor.gate = Some(gate_rx);
        let steps_taken = corridor.steps_taken.clone();

        let mut driver = GenerationDriver::new(Box::new(corridor), redraw.clone()).unwrap();
        let renderer = driver.renderer(Palette::default());
        driver.start();

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        while steps_taken.load(Ordering::SeqCst) < 2 {
            std::thread::yield_now();
        }
        driver.cancel();
        gate_tx.send(()).unwrap();

        assert_eq!(driver.wait(), OverlayStatus::Cancelled);
        assert_eq!(steps_taken.load(Ordering::SeqCst), 2);

        let first = paint(&renderer);
        let second = paint(&renderer);
        assert_eq!(first.count(Color::GOLD), 0);
        // two passages: cells 0..=2 of the corridor plus the markers
        assert_eq!(first.count(Color::WHITE), 5 + 2);
        assert_eq!(first.pixels(), second.pixels());
    }

    #[test]
    fn cell_changes_coalesce_into_a_single_paint() {
        let (redraw, rx) = redraw::channel();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let mut corridor = Corridor::new(3);
        corridor.gate = Some(gate_rx);
        let steps_taken = corridor.steps_taken.clone();

        let mut driver = GenerationDriver::new(Box::new(corridor), redraw.clone()).unwrap();
        let renderer = driver.renderer(Palette::default());
        driver.start();

        // both passages land before the display thread looks at its queue
        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        while steps_taken.load(Ordering::SeqCst) < 2 {
            std::thread::yield_now();
        }
        driver.wait();

        let wakes: Vec<DisplayMessage> = rx.try_iter().collect();
        assert_eq!(wakes, vec![DisplayMessage::Redraw]);
        assert!(redraw.requests() >= 4);

        assert!(redraw.take());
        let buffer = paint(&renderer);
        assert_eq!(buffer.count(Color::BLACK) + buffer.count(Color::WHITE) + buffer.count(Color::GOLD), 21);
        assert_eq!(buffer.count(Color::GOLD), 7);
    }

    #[test]
    fn shutdown_cancels_and_joins() {
        let (redraw, _rx) = redraw::channel();
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let mut corridor = Corridor::new(5);
        corridor.gate = Some(gate_rx);
        let steps_taken = corridor.steps_taken.clone();

        let mut driver = GenerationDriver::new(Box::new(corridor), redraw).unwrap();
        let token = driver.token();
        let grid = driver.grid().clone();
        driver.start();

        // the generator is parked on its gate until shutdown has cancelled
        let releaser = {
            let token = token.clone();
            std::thread::spawn(move || {
                while !token.is_cancelled() {
                    std::thread::yield_now();
                }
                let _ = gate_tx.send(());
            })
        };

        let status = driver.shutdown();
        releaser.join().unwrap();

        assert!(token.is_cancelled());
        assert_eq!(status, OverlayStatus::Cancelled);
        assert_eq!(steps_taken.load(Ordering::SeqCst), 0);
        assert_eq!(grid.connected_cells().len(), 0);
    }

    #[test]
    fn overlay_is_published_once() {
        let overlay = PathOverlay::new();

        assert_eq!(overlay.status(), OverlayStatus::Pending);
        assert!(overlay.publish(vec![Direction::DOWN]));
        assert!(!overlay.publish(vec![Direction::UP, Direction::UP]));
        assert_eq!(overlay.visible_path(), Some(&[Direction::DOWN][..]));
        assert_eq!(overlay.status(), OverlayStatus::Ready { steps: 1 });
    }
}
