//! Draws a maze while a background task is still carving it, then traces
//! the way from its entry to its exit.
//!
//! The generator writes into a [`SharedGrid`] from its own thread. Every
//! change requests a coalescing redraw that lands on the display thread,
//! where the [`Renderer`] snapshots the grid under its lock and paints it.

pub mod canvas;
pub mod config;
pub mod driver;
pub mod error;
pub mod generators;
pub mod grids;
pub mod notifier;
pub mod painter;
pub mod redraw;

pub use canvas::{Canvas, Color, PixelBuffer, SurfaceSize, VertexCanvas, Vertex};
pub use config::{GeneratorConfig, SessionConfig};
pub use driver::{CancellationToken, GenerationDriver, OverlayStatus, PathOverlay};
pub use error::{GenerationError, SessionError};
pub use generators::{new_generator, GeneratorKind, MazeGenerator};
pub use grids::{Cell, Coordinates, Dimensions, Direction, Grid, SharedGrid};
pub use painter::{PaintOutcome, Palette, Renderer};
pub use redraw::RedrawRequester;

/// Builds a session from `config`: the generator with its grid, and the
/// driver wired to `redraw`. Nothing runs until [`GenerationDriver::start`].
pub fn open_session(
    config: &SessionConfig,
    redraw: RedrawRequester,
) -> Result<GenerationDriver, SessionError> {
    config.validate()?;
    let generator = new_generator(
        config.generator_kind,
        config.width,
        config.height,
        &config.generator,
    )?;
    GenerationDriver::new(generator, redraw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(kind: GeneratorKind) -> SessionConfig {
        SessionConfig {
            width: 9,
            height: 6,
            generator_kind: kind,
            generator: GeneratorConfig {
                seed: Some(17),
                step_delay: Duration::from_millis(0),
            },
            ..SessionConfig::default()
        }
    }

    #[test]
    fn full_session_draws_maze_and_way_to_exit() {
        for kind in [GeneratorKind::Backtracker, GeneratorKind::AldousBroder] {
            let (redraw, rx) = redraw::channel();
            let mut driver = open_session(&config(kind), redraw.clone()).unwrap();
            let renderer = driver.renderer(Palette::default());

            driver.start();
            let status = driver.wait();
            assert!(matches!(status, OverlayStatus::Ready { steps } if steps > 0));
            assert!(rx.try_iter().count() >= 1);

            let mut buffer = PixelBuffer::new(renderer.logical_size());
            redraw.take();
            match renderer.paint(&mut buffer) {
                PaintOutcome::Painted { cells, path_steps } => {
                    assert_eq!(cells, 9 * 6);
                    assert!(path_steps > 0);
                }
                other => panic!("unexpected {:?}", other),
            }

            // entry marker on the left border, exit cap reaching the right border
            let entry = driver.grid().entry();
            let exit = driver.grid().exit();
            assert_eq!(buffer.pixel(0, 2 * entry.y as u32 + 1), Color::GOLD);
            assert_eq!(buffer.pixel(18, 2 * exit.y as u32 + 1), Color::GOLD);
            assert!(buffer.count(Color::WHITE) > 0);

            assert_eq!(driver.shutdown(), status);
        }
    }

    #[test]
    fn invalid_config_opens_nothing() {
        let (redraw, _rx) = redraw::channel();
        let config = SessionConfig {
            height: 0,
            ..SessionConfig::default()
        };

        assert_eq!(
            open_session(&config, redraw).err(),
            Some(SessionError::InvalidDimensions {
                width: 96,
                height: 0
            })
        );
    }
}
