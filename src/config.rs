use std::time::Duration;

use crate::error::SessionError;
use crate::generators::GeneratorKind;
use crate::grids::maze_grid;
use crate::painter::Palette;

// cancellation is only observed between steps
const MAX_STEP_DELAY: Duration = Duration::from_secs(1);

/// Parameters handed through to the maze generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Fixed seed for a reproducible maze, `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Pause after every carved passage so the maze grows visibly.
    pub step_delay: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            step_delay: Duration::from_millis(2),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.step_delay > MAX_STEP_DELAY {
            return Err(SessionError::InvalidConfig {
                reason: format!(
                    "step delay {:?} is longer than {:?}",
                    self.step_delay, MAX_STEP_DELAY
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    pub generator_kind: GeneratorKind,
    pub generator: GeneratorConfig,
    pub palette: Palette,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 54,
            generator_kind: GeneratorKind::Backtracker,
            generator: GeneratorConfig::default(),
            palette: Palette::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        maze_grid::validate_dims(self.width, self.height)?;
        self.generator.validate()
    }
}
