use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Coord;

/// Default cell pitch, in board units.
pub const BLOCK: Coord = 20;
/// Default tick rate, in ticks per second.
pub const BASE_SPEED: u32 = 10;
/// Extra ticks per second granted by speed food.
pub const SPEED_BOOST: u32 = 5;
/// How many ticks a speed boost lasts.
pub const SPEED_BOOST_TICKS: u32 = 50;
pub const INITIAL_LIVES: u32 = 3;
pub const INITIAL_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cell pitch must be positive")]
    ZeroBlock,
    #[error("base speed must be at least one tick per second")]
    ZeroSpeed,
    #[error("board of {cols}x{rows} cells cannot hold the starting snake")]
    BoardTooSmall { cols: Coord, rows: Coord },
}

/// Board and pacing parameters. Positions are measured in board units
/// (pixels in the reference game), and every cell is `block` units wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: Coord,
    pub height: Coord,
    pub block: Coord,
    /// Ticks per second without a speed boost.
    pub base_speed: u32,
    /// Real-time hold after a wall hit before the snake respawns.
    pub recovery_delay_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            block: BLOCK,
            base_speed: BASE_SPEED,
            recovery_delay_ms: 1000,
        }
    }
}

impl GameConfig {
    pub fn new(width: Coord, height: Coord) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn cols(&self) -> Coord {
        if self.block > 0 {
            self.width / self.block
        } else {
            0
        }
    }

    pub fn rows(&self) -> Coord {
        if self.block > 0 {
            self.height / self.block
        } else {
            0
        }
    }

    pub fn boosted_speed(&self) -> u32 {
        self.base_speed.saturating_add(SPEED_BOOST)
    }

    /// Number of ticks that cover the recovery delay when the driver runs at
    /// `speed` ticks per second. Never zero.
    pub fn recovery_ticks(&self, speed: u32) -> u32 {
        let ticks = self
            .recovery_delay_ms
            .saturating_mul(u64::from(speed))
            .div_ceil(1000);
        ticks.clamp(1, u64::from(u32::MAX)) as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block <= 0 {
            return Err(ConfigError::ZeroBlock);
        }
        if self.base_speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        // Head sits at column cols/2 with two segments trailing to the left.
        let (cols, rows) = (self.cols(), self.rows());
        if cols < 4 || rows < 1 {
            return Err(ConfigError::BoardTooSmall { cols, rows });
        }
        Ok(())
    }
}
