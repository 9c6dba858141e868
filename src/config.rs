use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use crate::snake::{SnakeState, DEFAULT_MOVE_DELAY_MS};
use crate::TermInt;

#[derive(Parser, Debug)]
#[command(name = "snake-wrap")]
#[command(version, about = "Snake that wraps around the screen edges")]
pub struct Args {
    /// Playfield width in pixels
    #[arg(long, default_value_t = 900)]
    pub width: i32,

    /// Playfield height in pixels
    #[arg(long, default_value_t = 700)]
    pub height: i32,

    /// Side of one grid cell in pixels
    #[arg(long, default_value_t = 30)]
    pub box_size: i32,

    /// Minimum time between two snake moves, in milliseconds
    #[arg(long, default_value_t = DEFAULT_MOVE_DELAY_MS)]
    pub move_delay: u64,

    /// Target frames per second
    #[arg(long, default_value_t = 60)]
    pub fps: u64,

    /// Seed for bait placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub width: i32,
    pub height: i32,
    pub box_size: i32,
    pub move_delay_ms: u64,
    pub fps: u64,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            box_size: 30,
            move_delay_ms: DEFAULT_MOVE_DELAY_MS,
            fps: 60,
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.box_size > 0, "box size must be positive, got {}", self.box_size);
        ensure!(
            self.width >= self.box_size && self.height >= self.box_size,
            "playfield {}x{} is smaller than one {}px cell",
            self.width, self.height, self.box_size
        );
        ensure!((1..=1000).contains(&self.fps), "fps must be between 1 and 1000, got {}", self.fps);

        // The board plus its border has to be addressable in terminal coordinates
        let (cols, rows) = (self.width / self.box_size, self.height / self.box_size);
        ensure!(
            TermInt::try_from(cols + 2).is_ok() && TermInt::try_from(rows + 2).is_ok(),
            "playfield of {}x{} cells does not fit in a terminal",
            cols, rows
        );
        Ok(())
    }

    pub fn frame_ms(&self) -> u64 {
        1000 / self.fps
    }

    /// Playfield size in whole cells (columns, rows).
    pub fn grid_size(&self) -> (TermInt, TermInt) {
        let cells = |bound: i32| TermInt::try_from(bound / self.box_size.max(1)).unwrap_or(TermInt::MAX);
        (cells(self.width), cells(self.height))
    }

    pub fn new_snake(&self) -> SnakeState {
        SnakeState::new(self.width, self.height, self.box_size).with_move_delay(self.move_delay_ms)
    }
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let config = Config {
            width: args.width,
            height: args.height,
            box_size: args.box_size,
            move_delay_ms: args.move_delay,
            fps: args.fps,
            seed: args.seed,
        };

        config.validate()?;
        Ok(config)
    }
}
