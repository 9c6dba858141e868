pub mod clock;
pub mod config;
pub mod game;
pub mod snake;
pub mod term;

pub type TermInt = u16;

/// Pixel position of a grid cell's top-left corner.
pub type Coords = (i32, i32);
