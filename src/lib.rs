// Library root

pub mod autotile;
pub mod grid;
pub mod life;
pub mod recorder;

// Primary API
pub use grid::{Grid, NEIGHBOR_OFFSETS};
