pub mod battery;
pub mod grid;
pub mod interval;
pub mod schedule;

pub use battery::*;
pub use grid::*;
pub use interval::*;
pub use schedule::*;
