pub mod baseline;
pub mod constraints;
pub mod strategies;
pub mod types;

pub use baseline::*;
pub use constraints::*;
pub use strategies::*;
pub use types::*;
