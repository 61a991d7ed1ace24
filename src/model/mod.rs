pub mod board;
pub mod task;

pub use board::*;
pub use task::*;
