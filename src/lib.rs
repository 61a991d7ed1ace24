pub mod client;
pub mod error;
pub mod model;
pub mod ops;
pub mod store;

pub use error::{BoardError, Result};
