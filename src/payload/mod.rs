pub mod generator;
pub mod types;

pub use generator::{generate, PATTERN};
pub use types::Payload;
