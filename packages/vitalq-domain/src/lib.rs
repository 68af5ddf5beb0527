pub mod classify;
pub mod decompose;
pub mod extract;
pub mod fields;
pub mod plan;
pub mod prompt;

mod error;

pub use error::{Error, Result};
