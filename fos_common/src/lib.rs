mod vnd;

pub mod helpers;
pub mod op;

pub use vnd::{Vnd, VndConversionError};
