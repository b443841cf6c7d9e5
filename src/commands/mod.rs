//! CLI commands implementation

pub mod check;
pub mod provision;

pub use check::*;
pub use provision::*;
