//! PostgreSQL query target: query options rendered as a parameterized SELECT.

mod builder;
mod params;

pub use builder::*;
pub use params::*;
