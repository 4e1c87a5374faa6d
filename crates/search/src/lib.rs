//! Search strategies over an enumerated kernel configuration space.

pub mod annealing;
pub mod cost;
pub mod full;
pub mod pso;
pub mod random;
pub mod searcher;

pub use annealing::*;
pub use cost::*;
pub use full::*;
pub use pso::*;
pub use random::*;
pub use searcher::*;
