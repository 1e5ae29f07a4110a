pub mod environment;
pub mod ids;

pub use environment::*;
pub use ids::*;
