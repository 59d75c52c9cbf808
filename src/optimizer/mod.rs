pub mod constraints;
pub mod greedy;

pub use constraints::*;
pub use greedy::*;
