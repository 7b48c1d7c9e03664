pub mod achievements;
pub mod milestones;
pub mod portfolio;
pub mod records;
pub mod stats;

pub use records::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
