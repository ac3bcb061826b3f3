pub mod preprocessing;
pub mod extraction;
pub mod growing;
pub mod morphology;
pub mod editing;

pub use preprocessing::*;
pub use extraction::*;
pub use growing::*;
