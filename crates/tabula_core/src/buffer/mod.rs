pub mod aligned;

pub use aligned::{ALIGNMENT, AlignedVec};
