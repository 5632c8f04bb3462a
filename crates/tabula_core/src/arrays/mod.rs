pub mod bitmap;
pub mod chunk;
pub mod chunked_array;
pub mod datatype;
pub mod native;
pub mod scalar;
pub mod series;

use ahash::RandomState;

/// State used for all hashing of group and join keys.
///
/// Fixed seeds keep hashes stable across runs.
pub const HASH_RANDOM_STATE: RandomState = RandomState::with_seeds(0, 0, 0, 0);
