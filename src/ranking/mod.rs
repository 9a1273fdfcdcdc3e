//! Distance and ranking
//!
//! Pure functions, safe to call from any number of workers at once.

pub mod distance;
pub mod nearby;

pub use distance::{STATUTE_MILES_PER_NAUTICAL_MILE, distance_miles};
pub use nearby::{NEARBY_ATTRACTIONS_LIMIT, Ranked, nearest, rank, to_nearby};
