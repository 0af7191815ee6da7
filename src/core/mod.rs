//! Core spatial primitives.
//!
//! Plain value types and stateless math. Nothing in this module knows
//! about entities, pools or ticks.

pub mod vec2;
pub mod rect;
pub mod geometry;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rect::{Point, Rect};
pub use geometry::{Direction, GeometryError};
pub use hash::{compute_state_hash, StateHash, StateHasher};
