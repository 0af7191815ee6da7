//! Engine Module
//!
//! Entities, hitboxes, collision rules, movement helpers and grid
//! pathfinding. Everything runs on one thread, driven by [`CollisionEngine::step`].
//!
//! ## Module Structure
//!
//! - `entity`: Spatial record (`Body`) and the `Entity` behaviour trait
//! - `hitbox`: Named hitbox sets, animation frames, body-level tests
//! - `hitbox_file`: Text format for hitbox sets
//! - `pool`: Named entity pools
//! - `tick`: Per-tick context and step report
//! - `collision`: Arena, pools and pairwise collision rules
//! - `movement`: Orbit, path following, separation, knockback
//! - `pathfinding`: Walkability grid and A*

pub mod entity;
pub mod hitbox;
pub mod hitbox_file;
pub mod pool;
pub mod tick;
pub mod collision;
pub mod movement;
pub mod pathfinding;

// Re-export key types
pub use entity::{Body, Entity, EntityId, Health, Motion, Prop};
pub use hitbox::{DistanceCheck, Hitbox, HitboxFrames, HitboxSet, DEFAULT_HITBOX};
pub use hitbox_file::HitboxFileError;
pub use pool::PoolId;
pub use tick::{TickContext, TickReport};
pub use collision::{CollisionEngine, CollisionRule, Contact};
pub use movement::{PathPolicy, Separation, Spin};
pub use pathfinding::{GridError, WalkGrid};
