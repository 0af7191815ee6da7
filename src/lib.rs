//! # Stage Engine
//!
//! Spatial core for 2D stage-based games: geometry, hitboxes, pooled
//! collision rules, movement helpers and grid pathfinding.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       STAGE ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Math primitives                         │
//! │  ├── vec2.rs       - f32 2D vector                           │
//! │  ├── rect.rs       - Integer points and rectangles           │
//! │  ├── geometry.rs   - Angles, gaps, polygons, directions      │
//! │  └── hash.rs       - State hashing for replay checks         │
//! │                                                              │
//! │  engine/           - Simulation                              │
//! │  ├── entity.rs     - Body record and Entity trait            │
//! │  ├── hitbox.rs     - Named hitbox sets, animation frames     │
//! │  ├── hitbox_file.rs- Hitbox text format                      │
//! │  ├── pool.rs       - Named entity pools                      │
//! │  ├── tick.rs       - Tick context and report                 │
//! │  ├── collision.rs  - Update pass and collision rules         │
//! │  ├── movement.rs   - Orbit, paths, separation, knockback     │
//! │  └── pathfinding.rs- Walk grid and A*                        │
//! │                                                              │
//! │  config.rs         - JSON run configuration                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The engine holds no clocks and no randomness. Pools and rules are
//! walked in insertion order, the A* frontier breaks ties by insertion
//! sequence, and pool names live in a `BTreeMap`. Two runs fed the same
//! scene produce the same [`core::StateHash`] on the same platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod config;

// Re-export commonly used types
pub use core::{Direction, Point, Rect, StateHash, Vec2};
pub use engine::{
    Body, CollisionEngine, CollisionRule, Contact, Entity, EntityId, HitboxSet, PoolId, TickContext,
    TickReport, WalkGrid,
};
pub use config::EngineConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const DEFAULT_TICK_RATE: u32 = 60;
