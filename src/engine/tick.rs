//! Tick Context
//!
//! Per-tick state threaded through entity update hooks. Entities that need
//! to create other entities (projectiles, debris) queue them here; the
//! engine inserts them once the update pass has finished.

use super::entity::Entity;
use super::pool::PoolId;

/// Context passed to [`Entity::update`].
pub struct TickContext {
    /// Current tick number
    pub tick: u64,
    /// Seconds simulated per tick
    pub delta_seconds: f32,
    /// Entities queued for insertion after the update pass
    spawns: Vec<(PoolId, Box<dyn Entity>)>,
}

impl TickContext {
    /// Create a context for a fixed tick rate.
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            delta_seconds: 1.0 / tick_rate.max(1) as f32,
            spawns: Vec::new(),
        }
    }

    /// Queue an entity to join `pool` after the current update pass.
    pub fn spawn(&mut self, pool: PoolId, entity: impl Entity + 'static) {
        self.spawns.push((pool, Box::new(entity)));
    }

    /// Number of queued spawns.
    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    /// Move to the next tick.
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    pub(crate) fn take_spawns(&mut self) -> Vec<(PoolId, Box<dyn Entity>)> {
        std::mem::take(&mut self.spawns)
    }
}

/// Outcome of one engine step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number the step ran for
    pub tick: u64,
    /// Dead entities removed from the arena
    pub reaped: usize,
    /// Entities whose update hook ran
    pub updated: usize,
    /// Entities inserted from the spawn queue
    pub spawned: usize,
    /// Collision rule hits
    pub collisions: usize,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::engine::entity::{Body, Prop};
    use crate::engine::pool::Pools;

    #[test]
    fn test_delta_from_tick_rate() {
        let ctx = TickContext::new(60);
        assert!((ctx.delta_seconds - 1.0 / 60.0).abs() < 1e-9);

        // Zero rate is clamped
        assert_eq!(TickContext::new(0).delta_seconds, 1.0);
    }

    #[test]
    fn test_spawn_queue_drains() {
        let mut pools = Pools::new();
        let debris = pools.intern("debris");
        let mut ctx = TickContext::new(60);

        ctx.spawn(debris, Prop::new(Body::sized(Vec2::ZERO, 1, 1)));
        ctx.spawn(debris, Prop::new(Body::sized(Vec2::ONE, 1, 1)));
        assert_eq!(ctx.pending_spawns(), 2);

        let taken = ctx.take_spawns();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].1.body().position, Vec2::ONE);
        assert_eq!(ctx.pending_spawns(), 0);
    }

    #[test]
    fn test_advance() {
        let mut ctx = TickContext::new(30);
        ctx.advance();
        ctx.advance();
        assert_eq!(ctx.tick, 2);
    }
}
