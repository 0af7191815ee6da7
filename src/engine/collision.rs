//! Collision Engine
//!
//! Owns every entity and dispatches the two per-tick passes:
//!
//! 1. **Update**: entities in update-registered pools run their hook.
//! 2. **Collisions**: each rule tests its source pool against its target
//!    pool and notifies the source on a hit.
//!
//! Entities live in a generational arena; pools hold ordered handle lists.
//! Both passes iterate pools by index and re-check liveness after every
//! callback, so hooks can kill entities (themselves included) mid-pass.

use std::fmt;
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use super::entity::{Body, Entity, EntityId};
use super::hitbox::{intersect_rectangles, overlaps_area, within_radius};
use super::pool::{PoolId, Pools};
use super::tick::{TickContext, TickReport};

type Arena = SlotMap<EntityId, Box<dyn Entity>>;

/// Custom collision test replacing hitbox intersection.
pub type CollisionPredicate = Box<dyn Fn(&dyn Entity, &dyn Entity) -> bool>;

/// Details handed to [`Entity::on_collision`].
#[derive(Debug, Clone, Copy)]
pub struct Contact<'a> {
    /// Overlapping world rectangles (empty when a predicate decided the hit)
    pub intersections: &'a [Rect],
    /// Hitbox tested on the source, if the rule named one
    pub source_hitbox: Option<&'a str>,
    /// Hitbox tested on the target, if the rule named one
    pub target_hitbox: Option<&'a str>,
}

/// Declarative collision check between two pools.
pub struct CollisionRule {
    /// Pool whose members get notified
    pub source: PoolId,
    /// Pool tested against
    pub target: PoolId,
    /// Source hitbox name (`None` = all hitboxes)
    pub source_hitbox: Option<String>,
    /// Target hitbox name (`None` = all hitboxes)
    pub target_hitbox: Option<String>,
    /// Skip sources that are not moving
    pub only_if_moving: bool,
    predicate: Option<CollisionPredicate>,
}

impl CollisionRule {
    /// Rule testing every hitbox of `source` members against `target` members.
    pub fn new(source: PoolId, target: PoolId) -> Self {
        Self {
            source,
            target,
            source_hitbox: None,
            target_hitbox: None,
            only_if_moving: false,
            predicate: None,
        }
    }

    /// Restrict the source side to one hitbox.
    pub fn with_source_hitbox(mut self, name: impl Into<String>) -> Self {
        self.source_hitbox = Some(name.into());
        self
    }

    /// Restrict the target side to one hitbox.
    pub fn with_target_hitbox(mut self, name: impl Into<String>) -> Self {
        self.target_hitbox = Some(name.into());
        self
    }

    /// Only test sources whose motion is flagged as moving.
    pub fn moving_only(mut self) -> Self {
        self.only_if_moving = true;
        self
    }

    /// Decide hits with a custom test instead of hitbox intersection.
    pub fn with_predicate(mut self, predicate: impl Fn(&dyn Entity, &dyn Entity) -> bool + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    fn matches(&self, source: PoolId, target: PoolId) -> bool {
        self.source == source && self.target == target
    }
}

impl fmt::Debug for CollisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionRule")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("source_hitbox", &self.source_hitbox)
            .field("target_hitbox", &self.target_hitbox)
            .field("only_if_moving", &self.only_if_moving)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Entity arena, pools, update registrations and collision rules.
#[derive(Default)]
pub struct CollisionEngine {
    entities: Arena,
    pools: Pools,
    updates: Vec<PoolId>,
    rules: Vec<CollisionRule>,
}

impl CollisionEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // POOLS & ENTITIES
    // =========================================================================

    /// Intern a pool name.
    pub fn pool(&mut self, name: &str) -> PoolId {
        self.pools.intern(name)
    }

    /// Look up a pool name without interning it.
    pub fn pool_id(&self, name: &str) -> Option<PoolId> {
        self.pools.id(name)
    }

    /// Add an entity to the arena without placing it in any pool.
    pub fn spawn(&mut self, entity: impl Entity + 'static) -> EntityId {
        self.entities.insert(Box::new(entity))
    }

    /// Add an entity to the arena and to `pool`.
    pub fn spawn_into(&mut self, pool: PoolId, entity: impl Entity + 'static) -> EntityId {
        self.insert_boxed(pool, Box::new(entity))
    }

    fn insert_boxed(&mut self, pool: PoolId, entity: Box<dyn Entity>) -> EntityId {
        let id = self.entities.insert(entity);
        self.pools.add(pool, id);
        id
    }

    /// Remove an entity from the arena and every pool.
    pub fn despawn(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let entity = self.entities.remove(id)?;
        self.pools.retain_all(|member| member != id);
        Some(entity)
    }

    /// Append an existing entity to a pool, creating its list if needed.
    pub fn add_to_pool(&mut self, pool: PoolId, id: EntityId) {
        if !self.pools.is_created(pool) {
            debug!(pool = self.pools.name(pool).unwrap_or("?"), "Pool list created");
        }
        self.pools.add(pool, id);
    }

    /// Remove the first occurrence of an entity from a pool.
    pub fn remove_from_pool(&mut self, pool: PoolId, id: EntityId) {
        if !self.pools.is_created(pool) {
            warn!(%pool, "Remove from a pool that was never created; ignored");
            return;
        }
        self.pools.remove(pool, id);
    }

    /// Empty one pool. The entities stay in the arena.
    pub fn clear_pool(&mut self, pool: PoolId) {
        self.pools.clear(pool);
    }

    /// Drop every pool list.
    pub fn clear_all_pools(&mut self) {
        self.pools.clear_all();
    }

    /// Drop all entities, pool lists, update registrations and rules.
    ///
    /// Interned pool ids remain valid.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pools.clear_all();
        self.updates.clear();
        self.rules.clear();
    }

    /// Members of a pool, in order.
    pub fn members(&self, pool: PoolId) -> &[EntityId] {
        self.pools.members(pool)
    }

    /// Number of entities in the arena.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Borrow an entity.
    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(id).map(|e| e.as_ref())
    }

    /// Mutably borrow an entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        self.entities.get_mut(id).map(|e| e.as_mut())
    }

    /// Borrow an entity's body.
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.entities.get(id).map(|e| e.body())
    }

    /// Mutably borrow an entity's body.
    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.entities.get_mut(id).map(|e| e.body_mut())
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Run the update hook of these pools' members every tick.
    pub fn register_for_update(&mut self, pools: &[PoolId]) {
        self.updates.extend_from_slice(pools);
    }

    /// Add a collision rule. Rules run in insertion order.
    pub fn add_collision_rule(&mut self, rule: CollisionRule) {
        debug!(
            source = self.pools.name(rule.source).unwrap_or("?"),
            target = self.pools.name(rule.target).unwrap_or("?"),
            predicate = rule.predicate.is_some(),
            "Collision rule added"
        );
        self.rules.push(rule);
    }

    /// Remove every rule from `source` to `target`. Idempotent.
    pub fn remove_collision_rule(&mut self, source: PoolId, target: PoolId) {
        let before = self.rules.len();
        self.rules.retain(|rule| !rule.matches(source, target));
        let removed = before - self.rules.len();
        if removed > 0 {
            debug!(%source, %target, removed, "Collision rules removed");
        }
    }

    /// Number of registered rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    // =========================================================================
    // TICK PASSES
    // =========================================================================

    /// Update pass.
    ///
    /// Dead entities are reaped from the arena and every pool first. Then
    /// each registered pool is walked by index; entries found dead before
    /// or after their hook are dropped. Spawns queued on `ctx` are inserted
    /// at the end.
    pub fn update(&mut self, ctx: &mut TickContext) -> TickReport {
        let mut report = TickReport {
            tick: ctx.tick,
            reaped: self.reap_dead(),
            ..TickReport::default()
        };

        for u in 0..self.updates.len() {
            let pool = self.updates[u];
            let mut i = 0;
            while let Some(id) = self.pools.get(pool, i) {
                if !is_alive(&self.entities, id) {
                    self.pools.remove_at(pool, i);
                    continue;
                }

                if let Some(entity) = self.entities.get_mut(id) {
                    entity.update(ctx);
                    report.updated += 1;
                }

                if !is_alive(&self.entities, id) {
                    self.pools.remove_at(pool, i);
                    continue;
                }
                i += 1;
            }
        }

        for (pool, entity) in ctx.take_spawns() {
            self.insert_boxed(pool, entity);
            report.spawned += 1;
        }

        report
    }

    /// Collision pass. Returns the number of hits.
    pub fn check_collisions(&mut self) -> usize {
        let Self { entities, pools, rules, .. } = self;
        rules.iter().map(|rule| check_rule(entities, pools, rule)).sum()
    }

    /// One tick: update, then collisions.
    pub fn step(&mut self, ctx: &mut TickContext) -> TickReport {
        let mut report = self.update(ctx);
        report.collisions = self.check_collisions();
        report
    }

    fn reap_dead(&mut self) -> usize {
        let dead: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, e)| !e.is_alive())
            .map(|(id, _)| id)
            .collect();

        for id in &dead {
            self.entities.remove(*id);
        }

        let entities = &self.entities;
        self.pools.retain_all(|id| entities.contains_key(id));
        dead.len()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Live members of `pool` with a hitbox rectangle within `radius` of `center`.
    pub fn query_radius(&self, pool: PoolId, center: Vec2, radius: f32, hitbox: Option<&str>) -> Vec<EntityId> {
        self.live_members(pool)
            .filter(|(_, e)| within_radius(radius, center, e.body(), hitbox))
            .map(|(id, _)| id)
            .collect()
    }

    /// Live members of `pool` overlapping the query area. Each member is
    /// reported once.
    pub fn query_area(&self, pool: PoolId, local_rects: &[Rect], area: &Rect, hitbox: Option<&str>) -> Vec<EntityId> {
        self.live_members(pool)
            .filter(|(_, e)| overlaps_area(e.body(), local_rects, area, hitbox))
            .map(|(id, _)| id)
            .collect()
    }

    fn live_members(&self, pool: PoolId) -> impl Iterator<Item = (EntityId, &dyn Entity)> {
        self.pools.members(pool).iter().filter_map(|&id| {
            self.entities
                .get(id)
                .filter(|e| e.is_alive())
                .map(|e| (id, e.as_ref()))
        })
    }

    /// Deterministic hash of pool membership and every pooled body.
    pub fn state_hash(&self, tick: u64) -> StateHash {
        compute_state_hash(tick, |hasher| {
            for pool in self.pools.ids() {
                let members = self.pools.members(pool);
                let name = self.pools.name(pool).unwrap_or_default();
                hasher.update_u32(name.len() as u32);
                hasher.update_bytes(name.as_bytes());
                hasher.update_u32(members.len() as u32);
                for &id in members {
                    match self.entities.get(id) {
                        Some(entity) => hash_body(hasher, entity.body()),
                        None => hasher.update_bool(false),
                    }
                }
            }
        })
    }
}

impl fmt::Debug for CollisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionEngine")
            .field("entities", &self.entities.len())
            .field("pools", &self.pools.count())
            .field("updates", &self.updates)
            .field("rules", &self.rules)
            .finish()
    }
}

fn is_alive(entities: &Arena, id: EntityId) -> bool {
    entities.get(id).is_some_and(|e| e.is_alive())
}

fn hash_body(hasher: &mut StateHasher, body: &Body) {
    hasher.update_bool(body.alive);
    hasher.update_vec2(body.position);
    hasher.update_vec2(body.direction);
    hasher.update_vec2(body.scale);
    hasher.update_rect(&body.bounds());
    hasher.update_f32(body.rotation);
    hasher.update_bool(body.is_colliding);
    if let Some(motion) = &body.motion {
        hasher.update_f32(motion.path_moved);
        hasher.update_vec2(motion.knockback);
        hasher.update_u32(motion.path.len() as u32);
    }
    if let Some(health) = &body.health {
        hasher.update_f32(health.health);
    }
}

/// Run one rule over its pools. Returns the number of hits.
fn check_rule(entities: &mut Arena, pools: &mut Pools, rule: &CollisionRule) -> usize {
    if !pools.is_created(rule.source) || !pools.is_created(rule.target) {
        return 0;
    }

    let same_pool = rule.source == rule.target;
    let source_hitbox = rule.source_hitbox.as_deref();
    let target_hitbox = rule.target_hitbox.as_deref();
    let mut hits = 0;

    let mut i = 0;
    while let Some(sid) = pools.get(rule.source, i) {
        if !is_alive(entities, sid) {
            pools.remove_at(rule.source, i);
            continue;
        }

        if rule.only_if_moving && !entities.get(sid).is_some_and(|e| e.body().is_moving()) {
            i += 1;
            continue;
        }

        let mut j = 0;
        while let Some(tid) = pools.get(rule.target, j) {
            if tid == sid {
                j += 1;
                continue;
            }

            if !is_alive(entities, tid) {
                pools.remove_at(rule.target, j);
                // Removing ahead of the cursor in a shared list shifts the source
                if same_pool && j < i {
                    i -= 1;
                }
                continue;
            }

            let (Some(source), Some(target)) = (entities.get(sid), entities.get(tid)) else {
                j += 1;
                continue;
            };

            let (collided, intersections) = match &rule.predicate {
                Some(predicate) => (predicate(source.as_ref(), target.as_ref()), Vec::new()),
                None => {
                    let rects = intersect_rectangles(source.body(), target.body(), source_hitbox, target_hitbox);
                    (!rects.is_empty(), rects)
                }
            };

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(?sid, ?tid, collided, overlaps = intersections.len(), "Collision pair");

            if collided {
                hits += 1;
                if let Some([source, target]) = entities.get_disjoint_mut([sid, tid]) {
                    let contact = Contact {
                        intersections: &intersections,
                        source_hitbox,
                        target_hitbox,
                    };
                    source.on_collision(&mut **target, &contact);
                    source.body_mut().is_colliding = true;
                    target.body_mut().is_colliding = true;
                }
            } else if let Some(source) = entities.get_mut(sid) {
                // A miss clears the source only
                source.body_mut().is_colliding = false;
            }

            if is_alive(entities, tid) {
                j += 1;
            } else {
                pools.remove_at(rule.target, j);
                if same_pool && j < i {
                    i -= 1;
                }
            }

            if !is_alive(entities, sid) {
                break;
            }
        }

        if is_alive(entities, sid) {
            i += 1;
        } else {
            pools.remove_at(rule.source, i);
        }
    }

    hits
}

// =============================================================================
// TESTS
// =============================================================================
