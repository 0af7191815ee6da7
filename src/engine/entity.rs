//! Entity Model
//!
//! Every entity exposes a [`Body`]: the spatial record the collision engine,
//! movement functions and hitbox queries operate on. Optional capabilities
//! are components on the body rather than separate entity kinds:
//!
//! - [`Motion`]: speed, path, knockback (moving entities)
//! - [`Health`]: hit points (destructible entities)
//! - [`HitboxFrames`]: per-animation-frame hitbox sets
//!
//! Behaviour is supplied through the [`Entity`] trait.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use slotmap::new_key_type;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use super::collision::Contact;
use super::hitbox::{HitboxFrames, HitboxSet};
use super::tick::TickContext;

new_key_type! {
    /// Generational handle to an entity in the engine's arena.
    pub struct EntityId;
}

// =============================================================================
// COMPONENTS
// =============================================================================

/// Movement state for entities that move.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    /// Whether the entity currently counts as moving
    pub is_moving: bool,
    /// Distance covered per tick along paths and orbits
    pub speed: f32,
    /// Velocity set by the owner's own update logic
    pub velocity: Vec2,
    /// Path as a list of displacement vectors
    pub path: Vec<Vec2>,
    /// Distance already travelled along `path`
    pub path_moved: f32,
    /// Pending knockback displacement
    pub knockback: Vec2,
    /// Multiplier applied to knockback each tick (0..1)
    pub knockback_friction: f32,
}

impl Motion {
    /// Create motion with the given speed, stationary and without a path.
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            knockback_friction: 0.8,
            ..Self::default()
        }
    }

    /// Set a path and mark the entity as moving.
    pub fn with_path(mut self, path: Vec<Vec2>) -> Self {
        self.path = path;
        self.path_moved = 0.0;
        self.is_moving = true;
        self
    }
}

/// Hit points for destructible entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
}

impl Health {
    /// Full health.
    pub fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
        }
    }

    /// Health as a fraction of maximum.
    pub fn fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }
}

// =============================================================================
// BODY
// =============================================================================

/// Spatial record shared by every entity.
#[derive(Debug, Clone)]
pub struct Body {
    /// World position of the origin point
    pub position: Vec2,
    /// Local pivot point (unscaled sprite coordinates)
    pub origin: Vec2,
    /// Non-uniform scale
    pub scale: Vec2,
    /// Rotation in radians. Hitbox geometry does not follow rotation.
    pub rotation: f32,
    /// Facing / last movement direction
    pub direction: Vec2,
    /// Unscaled width
    pub width: i32,
    /// Unscaled height
    pub height: i32,
    /// Cleared to mark the entity for removal
    pub alive: bool,
    /// Set by the collision pass when this entity took part in a hit
    pub is_colliding: bool,
    /// Static hitbox definitions
    pub hitboxes: Arc<HitboxSet>,
    /// Moving capability
    pub motion: Option<Motion>,
    /// Destructible capability
    pub health: Option<Health>,
    /// Animated hitboxes; the current frame overrides `hitboxes`
    pub animation: Option<HitboxFrames>,
}

impl Body {
    /// Create a body with explicit hitbox definitions.
    pub fn new(position: Vec2, width: i32, height: i32, hitboxes: Arc<HitboxSet>) -> Self {
        Self {
            position,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            direction: Vec2::ZERO,
            width,
            height,
            alive: true,
            is_colliding: false,
            hitboxes,
            motion: None,
            health: None,
            animation: None,
        }
    }

    /// Create a body whose single `"default"` hitbox covers its sprite.
    pub fn sized(position: Vec2, width: i32, height: i32) -> Self {
        Self::new(position, width, height, Arc::new(HitboxSet::default_for_size(width, height)))
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Attach a motion component.
    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    /// Attach a health component.
    pub fn with_health(mut self, health: Health) -> Self {
        self.health = Some(health);
        self
    }

    /// Attach per-frame hitboxes.
    pub fn with_animation(mut self, frames: HitboxFrames) -> Self {
        self.animation = Some(frames);
        self
    }

    /// The hitbox set currently in effect.
    pub fn hitbox_set(&self) -> &HitboxSet {
        self.animation
            .as_ref()
            .and_then(HitboxFrames::active)
            .unwrap_or(self.hitboxes.as_ref())
    }

    /// Scaled width.
    #[inline]
    pub fn scaled_width(&self) -> f32 {
        self.width as f32 * self.scale.x
    }

    /// Scaled height.
    #[inline]
    pub fn scaled_height(&self) -> f32 {
        self.height as f32 * self.scale.y
    }

    /// World-space bounding rectangle of the sprite.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            (self.position.x - self.origin.x * self.scale.x) as i32,
            (self.position.y - self.origin.y * self.scale.y) as i32,
            self.scaled_width() as i32,
            self.scaled_height() as i32,
        )
    }

    /// World-space center of the scaled sprite.
    pub fn center_position(&self) -> Vec2 {
        self.position - self.origin * self.scale
            + Vec2::new(self.scaled_width(), self.scaled_height()) / 2.0
    }

    /// Local (unscaled) center of the sprite.
    pub fn center_origin(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) / 2.0
    }

    /// True if the body has motion and is flagged as moving.
    pub fn is_moving(&self) -> bool {
        self.motion.as_ref().is_some_and(|m| m.is_moving)
    }

    /// Apply damage. Returns true if this killed the entity.
    ///
    /// Bodies without health ignore damage.
    pub fn damage(&mut self, amount: f32) -> bool {
        let Some(health) = self.health.as_mut() else {
            return false;
        };

        health.health = (health.health - amount).max(0.0);
        if health.health <= 0.0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }

    /// Restore health, capped at maximum.
    pub fn heal(&mut self, amount: f32) {
        if let Some(health) = self.health.as_mut() {
            health.health = (health.health + amount).min(health.max_health);
        }
    }
}

// =============================================================================
// ENTITY TRAIT
// =============================================================================

/// Behaviour hooks for anything the engine manages.
pub trait Entity {
    /// The entity's spatial record.
    fn body(&self) -> &Body;

    /// Mutable access to the spatial record.
    fn body_mut(&mut self) -> &mut Body;

    /// Per-tick logic, called for entities in update-registered pools.
    fn update(&mut self, _ctx: &mut TickContext) {}

    /// Called on the source entity when a collision rule fires.
    fn on_collision(&mut self, _target: &mut dyn Entity, _contact: &Contact<'_>) {}

    /// Shorthand for `body().alive`.
    fn is_alive(&self) -> bool {
        self.body().alive
    }
}

/// Entity with no behaviour of its own: walls, tiles, pickups.
#[derive(Debug, Clone)]
pub struct Prop {
    /// Spatial record
    pub body: Body,
}

impl Prop {
    /// Wrap a body.
    pub fn new(body: Body) -> Self {
        Self { body }
    }
}

impl Entity for Prop {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

// =============================================================================
// TESTS
// =============================================================================
