//! Movement
//!
//! Per-tick movement algorithms acting on a [`Body`]'s motion component:
//! orbiting a point, following a path of displacement vectors, and being
//! pushed out of overlaps.
//!
//! Functions that need speed or a path leave bodies without [`Motion`]
//! untouched.
//!
//! [`Motion`]: super::entity::Motion

use serde::{Serialize, Deserialize};

use crate::core::geometry::{angle_of_vector, angle_to_vector, majority_cardinal_direction, unit_vector, Direction};
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use super::entity::Body;

/// Knockback below this length snaps to zero.
pub const KNOCKBACK_EPSILON: f32 = 0.01;

/// Orbit direction as seen on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spin {
    /// Decreasing angle
    Clockwise,
    /// Increasing angle
    CounterClockwise,
}

/// What happens when a path runs out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathPolicy {
    /// Stop at the end
    #[default]
    None,
    /// Start over from the first segment
    Loop,
    /// Walk the path backwards, then forwards again
    Patrol,
}

/// Overlap resolution strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Separation {
    /// Per-axis push from each intersection's thinner side
    #[default]
    Detailed,
    /// Single push along the dominant cardinal direction
    Rectangle,
}

// =============================================================================
// ORBIT
// =============================================================================

/// Move `speed` units along the circle through the body's position
/// around `center`.
pub fn orbit(body: &mut Body, center: Vec2, spin: Spin) {
    let Some(motion) = body.motion.as_ref() else {
        return;
    };

    let offset = body.position - center;
    let radius = offset.length();
    if radius == 0.0 {
        return;
    }

    let step = motion.speed / radius;
    let radians = match spin {
        Spin::Clockwise => angle_of_vector(offset) - step,
        Spin::CounterClockwise => angle_of_vector(offset) + step,
    }
    .rem_euclid(std::f32::consts::TAU);

    let new_position = center + angle_to_vector(radians, radius);
    body.direction = unit_vector(new_position - body.position);
    body.position = new_position;
}

// =============================================================================
// PATHS
// =============================================================================

/// Advance `speed` units along the body's path.
///
/// The path is a list of displacement vectors; `path_moved` records how far
/// along it the body already is. Segment boundaries are crossed within a
/// single tick. `direction` becomes the unit vector of the final partial
/// step.
pub fn follow_path(body: &mut Body, policy: PathPolicy) {
    let Body { position, direction, motion, .. } = body;
    let Some(motion) = motion.as_mut() else {
        return;
    };

    if path_length(&motion.path) == 0.0 {
        return;
    }

    // Locate the segment containing the current progress
    let mut progress = motion.path_moved;
    let mut segment = None;
    for (i, leg) in motion.path.iter().enumerate() {
        let len = leg.length();
        if len <= progress {
            progress -= len;
        } else {
            segment = Some(i);
            break;
        }
    }
    let Some(mut segment) = segment else {
        return;
    };

    let mut rest = motion.path[segment].length() - progress;
    let mut left = motion.speed;
    motion.path_moved += left;

    while left >= rest {
        *position += unit_vector(motion.path[segment]) * rest;
        left -= rest;
        segment += 1;

        if segment >= motion.path.len() {
            match policy {
                PathPolicy::None => return,
                PathPolicy::Loop => {}
                PathPolicy::Patrol => reverse_path(&mut motion.path),
            }
            segment = 0;
            motion.path_moved = left;
        }
        rest = motion.path[segment].length();
    }

    let step = unit_vector(motion.path[segment]) * left;
    *direction = unit_vector(step);
    *position += step;
}

/// Total length of a path.
pub fn path_length(path: &[Vec2]) -> f32 {
    path.iter().map(|leg| leg.length()).sum()
}

/// Reverse a path in place: segment order flipped, each segment negated.
pub fn reverse_path(path: &mut [Vec2]) {
    path.reverse();
    for leg in path.iter_mut() {
        *leg = -*leg;
    }
}

/// Vector from the body's position to `target`.
pub fn to_position(body: &Body, target: Vec2) -> Vec2 {
    target - body.position
}

/// Vector from one body's position to another's.
pub fn to_body(from: &Body, to: &Body) -> Vec2 {
    to.position - from.position
}

// =============================================================================
// SEPARATION & KNOCKBACK
// =============================================================================

/// Push `body` out of `other` given their overlapping rectangles.
///
/// Centers come from the named hitboxes when given, else from the bodies'
/// center positions. `weight` scales the push (1.0 = full overlap depth).
pub fn separate(
    body: &mut Body,
    other: &Body,
    intersections: &[Rect],
    weight: f32,
    body_hitbox: Option<&str>,
    other_hitbox: Option<&str>,
    mode: Separation,
) {
    let own_center = body.reference_center(body_hitbox);
    let other_center = other.reference_center(other_hitbox);

    let push = match mode {
        Separation::Detailed => {
            let (mut dx, mut dy) = (0.0f32, 0.0f32);
            for r in intersections {
                if r.width < r.height {
                    dx += r.width as f32;
                } else {
                    dy += r.height as f32;
                }
            }
            dx *= weight;
            dy *= weight;

            Vec2::new(
                if own_center.x > other_center.x { dx } else { -dx },
                if own_center.y > other_center.y { dy } else { -dy },
            )
        }
        Separation::Rectangle => {
            let max_w = intersections.iter().map(|r| r.width).max().unwrap_or(0) as f32 * weight;
            let max_h = intersections.iter().map(|r| r.height).max().unwrap_or(0) as f32 * weight;

            match majority_cardinal_direction(own_center - other_center) {
                Direction::East => Vec2::new(max_w, 0.0),
                Direction::West => Vec2::new(-max_w, 0.0),
                Direction::North => Vec2::new(0.0, -max_h),
                _ => Vec2::new(0.0, max_h),
            }
        }
    };

    body.position += push;
}

/// Apply one tick of knockback and decay it by friction.
pub fn apply_knockback(body: &mut Body) {
    let Body { position, motion, .. } = body;
    let Some(motion) = motion.as_mut() else {
        return;
    };

    if motion.knockback.is_zero() {
        return;
    }

    *position += motion.knockback;
    motion.knockback = motion.knockback * motion.knockback_friction;
    if motion.knockback.length() < KNOCKBACK_EPSILON {
        motion.knockback = Vec2::ZERO;
    }
}

// =============================================================================
// TESTS
// =============================================================================
