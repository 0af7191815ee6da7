//! Hitbox Model
//!
//! Named hitboxes in sprite-local coordinates and their world-space
//! projections. World rectangles are recomputed from the body's position,
//! origin and scale on every query; nothing is cached.
//!
//! Transform per local rectangle `r` (truncating toward zero):
//!
//! ```text
//! x = pos.x + (r.left - origin.x) * scale.x
//! y = pos.y + (r.top  - origin.y) * scale.y
//! w = r.width  * scale.x
//! h = r.height * scale.y
//! ```
//!
//! Rotation is deliberately not applied.

use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::core::geometry::{
    angle_of_vector, intersecting_rectangle, shortest_vector, vector_between,
    vector_between_rectangles,
};
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use super::entity::Body;

/// Name of the hitbox created by [`HitboxSet::default_for_size`].
pub const DEFAULT_HITBOX: &str = "default";

/// One named collision shape: rectangles plus a reference center.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hitbox {
    /// Rectangles making up the shape
    pub rectangles: Vec<Rect>,
    /// Reference center (used for separation)
    pub center: Vec2,
}

impl Hitbox {
    /// Create a hitbox.
    pub fn new(rectangles: Vec<Rect>, center: Vec2) -> Self {
        Self { rectangles, center }
    }

    /// Check if the hitbox has no rectangles.
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }
}

/// Ordered collection of named hitboxes for one sprite.
///
/// Sets hold a handful of entries, so lookup is a linear scan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HitboxSet {
    entries: Vec<(String, Hitbox)>,
}

impl HitboxSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single hitbox covering a `width` x `height` sprite.
    pub fn default_for_size(width: i32, height: i32) -> Self {
        let mut set = Self::new();
        set.insert(
            DEFAULT_HITBOX,
            Hitbox::new(
                vec![Rect::new(0, 0, width, height)],
                Vec2::new(width as f32 / 2.0, height as f32 / 2.0),
            ),
        );
        set
    }

    /// Insert or replace a hitbox. Returns the previous one with that name.
    pub fn insert(&mut self, name: impl Into<String>, hitbox: Hitbox) -> Option<Hitbox> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, hitbox)),
            None => {
                self.entries.push((name, hitbox));
                None
            }
        }
    }

    /// Look up a hitbox by name.
    pub fn get(&self, name: &str) -> Option<&Hitbox> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, h)| h)
    }

    /// Check if a hitbox with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Hitbox)> {
        self.entries.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Number of hitboxes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-animation-frame hitbox sets.
///
/// The engine never advances frames on its own; the owner calls
/// [`set_frame`](Self::set_frame) or [`advance`](Self::advance) from its
/// animation logic.
#[derive(Debug, Clone, Default)]
pub struct HitboxFrames {
    frames: Vec<Arc<HitboxSet>>,
    current: usize,
}

impl HitboxFrames {
    /// Create from frame sets, starting at frame 0.
    pub fn new(frames: Vec<Arc<HitboxSet>>) -> Self {
        Self { frames, current: 0 }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current frame index.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Jump to a frame. Out-of-range indices are rejected.
    pub fn set_frame(&mut self, frame: usize) -> bool {
        if frame >= self.frames.len() {
            return false;
        }
        self.current = frame;
        true
    }

    /// Step to the next frame, wrapping at the end.
    pub fn advance(&mut self) {
        if !self.frames.is_empty() {
            self.current = (self.current + 1) % self.frames.len();
        }
    }

    /// The active frame's set.
    pub fn active(&self) -> Option<&HitboxSet> {
        self.frames.get(self.current).map(|set| set.as_ref())
    }
}

// =============================================================================
// WORLD-SPACE PROJECTION
// =============================================================================

impl Body {
    fn to_world(&self, local: &Hitbox) -> Hitbox {
        let rectangles = local
            .rectangles
            .iter()
            .map(|r| {
                Rect::new(
                    (self.position.x + (r.x as f32 - self.origin.x) * self.scale.x) as i32,
                    (self.position.y + (r.y as f32 - self.origin.y) * self.scale.y) as i32,
                    (r.width as f32 * self.scale.x) as i32,
                    (r.height as f32 * self.scale.y) as i32,
                )
            })
            .collect();

        Hitbox {
            rectangles,
            center: self.position + (local.center - self.origin) * self.scale,
        }
    }

    /// World-space hitbox by name. Unknown names give an empty hitbox with
    /// a zero center.
    pub fn hitbox(&self, name: &str) -> Hitbox {
        self.hitbox_set()
            .get(name)
            .map(|local| self.to_world(local))
            .unwrap_or_default()
    }

    /// World rectangles of every hitbox, in definition order.
    pub fn combined_hitbox(&self) -> Vec<Rect> {
        self.hitbox_set()
            .iter()
            .flat_map(|(_, local)| self.to_world(local).rectangles)
            .collect()
    }

    /// World rectangles of the named hitboxes that exist.
    pub fn combined_hitbox_of(&self, names: &[&str]) -> Vec<Rect> {
        let set = self.hitbox_set();
        names
            .iter()
            .filter_map(|name| set.get(name))
            .flat_map(|local| self.to_world(local).rectangles)
            .collect()
    }

    /// World rectangles of one hitbox, or all of them when `name` is `None`.
    pub fn world_rects(&self, name: Option<&str>) -> Vec<Rect> {
        match name {
            Some(name) => self.hitbox(name).rectangles,
            None => self.combined_hitbox(),
        }
    }

    /// Center used for separation: the named hitbox's center, or the
    /// body's center position.
    pub fn reference_center(&self, name: Option<&str>) -> Vec2 {
        match name {
            Some(name) => self.hitbox(name).center,
            None => self.center_position(),
        }
    }
}

// =============================================================================
// INTERSECTION & PROXIMITY
// =============================================================================

/// Every pairwise overlap between two bodies' hitbox rectangles.
///
/// Only computed when the bodies' bounds intersect. `None` selects all of
/// a body's hitboxes.
pub fn intersect_rectangles(
    a: &Body,
    b: &Body,
    a_hitbox: Option<&str>,
    b_hitbox: Option<&str>,
) -> Vec<Rect> {
    if !a.bounds().intersects(&b.bounds()) {
        return Vec::new();
    }

    let a_rects = a.world_rects(a_hitbox);
    let b_rects = b.world_rects(b_hitbox);

    let mut overlaps = Vec::new();
    for ra in &a_rects {
        for rb in &b_rects {
            if let Ok(overlap) = intersecting_rectangle(ra, rb) {
                overlaps.push(overlap);
            }
        }
    }
    overlaps
}

/// How to measure the gap between two bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceCheck {
    /// Gap between bounding rectangles
    Rectangle,
    /// Between positions
    Position,
    /// Between center positions
    Center,
    /// Shortest gap between any pair of hitbox rectangles
    Hitbox,
}

/// Vector from one body to another under the chosen measure.
pub fn vector_between_bodies(
    from: &Body,
    to: &Body,
    check: DistanceCheck,
    from_hitbox: Option<&str>,
    to_hitbox: Option<&str>,
) -> Vec2 {
    match check {
        DistanceCheck::Position => vector_between(from.position, to.position),
        DistanceCheck::Center => vector_between(from.center_position(), to.center_position()),
        DistanceCheck::Rectangle => vector_between_rectangles(&from.bounds(), &to.bounds()),
        DistanceCheck::Hitbox => {
            let from_rects = from.world_rects(from_hitbox);
            let to_rects = to.world_rects(to_hitbox);

            let mut shortest: Option<Vec2> = None;
            for ra in &from_rects {
                for rb in &to_rects {
                    let gap = vector_between_rectangles(ra, rb);
                    if gap.is_zero() {
                        return gap;
                    }
                    shortest = Some(match shortest {
                        Some(current) => shortest_vector(current, gap),
                        None => gap,
                    });
                }
            }
            shortest.unwrap_or(Vec2::ZERO)
        }
    }
}

/// Length of [`vector_between_bodies`].
pub fn distance_between_bodies(
    from: &Body,
    to: &Body,
    check: DistanceCheck,
    from_hitbox: Option<&str>,
    to_hitbox: Option<&str>,
) -> f32 {
    vector_between_bodies(from, to, check, from_hitbox, to_hitbox).length()
}

/// Angle (radians) of the vector between two bodies' positions.
pub fn angle_between_bodies(from: &Body, to: &Body) -> f32 {
    angle_of_vector(vector_between(from.position, to.position))
}

/// True if any of the body's hitbox rectangles comes within `radius` of
/// `center` (measured to the nearest point on the rectangle).
pub fn within_radius(radius: f32, center: Vec2, body: &Body, hitbox: Option<&str>) -> bool {
    body.world_rects(hitbox).iter().any(|r| {
        let nearest = Vec2::new(
            center.x.clamp(r.left() as f32, r.right() as f32),
            center.y.clamp(r.top() as f32, r.bottom() as f32),
        );
        center.distance(nearest) <= radius
    })
}

/// True if any area rectangle overlaps the body's hitbox rectangles.
///
/// `local_rects` are relative to `area`'s top-left corner; `area` also
/// serves as a bounds prefilter against the body's bounds.
pub fn overlaps_area(body: &Body, local_rects: &[Rect], area: &Rect, hitbox: Option<&str>) -> bool {
    if !area.intersects(&body.bounds()) {
        return false;
    }

    let targets = body.world_rects(hitbox);
    local_rects
        .iter()
        .map(|r| r.translated(area.left(), area.top()))
        .any(|query| targets.iter().any(|t| query.intersects(t)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn two_part_set() -> Arc<HitboxSet> {
        let mut set = HitboxSet::new();
        set.insert("body", Hitbox::new(vec![Rect::new(0, 0, 10, 10)], Vec2::new(5.0, 5.0)));
        set.insert(
            "feet",
            Hitbox::new(vec![Rect::new(2, 8, 3, 2), Rect::new(6, 8, 3, 2)], Vec2::new(5.0, 9.0)),
        );
        Arc::new(set)
    }

    #[test]
    fn test_set_lookup_and_order() {
        let set = two_part_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("feet"));
        assert!(set.get("head").is_none());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["body", "feet"]);
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut set = HitboxSet::new();
        assert!(set.insert("a", Hitbox::default()).is_none());
        assert!(set.insert("a", Hitbox::new(vec![Rect::new(0, 0, 1, 1)], Vec2::ZERO)).is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").map(|h| h.rectangles.len()), Some(1));
    }

    #[test]
    fn test_default_for_size() {
        let set = HitboxSet::default_for_size(16, 8);
        let hb = set.get(DEFAULT_HITBOX).cloned().unwrap_or_default();
        assert_eq!(hb.rectangles, vec![Rect::new(0, 0, 16, 8)]);
        assert_eq!(hb.center, Vec2::new(8.0, 4.0));
    }

    #[test]
    fn test_world_hitbox_transform() {
        let body = Body::new(Vec2::new(100.0, 200.0), 10, 10, two_part_set())
            .with_origin(Vec2::new(5.0, 5.0))
            .with_scale(Vec2::new(2.0, 2.0));

        let feet = body.hitbox("feet");
        assert_eq!(feet.rectangles, vec![Rect::new(94, 206, 6, 4), Rect::new(102, 206, 6, 4)]);
        assert_eq!(feet.center, Vec2::new(100.0, 208.0));
    }

    #[test]
    fn test_unknown_hitbox_is_empty() {
        let body = Body::new(Vec2::new(5.0, 5.0), 10, 10, two_part_set());
        let missing = body.hitbox("wings");
        assert!(missing.is_empty());
        assert_eq!(missing.center, Vec2::ZERO);
    }

    #[test]
    fn test_combined_hitbox() {
        let body = Body::new(Vec2::ZERO, 10, 10, two_part_set());
        assert_eq!(body.combined_hitbox().len(), 3);
        assert_eq!(body.combined_hitbox_of(&["feet", "wings"]).len(), 2);
        assert_eq!(body.combined_hitbox_of(&["body"]), vec![Rect::new(0, 0, 10, 10)]);
    }

    #[test]
    fn test_rotation_is_ignored() {
        let mut body = Body::new(Vec2::new(30.0, 30.0), 10, 10, two_part_set());
        let before = body.combined_hitbox();
        body.rotation = PI / 3.0;
        assert_eq!(body.combined_hitbox(), before);
    }

    #[test]
    fn test_animation_frames_override_static_set() {
        let mut frame_a = HitboxSet::new();
        frame_a.insert("hit", Hitbox::new(vec![Rect::new(0, 0, 1, 1)], Vec2::ZERO));
        let mut frame_b = HitboxSet::new();
        frame_b.insert("hit", Hitbox::new(vec![Rect::new(0, 0, 4, 4)], Vec2::ZERO));

        let frames = HitboxFrames::new(vec![Arc::new(frame_a), Arc::new(frame_b)]);
        let mut body = Body::new(Vec2::ZERO, 4, 4, two_part_set()).with_animation(frames);

        assert_eq!(body.hitbox("hit").rectangles, vec![Rect::new(0, 0, 1, 1)]);
        // Static names are hidden while an animation frame is active
        assert!(body.hitbox("body").is_empty());

        if let Some(anim) = body.animation.as_mut() {
            anim.advance();
        }
        assert_eq!(body.hitbox("hit").rectangles, vec![Rect::new(0, 0, 4, 4)]);

        if let Some(anim) = body.animation.as_mut() {
            anim.advance();
            assert_eq!(anim.current(), 0);
            assert!(!anim.set_frame(2));
            assert_eq!(anim.current(), 0);
        }
    }

    #[test]
    fn test_empty_frames_fall_back_to_static_set() {
        let body = Body::new(Vec2::ZERO, 10, 10, two_part_set()).with_animation(HitboxFrames::default());
        assert!(!body.hitbox("body").is_empty());
    }

    #[test]
    fn test_intersect_rectangles() {
        let a = Body::new(Vec2::ZERO, 10, 10, two_part_set());
        let b = Body::sized(Vec2::new(4.0, 9.0), 10, 10);

        // All hitboxes: body overlaps, both feet overlap
        let all = intersect_rectangles(&a, &b, None, None);
        assert_eq!(all.len(), 3);

        let feet = intersect_rectangles(&a, &b, Some("feet"), None);
        assert_eq!(feet, vec![Rect::new(4, 9, 1, 1), Rect::new(6, 9, 3, 1)]);

        let far = Body::sized(Vec2::new(50.0, 50.0), 10, 10);
        assert!(intersect_rectangles(&a, &far, None, None).is_empty());
    }

    #[test]
    fn test_intersect_requires_bounds_overlap() {
        // Hitbox sticks out past the sprite bounds
        let mut set = HitboxSet::new();
        set.insert("reach", Hitbox::new(vec![Rect::new(0, 0, 30, 2)], Vec2::ZERO));
        let a = Body::new(Vec2::ZERO, 5, 5, Arc::new(set));
        let b = Body::sized(Vec2::new(20.0, 0.0), 5, 5);

        assert!(intersect_rectangles(&a, &b, Some("reach"), None).is_empty());
    }

    #[test]
    fn test_distance_checks() {
        let a = Body::sized(Vec2::ZERO, 10, 10);
        let b = Body::sized(Vec2::new(20.0, 0.0), 10, 10);

        assert_eq!(vector_between_bodies(&a, &b, DistanceCheck::Position, None, None), Vec2::new(20.0, 0.0));
        assert_eq!(vector_between_bodies(&a, &b, DistanceCheck::Center, None, None), Vec2::new(20.0, 0.0));
        assert_eq!(vector_between_bodies(&a, &b, DistanceCheck::Rectangle, None, None), Vec2::new(10.0, 0.0));
        assert_eq!(distance_between_bodies(&a, &b, DistanceCheck::Hitbox, None, None), 10.0);
    }

    #[test]
    fn test_hitbox_distance_picks_shortest_pair() {
        let a = Body::new(Vec2::ZERO, 10, 10, two_part_set());
        let b = Body::sized(Vec2::new(0.0, 14.0), 10, 10);

        // Feet bottoms sit at y=10, four units above b
        let gap = vector_between_bodies(&a, &b, DistanceCheck::Hitbox, Some("feet"), None);
        assert_eq!(gap, Vec2::new(0.0, 4.0));
    }

    #[test]
    fn test_angle_between_bodies() {
        let a = Body::sized(Vec2::ZERO, 1, 1);
        let b = Body::sized(Vec2::new(0.0, -10.0), 1, 1);
        assert!((angle_between_bodies(&a, &b) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_within_radius() {
        let body = Body::sized(Vec2::new(10.0, 0.0), 10, 10);
        assert!(within_radius(5.0, Vec2::new(5.0, 5.0), &body, None));
        assert!(!within_radius(4.9, Vec2::new(5.0, 5.0), &body, None));
        // Center inside a rectangle
        assert!(within_radius(0.0, Vec2::new(12.0, 3.0), &body, None));
        assert!(!within_radius(100.0, Vec2::ZERO, &body, Some("missing")));
    }

    #[test]
    fn test_overlaps_area() {
        let body = Body::sized(Vec2::new(20.0, 20.0), 10, 10);
        let area = Rect::new(15, 15, 20, 20);

        // Local rect at (10,10) within the area lands at (25,25)
        assert!(overlaps_area(&body, &[Rect::new(10, 10, 2, 2)], &area, None));
        // Rect in the area's corner misses the body
        assert!(!overlaps_area(&body, &[Rect::new(0, 0, 2, 2)], &area, None));
        // Area bounds prefilter
        assert!(!overlaps_area(&body, &[Rect::new(10, 10, 2, 2)], &Rect::new(100, 100, 5, 5), None));
    }

    proptest! {
        #[test]
        fn prop_world_hitbox_is_linear_and_ignores_rotation(
            px in -500i32..500,
            py in -500i32..500,
            sx in 1i32..5,
            sy in 1i32..5,
            rotation in -10.0f32..10.0,
        ) {
            let mut body = Body::new(
                Vec2::new(px as f32, py as f32),
                10,
                10,
                two_part_set(),
            ).with_scale(Vec2::new(sx as f32, sy as f32));
            body.rotation = rotation;

            let hb = body.hitbox("feet");
            prop_assert_eq!(hb.rectangles[0], Rect::new(px + 2 * sx, py + 8 * sy, 3 * sx, 2 * sy));
            prop_assert_eq!(hb.rectangles[1], Rect::new(px + 6 * sx, py + 8 * sy, 3 * sx, 2 * sy));
            prop_assert_eq!(hb.center, Vec2::new((px + 5 * sx) as f32, (py + 9 * sy) as f32));
        }
    }
}
