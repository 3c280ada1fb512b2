//! Click-to-object hit detection
//!
//! Object boxes are grown by a fixed tolerance on every edge so small items
//! stay clickable. Edges are inclusive.

use glam::Vec2;

use super::level::GameObject;

/// Whether `point` lies in `obj`'s box grown by `tolerance` on each side
#[inline]
pub fn contains_point(obj: &GameObject, point: Vec2, tolerance: f32) -> bool {
    point.x >= obj.x - tolerance
        && point.x <= obj.x + obj.width + tolerance
        && point.y >= obj.y - tolerance
        && point.y <= obj.y + obj.height + tolerance
}

/// First unfound object (in level order) under the click
///
/// Objects whose id is in `found` are skipped. Non-finite points never hit.
pub fn find_hit<'a>(
    objects: &'a [GameObject],
    found: &[String],
    point: Vec2,
    tolerance: f32,
) -> Option<&'a GameObject> {
    if !point.is_finite() {
        return None;
    }
    objects
        .iter()
        .filter(|obj| !found.iter().any(|id| *id == obj.id))
        .find(|obj| contains_point(obj, point, tolerance))
}
