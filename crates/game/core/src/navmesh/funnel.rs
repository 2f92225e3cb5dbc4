//! String-pulling over a triangle corridor.
//!
//! Portals are given as `(left, right)` pairs seen from the direction of
//! travel. The first portal is the degenerate `(start, start)` and the last is
//! `(end, end)`. Only the XZ projection is considered; corners keep the 3D
//! position of the mesh vertex they came from.

use glam::Vec3;

use super::flat;

const SAME_POINT_SQ: f32 = 1.0e-8;

/// Signed area of the XZ triangle `(apex, a, b)`. Positive when `b` lies
/// clockwise of the ray `apex -> a`.
#[inline]
fn tri_area2(apex: Vec3, a: Vec3, b: Vec3) -> f32 {
    (flat(b) - flat(apex)).perp_dot(flat(a) - flat(apex))
}

#[inline]
fn same(a: Vec3, b: Vec3) -> bool {
    flat(a).distance_squared(flat(b)) < SAME_POINT_SQ
}

pub(super) fn string_pull(portals: &[(Vec3, Vec3)]) -> Vec<Vec3> {
    let Some(&(start, _)) = portals.first() else {
        return Vec::new();
    };
    let mut points = vec![start];

    let mut apex = start;
    let (mut left, mut right) = portals[0];
    let (mut left_index, mut right_index) = (0usize, 0usize);

    let mut i = 1;
    while i < portals.len() {
        let (next_left, next_right) = portals[i];

        if tri_area2(apex, right, next_right) <= 0.0 {
            if same(apex, right) || tri_area2(apex, left, next_right) > 0.0 {
                right = next_right;
                right_index = i;
            } else {
                apex = left;
                let apex_index = left_index;
                push_corner(&mut points, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        if tri_area2(apex, left, next_left) >= 0.0 {
            if same(apex, left) || tri_area2(apex, right, next_left) < 0.0 {
                left = next_left;
                left_index = i;
            } else {
                apex = right;
                let apex_index = right_index;
                push_corner(&mut points, apex);
                left = apex;
                right = apex;
                left_index = apex_index;
                right_index = apex_index;
                i = apex_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if let Some(&(end, _)) = portals.last() {
        match points.last_mut() {
            Some(last) if same(*last, end) => *last = end,
            _ => points.push(end),
        }
    }
    points
}

fn push_corner(points: &mut Vec<Vec3>, corner: Vec3) {
    if points.last().is_none_or(|last| !same(*last, corner)) {
        points.push(corner);
    }
}
