use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use tracing::{debug, warn};

use super::funnel::string_pull;
use super::{NavMesh, NoPathReason, PathError, flat};
use crate::config::EngineConfig;

/// Distance under which start and end are treated as the same point.
const SAME_POINT: f32 = 1.0e-4;

/// Owns the active navmesh and answers path queries against it.
///
/// Replacing the mesh bumps [`Pathfinder::generation`]; paths handed out
/// earlier keep working as plain polylines but no longer reflect the floor.
#[derive(Clone, Debug)]
pub struct Pathfinder {
    mesh: Option<NavMesh>,
    generation: u64,
    vertical_tolerance: f32,
}

impl Pathfinder {
    pub fn new(vertical_tolerance: f32) -> Self {
        Self {
            mesh: None,
            generation: 0,
            vertical_tolerance,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.navmesh_vertical_tolerance)
    }

    /// Installs a new mesh and returns the new generation.
    pub fn set_nav_mesh(&mut self, mesh: NavMesh) -> u64 {
        debug!(
            target: "nexus::path",
            triangles = mesh.triangle_count(),
            groups = mesh.group_count(),
            "registered navmesh"
        );
        self.mesh = Some(mesh);
        self.generation += 1;
        self.generation
    }

    pub fn clear(&mut self) {
        if self.mesh.take().is_some() {
            self.generation += 1;
        }
    }

    pub fn has_nav_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn nav_mesh(&self) -> Option<&NavMesh> {
        self.mesh.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Point on the mesh closest to `point`, or the point itself without a mesh.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        match &self.mesh {
            Some(mesh) => mesh.closest_point(point),
            None => point,
        }
    }

    pub fn is_walkable(&self, point: Vec3) -> bool {
        self.mesh
            .as_ref()
            .is_some_and(|m| m.locate(point, self.vertical_tolerance).is_some())
    }

    /// Computes a walkable polyline from `start` to `end`.
    ///
    /// The first and last elements are exactly `start` and `end`.
    pub fn find_path(&self, start: Vec3, end: Vec3) -> Result<Vec<Vec3>, PathError> {
        let mesh = self.mesh.as_ref().ok_or(PathError::NoNavMesh)?;

        let start_tri = mesh
            .locate(start, self.vertical_tolerance)
            .ok_or(PathError::NoPathFound(NoPathReason::StartOutside))?;
        let end_tri = mesh
            .locate(end, self.vertical_tolerance)
            .ok_or(PathError::NoPathFound(NoPathReason::EndOutside))?;

        let start_group = mesh.triangles[start_tri].group;
        let end_group = mesh.triangles[end_tri].group;
        if start_group != end_group {
            warn!(
                target: "nexus::path",
                start_group,
                end_group,
                "start and end lie on disconnected islands"
            );
            return Err(PathError::NoPathFound(NoPathReason::Disconnected {
                start_group,
                end_group,
            }));
        }

        if start.distance(end) <= SAME_POINT {
            return Ok(vec![start]);
        }
        if start_tri == end_tri {
            return Ok(vec![start, end]);
        }

        let corridor = search(mesh, start_tri, end_tri, end)
            .ok_or(PathError::NoPathFound(NoPathReason::Unreachable))?;
        let portals = portals(mesh, &corridor, start, end);
        let path = string_pull(&portals);
        debug!(target: "nexus::path", waypoints = path.len(), corridor = corridor.len(), "found path");
        Ok(path)
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new(EngineConfig::DEFAULT_VERTICAL_TOLERANCE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Frontier {
    cost: f32,
    triangle: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.triangle.cmp(&self.triangle))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over triangle adjacency using centroid distances.
fn search(mesh: &NavMesh, start: usize, goal: usize, goal_point: Vec3) -> Option<Vec<usize>> {
    let n = mesh.triangles.len();
    let mut best = vec![f32::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut open = BinaryHeap::new();

    best[start] = 0.0;
    open.push(Frontier {
        cost: mesh.triangles[start].centroid.distance(goal_point),
        triangle: start,
    });

    while let Some(Frontier { triangle, .. }) = open.pop() {
        if triangle == goal {
            let mut corridor = vec![goal];
            let mut cursor = goal;
            while cursor != start {
                cursor = came_from[cursor];
                corridor.push(cursor);
            }
            corridor.reverse();
            return Some(corridor);
        }
        let here = mesh.triangles[triangle].centroid;
        for portal in &mesh.triangles[triangle].neighbours {
            let next = portal.triangle;
            let there = mesh.triangles[next].centroid;
            let tentative = best[triangle] + here.distance(there);
            if tentative < best[next] {
                best[next] = tentative;
                came_from[next] = triangle;
                open.push(Frontier {
                    cost: tentative + there.distance(goal_point),
                    triangle: next,
                });
            }
        }
    }
    None
}

/// Orients each shared edge of the corridor as `(left, right)`.
fn portals(mesh: &NavMesh, corridor: &[usize], start: Vec3, end: Vec3) -> Vec<(Vec3, Vec3)> {
    let mut out = Vec::with_capacity(corridor.len() + 1);
    out.push((start, start));
    for pair in corridor.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let Some(portal) = mesh.triangles[from]
            .neighbours
            .iter()
            .find(|p| p.triangle == to)
        else {
            continue;
        };
        let a = mesh.vertex(portal.edge[0]);
        let b = mesh.vertex(portal.edge[1]);
        let origin = flat(mesh.triangles[from].centroid);
        let heading = (flat(a) + flat(b)) * 0.5 - origin;
        if heading.perp_dot(flat(a) - origin) > 0.0 {
            out.push((a, b));
        } else {
            out.push((b, a));
        }
    }
    out.push((end, end));
    out
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{corner, islands, strip};
    use super::*;

    fn finder(mesh: NavMesh) -> Pathfinder {
        let mut pf = Pathfinder::default();
        pf.set_nav_mesh(mesh);
        pf
    }

    #[test]
    fn same_point_yields_single_point_path() {
        let pf = finder(strip(3));
        let p = Vec3::new(1.2, 0.0, 0.4);
        assert_eq!(pf.find_path(p, p), Ok(vec![p]));
    }

    #[test]
    fn disconnected_islands_report_no_path() {
        let pf = finder(islands());
        let err = pf
            .find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(6.0, 0.0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            PathError::NoPathFound(NoPathReason::Disconnected {
                start_group: 0,
                end_group: 1
            })
        );
    }

    #[test]
    fn outside_points_are_rejected() {
        let pf = finder(strip(2));
        assert_eq!(
            pf.find_path(Vec3::new(-1.0, 0.0, 0.5), Vec3::new(1.0, 0.0, 0.5)),
            Err(PathError::NoPathFound(NoPathReason::StartOutside))
        );
        assert_eq!(
            pf.find_path(Vec3::new(1.0, 0.0, 0.5), Vec3::new(1.0, 0.0, 9.0)),
            Err(PathError::NoPathFound(NoPathReason::EndOutside))
        );
    }

    #[test]
    fn missing_mesh_is_reported() {
        let pf = Pathfinder::default();
        assert_eq!(pf.find_path(Vec3::ZERO, Vec3::X), Err(PathError::NoNavMesh));
    }

    #[test]
    fn straight_corridor_keeps_exact_endpoints() {
        let pf = finder(strip(4));
        let start = Vec3::new(0.25, 0.0, 0.5);
        let end = Vec3::new(3.75, 0.0, 0.5);
        let path = pf.find_path(start, end).unwrap();
        assert_eq!(path, vec![start, end]);
    }

    #[test]
    fn path_turns_at_the_inner_corner() {
        let pf = finder(corner());
        let start = Vec3::new(0.5, 0.0, 0.5);
        let end = Vec3::new(2.5, 0.0, 2.5);
        let path = pf.find_path(start, end).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert!(
            path.iter().any(|p| p.distance(Vec3::new(2.0, 0.0, 1.0)) < 1e-3),
            "expected a corner at (2, 0, 1), got {path:?}"
        );
    }

    #[test]
    fn replacing_the_mesh_bumps_generation() {
        let mut pf = Pathfinder::default();
        assert_eq!(pf.set_nav_mesh(strip(1)), 1);
        assert_eq!(pf.set_nav_mesh(strip(2)), 2);
        pf.clear();
        assert_eq!(pf.generation(), 3);
        assert!(!pf.has_nav_mesh());
    }
}
