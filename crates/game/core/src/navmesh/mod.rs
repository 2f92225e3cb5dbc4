//! Navigation mesh built from walkable scene geometry.
//!
//! The mesh welds coincident vertices, links triangles that share an edge and
//! labels each connected island with a group index. It is read-only after
//! construction; a new scene builds a new mesh.
mod error;
mod funnel;
mod pathfinder;

pub use error::{NavMeshError, NoPathReason, PathError};
pub use pathfinder::Pathfinder;

use std::collections::{HashMap, VecDeque};

use glam::{Vec2, Vec3};

use crate::content::MeshGeometry;

const WELD_GRID: f32 = 1.0e-4;
const BARYCENTRIC_SLACK: f32 = 1.0e-4;

/// Link to a neighbouring triangle through a shared edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Portal {
    pub triangle: usize,
    /// Vertex indices of the shared edge.
    pub edge: [usize; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavTriangle {
    pub vertices: [usize; 3],
    pub centroid: Vec3,
    pub neighbours: Vec<Portal>,
    pub group: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<NavTriangle>,
    group_count: usize,
}

impl NavMesh {
    /// Builds a mesh from one vertex buffer and a triangle index list.
    pub fn from_triangles(vertices: &[Vec3], indices: &[u32]) -> Result<Self, NavMeshError> {
        Self::from_parts([(vertices, indices)])
    }

    /// Merges every walkable mesh into one navmesh. Non-walkable meshes are
    /// ignored.
    pub fn from_geometry(meshes: &[MeshGeometry]) -> Result<Self, NavMeshError> {
        let positions: Vec<(Vec<Vec3>, &[u32])> = meshes
            .iter()
            .filter(|m| m.is_walkable())
            .map(|m| (m.positions(), m.indices.as_slice()))
            .collect();
        Self::from_parts(positions.iter().map(|(v, i)| (v.as_slice(), *i)))
    }

    fn from_parts<'a>(
        parts: impl IntoIterator<Item = (&'a [Vec3], &'a [u32])>,
    ) -> Result<Self, NavMeshError> {
        let mut welded: Vec<Vec3> = Vec::new();
        let mut lookup: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut faces: Vec<[usize; 3]> = Vec::new();

        for (vertices, indices) in parts {
            if indices.len() % 3 != 0 {
                return Err(NavMeshError::MalformedIndices { len: indices.len() });
            }
            let mut remap = Vec::with_capacity(vertices.len());
            for v in vertices {
                let key = weld_key(*v);
                let idx = *lookup.entry(key).or_insert_with(|| {
                    welded.push(*v);
                    welded.len() - 1
                });
                remap.push(idx);
            }
            for tri in indices.chunks_exact(3) {
                let mut face = [0usize; 3];
                for (slot, raw) in face.iter_mut().zip(tri) {
                    *slot = *remap.get(*raw as usize).ok_or(NavMeshError::IndexOutOfRange {
                        index: *raw,
                        vertex_count: vertices.len(),
                    })?;
                }
                if is_degenerate(&welded, face) {
                    continue;
                }
                faces.push(face);
            }
        }

        if faces.is_empty() {
            return Err(NavMeshError::Empty);
        }

        let mut triangles: Vec<NavTriangle> = faces
            .iter()
            .map(|face| NavTriangle {
                vertices: *face,
                centroid: (welded[face[0]] + welded[face[1]] + welded[face[2]]) / 3.0,
                neighbours: Vec::new(),
                group: usize::MAX,
            })
            .collect();

        let mut edges: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (t, face) in faces.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                edges.entry((a.min(b), a.max(b))).or_default().push(t);
            }
        }
        for ((a, b), shared) in &edges {
            for (i, &t1) in shared.iter().enumerate() {
                for &t2 in &shared[i + 1..] {
                    triangles[t1].neighbours.push(Portal {
                        triangle: t2,
                        edge: [*a, *b],
                    });
                    triangles[t2].neighbours.push(Portal {
                        triangle: t1,
                        edge: [*a, *b],
                    });
                }
            }
        }
        // Deterministic neighbour order regardless of hash iteration.
        for tri in &mut triangles {
            tri.neighbours.sort_by_key(|p| (p.triangle, p.edge));
        }

        let group_count = label_groups(&mut triangles);

        Ok(Self {
            vertices: welded,
            triangles,
            group_count,
        })
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[NavTriangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn vertex(&self, index: usize) -> Vec3 {
        self.vertices[index]
    }

    /// Finds the triangle whose XZ footprint contains `point` and whose
    /// surface lies within `tolerance` vertically. When floors overlap the
    /// closest surface wins.
    pub fn locate(&self, point: Vec3, tolerance: f32) -> Option<usize> {
        let p = flat(point);
        let mut best: Option<(usize, f32)> = None;
        for (idx, tri) in self.triangles.iter().enumerate() {
            let [a, b, c] = tri.vertices.map(|v| self.vertices[v]);
            let Some((u, v, w)) = barycentric(p, flat(a), flat(b), flat(c)) else {
                continue;
            };
            let surface = a.y * u + b.y * v + c.y * w;
            let gap = (point.y - surface).abs();
            if gap > tolerance {
                continue;
            }
            if best.is_none_or(|(_, g)| gap < g) {
                best = Some((idx, gap));
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn group_at(&self, point: Vec3, tolerance: f32) -> Option<usize> {
        self.locate(point, tolerance).map(|t| self.triangles[t].group)
    }

    /// Nearest point on the mesh surface.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let mut best = point;
        let mut best_dist = f32::INFINITY;
        for tri in &self.triangles {
            let [a, b, c] = tri.vertices.map(|v| self.vertices[v]);
            let candidate = closest_on_triangle(point, a, b, c);
            let dist = candidate.distance_squared(point);
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
        best
    }
}

fn weld_key(v: Vec3) -> (i64, i64, i64) {
    let q = |f: f32| (f / WELD_GRID).round() as i64;
    (q(v.x), q(v.y), q(v.z))
}

fn is_degenerate(vertices: &[Vec3], face: [usize; 3]) -> bool {
    if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
        return true;
    }
    let [a, b, c] = face.map(|i| flat(vertices[i]));
    (b - a).perp_dot(c - a).abs() <= f32::EPSILON
}

fn label_groups(triangles: &mut [NavTriangle]) -> usize {
    let mut group = 0;
    let mut queue = VecDeque::new();
    for seed in 0..triangles.len() {
        if triangles[seed].group != usize::MAX {
            continue;
        }
        triangles[seed].group = group;
        queue.push_back(seed);
        while let Some(t) = queue.pop_front() {
            let next: Vec<usize> = triangles[t].neighbours.iter().map(|p| p.triangle).collect();
            for n in next {
                if triangles[n].group == usize::MAX {
                    triangles[n].group = group;
                    queue.push_back(n);
                }
            }
        }
        group += 1;
    }
    group
}

/// Projects onto the walking plane.
#[inline]
pub(crate) fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<(f32, f32, f32)> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let denom = v0.perp_dot(v1);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let v = v2.perp_dot(v1) / denom;
    let w = v0.perp_dot(v2) / denom;
    let u = 1.0 - v - w;
    let inside = u >= -BARYCENTRIC_SLACK && v >= -BARYCENTRIC_SLACK && w >= -BARYCENTRIC_SLACK;
    inside.then_some((u, v, w))
}

fn closest_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }
    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }
    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }
    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use glam::Vec3;

    use super::NavMesh;

    /// Unit quads laid out along +X: `cells` squares of side 1 at y = 0.
    pub fn strip(cells: u32) -> NavMesh {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..=cells {
            vertices.push(Vec3::new(i as f32, 0.0, 0.0));
            vertices.push(Vec3::new(i as f32, 0.0, 1.0));
        }
        for i in 0..cells {
            let a = i * 2;
            indices.extend_from_slice(&[a, a + 1, a + 2, a + 1, a + 3, a + 2]);
        }
        NavMesh::from_triangles(&vertices, &indices).expect("strip builds")
    }

    /// Two 2x2 squares separated by a gap along X.
    pub fn islands() -> NavMesh {
        let quad = |x0: f32| {
            [
                Vec3::new(x0, 0.0, 0.0),
                Vec3::new(x0, 0.0, 2.0),
                Vec3::new(x0 + 2.0, 0.0, 0.0),
                Vec3::new(x0 + 2.0, 0.0, 2.0),
            ]
        };
        let mut vertices = quad(0.0).to_vec();
        vertices.extend(quad(5.0));
        let indices = [0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6];
        NavMesh::from_triangles(&vertices, &indices).expect("islands build")
    }

    /// L-shaped floor: a 3x1 corridor along X joined to a 1x3 corridor along Z.
    pub fn corner() -> NavMesh {
        let v = |x: f32, z: f32| Vec3::new(x, 0.0, z);
        let vertices = [
            v(0.0, 0.0),
            v(3.0, 0.0),
            v(3.0, 1.0),
            v(0.0, 1.0),
            v(2.0, 1.0),
            v(2.0, 3.0),
            v(3.0, 3.0),
        ];
        // corridor along X: (0,0)-(3,0)-(3,1)-(0,1); corridor along Z: (2,1)-(3,1)-(3,3)-(2,3)
        let indices = [0, 3, 4, 0, 4, 1, 1, 4, 2, 4, 5, 2, 5, 6, 2];
        NavMesh::from_triangles(&vertices, &indices).expect("corner builds")
    }
}
