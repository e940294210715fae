//! Convex hull reduction of model vertices
//!
//! A projected model's bounding rectangle depends only on its hull vertices.
//! The hull is built with quickhull: every point still outside the hull sits
//! in the conflict list of exactly one face, and only the farthest point of a
//! face's list is ever added.

use glam::Vec3;
use std::collections::{HashMap, HashSet};

/// Relative tolerance for plane tests, scaled by the point cloud size
const RELATIVE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct Face {
    vertices: [usize; 3],
    normal: Vec3,
    offset: f32,
}

impl Face {
    /// Face through three points with its normal pointing away from `interior`
    fn oriented(points: &[Vec3], a: usize, b: usize, c: usize, interior: Vec3) -> Self {
        let mut face = Self::through(points, a, b, c);
        if face.distance(interior) > 0.0 {
            face = Self::through(points, a, c, b);
        }
        face
    }

    fn through(points: &[Vec3], a: usize, b: usize, c: usize) -> Self {
        let normal = (points[b] - points[a])
            .cross(points[c] - points[a])
            .normalize_or_zero();
        Self {
            vertices: [a, b, c],
            normal,
            offset: normal.dot(points[a]),
        }
    }

    fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// A hull face together with the points that can see it
struct ConflictFace {
    face: Face,
    outside: Vec<usize>,
    alive: bool,
}

/// Faces of the hull under construction
///
/// Faces keep a consistent outward winding, so the neighbor across directed
/// edge `(a, b)` is the face owning `(b, a)`.
struct HullBuilder<'a> {
    points: &'a [Vec3],
    epsilon: f32,
    faces: Vec<ConflictFace>,
    edge_owner: HashMap<(usize, usize), usize>,
}

impl<'a> HullBuilder<'a> {
    fn new(points: &'a [Vec3], epsilon: f32) -> Self {
        Self {
            points,
            epsilon,
            faces: Vec::new(),
            edge_owner: HashMap::new(),
        }
    }

    fn add_face(&mut self, face: Face) -> usize {
        let id = self.faces.len();
        for edge in face.edges() {
            self.edge_owner.insert(edge, id);
        }
        self.faces.push(ConflictFace {
            face,
            outside: Vec::new(),
            alive: true,
        });
        id
    }

    fn remove_face(&mut self, id: usize) -> Vec<usize> {
        let conflict = &mut self.faces[id];
        conflict.alive = false;
        for edge in conflict.face.edges() {
            if self.edge_owner.get(&edge) == Some(&id) {
                self.edge_owner.remove(&edge);
            }
        }
        std::mem::take(&mut conflict.outside)
    }

    /// Hand each point to the first face it lies outside of; points outside
    /// none of them are inside the hull and dropped
    fn assign(&mut self, candidates: impl IntoIterator<Item = usize>, faces: &[usize]) {
        for index in candidates {
            let point = self.points[index];
            if let Some(&id) = faces
                .iter()
                .find(|&&id| self.faces[id].face.distance(point) > self.epsilon)
            {
                self.faces[id].outside.push(index);
            }
        }
    }

    fn farthest_outside(&self, id: usize) -> Option<usize> {
        let conflict = &self.faces[id];
        conflict.outside.iter().copied().max_by(|&a, &b| {
            conflict
                .face
                .distance(self.points[a])
                .total_cmp(&conflict.face.distance(self.points[b]))
        })
    }

    /// Faces visible from `apex`, flooded from `seed`, and the horizon edges
    /// around them in the winding of the visible side
    fn visible_region(&self, seed: usize, apex: Vec3) -> (Vec<usize>, Vec<(usize, usize)>) {
        let mut visible = vec![seed];
        let mut seen = HashSet::from([seed]);
        let mut horizon = Vec::new();
        let mut cursor = 0;

        while cursor < visible.len() {
            let id = visible[cursor];
            cursor += 1;
            for (from, to) in self.faces[id].face.edges() {
                let Some(&neighbor) = self.edge_owner.get(&(to, from)) else {
                    continue;
                };
                if seen.contains(&neighbor) {
                    continue;
                }
                if self.faces[neighbor].face.distance(apex) > self.epsilon {
                    seen.insert(neighbor);
                    visible.push(neighbor);
                } else {
                    horizon.push((from, to));
                }
            }
        }

        (visible, horizon)
    }

    fn build(mut self, simplex: [usize; 4]) -> Vec<usize> {
        let points = self.points;
        let interior = simplex.iter().map(|&i| points[i]).sum::<Vec3>() / 4.0;
        let [a, b, c, d] = simplex;
        let initial: Vec<usize> = [(a, b, c), (a, b, d), (a, c, d), (b, c, d)]
            .into_iter()
            .map(|(x, y, z)| self.add_face(Face::oriented(points, x, y, z, interior)))
            .collect();
        self.assign(
            (0..points.len()).filter(|index| !simplex.contains(index)),
            &initial,
        );

        let mut pending = initial;
        while let Some(id) = pending.pop() {
            if !self.faces[id].alive {
                continue;
            }
            let Some(apex_index) = self.farthest_outside(id) else {
                continue;
            };
            let apex = points[apex_index];

            let (visible, horizon) = self.visible_region(id, apex);
            let mut orphans = Vec::new();
            for face in visible {
                orphans.extend(self.remove_face(face));
            }

            // Horizon edges keep their winding, so the new faces point outward
            let new_faces: Vec<usize> = horizon
                .into_iter()
                .map(|(from, to)| self.add_face(Face::through(points, from, to, apex_index)))
                .collect();
            self.assign(
                orphans.into_iter().filter(|&index| index != apex_index),
                &new_faces,
            );

            pending.extend(
                new_faces
                    .into_iter()
                    .filter(|&face| !self.faces[face].outside.is_empty()),
            );
        }

        let mut hull_indices: Vec<usize> = self
            .faces
            .iter()
            .filter(|conflict| conflict.alive)
            .flat_map(|conflict| conflict.face.vertices)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        hull_indices.sort_unstable();
        hull_indices
    }
}

/// Remove exact duplicates while keeping first-seen order
fn dedup_points(points: &[Vec3]) -> Vec<Vec3> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .copied()
        .filter(|point| seen.insert(point.to_array().map(f32::to_bits)))
        .collect()
}

fn farthest_by<F: Fn(Vec3) -> f32>(points: &[Vec3], metric: F) -> (usize, f32) {
    points
        .iter()
        .enumerate()
        .map(|(index, &point)| (index, metric(point)))
        .fold((0, f32::NEG_INFINITY), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
}

/// Pick four points spanning a non-degenerate tetrahedron
fn initial_simplex(points: &[Vec3], epsilon: f32) -> Option<[usize; 4]> {
    let (i0, _) = farthest_by(points, |p| -p.x);
    let p0 = points[i0];

    let (i1, d1) = farthest_by(points, |p| p.distance(p0));
    if d1 <= epsilon {
        return None;
    }
    let p1 = points[i1];
    let line = (p1 - p0).normalize();

    let (i2, d2) = farthest_by(points, |p| line.cross(p - p0).length());
    if d2 <= epsilon {
        return None;
    }
    let plane = line.cross(points[i2] - p0).normalize();

    let (i3, d3) = farthest_by(points, |p| plane.dot(p - p0).abs());
    if d3 <= epsilon {
        return None;
    }

    Some([i0, i1, i2, i3])
}

/// Vertices of the convex hull of `points`
///
/// Duplicates are removed. When the points are collinear or coplanar the
/// deduplicated set is returned unchanged; it still bounds every projection.
pub fn convex_hull_points(points: &[Vec3]) -> Vec<Vec3> {
    let points = dedup_points(points);
    if points.len() <= 4 {
        return points;
    }

    let (min, max) = points
        .iter()
        .fold((Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });
    let epsilon = (max - min).length() * RELATIVE_EPSILON;

    let Some(simplex) = initial_simplex(&points, epsilon) else {
        return points;
    };

    HullBuilder::new(&points, epsilon)
        .build(simplex)
        .into_iter()
        .map(|index| points[index])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners() -> Vec<Vec3> {
        let mut corners = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    corners.push(Vec3::new(x, y, z));
                }
            }
        }
        corners
    }

    fn contains(points: &[Vec3], point: Vec3) -> bool {
        points.iter().any(|p| p.distance(point) < 1e-6)
    }

    #[test]
    fn test_cube_with_interior_points() {
        let mut points = cube_corners();
        points.push(Vec3::ZERO);
        points.push(Vec3::new(0.5, -0.25, 0.75));
        points.push(Vec3::new(-0.9, 0.9, 0.0));

        let hull = convex_hull_points(&points);
        assert_eq!(hull.len(), 8);
        for corner in cube_corners() {
            assert!(contains(&hull, corner));
        }
    }

    #[test]
    fn test_duplicates_are_removed() {
        let mut points = cube_corners();
        points.extend(cube_corners());
        assert_eq!(convex_hull_points(&points).len(), 8);
    }

    #[test]
    fn test_points_on_faces_are_dropped() {
        let mut points = cube_corners();
        points.push(Vec3::new(1.0, 0.0, 0.0));
        points.push(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(convex_hull_points(&points).len(), 8);
    }

    #[test]
    fn test_coplanar_points_fall_back_to_input() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
        ];
        assert_eq!(convex_hull_points(&points).len(), 5);
    }

    #[test]
    fn test_octahedron_with_noise_inside() {
        let mut points = vec![
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
        ];
        for i in 0..50 {
            let t = i as f32 * 0.37;
            points.push(Vec3::new(t.sin(), t.cos(), (t * 1.7).sin()) * 0.3);
        }

        let hull = convex_hull_points(&points);
        assert_eq!(hull.len(), 6);
        assert!(contains(&hull, Vec3::NEG_Z));
    }

    #[test]
    fn test_empty_input() {
        assert!(convex_hull_points(&[]).is_empty());
    }

    /// Points spread evenly over the unit sphere, all of them hull vertices
    fn sphere_points(count: usize) -> Vec<Vec3> {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        (0..count)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f32 + 0.5) / count as f32;
                let radius = (1.0 - y * y).sqrt();
                let theta = golden_angle * i as f32;
                Vec3::new(radius * theta.cos(), y, radius * theta.sin())
            })
            .collect()
    }

    #[test]
    fn test_large_sphere_keeps_every_vertex() {
        let points = sphere_points(20_000);

        let start = std::time::Instant::now();
        let hull = convex_hull_points(&points);
        let elapsed = start.elapsed();

        assert_eq!(hull.len(), points.len());
        assert!(
            elapsed < std::time::Duration::from_secs(10),
            "hull of {} points took {elapsed:?}",
            points.len()
        );
    }

    #[test]
    fn test_hull_preserves_extreme_projections() {
        let mut points = sphere_points(500)
            .into_iter()
            .map(|p| p * Vec3::new(2.0, 1.0, 0.5))
            .collect::<Vec<_>>();
        for i in 0..2_000 {
            let t = i as f32 * 0.618;
            points.push(Vec3::new(t.sin(), (t * 1.3).cos(), (t * 2.1).sin()) * 0.4);
        }

        let hull = convex_hull_points(&points);
        assert!(hull.len() <= 500);

        for direction in sphere_points(64) {
            let max_of = |set: &[Vec3]| {
                set.iter()
                    .map(|p| p.dot(direction))
                    .fold(f32::NEG_INFINITY, f32::max)
            };
            assert!((max_of(&points) - max_of(&hull)).abs() < 1e-5);
        }
    }
}
