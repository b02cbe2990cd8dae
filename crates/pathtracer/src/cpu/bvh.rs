//! Bounding volume hierarchy over a triangle soup.
//!
//! Built top down: the primitives of a node are sorted along the largest axis of the node
//! bounds and split in two halves. Nodes are stored flat, the first child of an interior node
//! directly follows it.
use glam::Vec3;

use crate::geometry::Triangle;

/// Leaves hold at most this many triangles
const MAX_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub bounds: (f32, f32),
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Self {
        Self {
            origin,
            direction,
            bounds: (t_min, t_max),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }
}

/// Axis aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn from_triangle(triangle: &Triangle) -> Self {
        let [a, b, c] = *triangle;
        Self {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn diag(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    /// Slab test, with the inverse of the ray direction precomputed
    fn hit(&self, ray: &Ray, inv_dir: Vec3) -> bool {
        let t0 = (self.min - ray.origin) * inv_dir;
        let t1 = (self.max - ray.origin) * inv_dir;
        let t_min = t0.min(t1).max_element().max(ray.bounds.0);
        let t_max = t0.max(t1).min_element().min(ray.bounds.1);
        t_min <= t_max
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { first: u32, count: u32 },
    /// The first child is the next node
    Interior { second: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    /// Index of the triangle in the original soup
    pub primitive: u32,
    pub u: f32,
    pub v: f32,
    /// Geometric normal, following the winding
    pub normal: Vec3,
}

#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<Node>,
    triangles: Vec<Triangle>,
    /// Original index of each triangle
    indices: Vec<u32>,
}

impl Bvh {
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut order: Vec<u32> = (0..triangles.len() as u32).collect();
        let bounds: Vec<Aabb> = triangles.iter().map(Aabb::from_triangle).collect();

        // A binary tree with leaves of at least one primitive has less than 2n nodes
        let mut nodes = Vec::with_capacity(2 * triangles.len());
        if !triangles.is_empty() {
            Self::build_node(&mut nodes, &bounds, &mut order, 0);
        }

        Self {
            nodes,
            triangles: order.iter().map(|&i| triangles[i as usize]).collect(),
            indices: order,
        }
    }

    fn build_node(nodes: &mut Vec<Node>, bounds: &[Aabb], order: &mut [u32], first: usize) {
        let node_bounds = order
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.union(bounds[i as usize]));

        let n = order.len();
        if n <= MAX_LEAF_SIZE {
            nodes.push(Node {
                bounds: node_bounds,
                kind: NodeKind::Leaf {
                    first: first as u32,
                    count: n as u32,
                },
            });
            return;
        }

        // Sort by main axis
        let Vec3 { x, y, z } = node_bounds.diag();
        let main_axis: fn(Vec3) -> f32 = if x >= y && x >= z {
            |v| v.x
        } else if y >= z {
            |v| v.y
        } else {
            |v| v.z
        };
        order.sort_by(|&a, &b| {
            let a = main_axis(bounds[a as usize].center());
            let b = main_axis(bounds[b as usize].center());
            a.total_cmp(&b)
        });

        let index = nodes.len();
        nodes.push(Node {
            bounds: node_bounds,
            kind: NodeKind::Interior { second: 0 },
        });

        let half = n / 2;
        let (left, right) = order.split_at_mut(half);
        Self::build_node(nodes, bounds, left, first);
        let second = nodes.len() as u32;
        Self::build_node(nodes, bounds, right, first + half);
        nodes[index].kind = NodeKind::Interior { second };
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bytes currently reserved
    pub fn allocated_size(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>()
            + self.triangles.capacity() * std::mem::size_of::<Triangle>()
            + self.indices.capacity() * std::mem::size_of::<u32>()
    }

    /// Bytes actually used
    pub fn used_size(&self) -> usize {
        self.nodes.len() * std::mem::size_of::<Node>()
            + self.triangles.len() * std::mem::size_of::<Triangle>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }

    pub fn compact(&mut self) {
        self.nodes.shrink_to_fit();
        self.triangles.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    /// Closest hit along the ray
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut ray = ray.clone();
        let mut closest = None;
        self.traverse(&mut ray, |ray, hit| {
            ray.bounds.1 = hit.t;
            closest = Some(hit);
            false
        });
        closest
    }

    /// Whether anything blocks the ray, stops at the first hit
    pub fn occluded(&self, ray: &Ray) -> bool {
        let mut ray = ray.clone();
        let mut occluded = false;
        self.traverse(&mut ray, |_, _| {
            occluded = true;
            true
        });
        occluded
    }

    /// Calls `on_hit` for each hit inside the ray bounds, which it may shrink. Traversal ends
    /// when it returns true.
    fn traverse(&self, ray: &mut Ray, mut on_hit: impl FnMut(&mut Ray, Hit) -> bool) {
        if self.nodes.is_empty() {
            return;
        }
        let inv_dir = ray.direction.recip();
        let mut stack = Vec::with_capacity(64);
        stack.push(0u32);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if !node.bounds.hit(ray, inv_dir) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, count } => {
                    for i in first..first + count {
                        let triangle = &self.triangles[i as usize];
                        let Some((t, u, v)) = moller_trumbore(triangle, ray) else {
                            continue;
                        };
                        let [a, b, c] = *triangle;
                        let hit = Hit {
                            t,
                            primitive: self.indices[i as usize],
                            u,
                            v,
                            normal: (b - a).cross(c - a).normalize_or_zero(),
                        };
                        if on_hit(ray, hit) {
                            return;
                        }
                    }
                }
                NodeKind::Interior { second } => {
                    stack.push(second);
                    stack.push(index + 1);
                }
            }
        }
    }
}

/// Ray triangle intersection, returns the distance and barycentrics
fn moller_trumbore([a, b, c]: &Triangle, ray: &Ray) -> Option<(f32, f32, f32)> {
    let e1 = *b - *a;
    let e2 = *c - *a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < f32::EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - *a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (ray.bounds.0 < t && t < ray.bounds.1).then_some((t, u, v))
}
