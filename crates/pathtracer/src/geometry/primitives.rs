//! Procedural shapes in local space.
//!
//! Every function returns a flat list of triangles, no vertex is shared.
use glam::Vec3;

pub type Triangle = [Vec3; 3];

const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 4, 6, 2], // -x
    [1, 3, 7, 5], // +x
    [0, 1, 5, 4], // -y
    [2, 6, 7, 3], // +y
    [0, 2, 3, 1], // -z
    [4, 5, 7, 6], // +z
];

/// Unit cube centered on the origin, counter clockwise seen from outside
pub fn cube() -> Vec<Triangle> {
    // Bit 0, 1 and 2 of the index select the sign along x, y and z
    let corner = |i: usize| {
        let sign = |bit: usize| if i & (1 << bit) != 0 { 0.5 } else { -0.5 };
        Vec3::new(sign(0), sign(1), sign(2))
    };

    CUBE_FACES
        .iter()
        .flat_map(|&[a, b, c, d]| {
            [
                [corner(a), corner(b), corner(c)],
                [corner(a), corner(c), corner(d)],
            ]
        })
        .collect()
}

/// Unit square in the XZ plane, centered on the origin
pub fn quad() -> Vec<Triangle> {
    let p = |x: f32, z: f32| Vec3::new(x, 0.0, z);
    vec![
        [p(-0.5, -0.5), p(0.5, -0.5), p(0.5, 0.5)],
        [p(-0.5, -0.5), p(-0.5, 0.5), p(0.5, 0.5)],
    ]
}

/// Number of triangles of an icosphere with the given subdivision level
pub const fn icosphere_triangle_count(subdivisions: u32) -> usize {
    20 * 4usize.pow(subdivisions)
}

/// Unit sphere approximated by a subdivided icosahedron
///
/// Each subdivision splits a triangle in 4 using the midpoints of its edges,
/// projected back on the sphere.
pub fn icosphere(subdivisions: u32) -> Vec<Triangle> {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    let points = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .map(Vec3::normalize);

    #[rustfmt::skip]
    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    let mut triangles: Vec<Triangle> = FACES
        .iter()
        .map(|&[a, b, c]| [points[a], points[b], points[c]])
        .collect();

    for _ in 0..subdivisions {
        triangles = triangles
            .into_iter()
            .flat_map(|[v1, v2, v3]| {
                let mid1 = (v1 + v2).normalize();
                let mid2 = (v2 + v3).normalize();
                let mid3 = (v1 + v3).normalize();
                [
                    [v1, mid1, mid3],
                    [v2, mid2, mid1],
                    [v3, mid3, mid2],
                    [mid1, mid2, mid3],
                ]
            })
            .collect();
    }

    debug_assert_eq!(triangles.len(), icosphere_triangle_count(subdivisions));
    triangles
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn normal([a, b, c]: Triangle) -> Vec3 {
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn cube_faces_point_outward() {
        let triangles = cube();
        assert_eq!(triangles.len(), 12);

        for tri in triangles {
            let center = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(normal(tri).dot(center) > 0.0, "{tri:?}");
            for v in tri {
                assert_eq!(v.abs(), Vec3::splat(0.5));
            }
        }
    }

    #[test]
    fn icosphere_counts_and_radius() {
        let eps = 1e-5;
        for d in 0..=4 {
            let triangles = icosphere(d);
            assert_eq!(triangles.len(), 20 * 4usize.pow(d));
            for v in triangles.iter().flatten() {
                assert!((v.length() - 1.0).abs() < eps, "{v} at level {d}");
            }
        }
    }

    #[test]
    fn icosahedron_faces_point_outward() {
        for tri in icosphere(0) {
            let center = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(normal(tri).dot(center) > 0.0);
        }
    }

    #[test]
    fn quad_is_flat() {
        let triangles = quad();
        assert_eq!(triangles.len(), 2);
        assert!(triangles.iter().flatten().all(|v| v.y == 0.0));
    }
}
