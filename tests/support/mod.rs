//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use geomesh::float_types::{Real, TAU};
use geomesh::mesh::Mesh;
use geomesh::model::{DimTag, GeoKernel, SweepOptions, Tag};

/// Returns the bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// of the mesh nodes.
pub fn bounding_box(mesh: &Mesh) -> [Real; 6] {
    let mut b = [Real::MAX, Real::MAX, Real::MAX, Real::MIN, Real::MIN, Real::MIN];
    for node in mesh.nodes() {
        let p = node.pos;
        b[0] = b[0].min(p.x);
        b[1] = b[1].min(p.y);
        b[2] = b[2].min(p.z);
        b[3] = b[3].max(p.x);
        b[4] = b[4].max(p.y);
        b[5] = b[5].max(p.z);
    }
    b
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// The cylinder script: three arcs of radius 0.1 around the centre point 4,
/// loop 1, plane surface 1, extruded by 0.3 along z. Returns the extrusion output.
pub fn cylinder_script(geo: &mut GeoKernel) -> Vec<DimTag> {
    let lc = 0.1;
    let n = 3;
    for i in 1..=n {
        let angle = TAU * i as Real / n as Real;
        geo.add_point(0.1 * angle.cos(), 0.1 * angle.sin(), 0.0, lc, Some(i))
            .unwrap();
    }
    let center = geo.add_point(0.0, 0.0, 0.0, 4.0, None).unwrap();
    assert_eq!(center, 4);
    geo.add_circle_arc(1, center, 2, Some(1)).unwrap();
    geo.add_circle_arc(2, center, 3, Some(2)).unwrap();
    geo.add_circle_arc(3, center, 1, Some(3)).unwrap();
    geo.add_curve_loop(&[1, 2, 3], Some(1)).unwrap();
    geo.add_plane_surface(&[1], Some(1)).unwrap();
    geo.extrude(&[DimTag::surface(1)], 0.0, 0.0, 0.3, SweepOptions::default())
        .unwrap()
}

/// Closed polygon in the `z = 0` plane through `corners`; returns the curve loop tag.
pub fn polygon_loop(geo: &mut GeoKernel, corners: &[(Real, Real)], lc: Real) -> Tag {
    let points: Vec<Tag> = corners
        .iter()
        .map(|&(x, y)| geo.add_point(x, y, 0.0, lc, None).unwrap())
        .collect();
    let lines: Vec<Tag> = (0..points.len())
        .map(|i| {
            geo.add_line(points[i], points[(i + 1) % points.len()], None)
                .unwrap()
        })
        .collect();
    geo.add_curve_loop(&lines, None).unwrap()
}

/// Axis-aligned square `[x0, x0 + size]²` as a plane surface.
pub fn square(geo: &mut GeoKernel, x0: Real, size: Real, lc: Real) -> Tag {
    let l = polygon_loop(
        geo,
        &[(x0, x0), (x0 + size, x0), (x0 + size, x0 + size), (x0, x0 + size)],
        lc,
    );
    geo.add_plane_surface(&[l], None).unwrap()
}

/// Area of the polygon inscribed in a circle of `radius` with `sides` sides.
pub fn inscribed_area(radius: Real, sides: usize) -> Real {
    sides as Real / 2.0 * radius * radius * (TAU / sides as Real).sin()
}
