//! Ready-made models built through the geo kernel.

use crate::errors::Result;
use crate::float_types::{Real, TAU};
use crate::model::{DimTag, GeoKernel, SweepOptions, Tag};

/// Mesh size given to the centre of a circle. It takes part in no curve
/// discretization, so it only matters for sizes interpolated from all points.
pub const CENTER_MESH_SIZE: Real = 4.0;

/// Plane surface bounded by `arcs` circle arcs of `radius` about the origin,
/// in the `z = 0` plane. Returns the surface tag.
pub fn circle_surface(geo: &mut GeoKernel, radius: Real, arcs: usize, lc: Real) -> Result<Tag> {
    let mut points = Vec::with_capacity(arcs);
    for i in 1..=arcs {
        let angle = TAU * i as Real / arcs as Real;
        points.push(geo.add_point(radius * angle.cos(), radius * angle.sin(), 0.0, lc, None)?);
    }
    let center = geo.add_point(0.0, 0.0, 0.0, CENTER_MESH_SIZE, None)?;
    let mut curves = Vec::with_capacity(arcs);
    for i in 0..arcs {
        let next = points[(i + 1) % arcs];
        curves.push(geo.add_circle_arc(points[i], center, next, None)?);
    }
    let contour = geo.add_curve_loop(&curves, None)?;
    geo.add_plane_surface(&[contour], None)
}

/// Cylinder of `radius` and `height` whose base is bounded by `arcs` arcs,
/// extruded along `z`. Returns the extrusion output:
/// `[top surface, volume, lateral surfaces...]`.
///
/// On an empty kernel the tags follow the classic script: points `1..=arcs`,
/// the centre `arcs + 1`, arcs `1..=arcs`, curve loop 1, plane surface 1.
pub fn cylinder(
    geo: &mut GeoKernel,
    radius: Real,
    height: Real,
    arcs: usize,
    lc: Real,
) -> Result<Vec<DimTag>> {
    let base = circle_surface(geo, radius, arcs, lc)?;
    geo.extrude(&[DimTag::surface(base)], 0.0, 0.0, height, SweepOptions::default())
}

/// Axis-aligned cube with one corner at the origin, built from its points up.
/// Returns the volume tag.
pub fn unit_box(geo: &mut GeoKernel, size: Real, lc: Real) -> Result<Tag> {
    let s = size;
    let corners = [
        (0.0, 0.0, 0.0),
        (s, 0.0, 0.0),
        (s, s, 0.0),
        (0.0, s, 0.0),
        (0.0, 0.0, s),
        (s, 0.0, s),
        (s, s, s),
        (0.0, s, s),
    ];
    let mut p = Vec::with_capacity(8);
    for (x, y, z) in corners {
        p.push(geo.add_point(x, y, z, lc, None)?);
    }
    // bottom ring, top ring, then the four uprights
    let edges = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (1, 5),
        (2, 6),
        (3, 7),
        (0, 4),
    ];
    let mut l = Vec::with_capacity(12);
    for (a, b) in edges {
        l.push(geo.add_line(p[a], p[b], None)?);
    }
    let faces: [[Tag; 4]; 6] = [
        [l[0], l[1], l[2], l[3]],
        [l[4], l[5], l[6], l[7]],
        [l[8], l[5], -l[9], -l[1]],
        [l[0], l[8], -l[4], -l[11]],
        [l[3], l[11], -l[7], -l[10]],
        [l[2], l[10], -l[6], -l[9]],
    ];
    let mut surfaces = Vec::with_capacity(6);
    for face in faces {
        let contour = geo.add_curve_loop(&face, None)?;
        surfaces.push(geo.add_plane_surface(&[contour], None)?);
    }
    let shell = geo.add_surface_loop(&surfaces, None)?;
    geo.add_volume(&[shell], None)
}

/// Flat disk bounded by four quarter arcs. Returns the surface tag.
pub fn disk(geo: &mut GeoKernel, radius: Real, lc: Real) -> Result<Tag> {
    circle_surface(geo, radius, 4, lc)
}

/// Three sectors of a torus: a disk of `radius` revolved about the `x`
/// parallel axis through `(0, axis_offset, 0)`.
///
/// The first sector turns the disk by `+2π/3`, the second by `-2π/3`, and the
/// third revolves a rotated copy of the disk over the remaining third.
/// Returns the three volume tags.
pub fn torus_sector(
    geo: &mut GeoKernel,
    radius: Real,
    axis_offset: Real,
    lc: Real,
    options: SweepOptions,
) -> Result<Vec<Tag>> {
    let third = TAU / 3.0;
    let section = DimTag::surface(circle_surface(geo, radius, 3, lc)?);
    let mut volumes = Vec::with_capacity(3);
    for angle in [third, -third] {
        let out = geo.revolve(
            &[section],
            0.0,
            axis_offset,
            0.0,
            1.0,
            0.0,
            0.0,
            angle,
            options.clone(),
        )?;
        volumes.push(out[1].tag);
    }
    let copy = geo.copy(&[section])?;
    geo.rotate(&copy, 0.0, axis_offset, 0.0, 1.0, 0.0, 0.0, third)?;
    let out = geo.revolve(&copy, 0.0, axis_offset, 0.0, 1.0, 0.0, 0.0, third, options)?;
    volumes.push(out[1].tag);
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dim;

    #[test]
    fn cylinder_follows_script_tags() {
        let mut geo = GeoKernel::new();
        let out = cylinder(&mut geo, 0.1, 0.3, 3, 0.1).unwrap();
        let e = geo.entities();
        assert_eq!(e.point(4).unwrap().mesh_size, CENTER_MESH_SIZE);
        assert_eq!(e.curve_loop(1).unwrap().curves, vec![1, 2, 3]);
        assert_eq!(out[0].dim, Dim::Surface);
        assert_eq!(out[1], DimTag::volume(1));
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn box_is_one_closed_volume() {
        let mut geo = GeoKernel::new();
        let v = unit_box(&mut geo, 1.0, 0.5).unwrap();
        let e = geo.entities();
        assert_eq!(v, 1);
        assert_eq!(e.len(Dim::Surface), 6);
        assert_eq!(e.len(Dim::Curve), 12);
    }

    #[test]
    fn torus_has_three_sectors() {
        let mut geo = GeoKernel::new();
        let volumes = torus_sector(&mut geo, 0.1, 0.2, 0.1, SweepOptions::default()).unwrap();
        assert_eq!(volumes, vec![1, 2, 3]);
    }
}
