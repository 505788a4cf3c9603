mod support;

use geomesh::errors::GeoError;
use geomesh::float_types::{FRAC_PI_2, PI, Real};
use geomesh::model::{
    CurveShape, Dim, DimTag, GeoKernel, Layers, Model, Origin, Session, SweepOptions,
};
use geomesh::shapes;
use support::*;

#[test]
fn cylinder_script_extrusion_output() {
    let mut geo = GeoKernel::new();
    let out = cylinder_script(&mut geo);
    assert_eq!(
        out,
        vec![
            DimTag::surface(5),
            DimTag::volume(1),
            DimTag::surface(2),
            DimTag::surface(3),
            DimTag::surface(4),
        ]
    );
    let e = geo.entities();
    assert_eq!(e.len(Dim::Point), 7);
    assert_eq!(e.len(Dim::Curve), 9);
    assert_eq!(
        e.surface(5).unwrap().origin,
        Some(Origin::Top { source: 1, sweep: 0 })
    );
    assert_eq!(
        e.volume(1).unwrap().origin,
        Some(Origin::Swept { source: 1, sweep: 0 })
    );
}

#[test]
fn cylinder_arcs_meet_and_close() {
    let mut geo = GeoKernel::new();
    cylinder_script(&mut geo);
    let e = geo.entities();
    let ends: Vec<(i32, i32)> = [1, 2, 3]
        .iter()
        .map(|&c| e.oriented_endpoints(c).unwrap())
        .collect();
    assert_eq!(ends, vec![(1, 2), (2, 3), (3, 1)]);
    for c in 1..=3 {
        assert!(approx_eq(
            e.curve_length(c).unwrap(),
            0.1 * 2.0 * PI / 3.0,
            1e-12
        ));
        assert!(approx_eq(e.curve_point(c, 0.5).unwrap().coords.norm(), 0.1, 1e-12));
    }
    let ring = e.loop_polyline(1, 4).unwrap();
    assert!(ring.iter().all(|p| p.z.abs() < 1e-15));
}

#[test]
fn synchronize_publishes_topology() {
    let mut model = Model::new("cylinder");
    cylinder_script(model.geo());
    assert!(model.entities(Some(Dim::Volume)).is_empty());
    model.synchronize();
    assert_eq!(model.entities(Some(Dim::Volume)), vec![DimTag::volume(1)]);
    assert_eq!(model.entities(None).len(), 7 + 9 + 5 + 1);

    let shell = model.boundary(&[DimTag::volume(1)], false).unwrap();
    assert_eq!(shell.len(), 5);
    assert!(shell.contains(&DimTag::surface(1)));
    assert!(shell.contains(&DimTag::surface(5)));

    let oriented = model.boundary(&[DimTag::curve(1)], true).unwrap();
    assert_eq!(oriented, vec![DimTag::point(-1), DimTag::point(2)]);

    let (mins, maxs) = model.bounding_box().unwrap();
    assert!(approx_eq(maxs.z, 0.3, 1e-12));
    assert!(approx_eq(mins.z, 0.0, 1e-12));
    assert!(approx_eq(maxs.x, 0.1, 1e-12));
}

#[test]
fn surface_loop_must_be_closed() {
    let mut geo = GeoKernel::new();
    let a = square(&mut geo, 0.0, 1.0, 0.5);
    assert!(matches!(
        geo.add_surface_loop(&[a], None),
        Err(GeoError::ShellNotClosed(_))
    ));
}

#[test]
fn plane_surface_must_be_planar() {
    let mut geo = GeoKernel::new();
    let p: Vec<i32> = [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 0.5), (0.0, 1.0, 0.0)]
        .iter()
        .map(|&(x, y, z)| geo.add_point(x, y, z, 0.0, None).unwrap())
        .collect();
    let lines: Vec<i32> = (0..4)
        .map(|i| geo.add_line(p[i], p[(i + 1) % 4], None).unwrap())
        .collect();
    let l = geo.add_curve_loop(&lines, None).unwrap();
    assert!(matches!(
        geo.add_plane_surface(&[l], None),
        Err(GeoError::NonPlanarSurface(_))
    ));
}

#[test]
fn revolve_rejects_bad_sweeps() {
    let mut geo = GeoKernel::new();
    let s = square(&mut geo, 0.0, 1.0, 0.5);
    let opts = SweepOptions::default();
    assert!(matches!(
        geo.revolve(&[DimTag::surface(s)], 0.0, 5.0, 0.0, 1.0, 0.0, 0.0, PI, opts.clone()),
        Err(GeoError::InvalidSweep(_))
    ));
    // the square touches the x axis
    assert!(matches!(
        geo.revolve(&[DimTag::surface(s)], 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, FRAC_PI_2, opts.clone()),
        Err(GeoError::InvalidSweep(_))
    ));
    assert!(matches!(
        geo.extrude(&[DimTag::surface(s)], 0.0, 0.0, 0.0, opts),
        Err(GeoError::InvalidSweep(_))
    ));
}

#[test]
fn revolve_produces_arcs() {
    let mut geo = GeoKernel::new();
    let s = square(&mut geo, 1.0, 1.0, 0.5);
    let out = geo
        .revolve(
            &[DimTag::surface(s)],
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
            FRAC_PI_2,
            SweepOptions::default(),
        )
        .unwrap();
    assert_eq!(out.len(), 2 + 4);
    assert_eq!(out[1].dim, Dim::Volume);
    let e = geo.entities();
    let top = e.surface(out[0].tag).unwrap();
    let ring = e.loop_polyline(top.loops[0], 2).unwrap();
    // a quarter turn about y sends x to -z
    assert!(ring.iter().all(|p| p.x.abs() < 1e-12 && p.z < 0.0));
}

#[test]
fn translate_moves_points_and_arc_centres() {
    let mut geo = GeoKernel::new();
    let s = shapes::disk(&mut geo, 1.0, 0.5).unwrap();
    geo.translate(&[DimTag::surface(s)], 2.0, 0.0, 0.0).unwrap();
    let e = geo.entities();
    let (mins, maxs) = e.bounding_box().unwrap();
    assert!(approx_eq(mins.x, 1.0, 1e-12));
    assert!(approx_eq(maxs.x, 3.0, 1e-12));
    let moved = nalgebra::Point3::new(2.0, 0.0, 0.0);
    for c in 1..=4 {
        let CurveShape::CircleArc { center, center_tag } = e.curve(c).unwrap().shape.clone() else {
            panic!("curve {c} should be an arc");
        };
        assert!((center - moved).norm() < 1e-12);
        let centre_point = e.coords(center_tag.unwrap()).unwrap();
        assert!((centre_point - moved).norm() < 1e-12);
    }
    let mid = e.curve_point(1, 0.5).unwrap();
    assert!(approx_eq((mid - moved).norm(), 1.0, 1e-12));
}

#[test]
fn rotating_an_arc_moves_its_shared_centre_once() {
    let mut geo = GeoKernel::new();
    let s = shapes::disk(&mut geo, 1.0, 0.5).unwrap();
    geo.translate(&[DimTag::surface(s)], 1.0, 0.0, 0.0).unwrap();
    geo.rotate(&[DimTag::surface(s)], 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, FRAC_PI_2)
        .unwrap();
    let e = geo.entities();
    // four arcs share point 5; a second move would leave it at (-1, 0, 0)
    let centre = e.coords(5).unwrap();
    assert!((centre - nalgebra::Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    for c in 1..=4 {
        assert!(approx_eq((e.curve_point(c, 0.3).unwrap() - centre).norm(), 1.0, 1e-12));
    }
}

#[test]
fn copy_then_rotate() {
    let mut geo = GeoKernel::new();
    let s = square(&mut geo, 0.0, 1.0, 0.5);
    let copies = geo.copy(&[DimTag::surface(s)]).unwrap();
    assert_eq!(copies, vec![DimTag::surface(s + 1)]);
    assert_eq!(geo.entities().len(Dim::Point), 8);
    geo.rotate(&copies, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, PI).unwrap();
    let copy = geo.entities().surface(copies[0].tag).unwrap();
    let ring = geo.entities().loop_polyline(copy.loops[0], 1).unwrap();
    assert!(ring.iter().all(|p| p.x <= 1e-12 && p.y <= 1e-12));
    assert!(geo.copy(&[DimTag::volume(1)]).is_err());
}

#[test]
fn recursive_remove_clears_the_box() {
    let mut geo = GeoKernel::new();
    let v = shapes::unit_box(&mut geo, 1.0, 0.5).unwrap();
    assert!(matches!(
        geo.remove(&[DimTag::surface(1)], false),
        Err(GeoError::InUse { .. })
    ));
    geo.remove(&[DimTag::volume(v)], true).unwrap();
    assert!(geo.entities().is_empty());
    assert!(matches!(
        geo.remove(&[DimTag::volume(v)], false),
        Err(GeoError::UnknownEntity(_))
    ));
}

#[test]
fn layers_are_validated() {
    assert!(Layers::new(vec![2, 3], vec![0.4, 1.0]).is_ok());
    assert!(matches!(Layers::uniform(0), Err(GeoError::InvalidLayers(_))));
    assert!(Layers::new(vec![2], vec![0.5]).is_err());
    assert!(Layers::new(vec![2, 2], vec![0.6, 0.4]).is_err());
    assert!(Layers::new(vec![2], vec![1.0, 1.0]).is_err());
    let params = Layers::new(vec![1, 2], vec![0.5, 1.0]).unwrap().parameters();
    let expected: [Real; 4] = [0.0, 0.5, 0.75, 1.0];
    for (a, b) in params.iter().zip(expected) {
        assert!(approx_eq(*a, b, 1e-12));
    }
}

#[test]
fn session_owns_models() {
    let mut session = Session::initialize();
    cylinder_script(session.add("cylinder").geo());
    session.add("other");
    assert_eq!(session.model_names().collect::<Vec<_>>(), vec!["cylinder", "other"]);
    session.set_current("cylinder").unwrap();
    let model = session.current_mut().unwrap();
    model.synchronize();
    assert!(model.is_synchronized());
    assert_eq!(session.current().unwrap().topology().len(Dim::Volume), 1);
    session.finalize();
}

#[test]
fn curve_loop_is_chained_when_given_out_of_order() {
    let mut geo = GeoKernel::new();
    let p: Vec<i32> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]
        .iter()
        .map(|&(x, y)| geo.add_point(x, y, 0.0, 0.5, None).unwrap())
        .collect();
    let a = geo.add_line(p[0], p[1], None).unwrap();
    let b = geo.add_line(p[1], p[2], None).unwrap();
    let c = geo.add_line(p[0], p[2], None).unwrap();
    let l = geo.add_curve_loop(&[a, c, b], None).unwrap();
    assert_eq!(geo.entities().curve_loop(l).unwrap().curves, vec![a, b, -c]);
    assert!(matches!(
        geo.add_curve_loop(&[a, b], None),
        Err(GeoError::LoopNotClosed(_))
    ));
}
