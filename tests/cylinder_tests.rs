mod support;

use geomesh::float_types::Real;
use geomesh::mesh::ElementType;
use geomesh::model::{Dim, DimTag};
use geomesh::{Session, shapes};
use support::*;

fn cylinder_mesh() -> geomesh::Mesh {
    let mut session = Session::initialize();
    let model = session.add("cylinder");
    cylinder_script(model.geo());
    model.synchronize();
    session.generate(3).unwrap()
}

#[test]
fn arcs_form_a_closed_planar_loop() {
    let mesh = cylinder_mesh();
    let base = mesh.entity(DimTag::surface(1)).unwrap();
    assert!(!base.elements.is_empty());
    for (dt, _) in mesh.elements(Dim::Curve).filter(|(dt, _)| dt.tag <= 3) {
        for node in mesh.nodes_on(dt) {
            let p = mesh.node(node).unwrap().pos;
            assert!(approx_eq(p.coords.norm(), 0.1, 1e-12));
            assert!(approx_eq(p.z, 0.0, 1e-15));
        }
    }
    // three segments per arc
    for c in 1..=3 {
        assert_eq!(mesh.entity(DimTag::curve(c)).unwrap().elements.len(), 3);
    }
}

#[test]
fn extrudes_into_a_closed_volume() {
    let mesh = cylinder_mesh();
    let stats = mesh.validate().unwrap();
    assert!(stats.closed_boundaries);
    assert_eq!(mesh.open_edges(1), 0);
    assert_eq!(mesh.unmatched_faces(1), 0);

    let base_triangles = mesh.entity(DimTag::surface(1)).unwrap().elements.len();
    assert_eq!(stats.count(ElementType::Tetrahedron), 9 * base_triangles);
    assert_eq!(stats.count(ElementType::Point), 7);
    assert_eq!(stats.count(ElementType::Line), 27);
    assert_eq!(
        stats.count(ElementType::Triangle),
        2 * base_triangles + 54
    );

    let expected: Real = inscribed_area(0.1, 9) * 0.3;
    assert!(approx_eq(stats.volume, expected, 1e-12));
    let b = bounding_box(&mesh);
    assert!(approx_eq(b[2], 0.0, 1e-15));
    assert!(approx_eq(b[5], 0.3, 1e-12));
}

#[test]
fn no_inverted_elements() {
    let mesh = cylinder_mesh();
    for (_, element) in mesh.elements(Dim::Volume) {
        assert!(mesh.measure(element) > 0.0);
        assert!(mesh.quality(element).unwrap() > 0.0);
    }
    let stats = mesh.statistics();
    assert!(stats.min_volume_measure.unwrap() > 0.0);
    assert!(stats.min_edge > 0.0 && stats.max_edge < 0.3);
}

#[test]
fn top_mirrors_the_base() {
    let mesh = cylinder_mesh();
    let base = &mesh.entity(DimTag::surface(1)).unwrap().elements;
    let top = &mesh.entity(DimTag::surface(5)).unwrap().elements;
    assert_eq!(base.len(), top.len());
    for (b, t) in base.iter().zip(top) {
        for (&nb, &nt) in b.nodes.iter().zip(&t.nodes) {
            let pb = mesh.node(nb).unwrap().pos;
            let pt = mesh.node(nt).unwrap().pos;
            assert!(approx_eq(pt.z - pb.z, 0.3, 1e-12));
            assert!(approx_eq(pt.x, pb.x, 1e-12) && approx_eq(pt.y, pb.y, 1e-12));
        }
    }
}

#[test]
fn shape_builder_matches_the_script() {
    let mut session = Session::initialize();
    let model = session.add("script");
    cylinder_script(model.geo());
    model.synchronize();
    let scripted = session.generate(3).unwrap();

    let model = session.add("builder");
    shapes::cylinder(model.geo(), 0.1, 0.3, 3, 0.1).unwrap();
    model.synchronize();
    let built = session.generate(3).unwrap();

    assert_eq!(scripted.node_count(), built.node_count());
    assert_eq!(scripted.element_count(), built.element_count());
    assert!(approx_eq(
        scripted.statistics().volume,
        built.statistics().volume,
        1e-12
    ));
}

#[test]
fn more_arcs_approach_the_circle() {
    let mut session = Session::initialize();
    let model = session.add("fine");
    shapes::cylinder(model.geo(), 0.1, 0.3, 8, 0.02).unwrap();
    model.synchronize();
    let stats = session.generate(3).unwrap().validate().unwrap();
    let exact = geomesh::float_types::PI * 0.01 * 0.3;
    assert!(stats.volume < exact);
    assert!((exact - stats.volume) / exact < 0.01);
}
