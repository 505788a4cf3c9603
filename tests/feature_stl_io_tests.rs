#![cfg(feature = "stl-io")]

mod support;

use geomesh::mesh::{ElementType, Mesh, MeshOptions};
use geomesh::model::{DimTag, GeoKernel, Layers, SweepOptions};
use geomesh::shapes;
use support::*;

fn disk_mesh() -> Mesh {
    let mut geo = GeoKernel::new();
    shapes::disk(&mut geo, 1.0, 0.5).unwrap();
    Mesh::generate(geo.entities(), 2, &MeshOptions::default()).unwrap()
}

#[test]
fn mesh_to_stl_ascii() {
    let mesh = disk_mesh();
    let stl_str = mesh.to_stl_ascii("test_disk");
    assert!(stl_str.starts_with("solid test_disk"));
    assert!(stl_str.trim_end().ends_with("endsolid test_disk"));
    let facets = stl_str.matches("facet normal").count();
    assert_eq!(facets, mesh.count_of(ElementType::Triangle));
    assert_eq!(stl_str.matches("vertex").count(), 3 * facets);
    assert!(!stl_str.contains("-1.000000\n    outer loop"));
}

#[test]
fn binary_stl_reads_back() -> Result<(), Box<dyn std::error::Error>> {
    let mesh = disk_mesh();
    let bytes = mesh.to_stl_binary("disk")?;
    let read = stl_io::read_stl(&mut std::io::Cursor::new(bytes))?;
    assert_eq!(read.faces.len(), mesh.count_of(ElementType::Triangle));
    Ok(())
}

#[test]
fn quads_are_split_for_stl() -> Result<(), Box<dyn std::error::Error>> {
    let mut geo = GeoKernel::new();
    let s = square(&mut geo, 0.0, 1.0, 2.0);
    let options = SweepOptions::default()
        .layers(Layers::uniform(2)?)
        .recombine(true);
    geo.extrude(&[DimTag::surface(s)], 0.0, 0.0, 1.0, options)?;
    let mesh = Mesh::generate(geo.entities(), 3, &MeshOptions::default())?;
    let quads = mesh.count_of(ElementType::Quad);
    let triangles = mesh.count_of(ElementType::Triangle);
    assert_eq!(quads, 8);

    let bytes = mesh.to_stl_binary("block")?;
    let read = stl_io::read_stl(&mut std::io::Cursor::new(bytes))?;
    assert_eq!(read.faces.len(), triangles + 2 * quads);
    Ok(())
}

#[test]
fn write_picks_stl_from_extension() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::temp_dir().join(format!("geomesh-test-{}.stl", std::process::id()));
    let mesh = disk_mesh();
    mesh.write(&path)?;
    let bytes = std::fs::read(&path)?;
    // 80 byte header, a u32 count, 50 bytes per facet
    assert_eq!(bytes.len(), 84 + 50 * mesh.count_of(ElementType::Triangle));
    let _ = std::fs::remove_file(&path);
    Ok(())
}
