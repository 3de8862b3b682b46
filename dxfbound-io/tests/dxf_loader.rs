mod golden;

use std::path::PathBuf;

use glam::DVec2;
use golden::assert_golden;

use dxfbound_core::document::Entity;
use dxfbound_io::{DocumentLoader, DxfFacade, IoError};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_basic_entities_matches_expected_document() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");
    assert_golden("basic_entities", &doc);

    assert_eq!(doc.insunits(), 4);
    assert_eq!(doc.entities().count(), 6);

    let mut unsupported = doc.entities().filter_map(|(_, entity)| match entity {
        Entity::Unsupported(other) => Some(other),
        _ => None,
    });
    let text = unsupported.next().expect("未找到被跳过的实体");
    assert!(unsupported.next().is_none(), "期望仅有一个被跳过的实体");
    assert_eq!(text.kind, "TEXT");
    assert_eq!(text.layer, "ANNOT");
}

#[test]
fn load_polyline_sequence_folds_vertices() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("polyline_seq.dxf"))
        .expect("读取 POLYLINE DXF 失败");

    let mut polylines = doc.entities().filter_map(|(_, entity)| match entity {
        Entity::Polyline(polyline) => Some(polyline),
        _ => None,
    });
    let polyline = polylines.next().expect("未找到多段线实体");
    assert!(polylines.next().is_none(), "期望仅有一个多段线实体");

    assert!(polyline.is_closed);
    assert_eq!(polyline.layer, "SHAPE");
    assert_eq!(polyline.vertices.len(), 3);
    assert!((polyline.vertices[1].position.x() - 12.0).abs() < 1e-9);
    assert!((polyline.vertices[1].bulge - 1.0).abs() < 1e-9);
    assert!(polyline.vertices[2].bulge.abs() < 1e-9);
}

#[test]
fn load_spline_entity() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("spline_basic.dxf"))
        .expect("读取 SPLINE DXF 失败");

    let mut splines = doc.entities().filter_map(|(_, entity)| match entity {
        Entity::Spline(spline) => Some(spline),
        _ => None,
    });
    let spline = splines.next().expect("未找到样条实体");
    assert!(splines.next().is_none(), "期望仅有一个样条实体");

    assert_eq!(spline.degree, 3);
    assert!(!spline.is_closed);
    assert!(!spline.is_periodic);
    assert!(!spline.is_rational);
    assert_eq!(spline.control_points.len(), 4);
    assert_eq!(spline.fit_points.len(), 2);
    assert_eq!(spline.knot_values.len(), 8);
    assert_eq!(spline.weights.len(), 4);

    let start = spline.start_tangent.expect("缺少起始切向量");
    assert_eq!(start.as_vec2(), DVec2::new(1.0, 0.0));
    let end = spline.end_tangent.expect("缺少终止切向量");
    assert_eq!(end.as_vec2(), DVec2::new(-1.0, 0.0));

    assert_eq!(spline.layer, "GEOM");
}

#[test]
fn header_units_are_captured() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("units_cm.dxf"))
        .expect("读取 cm 单位 DXF 失败");
    assert_eq!(doc.insunits(), 5);
}

#[test]
fn missing_header_leaves_units_undeclared() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("spline_basic.dxf"))
        .expect("读取无 HEADER 的 DXF 失败");
    assert_eq!(doc.insunits(), 0);
}

#[test]
fn missing_file_surfaces_read_error_with_path() {
    let loader = DxfFacade::new();
    let missing = fixture("no_such_file.dxf");
    let err = loader.load(&missing).expect_err("不存在的文件应当报错");
    match err {
        IoError::ReadError { path, .. } => assert_eq!(path, missing),
        other => panic!("期望 ReadError，实际为 {other:?}"),
    }
}
