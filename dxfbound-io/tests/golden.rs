use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use dxfbound_core::document::{Document, Entity, Polyline};
use dxfbound_core::geometry::{Point2, Vector2};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenDocument {
    insunits: i16,
    layers: Vec<GoldenLayer>,
    entities: Vec<GoldenEntity>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenLayer {
    name: String,
    is_visible: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenEntity {
    id: u64,
    kind: String,
    layer: String,
    data: Value,
}

pub fn assert_golden(name: &str, document: &Document) {
    let snapshot = GoldenDocument::from_document(document);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenDocument = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前解析结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}

impl GoldenDocument {
    fn from_document(document: &Document) -> Self {
        let mut layers: Vec<GoldenLayer> = document
            .layers()
            .map(|layer| GoldenLayer {
                name: layer.name.clone(),
                is_visible: layer.is_visible,
            })
            .collect();
        layers.sort_by(|a, b| a.name.cmp(&b.name));

        let mut entities: Vec<GoldenEntity> = document
            .entities()
            .map(|(id, entity)| {
                let (kind, layer, data) = entity_payload(entity);
                GoldenEntity {
                    id: id.get(),
                    kind,
                    layer,
                    data,
                }
            })
            .collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            insunits: document.insunits(),
            layers,
            entities,
        }
    }
}

fn entity_payload(entity: &Entity) -> (String, String, Value) {
    match entity {
        Entity::Line(line) => (
            "LINE".to_string(),
            line.layer.clone(),
            json!({
                "start": point_to_array(line.start),
                "end": point_to_array(line.end)
            }),
        ),
        Entity::Circle(circle) => (
            "CIRCLE".to_string(),
            circle.layer.clone(),
            json!({
                "center": point_to_array(circle.center),
                "radius": circle.radius
            }),
        ),
        Entity::Arc(arc) => (
            "ARC".to_string(),
            arc.layer.clone(),
            json!({
                "center": point_to_array(arc.center),
                "radius": arc.radius,
                "start_angle": arc.start_angle,
                "end_angle": arc.end_angle
            }),
        ),
        Entity::Ellipse(ellipse) => (
            "ELLIPSE".to_string(),
            ellipse.layer.clone(),
            json!({
                "center": point_to_array(ellipse.center),
                "major_axis": vector_to_array(ellipse.major_axis),
                "ratio": ellipse.ratio,
                "start_parameter": ellipse.start_parameter,
                "end_parameter": ellipse.end_parameter
            }),
        ),
        Entity::Polyline(polyline) => (
            "LWPOLYLINE".to_string(),
            polyline.layer.clone(),
            polyline_to_value(polyline),
        ),
        Entity::Spline(spline) => (
            "SPLINE".to_string(),
            spline.layer.clone(),
            json!({
                "degree": spline.degree,
                "is_rational": spline.is_rational,
                "is_closed": spline.is_closed,
                "is_periodic": spline.is_periodic,
                "control_points": spline
                    .control_points
                    .iter()
                    .map(|point| point_to_array(*point))
                    .collect::<Vec<_>>(),
                "fit_points": spline
                    .fit_points
                    .iter()
                    .map(|point| point_to_array(*point))
                    .collect::<Vec<_>>(),
                "knot_values": spline.knot_values,
                "weights": spline.weights,
                "start_tangent": spline.start_tangent.map(vector_to_array),
                "end_tangent": spline.end_tangent.map(vector_to_array)
            }),
        ),
        Entity::Unsupported(other) => (other.kind.clone(), other.layer.clone(), json!({})),
    }
}

fn polyline_to_value(polyline: &Polyline) -> Value {
    json!({
        "is_closed": polyline.is_closed,
        "vertices": polyline
            .vertices
            .iter()
            .map(|vertex| {
                json!({
                    "position": point_to_array(vertex.position),
                    "bulge": vertex.bulge
                })
            })
            .collect::<Vec<_>>()
    })
}

fn point_to_array(point: Point2) -> [f64; 2] {
    [point.x(), point.y()]
}

fn vector_to_array(vector: Vector2) -> [f64; 2] {
    [vector.x(), vector.y()]
}
