use tracing::debug;

use dxfbound_core::document::Entity;
use dxfbound_core::geometry::{Bounds2D, Point2, Point3};

/// 单个实体的几何贡献：要么是解析得到的精确角点对，
/// 要么是一串待 min/max 归约的采样点。
#[derive(Debug, Clone)]
pub enum Extraction {
    Corners(Bounds2D),
    Points(Vec<Point2>),
}

/// 按实体类型提取几何。`tolerance` 为图纸原生单位下的矢高预算，
/// 只影响需要扁平化的曲线类实体。
pub fn extract(entity: &Entity, tolerance: f64) -> Option<Extraction> {
    match entity {
        Entity::Line(line) => Some(Extraction::Points(vec![line.start, line.end])),
        Entity::Polyline(polyline) => Some(Extraction::Points(
            polyline
                .vertices
                .iter()
                .map(|vertex| vertex.position)
                .collect(),
        )),
        // 圆的包围盒有解析解，不做任何逼近
        Entity::Circle(circle) => {
            let radius = circle.radius.abs();
            Some(Extraction::Corners(Bounds2D::from_corners(
                Point2::new(circle.center.x() - radius, circle.center.y() - radius),
                Point2::new(circle.center.x() + radius, circle.center.y() + radius),
            )))
        }
        Entity::Arc(arc) => Some(Extraction::Points(drop_z(arc.flattening(tolerance)))),
        Entity::Ellipse(ellipse) => Some(Extraction::Points(drop_z(ellipse.flattening(tolerance)))),
        Entity::Spline(spline) => Some(Extraction::Points(drop_z(spline.flattening(tolerance)))),
        Entity::Unsupported(other) => {
            debug!(kind = %other.kind, layer = %other.layer, "跳过不支持的实体类型");
            None
        }
    }
}

/// 把提取结果统一成一份角点对贡献；空点列视为没有贡献。
pub fn corner_bounds(entity: &Entity, tolerance: f64) -> Option<Bounds2D> {
    match extract(entity, tolerance)? {
        Extraction::Corners(bounds) => Some(bounds),
        Extraction::Points(points) => reduce_points(&points),
    }
}

/// 渲染层共用的取点查询：与包围盒提取同一套分派规则，
/// 但圆不走解析捷径，而是和其他曲线一样扁平化成折线。
pub fn render_points(entity: &Entity, tolerance: f64) -> Option<Vec<Point2>> {
    match entity {
        Entity::Line(line) => Some(vec![line.start, line.end]),
        Entity::Polyline(polyline) => Some(
            polyline
                .vertices
                .iter()
                .map(|vertex| vertex.position)
                .collect(),
        ),
        Entity::Circle(circle) => Some(drop_z(circle.flattening(tolerance))),
        Entity::Arc(arc) => Some(drop_z(arc.flattening(tolerance))),
        Entity::Ellipse(ellipse) => Some(drop_z(ellipse.flattening(tolerance))),
        Entity::Spline(spline) => Some(drop_z(spline.flattening(tolerance))),
        Entity::Unsupported(_) => None,
    }
}

/// 采样器按约定返回三维点，引擎在此统一丢弃 z。
fn drop_z(points: Vec<Point3>) -> Vec<Point2> {
    points
        .into_iter()
        .map(|point| Point2::new(point.x(), point.y()))
        .collect()
}

fn reduce_points(points: &[Point2]) -> Option<Bounds2D> {
    let mut bounds = Bounds2D::empty();
    for point in points {
        bounds.include_point(*point);
    }
    if bounds.is_empty() { None } else { Some(bounds) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfbound_core::document::Document;

    fn first_entity(doc: &Document) -> &Entity {
        let (_, entity) = doc.entities().next().expect("document has entities");
        entity
    }

    #[test]
    fn circle_bounds_are_exact_and_tolerance_independent() {
        let mut doc = Document::new();
        doc.add_circle(Point2::new(0.0, 0.0), 5.0, "0");
        let entity = first_entity(&doc);

        let coarse = corner_bounds(entity, 10.0).expect("circle contributes bounds");
        let fine = corner_bounds(entity, 1e-6).expect("circle contributes bounds");

        assert_eq!(coarse, fine);
        assert_eq!(coarse.min(), Point2::new(-5.0, -5.0));
        assert_eq!(coarse.max(), Point2::new(5.0, 5.0));
    }

    #[test]
    fn line_extraction_yields_both_endpoints() {
        let mut doc = Document::new();
        doc.add_line(Point2::new(-1.0, 2.0), Point2::new(3.0, -4.0), "0");
        let bounds = corner_bounds(first_entity(&doc), 0.001).expect("line contributes bounds");
        assert_eq!(bounds.min(), Point2::new(-1.0, -4.0));
        assert_eq!(bounds.max(), Point2::new(3.0, 2.0));
    }

    #[test]
    fn polyline_extraction_uses_all_vertices_in_order() {
        let mut doc = Document::new();
        doc.add_polyline(
            [
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 7.0),
                Point2::new(-3.0, 1.0),
            ],
            false,
            "0",
        );
        match extract(first_entity(&doc), 0.001) {
            Some(Extraction::Points(points)) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[1], Point2::new(2.0, 7.0));
            }
            other => panic!("expected point sequence, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_entity_is_skipped() {
        let mut doc = Document::new();
        doc.add_unsupported("MTEXT", "ANNOT");
        assert!(extract(first_entity(&doc), 0.001).is_none());
        assert!(corner_bounds(first_entity(&doc), 0.001).is_none());
        assert!(render_points(first_entity(&doc), 0.001).is_none());
    }

    #[test]
    fn render_points_flatten_circles_instead_of_shortcutting() {
        let mut doc = Document::new();
        doc.add_circle(Point2::new(0.0, 0.0), 5.0, "0");
        let points = render_points(first_entity(&doc), 0.01).expect("circle renders");
        assert!(points.len() > 4);
        for point in &points {
            let r = (point.x().powi(2) + point.y().powi(2)).sqrt();
            assert!((r - 5.0).abs() < 1e-9);
        }
    }
}
