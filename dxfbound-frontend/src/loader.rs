use std::env;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

use tracing::info;

use dxfbound_core::document::Document;
use dxfbound_core::geometry::Point2;

/// 批处理的输入来源，便于前端呈现提示信息。
#[derive(Debug, Clone)]
pub enum BatchInput {
    Files(Vec<PathBuf>),
    Demo,
}

/// 优先使用显式传入的路径；否则检查环境变量 `DXFBOUND_CLI_SAMPLE_DXF`；
/// 都没有则回退到内置示例文档。
pub fn resolve_input(paths: &[PathBuf]) -> BatchInput {
    if !paths.is_empty() {
        return BatchInput::Files(paths.to_vec());
    }
    if let Some(path) = env::var_os("DXFBOUND_CLI_SAMPLE_DXF") {
        let path = PathBuf::from(path);
        info!(path = %path.display(), "使用环境变量指定的示例 DXF");
        return BatchInput::Files(vec![path]);
    }
    BatchInput::Demo
}

/// 构建内置演示文档：毫米单位，线段、圆、圆弧、多段线各一，
/// 外加一个会被引擎跳过的文字实体。
pub fn build_demo_document() -> Document {
    let mut document = Document::new();
    document.set_insunits(4);
    document.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), "0");
    document.add_circle(Point2::new(50.0, 25.0), 12.5, "ANNOT");
    document.add_arc(Point2::new(20.0, 10.0), 7.5, 0.0, FRAC_PI_2, "ANNOT");
    document.add_polyline(
        [
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 20.0),
            Point2::new(25.0, 5.0),
        ],
        false,
        "SKETCH",
    );
    document.add_unsupported("TEXT", "ANNOT");
    document
}
