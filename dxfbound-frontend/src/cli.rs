use std::path::{Path, PathBuf};

use tracing::warn;

use dxfbound_config::AppConfig;
use dxfbound_core::document::Document;
use dxfbound_engine::batch::BatchAccumulator;
use dxfbound_engine::errors::EngineError;
use dxfbound_engine::extract;
use dxfbound_engine::metrics::SheetMetrics;
use dxfbound_io::{DocumentLoader, DxfFacade};

use crate::errors::FrontendError;
use crate::loader::{self, BatchInput};

/// 运行批处理：逐个文件解析、统计并打印。
/// 单个文件失败只会被记录，不会中止整批。
pub fn run_batch(paths: &[PathBuf], config: &AppConfig) -> Result<(), FrontendError> {
    let mut batch = BatchAccumulator::new(config.engine.tolerance_mm);

    match loader::resolve_input(paths) {
        BatchInput::Files(files) => {
            println!(
                "DXF 图纸范围统计（矢高容差 {} mm）",
                batch.calculator().tolerance_mm()
            );
            for path in &files {
                process_file(&mut batch, path, config);
            }
        }
        BatchInput::Demo => {
            println!("未提供 DXF 文件，使用内置示例图纸。");
            let document = loader::build_demo_document();
            let metrics = batch.add_document("内置示例", &document)?;
            print_metrics("内置示例", &metrics);
            if config.frontend.show_render_summary {
                print_render_summary(&document, batch.calculator().tolerance_mm(), &metrics);
            }
        }
    }

    print_totals(&batch);
    Ok(())
}

fn process_file(batch: &mut BatchAccumulator, path: &Path, config: &AppConfig) {
    let display = path.display().to_string();
    if config.frontend.show_render_summary {
        // 需要文档本体做采样统计时自行解析一次，再交给累计器
        match DxfFacade::new().load(path) {
            Ok(document) => match batch.add_document(path.to_path_buf(), &document) {
                Ok(metrics) => {
                    print_metrics(&display, &metrics);
                    print_render_summary(&document, batch.calculator().tolerance_mm(), &metrics);
                }
                Err(err) => report_failure(&display, &err),
            },
            Err(err) => report_failure(&display, &EngineError::FileRead(err)),
        }
    } else {
        match batch.add_file(path) {
            Ok(metrics) => print_metrics(&display, &metrics),
            Err(err) => report_failure(&display, &err),
        }
    }
}

fn report_failure(name: &str, err: &EngineError) {
    warn!(file = name, error = %err, "文件处理失败，继续后续文件");
    println!("  {name}: 处理失败（{err}）");
}

fn print_metrics(name: &str, metrics: &SheetMetrics) {
    let unit = metrics.unit.label();
    println!(
        "  {name}: 宽 {:.3} {unit} × 高 {:.3} {unit}，面积 {:.3} mm²",
        metrics.width_in_unit(),
        metrics.height_in_unit(),
        metrics.area_mm2
    );
}

/// 逐实体的采样统计，复用与包围盒计算同一套几何提取规则。
fn print_render_summary(document: &Document, tolerance_mm: f64, metrics: &SheetMetrics) {
    let tolerance = tolerance_mm / metrics.unit.factor_to_mm();
    let mut total = 0usize;
    let mut skipped = 0usize;
    println!("    逐实体采样：");
    for (id, entity) in document.entities() {
        match extract::render_points(entity, tolerance) {
            Some(points) => {
                total += points.len();
                println!(
                    "      #{} {} (图层 {}): {} 个采样点",
                    id.get(),
                    entity.kind_name(),
                    entity.layer_name(),
                    points.len()
                );
            }
            None => {
                skipped += 1;
                println!(
                    "      #{} {} (图层 {}): 跳过",
                    id.get(),
                    entity.kind_name(),
                    entity.layer_name()
                );
            }
        }
    }
    println!("    合计 {total} 个采样点，跳过 {skipped} 个实体");
}

fn print_totals(batch: &BatchAccumulator) {
    println!(
        "共成功统计 {} 份图纸，累计面积 {:.3} mm² = {:.5} cm² = {:.9} m²",
        batch.len(),
        batch.cumulative_area_mm2(),
        batch.cumulative_area_cm2(),
        batch.cumulative_area_m2()
    );
}
