use std::path::{Path, PathBuf};

use tracing::debug;

use dxfbound_core::document::Document;
use dxfbound_io::{DocumentLoader, DxfFacade};

use crate::errors::EngineError;
use crate::metrics::{SheetCalculator, SheetMetrics};

/// 批处理中一份成功计算的文件记录。
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub metrics: SheetMetrics,
}

/// 跨文件的面积累计器。由调用方持有并显式 `reset`，
/// 取代旧版单窗口实现里的全局结果列表。
///
/// 单个文件失败只向调用方返回错误，已累计的记录不受影响，
/// 批处理永远不会因为一份坏文件而中止。
pub struct BatchAccumulator {
    loader: DxfFacade,
    calculator: SheetCalculator,
    entries: Vec<BatchEntry>,
}

impl BatchAccumulator {
    pub fn new(tolerance_mm: f64) -> Self {
        Self {
            loader: DxfFacade::new(),
            calculator: SheetCalculator::new(tolerance_mm),
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn calculator(&self) -> &SheetCalculator {
        &self.calculator
    }

    /// 解析并统计一份文件，成功时追加到批次记录。
    pub fn add_file(&mut self, path: &Path) -> Result<SheetMetrics, EngineError> {
        let document = self.loader.load(path)?;
        self.add_document(path.to_path_buf(), &document)
    }

    /// 统计一份已在内存中的文档（演示数据或调用方自行解析的文件）。
    pub fn add_document(
        &mut self,
        label: impl Into<PathBuf>,
        document: &Document,
    ) -> Result<SheetMetrics, EngineError> {
        let label = label.into();
        let metrics = self.calculator.compute(document)?;
        debug!(
            file = %label.display(),
            area_mm2 = metrics.area_mm2,
            "文件范围统计完成"
        );
        self.entries.push(BatchEntry {
            path: label,
            metrics,
        });
        Ok(metrics)
    }

    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cumulative_area_mm2(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.metrics.area_mm2)
            .sum()
    }

    #[inline]
    pub fn cumulative_area_cm2(&self) -> f64 {
        self.cumulative_area_mm2() / 100.0
    }

    #[inline]
    pub fn cumulative_area_m2(&self) -> f64 {
        self.cumulative_area_mm2() / 1_000_000.0
    }

    /// 清空批次记录，容差设置保持不变。
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
