pub mod batch;
pub mod extract;

pub mod errors {
    use thiserror::Error;

    use dxfbound_io::IoError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("读取图纸失败: {0}")]
        FileRead(#[from] IoError),
        #[error("图纸中没有任何可计算范围的实体")]
        EmptyDrawing,
    }
}

pub mod units {
    /// 图纸长度单位，由 DXF 头变量 `$INSUNITS` 解析而来。
    /// 未识别的取值落入 `Unknown`，按毫米处理而不是报错。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DrawingUnit {
        Millimeter,
        Centimeter,
        Meter,
        Unknown,
    }

    impl DrawingUnit {
        /// `$INSUNITS` 映射：4→mm，5→cm，6→m，其余→Unknown。
        pub fn resolve(code: i16) -> Self {
            match code {
                4 => DrawingUnit::Millimeter,
                5 => DrawingUnit::Centimeter,
                6 => DrawingUnit::Meter,
                _ => DrawingUnit::Unknown,
            }
        }

        /// 转换到毫米的倍率。Unknown 视为图纸已经是毫米。
        #[inline]
        pub fn factor_to_mm(self) -> f64 {
            match self {
                DrawingUnit::Millimeter => 1.0,
                DrawingUnit::Centimeter => 10.0,
                DrawingUnit::Meter => 1000.0,
                DrawingUnit::Unknown => 1.0,
            }
        }

        #[inline]
        pub fn label(self) -> &'static str {
            match self {
                DrawingUnit::Millimeter => "mm",
                DrawingUnit::Centimeter => "cm",
                DrawingUnit::Meter => "m",
                DrawingUnit::Unknown => "unknown",
            }
        }
    }

}

pub mod bounds {
    use dxfbound_core::geometry::Bounds2D;

    /// 将一份角点对贡献并入当前包围盒。`None` 表示尚无贡献；
    /// 底层合并满足交换律与结合律，折叠结果与实体顺序无关。
    pub fn fold(current: Option<Bounds2D>, contribution: Bounds2D) -> Option<Bounds2D> {
        if contribution.is_empty() {
            return current;
        }
        Some(match current {
            Some(bounds) => bounds.merged(contribution),
            None => contribution,
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use dxfbound_core::geometry::Point2;

        fn boxes() -> Vec<Bounds2D> {
            vec![
                Bounds2D::from_corners(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
                Bounds2D::from_corners(Point2::new(-5.0, 3.0), Point2::new(-1.0, 9.0)),
                Bounds2D::from_corners(Point2::new(2.0, -4.0), Point2::new(2.5, -3.0)),
                Bounds2D::from_corners(Point2::new(0.5, 0.5), Point2::new(0.6, 0.6)),
            ]
        }

        #[test]
        fn fold_is_order_independent() {
            let forward = boxes().into_iter().fold(None, fold);
            let backward = boxes().into_iter().rev().fold(None, fold);
            let rotated = {
                let mut list = boxes();
                list.rotate_left(2);
                list.into_iter().fold(None, fold)
            };
            assert_eq!(forward, backward);
            assert_eq!(forward, rotated);

            let result = forward.expect("non-empty fold");
            assert_eq!(result.min(), Point2::new(-5.0, -4.0));
            assert_eq!(result.max(), Point2::new(2.5, 9.0));
        }

        #[test]
        fn empty_contribution_does_not_create_bounds() {
            assert_eq!(fold(None, Bounds2D::empty()), None);
            let some = fold(None, boxes()[0]);
            assert_eq!(fold(some, Bounds2D::empty()), some);
        }
    }
}

pub mod metrics {
    use tracing::{debug, warn};

    use dxfbound_core::document::Document;

    use crate::bounds;
    use crate::errors::EngineError;
    use crate::extract;
    use crate::units::DrawingUnit;

    /// 默认矢高容差（毫米），与旧版实现的逼近常量一致。
    pub const DEFAULT_TOLERANCE_MM: f64 = 0.001;

    /// 单份图纸的范围统计。宽高与面积以毫米/平方毫米存储，
    /// `unit` 记录图纸声明的原始单位供展示层换算。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SheetMetrics {
        pub width_mm: f64,
        pub height_mm: f64,
        pub area_mm2: f64,
        pub unit: DrawingUnit,
    }

    impl SheetMetrics {
        /// 以图纸原始单位表示的宽度。
        #[inline]
        pub fn width_in_unit(&self) -> f64 {
            self.width_mm / self.unit.factor_to_mm()
        }

        /// 以图纸原始单位表示的高度。
        #[inline]
        pub fn height_in_unit(&self) -> f64 {
            self.height_mm / self.unit.factor_to_mm()
        }
    }

    /// 单文档范围计算器：解析单位 → 提取并折叠各实体 → 换算毫米。
    #[derive(Debug, Clone)]
    pub struct SheetCalculator {
        tolerance_mm: f64,
    }

    impl SheetCalculator {
        /// 非法容差（非正或非有限值）回退到默认值并记录警告。
        pub fn new(tolerance_mm: f64) -> Self {
            if tolerance_mm.is_finite() && tolerance_mm > 0.0 {
                Self { tolerance_mm }
            } else {
                warn!(tolerance_mm, "矢高容差非法，回退到默认值");
                Self {
                    tolerance_mm: DEFAULT_TOLERANCE_MM,
                }
            }
        }

        #[inline]
        pub fn tolerance_mm(&self) -> f64 {
            self.tolerance_mm
        }

        pub fn compute(&self, document: &Document) -> Result<SheetMetrics, EngineError> {
            let unit = DrawingUnit::resolve(document.insunits());
            let factor = unit.factor_to_mm();
            // 固定的毫米预算除以倍率，真实世界的逼近误差与图纸单位无关
            let tolerance = self.tolerance_mm / factor;

            let mut running = None;
            for (_, entity) in document.entities() {
                if let Some(contribution) = extract::corner_bounds(entity, tolerance) {
                    running = bounds::fold(running, contribution);
                }
            }
            let bounds = running.ok_or(EngineError::EmptyDrawing)?;

            let width_mm = bounds.width() * factor;
            let height_mm = bounds.height() * factor;
            let area_mm2 = width_mm * height_mm;
            debug!(
                width_mm,
                height_mm,
                area_mm2,
                unit = unit.label(),
                "图纸范围计算完成"
            );
            Ok(SheetMetrics {
                width_mm,
                height_mm,
                area_mm2,
                unit,
            })
        }
    }

    impl Default for SheetCalculator {
        fn default() -> Self {
            Self::new(DEFAULT_TOLERANCE_MM)
        }
    }

}
