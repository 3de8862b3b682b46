pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，与原 Python 版的双精度坐标保持一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，目前主要承载椭圆主轴。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维点。曲线采样器按约定返回三维坐标，调用方自行丢弃 z。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框。`empty()` 表示尚无任何几何贡献。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        /// 由任意两个对角点构造，自动归一化 min/max。
        #[inline]
        pub fn from_corners(a: Point2, b: Point2) -> Self {
            Self {
                min: Point2::from_vec(a.as_vec2().min(b.as_vec2())),
                max: Point2::from_vec(a.as_vec2().max(b.as_vec2())),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point2::from_vec(self.min.as_vec2().min(point.as_vec2()));
            self.max = Point2::from_vec(self.max.as_vec2().max(point.as_vec2()));
        }

        /// 纯函数式合并：逐分量取 min/max。满足交换律与结合律，
        /// 因此折叠结果与实体遍历顺序无关。
        #[inline]
        pub fn merged(self, other: Bounds2D) -> Bounds2D {
            if self.is_empty() {
                return other;
            }
            if other.is_empty() {
                return self;
            }
            Bounds2D {
                min: Point2::from_vec(self.min.as_vec2().min(other.min.as_vec2())),
                max: Point2::from_vec(self.max.as_vec2().max(other.max.as_vec2())),
            }
        }
    }

}

pub mod document {
    use std::collections::HashMap;
    use std::f64::consts::{FRAC_PI_2, TAU};

    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Point3, Vector2};

    /// 单次扁平化最多产生的线段数，防止病态容差导致无界采样。
    const MAX_FLATTEN_SEGMENTS: usize = 65_536;
    /// 样条自适应细分的递归深度上限。
    const MAX_SUBDIVISION_DEPTH: u32 = 16;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
            }
        }
    }

    /// 图纸实体。封闭的标签联合：解析器读到但引擎不参与计算的类型
    /// 统一落入 `Unsupported`，由上层显式跳过。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Ellipse(Ellipse),
        Polyline(Polyline),
        Spline(Spline),
        Unsupported(Unsupported),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Ellipse(ellipse) => &ellipse.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Spline(spline) => &spline.layer,
                Entity::Unsupported(other) => &other.layer,
            }
        }

        /// DXF 风格的类型名，用于日志与展示。
        pub fn kind_name(&self) -> &str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Ellipse(_) => "ELLIPSE",
                Entity::Polyline(_) => "LWPOLYLINE",
                Entity::Spline(_) => "SPLINE",
                Entity::Unsupported(other) => &other.kind,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
    }

    /// 圆弧实体，角度以弧度储存，遵循数学正方向。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
    }

    /// 椭圆实体，记录主轴向量与参数范围（单位为弧度）。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Ellipse {
        pub center: Point2,
        pub major_axis: Vector2,
        pub ratio: f64,
        pub start_parameter: f64,
        pub end_parameter: f64,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<PolylineVertex>,
        pub is_closed: bool,
        pub layer: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PolylineVertex {
        pub position: Point2,
        pub bulge: f64,
    }

    impl PolylineVertex {
        #[inline]
        pub fn new(position: Point2) -> Self {
            Self {
                position,
                bulge: 0.0,
            }
        }

        #[inline]
        pub fn with_bulge(position: Point2, bulge: f64) -> Self {
            Self { position, bulge }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Spline {
        pub degree: i32,
        pub is_rational: bool,
        pub is_closed: bool,
        pub is_periodic: bool,
        pub control_points: Vec<Point2>,
        pub fit_points: Vec<Point2>,
        pub knot_values: Vec<f64>,
        pub weights: Vec<f64>,
        pub start_tangent: Option<Vector2>,
        pub end_tangent: Option<Vector2>,
        pub layer: String,
    }

    /// 解析器保留但不参与范围计算的实体（TEXT、HATCH 等）。
    /// 仅记录类型名与图层，便于诊断到底跳过了什么。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Unsupported {
        pub kind: String,
        pub layer: String,
    }

    impl Circle {
        /// 以不超过 `distance`（图纸单位）的矢高偏差采样整圆。
        pub fn flattening(&self, distance: f64) -> Vec<Point3> {
            let radius = self.radius.abs();
            if radius <= f64::EPSILON {
                return vec![Point3::new(self.center.x(), self.center.y(), 0.0)];
            }
            sample_circular(self.center, radius, 0.0, TAU, distance)
        }
    }

    impl Arc {
        /// 以不超过 `distance` 的矢高偏差采样圆弧。首尾点精确落在端点上。
        pub fn flattening(&self, distance: f64) -> Vec<Point3> {
            let radius = self.radius.abs();
            if radius <= f64::EPSILON {
                return vec![Point3::new(self.center.x(), self.center.y(), 0.0)];
            }
            let (start, end) = canonical_interval(self.start_angle, self.end_angle);
            sample_circular(self.center, radius, start, end, distance)
        }
    }

    impl Ellipse {
        /// 均匀参数采样椭圆（弧）。步长来自二阶导数上界：
        /// 弦与曲线的偏差不超过 `a·Δt²/8`，a 为最长半轴。
        pub fn flattening(&self, distance: f64) -> Vec<Point3> {
            let major_len = self.major_axis.length();
            if major_len <= f64::EPSILON {
                return vec![Point3::new(self.center.x(), self.center.y(), 0.0)];
            }
            let major_vec = self.major_axis.as_vec2();
            let minor_len = major_len * self.ratio.abs();
            let major_dir = major_vec / major_len;
            let minor_vec = DVec2::new(-major_dir.y, major_dir.x) * minor_len;

            let (start, end) = parameter_interval(self.start_parameter, self.end_parameter);
            let span = end - start;
            let semi = major_len.max(minor_len);
            let step = if distance > 0.0 {
                (8.0 * distance / semi).sqrt()
            } else {
                0.0
            };
            let count = segment_count(span, step);

            let center = self.center.as_vec2();
            (0..=count)
                .map(|i| {
                    let t = start + span * (i as f64) / (count as f64);
                    let point = center + major_vec * t.cos() + minor_vec * t.sin();
                    Point3::new(point.x, point.y, 0.0)
                })
                .collect()
        }
    }

    impl Spline {
        /// 扁平化样条：有完整控制数据时做 de Boor 求值并自适应细分，
        /// 否则退化为拟合点折线（拟合点本身位于曲线上）。
        pub fn flattening(&self, distance: f64) -> Vec<Point3> {
            let degree = self.degree.max(1) as usize;
            if self.control_points.len() > degree {
                let curve = BasisCurve::from_spline(self, degree);
                return flatten_basis_curve(&curve, distance);
            }
            if !self.fit_points.is_empty() {
                return self
                    .fit_points
                    .iter()
                    .map(|p| Point3::new(p.x(), p.y(), 0.0))
                    .collect();
            }
            self.control_points
                .iter()
                .map(|p| Point3::new(p.x(), p.y(), 0.0))
                .collect()
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
        /// DXF 头变量 `$INSUNITS` 的原始取值，0 表示未声明。
        #[serde(default)]
        insunits: i16,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        #[inline]
        pub fn set_insunits(&mut self, code: i16) {
            self.insunits = code;
        }

        #[inline]
        pub fn insunits(&self) -> i16 {
            self.insunits
        }

        pub fn add_line(&mut self, start: Point2, end: Point2, layer: impl Into<String>) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities
                .push((id, Entity::Line(Line { start, end, layer })));
            id
        }

        pub fn add_circle(
            &mut self,
            center: Point2,
            radius: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Circle(Circle {
                    center,
                    radius,
                    layer,
                }),
            ));
            id
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Arc(Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                    layer,
                }),
            ));
            id
        }

        pub fn add_ellipse(
            &mut self,
            center: Point2,
            major_axis: Vector2,
            ratio: f64,
            start_parameter: f64,
            end_parameter: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Ellipse(Ellipse {
                    center,
                    major_axis,
                    ratio,
                    start_parameter,
                    end_parameter,
                    layer,
                }),
            ));
            id
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            let collected = vertices
                .into_iter()
                .map(PolylineVertex::new)
                .collect::<Vec<_>>();
            self.add_polyline_with_vertices(collected, is_closed, layer)
        }

        pub fn add_polyline_with_vertices<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = PolylineVertex>,
        {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let collected: Vec<PolylineVertex> = vertices.into_iter().collect();
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Polyline(Polyline {
                    vertices: collected,
                    is_closed,
                    layer,
                }),
            ));
            id
        }

        #[allow(clippy::too_many_arguments)]
        pub fn add_spline(
            &mut self,
            degree: i32,
            is_rational: bool,
            is_closed: bool,
            is_periodic: bool,
            control_points: Vec<Point2>,
            fit_points: Vec<Point2>,
            knot_values: Vec<f64>,
            weights: Vec<f64>,
            start_tangent: Option<Vector2>,
            end_tangent: Option<Vector2>,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Spline(Spline {
                    degree,
                    is_rational,
                    is_closed,
                    is_periodic,
                    control_points,
                    fit_points,
                    knot_values,
                    weights,
                    start_tangent,
                    end_tangent,
                    layer,
                }),
            ));
            id
        }

        pub fn add_unsupported(
            &mut self,
            kind: impl Into<String>,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.entities.push((
                id,
                Entity::Unsupported(Unsupported {
                    kind: kind.into(),
                    layer,
                }),
            ));
            id
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            match entity {
                Entity::Line(line) => self.add_line(line.start, line.end, line.layer),
                Entity::Circle(circle) => {
                    self.add_circle(circle.center, circle.radius, circle.layer)
                }
                Entity::Arc(arc) => self.add_arc(
                    arc.center,
                    arc.radius,
                    arc.start_angle,
                    arc.end_angle,
                    arc.layer,
                ),
                Entity::Ellipse(ellipse) => self.add_ellipse(
                    ellipse.center,
                    ellipse.major_axis,
                    ellipse.ratio,
                    ellipse.start_parameter,
                    ellipse.end_parameter,
                    ellipse.layer,
                ),
                Entity::Polyline(polyline) => self.add_polyline_with_vertices(
                    polyline.vertices,
                    polyline.is_closed,
                    polyline.layer,
                ),
                Entity::Spline(spline) => {
                    let Spline {
                        degree,
                        is_rational,
                        is_closed,
                        is_periodic,
                        control_points,
                        fit_points,
                        knot_values,
                        weights,
                        start_tangent,
                        end_tangent,
                        layer,
                    } = spline;
                    self.add_spline(
                        degree,
                        is_rational,
                        is_closed,
                        is_periodic,
                        control_points,
                        fit_points,
                        knot_values,
                        weights,
                        start_tangent,
                        end_tangent,
                        layer,
                    )
                }
                Entity::Unsupported(other) => self.add_unsupported(other.kind, other.layer),
            }
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities.iter().find_map(|(entity_id, entity)| {
                if entity_id.get() == id.get() {
                    Some(entity)
                } else {
                    None
                }
            })
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    fn normalize_angle(angle: f64) -> f64 {
        let mut result = angle % TAU;
        if result < 0.0 {
            result += TAU;
        }
        result
    }

    /// 把起止角规范成 `start <= end` 的区间；重合视为整圆。
    fn canonical_interval(start: f64, end: f64) -> (f64, f64) {
        let start = normalize_angle(start);
        let mut end = normalize_angle(end);
        if (end - start).abs() < 1e-9 {
            end = start + TAU;
        } else if end < start {
            end += TAU;
        }
        (start, end)
    }

    /// 椭圆参数不做归一化，仅保证区间正向；重合视为整椭圆。
    fn parameter_interval(start: f64, end: f64) -> (f64, f64) {
        let mut end = end;
        if (end - start).abs() < 1e-9 {
            end = start + TAU;
        } else {
            while end < start {
                end += TAU;
            }
        }
        (start, end)
    }

    /// 圆上最大允许的单段圆心角：sagitta = r·(1 − cos(θ/2)) ≤ distance。
    fn chord_step(radius: f64, distance: f64) -> f64 {
        if !(distance > 0.0) || distance >= radius {
            return FRAC_PI_2;
        }
        2.0 * (1.0 - distance / radius).clamp(-1.0, 1.0).acos()
    }

    fn segment_count(sweep: f64, step: f64) -> usize {
        if step <= 0.0 || !step.is_finite() {
            return MAX_FLATTEN_SEGMENTS;
        }
        ((sweep / step).ceil() as usize).clamp(1, MAX_FLATTEN_SEGMENTS)
    }

    fn sample_circular(
        center: Point2,
        radius: f64,
        start: f64,
        end: f64,
        distance: f64,
    ) -> Vec<Point3> {
        let sweep = end - start;
        let count = segment_count(sweep, chord_step(radius, distance));
        let center = center.as_vec2();
        (0..=count)
            .map(|i| {
                let angle = start + sweep * (i as f64) / (count as f64);
                let point = center + DVec2::new(radius * angle.cos(), radius * angle.sin());
                Point3::new(point.x, point.y, 0.0)
            })
            .collect()
    }

    /// B 样条（可带权重）的求值上下文。节点缺失或数目不符时
    /// 退化为均匀 clamped 节点向量。
    struct BasisCurve<'a> {
        control: &'a [Point2],
        weights: Option<&'a [f64]>,
        knots: Vec<f64>,
        degree: usize,
    }

    impl<'a> BasisCurve<'a> {
        fn from_spline(spline: &'a Spline, degree: usize) -> Self {
            let control = spline.control_points.as_slice();
            let expected = control.len() + degree + 1;
            let knots = if spline.knot_values.len() == expected
                && spline.knot_values.windows(2).all(|pair| pair[0] <= pair[1])
            {
                spline.knot_values.clone()
            } else {
                clamped_knot_vector(control.len(), degree)
            };
            let weights = (spline.is_rational && spline.weights.len() == control.len())
                .then_some(spline.weights.as_slice());
            Self {
                control,
                weights,
                knots,
                degree,
            }
        }

        fn domain(&self) -> (f64, f64) {
            (self.knots[self.degree], self.knots[self.control.len()])
        }

        fn find_span(&self, t: f64) -> usize {
            let mut span = self.degree;
            while span + 1 < self.control.len() && t >= self.knots[span + 1] {
                span += 1;
            }
            span
        }

        /// de Boor 求值，齐次坐标下统一处理有理与非有理样条。
        fn evaluate(&self, t: f64) -> DVec2 {
            let p = self.degree;
            let span = self.find_span(t);
            let mut d: Vec<DVec3> = (0..=p)
                .map(|j| {
                    let idx = span - p + j;
                    let w = self.weights.map_or(1.0, |weights| weights[idx]);
                    let c = self.control[idx].as_vec2();
                    DVec3::new(c.x * w, c.y * w, w)
                })
                .collect();
            for r in 1..=p {
                for j in (r..=p).rev() {
                    let i = span - p + j;
                    let denom = self.knots[i + p - r + 1] - self.knots[i];
                    let alpha = if denom.abs() <= f64::EPSILON {
                        0.0
                    } else {
                        (t - self.knots[i]) / denom
                    };
                    d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
                }
            }
            let h = d[p];
            if h.z.abs() <= f64::EPSILON {
                DVec2::new(h.x, h.y)
            } else {
                DVec2::new(h.x / h.z, h.y / h.z)
            }
        }
    }

    fn clamped_knot_vector(count: usize, degree: usize) -> Vec<f64> {
        let spans = count - degree;
        let mut knots = Vec::with_capacity(count + degree + 1);
        for _ in 0..=degree {
            knots.push(0.0);
        }
        for i in 1..spans {
            knots.push(i as f64 / spans as f64);
        }
        for _ in 0..=degree {
            knots.push(1.0);
        }
        knots
    }

    /// 点到弦（线段）的垂直距离。
    fn chord_deviation(point: DVec2, start: DVec2, end: DVec2) -> f64 {
        let chord = end - start;
        let len_sq = chord.length_squared();
        if len_sq <= f64::EPSILON {
            return (point - start).length();
        }
        let t = ((point - start).dot(chord) / len_sq).clamp(0.0, 1.0);
        (point - (start + chord * t)).length()
    }

    fn flatten_basis_curve(curve: &BasisCurve<'_>, distance: f64) -> Vec<Point3> {
        let (t0, t1) = curve.domain();
        if !(t1 > t0) {
            let point = curve.evaluate(t0);
            return vec![Point3::new(point.x, point.y, 0.0)];
        }

        // 以节点跨度为细分种子，避免二分法漏掉跨度内部的振荡。
        let mut seeds: Vec<f64> = vec![t0];
        for &knot in &curve.knots {
            let last = seeds.last().copied().unwrap_or(t0);
            if knot > t0 + 1e-12 && knot < t1 - 1e-12 && knot - last > 1e-12 {
                seeds.push(knot);
            }
        }
        seeds.push(t1);

        let mut prev_t = seeds[0];
        let mut prev_p = curve.evaluate(prev_t);
        let mut out: Vec<DVec2> = vec![prev_p];
        for &t in &seeds[1..] {
            let point = curve.evaluate(t);
            subdivide(
                curve,
                prev_t,
                prev_p,
                t,
                point,
                distance.max(f64::EPSILON),
                MAX_SUBDIVISION_DEPTH,
                &mut out,
            );
            prev_t = t;
            prev_p = point;
        }
        out.into_iter()
            .map(|p| Point3::new(p.x, p.y, 0.0))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn subdivide(
        curve: &BasisCurve<'_>,
        t0: f64,
        p0: DVec2,
        t1: f64,
        p1: DVec2,
        distance: f64,
        depth: u32,
        out: &mut Vec<DVec2>,
    ) {
        let tm = 0.5 * (t0 + t1);
        let pm = curve.evaluate(tm);
        // 中点加两个四分位点一起检查，防止奇对称曲线恰好穿过弦中点时误判平坦。
        let pq = curve.evaluate(0.5 * (t0 + tm));
        let pr = curve.evaluate(0.5 * (tm + t1));
        let flat = [pq, pm, pr]
            .iter()
            .all(|p| chord_deviation(*p, p0, p1) <= distance);
        if depth == 0 || flat {
            out.push(p1);
        } else {
            subdivide(curve, t0, p0, tm, pm, distance, depth - 1, out);
            subdivide(curve, tm, pm, t1, p1, distance, depth - 1, out);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::geometry::Bounds2D;
        use std::f64::consts::{FRAC_PI_2, PI, TAU};

        #[test]
        fn document_stores_entities() {
            let mut doc = Document::new();
            let line_id = doc.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), "0");
            let circle_id = doc.add_circle(Point2::new(5.0, 5.0), 2.0, "ANNOT");
            let arc_id = doc.add_arc(Point2::new(5.0, 0.0), 3.5, 0.0, FRAC_PI_2, "GEOM");
            let skipped_id = doc.add_unsupported("TEXT", "ANNOT");

            assert_eq!(line_id.get(), 0);
            assert_eq!(circle_id.get(), 1);
            assert_eq!(arc_id.get(), 2);
            assert_eq!(skipped_id.get(), 3);
            assert_eq!(doc.entities().count(), 4);

            let layers: Vec<_> = doc.layers().map(|l| l.name.clone()).collect();
            assert!(layers.contains(&"0".to_string()));
            assert!(layers.contains(&"ANNOT".to_string()));
            assert!(layers.contains(&"GEOM".to_string()));

            match doc.entity(arc_id) {
                Some(Entity::Arc(arc)) => {
                    assert_eq!(arc.layer, "GEOM");
                    assert!((arc.radius - 3.5).abs() < f64::EPSILON);
                }
                other => panic!("unexpected entity lookup result: {other:?}"),
            }

            match doc.entity(skipped_id) {
                Some(entity @ Entity::Unsupported(other)) => {
                    assert_eq!(other.kind, "TEXT");
                    assert_eq!(entity.kind_name(), "TEXT");
                    assert_eq!(entity.layer_name(), "ANNOT");
                }
                _ => panic!("expected unsupported entity"),
            }

            assert!(doc.entity(EntityId::new(99)).is_none());
        }

        #[test]
        fn insunits_defaults_to_zero() {
            let mut doc = Document::new();
            assert_eq!(doc.insunits(), 0);
            doc.set_insunits(5);
            assert_eq!(doc.insunits(), 5);
        }

        #[test]
        fn arc_flattening_stays_on_circle_within_tolerance() {
            let arc = Arc {
                center: Point2::new(1.0, -2.0),
                radius: 10.0,
                start_angle: 0.0,
                end_angle: PI,
                layer: "0".to_string(),
            };
            let tolerance = 0.01;
            let points = arc.flattening(tolerance);
            assert!(points.len() >= 3);

            // 所有采样点都精确落在圆上
            for point in &points {
                let r = ((point.x() - 1.0).powi(2) + (point.y() + 2.0).powi(2)).sqrt();
                assert!((r - 10.0).abs() < 1e-9);
                assert_eq!(point.z(), 0.0);
            }

            // 相邻弦中点的矢高不超过容差
            for pair in points.windows(2) {
                let mid_x = (pair[0].x() + pair[1].x()) / 2.0;
                let mid_y = (pair[0].y() + pair[1].y()) / 2.0;
                let r = ((mid_x - 1.0).powi(2) + (mid_y + 2.0).powi(2)).sqrt();
                assert!(10.0 - r <= tolerance + 1e-12);
            }

            let first = points.first().unwrap();
            let last = points.last().unwrap();
            assert!((first.x() - 11.0).abs() < 1e-9);
            assert!((first.y() + 2.0).abs() < 1e-9);
            assert!((last.x() + 9.0).abs() < 1e-9);
            assert!((last.y() + 2.0).abs() < 1e-9);
        }

        #[test]
        fn arc_flattening_bounds_track_analytic_box() {
            let arc = Arc {
                center: Point2::new(0.0, 0.0),
                radius: 5.0,
                start_angle: 0.0,
                end_angle: PI,
                layer: "0".to_string(),
            };
            let tolerance = 0.001;
            let mut bounds = Bounds2D::empty();
            for point in arc.flattening(tolerance) {
                bounds.include_point(Point2::new(point.x(), point.y()));
            }
            // 解析包围盒为 (-5, 0)-(5, 5)，折线盒只会小不会大
            assert!((bounds.min().x() + 5.0).abs() < 1e-9);
            assert!((bounds.max().x() - 5.0).abs() < 1e-9);
            assert!(bounds.min().y().abs() < 1e-9);
            assert!(bounds.max().y() <= 5.0 + 1e-12);
            assert!(bounds.max().y() >= 5.0 - tolerance);
        }

        #[test]
        fn circle_flattening_closes_loop() {
            let circle = Circle {
                center: Point2::new(0.0, 0.0),
                radius: 3.0,
                layer: "0".to_string(),
            };
            let points = circle.flattening(0.01);
            let first = points.first().unwrap();
            let last = points.last().unwrap();
            assert!((first.x() - last.x()).abs() < 1e-9);
            assert!((first.y() - last.y()).abs() < 1e-9);
        }

        #[test]
        fn ellipse_flattening_covers_extents_within_tolerance() {
            let ellipse = Ellipse {
                center: Point2::new(0.0, 0.0),
                major_axis: Vector2::new(4.0, 0.0),
                ratio: 0.5,
                start_parameter: 0.0,
                end_parameter: TAU,
                layer: "0".to_string(),
            };
            let tolerance = 0.001;
            let mut bounds = Bounds2D::empty();
            for point in ellipse.flattening(tolerance) {
                bounds.include_point(Point2::new(point.x(), point.y()));
            }
            assert!((bounds.max().x() - 4.0).abs() <= tolerance);
            assert!((bounds.min().x() + 4.0).abs() <= tolerance);
            assert!((bounds.max().y() - 2.0).abs() <= tolerance);
            assert!((bounds.min().y() + 2.0).abs() <= tolerance);
        }

        #[test]
        fn spline_flattening_hits_clamped_endpoints() {
            let spline = Spline {
                degree: 3,
                is_rational: false,
                is_closed: false,
                is_periodic: false,
                control_points: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 3.0),
                    Point2::new(3.0, 3.0),
                    Point2::new(4.0, 0.0),
                ],
                fit_points: Vec::new(),
                knot_values: vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
                weights: Vec::new(),
                start_tangent: None,
                end_tangent: None,
                layer: "0".to_string(),
            };
            let points = spline.flattening(0.01);
            assert!(points.len() >= 2);
            let first = points.first().unwrap();
            let last = points.last().unwrap();
            // clamped 节点向量下曲线端点与首尾控制点重合
            assert!(first.x().abs() < 1e-9 && first.y().abs() < 1e-9);
            assert!((last.x() - 4.0).abs() < 1e-9 && last.y().abs() < 1e-9);

            // 凸包性质：采样点不会越出控制多边形
            for point in &points {
                assert!(point.y() >= -1e-9 && point.y() <= 3.0 + 1e-9);
                assert!(point.x() >= -1e-9 && point.x() <= 4.0 + 1e-9);
            }
        }

        #[test]
        fn spline_without_control_data_falls_back_to_fit_points() {
            let spline = Spline {
                degree: 3,
                is_rational: false,
                is_closed: false,
                is_periodic: false,
                control_points: Vec::new(),
                fit_points: vec![Point2::new(0.0, 0.0), Point2::new(2.0, 1.0)],
                knot_values: Vec::new(),
                weights: Vec::new(),
                start_tangent: None,
                end_tangent: None,
                layer: "0".to_string(),
            };
            let points = spline.flattening(0.001);
            assert_eq!(points.len(), 2);
            assert!((points[1].x() - 2.0).abs() < 1e-12);
        }

        #[test]
        fn degenerate_curves_flatten_to_single_point() {
            let circle = Circle {
                center: Point2::new(7.0, 8.0),
                radius: 0.0,
                layer: "0".to_string(),
            };
            let points = circle.flattening(0.001);
            assert_eq!(points.len(), 1);
            assert!((points[0].x() - 7.0).abs() < 1e-12);
        }
    }
}
