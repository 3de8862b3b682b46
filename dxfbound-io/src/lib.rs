use std::fs;
use std::path::Path;

use thiserror::Error;

use dxfbound_core::{
    document::{
        Arc, Circle, Document, Ellipse, Entity, Line, Polyline, PolylineVertex, Spline,
        Unsupported,
    },
    geometry::{Point2, Vector2},
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("读取图纸文件 {path:?} 失败: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("图纸结构无效: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

/// DXF ASCII 文档的读取门面。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let parser = DxfParser::new(&data);
        parser
            .parse()
            .map_err(|err| IoError::InvalidDocument(err.message))
    }
}

#[derive(Debug)]
struct DxfError {
    message: String,
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.as_str() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.as_str() {
                        "HEADER" => self.parse_header(&mut document)?,
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    /// 只关心 `$INSUNITS`，其余头变量原样跳过。
    fn parse_header(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut pending_insunits = false;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some((9, name)) => {
                    pending_insunits = name.trim() == "$INSUNITS";
                }
                Some((70, value)) if pending_insunits => {
                    document.set_insunits(parse_i16(&value, "$INSUNITS 取值（组码 70）")?);
                    pending_insunits = false;
                }
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("HEADER 段未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.as_str() {
                "ENDSEC" => break,
                "SEQEND" => {
                    self.skip_entity_body()?;
                }
                "POLYLINE" => {
                    let polyline = self.parse_polyline_sequence()?;
                    document.add_entity(polyline);
                }
                entity => {
                    let parsed = self.parse_entity(entity)?;
                    document.add_entity(parsed);
                }
            }
        }
        Ok(())
    }

    fn parse_entity(&mut self, kind: &str) -> Result<Entity, DxfError> {
        match kind {
            "LINE" => self.parse_line(),
            "CIRCLE" => self.parse_circle(),
            "ARC" => self.parse_arc(),
            "ELLIPSE" => self.parse_ellipse(),
            "LWPOLYLINE" => self.parse_lwpolyline(),
            "SPLINE" => self.parse_spline(),
            // 其余类型保留类型名与图层，由上层决定如何跳过
            other => self.parse_unsupported(other),
        }
    }

    fn parse_unsupported(&mut self, kind: &str) -> Result<Entity, DxfError> {
        let mut layer = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((8, value)) => layer = Some(value.trim().to_string()),
                Some(_) => continue,
                None => break,
            }
        }
        Ok(Entity::Unsupported(Unsupported {
            kind: kind.to_string(),
            layer: layer.unwrap_or_else(|| "0".to_string()),
        }))
    }

    fn parse_line(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut start_x = None;
        let mut start_y = None;
        let mut end_x = None;
        let mut end_y = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut start_x, &value, "LINE 起点 X（组码 10）")?,
                    20 => assign_coord(&mut start_y, &value, "LINE 起点 Y（组码 20）")?,
                    11 => assign_coord(&mut end_x, &value, "LINE 终点 X（组码 11）")?,
                    21 => assign_coord(&mut end_y, &value, "LINE 终点 Y（组码 21）")?,
                    30 | 31 => {} // 忽略 Z 坐标
                    _ => {}
                },
                None => return Err(DxfError::invalid("LINE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let sx = start_x.ok_or_else(|| DxfError::invalid("LINE 缺少起点 X（组码 10）"))?;
        let sy = start_y.ok_or_else(|| DxfError::invalid("LINE 缺少起点 Y（组码 20）"))?;
        let ex = end_x.ok_or_else(|| DxfError::invalid("LINE 缺少终点 X（组码 11）"))?;
        let ey = end_y.ok_or_else(|| DxfError::invalid("LINE 缺少终点 Y（组码 21）"))?;

        Ok(Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
            layer,
        }))
    }

    fn parse_circle(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut center_x, &value, "CIRCLE 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "CIRCLE 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "CIRCLE 半径（组码 40）")?,
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("CIRCLE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let cx = center_x.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("CIRCLE 缺少半径（组码 40）"))?;

        Ok(Entity::Circle(Circle {
            center: Point2::new(cx, cy),
            radius,
            layer,
        }))
    }

    fn parse_arc(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        let mut start_deg = None;
        let mut end_deg = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut center_x, &value, "ARC 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "ARC 圆心 Y（组码 20）")?,
                    40 => assign_coord(&mut radius, &value, "ARC 半径（组码 40）")?,
                    50 => assign_coord(&mut start_deg, &value, "ARC 起始角（组码 50）")?,
                    51 => assign_coord(&mut end_deg, &value, "ARC 终止角（组码 51）")?,
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("ARC 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let cx = center_x.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("ARC 缺少半径（组码 40）"))?;
        let start_angle =
            start_deg.ok_or_else(|| DxfError::invalid("ARC 缺少起始角（组码 50）"))?;
        let end_angle = end_deg.ok_or_else(|| DxfError::invalid("ARC 缺少终止角（组码 51）"))?;

        Ok(Entity::Arc(Arc {
            center: Point2::new(cx, cy),
            radius,
            start_angle: start_angle.to_radians(),
            end_angle: end_angle.to_radians(),
            layer,
        }))
    }

    fn parse_ellipse(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut major_x = None;
        let mut major_y = None;
        let mut ratio = None;
        let mut start_parameter = None;
        let mut end_parameter = None;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => assign_coord(&mut center_x, &value, "ELLIPSE 圆心 X（组码 10）")?,
                    20 => assign_coord(&mut center_y, &value, "ELLIPSE 圆心 Y（组码 20）")?,
                    11 => assign_coord(&mut major_x, &value, "ELLIPSE 主轴向量 X（组码 11）")?,
                    21 => assign_coord(&mut major_y, &value, "ELLIPSE 主轴向量 Y（组码 21）")?,
                    40 => assign_coord(&mut ratio, &value, "ELLIPSE 半径比（组码 40）")?,
                    41 => {
                        start_parameter = Some(parse_f64(&value, "ELLIPSE 起始参数（组码 41）")?);
                    }
                    42 => {
                        end_parameter = Some(parse_f64(&value, "ELLIPSE 终止参数（组码 42）")?);
                    }
                    30 | 31 | 210 | 220 | 230 => {
                        // 忽略 Z 分量与法向量
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("ELLIPSE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let cx = center_x.ok_or_else(|| DxfError::invalid("ELLIPSE 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("ELLIPSE 缺少圆心 Y（组码 20）"))?;
        let major_x =
            major_x.ok_or_else(|| DxfError::invalid("ELLIPSE 缺少主轴向量 X（组码 11）"))?;
        let major_y =
            major_y.ok_or_else(|| DxfError::invalid("ELLIPSE 缺少主轴向量 Y（组码 21）"))?;

        if major_x.abs() < f64::EPSILON && major_y.abs() < f64::EPSILON {
            return Err(DxfError::invalid("ELLIPSE 主轴向量长度为 0，无法创建实体"));
        }

        let ratio = ratio.unwrap_or(1.0);
        if ratio <= 0.0 {
            return Err(DxfError::invalid(format!(
                "ELLIPSE 半径比必须为正数，实际为 {ratio}"
            )));
        }

        Ok(Entity::Ellipse(Ellipse {
            center: Point2::new(cx, cy),
            major_axis: Vector2::new(major_x, major_y),
            ratio,
            start_parameter: start_parameter.unwrap_or(0.0),
            end_parameter: end_parameter.unwrap_or(std::f64::consts::TAU),
            layer,
        }))
    }

    fn parse_lwpolyline(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut is_closed = false;
        let mut vertices: Vec<PolylineVertex> = Vec::new();
        let mut pending_x: Option<f64> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    70 => {
                        let flag = parse_i32(&value, "LWPOLYLINE 标志（组码 70）")?;
                        is_closed = flag & 0x01 == 0x01;
                    }
                    90 => {} // 顶点计数，靠实际坐标对数推导
                    10 => {
                        if pending_x
                            .replace(parse_f64(&value, "LWPOLYLINE 顶点 X（组码 10）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid(
                                "LWPOLYLINE 顶点缺少对应的 Y（组码 20）",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "LWPOLYLINE 顶点 Y（组码 20）")?;
                        let x = pending_x.take().ok_or_else(|| {
                            DxfError::invalid("LWPOLYLINE 顶点缺少对应的 X（组码 10）")
                        })?;
                        vertices.push(PolylineVertex::new(Point2::new(x, y)));
                    }
                    42 => {
                        let bulge = parse_f64(&value, "LWPOLYLINE 顶点 bulge（组码 42）")?;
                        match vertices.last_mut() {
                            Some(vertex) => vertex.bulge = bulge,
                            None => {
                                return Err(DxfError::invalid(
                                    "LWPOLYLINE 在定义首个顶点前遇到 bulge（组码 42）",
                                ));
                            }
                        }
                    }
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("LWPOLYLINE 未正确结束")),
            }
        }

        if pending_x.is_some() {
            return Err(DxfError::invalid(
                "LWPOLYLINE 顶点坐标需成对出现（组码 10/20），检测到不完整的顶点",
            ));
        }
        if vertices.is_empty() {
            return Err(DxfError::invalid("LWPOLYLINE 未解析到任何顶点"));
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed,
            layer,
        }))
    }

    /// 旧式 POLYLINE：主实体只带属性，顶点由后续 VERTEX 记录携带，
    /// SEQEND 收尾。z 坐标与网格标志直接丢弃。
    fn parse_polyline_sequence(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut is_closed = false;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    70 => {
                        let flag = parse_i16(&value, "POLYLINE 标志（组码 70）")?;
                        is_closed = flag & 0x01 == 0x01;
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("POLYLINE 未正确结束")),
            }
        }

        let mut vertices: Vec<PolylineVertex> = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => match value.as_str() {
                    "VERTEX" => {
                        if let Some(vertex) = self.parse_vertex_record()? {
                            vertices.push(vertex);
                        }
                    }
                    "SEQEND" => {
                        self.skip_entity_body()?;
                        break;
                    }
                    _ => {
                        self.reader.put_back((0, value));
                        break;
                    }
                },
                Some(_) => {
                    return Err(DxfError::invalid(
                        "POLYLINE 序列遇到无效记录，期望 VERTEX/SEQEND",
                    ));
                }
                None => {
                    return Err(DxfError::invalid("POLYLINE 序列缺少 SEQEND 终止标记"));
                }
            }
        }

        if vertices.is_empty() {
            return Err(DxfError::invalid("POLYLINE 未解析到任何顶点"));
        }

        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed,
            layer: layer.unwrap_or_else(|| "0".to_string()),
        }))
    }

    fn parse_vertex_record(&mut self) -> Result<Option<PolylineVertex>, DxfError> {
        let mut x = None;
        let mut y = None;
        let mut bulge = 0.0;
        let mut flags: i16 = 0;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    10 => assign_coord(&mut x, &value, "VERTEX 坐标 X（组码 10）")?,
                    20 => assign_coord(&mut y, &value, "VERTEX 坐标 Y（组码 20）")?,
                    42 => bulge = parse_f64(&value, "VERTEX bulge（组码 42）")?,
                    70 => flags = parse_i16(&value, "VERTEX 标志（组码 70）")?,
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("VERTEX 未正确结束")),
            }
        }

        // 面/网格拓扑记录（无坐标意义）不进入折线
        if flags & 0x80 != 0 && flags & 0x40 == 0 {
            return Ok(None);
        }

        let x = x.ok_or_else(|| DxfError::invalid("VERTEX 缺少坐标 X（组码 10）"))?;
        let y = y.ok_or_else(|| DxfError::invalid("VERTEX 缺少坐标 Y（组码 20）"))?;
        Ok(Some(PolylineVertex::with_bulge(Point2::new(x, y), bulge)))
    }

    fn parse_spline(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut flags: i16 = 0;
        let mut degree: Option<i16> = None;
        let mut knot_values: Vec<f64> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        let mut control_points: Vec<Point2> = Vec::new();
        let mut fit_points: Vec<Point2> = Vec::new();
        let mut pending_control_x: Option<f64> = None;
        let mut pending_fit_x: Option<f64> = None;
        let mut pending_start_tangent_x: Option<f64> = None;
        let mut pending_end_tangent_x: Option<f64> = None;
        let mut start_tangent: Option<Vector2> = None;
        let mut end_tangent: Option<Vector2> = None;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    70 => flags = parse_i16(&value, "SPLINE 类型标志（组码 70）")?,
                    71 => degree = Some(parse_i16(&value, "SPLINE 阶数（组码 71）")?),
                    72 | 73 | 74 => {
                        // 节点/控制点/拟合点计数，以实际读到的数量为准
                        let _ = parse_i32(&value, "SPLINE 计数信息")?;
                    }
                    40 => knot_values.push(parse_f64(&value, "SPLINE 节点值（组码 40）")?),
                    41 => weights.push(parse_f64(&value, "SPLINE 权重（组码 41）")?),
                    10 => {
                        if pending_control_x
                            .replace(parse_f64(&value, "SPLINE 控制点 X（组码 10）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid(
                                "SPLINE 控制点 X（组码 10）在未提供 Y 之前重复出现",
                            ));
                        }
                    }
                    20 => {
                        let y = parse_f64(&value, "SPLINE 控制点 Y（组码 20）")?;
                        let x = pending_control_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 控制点 Y（组码 20）缺少对应的 X")
                        })?;
                        control_points.push(Point2::new(x, y));
                    }
                    11 => {
                        if pending_fit_x
                            .replace(parse_f64(&value, "SPLINE 拟合点 X（组码 11）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid(
                                "SPLINE 拟合点 X（组码 11）在未提供 Y 之前重复出现",
                            ));
                        }
                    }
                    21 => {
                        let y = parse_f64(&value, "SPLINE 拟合点 Y（组码 21）")?;
                        let x = pending_fit_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 拟合点 Y（组码 21）缺少对应的 X")
                        })?;
                        fit_points.push(Point2::new(x, y));
                    }
                    12 => {
                        if pending_start_tangent_x
                            .replace(parse_f64(&value, "SPLINE 起始切向量 X（组码 12）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid("SPLINE 起始切向量 X（组码 12）重复出现"));
                        }
                    }
                    22 => {
                        let y = parse_f64(&value, "SPLINE 起始切向量 Y（组码 22）")?;
                        let x = pending_start_tangent_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 起始切向量 Y（组码 22）缺少对应的 X")
                        })?;
                        start_tangent = Some(Vector2::new(x, y));
                    }
                    13 => {
                        if pending_end_tangent_x
                            .replace(parse_f64(&value, "SPLINE 终止切向量 X（组码 13）")?)
                            .is_some()
                        {
                            return Err(DxfError::invalid("SPLINE 终止切向量 X（组码 13）重复出现"));
                        }
                    }
                    23 => {
                        let y = parse_f64(&value, "SPLINE 终止切向量 Y（组码 23）")?;
                        let x = pending_end_tangent_x.take().ok_or_else(|| {
                            DxfError::invalid("SPLINE 终止切向量 Y（组码 23）缺少对应的 X")
                        })?;
                        end_tangent = Some(Vector2::new(x, y));
                    }
                    30 | 31 | 32 | 33 => {
                        // 忽略 Z 坐标与三维向量分量
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("SPLINE 未正确结束")),
            }
        }

        if let Some(x) = pending_control_x.take() {
            return Err(DxfError::invalid(format!(
                "SPLINE 控制点 X={x} 缺少对应的 Y（组码 20）"
            )));
        }
        if let Some(x) = pending_fit_x.take() {
            return Err(DxfError::invalid(format!(
                "SPLINE 拟合点 X={x} 缺少对应的 Y（组码 21）"
            )));
        }

        let layer = layer.unwrap_or_else(|| "0".to_string());
        let degree = degree.ok_or_else(|| DxfError::invalid("SPLINE 缺少阶数（组码 71）"))? as i32;

        Ok(Entity::Spline(Spline {
            degree,
            is_rational: flags & 0x04 != 0,
            is_closed: flags & 0x01 != 0,
            is_periodic: flags & 0x02 != 0,
            control_points,
            fit_points,
            knot_values,
            weights,
            start_tangent,
            end_tangent,
            layer,
        }))
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => return Ok(None),
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        if self.buffer.is_some() {
            panic!("内部错误：尝试多次回退 DXF pair");
        }
        self.buffer = Some(pair);
    }
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i32(raw: &str, context: &str) -> Result<i32, DxfError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let value = parse_i32(raw, context)?;
    i16::try_from(value)
        .map_err(|_| DxfError::invalid(format!("{context} 超出 i16 范围（值：{value}）")))
}
