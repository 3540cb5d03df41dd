use serde::{Deserialize, Serialize};

/// Shape class assigned from circularity, aspect and hull vertex count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Ellipse,
    Polygon,
}

impl ShapeKind {
    pub fn is_round(self) -> bool {
        matches!(self, ShapeKind::Circle | ShapeKind::Ellipse)
    }
}

/// Drawing hint for round shapes, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipseRender {
    pub cx: f64,
    pub cy: f64,
    /// Semi-major axis.
    pub rx: f64,
    /// Semi-minor axis.
    pub ry: f64,
    pub angle_deg: f64,
}

/// Extra dimensions reported for round shapes, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ShapeMetrics {
    Circle {
        radius_mm: f64,
        diameter_mm: f64,
        circumference_mm: f64,
    },
    Ellipse {
        major_axis_mm: f64,
        minor_axis_mm: f64,
        eccentricity: f64,
        perimeter_mm: f64,
    },
}

/// One measured object on the rectified canvas.
///
/// Lengths are rounded to 0.01 mm, the angle to 0.1 degree, circularity to
/// three decimals and the centroid to 0.1 px.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasuredObject {
    /// 0-based, in order of detection.
    pub id: usize,
    /// Display outline in canvas pixels.
    pub polygon_points: Vec<[f64; 2]>,
    pub centroid: [f64; 2],
    /// Extent along the axis closest to horizontal.
    pub width_mm: f64,
    pub height_mm: f64,
    pub area_mm2: f64,
    /// Direction of the width axis, `[0, 180)`.
    pub angle_deg: f64,
    pub shape_type: ShapeKind,
    pub circularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ellipse_render: Option<EllipseRender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ShapeMetrics>,
}

/// Result of measuring every object on one canvas.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub objects: Vec<MeasuredObject>,
    pub count: usize,
}

impl ObjectReport {
    pub fn new(objects: Vec<MeasuredObject>) -> Self {
        Self {
            count: objects.len(),
            objects,
        }
    }
}
