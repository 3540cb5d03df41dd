use paperscale_core::{Strategy, SubPixParams};
use serde::{Deserialize, Serialize};

/// Shading correction before object edge detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IlluminationParams {
    /// Gaussian kernel size of the background estimate.
    pub background_kernel: u32,
    pub clahe_clip: f32,
    /// CLAHE grid is `clahe_tiles x clahe_tiles`.
    pub clahe_tiles: u32,
}

impl Default for IlluminationParams {
    fn default() -> Self {
        Self {
            background_kernel: 61,
            clahe_clip: 2.5,
            clahe_tiles: 8,
        }
    }
}

/// Shape classification and dimensioning thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeParams {
    pub circle_circularity: f64,
    /// Maximum long/short ratio of the bounding rectangle for a circle.
    pub circle_max_aspect: f64,
    pub circle_min_vertices: usize,
    pub ellipse_circularity: f64,
    pub ellipse_min_vertices: usize,
    /// Display outline tolerance, fraction of the hull perimeter.
    pub outline_eps_frac: f64,
    /// Hull simplification tolerance used for the vertex-count test.
    pub vertex_eps_frac: f64,
    pub max_outline_vertices: usize,
    /// Outward growth applied to polygon outlines to undo edge shrinkage.
    pub polygon_expand_px: u8,
    /// Outward growth for circles and ellipses.
    pub round_expand_px: u8,
    pub edge_refine: SubPixParams,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            circle_circularity: 0.87,
            circle_max_aspect: 1.15,
            circle_min_vertices: 7,
            ellipse_circularity: 0.84,
            ellipse_min_vertices: 6,
            outline_eps_frac: 0.01,
            vertex_eps_frac: 0.02,
            max_outline_vertices: 12,
            polygon_expand_px: 3,
            round_expand_px: 4,
            edge_refine: SubPixParams::edge(),
        }
    }
}

/// Which grayscale rendition of the canvas a strategy runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Shading-corrected and contrast-equalized.
    Normalized,
    Raw,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelStrategy {
    pub channel: Channel,
    pub strategy: Strategy,
}

impl ChannelStrategy {
    pub fn new(channel: Channel, strategy: Strategy) -> Self {
        Self { channel, strategy }
    }
}

/// Object cascade: three recipes on the normalized channel, two on the raw
/// one, plus an adaptive threshold on the normalized channel.
pub fn default_object_strategies() -> Vec<ChannelStrategy> {
    use Channel::{Normalized, Raw};
    vec![
        ChannelStrategy::new(Normalized, Strategy::canny(5, 50.0, 150.0)),
        ChannelStrategy::new(Normalized, Strategy::canny(9, 40.0, 120.0)),
        ChannelStrategy::new(Raw, Strategy::canny(5, 50.0, 150.0)),
        ChannelStrategy::new(Raw, Strategy::canny(11, 30.0, 100.0)),
        ChannelStrategy::new(Raw, Strategy::bilateral_canny(40.0, 120.0)),
        ChannelStrategy::new(
            Normalized,
            Strategy::AdaptiveThreshold {
                blur_kernel: 7,
                block_size: 15,
                c: 4.0,
            },
        ),
    ]
}

/// Parameters of the object stage on a rectified canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectParams {
    /// Noise floor on contour area, canvas px^2.
    pub min_area_px: f64,
    /// Contours above this fraction of the canvas are sheet borders or
    /// merged blobs.
    pub max_area_frac: f64,
    /// Minimum bounding-box side in pixels.
    pub min_bbox_px: i32,
    /// Maximum hull-area / contour-area ratio.
    pub max_convexity: f64,
    /// Candidates whose centroids are closer than this are one object.
    pub nms_distance_px: f64,
    pub max_objects: usize,
    /// 3x3 closing passes; kept light so neighbouring objects stay apart.
    pub close_iterations: u8,
    pub illumination: IlluminationParams,
    pub shape: ShapeParams,
    pub strategies: Vec<ChannelStrategy>,
}

impl Default for ObjectParams {
    fn default() -> Self {
        Self {
            min_area_px: 500.0,
            max_area_frac: 0.75,
            min_bbox_px: 20,
            max_convexity: 1.8,
            nms_distance_px: 40.0,
            max_objects: 10,
            close_iterations: 1,
            illumination: IlluminationParams::default(),
            shape: ShapeParams::default(),
            strategies: default_object_strategies(),
        }
    }
}
