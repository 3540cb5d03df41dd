use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::geometry::{arc_length, convex_hull, polygon_area, BoundingBox, Moments};

/// Closed outline in pixel coordinates (first vertex not repeated).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<Point2<f64>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    pub fn hull(&self) -> Contour {
        Contour::new(convex_hull(&self.points))
    }

    pub fn hull_area(&self) -> f64 {
        polygon_area(&convex_hull(&self.points))
    }

    /// Hull area over outline area; 1.0 for convex shapes, large for merged
    /// or strongly concave blobs.
    pub fn convexity_ratio(&self) -> f64 {
        self.hull_area() / self.area().max(1.0)
    }

    pub fn centroid(&self) -> Option<Point2<f64>> {
        Moments::of_polygon(&self.points).centroid()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(&self.points)
    }

    pub fn translated(&self, offset: Vector2<f64>) -> Contour {
        Contour::new(self.points.iter().map(|p| p + offset).collect())
    }
}

/// Outer borders of the top-level foreground components of `mask`.
///
/// Any non-zero pixel counts as foreground. Holes and components nested
/// inside holes are ignored.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| Point2::new(p.x as f64, p.y as f64))
                    .collect(),
            )
        })
        .filter(|c| !c.is_empty())
        .collect()
}

/// Rasterize the filled outline into a `width x height` mask, after shifting
/// it by `offset`.
pub fn fill_contour(contour: &Contour, width: u32, height: u32, offset: Vector2<f64>) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let mut poly: Vec<Point<i32>> = contour
        .points
        .iter()
        .map(|p| {
            let q = p + offset;
            Point::new(q.x.round() as i32, q.y.round() as i32)
        })
        .collect();
    poly.dedup();
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    match poly.len() {
        0 => {}
        1 | 2 => {
            for p in &poly {
                if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                    mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
                }
            }
        }
        _ => imageproc::drawing::draw_polygon_mut(&mut mask, &poly, Luma([255])),
    }
    mask
}
