//! Closed-form measurements on user-picked canvas points.

use nalgebra::Point2;
use paperscale_core::{polygon_area, round_to};

use crate::error::InputError;

pub(crate) fn check_scale(scale: f64) -> Result<(), InputError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(InputError::InvalidScale { scale })
    }
}

fn to_points(points: &[[f64; 2]]) -> Result<Vec<Point2<f64>>, InputError> {
    points
        .iter()
        .enumerate()
        .map(|(index, &[x, y])| {
            if x.is_finite() && y.is_finite() {
                Ok(Point2::new(x, y))
            } else {
                Err(InputError::NonFinitePoint { index })
            }
        })
        .collect()
}

/// Length in millimetres between exactly two canvas points, to 0.01 mm.
pub fn measure_distance(points: &[[f64; 2]], scale: f64) -> Result<f64, InputError> {
    if points.len() != 2 {
        return Err(InputError::WrongPointCount {
            expected: 2,
            got: points.len(),
        });
    }
    check_scale(scale)?;
    let pts = to_points(points)?;
    Ok(round_to((pts[1] - pts[0]).norm() * scale, 2))
}

/// Area in square millimetres of the polygon through the canvas points, to
/// 0.01 mm^2. Winding direction does not matter.
pub fn measure_polygon_area(points: &[[f64; 2]], scale: f64) -> Result<f64, InputError> {
    if points.len() < 3 {
        return Err(InputError::TooFewPoints {
            needed: 3,
            got: points.len(),
        });
    }
    check_scale(scale)?;
    let pts = to_points(points)?;
    Ok(round_to(polygon_area(&pts) * scale * scale, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_scaled_and_rounded() {
        assert_eq!(measure_distance(&[[0.0, 0.0], [100.0, 0.0]], 0.2625), Ok(26.25));
        assert_eq!(measure_distance(&[[3.0, 4.0], [0.0, 0.0]], 1.0 / 3.0), Ok(1.67));
    }

    #[test]
    fn area_uses_the_absolute_shoelace_sum() {
        let rect = [[0.0, 0.0], [100.0, 0.0], [100.0, 50.0], [0.0, 50.0]];
        assert_eq!(measure_polygon_area(&rect, 0.2625), Ok(344.53));
        let mut reversed = rect;
        reversed.reverse();
        assert_eq!(measure_polygon_area(&reversed, 0.2625), Ok(344.53));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(
            measure_distance(&[[0.0, 0.0]], 1.0),
            Err(InputError::WrongPointCount { expected: 2, got: 1 })
        );
        assert_eq!(
            measure_polygon_area(&[[0.0, 0.0], [1.0, 1.0]], 1.0),
            Err(InputError::TooFewPoints { needed: 3, got: 2 })
        );
        assert_eq!(
            measure_distance(&[[0.0, 0.0], [f64::NAN, 1.0]], 1.0),
            Err(InputError::NonFinitePoint { index: 1 })
        );
        assert!(matches!(
            measure_distance(&[[0.0, 0.0], [1.0, 1.0]], -0.5),
            Err(InputError::InvalidScale { .. })
        ));
    }
}
