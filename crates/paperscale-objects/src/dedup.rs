use nalgebra::Point2;
use paperscale_core::Contour;

use crate::params::ObjectParams;

/// Greedy spatial non-maximum suppression over pooled candidates.
///
/// Candidates are visited largest area first. One is kept unless its
/// centroid lies strictly closer than `nms_distance_px` to an already kept
/// centroid. Zero-mass outlines are skipped and at most `max_objects` are
/// returned, largest first.
pub fn suppress_duplicates(mut candidates: Vec<Contour>, params: &ObjectParams) -> Vec<Contour> {
    candidates.sort_by(|a, b| b.area().total_cmp(&a.area()));

    let mut kept: Vec<(Contour, Point2<f64>)> = Vec::new();
    for contour in candidates {
        if kept.len() >= params.max_objects {
            break;
        }
        let Some(c) = contour.centroid() else {
            continue;
        };
        if kept
            .iter()
            .any(|(_, k)| (c - k).norm() < params.nms_distance_px)
        {
            continue;
        }
        kept.push((contour, c));
    }
    log::debug!("nms kept {} objects", kept.len());
    kept.into_iter().map(|(contour, _)| contour).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_canvas::square;

    #[test]
    fn overlapping_detections_collapse_to_the_largest() {
        let params = ObjectParams::default();
        let pool = vec![
            square(100.0, 100.0, 50.0),
            square(102.0, 99.0, 56.0),
            square(300.0, 100.0, 40.0),
            square(98.0, 101.0, 44.0),
        ];
        let out = suppress_duplicates(pool, &params);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], square(102.0, 99.0, 56.0));
        assert_eq!(out[1], square(300.0, 100.0, 40.0));
    }

    #[test]
    fn distinct_objects_beyond_the_radius_survive() {
        let params = ObjectParams::default();
        let near = suppress_duplicates(vec![square(100.0, 100.0, 30.0), square(120.0, 100.0, 30.0)], &params);
        assert_eq!(near.len(), 1);
        let far = suppress_duplicates(vec![square(100.0, 100.0, 30.0), square(160.0, 100.0, 30.0)], &params);
        assert_eq!(far.len(), 2);
    }

    #[test]
    fn caps_the_object_count_and_skips_degenerate_outlines() {
        let params = ObjectParams {
            max_objects: 3,
            ..ObjectParams::default()
        };
        let mut pool: Vec<Contour> = (0..6)
            .map(|i| square(50.0 + 80.0 * i as f64, 50.0, 30.0 + i as f64))
            .collect();
        pool.push(Contour::new(vec![Point2::new(5.0, 5.0), Point2::new(9.0, 5.0)]));
        let out = suppress_duplicates(pool, &params);
        assert_eq!(out.len(), 3);
        assert!(out.windows(2).all(|w| w[0].area() >= w[1].area()));
        assert_eq!(out[0], square(450.0, 50.0, 35.0));
    }
}
