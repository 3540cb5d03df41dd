use nalgebra::Vector2;
use paperscale_core::filters::dilate_disc;
use paperscale_core::{external_contours, fill_contour, Contour};

/// Grow an outline outward by `px` pixels.
///
/// Edge detection and closing place outlines slightly inside the true
/// boundary. The filled outline is dilated with a disc on a local crop
/// around its bounding box, so cost scales with the object rather than the
/// canvas. The input is returned unchanged if the crop yields no outline.
pub fn expand_contour(contour: &Contour, px: u8) -> Contour {
    let Some(bbox) = contour.bounding_box() else {
        return contour.clone();
    };
    if px == 0 {
        return contour.clone();
    }
    let margin = px as i32 + 4;
    let origin = Vector2::new((bbox.x - margin) as f64, (bbox.y - margin) as f64);
    let w = (bbox.width + 2 * margin) as u32;
    let h = (bbox.height + 2 * margin) as u32;

    let mask = fill_contour(contour, w, h, -origin);
    let grown = dilate_disc(&mask, px);
    external_contours(&grown)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .map(|c| c.translated(origin))
        .unwrap_or_else(|| contour.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_canvas::square;
    use approx::assert_relative_eq;

    #[test]
    fn square_grows_by_the_requested_margin_on_every_side() {
        let c = square(200.0, 150.0, 40.0);
        let grown = expand_contour(&c, 3);
        let bb = grown.bounding_box().expect("bbox");
        assert!((176..=177).contains(&bb.x) && (126..=127).contains(&bb.y), "{bb:?}");
        assert!((46..=47).contains(&bb.width) && (46..=47).contains(&bb.height), "{bb:?}");
        assert!(grown.area() > c.area());
        let centre = grown.centroid().expect("centroid");
        assert_relative_eq!(centre.x, 200.0, epsilon = 0.5);
        assert_relative_eq!(centre.y, 150.0, epsilon = 0.5);
    }

    #[test]
    fn zero_growth_is_identity() {
        let c = square(50.0, 50.0, 20.0);
        assert_eq!(expand_contour(&c, 0), c);
        assert_eq!(expand_contour(&Contour::default(), 4), Contour::default());
    }
}
