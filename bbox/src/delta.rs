use super::TLBR;
use crate::common::*;

/// Upper bound of `dh` and `dw` before exponentiation, `ln(1000 / 16)`.
pub const MAX_LOG_SCALE: f64 = 4.135_166_556_742_356;

/// Bounding box regression target relative to a reference box.
///
/// Offsets are normalized by the reference size and scales are stored in
/// log space, following the R-CNN parameterization. Sizes use the inclusive
/// pixel convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDelta<T> {
    pub dy: T,
    pub dx: T,
    pub dh: T,
    pub dw: T,
}

impl<T> BoxDelta<T>
where
    T: Float,
{
    /// Build from the `[dx, dy, dw, dh]` layout produced by the network.
    pub fn from_xywh(xywh: [T; 4]) -> Self {
        let [dx, dy, dw, dh] = xywh;
        Self { dy, dx, dh, dw }
    }

    /// Apply the delta to `reference`.
    pub fn decode(&self, reference: &TLBR<T>) -> TLBR<T> {
        let max_log_scale = T::from(MAX_LOG_SCALE).unwrap();
        let mut pixel = reference.to_pixel_cycxhw();

        pixel.cy = pixel.cy + self.dy * pixel.h;
        pixel.cx = pixel.cx + self.dx * pixel.w;
        pixel.h = pixel.h * self.dh.min(max_log_scale).exp();
        pixel.w = pixel.w * self.dw.min(max_log_scale).exp();

        pixel.to_pixel_tlbr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn delta_zero_is_identity() {
        let anchor = TLBR::from_tlbr([0.0, 0.0, 15.0, 15.0]);
        let delta = BoxDelta::from_xywh([0.0, 0.0, 0.0, 0.0]);
        assert_eq!(delta.decode(&anchor), anchor);
    }

    #[test]
    fn delta_shift_and_scale() {
        // 16x16 box centered at (7.5, 7.5)
        let anchor = TLBR::from_tlbr([0.0, 0.0, 15.0, 15.0]);
        let delta = BoxDelta::from_xywh([0.5, 0.0, 2f64.ln(), 0.0]);
        let decoded = delta.decode(&anchor);
        let cycxhw = decoded.to_pixel_cycxhw();

        assert_abs_diff_eq!(cycxhw.cx, 15.5, epsilon = 1e-9);
        assert_abs_diff_eq!(cycxhw.cy, 7.5, epsilon = 1e-9);
        assert_abs_diff_eq!(cycxhw.w, 32.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cycxhw.h, 16.0, epsilon = 1e-9);
    }

    #[test]
    fn delta_log_scale_is_bounded() {
        let anchor = TLBR::from_tlbr([0.0, 0.0, 15.0, 15.0]);
        let delta = BoxDelta::from_xywh([0.0, 0.0, 1000.0, 1000.0]);
        let decoded = delta.decode(&anchor);
        assert!(decoded.pixel_w().is_finite());
        assert_abs_diff_eq!(decoded.pixel_w(), 1000.0, epsilon = 1e-6);
    }
}
