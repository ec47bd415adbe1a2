use super::TLBR;
use crate::common::*;

/// Bounding box in CyCxHW format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CyCxHW<T> {
    pub cy: T,
    pub cx: T,
    pub h: T,
    pub w: T,
}

impl<T> CyCxHW<T>
where
    T: Float,
{
    /// Convert back to corners under the inclusive pixel convention, the
    /// inverse of [TLBR::to_pixel_cycxhw].
    pub fn to_pixel_tlbr(&self) -> TLBR<T> {
        let half = T::from(0.5).unwrap();
        let Self { cy, cx, h, w } = *self;
        let half_h = half * (h - T::one());
        let half_w = half * (w - T::one());
        TLBR {
            t: cy - half_h,
            l: cx - half_w,
            b: cy + half_h,
            r: cx + half_w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn cycxhw_single_pixel() {
        let rect = CyCxHW {
            cy: 4.0,
            cx: 7.0,
            h: 1.0,
            w: 1.0,
        };
        assert_eq!(rect.to_pixel_tlbr().tlbr(), [4.0, 7.0, 4.0, 7.0]);
    }
}
