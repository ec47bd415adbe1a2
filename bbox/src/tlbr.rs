use super::{CyCxHW, Rect};
use crate::{common::*, Transform};

/// Bounding box in TLBR format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        TLBR {
            t: self.t * transform.sy + transform.ty,
            l: self.l * transform.sx + transform.tx,
            b: self.b * transform.sy + transform.ty,
            r: self.r * transform.sx + transform.tx,
        }
    }
}

impl<T> TLBR<T>
where
    T: Float,
{
    /// Clamp the box into an image of `height` x `width` pixels, so that
    /// every coordinate ends up within `[0, size - 1]`.
    pub fn clip_to(&self, height: T, width: T) -> Self {
        let zero = T::zero();
        let max_y = height - T::one();
        let max_x = width - T::one();
        let clamp = |value: T, max: T| value.max(zero).min(max);

        TLBR {
            t: clamp(self.t, max_y),
            l: clamp(self.l, max_x),
            b: clamp(self.b, max_y),
            r: clamp(self.r, max_x),
        }
    }

    /// Convert to center-size form under the inclusive pixel convention.
    pub fn to_pixel_cycxhw(&self) -> CyCxHW<T> {
        let half = T::from(0.5).unwrap();
        let h = self.b - self.t + T::one();
        let w = self.r - self.l + T::one();
        CyCxHW {
            cy: self.t + half * (h - T::one()),
            cx: self.l + half * (w - T::one()),
            h,
            w,
        }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tlbr_clip() {
        let rect = TLBR::from_tlbr([-5.0, -3.0, 120.0, 80.0]);
        let clipped = rect.clip_to(100.0, 50.0);
        assert_eq!(clipped.tlbr(), [0.0, 0.0, 99.0, 49.0]);
    }

    #[test]
    fn tlbr_pixel_cycxhw_round_trip() {
        let rect = TLBR::from_tlbr([10.0, 20.0, 29.0, 59.0]);
        let cycxhw = rect.to_pixel_cycxhw();
        assert_abs_diff_eq!(cycxhw.h, 20.0);
        assert_abs_diff_eq!(cycxhw.w, 40.0);
        assert_eq!(cycxhw.to_pixel_tlbr(), rect);
    }

    #[test]
    fn tlbr_reject_inverted() {
        assert!(TLBR::try_from_tlbr([10.0, 0.0, 5.0, 3.0]).is_err());
    }
}
