use crate::common::*;

/// Height and width of an image or a feature map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "height and width must be non-negative");
        Ok(Self { h, w })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    /// True if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.h == T::zero() || self.w == T::zero()
    }
}

impl<T> HW<T>
where
    T: ToPrimitive,
{
    pub fn try_cast<U>(self) -> Option<HW<U>>
    where
        U: NumCast,
    {
        Some(HW {
            h: U::from(self.h)?,
            w: U::from(self.w)?,
        })
    }

    pub fn cast<U>(self) -> HW<U>
    where
        U: NumCast,
    {
        self.try_cast().unwrap()
    }

    /// The largest factor that scales `self` into `target` on both sides.
    pub fn fit_scale(&self, target: &HW<T>) -> f64
    where
        T: Copy,
    {
        let ratio = |to: T, from: T| -> f64 {
            to.to_f64().unwrap_or(f64::NAN) / from.to_f64().unwrap_or(f64::NAN)
        };
        ratio(target.h, self.h).min(ratio(target.w, self.w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn size_is_empty() {
        assert!(!HW::from_hw([3.0, 2.0]).is_empty());
        assert!(HW::from_hw([0, 5]).is_empty());
    }

    #[test]
    fn size_cast_truncates() {
        let size = HW::from_hw([600.5_f64, 1000.0]).cast::<i64>();
        assert_eq!((size.h(), size.w()), (600, 1000));
    }

    #[test]
    fn size_fit_scale() {
        let image = HW::from_hw([500, 353]);
        assert_abs_diff_eq!(image.fit_scale(&HW::from_hw([1000, 1000])), 2.0);
        assert_abs_diff_eq!(image.fit_scale(&HW::from_hw([250, 1000])), 0.5);
    }

    #[test]
    fn size_reject_negative() {
        assert!(HW::try_from_hw([-1.0, 2.0]).is_err());
    }
}
