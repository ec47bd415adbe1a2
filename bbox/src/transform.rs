use super::TLBR;
use crate::common::*;

/// Per-axis affine map `y' = y * sy + ty`, `x' = x * sx + tx`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num,
{
    /// Uniform scaling around the origin, e.g. the image resize factor.
    pub fn from_scale(scale: T) -> Self {
        Self {
            sy: scale,
            sx: scale,
            ty: T::zero(),
            tx: T::zero(),
        }
    }
}

impl<T> Mul<&TLBR<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = TLBR<T>;

    fn mul(self, rhs: &TLBR<T>) -> Self::Output {
        rhs.transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn rect_scale() {
        let rect = TLBR::from_tlbr([10.0, 20.0, 30.0, 40.0]);
        let scaled = &Transform::from_scale(2.0) * &rect;
        assert_eq!(scaled.tlbr(), [20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn rect_shift() {
        let shift = Transform {
            sy: 1.0,
            sx: 1.0,
            ty: 4.0,
            tx: 3.0,
        };
        let rect = TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0]);
        assert_eq!((&shift * &rect).tlbr(), [4.0, 3.0, 5.0, 4.0]);
    }
}
