use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_tlbr(tlbr: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlbr(tlbr).unwrap()
    }

    /// Build a rectangle from `[x1, y1, x2, y2]` corners, the order used by
    /// VOC annotations and detection outputs.
    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized,
    {
        let [x1, y1, x2, y2] = xyxy;
        Self::try_from_tlbr([y1, x1, y2, x2])
    }

    fn tlbr(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.b(), self.r()]
    }

    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }

    /// Height in inclusive pixel units, `b - t + 1`.
    fn pixel_h(&self) -> Self::Type {
        self.b() - self.t() + Self::Type::one()
    }

    /// Width in inclusive pixel units, `r - l + 1`.
    fn pixel_w(&self) -> Self::Type {
        self.r() - self.l() + Self::Type::one()
    }

    fn pixel_area(&self) -> Self::Type {
        self.pixel_h() * self.pixel_w()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Intersection area where boundary pixels are counted as covered.
    fn pixel_intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let zero = Self::Type::zero();
        let one = Self::Type::one();
        let ih = (self.b().min(other.b()) - self.t().max(other.t()) + one).max(zero);
        let iw = (self.r().min(other.r()) - self.l().max(other.l()) + one).max(zero);
        ih * iw
    }

    /// IoU under the inclusive pixel convention of PASCAL VOC.
    fn pixel_iou_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let inter_area = self.pixel_intersection_area_with(other);
        if inter_area <= Self::Type::zero() {
            return Self::Type::zero();
        }
        let union_area = self.pixel_area() + other.pixel_area() - inter_area;
        inter_area / union_area
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TLBR;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_pixel_iou() {
        // 10x10 pixels each, overlapping on a 5x10 strip
        let lhs = TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]);
        let rhs = TLBR::from_tlbr([0.0, 5.0, 9.0, 14.0]);
        assert_abs_diff_eq!(lhs.pixel_area(), 100.0);
        assert_abs_diff_eq!(lhs.pixel_intersection_area_with(&rhs), 50.0);
        assert_abs_diff_eq!(lhs.pixel_iou_with(&rhs), 50.0 / 150.0);
    }

    #[test]
    fn rect_pixel_iou_disjoint() {
        let lhs = TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]);
        let rhs = TLBR::from_tlbr([20.0, 20.0, 29.0, 29.0]);
        assert_abs_diff_eq!(lhs.pixel_iou_with(&rhs), 0.0);
    }

    #[test]
    fn rect_xyxy_order() {
        let rect: TLBR<f64> = TLBR::try_from_xyxy([1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(rect.tlbr(), [2.0, 1.0, 4.0, 3.0]);
        assert_eq!(rect.xyxy(), [1.0, 2.0, 3.0, 4.0]);
    }
}
