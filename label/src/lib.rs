use bbox::{Rect, Transform, TLBR};
use num_traits::Num;
use std::ops::Mul;

/// A rectangle annotated with a class and a confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabel<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
    pub score: f64,
}

impl<'a, T, C> Mul<&'a ScoredLabel<TLBR<T>, C>> for &'a Transform<T>
where
    T: Copy + Num + PartialOrd,
    C: Copy,
{
    type Output = ScoredLabel<TLBR<T>, C>;

    fn mul(self, rhs: &'a ScoredLabel<TLBR<T>, C>) -> Self::Output {
        ScoredLabel {
            rect: self * &rhs.rect,
            class: rhs.class,
            score: rhs.score,
        }
    }
}
