use crate::{common::*, rect::RectFloat, Rect};

/// Greedy non-maximum suppression.
///
/// Boxes are visited in descending score order; a box is dropped when its
/// inclusive-pixel IoU with an already kept box exceeds `iou_threshold`.
/// Returns the kept indices ordered by descending score. Equal scores are
/// visited in input order.
pub fn nms<R, T>(boxes: &[R], scores: &[T], iou_threshold: T) -> Result<Vec<usize>>
where
    R: Rect<Type = T>,
    T: Float,
{
    ensure!(
        boxes.len() == scores.len(),
        "boxes and scores must have the same length, but get {} and {}",
        boxes.len(),
        scores.len()
    );
    ensure!(
        scores.iter().all(|score| !score.is_nan()),
        "scores must not contain NaN"
    );

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&lhs, &rhs| {
        scores[rhs]
            .partial_cmp(&scores[lhs])
            .unwrap_or(Ordering::Equal)
    });

    let mut suppressed = vec![false; boxes.len()];
    let mut keep = vec![];

    for (pos, &li) in order.iter().enumerate() {
        if suppressed[li] {
            continue;
        }
        keep.push(li);
        let lhs = &boxes[li];

        for &ri in &order[(pos + 1)..] {
            if !suppressed[ri] && lhs.pixel_iou_with(&boxes[ri]) > iou_threshold {
                suppressed[ri] = true;
            }
        }
    }

    Ok(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{prelude::*, TLBR};

    #[test]
    fn nms_empty() {
        let boxes: Vec<TLBR<f64>> = vec![];
        assert!(nms(&boxes, &[], 0.3).unwrap().is_empty());
    }

    #[test]
    fn nms_suppress_overlapping() {
        let boxes = vec![
            TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]),
            TLBR::from_tlbr([0.0, 1.0, 9.0, 10.0]),
            TLBR::from_tlbr([50.0, 50.0, 59.0, 59.0]),
        ];
        let scores = [0.8, 0.9, 0.1];
        let keep = nms(&boxes, &scores, 0.3).unwrap();
        assert_eq!(keep, vec![1, 2]);
    }

    #[test]
    fn nms_threshold_is_exclusive() {
        // IoU is exactly 1/3
        let boxes = vec![
            TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]),
            TLBR::from_tlbr([0.0, 5.0, 9.0, 14.0]),
        ];
        let scores = [0.9, 0.8];
        assert_eq!(nms(&boxes, &scores, 1.0 / 3.0).unwrap(), vec![0, 1]);
        assert_eq!(nms(&boxes, &scores, 0.3).unwrap(), vec![0]);
    }

    #[test]
    fn nms_ties_keep_input_order() {
        let boxes = vec![
            TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]),
            TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]),
        ];
        let scores = [0.5, 0.5];
        assert_eq!(nms(&boxes, &scores, 0.5).unwrap(), vec![0]);
    }

    #[test]
    fn nms_length_mismatch() {
        let boxes = vec![TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0])];
        assert!(nms(&boxes, &[0.1, 0.2], 0.5).is_err());
    }
}
