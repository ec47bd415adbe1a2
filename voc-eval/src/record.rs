use crate::common::*;

/// Box in original image pixel coordinates, inclusive convention.
pub type PixelBox = TLBR<f64>;

/// A scored detection with its class index.
pub type Detection = ScoredLabel<PixelBox, usize>;

/// All detections of one image, over all classes.
pub type ImageDetections = Vec<Detection>;

/// A ground truth object of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruth {
    pub rect: PixelBox,
    pub class: usize,
    /// Objects marked difficult are excluded from the positive count.
    pub difficult: bool,
}

/// Check that detections and ground truth line up with the class list.
pub(crate) fn validate_inputs(
    detections: &[ImageDetections],
    ground_truth: &[Vec<GroundTruth>],
    num_classes: usize,
) -> Result<()> {
    ensure!(
        detections.len() == ground_truth.len(),
        "detections cover {} images, but ground truth covers {} images",
        detections.len(),
        ground_truth.len()
    );
    ensure!(
        num_classes >= 2,
        "the class list must contain the background and at least one object class"
    );

    for (image_index, dets) in detections.iter().enumerate() {
        for det in dets {
            ensure!(
                det.class > 0 && det.class < num_classes,
                "detection of image {} has invalid class index {}",
                image_index,
                det.class
            );
            ensure!(
                !det.score.is_nan(),
                "detection of image {} has NaN score",
                image_index
            );
        }
    }

    for (image_index, gts) in ground_truth.iter().enumerate() {
        for gt in gts {
            ensure!(
                gt.class > 0 && gt.class < num_classes,
                "ground truth of image {} has invalid class index {}",
                image_index,
                gt.class
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class: usize, score: f64) -> Detection {
        ScoredLabel {
            rect: TLBR::from_tlbr([0.0, 0.0, 9.0, 9.0]),
            class,
            score,
        }
    }

    #[test]
    fn validate_image_count_mismatch() {
        let detections = vec![vec![], vec![]];
        let ground_truth = vec![vec![]];
        assert!(validate_inputs(&detections, &ground_truth, 3).is_err());
    }

    #[test]
    fn validate_background_detection() {
        let detections = vec![vec![det(0, 0.5)]];
        let ground_truth = vec![vec![]];
        assert!(validate_inputs(&detections, &ground_truth, 3).is_err());
    }

    #[test]
    fn validate_out_of_range_class() {
        let detections = vec![vec![det(3, 0.5)]];
        let ground_truth = vec![vec![]];
        assert!(validate_inputs(&detections, &ground_truth, 3).is_err());
        assert!(validate_inputs(&[vec![det(2, 0.5)]], &ground_truth, 3).is_ok());
    }
}
