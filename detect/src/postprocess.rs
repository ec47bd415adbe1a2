//! Converts network outputs into per-image detections.

use crate::{common::*, config::DetectionConfig, model::FrcnnOutput};

/// Decode class-specific boxes, filter them by score and NMS per class,
/// and cap the number of detections per image.
///
/// Boxes are clipped to `im_shape` and mapped back to original image
/// pixels by `1 / im_scale`. The result is ordered by class and then by
/// descending score.
pub fn get_bboxes(
    output: &FrcnnOutput,
    im_shape: &HW<f64>,
    im_scale: f64,
    config: &DetectionConfig,
) -> Result<ImageDetections> {
    let FrcnnOutput {
        proposals,
        cls_prob,
        bbox_pred,
        num_classes,
    } = output;
    let num_classes = *num_classes;
    let num_rois = proposals.len();
    ensure!(
        cls_prob.len() == num_rois * num_classes,
        "expect {} class scores, but get {}",
        num_rois * num_classes,
        cls_prob.len()
    );
    ensure!(
        bbox_pred.len() == num_rois * num_classes * 4,
        "expect {} box deltas, but get {}",
        num_rois * num_classes * 4,
        bbox_pred.len()
    );
    ensure!(im_scale > 0.0, "image scale must be positive");

    let DetectionConfig {
        max_per_image,
        score_threshold,
        nms_threshold,
    } = *config;
    let to_orig = Transform::from_scale(1.0 / im_scale);

    let class_dets: Vec<Vec<Detection>> = (1..num_classes)
        .map(|class| -> Result<_> {
            let candidates: Vec<Detection> = proposals
                .boxes
                .iter()
                .enumerate()
                .filter_map(|(roi_index, roi)| {
                    let offset = roi_index * num_classes + class;
                    let score = cls_prob[offset] as f64;
                    (score > score_threshold.raw()).then(|| {
                        let delta = &bbox_pred[(offset * 4)..(offset * 4 + 4)];
                        let delta = BoxDelta::from_xywh([
                            delta[0] as f64,
                            delta[1] as f64,
                            delta[2] as f64,
                            delta[3] as f64,
                        ]);
                        let rect = delta.decode(roi).clip_to(im_shape.h(), im_shape.w());
                        &to_orig * &ScoredLabel { rect, class, score }
                    })
                })
                .collect();

            let boxes: Vec<_> = candidates.iter().map(|det| det.rect).collect();
            let scores: Vec<_> = candidates.iter().map(|det| det.score).collect();
            let keep = nms(&boxes, &scores, nms_threshold.raw())?;
            let dets: Vec<_> = keep
                .into_iter()
                .map(|index| candidates[index].clone())
                .collect();
            Ok(dets)
        })
        .try_collect()?;

    let num_dets: usize = class_dets.iter().map(Vec::len).sum();
    let detections: Vec<_> = if max_per_image > 0 && num_dets > max_per_image {
        // ties at the cut-off score are kept
        let mut all_scores: Vec<_> = class_dets
            .iter()
            .flatten()
            .map(|det| det.score)
            .collect();
        all_scores.sort_by(|lhs, rhs| rhs.partial_cmp(lhs).unwrap_or(Ordering::Equal));
        let min_score = all_scores[max_per_image - 1];

        class_dets
            .into_iter()
            .flatten()
            .filter(|det| det.score >= min_score)
            .collect()
    } else {
        class_dets.into_iter().flatten().collect()
    };

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::Proposals;

    fn output(cls_prob: Vec<f32>) -> FrcnnOutput {
        let num_rois = cls_prob.len() / 3;
        FrcnnOutput {
            proposals: Proposals {
                boxes: (0..num_rois)
                    .map(|index| {
                        let offset = index as f64 * 40.0;
                        TLBR::from_tlbr([offset, offset, offset + 19.0, offset + 39.0])
                    })
                    .collect(),
                scores: vec![1.0; num_rois],
            },
            bbox_pred: vec![0.0; num_rois * 3 * 4],
            cls_prob,
            num_classes: 3,
        }
    }

    #[test]
    fn boxes_are_mapped_to_original_image() {
        let output = output(vec![0.1, 0.85, 0.05]);
        let im_shape = HW::from_hw([200.0, 200.0]);
        let dets = get_bboxes(&output, &im_shape, 2.0, &DetectionConfig::default()).unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class, 1);
        assert!((dets[0].score - 0.85).abs() < 1e-6);
        assert_eq!(dets[0].rect.xyxy(), [0.0, 0.0, 19.5, 9.5]);
        assert_eq!(dets[1].class, 2);
    }

    #[test]
    fn boxes_are_clipped_to_image() {
        let output = output(vec![0.1, 0.9, 0.0]);
        let im_shape = HW::from_hw([10.0, 30.0]);
        let dets = get_bboxes(&output, &im_shape, 1.0, &DetectionConfig::default()).unwrap();

        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].rect.xyxy(), [0.0, 0.0, 29.0, 9.0]);
    }

    #[test]
    fn low_scores_and_background_are_dropped() {
        let output = output(vec![0.9995, 0.0005, 0.0]);
        let im_shape = HW::from_hw([100.0, 100.0]);
        let dets = get_bboxes(&output, &im_shape, 1.0, &DetectionConfig::default()).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn overlapping_boxes_of_a_class_are_suppressed() {
        let mut output = output(vec![0.2, 0.5, 0.3, 0.2, 0.7, 0.1]);
        // make the second region coincide with the first one
        output.proposals.boxes[1] = output.proposals.boxes[0];
        let im_shape = HW::from_hw([100.0, 100.0]);
        let dets = get_bboxes(&output, &im_shape, 1.0, &DetectionConfig::default()).unwrap();

        let summary: Vec<_> = dets
            .iter()
            .map(|det| (det.class, (det.score * 10.0).round() as i32))
            .collect();
        assert_eq!(summary, vec![(1, 7), (2, 3)]);
    }

    #[test]
    fn detections_are_capped_per_image() {
        let cls_prob: Vec<f32> = (0..5)
            .flat_map(|index| {
                let score = 0.1 * (index + 1) as f32;
                [0.0, score, score / 2.0]
            })
            .collect();
        let output = output(cls_prob);
        let im_shape = HW::from_hw([1000.0, 1000.0]);
        let config = DetectionConfig {
            max_per_image: 3,
            ..Default::default()
        };
        let dets = get_bboxes(&output, &im_shape, 1.0, &config).unwrap();

        let summary: Vec<_> = dets
            .iter()
            .map(|det| (det.class, (det.score * 100.0).round() as i32))
            .collect();
        assert_eq!(summary, vec![(1, 50), (1, 40), (1, 30)]);
    }

    #[test]
    fn detections_tied_with_cut_off_are_kept() {
        // class 1 scores 0.8, 0.6, 0.6 and class 2 scores 0.6 on disjoint regions
        let cls_prob = vec![
            0.0, 0.8, 0.0, //
            0.0, 0.6, 0.0, //
            0.0, 0.6, 0.0, //
            0.0, 0.0, 0.6, //
        ];
        let output = output(cls_prob);
        let im_shape = HW::from_hw([1000.0, 1000.0]);
        let config = DetectionConfig {
            max_per_image: 2,
            ..Default::default()
        };
        let dets = get_bboxes(&output, &im_shape, 1.0, &config).unwrap();

        assert_eq!(dets.len(), 4);
        let classes: Vec<_> = dets.iter().map(|det| det.class).collect();
        assert_eq!(classes, vec![1, 1, 1, 2]);
        assert!(dets[1..].iter().all(|det| (det.score - 0.6).abs() < 1e-6));
    }
}
