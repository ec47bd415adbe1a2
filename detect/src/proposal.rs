//! Turns region proposal network outputs into candidate regions.

use crate::{
    anchors::shift_anchors,
    common::*,
    config::{AnchorConfig, ProposalConfig},
};

/// Candidate regions in input image coordinates, sorted by descending
/// objectness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposals {
    pub boxes: Vec<TLBR<f64>>,
    pub scores: Vec<f64>,
}

impl Proposals {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ProposalLayer {
    anchors: Vec<TLBR<f64>>,
    feat_stride: usize,
    config: ProposalConfig,
}

impl ProposalLayer {
    pub fn new(anchor: &AnchorConfig, config: ProposalConfig) -> Result<Self> {
        Ok(Self {
            anchors: anchor.reference_anchors()?,
            feat_stride: anchor.feat_stride,
            config,
        })
    }

    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    /// Decode the anchors of a `feat_h` x `feat_w` feature map into
    /// proposals.
    ///
    /// `scores` holds one foreground probability and `deltas` holds four
    /// `[dx, dy, dw, dh]` values per anchor, both laid out by row, column and
    /// anchor. Boxes are clipped to `im_shape`, and boxes smaller than
    /// `min_size * im_scale` on either side are dropped before NMS.
    pub fn propose(
        &self,
        scores: &[f32],
        deltas: &[f32],
        feat_h: usize,
        feat_w: usize,
        im_shape: &HW<f64>,
        im_scale: f64,
    ) -> Result<Proposals> {
        let ProposalConfig {
            pre_nms_top_n,
            post_nms_top_n,
            nms_threshold,
            min_size,
        } = self.config;
        let num_boxes = feat_h * feat_w * self.num_anchors();
        ensure!(
            scores.len() == num_boxes,
            "expect {} objectness scores, but get {}",
            num_boxes,
            scores.len()
        );
        ensure!(
            deltas.len() == num_boxes * 4,
            "expect {} box deltas, but get {}",
            num_boxes * 4,
            deltas.len()
        );

        let anchors = shift_anchors(&self.anchors, feat_h, feat_w, self.feat_stride);
        let min_size = (min_size.raw() * im_scale).max(1.0);

        let mut candidates: Vec<_> = izip!(&anchors, scores, deltas.chunks_exact(4))
            .map(|(anchor, &score, delta)| {
                let delta = BoxDelta::from_xywh([
                    delta[0] as f64,
                    delta[1] as f64,
                    delta[2] as f64,
                    delta[3] as f64,
                ]);
                let rect = delta.decode(anchor).clip_to(im_shape.h(), im_shape.w());
                (rect, score as f64)
            })
            .filter(|(rect, _)| rect.pixel_h() >= min_size && rect.pixel_w() >= min_size)
            .collect();

        candidates.sort_by(|(_, lhs), (_, rhs)| rhs.partial_cmp(lhs).unwrap_or(Ordering::Equal));
        if pre_nms_top_n > 0 {
            candidates.truncate(pre_nms_top_n);
        }
        let (boxes, scores): (Vec<_>, Vec<_>) = candidates.into_iter().unzip();

        let keep = nms(&boxes, &scores, nms_threshold.raw())?;
        let keep_len = if post_nms_top_n > 0 {
            keep.len().min(post_nms_top_n)
        } else {
            keep.len()
        };
        let (boxes, scores) = keep[..keep_len]
            .iter()
            .map(|&index| (boxes[index], scores[index]))
            .unzip();

        Ok(Proposals { boxes, scores })
    }
}
