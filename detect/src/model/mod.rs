//! Faster-RCNN network with a VGG16 backbone.

mod head;
mod layers;
mod roi_pool;
mod rpn;
mod vgg;

pub use head::*;
pub use layers::*;
pub use roi_pool::*;
pub use rpn::*;
pub use vgg::*;

use crate::{
    common::*,
    config::{BboxNormalization, Config},
    proposal::{ProposalLayer, Proposals},
};

/// Side length of the pooled regions.
pub const ROI_POOL_SIZE: usize = 7;

#[derive(Debug)]
pub struct FasterRcnn {
    backbone: Vgg16,
    rpn: Rpn,
    proposal_layer: ProposalLayer,
    head: FastRcnnHead,
    spatial_scale: f64,
}

/// Network outputs of a single image, copied to host memory.
#[derive(Debug, Clone)]
pub struct FrcnnOutput {
    /// Regions in input image pixels.
    pub proposals: Proposals,
    /// Class probabilities, `num_classes` values per proposal.
    pub cls_prob: Vec<f32>,
    /// Box deltas, `4 * num_classes` values per proposal in
    /// `[dx, dy, dw, dh]` order.
    pub bbox_pred: Vec<f32>,
    pub num_classes: usize,
}

impl FasterRcnn {
    pub fn new<'p, P>(path: P, num_classes: usize, config: &Config) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let head = FastRcnnHeadInit::new(Vgg16::OUT_C, ROI_POOL_SIZE, num_classes);
        Self::with_head(path, head, config)
    }

    /// Build the network with a custom classification head.
    pub fn with_head<'p, P>(path: P, head: FastRcnnHeadInit, config: &Config) -> Result<Self>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let anchor = &config.anchor;
        ensure!(
            head.num_classes >= 2,
            "the network requires the background and at least one object class"
        );
        ensure!(
            head.in_c == Vgg16::OUT_C && head.pool_size == ROI_POOL_SIZE,
            "the head expects {}x{}x{} pooled regions, but the backbone gives {}x{}x{}",
            head.in_c,
            head.pool_size,
            head.pool_size,
            Vgg16::OUT_C,
            ROI_POOL_SIZE,
            ROI_POOL_SIZE
        );
        ensure!(
            anchor.feat_stride == Vgg16::FEAT_STRIDE,
            "the VGG16 backbone has stride {}, but the anchor stride is {}",
            Vgg16::FEAT_STRIDE,
            anchor.feat_stride
        );
        ensure!(anchor.num_anchors() > 0, "no anchor ratios or scales are given");

        let backbone = Vgg16::new(path / "vgg16");
        let rpn = Rpn::new(path / "rpn", Vgg16::OUT_C, anchor.num_anchors());
        let proposal_layer = ProposalLayer::new(anchor, config.proposal.clone())?;
        let head = head.build(path / "frcn");

        Ok(Self {
            backbone,
            rpn,
            proposal_layer,
            head,
            spatial_scale: 1.0 / anchor.feat_stride as f64,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.head.num_classes()
    }

    /// Undo the training-time normalization of the box regression layer.
    pub fn denormalize_bbox_pred(&mut self, normalization: &BboxNormalization) {
        self.head.denormalize_bbox_pred(normalization);
    }

    /// Run the network on one `[3, H, W]` image.
    ///
    /// `im_shape` is the size of the valid image area and `im_scale` the
    /// resize factor from the original image.
    pub fn forward(
        &self,
        image: &Tensor,
        im_shape: &HW<f64>,
        im_scale: f64,
    ) -> Result<FrcnnOutput> {
        tch::no_grad(|| {
            let num_classes = self.num_classes();
            let features = image.unsqueeze(0).apply(&self.backbone);
            let (_, _, feat_h, feat_w) = features.size4()?;

            let rpn_output = self.rpn.forward(&features)?;
            let (scores, deltas) = rpn_output.to_vecs();
            let proposals = self.proposal_layer.propose(
                &scores,
                &deltas,
                feat_h as usize,
                feat_w as usize,
                im_shape,
                im_scale,
            )?;
            debug!("{} proposals", proposals.len());

            if proposals.is_empty() {
                return Ok(FrcnnOutput {
                    proposals,
                    cls_prob: vec![],
                    bbox_pred: vec![],
                    num_classes,
                });
            }

            let pooled = roi_pool(
                &features,
                &proposals.boxes,
                self.spatial_scale,
                ROI_POOL_SIZE as i64,
            )?;
            let (cls_prob, bbox_pred) = self.head.forward(&pooled);
            let cls_prob = Vec::<f32>::from(&cls_prob.view([-1]).to_device(Device::Cpu));
            let bbox_pred = Vec::<f32>::from(&bbox_pred.view([-1]).to_device(Device::Cpu));

            Ok(FrcnnOutput {
                proposals,
                cls_prob,
                bbox_pred,
                num_classes,
            })
        })
    }
}
