use super::layers::Conv2DInit;
use crate::common::*;

/// Region proposal network head on top of the backbone features.
#[derive(Debug)]
pub struct Rpn {
    num_anchors: i64,
    conv: nn::Conv2D,
    cls_score: nn::Conv2D,
    bbox_pred: nn::Conv2D,
}

/// Raw RPN outputs of a single image.
#[derive(Debug)]
pub struct RpnOutput {
    /// Foreground probabilities, `[1, A, H, W]`.
    pub scores: Tensor,
    /// Box deltas, `[1, 4A, H, W]` with four consecutive channels per anchor.
    pub deltas: Tensor,
}

impl Rpn {
    pub fn new<'p, P>(path: P, in_c: usize, num_anchors: usize) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        Self {
            num_anchors: num_anchors as i64,
            conv: Conv2DInit::new(in_c, 512, 3).build(path / "rpn_conv_3x3"),
            cls_score: Conv2DInit::new(512, num_anchors * 2, 1).build(path / "rpn_cls_score"),
            bbox_pred: Conv2DInit::new(512, num_anchors * 4, 1).build(path / "rpn_bbox_pred"),
        }
    }

    pub fn forward(&self, features: &Tensor) -> Result<RpnOutput> {
        let (bsize, _, height, width) = features.size4()?;
        let num_anchors = self.num_anchors;

        let xs = features.apply(&self.conv).relu();

        // background scores take the first A channels and foreground the rest
        let scores = xs
            .apply(&self.cls_score)
            .view([bsize, 2, num_anchors * height, width])
            .softmax(1, Kind::Float)
            .view([bsize, 2 * num_anchors, height, width])
            .narrow(1, num_anchors, num_anchors);
        let deltas = xs.apply(&self.bbox_pred);

        Ok(RpnOutput { scores, deltas })
    }
}

impl RpnOutput {
    /// Flatten both outputs into row, column and anchor order.
    pub fn to_vecs(&self) -> (Vec<f32>, Vec<f32>) {
        let flatten = |xs: &Tensor| -> Vec<f32> {
            let xs = xs
                .permute(&[0, 2, 3, 1])
                .contiguous()
                .view([-1])
                .to_device(Device::Cpu);
            Vec::from(&xs)
        };
        (flatten(&self.scores), flatten(&self.deltas))
    }
}
