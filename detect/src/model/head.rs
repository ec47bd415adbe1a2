use super::layers::{Linear, LinearInit};
use crate::{common::*, config::BboxNormalization};

#[derive(Debug, Clone)]
pub struct FastRcnnHeadInit {
    /// Channels of the pooled regions.
    pub in_c: usize,
    /// Side length of the pooled regions.
    pub pool_size: usize,
    pub hidden_c: usize,
    /// Number of classes including the background.
    pub num_classes: usize,
}

impl FastRcnnHeadInit {
    pub fn new(in_c: usize, pool_size: usize, num_classes: usize) -> Self {
        Self {
            in_c,
            pool_size,
            hidden_c: 4096,
            num_classes,
        }
    }

    pub fn build<'p, P>(self, path: P) -> FastRcnnHead
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            in_c,
            pool_size,
            hidden_c,
            num_classes,
        } = self;

        let fc6 = LinearInit {
            in_c: in_c * pool_size * pool_size,
            out_c: hidden_c,
        }
        .build(path / "fc6");
        let fc7 = LinearInit {
            in_c: hidden_c,
            out_c: hidden_c,
        }
        .build(path / "fc7");
        let cls_score = LinearInit {
            in_c: hidden_c,
            out_c: num_classes,
        }
        .build(path / "cls_score");
        let bbox_pred = LinearInit {
            in_c: hidden_c,
            out_c: num_classes * 4,
        }
        .build(path / "bbox_pred");

        FastRcnnHead {
            num_classes,
            fc6,
            fc7,
            cls_score,
            bbox_pred,
        }
    }
}

/// Classification and box regression layers applied to pooled regions.
#[derive(Debug)]
pub struct FastRcnnHead {
    num_classes: usize,
    fc6: Linear,
    fc7: Linear,
    cls_score: Linear,
    bbox_pred: Linear,
}

impl FastRcnnHead {
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns class probabilities `[N, C]` and class box deltas `[N, 4C]`.
    pub fn forward(&self, pooled: &Tensor) -> (Tensor, Tensor) {
        let xs = pooled
            .flatten(1, -1)
            .apply(&self.fc6)
            .relu()
            .apply(&self.fc7)
            .relu();
        let cls_prob = xs.apply(&self.cls_score).softmax(1, Kind::Float);
        let bbox_pred = xs.apply(&self.bbox_pred);
        (cls_prob, bbox_pred)
    }

    /// Fold the regression target statistics into the box regression layer,
    /// so that its outputs are plain deltas.
    pub fn denormalize_bbox_pred(&mut self, normalization: &BboxNormalization) {
        let BboxNormalization { means, stds } = normalization;
        let tile = |values: &[f64; 4]| -> Tensor {
            let values: Vec<f32> = values
                .iter()
                .map(|&value| value as f32)
                .cycle()
                .take(self.num_classes * 4)
                .collect();
            Tensor::of_slice(&values).to_device(self.bbox_pred.ws.device())
        };
        let means = tile(means);
        let stds = tile(stds);

        tch::no_grad(|| {
            let Linear { ws, bs } = &mut self.bbox_pred;
            let new_ws = &*ws * stds.view([-1, 1]);
            let new_bs = &*bs * &stds + &means;
            ws.copy_(&new_ws);
            bs.copy_(&new_bs);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denormalized_outputs_match_scaled_deltas() {
        let vs = nn::VarStore::new(Device::Cpu);
        let mut head = FastRcnnHeadInit {
            in_c: 2,
            pool_size: 2,
            hidden_c: 6,
            num_classes: 3,
        }
        .build(&vs.root());

        // make the bias non-trivial
        tch::no_grad(|| {
            let bias = Tensor::arange(12, (Kind::Float, Device::Cpu)) / 10.0;
            head.bbox_pred.bs.copy_(&bias);
        });

        let pooled = Tensor::rand(&[5, 2, 2, 2], (Kind::Float, Device::Cpu));
        let (_, before) = head.forward(&pooled);
        let before = Vec::<f32>::from(&before.view([-1]));

        let normalization = BboxNormalization {
            means: [0.5, -0.5, 0.0, 1.0],
            stds: [0.1, 0.1, 0.2, 0.2],
        };
        head.denormalize_bbox_pred(&normalization);
        let (cls_prob, after) = head.forward(&pooled);
        let after = Vec::<f32>::from(&after.view([-1]));

        assert_eq!(cls_prob.size(), vec![5, 3]);
        assert_eq!(before.len(), 5 * 12);
        for (index, (&lhs, &rhs)) in before.iter().zip(&after).enumerate() {
            let coord = index % 4;
            let expect =
                lhs as f64 * normalization.stds[coord] + normalization.means[coord];
            assert!(
                (rhs as f64 - expect).abs() < 1e-4,
                "output {}: expect {}, but get {}",
                index,
                expect,
                rhs
            );
        }
    }
}
