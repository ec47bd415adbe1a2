use crate::common::*;

#[derive(Debug, Clone)]
pub struct Conv2DInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub p: usize,
}

impl Conv2DInit {
    /// Stride 1 convolution that keeps the spatial size.
    pub fn new(in_c: usize, out_c: usize, k: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            p: k / 2,
        }
    }

    pub fn build<'p, P>(self, path: P) -> nn::Conv2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let Self { in_c, out_c, k, p } = self;

        nn::conv2d(
            path,
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                padding: p as i64,
                bias: true,
                ..Default::default()
            },
        )
    }
}

/// Fully connected layer with `[out_c, in_c]` weights.
#[derive(Debug)]
pub struct Linear {
    pub ws: Tensor,
    pub bs: Tensor,
}

#[derive(Debug, Clone)]
pub struct LinearInit {
    pub in_c: usize,
    pub out_c: usize,
}

impl LinearInit {
    pub fn build<'p, P>(self, path: P) -> Linear
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self { in_c, out_c } = self;
        let ws = path.var(
            "weight",
            &[out_c as i64, in_c as i64],
            nn::Init::KaimingUniform,
        );
        let bs = path.var("bias", &[out_c as i64], nn::Init::Const(0.0));
        Linear { ws, bs }
    }
}

impl nn::Module for Linear {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.matmul(&self.ws.tr()) + &self.bs
    }
}
