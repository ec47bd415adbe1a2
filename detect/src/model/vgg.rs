use super::layers::Conv2DInit;
use crate::common::*;

/// Output channels of each VGG16 convolution block.
const BLOCKS: [(usize, usize); 5] = [(2, 64), (2, 128), (3, 256), (3, 512), (3, 512)];

/// VGG16 convolution layers without the last pooling layer, giving a
/// feature map at 1/16 of the input resolution.
#[derive(Debug)]
pub struct Vgg16 {
    blocks: Vec<Vec<nn::Conv2D>>,
}

impl Vgg16 {
    pub const OUT_C: usize = 512;
    pub const FEAT_STRIDE: usize = 16;

    pub fn new<'p, P>(path: P) -> Self
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let mut in_c = 3;

        let blocks = BLOCKS
            .iter()
            .enumerate()
            .map(|(block_index, &(num_convs, out_c))| {
                let convs: Vec<_> = (0..num_convs)
                    .map(|conv_index| {
                        let name = format!("conv{}_{}", block_index + 1, conv_index + 1);
                        let conv = Conv2DInit::new(in_c, out_c, 3).build(path / name);
                        in_c = out_c;
                        conv
                    })
                    .collect();
                convs
            })
            .collect();

        Self { blocks }
    }
}

impl nn::Module for Vgg16 {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let num_blocks = self.blocks.len();

        self.blocks
            .iter()
            .enumerate()
            .fold(xs.shallow_clone(), |xs, (block_index, convs)| {
                let xs = convs.iter().fold(xs, |xs, conv| xs.apply(conv).relu());
                if block_index + 1 < num_blocks {
                    xs.max_pool2d(&[2, 2], &[2, 2], &[0, 0], &[1, 1], false)
                } else {
                    xs
                }
            })
    }
}
