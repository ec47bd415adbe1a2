//! Image loading and normalization for the network input.

use crate::{common::*, config::PreprocessConfig};

/// A network-ready image.
#[derive(Debug)]
pub struct PreprocessedImage {
    /// Mean-subtracted BGR image, `[3, H, W]` in the target size.
    pub tensor: Tensor,
    /// Size of the resized image inside the zero padding.
    pub im_shape: HW<f64>,
    /// Resize factor from the original image.
    pub im_scale: f64,
}

/// Fit `orig` into `target` keeping the aspect ratio.
///
/// Returns the scale factor and the resized size.
pub fn scale_to_fit(orig: &HW<i64>, target: &HW<i64>) -> Result<(f64, HW<i64>)> {
    ensure!(
        !orig.is_empty(),
        "invalid image size {}x{}",
        orig.w(),
        orig.h()
    );
    let scale = orig.fit_scale(target);
    let resize = |size: i64, limit: i64| ((size as f64 * scale).round() as i64).clamp(1, limit);
    let resized = HW::from_hw([resize(orig.h(), target.h()), resize(orig.w(), target.w())]);
    Ok((scale, resized))
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    image_size: HW<i64>,
    pixel_means: [f64; 3],
    device: Device,
}

impl Preprocessor {
    pub fn new(image_size: HW<i64>, config: &PreprocessConfig, device: Device) -> Self {
        Self {
            image_size,
            pixel_means: config.pixel_means,
            device,
        }
    }

    pub fn load<P>(&self, path: P) -> Result<PreprocessedImage>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let image = vision::image::load(path)
            .with_context(|| format!("failed to load image '{}'", path.display()))?;
        self.process(&image)
    }

    /// Resize, pad and normalize an RGB `u8` image of shape `[3, H, W]`.
    pub fn process(&self, image: &Tensor) -> Result<PreprocessedImage> {
        let (channels, orig_h, orig_w) = image.size3()?;
        ensure!(
            channels == 3,
            "expect an RGB image, but get {} channels",
            channels
        );

        let target = &self.image_size;
        let (im_scale, resized) = scale_to_fit(&HW::from_hw([orig_h, orig_w]), target)?;
        let image = if resized.h() != orig_h || resized.w() != orig_w {
            vision::image::resize(&image.to_device(Device::Cpu), resized.w(), resized.h())?
        } else {
            image.shallow_clone()
        };

        let means = Tensor::of_slice(&self.pixel_means)
            .to_kind(Kind::Float)
            .view([3, 1, 1]);
        let tensor = (image.flip(&[0]).to_kind(Kind::Float) - means)
            .constant_pad_nd(&[0, target.w() - resized.w(), 0, target.h() - resized.h()])
            .to_device(self.device);

        Ok(PreprocessedImage {
            tensor,
            im_shape: resized.cast(),
            im_scale,
        })
    }
}
