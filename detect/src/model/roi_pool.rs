use crate::common::*;

/// Max pool each region of `features` into an `output_size` square grid.
///
/// `features` is a `[1, C, H, W]` map and `rois` are in input image pixels.
/// Returns a `[N, C, output_size, output_size]` tensor.
pub fn roi_pool(
    features: &Tensor,
    rois: &[TLBR<f64>],
    spatial_scale: f64,
    output_size: i64,
) -> Result<Tensor> {
    let (bsize, _, height, width) = features.size4()?;
    ensure!(bsize == 1, "RoI pooling expects a single image, but get {}", bsize);
    ensure!(!rois.is_empty(), "RoI pooling requires at least one region");

    let pooled: Vec<_> = rois
        .iter()
        .map(|roi| -> Result<_> {
            let (y0, h) = roi_span(roi.t(), roi.b(), spatial_scale, height)?;
            let (x0, w) = roi_span(roi.l(), roi.r(), spatial_scale, width)?;
            let (pooled, _) = features
                .narrow(2, y0, h)
                .narrow(3, x0, w)
                .adaptive_max_pool2d(&[output_size, output_size]);
            Ok(pooled)
        })
        .try_collect()?;

    Ok(Tensor::cat(&pooled, 0))
}

/// Project an inclusive `[lo, hi]` pixel range onto a feature axis of
/// `limit` cells, returning the first cell and the cell count.
///
/// The range covers at least one cell and never leaves the feature map.
pub fn roi_span(lo: f64, hi: f64, spatial_scale: f64, limit: i64) -> Result<(i64, i64)> {
    ensure!(limit >= 1, "the feature map is empty along a pooled axis");
    let max = limit - 1;
    let start = ((lo * spatial_scale).round() as i64).clamp(0, max);
    let end = ((hi * spatial_scale).round() as i64).clamp(start, max);
    Ok((start, end - start + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_rounds_to_cells() {
        assert_eq!(roi_span(0.0, 15.0, 1.0 / 16.0, 10).unwrap(), (0, 2));
        assert_eq!(roi_span(40.0, 100.0, 1.0 / 16.0, 10).unwrap(), (3, 4));
    }

    #[test]
    fn span_stays_inside() {
        assert_eq!(roi_span(-30.0, 999.0, 1.0 / 16.0, 62).unwrap(), (0, 62));
        assert_eq!(roi_span(990.0, 999.0, 1.0 / 16.0, 62).unwrap(), (61, 1));
        assert_eq!(roi_span(5.0, 6.0, 1.0 / 16.0, 62).unwrap(), (0, 1));
    }

    #[test]
    fn span_on_empty_axis() {
        assert!(roi_span(0.0, 15.0, 1.0 / 16.0, 0).is_err());

        let features = Tensor::zeros(&[1, 1, 0, 4], (Kind::Float, Device::Cpu));
        let rois = vec![TLBR::from_tlbr([0.0, 0.0, 3.0, 3.0])];
        assert!(roi_pool(&features, &rois, 1.0, 2).is_err());
    }

    #[test]
    fn pool_regions() {
        let features = Tensor::arange(16, (Kind::Float, Device::Cpu)).view([1, 1, 4, 4]);
        let rois = vec![
            TLBR::from_tlbr([0.0, 0.0, 3.0, 3.0]),
            TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0]),
        ];
        let pooled = roi_pool(&features, &rois, 1.0, 2).unwrap();
        assert_eq!(pooled.size(), vec![2, 1, 2, 2]);

        let values = Vec::<f32>::from(&pooled.view([-1]));
        assert_eq!(values, vec![5.0, 7.0, 13.0, 15.0, 0.0, 1.0, 4.0, 5.0]);
    }
}
