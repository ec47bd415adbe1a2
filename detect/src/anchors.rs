//! Reference anchors of the region proposal network.

use crate::{common::*, config::AnchorConfig};

/// Enumerate the reference anchors centered on the first feature cell.
///
/// Anchors are ordered by ratio first and scale second. Widths and heights
/// are rounded to whole pixels before scaling. Fails if an anchor ends up
/// narrower than one pixel.
pub fn generate_anchors(
    base_size: usize,
    ratios: &[R64],
    scales: &[R64],
) -> Result<Vec<TLBR<f64>>> {
    let size = base_size as f64;
    let ctr = 0.5 * (size - 1.0);
    let area = size * size;

    ratios
        .iter()
        .flat_map(|&ratio| {
            let ratio = ratio.raw();
            let ws = (area / ratio).sqrt().round();
            let hs = (ws * ratio).round();

            scales.iter().map(move |&scale| {
                let scale = scale.raw();
                anchor_around(ctr, ctr, hs * scale, ws * scale).with_context(|| {
                    format!("invalid anchor of ratio {} and scale {}", ratio, scale)
                })
            })
        })
        .try_collect()
}

/// Tile the reference anchors over a `feat_h` x `feat_w` feature map.
///
/// The output is ordered by row, column and then anchor, which matches the
/// flattened layout of the proposal network outputs.
pub fn shift_anchors(
    anchors: &[TLBR<f64>],
    feat_h: usize,
    feat_w: usize,
    feat_stride: usize,
) -> Vec<TLBR<f64>> {
    let stride = feat_stride as f64;

    iproduct!(0..feat_h, 0..feat_w, anchors)
        .map(|(row, col, anchor)| {
            let transform = Transform {
                sy: 1.0,
                sx: 1.0,
                ty: row as f64 * stride,
                tx: col as f64 * stride,
            };
            &transform * anchor
        })
        .collect()
}

impl AnchorConfig {
    pub fn reference_anchors(&self) -> Result<Vec<TLBR<f64>>> {
        generate_anchors(self.base_size, &self.ratios, &self.scales)
    }
}

fn anchor_around(cy: f64, cx: f64, h: f64, w: f64) -> Result<TLBR<f64>> {
    TLBR::try_from_tlbr([
        cy - 0.5 * (h - 1.0),
        cx - 0.5 * (w - 1.0),
        cy + 0.5 * (h - 1.0),
        cx + 0.5 * (w - 1.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_anchors() {
        let anchors = AnchorConfig::default().reference_anchors().unwrap();
        let xyxy: Vec<_> = anchors.iter().map(|anchor| anchor.xyxy()).collect();
        assert_eq!(
            xyxy,
            vec![
                [-84.0, -40.0, 99.0, 55.0],
                [-176.0, -88.0, 191.0, 103.0],
                [-360.0, -184.0, 375.0, 199.0],
                [-56.0, -56.0, 71.0, 71.0],
                [-120.0, -120.0, 135.0, 135.0],
                [-248.0, -248.0, 263.0, 263.0],
                [-36.0, -80.0, 51.0, 95.0],
                [-80.0, -168.0, 95.0, 183.0],
                [-168.0, -344.0, 183.0, 359.0],
            ]
        );
    }

    #[test]
    fn shifted_anchor_order() {
        let anchors = generate_anchors(16, &[r64(1.0)], &[r64(1.0), r64(2.0)]).unwrap();
        let shifted = shift_anchors(&anchors, 2, 3, 16);
        assert_eq!(shifted.len(), 2 * 3 * 2);

        // row 0, column 1, second anchor
        let expect = &Transform {
            sy: 1.0,
            sx: 1.0,
            ty: 0.0,
            tx: 16.0,
        } * &anchors[1];
        assert_eq!(shifted[3], expect);

        // row 1, column 0, first anchor
        assert_eq!(shifted[6].xyxy(), [0.0, 16.0, 15.0, 31.0]);
    }

    #[test]
    fn degenerate_anchor_is_rejected() {
        assert!(generate_anchors(16, &[r64(1.0)], &[r64(0.01)]).is_err());
    }
}
