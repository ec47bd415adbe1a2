use crate::common::*;

/// The way a precision/recall curve is summarized into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApMetric {
    /// VOC2007 11-point interpolated AP.
    Voc07,
    /// Area under the monotone precision envelope, VOC2010 and later.
    Area,
}

impl Default for ApMetric {
    fn default() -> Self {
        Self::Voc07
    }
}

/// Compute average precision from a precision/recall curve ordered by
/// descending detection score.
pub fn voc_ap(recall: &[f64], precision: &[f64], metric: ApMetric) -> Result<f64> {
    ensure!(
        recall.len() == precision.len(),
        "recall and precision must have the same length, but get {} and {}",
        recall.len(),
        precision.len()
    );

    let ap = match metric {
        ApMetric::Voc07 => eleven_point_ap(recall, precision),
        ApMetric::Area => area_ap(recall, precision),
    };
    Ok(ap)
}

fn eleven_point_ap(recall: &[f64], precision: &[f64]) -> f64 {
    (0..=10)
        .map(|step| {
            let threshold = step as f64 * 0.1;
            recall
                .iter()
                .zip(precision)
                .filter(|&(&rec, _)| rec >= threshold)
                .map(|(_, &prec)| prec)
                .fold(0.0, f64::max)
        })
        .sum::<f64>()
        / 11.0
}

fn area_ap(recall: &[f64], precision: &[f64]) -> f64 {
    // append sentinel values at both ends
    let mrec: Vec<f64> = [0.0]
        .into_iter()
        .chain(recall.iter().copied())
        .chain([1.0])
        .collect();
    let mut mpre: Vec<f64> = [0.0]
        .into_iter()
        .chain(precision.iter().copied())
        .chain([0.0])
        .collect();

    // precision envelope
    for index in (0..(mpre.len() - 1)).rev() {
        mpre[index] = mpre[index].max(mpre[index + 1]);
    }

    // sum (\Delta recall) * prec where recall changes
    mrec.iter()
        .tuple_windows()
        .zip(&mpre[1..])
        .filter(|((prev, next), _)| prev != next)
        .map(|((prev, next), prec)| (next - prev) * prec)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ap_empty_curve() {
        assert_abs_diff_eq!(voc_ap(&[], &[], ApMetric::Voc07).unwrap(), 0.0);
        assert_abs_diff_eq!(voc_ap(&[], &[], ApMetric::Area).unwrap(), 0.0);
    }

    #[test]
    fn ap_perfect_curve() {
        let recall = [0.5, 1.0];
        let precision = [1.0, 1.0];
        assert_abs_diff_eq!(voc_ap(&recall, &precision, ApMetric::Voc07).unwrap(), 1.0);
        assert_abs_diff_eq!(voc_ap(&recall, &precision, ApMetric::Area).unwrap(), 1.0);
    }

    #[test]
    fn ap_half_recall() {
        // one of two objects found by the top detection, then a false positive
        let recall = [0.5, 0.5];
        let precision = [1.0, 0.5];

        // thresholds 0.0..=0.5 reach precision 1, the rest get nothing
        let ap07 = voc_ap(&recall, &precision, ApMetric::Voc07).unwrap();
        assert_abs_diff_eq!(ap07, 6.0 / 11.0, epsilon = 1e-12);

        let area = voc_ap(&recall, &precision, ApMetric::Area).unwrap();
        assert_abs_diff_eq!(area, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn ap_envelope_uses_later_precision() {
        // precision rises after a false positive
        let recall = [1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];
        let precision = [1.0, 0.5, 2.0 / 3.0, 0.75];

        let area = voc_ap(&recall, &precision, ApMetric::Area).unwrap();
        let expect = 1.0 / 3.0 * 1.0 + 1.0 / 3.0 * 0.75 + 1.0 / 3.0 * 0.75;
        assert_abs_diff_eq!(area, expect, epsilon = 1e-12);
    }

    #[test]
    fn ap_length_mismatch() {
        assert!(voc_ap(&[0.5], &[], ApMetric::Voc07).is_err());
    }
}
