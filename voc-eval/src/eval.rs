use crate::{
    ap::{voc_ap, ApMetric},
    common::*,
    record::{validate_inputs, GroundTruth, ImageDetections, PixelBox},
};

/// Evaluation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// A detection hits a ground truth box when their IoU exceeds this value.
    pub iou_threshold: f64,
    pub metric: ApMetric,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            metric: ApMetric::Voc07,
        }
    }
}

/// Evaluation result of a single class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassEval {
    pub class_index: usize,
    pub class_name: String,
    /// The number of non-difficult ground truth objects.
    pub num_positives: usize,
    pub num_detections: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    /// Average precision, absent when the class has no positives.
    pub ap: Option<f64>,
    #[serde(skip)]
    pub recall: Vec<f64>,
    #[serde(skip)]
    pub precision: Vec<f64>,
}

/// Evaluation result over all object classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub options: EvalOptions,
    pub num_images: usize,
    pub classes: Vec<ClassEval>,
    /// Mean of the APs that are defined.
    pub mean_ap: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    TruePositive,
    FalsePositive,
    Ignored,
}

struct GtState<'a> {
    rect: &'a PixelBox,
    difficult: bool,
    matched: bool,
}

/// Evaluate the detections of one class over the whole image set.
///
/// `detections` and `ground_truth` are indexed by image and may contain
/// other classes, which are skipped.
pub fn evaluate_class(
    class_index: usize,
    class_name: &str,
    detections: &[ImageDetections],
    ground_truth: &[Vec<GroundTruth>],
    options: &EvalOptions,
) -> Result<ClassEval> {
    ensure!(
        detections.len() == ground_truth.len(),
        "detections cover {} images, but ground truth covers {} images",
        detections.len(),
        ground_truth.len()
    );
    let EvalOptions {
        iou_threshold,
        metric,
    } = *options;

    // collect ground truth of this class per image
    let mut gt_states: Vec<Vec<GtState>> = ground_truth
        .iter()
        .map(|gts| {
            gts.iter()
                .filter(|gt| gt.class == class_index)
                .map(|gt| GtState {
                    rect: &gt.rect,
                    difficult: gt.difficult,
                    matched: false,
                })
                .collect()
        })
        .collect();
    let num_positives = gt_states
        .iter()
        .flatten()
        .filter(|state| !state.difficult)
        .count();

    // sort detections of this class by descending score
    let mut class_dets: Vec<_> = detections
        .iter()
        .enumerate()
        .flat_map(|(image_index, dets)| {
            dets.iter()
                .filter(|det| det.class == class_index)
                .map(move |det| (image_index, det))
        })
        .collect();
    class_dets.sort_by(|(_, lhs), (_, rhs)| {
        rhs.score
            .partial_cmp(&lhs.score)
            .unwrap_or(Ordering::Equal)
    });

    let outcomes: Vec<Outcome> = class_dets
        .iter()
        .map(|(image_index, det)| {
            let states = &mut gt_states[*image_index];

            // the first ground truth with the highest IoU wins
            let mut best: Option<(f64, usize)> = None;
            for (index, state) in states.iter().enumerate() {
                let iou = det.rect.pixel_iou_with(state.rect);
                if best.map_or(true, |(best_iou, _)| iou > best_iou) {
                    best = Some((iou, index));
                }
            }

            match best {
                Some((iou, index)) if iou > iou_threshold => {
                    let state = &mut states[index];
                    if state.difficult {
                        Outcome::Ignored
                    } else if !state.matched {
                        state.matched = true;
                        Outcome::TruePositive
                    } else {
                        Outcome::FalsePositive
                    }
                }
                _ => Outcome::FalsePositive,
            }
        })
        .collect();

    // cumulative counts over the ranked list
    let (cum_tp, cum_fp): (Vec<usize>, Vec<usize>) = outcomes
        .iter()
        .scan((0, 0), |(tp, fp), outcome| {
            match outcome {
                Outcome::TruePositive => *tp += 1,
                Outcome::FalsePositive => *fp += 1,
                Outcome::Ignored => {}
            }
            Some((*tp, *fp))
        })
        .unzip();
    let true_positives = cum_tp.last().copied().unwrap_or(0);
    let false_positives = cum_fp.last().copied().unwrap_or(0);

    let (recall, precision, ap) = if num_positives > 0 {
        let (recall, precision): (Vec<f64>, Vec<f64>) = izip!(&cum_tp, &cum_fp)
            .map(|(&tp, &fp)| {
                let tp = tp as f64;
                let fp = fp as f64;
                let recall = tp / num_positives as f64;
                let precision = tp / (tp + fp).max(f64::EPSILON);
                (recall, precision)
            })
            .unzip();
        let ap = voc_ap(&recall, &precision, metric)?;
        (recall, precision, Some(ap))
    } else {
        (vec![], vec![], None)
    };

    Ok(ClassEval {
        class_index,
        class_name: class_name.to_owned(),
        num_positives,
        num_detections: class_dets.len(),
        true_positives,
        false_positives,
        ap,
        recall,
        precision,
    })
}

/// Evaluate every object class.
///
/// `classes[0]` is the background class and is not evaluated. Each
/// class AP and the mean AP are logged.
pub fn voc_eval<S>(
    detections: &[ImageDetections],
    ground_truth: &[Vec<GroundTruth>],
    classes: &[S],
    options: &EvalOptions,
) -> Result<EvalSummary>
where
    S: AsRef<str>,
{
    validate_inputs(detections, ground_truth, classes.len())?;

    let class_evals: Vec<ClassEval> = classes
        .iter()
        .enumerate()
        .skip(1)
        .map(|(class_index, name)| -> Result<_> {
            let name = name.as_ref();
            let result = evaluate_class(class_index, name, detections, ground_truth, options)
                .with_context(|| format!("failed to evaluate class '{}'", name))?;

            match result.ap {
                Some(ap) => info!("AP for {} = {:.4}", name, ap),
                None => warn!("no positive ground truth for class '{}', AP skipped", name),
            }

            Ok(result)
        })
        .try_collect()?;

    let defined_aps: Vec<f64> = class_evals.iter().filter_map(|eval| eval.ap).collect();
    let mean_ap = (!defined_aps.is_empty())
        .then(|| defined_aps.iter().sum::<f64>() / defined_aps.len() as f64);

    match mean_ap {
        Some(mean_ap) => info!("Mean AP = {:.4}", mean_ap),
        None => warn!("no class has positive ground truth, mean AP is undefined"),
    }

    Ok(EvalSummary {
        options: options.clone(),
        num_images: detections.len(),
        classes: class_evals,
        mean_ap,
    })
}
