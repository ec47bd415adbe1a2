use crate::{
    args::{Backend, InferenceOptions, VALIDATION_MANIFEST},
    common::*,
    config::Config,
    dataset::{load_classes_file, voc_classes, VocDataset},
    model::FasterRcnn,
    postprocess::get_bboxes,
    preprocess::{PreprocessedImage, Preprocessor},
    progress::image_progress,
    report::{ap_table, save_results},
};

/// Run the model over the validation set one image at a time, then
/// evaluate and save the detections.
pub fn start(options: &InferenceOptions, config: &Config) -> Result<EvalSummary> {
    let InferenceOptions {
        model_file,
        normalize,
        output_dir,
        image_size,
        data_dir,
        val_manifest,
        backend,
        device_id,
        classes_file,
        config_file: _,
    } = options;

    let device = Backend::device(*backend, *device_id)?;
    info!("using device {:?}", device);

    // load dataset
    let classes = match classes_file {
        Some(path) => load_classes_file(path)?,
        None => voc_classes(),
    };
    let dataset = VocDataset::load(val_manifest, data_dir, classes)?;
    let num_images = dataset.len();
    info!(
        "loaded {} images with {} classes",
        num_images,
        dataset.num_classes()
    );

    // load model
    let mut vs = nn::VarStore::new(device);
    let mut model = FasterRcnn::new(&vs.root(), dataset.num_classes(), config)?;
    vs.load(model_file)
        .with_context(|| format!("failed to load model file '{}'", model_file.display()))?;
    vs.freeze();
    info!("loaded model parameters from '{}'", model_file.display());

    if *normalize {
        model.denormalize_bbox_pred(&config.normalization);
        info!("normalized the bounding box regression layer");
    }

    // run inference
    let preprocessor = Preprocessor::new(*image_size, &config.preprocess, device);
    let progress = image_progress(num_images, ProgressDrawTarget::stdout())?;

    let detections: Vec<ImageDetections> = dataset
        .records()
        .iter()
        .map(|record| -> Result<_> {
            let PreprocessedImage {
                tensor,
                im_shape,
                im_scale,
            } = preprocessor.load(&record.image_path)?;
            let output = model
                .forward(&tensor, &im_shape, im_scale)
                .with_context(|| format!("inference failed on image '{}'", record.image_id))?;
            let dets = get_bboxes(&output, &im_shape, im_scale, &config.detection)?;
            debug!(
                "image {}: {} proposals, {} detections",
                record.image_id,
                output.proposals.len(),
                dets.len()
            );

            progress.inc(1);
            Ok(dets)
        })
        .try_collect()?;

    progress.finish();

    // evaluate
    info!("Evaluating detections");
    let ground_truth: Vec<_> = dataset
        .records()
        .iter()
        .map(|record| record.ground_truth.clone())
        .collect();
    let class_names: Vec<_> = dataset.classes().iter().map(String::as_str).collect();
    let summary = voc_eval::voc_eval(&detections, &ground_truth, &class_names, &config.eval)?;
    ap_table(&summary).printstd();

    // save results
    let image_ids: Vec<_> = dataset
        .records()
        .iter()
        .map(|record| record.image_id.clone())
        .collect();
    let paths = save_results(
        output_dir,
        VALIDATION_MANIFEST,
        dataset.classes(),
        &image_ids,
        &detections,
        &summary,
    )?;
    info!(
        "saved {} result files to '{}'",
        paths.len(),
        output_dir.display()
    );

    Ok(summary)
}
