use crate::{
    common::*,
    eval::EvalSummary,
    record::ImageDetections,
};

/// Write one detection file per object class in the VOC devkit layout.
///
/// Each file is named `comp4_det_{set_name}_{class}.txt` and holds lines of
/// `image_id score x1 y1 x2 y2` with 1-based pixel coordinates. Returns the
/// paths of the written files in class order.
pub fn write_detection_files<S, I>(
    output_dir: impl AsRef<Path>,
    set_name: &str,
    classes: &[S],
    image_ids: &[I],
    detections: &[ImageDetections],
) -> Result<Vec<PathBuf>>
where
    S: AsRef<str>,
    I: AsRef<str>,
{
    let output_dir = output_dir.as_ref();
    ensure!(
        image_ids.len() == detections.len(),
        "got {} image ids for {} images",
        image_ids.len(),
        detections.len()
    );
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create directory '{}'", output_dir.display()))?;

    classes
        .iter()
        .enumerate()
        .skip(1)
        .map(|(class_index, class_name)| -> Result<_> {
            let path = output_dir.join(format!(
                "comp4_det_{}_{}.txt",
                set_name,
                class_name.as_ref()
            ));
            let file = File::create(&path)
                .with_context(|| format!("failed to create file '{}'", path.display()))?;
            let mut writer = BufWriter::new(file);

            for (image_id, dets) in image_ids.iter().zip(detections) {
                for det in dets.iter().filter(|det| det.class == class_index) {
                    let [x1, y1, x2, y2] = det.rect.xyxy();
                    writeln!(
                        writer,
                        "{} {:.3} {:.1} {:.1} {:.1} {:.1}",
                        image_id.as_ref(),
                        det.score,
                        x1 + 1.0,
                        y1 + 1.0,
                        x2 + 1.0,
                        y2 + 1.0
                    )?;
                }
            }
            writer.flush()?;

            Ok(path)
        })
        .try_collect()
}

/// Save the evaluation summary as pretty-printed JSON.
pub fn write_summary(path: impl AsRef<Path>, summary: &EvalSummary) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)
        .with_context(|| format!("failed to write summary to '{}'", path.display()))?;
    writer.flush()?;
    Ok(())
}
