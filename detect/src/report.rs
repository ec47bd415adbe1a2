//! Evaluation output written to the terminal and the output directory.

use crate::common::*;
use prettytable::{cell, row, Table};
use voc_eval::{write_detection_files, write_summary};

/// File name of the JSON evaluation summary.
pub const SUMMARY_FILE: &str = "ap_results.json";

/// Tabulate the per-class APs followed by the mean AP.
pub fn ap_table(summary: &EvalSummary) -> Table {
    let format_ap = |ap: Option<f64>| {
        ap.map(|ap| format!("{:.4}", ap))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut table = Table::new();
    table.add_row(row!["class", "positives", "detections", "TP", "FP", "AP"]);
    summary.classes.iter().for_each(|class| {
        table.add_row(row![
            class.class_name,
            class.num_positives,
            class.num_detections,
            class.true_positives,
            class.false_positives,
            format_ap(class.ap),
        ]);
    });
    table.add_row(row!["mean", "", "", "", "", format_ap(summary.mean_ap)]);
    table
}

/// Save per-class detection files and the evaluation summary under
/// `output_dir`. Returns the paths of all written files.
pub fn save_results(
    output_dir: &Path,
    set_name: &str,
    classes: &IndexSet<String>,
    image_ids: &[String],
    detections: &[ImageDetections],
    summary: &EvalSummary,
) -> Result<Vec<PathBuf>> {
    let class_names: Vec<_> = classes.iter().map(String::as_str).collect();
    let mut paths =
        write_detection_files(output_dir, set_name, &class_names, image_ids, detections)?;

    let summary_path = output_dir.join(SUMMARY_FILE);
    write_summary(&summary_path, summary)?;
    paths.push(summary_path);

    Ok(paths)
}
