//! Progress reporting of the inference loop.

use crate::common::*;
use indicatif::{ProgressBar, ProgressStyle};

pub const PROGRESS_TEMPLATE: &str = "Finished: {pos} / {len}";

/// A single rewritten line `Finished: {done} / {total}` counting processed
/// images.
pub fn image_progress(num_images: usize, target: ProgressDrawTarget) -> Result<ProgressBar> {
    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)?;
    let bar = ProgressBar::with_draw_target(Some(num_images as u64), target).with_style(style);
    Ok(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_counts_images() {
        let bar = image_progress(10, ProgressDrawTarget::hidden()).unwrap();
        assert_eq!(bar.length(), Some(10));
        assert_eq!(bar.position(), 0);

        (0..10).for_each(|_| bar.inc(1));
        bar.finish();
        assert_eq!(bar.position(), 10);
        assert!(bar.is_finished());
    }
}
