//! Faster-RCNN inference and mean average precision evaluation on the
//! PASCAL VOC validation set.

mod common;

pub mod anchors;
pub mod args;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod progress;
pub mod proposal;
pub mod report;

pub use inference::start;
