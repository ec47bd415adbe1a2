//! PASCAL VOC detection evaluation.
//!
//! The evaluator follows the VOC devkit protocol: detections are matched
//! greedily to ground truth in descending score order, a ground truth box
//! can be matched at most once, and boxes marked difficult neither count as
//! positives nor penalize detections that hit them.

mod common;

pub mod ap;
pub use ap::*;

pub mod eval;
pub use eval::*;

pub mod record;
pub use record::*;

pub mod writer;
pub use writer::*;
