//! Safe bounding box types and functions.

mod common;

pub use transform::*;
mod transform;

pub use rect::*;
pub mod rect;

pub use tlbr::*;
pub mod tlbr;

pub use cycxhw::*;
pub mod cycxhw;

pub use hw::*;
pub mod hw;

pub use delta::*;
pub mod delta;

pub use nms::*;
pub mod nms;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
