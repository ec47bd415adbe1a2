pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use bbox::{nms, prelude::*, BoxDelta, Transform, HW, TLBR};
pub use indexmap::IndexSet;
pub use indicatif::ProgressDrawTarget;
pub use itertools::{iproduct, izip, Itertools};
pub use label::ScoredLabel;
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use once_cell::sync::Lazy;
pub use semver::{Version, VersionReq};
pub use serde::{
    de::{Error as DeserializeError, Visitor},
    Deserialize, Deserializer, Serialize,
};
pub use std::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
pub use tch::{nn, vision, Device, Kind, Tensor};
pub use voc_eval::{Detection, EvalOptions, EvalSummary, GroundTruth, ImageDetections};
