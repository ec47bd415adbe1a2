pub use anyhow::{ensure, Context, Result};
pub use bbox::{prelude::*, TLBR};
pub use itertools::{izip, Itertools};
pub use label::ScoredLabel;
pub use log::{info, warn};
pub use serde::{Deserialize, Serialize};
pub use std::{
    cmp::Ordering,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
