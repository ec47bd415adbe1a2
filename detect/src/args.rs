//! Command line arguments.

use crate::common::*;
use clap::{ArgEnum, Parser};

/// The manifest entry holding the validation set.
pub const VALIDATION_MANIFEST: &str = "val";

#[derive(Debug, Clone, Parser)]
/// Test a trained Faster-RCNN model on a PASCAL VOC validation set, one
/// image at a time, and report mean average precision.
pub struct Args {
    #[clap(long = "model_file", alias = "model-file")]
    /// serialized model parameters
    pub model_file: Option<PathBuf>,

    #[clap(long)]
    /// normalize the final bounding box regression layer
    pub normalize: bool,

    #[clap(long = "output_dir", alias = "output-dir")]
    /// directory to save AP metric results, default is [data_dir]/frcn_output
    pub output_dir: Option<PathBuf>,

    #[clap(long, default_value_t = 1000)]
    /// width of input image
    pub width: i64,

    #[clap(long, default_value_t = 1000)]
    /// height of input image
    pub height: i64,

    #[clap(long = "data_dir", alias = "data-dir", default_value = "data")]
    /// dataset root directory
    pub data_dir: PathBuf,

    #[clap(long)]
    /// manifest files in NAME:PATH form, the 'val' entry is required
    pub manifest: Vec<ManifestArg>,

    #[clap(long = "batch_size", alias = "batch-size", default_value_t = 1)]
    /// batch size, only 1 is supported
    pub batch_size: usize,

    #[clap(long, arg_enum)]
    /// compute backend, GPU is used when available if omitted
    pub backend: Option<Backend>,

    #[clap(long = "device_id", alias = "device-id", default_value_t = 0)]
    /// CUDA device index
    pub device_id: usize,

    #[clap(long = "classes_file", alias = "classes-file")]
    /// class list file, one name per line, the VOC classes if omitted
    pub classes_file: Option<PathBuf>,

    #[clap(long = "config_file", alias = "config-file")]
    /// JSON5 file of inference hyper-parameters
    pub config_file: Option<PathBuf>,
}

/// A named manifest path given as `NAME:PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestArg {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for ManifestArg {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (name, path) = text
            .split_once(':')
            .ok_or_else(|| format_err!("expect NAME:PATH, but get '{}'", text))?;
        ensure!(!name.is_empty(), "manifest name must not be empty in '{}'", text);
        ensure!(!path.is_empty(), "manifest path must not be empty in '{}'", text);

        Ok(Self {
            name: name.to_owned(),
            path: PathBuf::from(path),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
pub enum Backend {
    Cpu,
    Gpu,
}

impl Backend {
    /// Resolve the backend to a torch device. `None` picks the first
    /// available GPU and falls back to the CPU.
    pub fn device(backend: Option<Self>, device_id: usize) -> Result<Device> {
        let device = match backend {
            Some(Self::Cpu) => Device::Cpu,
            Some(Self::Gpu) => {
                ensure!(
                    tch::Cuda::is_available(),
                    "GPU backend requested but CUDA is not available"
                );
                Device::Cuda(device_id)
            }
            None if tch::Cuda::is_available() => Device::Cuda(device_id),
            None => Device::Cpu,
        };
        Ok(device)
    }
}

/// Arguments after validation.
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub model_file: PathBuf,
    pub normalize: bool,
    pub output_dir: PathBuf,
    pub image_size: HW<i64>,
    pub data_dir: PathBuf,
    pub val_manifest: PathBuf,
    pub backend: Option<Backend>,
    pub device_id: usize,
    pub classes_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl Args {
    /// Check argument constraints and fill in derived defaults.
    pub fn check(self) -> Result<InferenceOptions> {
        let Self {
            model_file,
            normalize,
            output_dir,
            width,
            height,
            data_dir,
            manifest,
            batch_size,
            backend,
            device_id,
            classes_file,
            config_file,
        } = self;

        let model_file =
            model_file.ok_or_else(|| format_err!("Model file required for Faster-RCNN testing"))?;
        let val_manifest = manifest
            .into_iter()
            .find(|entry| entry.name == VALIDATION_MANIFEST)
            .map(|entry| entry.path)
            .ok_or_else(|| format_err!("Path to manifest file required"))?;
        ensure!(batch_size == 1, "Faster-RCNN only supports batch size 1");
        ensure!(
            width > 0 && height > 0,
            "image width and height must be positive, but get {}x{}",
            width,
            height
        );

        let output_dir = output_dir.unwrap_or_else(|| data_dir.join("frcn_output"));

        Ok(InferenceOptions {
            model_file,
            normalize,
            output_dir,
            image_size: HW::from_hw([height, width]),
            data_dir,
            val_manifest,
            backend,
            device_id,
            classes_file,
            config_file,
        })
    }
}
