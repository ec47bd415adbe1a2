use crate::common::*;

pub use anchor::*;
pub use detection::*;
pub use normalization::*;
pub use preprocess::*;
pub use proposal::*;

pub static CONFIG_VERSION: Lazy<VersionReq> = Lazy::new(|| VersionReq::parse("0.1.0").unwrap());

/// Per-channel BGR means of the images the network was trained on.
pub const FRCN_PIXEL_MEANS: [f64; 3] = [102.9801, 115.9465, 122.7717];

/// Inference hyper-parameters.
///
/// Every section falls back to its defaults when omitted from the
/// configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: Version,
    #[serde(default)]
    pub anchor: AnchorConfig,
    #[serde(default)]
    pub proposal: ProposalConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub normalization: BboxNormalization,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub eval: EvalOptions,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: Version::new(0, 1, 0),
            anchor: Default::default(),
            proposal: Default::default(),
            detection: Default::default(),
            normalization: Default::default(),
            preprocess: Default::default(),
            eval: Default::default(),
        }
    }
}

mod anchor {
    use super::*;

    /// Reference anchor options of the region proposal network.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AnchorConfig {
        /// Side length of the base anchor in input pixels.
        pub base_size: usize,
        /// Height to width ratios.
        pub ratios: Vec<R64>,
        /// Scales applied to every ratio anchor.
        pub scales: Vec<R64>,
        /// Distance between neighboring feature cells in input pixels.
        pub feat_stride: usize,
    }

    impl AnchorConfig {
        pub fn num_anchors(&self) -> usize {
            self.ratios.len() * self.scales.len()
        }
    }

    impl Default for AnchorConfig {
        fn default() -> Self {
            Self {
                base_size: 16,
                ratios: vec![r64(0.5), r64(1.0), r64(2.0)],
                scales: vec![r64(8.0), r64(16.0), r64(32.0)],
                feat_stride: 16,
            }
        }
    }
}

mod proposal {
    use super::*;

    /// Proposal layer options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ProposalConfig {
        /// The number of top scoring boxes kept before NMS.
        pub pre_nms_top_n: usize,
        /// The number of boxes kept after NMS.
        pub post_nms_top_n: usize,
        pub nms_threshold: R64,
        /// Minimum box side length, in original image pixels.
        pub min_size: R64,
    }

    impl Default for ProposalConfig {
        fn default() -> Self {
            Self {
                pre_nms_top_n: 6000,
                post_nms_top_n: 300,
                nms_threshold: r64(0.7),
                min_size: r64(16.0),
            }
        }
    }
}

mod detection {
    use super::*;

    /// Options to turn class scores into detections.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct DetectionConfig {
        /// Maximum detections per image over all classes.
        pub max_per_image: usize,
        /// Minimum class score of a detection.
        pub score_threshold: R64,
        pub nms_threshold: R64,
    }

    impl Default for DetectionConfig {
        fn default() -> Self {
            Self {
                max_per_image: 100,
                score_threshold: r64(0.001),
                nms_threshold: r64(0.3),
            }
        }
    }
}

mod normalization {
    use super::*;

    /// Statistics of the box regression targets used in training, in
    /// `[dx, dy, dw, dh]` order.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct BboxNormalization {
        pub means: [f64; 4],
        pub stds: [f64; 4],
    }

    impl Default for BboxNormalization {
        fn default() -> Self {
            Self {
                means: [0.0, 0.0, 0.0, 0.0],
                stds: [0.1, 0.1, 0.2, 0.2],
            }
        }
    }
}

mod preprocess {
    use super::*;

    /// Input image preprocessing options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PreprocessConfig {
        /// Means subtracted from the B, G and R channels.
        pub pixel_means: [f64; 3],
    }

    impl Default for PreprocessConfig {
        fn default() -> Self {
            Self {
                pixel_means: FRCN_PIXEL_MEANS,
            }
        }
    }
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let version = Version::parse(&text).map_err(|err| {
        D::Error::custom(format!(
            "failed to parse version number '{}': {:?}",
            text, err
        ))
    })?;

    if !CONFIG_VERSION.matches(&version) {
        return Err(D::Error::custom(format!(
            "incompatible version: get '{}', but it is incompatible with requirement '{}'",
            version, &*CONFIG_VERSION,
        )));
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voc_eval::ApMetric;

    #[test]
    fn config_partial_file() {
        let text = r#"{
            version: "0.1.0",
            detection: { max_per_image: 50, nms_threshold: 0.4 },
            eval: { metric: "area" },
        }"#;
        let config: Config = json5::from_str(text).unwrap();
        assert_eq!(config.detection.max_per_image, 50);
        assert_eq!(config.detection.nms_threshold, r64(0.4));
        assert_eq!(config.eval.metric, ApMetric::Area);

        // omitted fields of a section use defaults
        assert_eq!(config.detection.score_threshold, r64(0.001));
        assert_eq!(config.eval.iou_threshold, 0.5);

        // omitted sections use defaults
        assert_eq!(config.proposal.post_nms_top_n, 300);
        assert_eq!(config.anchor.num_anchors(), 9);
        assert_eq!(config.preprocess.pixel_means, FRCN_PIXEL_MEANS);
    }

    #[test]
    fn config_incompatible_version() {
        let text = r#"{ version: "2.0.0" }"#;
        assert!(json5::from_str::<Config>(text).is_err());
    }

    #[test]
    fn config_missing_version() {
        assert!(json5::from_str::<Config>("{}").is_err());
    }

    #[test]
    fn config_defaults_match_script() {
        let config = Config::default();
        assert!(CONFIG_VERSION.matches(&config.version));
        assert_eq!(config.detection.max_per_image, 100);
        assert_eq!(config.detection.score_threshold, r64(0.001));
        assert_eq!(config.detection.nms_threshold, r64(0.3));
        assert_eq!(config.normalization.stds, [0.1, 0.1, 0.2, 0.2]);
        assert_eq!(config.eval.metric, ApMetric::Voc07);
    }
}
