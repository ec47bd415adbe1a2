//! PASCAL VOC validation set described by a manifest file.

use crate::common::*;

pub use annotation::*;
pub use classes::*;
pub use manifest::*;

mod classes {
    use super::*;

    pub const BACKGROUND_CLASS: &str = "__background__";

    /// The 20 PASCAL VOC object classes.
    pub const VOC_CLASSES: [&str; 20] = [
        "aeroplane",
        "bicycle",
        "bird",
        "boat",
        "bottle",
        "bus",
        "car",
        "cat",
        "chair",
        "cow",
        "diningtable",
        "dog",
        "horse",
        "motorbike",
        "person",
        "pottedplant",
        "sheep",
        "sofa",
        "train",
        "tvmonitor",
    ];

    /// The VOC class list with the background class at index 0.
    pub fn voc_classes() -> IndexSet<String> {
        [BACKGROUND_CLASS]
            .into_iter()
            .chain(VOC_CLASSES)
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Load a class list, one name per line.
    ///
    /// Blank lines are skipped and the background class is put at index 0
    /// if the file does not list it first.
    pub fn load_classes_file<P>(path: P) -> Result<IndexSet<String>>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read classes file '{}'", path.display()))?;
        let lines: Vec<_> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        ensure!(
            !lines.is_empty(),
            "no classes found in '{}'",
            path.display()
        );

        let with_background = lines.first() == Some(&BACKGROUND_CLASS);
        let num_lines = lines.len();
        let classes: IndexSet<String> = (!with_background)
            .then(|| BACKGROUND_CLASS)
            .into_iter()
            .chain(lines)
            .map(ToOwned::to_owned)
            .collect();
        let expect_len = if with_background {
            num_lines
        } else {
            num_lines + 1
        };
        ensure!(
            classes.len() == expect_len,
            "duplicated class names found in '{}'",
            path.display()
        );
        ensure!(
            classes.len() > 1,
            "no object classes found in '{}'",
            path.display()
        );

        Ok(classes)
    }
}

mod manifest {
    use super::*;

    /// An image and its annotation file.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ManifestEntry {
        pub image_path: PathBuf,
        pub annotation_path: PathBuf,
    }

    /// Parse manifest text.
    ///
    /// Lines starting with `@` are headers. Other non-blank lines must hold
    /// an image path and an annotation path separated by a tab.
    pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('@')
            })
            .map(|(line_index, line)| -> Result<_> {
                let fields: Vec<_> = line.trim_end_matches('\r').split('\t').collect();
                let (image_path, annotation_path) = match fields.as_slice() {
                    [image, annotation] if !image.is_empty() && !annotation.is_empty() => {
                        (image.trim(), annotation.trim())
                    }
                    _ => bail!(
                        "line {}: expect an image path and an annotation path separated by a tab",
                        line_index + 1
                    ),
                };
                Ok(ManifestEntry {
                    image_path: PathBuf::from(image_path),
                    annotation_path: PathBuf::from(annotation_path),
                })
            })
            .try_collect()
    }

    /// Resolve a relative path against the candidate directories in order.
    ///
    /// The first existing candidate wins. When none exists the path is
    /// joined to the first directory.
    pub fn resolve_path(path: &Path, dirs: &[&Path]) -> PathBuf {
        if path.is_absolute() {
            return path.to_owned();
        }
        dirs.iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .or_else(|| dirs.first().map(|dir| dir.join(path)))
            .unwrap_or_else(|| path.to_owned())
    }
}

mod annotation {
    use super::*;

    /// Image annotation in PASCAL VOC layout.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Annotation {
        pub objects: Vec<Object>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Object {
        pub name: String,
        pub difficult: bool,
        pub bndbox: BndBox,
    }

    /// Box corners in 1-based inclusive pixel coordinates.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    pub struct BndBox {
        pub xmin: f64,
        pub ymin: f64,
        pub xmax: f64,
        pub ymax: f64,
    }

    impl Annotation {
        /// Load a `.xml` or `.json` annotation file.
        pub fn open<P>(path: P) -> Result<Self>
        where
            P: AsRef<Path>,
        {
            let path = path.as_ref();
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read annotation file '{}'", path.display()))?;
            let is_json = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false);

            let annotation = if is_json {
                Self::from_json_str(&text)
            } else {
                Self::from_xml_str(&text)
            };
            annotation
                .with_context(|| format!("failed to parse annotation file '{}'", path.display()))
        }

        pub fn from_xml_str(text: &str) -> Result<Self> {
            let raw: xml::Annotation = serde_xml_rs::from_str(text)?;
            Ok(Self {
                objects: raw
                    .object
                    .into_iter()
                    .map(|obj| Object {
                        name: obj.name.trim().to_owned(),
                        difficult: obj.difficult.unwrap_or(0) != 0,
                        bndbox: obj.bndbox,
                    })
                    .collect(),
            })
        }

        pub fn from_json_str(text: &str) -> Result<Self> {
            let raw: json::Annotation = serde_json::from_str(text)?;
            Ok(Self {
                objects: raw
                    .object
                    .into_iter()
                    .map(|obj| Object {
                        name: obj.name.trim().to_owned(),
                        difficult: obj.difficult,
                        bndbox: obj.bndbox,
                    })
                    .collect(),
            })
        }

        /// Convert objects into ground truth in 0-based pixel coordinates.
        pub fn to_ground_truth(&self, classes: &IndexSet<String>) -> Result<Vec<GroundTruth>> {
            self.objects
                .iter()
                .map(|obj| -> Result<_> {
                    let class = classes
                        .get_index_of(&obj.name)
                        .filter(|&index| index > 0)
                        .ok_or_else(|| format_err!("unknown class name '{}'", obj.name))?;
                    let BndBox {
                        xmin,
                        ymin,
                        xmax,
                        ymax,
                    } = obj.bndbox;
                    let rect = TLBR::try_from_xyxy([xmin - 1.0, ymin - 1.0, xmax - 1.0, ymax - 1.0])
                        .with_context(|| {
                            format!(
                                "invalid box ({}, {}, {}, {}) of object '{}'",
                                xmin, ymin, xmax, ymax, obj.name
                            )
                        })?;

                    Ok(GroundTruth {
                        rect,
                        class,
                        difficult: obj.difficult,
                    })
                })
                .try_collect()
        }
    }

    mod xml {
        use super::*;

        #[derive(Debug, Deserialize)]
        pub struct Annotation {
            #[serde(default)]
            pub object: Vec<Object>,
        }

        #[derive(Debug, Deserialize)]
        pub struct Object {
            pub name: String,
            #[serde(default)]
            pub difficult: Option<u8>,
            pub bndbox: BndBox,
        }
    }

    mod json {
        use super::*;

        #[derive(Debug, Deserialize)]
        pub struct Annotation {
            #[serde(default)]
            pub object: Vec<Object>,
        }

        #[derive(Debug, Deserialize)]
        pub struct Object {
            pub name: String,
            #[serde(default, deserialize_with = "deserialize_flag")]
            pub difficult: bool,
            pub bndbox: BndBox,
        }
    }

    /// Accept `true`/`false`, `0`/`1` and their string forms.
    fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlagVisitor;

        impl<'de> Visitor<'de> for FlagVisitor {
            type Value = bool;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean, 0 or 1")
            }

            fn visit_bool<E>(self, value: bool) -> Result<bool, E>
            where
                E: DeserializeError,
            {
                Ok(value)
            }

            fn visit_u64<E>(self, value: u64) -> Result<bool, E>
            where
                E: DeserializeError,
            {
                Ok(value != 0)
            }

            fn visit_i64<E>(self, value: i64) -> Result<bool, E>
            where
                E: DeserializeError,
            {
                Ok(value != 0)
            }

            fn visit_str<E>(self, value: &str) -> Result<bool, E>
            where
                E: DeserializeError,
            {
                match value.trim() {
                    "1" | "true" | "True" => Ok(true),
                    "0" | "false" | "False" | "" => Ok(false),
                    other => Err(E::custom(format!("invalid flag value '{}'", other))),
                }
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}

/// An image of the validation set with its ground truth.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Image file stem, e.g. `000001`.
    pub image_id: String,
    pub image_path: PathBuf,
    pub annotation_path: PathBuf,
    pub ground_truth: Vec<GroundTruth>,
}

/// The validation set, loaded eagerly from a manifest file.
#[derive(Debug, Clone)]
pub struct VocDataset {
    classes: IndexSet<String>,
    records: Vec<ImageRecord>,
}

impl VocDataset {
    /// Load the manifest and all annotations it lists.
    ///
    /// Relative paths in the manifest are resolved against the manifest
    /// directory first and `data_dir` second.
    pub fn load<P1, P2>(
        manifest_path: P1,
        data_dir: P2,
        classes: IndexSet<String>,
    ) -> Result<Self>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let data_dir = data_dir.as_ref();
        let manifest_path = resolve_path(manifest_path.as_ref(), &[Path::new("."), data_dir]);
        let text = fs::read_to_string(&manifest_path).with_context(|| {
            format!("failed to read manifest file '{}'", manifest_path.display())
        })?;
        let entries = parse_manifest(&text).with_context(|| {
            format!("failed to parse manifest file '{}'", manifest_path.display())
        })?;
        ensure!(
            !entries.is_empty(),
            "manifest file '{}' lists no images",
            manifest_path.display()
        );
        let manifest_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let records: Vec<_> = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| -> Result<_> {
                let ManifestEntry {
                    image_path,
                    annotation_path,
                } = entry;
                let dirs = [manifest_dir.as_path(), data_dir];
                let image_path = resolve_path(&image_path, &dirs);
                let annotation_path = resolve_path(&annotation_path, &dirs);

                let annotation = Annotation::open(&annotation_path)?;
                let ground_truth = annotation.to_ground_truth(&classes).with_context(|| {
                    format!(
                        "invalid object in annotation file '{}'",
                        annotation_path.display()
                    )
                })?;
                let image_id = image_path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| index.to_string());

                Ok(ImageRecord {
                    image_id,
                    image_path,
                    annotation_path,
                    ground_truth,
                })
            })
            .try_collect()?;

        Ok(Self { classes, records })
    }

    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    /// The number of classes including the background.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
