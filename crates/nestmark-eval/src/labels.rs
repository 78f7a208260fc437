//! Ground-truth boxes per image.
//!
//! Labels usually arrive as a Label Studio CSV export: one row per image,
//! an `image` column holding the uploaded file name and a `label` column
//! holding a JSON array of rectangles given in percent of the original
//! image size. [`LabelTable::import_csv`] converts those into pixel boxes
//! keyed by the image path on disk.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use nestmark_core::BoundingBox;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("label file has no `{column}` column")]
    MissingColumn { column: &'static str },
    #[error("row {row}: invalid label json: {source}")]
    BadLabel {
        row: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("row {row}: invalid image name {name:?}")]
    BadImageName { row: usize, name: String },
}

/// A rectangle expressed in percent of the original image dimensions.
///
/// Unknown fields of the export (ids, rotation, class names) are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub original_width: f64,
    pub original_height: f64,
}

impl PercentRect {
    pub fn to_pixels(&self) -> BoundingBox {
        let sx = self.original_width / 100.0;
        let sy = self.original_height / 100.0;
        BoundingBox::new(
            self.x * sx,
            (self.x + self.width) * sx,
            self.y * sy,
            (self.y + self.height) * sy,
        )
    }
}

/// How the `image` column maps onto a file name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageNaming {
    /// Drop the `<hash>-` prefix the labeling tool adds on upload.
    #[default]
    StripUploadPrefix,
    /// Use the file name as is.
    Verbatim,
}

impl ImageNaming {
    /// File name on disk for an `image` cell, or `None` when nothing is left.
    ///
    /// Any leading directories are dropped first.
    pub fn file_name(self, cell: &str) -> Option<String> {
        let base = cell.rsplit(['/', '\\']).next().unwrap_or(cell).trim();
        let name = match self {
            ImageNaming::Verbatim => base,
            ImageNaming::StripUploadPrefix => match base.split_once('-') {
                Some((_, rest)) => rest,
                None => base,
            },
        };
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Mapping from image path to its ground-truth boxes in pixels.
///
/// Iteration is ordered by path, which fixes the processing order of a run.
/// Images with an empty label list are kept and score every detection as a
/// false positive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelTable {
    entries: BTreeMap<PathBuf, Vec<BoundingBox>>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image, keeping any boxes it already has.
    pub fn add_image(&mut self, image: impl Into<PathBuf>) {
        self.entries.entry(image.into()).or_default();
    }

    pub fn insert(&mut self, image: impl Into<PathBuf>, bbox: BoundingBox) {
        self.entries.entry(image.into()).or_default().push(bbox);
    }

    /// Ground truth for `image`; empty for unknown images.
    pub fn boxes(&self, image: &Path) -> &[BoundingBox] {
        self.entries.get(image).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, image: &Path) -> bool {
        self.entries.contains_key(image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of ground-truth boxes.
    pub fn num_boxes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[BoundingBox])> {
        self.entries
            .iter()
            .map(|(path, boxes)| (path.as_path(), boxes.as_slice()))
    }

    /// Fold another table into this one, concatenating boxes per image.
    pub fn merge(&mut self, other: LabelTable) {
        for (path, boxes) in other.entries {
            self.entries.entry(path).or_default().extend(boxes);
        }
    }

    /// Read a CSV export from `reader`; image paths are `image_dir/<name>`.
    ///
    /// Returns the number of rows read.
    pub fn import_csv<R: Read>(
        &mut self,
        reader: R,
        image_dir: &Path,
        naming: ImageNaming,
    ) -> Result<usize, LabelError> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();
        let column = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or(LabelError::MissingColumn { column })
        };
        let image_col = column("image")?;
        let label_col = column("label")?;

        let mut rows = 0;
        for (row, record) in csv.records().enumerate() {
            let record = record?;
            let cell = record.get(image_col).unwrap_or_default();
            let name = naming
                .file_name(cell)
                .ok_or_else(|| LabelError::BadImageName {
                    row,
                    name: cell.to_string(),
                })?;
            let path = image_dir.join(name);

            let raw = record.get(label_col).unwrap_or_default().trim();
            let rects: Vec<PercentRect> = if raw.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(raw).map_err(|source| LabelError::BadLabel { row, source })?
            };

            self.add_image(path.clone());
            for rect in &rects {
                self.insert(path.clone(), rect.to_pixels());
            }
            rows += 1;
        }
        log::debug!(
            "imported {rows} label rows for {}",
            image_dir.display()
        );
        Ok(rows)
    }

    /// Open `csv_path` and import it; see [`LabelTable::import_csv`].
    pub fn import_csv_file(
        &mut self,
        csv_path: &Path,
        image_dir: &Path,
        naming: ImageNaming,
    ) -> Result<usize, LabelError> {
        let file = File::open(csv_path)?;
        self.import_csv(file, image_dir, naming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EXPORT: &str = r#"image,id,label
/data/upload/3/1f2e3d4c-frame_001.jpg,1,"[{""x"": 10, ""y"": 20, ""width"": 30, ""height"": 40, ""original_width"": 200, ""original_height"": 100, ""rotation"": 0}]"
/data/upload/3/9a8b7c6d-frame_002.jpg,2,[]
"#;

    #[test]
    fn percent_rect_converts_to_pixels() {
        let rect = PercentRect {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            original_width: 200.0,
            original_height: 100.0,
        };
        let b = rect.to_pixels();
        assert_relative_eq!(b.xmin, 20.0);
        assert_relative_eq!(b.xmax, 80.0);
        assert_relative_eq!(b.ymin, 20.0);
        assert_relative_eq!(b.ymax, 60.0);
    }

    #[test]
    fn naming_rules() {
        let strip = ImageNaming::StripUploadPrefix;
        assert_eq!(strip.file_name("ab12cd34-img-7.png").as_deref(), Some("img-7.png"));
        assert_eq!(strip.file_name("/data/upload/ab-x.png").as_deref(), Some("x.png"));
        assert_eq!(strip.file_name("plain.png").as_deref(), Some("plain.png"));
        assert_eq!(strip.file_name("abc-"), None);
        assert_eq!(
            ImageNaming::Verbatim.file_name("ab12cd34-img.png").as_deref(),
            Some("ab12cd34-img.png")
        );
    }

    #[test]
    fn csv_export_is_imported() {
        let mut table = LabelTable::new();
        let rows = table
            .import_csv(EXPORT.as_bytes(), Path::new("set1"), ImageNaming::default())
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.num_boxes(), 1);

        let boxes = table.boxes(Path::new("set1/frame_001.jpg"));
        assert_eq!(boxes.len(), 1);
        assert_relative_eq!(boxes[0].xmax, 80.0);
        assert!(table.contains(Path::new("set1/frame_002.jpg")));
        assert!(table.boxes(Path::new("set1/frame_002.jpg")).is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let mut table = LabelTable::new();
        let err = table
            .import_csv("image,id\na-b.png,1\n".as_bytes(), Path::new("."), ImageNaming::default())
            .unwrap_err();
        assert!(matches!(err, LabelError::MissingColumn { column: "label" }));
    }

    #[test]
    fn bad_label_json_names_the_row() {
        let mut table = LabelTable::new();
        let err = table
            .import_csv(
                "image,label\na-b.png,[]\nc-d.png,not json\n".as_bytes(),
                Path::new("."),
                ImageNaming::default(),
            )
            .unwrap_err();
        assert!(matches!(err, LabelError::BadLabel { row: 1, .. }));
    }

    #[test]
    fn merge_concatenates_and_orders_by_path() {
        let mut a = LabelTable::new();
        a.insert("z.png", BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        let mut b = LabelTable::new();
        b.insert("z.png", BoundingBox::new(2.0, 3.0, 2.0, 3.0));
        b.insert("a.png", BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        a.merge(b);

        let order: Vec<_> = a.iter().map(|(p, boxes)| (p.to_path_buf(), boxes.len())).collect();
        assert_eq!(
            order,
            vec![(PathBuf::from("a.png"), 1), (PathBuf::from("z.png"), 2)]
        );
    }

    #[test]
    fn unknown_image_has_no_boxes() {
        assert!(LabelTable::new().boxes(Path::new("missing.png")).is_empty());
    }
}
