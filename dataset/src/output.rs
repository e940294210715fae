//! Writing rendered scenes to disk

use anyhow::Context as _;
use serde::Serialize;
use std::path::{Path, PathBuf};
use synth::core::{ObjectBounds, SyntheticResult};

/// Pixel rectangle of one object; all coordinates are `null` when the
/// object has no visible hull point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectLabel {
    pub name: String,
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
}

impl From<&ObjectBounds> for ObjectLabel {
    fn from(bounds: &ObjectBounds) -> Self {
        let rect = bounds.rect.as_ref();
        Self {
            name: bounds.name.clone(),
            left: rect.map(|r| r.left()),
            top: rect.map(|r| r.top()),
            right: rect.map(|r| r.right()),
            bottom: rect.map(|r| r.bottom()),
        }
    }
}

/// Contents of a `scene_NNNN.json` label file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLabels {
    pub objects: Vec<ObjectLabel>,
}

impl SceneLabels {
    pub fn from_bounds(bounds: &[ObjectBounds]) -> Self {
        Self {
            objects: bounds.iter().map(ObjectLabel::from).collect(),
        }
    }
}

/// File stem shared by all outputs of scene `index`
pub fn scene_stem(index: usize) -> String {
    format!("scene_{index:04}")
}

/// Write image, optional segmentation and labels; returns the written paths
pub fn write_scene(
    output_dir: &Path,
    index: usize,
    result: &SyntheticResult,
) -> anyhow::Result<Vec<PathBuf>> {
    let stem = scene_stem(index);
    let mut written = Vec::with_capacity(3);

    let image_path = output_dir.join(format!("{stem}.png"));
    result
        .image
        .save_png(&image_path)
        .with_context(|| format!("failed to write {}", image_path.display()))?;
    written.push(image_path);

    if let Some(segmentation) = &result.segmentation {
        let path = output_dir.join(format!("{stem}_segmentation.png"));
        segmentation
            .save_png(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    let labels_path = output_dir.join(format!("{stem}.json"));
    let labels = serde_json::to_string_pretty(&SceneLabels::from_bounds(&result.bounding_rects))?;
    std::fs::write(&labels_path, labels)
        .with_context(|| format!("failed to write {}", labels_path.display()))?;
    written.push(labels_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use synth::core::result::{Image, SegmentationMap};
    use synth::core::BoundingRect;

    fn sample_result(with_segmentation: bool) -> SyntheticResult {
        let image = Image::rgb_from_rgba(&[255, 0, 0, 255, 0, 255, 0, 255], 2, 1);
        let segmentation =
            with_segmentation.then(|| SegmentationMap::from_rgba(&[5, 0, 0, 255, 0, 0, 0, 255], 2, 1));
        let bounds = vec![
            ObjectBounds {
                name: "duck".into(),
                rect: Some(BoundingRect {
                    bottom_left: Vec2::new(10.0, 40.0),
                    top_right: Vec2::new(30.0, 20.0),
                }),
            },
            ObjectBounds {
                name: "hidden".into(),
                rect: None,
            },
        ];
        SyntheticResult::new(image, segmentation, bounds)
    }

    #[test]
    fn test_scene_stem() {
        assert_eq!(scene_stem(7), "scene_0007");
        assert_eq!(scene_stem(12345), "scene_12345");
    }

    #[test]
    fn test_labels_json() {
        let labels = SceneLabels::from_bounds(&sample_result(false).bounding_rects);
        let json = serde_json::to_value(&labels).unwrap();

        assert_eq!(json["objects"][0]["name"], "duck");
        assert_eq!(json["objects"][0]["left"], 10.0);
        assert_eq!(json["objects"][0]["top"], 20.0);
        assert_eq!(json["objects"][0]["right"], 30.0);
        assert_eq!(json["objects"][0]["bottom"], 40.0);
        assert!(json["objects"][1]["left"].is_null());
    }

    #[test]
    fn test_write_scene_files() {
        let dir = tempfile::tempdir().unwrap();

        let written = write_scene(dir.path(), 3, &sample_result(true)).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["scene_0003.png", "scene_0003_segmentation.png", "scene_0003.json"]
        );
        assert!(written.iter().all(|p| p.is_file()));

        let written = write_scene(dir.path(), 4, &sample_result(false)).unwrap();
        assert_eq!(written.len(), 2);
    }
}
