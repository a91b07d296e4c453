use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::DetectionError;

const MSCOCO_LABEL_MAP: &str = include_str!("../../resources/mscoco_label_map.json");

#[derive(Debug, Deserialize)]
struct LabelEntry {
    id: i64,
    display_name: String,
}

/// Class id to display name, read from a `[{"id", "display_name"}]` JSON list.
#[derive(Debug, Clone)]
pub struct LabelMap {
    names: HashMap<i64, String>,
}

impl LabelMap {
    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let entries: Vec<LabelEntry> =
            serde_json::from_str(json).map_err(|e| DetectionError::LabelMap(e.to_string()))?;
        let names = entries
            .into_iter()
            .map(|entry| (entry.id, entry.display_name))
            .collect();
        Ok(Self { names })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectionError> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DetectionError::LabelMap(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }

    /// The MS COCO label map bundled with the crate (80 classes, ids 1 to 90).
    pub fn mscoco() -> Result<Self, DetectionError> {
        Self::from_json(MSCOCO_LABEL_MAP)
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
