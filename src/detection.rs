use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// One tracked object reported by the detector for a single frame.
///
/// `bbox` holds the two diagonal corners in pixel coordinates, `mask` is the
/// segmentation outline when the detector ran in segmentation mode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    #[serde(rename = "id")]
    pub track_id: u64,
    #[serde(rename = "c")]
    pub label: String,
    #[serde(rename = "p")]
    pub confidence: f32,
    pub bbox: BBox<Ltrb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<[i32; 2]>>,
}

impl Detection {
    pub fn new(track_id: u64, label: &str, confidence: f32, bbox: BBox<Ltrb>) -> Self {
        Self {
            track_id,
            label: label.to_string(),
            confidence,
            bbox,
            mask: None,
        }
    }

    #[inline]
    pub fn with_mask(mut self, mask: Vec<[i32; 2]>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Checks the event is usable: finite confidence within [0, 1] and a finite,
    /// non-inverted box with positive area.
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && self.bbox.is_finite()
            && !self.bbox.is_degenerate()
    }
}
