use serde::{Deserialize, Serialize};

use crate::identifier::TrackingId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Quadrilateral {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode_data: Option<String>,
}

/// A label the engine is currently tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedLabel {
    pub tracking_id: TrackingId,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<LabelField>,
    #[serde(default)]
    pub location: Quadrilateral,
}

/// One session update from the engine: every label tracked in this frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelCaptureSession {
    pub frame_sequence_id: u64,
    pub captured_labels: Vec<CapturedLabel>,
}

impl LabelCaptureSession {
    pub fn tracking_ids(&self) -> impl Iterator<Item = TrackingId> + '_ {
        self.captured_labels.iter().map(|label| label.tracking_id)
    }
}
