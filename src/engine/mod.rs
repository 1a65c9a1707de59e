//! Seam to the label detection engine.
//!
//! The engine owns modes, data capture views and overlays. The bridge only forwards
//! settings to it and reports its verdicts back to the host unchanged.

mod in_memory;

pub use in_memory::{InMemoryLabelEngine, ModeState, ViewOverlays};

use serde_json::Value;

use crate::{
    error::BridgeError,
    identifier::{DataCaptureViewId, ModeId},
};

/// An engine refusal, carried to the host verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl From<EngineError> for BridgeError {
    fn from(err: EngineError) -> Self {
        BridgeError::EngineRejected(err.0)
    }
}

pub type EngineResult<T = ()> = Result<T, EngineError>;

pub trait LabelCaptureEngine: Send + Sync {
    /// Default configuration handed to the host on start-up.
    fn defaults(&self) -> Value;

    fn has_data_capture_view(&self, view_id: DataCaptureViewId) -> bool;

    fn set_mode_enabled(&self, mode_id: ModeId, enabled: bool) -> EngineResult;

    fn apply_mode_settings(&self, mode_id: ModeId, settings_json: &str) -> EngineResult;

    fn update_feedback(&self, mode_id: ModeId, feedback_json: &str) -> EngineResult;

    fn update_advanced_overlay(
        &self,
        view_id: DataCaptureViewId,
        overlay_json: &str,
    ) -> EngineResult;

    fn update_basic_overlay(&self, view_id: DataCaptureViewId, overlay_json: &str) -> EngineResult;

    fn update_validation_flow_overlay(
        &self,
        view_id: DataCaptureViewId,
        overlay_json: &str,
    ) -> EngineResult;
}
