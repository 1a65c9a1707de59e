use std::{
    collections::HashMap,
    sync::{RwLock, RwLockWriteGuard},
};

use serde_json::{json, Map, Value};

use crate::identifier::{DataCaptureViewId, ModeId};

use super::{EngineError, EngineResult, LabelCaptureEngine};

const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeState {
    pub enabled: bool,
    pub settings: Option<Value>,
    pub feedback: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewOverlays {
    pub advanced: Option<Value>,
    pub basic: Option<Value>,
    pub validation_flow: Option<Value>,
}

#[derive(Default)]
struct EngineState {
    modes: HashMap<ModeId, ModeState>,
    views: HashMap<DataCaptureViewId, ViewOverlays>,
}

/// Engine stand-in that keeps modes and overlay configuration in memory.
///
/// It validates what a real engine would parse (ids exist, payloads are JSON
/// objects) and remembers the last accepted value of each.
#[derive(Default)]
pub struct InMemoryLabelEngine {
    state: RwLock<EngineState>,
}

impl InMemoryLabelEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mode(&self, mode_id: ModeId) {
        self.write().modes.entry(mode_id).or_insert(ModeState {
            enabled: true,
            ..Default::default()
        });
        log_info!("registered label capture mode {mode_id}");
    }

    pub fn add_data_capture_view(&self, view_id: DataCaptureViewId) {
        self.write().views.entry(view_id).or_default();
        log_info!("registered data capture view {view_id}");
    }

    pub fn remove_data_capture_view(&self, view_id: DataCaptureViewId) -> bool {
        self.write().views.remove(&view_id).is_some()
    }

    pub fn mode(&self, mode_id: ModeId) -> Option<ModeState> {
        self.read(|state| state.modes.get(&mode_id).cloned())
    }

    pub fn overlays(&self, view_id: DataCaptureViewId) -> Option<ViewOverlays> {
        self.read(|state| state.views.get(&view_id).cloned())
    }

    fn write(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    fn read<T>(&self, f: impl FnOnce(&EngineState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|p| p.into_inner());
        f(&*guard)
    }

    fn with_mode(&self, mode_id: ModeId, f: impl FnOnce(&mut ModeState)) -> EngineResult {
        let mut state = self.write();
        let mode = state
            .modes
            .get_mut(&mode_id)
            .ok_or_else(|| EngineError(format!("no label capture mode with id {mode_id}")))?;
        f(mode);
        Ok(())
    }

    fn with_view(
        &self,
        view_id: DataCaptureViewId,
        f: impl FnOnce(&mut ViewOverlays),
    ) -> EngineResult {
        let mut state = self.write();
        let overlays = state
            .views
            .get_mut(&view_id)
            .ok_or_else(|| EngineError(format!("no data capture view with id {view_id}")))?;
        f(overlays);
        Ok(())
    }
}

fn parse_object(kind: &str, text: &str) -> EngineResult<Value> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| EngineError(format!("failed to parse {kind} JSON: {err}")))?;
    if !value.is_object() {
        return Err(EngineError(format!("{kind} JSON must be an object")));
    }
    Ok(value)
}

impl LabelCaptureEngine for InMemoryLabelEngine {
    fn defaults(&self) -> Value {
        let brush = |fill: &str, stroke: &str| {
            json!({ "fillColor": fill, "strokeColor": stroke, "strokeWidth": 1 })
        };
        let mut basic_overlay = Map::new();
        basic_overlay.insert(
            "DefaultPredictedFieldBrush".into(),
            brush("#FFFFFF33", "#FFFFFFFF"),
        );
        basic_overlay.insert(
            "DefaultCapturedFieldBrush".into(),
            brush("#2EC1CE66", "#2EC1CEFF"),
        );
        basic_overlay.insert("DefaultLabelBrush".into(), brush("#00000000", "#00000000"));

        json!({
            "RecommendedCameraSettings": {
                "preferredResolution": "uhd4k",
                "zoomFactor": 1.0,
                "focusRange": "full"
            },
            "LabelCaptureBasicOverlay": Value::Object(basic_overlay),
            "LabelCaptureAdvancedOverlay": { "shouldShowScanAreaGuides": false },
            "LabelCaptureValidationFlowOverlay": {
                "RecommendedCameraSettings": { "preferredResolution": "uhd4k" }
            }
        })
    }

    fn has_data_capture_view(&self, view_id: DataCaptureViewId) -> bool {
        self.read(|state| state.views.contains_key(&view_id))
    }

    fn set_mode_enabled(&self, mode_id: ModeId, enabled: bool) -> EngineResult {
        self.with_mode(mode_id, |mode| mode.enabled = enabled)
    }

    fn apply_mode_settings(&self, mode_id: ModeId, settings_json: &str) -> EngineResult {
        let settings = parse_object("settings", settings_json)?;
        self.with_mode(mode_id, |mode| mode.settings = Some(settings))
    }

    fn update_feedback(&self, mode_id: ModeId, feedback_json: &str) -> EngineResult {
        let feedback = parse_object("feedback", feedback_json)?;
        self.with_mode(mode_id, |mode| mode.feedback = Some(feedback))
    }

    fn update_advanced_overlay(
        &self,
        view_id: DataCaptureViewId,
        overlay_json: &str,
    ) -> EngineResult {
        let overlay = parse_object("advanced overlay", overlay_json)?;
        self.with_view(view_id, |overlays| overlays.advanced = Some(overlay))
    }

    fn update_basic_overlay(&self, view_id: DataCaptureViewId, overlay_json: &str) -> EngineResult {
        let overlay = parse_object("basic overlay", overlay_json)?;
        self.with_view(view_id, |overlays| overlays.basic = Some(overlay))
    }

    fn update_validation_flow_overlay(
        &self,
        view_id: DataCaptureViewId,
        overlay_json: &str,
    ) -> EngineResult {
        let overlay = parse_object("validation flow overlay", overlay_json)?;
        self.with_view(view_id, |overlays| overlays.validation_flow = Some(overlay))
    }
}
