use std::{
    collections::{HashMap, HashSet},
    sync::RwLock,
};

use crate::identifier::{DataCaptureViewId, LabelKey, TrackingId};

use super::types::Brush;

/// Brushes the host assigned to labels and fields for the basic overlay.
#[derive(Default)]
pub struct BrushStore {
    views: RwLock<HashMap<DataCaptureViewId, HashMap<LabelKey, Brush>>>,
}

impl BrushStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` removes the brush for `key`.
    pub fn set(&self, view_id: DataCaptureViewId, key: LabelKey, brush: Option<Brush>) {
        let mut views = self.views.write().unwrap_or_else(|p| p.into_inner());
        match brush {
            Some(brush) => {
                views.entry(view_id).or_default().insert(key, brush);
            }
            None => {
                if let Some(brushes) = views.get_mut(&view_id) {
                    brushes.remove(&key);
                    if brushes.is_empty() {
                        views.remove(&view_id);
                    }
                }
            }
        }
    }

    pub fn brush(&self, view_id: DataCaptureViewId, key: &LabelKey) -> Option<Brush> {
        self.views
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&view_id)
            .and_then(|brushes| brushes.get(key))
            .cloned()
    }

    pub fn clear(&self, view_id: DataCaptureViewId) {
        self.views
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&view_id);
    }

    pub fn retain_tracked(&self, view_id: DataCaptureViewId, tracked: &HashSet<TrackingId>) {
        let mut views = self.views.write().unwrap_or_else(|p| p.into_inner());
        if let Some(brushes) = views.get_mut(&view_id) {
            brushes.retain(|key, _| tracked.contains(&key.tracking_id));
            if brushes.is_empty() {
                views.remove(&view_id);
            }
        }
    }
}
