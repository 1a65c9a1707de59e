use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    error::BridgeError,
    identifier::{DataCaptureViewId, LabelKey, TrackingId},
};

use super::{
    types::{Anchor, PointWithUnit},
    view::OverlayView,
};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// A view attached to a tracked label or field, with its placement.
#[derive(Clone)]
pub struct OverlayBinding {
    pub view: Arc<dyn OverlayView>,
    pub anchor: Anchor,
    pub offset: PointWithUnit,
}

impl fmt::Debug for OverlayBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayBinding")
            .field("view", &self.view)
            .field("anchor", &self.anchor)
            .field("offset", &self.offset)
            .finish()
    }
}

type ViewBindings = HashMap<LabelKey, OverlayBinding>;

/// Overlay bindings per data capture view.
///
/// Calls that release views (`attach` replacing a view, `remove*`, `clear_all`,
/// `retain_tracked`) are made from the UI thread by their callers.
pub struct OverlayStore {
    views: Mutex<HashMap<DataCaptureViewId, ViewBindings>>,
    default_anchor: Anchor,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self::new(Anchor::default())
    }
}

impl OverlayStore {
    pub fn new(default_anchor: Anchor) -> Self {
        Self {
            views: Mutex::new(HashMap::new()),
            default_anchor,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DataCaptureViewId, ViewBindings>> {
        // A poisoned map is still structurally valid; every write is a single insert/remove.
        match self.views.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Insert or replace the view for `key`. A replaced view is released first;
    /// its anchor and offset carry over to the new view.
    pub fn attach(&self, view_id: DataCaptureViewId, key: LabelKey, view: Arc<dyn OverlayView>) {
        let mut views = self.lock();
        let bindings = views.entry(view_id).or_default();

        let (anchor, offset) = match bindings.get(&key) {
            Some(existing) => {
                if !Arc::ptr_eq(&existing.view, &view) {
                    existing.view.release();
                }
                (existing.anchor, existing.offset)
            }
            None => (self.default_anchor, PointWithUnit::zero()),
        };

        log_debug!("attach view for {key} on data capture view {view_id}");
        bindings.insert(
            key,
            OverlayBinding {
                view,
                anchor,
                offset,
            },
        );
    }

    /// Insert or replace with explicit placement.
    pub fn attach_with(
        &self,
        view_id: DataCaptureViewId,
        key: LabelKey,
        view: Arc<dyn OverlayView>,
        anchor: Anchor,
        offset: PointWithUnit,
    ) {
        let mut views = self.lock();
        let bindings = views.entry(view_id).or_default();
        if let Some(existing) = bindings.get(&key) {
            if !Arc::ptr_eq(&existing.view, &view) {
                existing.view.release();
            }
        }
        bindings.insert(
            key,
            OverlayBinding {
                view,
                anchor,
                offset,
            },
        );
    }

    pub fn set_anchor(
        &self,
        view_id: DataCaptureViewId,
        key: &LabelKey,
        anchor: Anchor,
    ) -> Result<(), BridgeError> {
        let mut views = self.lock();
        let binding = binding_mut(&mut views, view_id, key)?;
        binding.anchor = anchor;
        Ok(())
    }

    pub fn set_offset(
        &self,
        view_id: DataCaptureViewId,
        key: &LabelKey,
        offset: PointWithUnit,
    ) -> Result<(), BridgeError> {
        let mut views = self.lock();
        let binding = binding_mut(&mut views, view_id, key)?;
        binding.offset = offset;
        Ok(())
    }

    /// Release and drop one binding. Returns whether it existed.
    pub fn remove(&self, view_id: DataCaptureViewId, key: &LabelKey) -> bool {
        let mut views = self.lock();
        let Some(bindings) = views.get_mut(&view_id) else {
            return false;
        };
        let removed = bindings.remove(key);
        if bindings.is_empty() {
            views.remove(&view_id);
        }
        match removed {
            Some(binding) => {
                binding.view.release();
                true
            }
            None => false,
        }
    }

    /// Release the whole-label binding and every field binding of `tracking_id`.
    pub fn remove_label(&self, view_id: DataCaptureViewId, tracking_id: TrackingId) -> usize {
        self.release_where(view_id, |key| key.tracking_id == tracking_id)
    }

    /// Release every binding whose label is not in `tracked`.
    pub fn retain_tracked(
        &self,
        view_id: DataCaptureViewId,
        tracked: &HashSet<TrackingId>,
    ) -> usize {
        self.release_where(view_id, |key| !tracked.contains(&key.tracking_id))
    }

    /// Release and drop every binding of the view.
    pub fn clear_all(&self, view_id: DataCaptureViewId) -> usize {
        let removed = self.lock().remove(&view_id).unwrap_or_default();
        for binding in removed.values() {
            binding.view.release();
        }
        log_debug!("cleared {} bindings on data capture view {view_id}", removed.len());
        removed.len()
    }

    fn release_where(
        &self,
        view_id: DataCaptureViewId,
        predicate: impl Fn(&LabelKey) -> bool,
    ) -> usize {
        let mut views = self.lock();
        let Some(bindings) = views.get_mut(&view_id) else {
            return 0;
        };

        let doomed: Vec<LabelKey> = bindings.keys().filter(|key| predicate(key)).cloned().collect();
        for key in &doomed {
            if let Some(binding) = bindings.remove(key) {
                binding.view.release();
            }
        }
        if bindings.is_empty() {
            views.remove(&view_id);
        }
        doomed.len()
    }

    pub fn binding(&self, view_id: DataCaptureViewId, key: &LabelKey) -> Option<OverlayBinding> {
        self.lock()
            .get(&view_id)
            .and_then(|bindings| bindings.get(key))
            .cloned()
    }

    /// Snapshot of the view's bindings, sorted by key.
    pub fn bindings(&self, view_id: DataCaptureViewId) -> Vec<(LabelKey, OverlayBinding)> {
        let mut entries: Vec<_> = self
            .lock()
            .get(&view_id)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|(key, binding)| (key.clone(), binding.clone()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self, view_id: DataCaptureViewId) -> usize {
        self.lock().get(&view_id).map_or(0, HashMap::len)
    }
}

fn binding_mut<'a>(
    views: &'a mut HashMap<DataCaptureViewId, ViewBindings>,
    view_id: DataCaptureViewId,
    key: &LabelKey,
) -> Result<&'a mut OverlayBinding, BridgeError> {
    views
        .get_mut(&view_id)
        .and_then(|bindings| bindings.get_mut(key))
        .ok_or_else(|| BridgeError::BindingNotFound {
            view_id,
            key: key.clone(),
        })
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::overlay::{
        types::FloatWithUnit,
        view::{ImageOverlayView, ViewSize},
    };

    fn view() -> Arc<ImageOverlayView> {
        Arc::new(ImageOverlayView::new(
            RgbaImage::new(1, 1),
            ViewSize { width: 10.0, height: 10.0 },
        ))
    }

    fn sku() -> LabelKey {
        LabelKey::field(42, "sku").unwrap()
    }

    fn assert_not_found(result: Result<(), BridgeError>) {
        assert!(
            matches!(result, Err(BridgeError::BindingNotFound { .. })),
            "expected BindingNotFound, got {result:?}"
        );
    }

    #[test]
    fn set_anchor_keeps_view() {
        let store = OverlayStore::default();
        let v = view();
        store.attach(1, sku(), v.clone());
        store.set_anchor(1, &sku(), Anchor::TopLeft).unwrap();

        let binding = store.binding(1, &sku()).unwrap();
        assert_eq!(binding.anchor, Anchor::TopLeft);
        let expected: Arc<dyn OverlayView> = v;
        assert!(Arc::ptr_eq(&binding.view, &expected));
    }

    #[test]
    fn new_bindings_use_default_placement() {
        let store = OverlayStore::new(Anchor::BottomCenter);
        store.attach(1, LabelKey::label(3), view());
        let binding = store.binding(1, &LabelKey::label(3)).unwrap();
        assert_eq!(binding.anchor, Anchor::BottomCenter);
        assert_eq!(binding.offset, PointWithUnit::zero());
    }

    #[test]
    fn placement_requires_attached_view() {
        let store = OverlayStore::default();
        assert_not_found(store.set_anchor(1, &sku(), Anchor::Center));
        assert_not_found(store.set_offset(1, &sku(), PointWithUnit::zero()));
    }

    #[test]
    fn replacing_releases_previous_view_and_keeps_placement() {
        let store = OverlayStore::default();
        let first = view();
        let second = view();
        store.attach(1, sku(), first.clone());
        store.set_anchor(1, &sku(), Anchor::TopRight).unwrap();
        store.attach(1, sku(), second.clone());

        assert!(first.is_released());
        assert!(!second.is_released());
        assert_eq!(store.binding(1, &sku()).unwrap().anchor, Anchor::TopRight);
        assert_eq!(store.len(1), 1);
    }

    #[test]
    fn reattaching_the_same_view_does_not_release_it() {
        let store = OverlayStore::default();
        let v = view();
        store.attach(1, sku(), v.clone());
        store.attach(1, sku(), v.clone());
        assert!(!v.is_released());
    }

    #[test]
    fn clear_all_releases_and_forgets() {
        let store = OverlayStore::default();
        let a = view();
        let b = view();
        store.attach(1, sku(), a.clone());
        store.attach(1, LabelKey::label(7), b.clone());
        store.attach(2, LabelKey::label(7), view());

        assert_eq!(store.clear_all(1), 2);
        assert!(a.is_released() && b.is_released());
        assert_not_found(store.set_anchor(1, &sku(), Anchor::Center));
        assert_not_found(store.set_offset(1, &LabelKey::label(7), PointWithUnit::zero()));
        assert_eq!(store.len(2), 1);
    }

    #[test]
    fn offset_then_remove_then_offset_fails() {
        let store = OverlayStore::default();
        store.attach(1, sku(), view());
        let offset = PointWithUnit {
            x: FloatWithUnit::pixels(5.0),
            y: FloatWithUnit::pixels(10.0),
        };
        store.set_offset(1, &sku(), offset).unwrap();
        assert_eq!(store.binding(1, &sku()).unwrap().offset, offset);

        assert!(store.remove(1, &sku()));
        assert_not_found(store.set_offset(1, &sku(), offset));
        assert!(!store.remove(1, &sku()));
    }

    #[test]
    fn retain_tracked_prunes_lost_labels_and_their_fields() {
        let store = OverlayStore::default();
        let lost_label = view();
        let lost_field = view();
        let kept = view();
        store.attach(1, LabelKey::label(1), lost_label.clone());
        store.attach(1, LabelKey::field(1, "price").unwrap(), lost_field.clone());
        store.attach(1, LabelKey::label(2), kept.clone());

        let tracked: HashSet<TrackingId> = [2].into_iter().collect();
        assert_eq!(store.retain_tracked(1, &tracked), 2);
        assert!(lost_label.is_released() && lost_field.is_released());
        assert!(!kept.is_released());
        assert_eq!(
            store.bindings(1).into_iter().map(|(k, _)| k).collect::<Vec<_>>(),
            vec![LabelKey::label(2)]
        );
    }

    #[test]
    fn remove_label_drops_field_bindings_too() {
        let store = OverlayStore::default();
        store.attach(1, LabelKey::label(9), view());
        store.attach(1, LabelKey::field(9, "sku").unwrap(), view());
        store.attach(1, LabelKey::field(10, "sku").unwrap(), view());
        assert_eq!(store.remove_label(1, 9), 2);
        assert_eq!(store.len(1), 1);
    }
}
