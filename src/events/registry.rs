use std::{collections::HashSet, sync::RwLock};

use crate::identifier::{DataCaptureViewId, ModeId};

use super::names::EventCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    Mode(ModeId),
    View(DataCaptureViewId),
}

impl ListenerScope {
    /// The scope kind a category is keyed by.
    pub fn for_category(category: EventCategory, scope_id: i32) -> Self {
        if category.is_mode_scoped() {
            ListenerScope::Mode(scope_id)
        } else {
            ListenerScope::View(scope_id)
        }
    }
}

/// Host interest in event categories, per mode or data capture view.
#[derive(Default)]
pub struct ListenerRegistry {
    subscriptions: RwLock<HashSet<(ListenerScope, EventCategory)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when already subscribed.
    pub fn subscribe(&self, scope: ListenerScope, category: EventCategory) -> bool {
        self.subscriptions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert((scope, category))
    }

    /// Returns `false` when there was nothing to remove.
    pub fn unsubscribe(&self, scope: ListenerScope, category: EventCategory) -> bool {
        self.subscriptions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&(scope, category))
    }

    pub fn is_subscribed(&self, scope: ListenerScope, category: EventCategory) -> bool {
        self.subscriptions
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&(scope, category))
    }

    /// Drop every category for `scope`, e.g. when its view is torn down.
    pub fn clear_scope(&self, scope: ListenerScope) {
        self.subscriptions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .retain(|(existing, _)| *existing != scope);
    }
}
