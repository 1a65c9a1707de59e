use std::{collections::HashMap, sync::Mutex};

use tokio::sync::oneshot;

use crate::identifier::ModeId;

/// Session updates suspended until the host calls `finishDidUpdateSessionCallback`.
#[derive(Default)]
pub struct SessionCallbacks {
    pending: Mutex<HashMap<ModeId, oneshot::Sender<bool>>>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for the host on `mode_id`. A previous wait on the same mode is
    /// released without a value.
    pub fn register(&self, mode_id: ModeId) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(mode_id, tx);
        rx
    }

    /// Hand `enabled` to the waiting update. Returns whether one was waiting.
    pub fn finish(&self, mode_id: ModeId, enabled: bool) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&mode_id);
        match sender {
            Some(sender) => sender.send(enabled).is_ok(),
            None => false,
        }
    }

    /// Wake a waiting update without a value.
    pub fn release(&self, mode_id: ModeId) {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&mode_id);
    }

    pub fn release_all(&self) {
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finish_delivers_once() {
        let callbacks = SessionCallbacks::new();
        let rx = callbacks.register(1);
        assert!(callbacks.finish(1, false));
        assert!(!callbacks.finish(1, true));
        assert_eq!(rx.await.unwrap(), false);
    }

    #[tokio::test]
    async fn release_wakes_without_value() {
        let callbacks = SessionCallbacks::new();
        let rx = callbacks.register(1);
        callbacks.release(1);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn re_registering_releases_previous_wait() {
        let callbacks = SessionCallbacks::new();
        let first = callbacks.register(1);
        let second = callbacks.register(1);
        assert!(first.await.is_err());
        assert!(callbacks.finish(1, true));
        assert!(second.await.unwrap());
    }
}
