use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    engine::LabelCaptureEngine,
    error::BridgeError,
    events::{EventEmitter, LabelCaptureEvent},
    identifier::{DataCaptureViewId, LabelKey, ModeId, TrackingId},
    overlay::{BrushStore, OverlayStore},
    ui::{run_on_ui, UiThread},
};

use super::{
    callbacks::SessionCallbacks,
    types::{CapturedLabel, LabelCaptureSession, LabelField},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// How a session update's suspension ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCallbackOutcome {
    /// Nobody listens for session updates on this mode; nothing was suspended.
    NotDelivered,
    /// The host answered with this enabled state.
    Finished(bool),
    TimedOut,
    /// Released by unregistering the listener or by shutdown.
    Released,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionUpdatedEvent<'a> {
    mode_id: ModeId,
    session: &'a LabelCaptureSession,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelEvent<'a> {
    data_capture_view_id: DataCaptureViewId,
    tracking_id: TrackingId,
    label: &'a CapturedLabel,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldEvent<'a> {
    data_capture_view_id: DataCaptureViewId,
    tracking_id: TrackingId,
    identifier: &'a LabelKey,
    field: &'a LabelField,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationFlowCapturedEvent<'a> {
    data_capture_view_id: DataCaptureViewId,
    fields: &'a [LabelField],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualInputEvent<'a> {
    data_capture_view_id: DataCaptureViewId,
    identifier: &'a LabelKey,
    old_value: Option<&'a str>,
    new_value: &'a str,
}

/// Connects engine session updates to the overlay stores and the host.
pub struct SessionBridge {
    emitter: Arc<EventEmitter>,
    store: Arc<OverlayStore>,
    brushes: Arc<BrushStore>,
    ui: Arc<dyn UiThread>,
    engine: Arc<dyn LabelCaptureEngine>,
    callbacks: SessionCallbacks,
    tracked: Mutex<HashMap<DataCaptureViewId, HashSet<TrackingId>>>,
    callback_timeout: Duration,
    shutdown: CancellationToken,
}

impl SessionBridge {
    pub fn new(
        emitter: Arc<EventEmitter>,
        store: Arc<OverlayStore>,
        brushes: Arc<BrushStore>,
        ui: Arc<dyn UiThread>,
        engine: Arc<dyn LabelCaptureEngine>,
        callback_timeout: Duration,
    ) -> Self {
        Self {
            emitter,
            store,
            brushes,
            ui,
            engine,
            callbacks: SessionCallbacks::new(),
            tracked: Mutex::new(HashMap::new()),
            callback_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Handle one session update from the engine.
    ///
    /// With a `view_id`, bindings and brushes of labels that are no longer tracked are
    /// released on the UI thread and newly tracked labels are announced to overlay
    /// listeners. Then the session is sent to mode listeners and, if delivered, this
    /// waits for the host's `finishDidUpdateSessionCallback`.
    pub async fn on_session_updated(
        &self,
        mode_id: ModeId,
        view_id: Option<DataCaptureViewId>,
        session: &LabelCaptureSession,
    ) -> Result<SessionCallbackOutcome, BridgeError> {
        if let Some(view_id) = view_id {
            self.sync_view(view_id, session).await?;
        }
        self.dispatch_session(mode_id, session).await
    }

    async fn sync_view(
        &self,
        view_id: DataCaptureViewId,
        session: &LabelCaptureSession,
    ) -> Result<(), BridgeError> {
        let tracked: HashSet<TrackingId> = session.tracking_ids().collect();

        let newly_tracked: Vec<&CapturedLabel> = {
            let mut seen = self.tracked.lock().unwrap_or_else(|p| p.into_inner());
            let previous = seen.insert(view_id, tracked.clone()).unwrap_or_default();
            session
                .captured_labels
                .iter()
                .filter(|label| !previous.contains(&label.tracking_id))
                .collect()
        };

        let store = self.store.clone();
        let brushes = self.brushes.clone();
        let pruned = run_on_ui(self.ui.as_ref(), move || {
            brushes.retain_tracked(view_id, &tracked);
            store.retain_tracked(view_id, &tracked)
        })
        .await?;
        if pruned > 0 {
            log_debug!("released {pruned} overlay bindings for lost labels on view {view_id}");
        }

        for label in newly_tracked {
            self.announce_label(view_id, label);
        }
        Ok(())
    }

    /// Ask overlay listeners for the view, anchor, offset and brush of a label seen for
    /// the first time, then the same for each of its fields.
    fn announce_label(&self, view_id: DataCaptureViewId, label: &CapturedLabel) {
        let label_event = LabelEvent {
            data_capture_view_id: view_id,
            tracking_id: label.tracking_id,
            label,
        };
        for event in [
            LabelCaptureEvent::ViewForCapturedLabel,
            LabelCaptureEvent::AnchorForCapturedLabel,
            LabelCaptureEvent::OffsetForCapturedLabel,
            LabelCaptureEvent::BrushForLabel,
        ] {
            self.emitter.emit(event, view_id, &label_event);
        }

        for field in &label.fields {
            let key = match LabelKey::field(label.tracking_id, field.name.as_str()) {
                Ok(key) => key,
                Err(err) => {
                    log_warn!("skipping field of label {}: {err}", label.tracking_id);
                    continue;
                }
            };
            let field_event = FieldEvent {
                data_capture_view_id: view_id,
                tracking_id: label.tracking_id,
                identifier: &key,
                field,
            };
            for event in [
                LabelCaptureEvent::ViewForCapturedLabelField,
                LabelCaptureEvent::AnchorForCapturedLabelField,
                LabelCaptureEvent::OffsetForCapturedLabelField,
                LabelCaptureEvent::BrushForFieldOfLabel,
            ] {
                self.emitter.emit(event, view_id, &field_event);
            }
        }
    }

    async fn dispatch_session(
        &self,
        mode_id: ModeId,
        session: &LabelCaptureSession,
    ) -> Result<SessionCallbackOutcome, BridgeError> {
        if !self
            .emitter
            .has_mode_specific_listeners_for_event(mode_id, LabelCaptureEvent::DidUpdateSession)
        {
            return Ok(SessionCallbackOutcome::NotDelivered);
        }

        // Registered before emitting so an immediate answer from the host is not lost.
        let reply = self.callbacks.register(mode_id);
        let payload = SessionUpdatedEvent { mode_id, session };
        if !self
            .emitter
            .emit(LabelCaptureEvent::DidUpdateSession, mode_id, &payload)
        {
            self.callbacks.release(mode_id);
            return Ok(SessionCallbackOutcome::NotDelivered);
        }

        let outcome = tokio::select! {
            answer = reply => match answer {
                Ok(enabled) => SessionCallbackOutcome::Finished(enabled),
                Err(_) => SessionCallbackOutcome::Released,
            },
            _ = tokio::time::sleep(self.callback_timeout) => {
                self.callbacks.release(mode_id);
                log_warn!(
                    "session callback for mode {mode_id} not finished within {:?}",
                    self.callback_timeout
                );
                SessionCallbackOutcome::TimedOut
            }
            _ = self.shutdown.cancelled() => SessionCallbackOutcome::Released,
        };

        if let SessionCallbackOutcome::Finished(enabled) = outcome {
            self.engine.set_mode_enabled(mode_id, enabled)?;
        }
        Ok(outcome)
    }

    /// The host finished handling a session update. With no update waiting, the
    /// enabled state is applied straight away.
    pub fn finish_did_update_session(
        &self,
        mode_id: ModeId,
        enabled: bool,
    ) -> Result<(), BridgeError> {
        if self.callbacks.finish(mode_id, enabled) {
            return Ok(());
        }
        self.engine.set_mode_enabled(mode_id, enabled)?;
        Ok(())
    }

    /// Wake a suspended update for a mode whose listener went away.
    pub fn release_mode(&self, mode_id: ModeId) {
        self.callbacks.release(mode_id);
    }

    pub fn forget_view(&self, view_id: DataCaptureViewId) {
        self.tracked
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&view_id);
    }

    pub fn on_label_tapped(&self, view_id: DataCaptureViewId, label: &CapturedLabel) -> bool {
        self.emitter.emit(
            LabelCaptureEvent::DidTapLabel,
            view_id,
            &LabelEvent {
                data_capture_view_id: view_id,
                tracking_id: label.tracking_id,
                label,
            },
        )
    }

    pub fn on_validation_flow_captured(
        &self,
        view_id: DataCaptureViewId,
        fields: &[LabelField],
    ) -> bool {
        self.emitter.emit(
            LabelCaptureEvent::DidCaptureLabelWithFields,
            view_id,
            &ValidationFlowCapturedEvent {
                data_capture_view_id: view_id,
                fields,
            },
        )
    }

    pub fn on_manual_input_submitted(
        &self,
        view_id: DataCaptureViewId,
        key: &LabelKey,
        old_value: Option<&str>,
        new_value: &str,
    ) -> bool {
        self.emitter.emit(
            LabelCaptureEvent::DidSubmitManualInputForField,
            view_id,
            &ManualInputEvent {
                data_capture_view_id: view_id,
                identifier: key,
                old_value,
                new_value,
            },
        )
    }

    /// Release every suspended update and refuse to wait on new ones.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.callbacks.release_all();
        log_info!("session bridge shut down");
    }
}
