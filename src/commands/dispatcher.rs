use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::{
    engine::LabelCaptureEngine,
    error::BridgeError,
    events::{EventCategory, ListenerRegistry, ListenerScope},
    identifier::{DataCaptureViewId, LabelKey},
    overlay::{Anchor, Brush, BrushStore, OverlayStore, PointWithUnit, ViewDescriptor, ViewResolver},
    session::SessionBridge,
    ui::run_on_ui,
};

use super::{args::CommandArgs, Command};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Validates host commands and routes them to the engine, the stores or the
/// listener registry.
///
/// Arguments, identifiers and JSON payloads are all checked before anything is
/// mutated, so a failed command leaves no partial state behind.
pub struct CommandDispatcher {
    engine: Arc<dyn LabelCaptureEngine>,
    registry: Arc<ListenerRegistry>,
    store: Arc<OverlayStore>,
    brushes: Arc<BrushStore>,
    resolver: ViewResolver,
    session: Arc<SessionBridge>,
}

impl CommandDispatcher {
    pub fn new(
        engine: Arc<dyn LabelCaptureEngine>,
        registry: Arc<ListenerRegistry>,
        store: Arc<OverlayStore>,
        brushes: Arc<BrushStore>,
        resolver: ViewResolver,
        session: Arc<SessionBridge>,
    ) -> Self {
        Self {
            engine,
            registry,
            store,
            brushes,
            resolver,
            session,
        }
    }

    pub async fn dispatch(
        &self,
        command: Command,
        args: &CommandArgs,
    ) -> Result<Value, BridgeError> {
        log_debug!("dispatching {command}");
        let result = self.route(command, args).await;
        if let Err(err) = &result {
            log_warn!("{command} failed: {err}");
        }
        result
    }

    async fn route(&self, command: Command, args: &CommandArgs) -> Result<Value, BridgeError> {
        match command {
            Command::GetDefaults => Ok(json!({ "LabelCapture": self.engine.defaults() })),

            Command::RegisterListenerForEvents => {
                let mode_id = args.require_i32("modeId")?;
                self.registry
                    .subscribe(ListenerScope::Mode(mode_id), EventCategory::Session);
                Ok(Value::Null)
            }
            Command::UnregisterListenerForEvents => {
                let mode_id = args.require_i32("modeId")?;
                self.registry
                    .unsubscribe(ListenerScope::Mode(mode_id), EventCategory::Session);
                self.session.release_mode(mode_id);
                Ok(Value::Null)
            }
            Command::FinishDidUpdateSessionCallback => {
                let mode_id = args.require_i32("modeId")?;
                let enabled = args.require_bool("isEnabled")?;
                self.session.finish_did_update_session(mode_id, enabled)?;
                Ok(Value::Null)
            }
            Command::SetModeEnabledState => {
                let mode_id = args.require_i32("modeId")?;
                let enabled = args.require_bool("isEnabled")?;
                self.engine.set_mode_enabled(mode_id, enabled)?;
                Ok(Value::Null)
            }
            Command::UpdateLabelCaptureFeedback => {
                let mode_id = args.require_i32("modeId")?;
                let feedback = args.require_json_text("feedbackJson")?;
                self.engine.update_feedback(mode_id, &feedback)?;
                Ok(Value::Null)
            }
            Command::UpdateLabelCaptureSettings => {
                let mode_id = args.require_i32("modeId")?;
                let settings = args.require_json_text("settingsJson")?;
                self.engine.apply_mode_settings(mode_id, &settings)?;
                Ok(Value::Null)
            }

            Command::SetViewForCapturedLabel => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = LabelKey::label(args.require_tracking_id("trackingId")?);
                let descriptor = args.require_json_text("jsonView")?;
                self.set_view(view_id, key, &descriptor).await
            }
            Command::SetViewForCapturedLabelField => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = args.require_field_key("identifier")?;
                let descriptor = args.require_json_text("view")?;
                self.set_view(view_id, key, &descriptor).await
            }
            Command::SetAnchorForCapturedLabel => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = LabelKey::label(args.require_tracking_id("trackingId")?);
                let anchor: Anchor = args.require_str("anchor")?.parse()?;
                self.set_anchor(view_id, key, anchor).await
            }
            Command::SetAnchorForCapturedLabelField => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = args.require_field_key("identifier")?;
                let anchor: Anchor = args.require_str("anchor")?.parse()?;
                self.set_anchor(view_id, key, anchor).await
            }
            Command::SetOffsetForCapturedLabel => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = LabelKey::label(args.require_tracking_id("trackingId")?);
                let offset_json = args.require_json_text("offsetJson")?;
                let offset = PointWithUnit::from_json(&offset_json, "offsetJson")?;
                self.set_offset(view_id, key, offset).await
            }
            Command::SetOffsetForCapturedLabelField => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = args.require_field_key("identifier")?;
                let offset_json = args.require_json_text("offset")?;
                let offset = PointWithUnit::from_json(&offset_json, "offset")?;
                self.set_offset(view_id, key, offset).await
            }
            Command::ClearCapturedLabelViews => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                self.ensure_view(view_id)?;
                let store = self.store.clone();
                let released =
                    run_on_ui(self.resolver.ui().as_ref(), move || store.clear_all(view_id)).await?;
                // Labels still in view get announced again on the next session update.
                self.session.forget_view(view_id);
                log_debug!("cleared {released} captured label views on view {view_id}");
                Ok(Value::Null)
            }

            Command::RegisterListenerForAdvancedOverlayEvents => {
                self.subscribe_view(args, EventCategory::AdvancedOverlay)
            }
            Command::UnregisterListenerForAdvancedOverlayEvents => {
                self.unsubscribe_view(args, EventCategory::AdvancedOverlay)
            }
            Command::RegisterListenerForBasicOverlayEvents => {
                self.subscribe_view(args, EventCategory::BasicOverlay)
            }
            Command::UnregisterListenerForBasicOverlayEvents => {
                self.unsubscribe_view(args, EventCategory::BasicOverlay)
            }
            Command::RegisterListenerForValidationFlowEvents => {
                self.subscribe_view(args, EventCategory::ValidationFlow)
            }
            Command::UnregisterListenerForValidationFlowEvents => {
                self.unsubscribe_view(args, EventCategory::ValidationFlow)
            }

            Command::UpdateLabelCaptureAdvancedOverlay => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let overlay = args.require_json_text("advancedOverlayJson")?;
                self.ensure_view(view_id)?;
                self.engine.update_advanced_overlay(view_id, &overlay)?;
                Ok(Value::Null)
            }
            Command::UpdateLabelCaptureBasicOverlay => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let overlay = args.require_json_text("basicOverlayJson")?;
                self.ensure_view(view_id)?;
                self.engine.update_basic_overlay(view_id, &overlay)?;
                Ok(Value::Null)
            }
            Command::UpdateLabelCaptureValidationFlowOverlay => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let overlay = args.require_json_text("overlayJson")?;
                self.ensure_view(view_id)?;
                self.engine.update_validation_flow_overlay(view_id, &overlay)?;
                Ok(Value::Null)
            }

            Command::SetBrushForLabel => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let key = LabelKey::label(args.require_tracking_id("trackingId")?);
                let brush = parse_brush(args)?;
                self.ensure_view(view_id)?;
                self.brushes.set(view_id, key, brush);
                Ok(Value::Null)
            }
            Command::SetBrushForFieldOfLabel => {
                let view_id = args.require_i32("dataCaptureViewId")?;
                let tracking_id = args.require_tracking_id("trackingId")?;
                let field_name = args.require_str("fieldName")?;
                let brush = parse_brush(args)?;
                let key = LabelKey::field(tracking_id, field_name)?;
                self.ensure_view(view_id)?;
                self.brushes.set(view_id, key, brush);
                Ok(Value::Null)
            }
        }
    }

    fn ensure_view(&self, view_id: DataCaptureViewId) -> Result<(), BridgeError> {
        if self.engine.has_data_capture_view(view_id) {
            Ok(())
        } else {
            Err(BridgeError::ViewNotFound(view_id))
        }
    }

    /// Build the view on the UI thread and attach it there. Completes once the view is
    /// attached or the descriptor turned out to be undecodable.
    async fn set_view(
        &self,
        view_id: DataCaptureViewId,
        key: LabelKey,
        descriptor_json: &str,
    ) -> Result<Value, BridgeError> {
        let descriptor = ViewDescriptor::from_json(descriptor_json)?;
        self.ensure_view(view_id)?;

        let (done_tx, done_rx) = oneshot::channel();
        let store = self.store.clone();
        self.resolver.resolve(descriptor, move |view| {
            let outcome = match view {
                Some(view) => {
                    store.attach(view_id, key, view);
                    Ok(())
                }
                None => Err(BridgeError::InvalidViewDescriptor(format!(
                    "view data for '{key}' could not be decoded"
                ))),
            };
            let _ = done_tx.send(outcome);
        })?;

        done_rx
            .await
            .map_err(|_| BridgeError::UiThreadUnavailable("view attach was dropped".into()))??;
        Ok(Value::Null)
    }

    async fn set_anchor(
        &self,
        view_id: DataCaptureViewId,
        key: LabelKey,
        anchor: Anchor,
    ) -> Result<Value, BridgeError> {
        self.ensure_view(view_id)?;
        let store = self.store.clone();
        run_on_ui(self.resolver.ui().as_ref(), move || {
            store.set_anchor(view_id, &key, anchor)
        })
        .await??;
        Ok(Value::Null)
    }

    async fn set_offset(
        &self,
        view_id: DataCaptureViewId,
        key: LabelKey,
        offset: PointWithUnit,
    ) -> Result<Value, BridgeError> {
        self.ensure_view(view_id)?;
        let store = self.store.clone();
        run_on_ui(self.resolver.ui().as_ref(), move || {
            store.set_offset(view_id, &key, offset)
        })
        .await??;
        Ok(Value::Null)
    }

    fn subscribe_view(
        &self,
        args: &CommandArgs,
        category: EventCategory,
    ) -> Result<Value, BridgeError> {
        let view_id = args.require_i32("dataCaptureViewId")?;
        self.registry.subscribe(ListenerScope::View(view_id), category);
        Ok(Value::Null)
    }

    fn unsubscribe_view(
        &self,
        args: &CommandArgs,
        category: EventCategory,
    ) -> Result<Value, BridgeError> {
        let view_id = args.require_i32("dataCaptureViewId")?;
        self.registry.unsubscribe(ListenerScope::View(view_id), category);
        Ok(Value::Null)
    }
}

/// A null or absent `brushJson` means the brush is removed.
fn parse_brush(args: &CommandArgs) -> Result<Option<Brush>, BridgeError> {
    args.optional_json_text("brushJson")?
        .map(|text| Brush::from_json(&text))
        .transpose()
}
