use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;

use crate::identifier::{DataCaptureViewId, ModeId};

use super::{
    names::LabelCaptureEvent,
    registry::{ListenerRegistry, ListenerScope},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

/// What the host transport receives: the event name and its JSON payload as a string.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub name: String,
    pub data: String,
}

/// Delivers events to the host.
pub trait EventTransport: Send + Sync {
    /// Whether anything on the host side listens for `event_name` at all.
    fn has_listeners(&self, _event_name: &str) -> bool {
        true
    }

    fn deliver(&self, envelope: EventEnvelope) -> Result<()>;
}

/// Forwards engine-originated events, but only to scopes that asked for them.
pub struct EventEmitter {
    registry: Arc<ListenerRegistry>,
    transport: Arc<dyn EventTransport>,
    // Held across check and delivery so concurrent emitters cannot reorder a scope's events.
    delivery: Mutex<()>,
}

impl EventEmitter {
    pub fn new(registry: Arc<ListenerRegistry>, transport: Arc<dyn EventTransport>) -> Self {
        Self {
            registry,
            transport,
            delivery: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn has_listeners_for_event(&self, event: LabelCaptureEvent) -> bool {
        self.transport.has_listeners(event.name())
    }

    pub fn has_view_specific_listeners_for_event(
        &self,
        view_id: DataCaptureViewId,
        event: LabelCaptureEvent,
    ) -> bool {
        !event.category().is_mode_scoped()
            && self.has_listeners_for_event(event)
            && self
                .registry
                .is_subscribed(ListenerScope::View(view_id), event.category())
    }

    pub fn has_mode_specific_listeners_for_event(
        &self,
        mode_id: ModeId,
        event: LabelCaptureEvent,
    ) -> bool {
        event.category().is_mode_scoped()
            && self.has_listeners_for_event(event)
            && self
                .registry
                .is_subscribed(ListenerScope::Mode(mode_id), event.category())
    }

    fn is_wanted(&self, event: LabelCaptureEvent, scope_id: i32) -> bool {
        let category = event.category();
        self.has_listeners_for_event(event)
            && self
                .registry
                .is_subscribed(ListenerScope::for_category(category, scope_id), category)
    }

    /// Deliver `payload` for `event` in the scope `scope_id` (a mode id for session
    /// events, a data capture view id otherwise). Returns whether it was delivered.
    ///
    /// Nothing is serialised unless someone is subscribed.
    pub fn emit<P: Serialize + ?Sized>(
        &self,
        event: LabelCaptureEvent,
        scope_id: i32,
        payload: &P,
    ) -> bool {
        let _ordered = self.delivery.lock().unwrap_or_else(|p| p.into_inner());

        if !self.is_wanted(event, scope_id) {
            log_debug!("dropping {} for scope {scope_id}: no listener", event.name());
            return false;
        }

        let data = match serde_json::to_string(payload) {
            Ok(data) => data,
            Err(err) => {
                log_error!("failed to serialise {} payload: {err}", event.name());
                return false;
            }
        };

        let envelope = EventEnvelope {
            name: event.name().to_string(),
            data,
        };
        match self.transport.deliver(envelope) {
            Ok(()) => true,
            Err(err) => {
                log_error!("failed to deliver {}: {err:#}", event.name());
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{testing::RecordingTransport, *};
    use crate::events::names::EventCategory;

    fn emitter() -> (EventEmitter, Arc<RecordingTransport>) {
        let transport = RecordingTransport::new();
        let emitter = EventEmitter::new(Arc::new(ListenerRegistry::new()), transport.clone());
        (emitter, transport)
    }

    #[test]
    fn unsubscribed_scope_gets_nothing() {
        let (emitter, transport) = emitter();
        assert!(!emitter.emit(LabelCaptureEvent::DidTapLabel, 1, &json!({"trackingId": 1})));
        assert!(transport.names().is_empty());
    }

    #[test]
    fn subscribed_scope_gets_exactly_one_delivery() {
        let (emitter, transport) = emitter();
        emitter
            .registry()
            .subscribe(ListenerScope::View(1), EventCategory::BasicOverlay);

        assert!(emitter.emit(LabelCaptureEvent::DidTapLabel, 1, &json!({"trackingId": 1})));
        assert!(!emitter.emit(LabelCaptureEvent::DidTapLabel, 2, &json!({"trackingId": 1})));
        assert_eq!(transport.names(), vec![LabelCaptureEvent::DidTapLabel.name()]);
        assert_eq!(
            transport.payloads(LabelCaptureEvent::DidTapLabel.name())[0]["trackingId"],
            1
        );
    }

    #[test]
    fn session_events_use_mode_scope() {
        let (emitter, transport) = emitter();
        emitter
            .registry()
            .subscribe(ListenerScope::View(5), EventCategory::Session);
        assert!(!emitter.emit(LabelCaptureEvent::DidUpdateSession, 5, &json!({})));

        emitter
            .registry()
            .subscribe(ListenerScope::Mode(5), EventCategory::Session);
        let event = LabelCaptureEvent::DidUpdateSession;
        assert!(emitter.has_mode_specific_listeners_for_event(5, event));
        assert!(!emitter.has_view_specific_listeners_for_event(5, event));
        assert!(emitter.emit(LabelCaptureEvent::DidUpdateSession, 5, &json!({})));
        assert_eq!(transport.names().len(), 1);
    }

    #[test]
    fn host_without_listeners_short_circuits() {
        let (emitter, transport) = emitter();
        emitter
            .registry()
            .subscribe(ListenerScope::View(1), EventCategory::BasicOverlay);
        transport
            .deaf_to
            .lock()
            .unwrap()
            .insert(LabelCaptureEvent::BrushForLabel.name().to_string());

        assert!(!emitter.emit(LabelCaptureEvent::BrushForLabel, 1, &json!({})));
        assert!(emitter.emit(LabelCaptureEvent::DidTapLabel, 1, &json!({})));
    }

    #[test]
    fn preserves_emission_order() {
        let (emitter, transport) = emitter();
        emitter
            .registry()
            .subscribe(ListenerScope::View(1), EventCategory::ValidationFlow);
        for i in 0..5 {
            emitter.emit(LabelCaptureEvent::DidCaptureLabelWithFields, 1, &json!({ "seq": i }));
        }
        let seqs: Vec<_> = transport
            .payloads(LabelCaptureEvent::DidCaptureLabelWithFields.name())
            .into_iter()
            .map(|p| p["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }
}
