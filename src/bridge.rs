use std::sync::Arc;

use serde_json::Value;

use crate::{
    commands::{Command, CommandArgs, CommandDispatcher},
    config::BridgeConfig,
    engine::LabelCaptureEngine,
    error::BridgeError,
    events::{EventCategory, EventEmitter, EventTransport, ListenerRegistry, ListenerScope},
    identifier::DataCaptureViewId,
    overlay::{BrushStore, OverlayStore, ViewFactory, ViewResolver},
    session::SessionBridge,
    ui::{run_on_ui, DedicatedUiThread, UiThread},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

struct Inner {
    registry: Arc<ListenerRegistry>,
    emitter: Arc<EventEmitter>,
    store: Arc<OverlayStore>,
    brushes: Arc<BrushStore>,
    ui: Arc<dyn UiThread>,
    session: Arc<SessionBridge>,
    dispatcher: CommandDispatcher,
}

/// Everything one label capture integration needs, wired together.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LabelBridge {
    inner: Arc<Inner>,
}

impl LabelBridge {
    pub fn new(
        engine: Arc<dyn LabelCaptureEngine>,
        ui: Arc<dyn UiThread>,
        factory: Arc<dyn ViewFactory>,
        transport: Arc<dyn EventTransport>,
        config: &BridgeConfig,
    ) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let emitter = Arc::new(EventEmitter::new(registry.clone(), transport));
        let store = Arc::new(OverlayStore::new(config.default_anchor));
        let brushes = Arc::new(BrushStore::new());
        let resolver = ViewResolver::new(ui.clone(), factory);
        let session = Arc::new(SessionBridge::new(
            emitter.clone(),
            store.clone(),
            brushes.clone(),
            ui.clone(),
            engine.clone(),
            config.session_callback_timeout(),
        ));
        let dispatcher = CommandDispatcher::new(
            engine,
            registry.clone(),
            store.clone(),
            brushes.clone(),
            resolver,
            session.clone(),
        );

        log_info!(
            "label capture bridge ready (session timeout {:?})",
            config.session_callback_timeout()
        );

        Self {
            inner: Arc::new(Inner {
                registry,
                emitter,
                store,
                brushes,
                ui,
                session,
                dispatcher,
            }),
        }
    }

    /// Bridge with its own UI thread named `config.ui_thread_name`, for hosts that have
    /// no platform main loop to hand over.
    pub fn with_dedicated_ui(
        engine: Arc<dyn LabelCaptureEngine>,
        factory: Arc<dyn ViewFactory>,
        transport: Arc<dyn EventTransport>,
        config: &BridgeConfig,
    ) -> anyhow::Result<Self> {
        let ui = DedicatedUiThread::spawn(&config.ui_thread_name)?;
        Ok(Self::new(engine, Arc::new(ui), factory, transport, config))
    }

    /// Run one host command by wire name.
    pub async fn exec(&self, name: &str, args: CommandArgs) -> Result<Value, BridgeError> {
        let command: Command = name.parse()?;
        self.inner.dispatcher.dispatch(command, &args).await
    }

    pub fn session(&self) -> &Arc<SessionBridge> {
        &self.inner.session
    }

    pub fn store(&self) -> &Arc<OverlayStore> {
        &self.inner.store
    }

    pub fn brushes(&self) -> &Arc<BrushStore> {
        &self.inner.brushes
    }

    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.inner.emitter
    }

    /// The data capture view went away: release its views and forget its brushes,
    /// tracked labels and subscriptions.
    pub async fn on_data_capture_view_removed(
        &self,
        view_id: DataCaptureViewId,
    ) -> Result<(), BridgeError> {
        let store = self.inner.store.clone();
        let released =
            run_on_ui(self.inner.ui.as_ref(), move || store.clear_all(view_id)).await?;
        self.inner.brushes.clear(view_id);
        self.inner.session.forget_view(view_id);
        self.inner.registry.clear_scope(ListenerScope::View(view_id));
        log_debug!("data capture view {view_id} removed, released {released} views");
        Ok(())
    }

    /// Whether the host listens for `category` on `view_id`.
    pub fn is_view_subscribed(&self, view_id: DataCaptureViewId, category: EventCategory) -> bool {
        self.inner
            .registry
            .is_subscribed(ListenerScope::View(view_id), category)
    }

    pub fn shutdown(&self) {
        self.inner.session.shutdown();
    }
}
