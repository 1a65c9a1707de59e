//! Tauri adapter: commands come in through `invoke`, events go out through the
//! app's event bus, and the main thread is the UI thread.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tauri::{
    plugin::{Builder, TauriPlugin},
    AppHandle, Emitter, Manager, Runtime, State,
};

use crate::{
    bridge::LabelBridge,
    commands::CommandArgs,
    config::BridgeConfig,
    engine::LabelCaptureEngine,
    error::BridgeError,
    events::{EventEnvelope, EventTransport},
    overlay::ImageViewFactory,
    ui::{UiTask, UiThread},
    utils::logging,
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub const PLUGIN_NAME: &str = "label-capture";

/// Every bridge event is emitted on this channel; the envelope carries the event name.
pub const EVENT_CHANNEL: &str = "label-capture://event";

pub struct TauriEventTransport<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> EventTransport for TauriEventTransport<R> {
    fn deliver(&self, envelope: EventEnvelope) -> Result<()> {
        self.app
            .emit(EVENT_CHANNEL, &envelope)
            .with_context(|| format!("Failed to emit {}", envelope.name))
    }
}

pub struct TauriUiThread<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> UiThread for TauriUiThread<R> {
    fn dispatch(&self, task: UiTask) -> Result<()> {
        self.app
            .run_on_main_thread(task)
            .context("Failed to schedule task on the main thread")
    }
}

#[tauri::command]
async fn exec(
    bridge: State<'_, LabelBridge>,
    command: String,
    args: Option<Map<String, Value>>,
) -> Result<Value, BridgeError> {
    let args = args.map(CommandArgs::new).unwrap_or_default();
    bridge.exec(&command, args).await
}

#[tauri::command]
async fn get_defaults(bridge: State<'_, LabelBridge>) -> Result<Value, BridgeError> {
    bridge.exec("getDefaults", CommandArgs::default()).await
}

/// Build the plugin around `engine`. Configured from `plugins.label-capture` in the app
/// config, then from the environment.
pub fn init<R: Runtime>(
    engine: Arc<dyn LabelCaptureEngine>,
) -> TauriPlugin<R, Option<BridgeConfig>> {
    Builder::<R, Option<BridgeConfig>>::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![exec, get_defaults])
        .setup(move |app, api| {
            let config = api.config().clone().unwrap_or_default().with_env_overrides();
            logging::init(config.debug);

            let bridge = LabelBridge::new(
                engine,
                Arc::new(TauriUiThread { app: app.clone() }),
                Arc::new(ImageViewFactory),
                Arc::new(TauriEventTransport { app: app.clone() }),
                &config,
            );
            app.manage(bridge);
            log_info!("{PLUGIN_NAME} plugin initialised");
            Ok(())
        })
        .on_drop(|app| {
            if let Some(bridge) = app.try_state::<LabelBridge>() {
                bridge.shutdown();
            }
        })
        .build()
}
