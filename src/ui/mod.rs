//! The UI-owning execution context.
//!
//! Views may only be created, attached and released on the thread that owns the UI.
//! Worker-side code reaches it through [`UiThread::dispatch`] or [`run_on_ui`].

mod dedicated;

pub use dedicated::DedicatedUiThread;

use anyhow::Result;
use tokio::sync::oneshot;

use crate::error::BridgeError;

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

pub trait UiThread: Send + Sync {
    /// Queue `task` on the UI thread. Tasks run in submission order.
    fn dispatch(&self, task: UiTask) -> Result<()>;

    /// Whether the calling thread is the UI thread, when the platform can tell.
    fn is_current(&self) -> bool {
        false
    }
}

/// Run `f` on the UI thread and wait for its value from the worker side.
pub async fn run_on_ui<F, T>(ui: &dyn UiThread, f: F) -> Result<T, BridgeError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (reply_tx, reply_rx) = oneshot::channel();

    ui.dispatch(Box::new(move || {
        let _ = reply_tx.send(f());
    }))
    .map_err(|err| BridgeError::UiThreadUnavailable(err.to_string()))?;

    reply_rx
        .await
        .map_err(|_| BridgeError::UiThreadUnavailable("UI task dropped before completing".into()))
}
