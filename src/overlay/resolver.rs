use std::sync::Arc;

use tokio::sync::oneshot;

use crate::{error::BridgeError, ui::UiThread};

use super::view::{OverlayView, ViewDescriptor, ViewFactory};

/// Turns descriptors into live views on the UI thread.
#[derive(Clone)]
pub struct ViewResolver {
    ui: Arc<dyn UiThread>,
    factory: Arc<dyn ViewFactory>,
}

impl ViewResolver {
    pub fn new(ui: Arc<dyn UiThread>, factory: Arc<dyn ViewFactory>) -> Self {
        Self { ui, factory }
    }

    pub fn ui(&self) -> &Arc<dyn UiThread> {
        &self.ui
    }

    /// Queue view construction on the UI thread; `on_resolved` runs there exactly once
    /// with the view, or `None` when the descriptor could not be turned into one.
    ///
    /// If the UI thread refuses the task, `on_resolved` is dropped uncalled and the
    /// error is returned instead. Always asynchronous, even when called on the UI thread.
    pub fn resolve<F>(&self, descriptor: ViewDescriptor, on_resolved: F) -> Result<(), BridgeError>
    where
        F: FnOnce(Option<Arc<dyn OverlayView>>) + Send + 'static,
    {
        let factory = self.factory.clone();
        self.ui
            .dispatch(Box::new(move || {
                let view = factory.create_view(&descriptor);
                on_resolved(view);
            }))
            .map_err(|err| BridgeError::UiThreadUnavailable(err.to_string()))
    }

    /// Resolve and await the view from the worker side.
    pub async fn resolve_async(
        &self,
        descriptor: ViewDescriptor,
    ) -> Result<Arc<dyn OverlayView>, BridgeError> {
        let (view_tx, view_rx) = oneshot::channel();
        self.resolve(descriptor, move |view| {
            let _ = view_tx.send(view);
        })?;

        view_rx
            .await
            .map_err(|_| BridgeError::UiThreadUnavailable("view resolution was dropped".into()))?
            .ok_or_else(|| {
                BridgeError::InvalidViewDescriptor("view data could not be decoded".into())
            })
    }
}
