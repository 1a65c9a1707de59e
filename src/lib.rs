//! Bridge between a native label capture engine and a host application.
//!
//! Host commands arrive by name with a flat JSON argument bag and are handled by
//! [`LabelBridge::exec`]. Engine callbacks go through [`SessionBridge`], which keeps
//! the overlay bindings in step with what the engine still tracks and forwards events
//! to whoever subscribed. Platform specifics sit behind four traits:
//! [`LabelCaptureEngine`], [`UiThread`], [`ViewFactory`] and [`EventTransport`].

pub mod bridge;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod identifier;
pub mod overlay;
#[cfg(feature = "tauri")]
pub mod plugin;
pub mod session;
pub mod ui;
pub mod utils;

pub use bridge::LabelBridge;
pub use commands::{Command, CommandArgs};
pub use config::BridgeConfig;
pub use engine::{EngineError, InMemoryLabelEngine, LabelCaptureEngine};
pub use error::BridgeError;
pub use events::{EventEnvelope, EventTransport, LabelCaptureEvent};
pub use identifier::{DataCaptureViewId, LabelKey, ModeId, TrackingId};
pub use overlay::{ImageViewFactory, OverlayView, ViewFactory};
pub use session::{SessionBridge, SessionCallbackOutcome};
pub use ui::{DedicatedUiThread, UiThread};
