//! Engine-side session handling: pruning overlays of lost labels, announcing new
//! ones and suspending each update until the host answers.

mod bridge;
mod callbacks;
pub mod types;

pub use bridge::{SessionBridge, SessionCallbackOutcome};
pub use callbacks::SessionCallbacks;
pub use types::{CapturedLabel, LabelCaptureSession, LabelField, Point, Quadrilateral};
