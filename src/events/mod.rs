pub mod emitter;
pub mod names;
pub mod registry;

pub use emitter::{EventEmitter, EventEnvelope, EventTransport};
pub use names::{EventCategory, LabelCaptureEvent};
pub use registry::{ListenerRegistry, ListenerScope};
