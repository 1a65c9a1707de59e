pub mod brushes;
pub mod resolver;
pub mod store;
pub mod types;
pub mod view;

pub use brushes::BrushStore;
pub use resolver::ViewResolver;
pub use store::{OverlayBinding, OverlayStore};
pub use types::{Anchor, Brush, FloatWithUnit, MeasureUnit, PointWithUnit};
pub use view::{
    ImageOverlayView, ImageViewFactory, OverlayView, ViewDescriptor, ViewFactory, ViewSize,
};
