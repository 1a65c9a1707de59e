use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ViewOptions {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Nested form produced by the TypeScript serializer.
    #[serde(default)]
    pub size: Option<ViewSize>,
    #[serde(default)]
    pub scale: Option<f64>,
}

/// Host-supplied, immutable description of a view: an encoded image plus sizing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ViewDescriptor {
    pub data: String,
    #[serde(default)]
    pub options: ViewOptions,
}

impl ViewDescriptor {
    /// Parse the JSON form. Image data is not touched here.
    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text)
            .map_err(|err| BridgeError::InvalidViewDescriptor(format!("invalid view JSON: {err}")))
    }

    fn requested_size(&self) -> (Option<f64>, Option<f64>) {
        let nested = self.options.size;
        (
            self.options.width.or(nested.map(|size| size.width)),
            self.options.height.or(nested.map(|size| size.height)),
        )
    }

    /// Decode the base64 payload into an RGBA bitmap.
    pub fn decode_image(&self) -> Result<RgbaImage> {
        let encoded = match self.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => self.data.as_str(),
        };
        let encoded = encoded.trim();
        if encoded.is_empty() {
            bail!("view data is empty");
        }

        let bytes = STANDARD
            .decode(encoded)
            .context("view data is not valid base64")?;
        let image = image::load_from_memory(&bytes).context("view data is not a decodable image")?;
        Ok(image.to_rgba8())
    }

    /// Explicit width/height win; otherwise the bitmap size divided by `scale`.
    pub fn resolve_size(&self, pixel_width: u32, pixel_height: u32) -> Result<ViewSize> {
        let (width, height) = self.requested_size();
        if let Some(width) = width {
            ensure_positive("width", width)?;
        }
        if let Some(height) = height {
            ensure_positive("height", height)?;
        }

        let scale = self.options.scale.unwrap_or(1.0);
        ensure_positive("scale", scale)?;
        if pixel_width == 0 || pixel_height == 0 {
            bail!("decoded image has zero size");
        }

        Ok(ViewSize {
            width: width.unwrap_or(pixel_width as f64 / scale),
            height: height.unwrap_or(pixel_height as f64 / scale),
        })
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(anyhow!("{name} must be positive, got {value}"));
    }
    Ok(())
}

/// A live platform view attached to a tracked label.
pub trait OverlayView: Send + Sync + fmt::Debug {
    fn size(&self) -> ViewSize;

    /// Detach from the overlay and free platform resources. Called on the UI thread.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Builds views from descriptors. Always invoked on the UI thread.
pub trait ViewFactory: Send + Sync {
    fn create_view(&self, descriptor: &ViewDescriptor) -> Option<Arc<dyn OverlayView>>;
}

/// Image view backed by the decoded descriptor bitmap.
pub struct ImageOverlayView {
    image: RgbaImage,
    size: ViewSize,
    released: AtomicBool,
}

impl ImageOverlayView {
    pub fn new(image: RgbaImage, size: ViewSize) -> Self {
        Self {
            image,
            size,
            released: AtomicBool::new(false),
        }
    }

    pub fn from_descriptor(descriptor: &ViewDescriptor) -> Result<Self> {
        let image = descriptor.decode_image()?;
        let size = descriptor.resolve_size(image.width(), image.height())?;
        Ok(Self::new(image, size))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl fmt::Debug for ImageOverlayView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageOverlayView")
            .field("pixels", &(self.image.width(), self.image.height()))
            .field("size", &self.size)
            .field("released", &self.is_released())
            .finish()
    }
}

impl OverlayView for ImageOverlayView {
    fn size(&self) -> ViewSize {
        self.size
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageViewFactory;

impl ViewFactory for ImageViewFactory {
    fn create_view(&self, descriptor: &ViewDescriptor) -> Option<Arc<dyn OverlayView>> {
        match ImageOverlayView::from_descriptor(descriptor) {
            Ok(view) => Some(Arc::new(view)),
            Err(err) => {
                log_warn!("could not build view from descriptor: {err:#}");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    pub(crate) fn png_base64(width: u32, height: u32) -> String {
        let image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    fn descriptor(data: String, options: ViewOptions) -> ViewDescriptor {
        ViewDescriptor { data, options }
    }

    #[test]
    fn parses_flat_and_nested_options() {
        let flat =
            ViewDescriptor::from_json(r#"{"data":"AA==","options":{"width":40,"height":20}}"#)
                .unwrap();
        assert_eq!(flat.requested_size(), (Some(40.0), Some(20.0)));

        let nested = ViewDescriptor::from_json(
            r#"{"data":"AA==","options":{"size":{"width":10,"height":5},"scale":2}}"#,
        )
        .unwrap();
        assert_eq!(nested.requested_size(), (Some(10.0), Some(5.0)));
        assert_eq!(nested.options.scale, Some(2.0));
    }

    #[test]
    fn rejects_non_json_descriptor() {
        let err = ViewDescriptor::from_json("not json").unwrap_err();
        assert_eq!(err.code(), "InvalidViewDescriptor");
    }

    #[test]
    fn explicit_size_wins_over_bitmap() {
        let view = ImageOverlayView::from_descriptor(&descriptor(
            png_base64(8, 4),
            ViewOptions {
                width: Some(100.0),
                height: Some(50.0),
                ..Default::default()
            },
        ))
        .unwrap();
        assert_eq!(view.size(), ViewSize { width: 100.0, height: 50.0 });
        assert_eq!(view.image().dimensions(), (8, 4));
    }

    #[test]
    fn implied_size_uses_scale() {
        let view = ImageOverlayView::from_descriptor(&descriptor(
            png_base64(8, 4),
            ViewOptions {
                scale: Some(2.0),
                ..Default::default()
            },
        ))
        .unwrap();
        assert_eq!(view.size(), ViewSize { width: 4.0, height: 2.0 });
    }

    #[test]
    fn accepts_data_url_prefix() {
        let data = format!("data:image/png;base64,{}", png_base64(2, 2));
        let with_prefix = descriptor(data, ViewOptions::default());
        assert!(ImageOverlayView::from_descriptor(&with_prefix).is_ok());
    }

    #[test]
    fn factory_yields_none_for_corrupt_data() {
        let factory = ImageViewFactory;
        let corrupt = descriptor("!!not-base64!!".into(), ViewOptions::default());
        assert!(factory.create_view(&corrupt).is_none());

        let not_an_image = descriptor(STANDARD.encode(b"hello"), ViewOptions::default());
        assert!(factory.create_view(&not_an_image).is_none());
    }

    #[test]
    fn factory_yields_none_for_non_positive_dimensions() {
        let factory = ImageViewFactory;
        let zero = descriptor(
            png_base64(2, 2),
            ViewOptions {
                width: Some(0.0),
                height: Some(10.0),
                ..Default::default()
            },
        );
        assert!(factory.create_view(&zero).is_none());

        let negative_scale = descriptor(
            png_base64(2, 2),
            ViewOptions {
                scale: Some(-1.0),
                ..Default::default()
            },
        );
        assert!(factory.create_view(&negative_scale).is_none());
    }

    #[test]
    fn release_is_observable() {
        let size = ViewSize {
            width: 1.0,
            height: 1.0,
        };
        let view = ImageOverlayView::new(RgbaImage::new(1, 1), size);
        assert!(!view.is_released());
        view.release();
        assert!(view.is_released());
    }
}
