#![allow(dead_code)]

use std::{
    io::Cursor,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use label_capture_bridge_lib::{
    overlay::ViewDescriptor, BridgeConfig, CommandArgs, EventEnvelope, EventTransport,
    ImageViewFactory, InMemoryLabelEngine, LabelBridge, OverlayView, ViewFactory,
};
use serde_json::Value;

pub const MODE_ID: i32 = 1;
pub const VIEW_ID: i32 = 1;

#[derive(Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<EventEnvelope>>,
}

impl RecordingTransport {
    pub fn names(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn payloads(&self, name: &str) -> Vec<Value> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name == name)
            .map(|e| serde_json::from_str(&e.data).unwrap())
            .collect()
    }
}

impl EventTransport for RecordingTransport {
    fn deliver(&self, envelope: EventEnvelope) -> Result<()> {
        self.delivered.lock().unwrap().push(envelope);
        Ok(())
    }
}

pub struct TestBridge {
    pub bridge: LabelBridge,
    pub engine: Arc<InMemoryLabelEngine>,
    pub transport: Arc<RecordingTransport>,
}

pub fn bridge() -> TestBridge {
    let config = BridgeConfig {
        session_callback_timeout_ms: 200,
        ..BridgeConfig::default()
    };
    bridge_with(config)
}

pub fn bridge_with(config: BridgeConfig) -> TestBridge {
    bridge_with_factory(config, Arc::new(ImageViewFactory))
}

pub fn bridge_with_factory(config: BridgeConfig, factory: Arc<dyn ViewFactory>) -> TestBridge {
    let engine = Arc::new(InMemoryLabelEngine::new());
    engine.add_mode(MODE_ID);
    engine.add_data_capture_view(VIEW_ID);
    let transport = Arc::new(RecordingTransport::default());
    let bridge =
        LabelBridge::with_dedicated_ui(engine.clone(), factory, transport.clone(), &config)
            .unwrap();
    TestBridge {
        bridge,
        engine,
        transport,
    }
}

/// Image factory that keeps every view it built.
#[derive(Default)]
pub struct RecordingFactory {
    built: Mutex<Vec<Arc<dyn OverlayView>>>,
}

impl RecordingFactory {
    pub fn built(&self) -> Vec<Arc<dyn OverlayView>> {
        self.built.lock().unwrap().clone()
    }
}

impl ViewFactory for RecordingFactory {
    fn create_view(&self, descriptor: &ViewDescriptor) -> Option<Arc<dyn OverlayView>> {
        let view = ImageViewFactory.create_view(descriptor)?;
        self.built.lock().unwrap().push(view.clone());
        Some(view)
    }
}

pub fn args(value: Value) -> CommandArgs {
    CommandArgs::from_value(value)
}

pub fn png_base64(width: u32, height: u32) -> String {
    let image = RgbaImage::from_pixel(width, height, Rgba([0, 128, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    STANDARD.encode(bytes.into_inner())
}
