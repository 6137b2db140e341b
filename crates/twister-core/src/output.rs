//! Outbound MIDI sinks
//!
//! The engine never owns the hardware transport. It writes through a shared
//! [`MidiOutput`] handle and skips writes when no transport is attached.

use crate::message::{CcMessage, Channel};
use std::sync::{Arc, Mutex};

/// MIDI output trait
pub trait MidiOutput: Send + Sync {
    /// Send raw bytes to the device. Failures are not reported back.
    fn send(&self, bytes: &[u8]);

    /// Get the port name
    fn port_name(&self) -> &str;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Non-owning handle to the output transport, shared by all encoders.
#[derive(Clone, Default)]
pub struct Outlet {
    output: Option<Arc<dyn MidiOutput>>,
}

impl Outlet {
    /// Wrap an optional transport.
    pub fn new(output: Option<Arc<dyn MidiOutput>>) -> Self {
        Self { output }
    }

    /// An outlet with nothing attached; every write is skipped.
    pub fn detached() -> Self {
        Self { output: None }
    }

    /// Whether writes currently reach a device.
    pub fn is_available(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.is_connected())
    }

    /// Write one Control-Change frame, fire-and-forget.
    pub fn write(&self, channel: Channel, slot: u8, value: u8) {
        let Some(output) = self.output.as_ref().filter(|o| o.is_connected()) else {
            log::debug!("no MIDI output, skipping {} {} : {}", slot, channel, value);
            return;
        };

        let msg = CcMessage::encode(channel, slot, value);
        output.send(&msg.to_bytes());
        log::trace!(">> {:2} {} : {:3}", slot, channel, value);
    }
}

/// Dummy MIDI output (for testing or when no backend is available)
pub struct DummyMidiOutput;

impl MidiOutput for DummyMidiOutput {
    fn send(&self, bytes: &[u8]) {
        log::debug!("MIDI out (dummy): {:02x?}", bytes);
    }

    fn port_name(&self) -> &str {
        "dummy"
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Output that records every frame it is handed.
///
/// Useful for driving the engine without hardware and asserting on what would
/// have gone over the wire.
#[derive(Default)]
pub struct CaptureOutput {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl CaptureOutput {
    /// Create an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded Control-Change frames, leaving the capture empty.
    pub fn take(&self) -> Vec<CcMessage> {
        let frames = std::mem::take(&mut *self.frames.lock().unwrap_or_else(|e| e.into_inner()));
        frames
            .into_iter()
            .filter_map(|f| <[u8; 3]>::try_from(f.as_slice()).ok())
            .map(CcMessage::decode)
            .collect()
    }

    /// Number of frames recorded so far.
    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MidiOutput for CaptureOutput {
    fn send(&self, bytes: &[u8]) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(bytes.to_vec());
    }

    fn port_name(&self) -> &str {
        "capture"
    }

    fn is_connected(&self) -> bool {
        true
    }
}
