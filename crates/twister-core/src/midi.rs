//! Native MIDI transport (via midir)
//!
//! Finds the controller by port-name prefix, feeds its input into an
//! [`InboundSender`] and exposes its output as a [`MidiOutput`].

use crate::config::DeviceSettings;
use crate::error::{Error, Result};
use crate::inbound::InboundSender;
use crate::output::MidiOutput;
use midir::{MidiInput, MidiInputConnection, MidiInputPort, MidiOutputConnection, MidiOutputPort};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Input and output port names visible to this client.
#[derive(Debug, Clone, Default)]
pub struct PortListing {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// List every MIDI port on the system.
pub fn list_ports() -> Result<PortListing> {
    let midi_in = MidiInput::new("twister-probe")
        .map_err(|e| Error::Midi(format!("Failed to create MIDI input: {}", e)))?;
    let midi_out = midir::MidiOutput::new("twister-probe")
        .map_err(|e| Error::Midi(format!("Failed to create MIDI output: {}", e)))?;

    let inputs = midi_in
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_in.port_name(p).unwrap_or_else(|_| format!("Unknown Device {}", i)))
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_out.port_name(p).unwrap_or_else(|_| format!("Unknown Device {}", i)))
        .collect();

    Ok(PortListing { inputs, outputs })
}

/// Live connection to the controller. Dropping it closes both ports.
pub struct TwisterConnection {
    input: Option<MidiInputConnection<()>>,
    output: Option<Arc<MidirOutput>>,
}

impl TwisterConnection {
    /// Output handle for the engine, if an output port was found.
    pub fn output(&self) -> Option<Arc<dyn MidiOutput>> {
        self.output.clone().map(|o| o as Arc<dyn MidiOutput>)
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }
}

/// Connect to the first input and output port whose name starts with
/// `settings.port_prefix`.
///
/// A missing port is logged and left unconnected; the engine keeps running
/// without it.
pub fn connect(settings: &DeviceSettings, inbound: InboundSender) -> Result<TwisterConnection> {
    let midi_in = MidiInput::new(&settings.client_name)
        .map_err(|e| Error::Midi(format!("Failed to create MIDI input: {}", e)))?;
    let midi_out = midir::MidiOutput::new(&settings.client_name)
        .map_err(|e| Error::Midi(format!("Failed to create MIDI output: {}", e)))?;

    let input = match find_input(&midi_in, &settings.port_prefix) {
        Some((port, name)) => {
            let connection = midi_in
                .connect(
                    &port,
                    "twister-input",
                    move |_timestamp, bytes, _| {
                        inbound.push_raw(bytes);
                    },
                    (),
                )
                .map_err(|e| Error::Midi(format!("Failed to connect to {}: {}", name, e)))?;
            log::info!("Connected MIDI input: {}", name);
            Some(connection)
        }
        None => {
            log::warn!("No MIDI input port matching '{}'", settings.port_prefix);
            None
        }
    };

    let output = match find_output(&midi_out, &settings.port_prefix) {
        Some((port, name)) => {
            let connection = midi_out
                .connect(&port, "twister-output")
                .map_err(|e| Error::Midi(format!("Failed to connect to {}: {}", name, e)))?;
            log::info!("Connected MIDI output: {}", name);
            Some(Arc::new(MidirOutput::new(connection, name)))
        }
        None => {
            log::warn!("No MIDI output port matching '{}'", settings.port_prefix);
            None
        }
    };

    Ok(TwisterConnection {
        input,
        output,
    })
}

fn find_input(midi_in: &MidiInput, prefix: &str) -> Option<(MidiInputPort, String)> {
    midi_in.ports().into_iter().find_map(|port| {
        let name = midi_in.port_name(&port).ok()?;
        name.starts_with(prefix).then_some((port, name))
    })
}

fn find_output(midi_out: &midir::MidiOutput, prefix: &str) -> Option<(MidiOutputPort, String)> {
    midi_out.ports().into_iter().find_map(|port| {
        let name = midi_out.port_name(&port).ok()?;
        name.starts_with(prefix).then_some((port, name))
    })
}

/// midir output port
pub struct MidirOutput {
    connection: Mutex<MidiOutputConnection>,
    port_name: String,
    connected: AtomicBool,
}

impl MidirOutput {
    fn new(connection: MidiOutputConnection, port_name: String) -> Self {
        Self {
            connection: Mutex::new(connection),
            port_name,
            connected: AtomicBool::new(true),
        }
    }
}

impl MidiOutput for MidirOutput {
    fn send(&self, bytes: &[u8]) {
        let mut connection = self.connection.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = connection.send(bytes) {
            // Stop writing after the first failure; the device is most likely gone.
            log::warn!("MIDI send to {} failed: {}", self.port_name, e);
            self.connected.store(false, Ordering::Relaxed);
        }
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
