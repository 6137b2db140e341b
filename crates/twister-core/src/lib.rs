//! twister-core - Binding and protocol engine for 16-encoder MIDI controllers
//!
//! Binds host parameters to the encoders of a Midi Fighter Twister style
//! controller and keeps both sides in sync. Features include:
//!
//! - Control-Change codec for the controller's three-channel protocol
//! - Per-encoder state machine (disabled / rotary / switch) with LED feedback
//! - Float and boolean parameters with change listeners
//! - Lock-free hand-off of inbound frames to a per-frame poll
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use twister_core::{InboundQueue, Parameter, Twister};
//!
//! let cutoff = Parameter::float("cutoff", 0.5, 0.0, 1.0);
//! let bypass = Parameter::toggle("bypass", false);
//!
//! // No output attached: writes are skipped until a transport is connected
//! let mut twister = Twister::new(None, InboundQueue::default());
//! twister.set_params(&[cutoff, bypass]);
//!
//! // Once per frame, on the thread that owns the parameters
//! twister.update();
//! ```

pub mod binding;
pub mod config;
pub mod encoder;
pub mod error;
pub mod inbound;
pub mod mapping;
pub mod message;
#[cfg(feature = "native")]
pub mod midi;
pub mod output;
pub mod param;
pub mod twister;

// Re-export main types
pub use config::{Config, DeviceSettings, EngineSettings, ParamKind, ParamSpec};
pub use encoder::{Animation, Encoder, EncoderState};
pub use error::{Error, Result};
pub use inbound::{InboundQueue, InboundSender};
pub use message::{Address, CcMessage, Channel};
pub use output::MidiOutput;
pub use param::{Param, ParamId, Parameter, ParameterGroup, Subscription};
pub use twister::{BindReport, Twister, SLOT_COUNT};
