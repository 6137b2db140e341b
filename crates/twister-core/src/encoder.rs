//! Per-slot encoder state machine.
//!
//! Each of the 16 slots is either disabled, a rotary control, or a switch. The state
//! decides which wire channel the slot writes values on, and a state change sends the
//! LED setup for the new state.

use crate::mapping::unit_to_byte;
use crate::message::Channel;
use crate::output::Outlet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Rotary ring brightness range on the animation channel
pub const ROTARY_BRIGHTNESS: (u8, u8) = (65, 95);

/// RGB brightness range on the animation channel
pub const RGB_BRIGHTNESS: (u8, u8) = (17, 47);

/// Hue range on the switch channel
pub const RGB_HUE: (u8, u8) = (1, 126);

/// Animation byte that stops any running animation
pub const ANIMATION_OFF: u8 = 0;

/// Encoder behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderState {
    /// Neither knob nor button is active
    #[default]
    Disabled,
    /// Knob mode, values on channel 0
    Rotary,
    /// Button mode, values on channel 1
    Switch,
}

impl EncoderState {
    /// Channel values are exchanged on in this state.
    pub fn value_channel(self) -> Option<Channel> {
        match self {
            EncoderState::Disabled => None,
            EncoderState::Rotary => Some(Channel::Rotary),
            EncoderState::Switch => Some(Channel::Switch),
        }
    }
}

impl fmt::Display for EncoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderState::Disabled => write!(f, "disabled"),
            EncoderState::Rotary => write!(f, "rotary"),
            EncoderState::Switch => write!(f, "switch"),
        }
    }
}

/// LED animation patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Hard on/off blinking
    Strobe,
    /// Smooth fade in and out
    Pulse,
    /// Hue cycle, RGB LED only
    Rainbow,
}

impl Animation {
    /// Animation byte for the RGB LED at `rate` (0-7).
    pub fn rgb_mode(self, rate: u8) -> u8 {
        match self {
            Animation::Strobe => 1 + rate,
            Animation::Pulse => 9 + rate,
            Animation::Rainbow => 127,
        }
    }

    /// Animation byte for the rotary ring at `rate` (0-7). The ring has no rainbow.
    pub fn rotary_mode(self, rate: u8) -> Option<u8> {
        match self {
            Animation::Strobe => Some(49 + rate),
            Animation::Pulse => Some(57 + rate),
            Animation::Rainbow => None,
        }
    }
}

/// One physical encoder slot.
pub struct Encoder {
    position: u8,
    state: EncoderState,
    value: u8,
    outlet: Outlet,
}

/// Encoder shared between the binding manager and parameter listeners.
pub type SharedEncoder = Arc<Mutex<Encoder>>;

/// Lock a shared encoder, recovering the data if a listener panicked while holding it.
pub fn lock(encoder: &SharedEncoder) -> MutexGuard<'_, Encoder> {
    encoder.lock().unwrap_or_else(|e| e.into_inner())
}

impl Encoder {
    /// Create a disabled encoder at `position`.
    pub fn new(position: u8, outlet: Outlet) -> Self {
        Self {
            position,
            state: EncoderState::Disabled,
            value: 0,
            outlet,
        }
    }

    /// Wrap for sharing.
    pub fn shared(position: u8, outlet: Outlet) -> SharedEncoder {
        Arc::new(Mutex::new(Self::new(position, outlet)))
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Last value written on the value channel.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Switch to `state`, sending the LED setup for it.
    ///
    /// Re-entering the current state is a no-op unless `force` is set.
    pub fn set_state(&mut self, state: EncoderState, force: bool) {
        if state == self.state && !force {
            return;
        }

        match state {
            EncoderState::Disabled => {
                self.send_to_switch(0);
                self.send_to_rotary(0);
                self.set_brightness_rotary(0.0);
                self.set_brightness_rgb(1.0);
                self.set_animation(ANIMATION_OFF);
            }
            EncoderState::Rotary => {
                self.send_to_switch(0);
                self.set_brightness_rotary(1.0);
                self.set_brightness_rgb(0.0);
            }
            EncoderState::Switch => {
                self.send_to_rotary(0);
                self.set_brightness_rotary(0.0);
                self.set_brightness_rgb(1.0);
            }
        }

        self.state = state;
    }

    /// Write a value on the channel of the current state.
    pub fn set_value(&mut self, value: u8) {
        match self.state {
            EncoderState::Disabled => {
                log::error!("cannot send value to disabled encoder {}", self.position);
            }
            EncoderState::Rotary => self.send_to_rotary(value),
            EncoderState::Switch => self.send_to_switch(value),
        }
    }

    pub fn send_to_switch(&mut self, value: u8) {
        self.outlet.write(Channel::Switch, self.position, value);
        self.value = value;
    }

    pub fn send_to_rotary(&mut self, value: u8) {
        self.outlet.write(Channel::Rotary, self.position, value);
        self.value = value;
    }

    /// Set the RGB hue, `hue` in `[0, 1]`.
    pub fn set_hue_rgb(&self, hue: f32) {
        let (low, high) = RGB_HUE;
        self.outlet.write(Channel::Switch, self.position, unit_to_byte(hue, low, high));
    }

    /// Set the rotary ring brightness, `brightness` in `[0, 1]`.
    pub fn set_brightness_rotary(&self, brightness: f32) {
        let (low, high) = ROTARY_BRIGHTNESS;
        self.outlet
            .write(Channel::Animation, self.position, unit_to_byte(brightness, low, high));
    }

    /// Set the RGB LED brightness, `brightness` in `[0, 1]`.
    pub fn set_brightness_rgb(&self, brightness: f32) {
        let (low, high) = RGB_BRIGHTNESS;
        self.outlet
            .write(Channel::Animation, self.position, unit_to_byte(brightness, low, high));
    }

    /// Write a raw animation byte.
    pub fn set_animation(&self, mode: u8) {
        self.outlet.write(Channel::Animation, self.position, mode);
    }
}
