//! Binding manager for the 16 encoder slots.
//!
//! [`Twister`] attaches up to 16 host parameters to the controller, keeps hardware
//! and software values mirrored, and routes inbound frames to the bound parameters.
//!
//! Float parameters bind as rotary controls, boolean parameters as switches. A
//! parameter change on the host side goes out to the controller immediately; frames
//! coming from the controller are queued by the transport thread and applied in
//! [`Twister::update`].

use crate::binding::Binding;
use crate::encoder::{self, Animation, Encoder, EncoderState, SharedEncoder};
use crate::error::{Error, Result};
use crate::inbound::{InboundQueue, InboundSender};
use crate::mapping::{bool_to_controller, float_to_controller};
use crate::output::{MidiOutput, Outlet};
use crate::param::{Param, Parameter};
use std::sync::Arc;

/// Number of physical encoders.
pub const SLOT_COUNT: usize = 16;

/// Highest accepted animation rate.
pub const MAX_ANIMATION_RATE: u8 = 7;

/// Outcome of [`Twister::set_params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindReport {
    /// Slots now bound to a parameter
    pub bound: usize,
    /// Slots left disabled
    pub disabled: usize,
    /// Parameters beyond the 16th, not bound
    pub ignored: usize,
}

struct Slot {
    encoder: SharedEncoder,
    binding: Option<Binding>,
}

/// Binding manager and inbound router.
pub struct Twister {
    slots: [Slot; SLOT_COUNT],
    inbound: InboundQueue,
}

impl Twister {
    /// Create a manager writing to `output` and reading from `inbound`.
    ///
    /// All slots start disabled; nothing is sent until parameters are bound.
    pub fn new(output: Option<Arc<dyn MidiOutput>>, inbound: InboundQueue) -> Self {
        let outlet = Outlet::new(output);
        let slots = std::array::from_fn(|i| Slot {
            encoder: Encoder::shared(i as u8, outlet.clone()),
            binding: None,
        });
        Self { slots, inbound }
    }

    /// Producer handle for the transport's input callback.
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound.sender()
    }

    /// Replace the bound parameter set.
    ///
    /// Existing bindings are torn down first. Parameters are assigned to slots in
    /// order; anything past the 16th is ignored with a warning, and slots without a
    /// parameter are disabled.
    pub fn set_params(&mut self, group: &[Parameter]) -> BindReport {
        log::info!("Updating mapping ({} parameters)", group.len());

        for index in 0..SLOT_COUNT {
            if self.slots[index].binding.is_some() {
                self.clear_slot(index, true);
            }
        }

        let mut params = group.iter();
        for index in 0..SLOT_COUNT {
            match params.next() {
                Some(param) => self.bind_slot(index, param),
                None => self.clear_slot(index, true),
            }
        }

        // a parameter listed twice only stays on its last slot
        let bound = self.bound_count();
        let report = BindReport {
            bound,
            disabled: SLOT_COUNT - bound,
            ignored: params.count(),
        };
        if report.ignored > 0 {
            log::warn!(
                "{} parameters offered, only {} encoders available; ignoring {}",
                group.len(),
                SLOT_COUNT,
                report.ignored
            );
        }

        report
    }

    /// Bind a single parameter to slot `index`, leaving other slots alone.
    ///
    /// A parameter already bound to another slot is unbound there first. Text
    /// parameters cannot be bound; the slot is disabled instead.
    pub fn set_param(&mut self, index: usize, param: &Parameter) -> Result<()> {
        check_slot(index)?;
        self.bind_slot(index, param);
        Ok(())
    }

    /// Unbind slot `index` and disable it.
    pub fn clear_param(&mut self, index: usize, force: bool) -> Result<()> {
        check_slot(index)?;
        self.clear_slot(index, force);
        Ok(())
    }

    /// Unbind and force-disable every slot.
    pub fn clear(&mut self) {
        for index in 0..SLOT_COUNT {
            self.clear_slot(index, true);
        }
    }

    /// Apply every queued inbound frame. Returns how many reached a parameter.
    ///
    /// Frames for unbound slots, or on a channel the slot is not listening on, are
    /// dropped.
    pub fn update(&mut self) -> usize {
        let mut applied = 0;

        for msg in self.inbound.drain() {
            if !msg.is_control_change() {
                log::debug!("dropping non-CC frame {}", msg);
                continue;
            }

            let address = msg.address();
            let Some(channel) = address.channel() else {
                continue;
            };
            let Some(slot) = self.slots.get(address.slot() as usize) else {
                log::debug!("dropping frame for unknown slot {}", address.slot());
                continue;
            };

            let state = encoder::lock(&slot.encoder).state();
            if state.value_channel() != Some(channel) {
                continue;
            }

            // encoder lock is released here; the parameter write echoes through it
            if slot.binding.as_ref().is_some_and(|b| b.apply(msg.value)) {
                applied += 1;
            }
        }

        applied
    }

    /// Current state of slot `index`.
    pub fn state(&self, index: usize) -> Option<EncoderState> {
        self.slots
            .get(index)
            .map(|slot| encoder::lock(&slot.encoder).state())
    }

    /// Last value written on slot `index`'s value channel.
    pub fn last_sent_value(&self, index: usize) -> Option<u8> {
        self.slots
            .get(index)
            .map(|slot| encoder::lock(&slot.encoder).value())
    }

    /// Whether slot `index` holds a binding.
    pub fn is_bound(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.binding.is_some())
    }

    /// Number of slots holding a binding.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.binding.is_some()).count()
    }

    /// Set the RGB hue of slot `index`, `hue` in `[0, 1]`.
    pub fn set_hue_rgb(&self, index: usize, hue: f32) -> Result<()> {
        self.with_encoder(index, |e| e.set_hue_rgb(hue))
    }

    /// Set the RGB brightness of slot `index`, `brightness` in `[0, 1]`.
    pub fn set_brightness_rgb(&self, index: usize, brightness: f32) -> Result<()> {
        self.with_encoder(index, |e| e.set_brightness_rgb(brightness))
    }

    /// Set the rotary ring brightness of slot `index`, `brightness` in `[0, 1]`.
    pub fn set_brightness_rotary(&self, index: usize, brightness: f32) -> Result<()> {
        self.with_encoder(index, |e| e.set_brightness_rotary(brightness))
    }

    /// Start an RGB animation on slot `index` at `rate` (0-7).
    pub fn set_animation_rgb(&self, index: usize, animation: Animation, rate: u8) -> Result<()> {
        check_rate(rate)?;
        self.with_encoder(index, |e| e.set_animation(animation.rgb_mode(rate)))
    }

    /// Start a rotary ring animation on slot `index` at `rate` (0-7).
    pub fn set_animation_rotary(&self, index: usize, animation: Animation, rate: u8) -> Result<()> {
        check_rate(rate)?;
        let mode = animation
            .rotary_mode(rate)
            .ok_or(Error::UnsupportedAnimation)?;
        self.with_encoder(index, |e| e.set_animation(mode))
    }

    fn with_encoder(&self, index: usize, f: impl FnOnce(&mut Encoder)) -> Result<()> {
        check_slot(index)?;
        f(&mut encoder::lock(&self.slots[index].encoder));
        Ok(())
    }

    fn bind_slot(&mut self, index: usize, param: &Parameter) {
        let target = param.id();
        let previous = (0..SLOT_COUNT).find(|&i| {
            i != index
                && self.slots[i]
                    .binding
                    .as_ref()
                    .is_some_and(|b| b.target() == target)
        });
        if let Some(other) = previous {
            log::debug!("'{}' moves from slot {} to slot {}", param.name(), other, index);
            self.clear_slot(other, false);
        }

        // drop the old link before the new one starts writing
        self.slots[index].binding = None;

        let binding = match param {
            Parameter::Numeric(p) => self.bind_numeric(index, p),
            Parameter::Boolean(p) => self.bind_boolean(index, p),
            Parameter::Text(p) => {
                log::debug!("cannot bind text parameter '{}' to slot {}", p.name(), index);
                self.clear_slot(index, true);
                return;
            }
        };

        log::debug!("slot {} bound to '{}' {:?}", index, param.name(), binding.range());
        self.slots[index].binding = Some(binding);
    }

    fn bind_numeric(&self, index: usize, param: &Param<f32>) -> Binding {
        let encoder = &self.slots[index].encoder;
        {
            let mut e = encoder::lock(encoder);
            e.set_state(EncoderState::Rotary, false);
            e.set_value(float_to_controller(param.get(), param.min(), param.max()));
        }
        Binding::numeric(param, encoder)
    }

    fn bind_boolean(&self, index: usize, param: &Param<bool>) -> Binding {
        let encoder = &self.slots[index].encoder;
        {
            let mut e = encoder::lock(encoder);
            e.set_state(EncoderState::Switch, false);
            e.set_value(bool_to_controller(param.get()));
        }
        Binding::boolean(param, encoder)
    }

    fn clear_slot(&mut self, index: usize, force: bool) {
        let slot = &mut self.slots[index];
        slot.binding = None;
        encoder::lock(&slot.encoder).set_state(EncoderState::Disabled, force);
    }
}

fn check_slot(index: usize) -> Result<()> {
    if index < SLOT_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidSlot(index))
    }
}

fn check_rate(rate: u8) -> Result<()> {
    if rate <= MAX_ANIMATION_RATE {
        Ok(())
    } else {
        Err(Error::InvalidRate(rate))
    }
}
