//! Live links between an encoder slot and a host parameter.

use crate::encoder::{self, SharedEncoder};
use crate::mapping::{
    bool_to_controller, controller_to_bool, controller_to_float, float_to_controller,
};
use crate::param::{Param, ParamId, Subscription};

/// Value range captured when the binding was made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingRange {
    /// Float parameter, `[min, max]`
    Numeric { min: f32, max: f32 },
    /// Boolean parameter, fixed `{false, true}`
    Boolean,
}

/// Both directions of one slot/parameter link.
///
/// Dropping a binding cancels the parameter subscription; the inbound direction only
/// holds a weak handle, so it never keeps a parameter alive.
pub struct Binding {
    target: ParamId,
    range: BindingRange,
    _subscription: Subscription,
    update_parameter: Box<dyn Fn(u8) -> bool + Send>,
}

impl Binding {
    /// Link a float parameter to a slot already in rotary state.
    pub fn numeric(param: &Param<f32>, encoder: &SharedEncoder) -> Self {
        let (min, max) = (param.min(), param.max());

        let listener_encoder = SharedEncoder::clone(encoder);
        let subscription = param.subscribe(move |v| {
            encoder::lock(&listener_encoder).set_value(float_to_controller(*v, min, max));
        });

        let weak = param.downgrade();
        let update_parameter = Box::new(move |value: u8| match weak.upgrade() {
            Some(param) => {
                param.set(controller_to_float(value, min, max));
                true
            }
            None => false,
        });

        Self {
            target: param.id(),
            range: BindingRange::Numeric { min, max },
            _subscription: subscription,
            update_parameter,
        }
    }

    /// Link a boolean parameter to a slot already in switch state.
    pub fn boolean(param: &Param<bool>, encoder: &SharedEncoder) -> Self {
        let listener_encoder = SharedEncoder::clone(encoder);
        let subscription = param.subscribe(move |v| {
            encoder::lock(&listener_encoder).set_value(bool_to_controller(*v));
        });

        let weak = param.downgrade();
        let update_parameter = Box::new(move |value: u8| match weak.upgrade() {
            Some(param) => {
                param.set(controller_to_bool(value));
                true
            }
            None => false,
        });

        Self {
            target: param.id(),
            range: BindingRange::Boolean,
            _subscription: subscription,
            update_parameter,
        }
    }

    /// Identity of the bound parameter.
    pub fn target(&self) -> ParamId {
        self.target
    }

    pub fn range(&self) -> BindingRange {
        self.range
    }

    /// Write a controller value into the parameter. Returns false if the host
    /// has already dropped it.
    ///
    /// Must not be called while holding the slot's encoder lock: the parameter's
    /// listeners write back through that encoder.
    pub fn apply(&self, value: u8) -> bool {
        (self.update_parameter)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{Encoder, EncoderState};
    use crate::message::CcMessage;
    use crate::output::{CaptureOutput, Outlet};
    use std::sync::Arc;

    fn rotary_encoder(capture: &Arc<CaptureOutput>) -> SharedEncoder {
        let encoder = Encoder::shared(0, Outlet::new(Some(capture.clone())));
        encoder::lock(&encoder).set_state(EncoderState::Rotary, false);
        capture.take();
        encoder
    }

    #[test]
    fn test_numeric_both_directions() {
        let capture = Arc::new(CaptureOutput::new());
        let encoder = rotary_encoder(&capture);
        let param = Param::new("cutoff", 100.0_f32, 100.0, 1100.0);
        let binding = Binding::numeric(&param, &encoder);
        assert_eq!(binding.range(), BindingRange::Numeric { min: 100.0, max: 1100.0 });
        assert_eq!(binding.target(), param.id());

        param.set(1100.0);
        assert_eq!(capture.take(), vec![CcMessage::decode([0xB0, 0, 127])]);

        assert!(binding.apply(0));
        assert_eq!(param.get(), 100.0);
        // the host-visible write echoes back to the ring
        assert_eq!(capture.take(), vec![CcMessage::decode([0xB0, 0, 0])]);
    }

    #[test]
    fn test_boolean_threshold() {
        let capture = Arc::new(CaptureOutput::new());
        let encoder = Encoder::shared(1, Outlet::new(Some(capture.clone())));
        encoder::lock(&encoder).set_state(EncoderState::Switch, false);
        let param = Param::toggle("mute", true);
        let binding = Binding::boolean(&param, &encoder);

        binding.apply(40);
        assert!(!param.get());
        binding.apply(64);
        assert!(param.get());
    }

    #[test]
    fn test_drop_cancels_subscription() {
        let capture = Arc::new(CaptureOutput::new());
        let encoder = rotary_encoder(&capture);
        let param = Param::new("x", 0.0_f32, 0.0, 1.0);
        let binding = Binding::numeric(&param, &encoder);
        assert_eq!(param.listener_count(), 1);

        drop(binding);
        assert_eq!(param.listener_count(), 0);
        param.set(1.0);
        assert!(capture.is_empty());
    }

    #[test]
    fn test_apply_after_host_dropped_param() {
        let capture = Arc::new(CaptureOutput::new());
        let encoder = rotary_encoder(&capture);
        let param = Param::new("x", 0.0_f32, 0.0, 1.0);
        let binding = Binding::numeric(&param, &encoder);
        drop(param);
        assert!(!binding.apply(127));
        assert!(capture.is_empty());
    }
}
