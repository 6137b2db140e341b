//! Control-Change wire format.
//!
//! Every frame exchanged with the controller is a 3-byte Control-Change message:
//! `[0xB0 | channel, slot, value]`. The channel selects what the frame talks about
//! (see [`Channel`]), the controller byte selects one of the 16 encoder slots.

use std::fmt;

/// Control-Change command nibble.
pub const CONTROL_CHANGE: u8 = 0xB;

/// Status byte for a Control-Change on channel 0.
pub const CC_STATUS: u8 = 0xB0;

/// Wire channels multiplexed onto the encoder slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// Rotary value (LED ring position / knob turns)
    Rotary = 0,
    /// Switch value and RGB color
    Switch = 1,
    /// Animation and brightness control
    Animation = 2,
}

impl Channel {
    /// Look up a channel from its low status nibble.
    pub fn from_u8(channel: u8) -> Option<Self> {
        match channel {
            0 => Some(Channel::Rotary),
            1 => Some(Channel::Switch),
            2 => Some(Channel::Animation),
            _ => None,
        }
    }

    /// Status byte used when writing on this channel.
    pub fn status(self) -> u8 {
        CC_STATUS | self as u8
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Rotary => write!(f, "ROT"),
            Channel::Switch => write!(f, "SWI"),
            Channel::Animation => write!(f, "ANI"),
        }
    }
}

/// Routing key combining the status byte and the slot index.
///
/// The high byte is the status (`0xB0 | channel`), the low byte the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub u16);

impl Address {
    /// Build the address a slot listens on for a given channel.
    pub fn new(channel: Channel, slot: u8) -> Self {
        Address(((channel.status() as u16) << 8) | slot as u16)
    }

    /// Command nibble (0xB for Control-Change).
    pub fn command(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Raw channel nibble.
    pub fn channel_nibble(self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    /// Channel, if it is one the controller uses.
    pub fn channel(self) -> Option<Channel> {
        Channel::from_u8(self.channel_nibble())
    }

    /// Slot index (controller byte).
    pub fn slot(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

/// A decoded 3-byte Control-Change frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcMessage {
    /// Command in the high nibble, channel in the low nibble
    pub status_channel: u8,
    /// Controller number, i.e. the slot index
    pub controller: u8,
    /// Value byte
    pub value: u8,
}

impl CcMessage {
    /// Decode a raw frame. Total: any three bytes decode.
    pub fn decode(bytes: [u8; 3]) -> Self {
        Self {
            status_channel: bytes[0],
            controller: bytes[1],
            value: bytes[2],
        }
    }

    /// Build an outbound frame for a slot on a channel.
    pub fn encode(channel: Channel, slot: u8, value: u8) -> Self {
        Self {
            status_channel: channel.status(),
            controller: slot,
            value,
        }
    }

    /// Raw bytes, ready for the transport.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.status_channel, self.controller, self.value]
    }

    /// Command nibble.
    pub fn command(&self) -> u8 {
        self.status_channel >> 4
    }

    /// Channel nibble.
    pub fn channel(&self) -> u8 {
        self.status_channel & 0x0F
    }

    /// Whether this frame is a Control-Change at all.
    pub fn is_control_change(&self) -> bool {
        self.command() == CONTROL_CHANGE
    }

    /// Routing key for this frame.
    pub fn address(&self) -> Address {
        Address(((self.status_channel as u16) << 8) | self.controller as u16)
    }
}

impl From<[u8; 3]> for CcMessage {
    fn from(bytes: [u8; 3]) -> Self {
        Self::decode(bytes)
    }
}

impl fmt::Display for CcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:x} : {:x} : {:x} : {:x}",
            self.command(),
            self.channel(),
            self.controller,
            self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_cc() {
        let msg = CcMessage::decode([0xB1, 3, 40]);
        assert_eq!(msg.command(), 0xB);
        assert_eq!(msg.channel(), 1);
        assert_eq!(msg.controller, 3);
        assert_eq!(msg.value, 40);
        assert!(msg.is_control_change());
    }

    #[test]
    fn test_decode_is_total() {
        // Note on, not a CC - still decodes, just not routable
        let msg = CcMessage::decode([0x9F, 0xFF, 0xFF]);
        assert_eq!(msg.command(), 0x9);
        assert_eq!(msg.channel(), 0xF);
        assert!(!msg.is_control_change());
    }

    #[test]
    fn test_encode_channels() {
        assert_eq!(CcMessage::encode(Channel::Rotary, 0, 64).to_bytes(), [0xB0, 0, 64]);
        assert_eq!(CcMessage::encode(Channel::Switch, 15, 127).to_bytes(), [0xB1, 15, 127]);
        assert_eq!(CcMessage::encode(Channel::Animation, 7, 95).to_bytes(), [0xB2, 7, 95]);
    }

    #[test]
    fn test_address_roundtrip() {
        let addr = Address::new(Channel::Switch, 9);
        assert_eq!(addr.0, 0xB109);
        assert_eq!(addr.command(), 0xB);
        assert_eq!(addr.channel(), Some(Channel::Switch));
        assert_eq!(addr.slot(), 9);

        let msg = CcMessage::decode([0xB1, 9, 0]);
        assert_eq!(msg.address(), addr);
    }

    #[test]
    fn test_unknown_channel() {
        let msg = CcMessage::decode([0xB5, 0, 0]);
        assert_eq!(msg.address().channel(), None);
        assert_eq!(msg.address().channel_nibble(), 5);
    }

    #[test]
    fn test_display() {
        let msg = CcMessage::decode([0xB0, 0x0A, 0x7F]);
        assert_eq!(msg.to_string(), "b : 0 : a : 7f");
    }
}
