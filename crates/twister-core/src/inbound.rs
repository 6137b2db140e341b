//! Hand-off of inbound frames from the MIDI callback thread to the poll loop.
//!
//! The transport calls [`InboundSender::push_raw`] on its own thread whenever the
//! device sends something. The application thread drains the queue once per frame
//! without ever blocking the producer.

use crate::message::CcMessage;
use crossbeam_channel::{bounded, Receiver, Sender, TryIter, TrySendError};

/// Default number of frames buffered between two polls.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Producer half, handed to the transport callback.
#[derive(Clone)]
pub struct InboundSender {
    tx: Sender<CcMessage>,
}

impl InboundSender {
    /// Forward raw device bytes.
    ///
    /// Anything that is not exactly 3 bytes is not a Control-Change frame and is
    /// ignored. Returns whether the frame was queued.
    pub fn push_raw(&self, bytes: &[u8]) -> bool {
        let Ok(frame) = <[u8; 3]>::try_from(bytes) else {
            log::debug!("ignoring {}-byte MIDI frame", bytes.len());
            return false;
        };

        let msg = CcMessage::decode(frame);
        log::trace!("<< {}", msg);
        self.push(msg)
    }

    /// Queue an already decoded frame.
    pub fn push(&self, msg: CcMessage) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                log::warn!("inbound MIDI queue full, dropping {}", msg);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Bounded queue of inbound Control-Change frames.
pub struct InboundQueue {
    tx: Sender<CcMessage>,
    rx: Receiver<CcMessage>,
}

impl InboundQueue {
    /// Create a queue holding at most `capacity` frames (at least one).
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// A new producer handle.
    pub fn sender(&self) -> InboundSender {
        InboundSender {
            tx: self.tx.clone(),
        }
    }

    /// Iterate over everything queued right now. Never waits for more.
    pub fn drain(&self) -> TryIter<'_, CcMessage> {
        self.rx.try_iter()
    }

    /// Number of frames waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::bounded(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_raw_filters_length() {
        let queue = InboundQueue::bounded(8);
        let tx = queue.sender();
        assert!(!tx.push_raw(&[0xB0, 1]));
        assert!(!tx.push_raw(&[0xF0, 0x00, 0x01, 0x61, 0xF7]));
        assert!(tx.push_raw(&[0xB0, 1, 2]));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_preserves_order() {
        let queue = InboundQueue::bounded(8);
        let tx = queue.sender();
        for v in 0..5u8 {
            tx.push_raw(&[0xB0, 0, v]);
        }
        let values: Vec<u8> = queue.drain().map(|m| m.value).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let queue = InboundQueue::bounded(2);
        let tx = queue.sender();
        assert!(tx.push_raw(&[0xB0, 0, 1]));
        assert!(tx.push_raw(&[0xB0, 0, 2]));
        assert!(!tx.push_raw(&[0xB0, 0, 3]));
        let values: Vec<u8> = queue.drain().map(|m| m.value).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_producer_on_other_thread() {
        let queue = InboundQueue::bounded(1024);
        let tx = queue.sender();
        let producer = thread::spawn(move || {
            for v in 0..100u8 {
                tx.push_raw(&[0xB1, 3, v]);
            }
        });
        producer.join().unwrap();

        let received: Vec<u8> = queue.drain().map(|m| m.value).collect();
        assert_eq!(received, (0..100).collect::<Vec<u8>>());
    }
}
