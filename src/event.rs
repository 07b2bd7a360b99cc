//! The events the driver publishes and the emitter they travel through.

use std::{sync::Mutex, time::Instant};

use crate::packet::MAX_FINGERS;

/// One tracked contact as published to the event stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContactState {
    /// The stable slot index, doubling as the contact identifier.
    pub id: u8,

    /// Whether the slot reported a contact this cycle.
    pub valid: bool,

    /// Whether the finger touches the surface. A slot that just lifted
    /// reports `false` while still holding its last position.
    pub tip: bool,

    /// The x coordinate in device units.
    pub x: u32,

    /// The y coordinate in device units, already inverted to grow away from
    /// the user.
    pub y: u32,

    /// The contact pressure after adjustment and clamping.
    pub pressure: u32,

    /// The estimated major axis of the contact ellipse.
    pub major: u32,

    /// The estimated minor axis of the contact ellipse.
    pub minor: u32,
}

/// A full multitouch batch for one report cycle.
///
/// The batch always carries all [`MAX_FINGERS`] slots with explicit validity
/// flags; consumers that only want active contacts filter on
/// [`ContactState::valid`].
#[derive(Clone, Copy, Debug)]
pub struct MultitouchEvent {
    /// The number of slots that reported a contact this cycle.
    pub contact_count: u8,

    /// The state of every slot, ordered by slot index.
    pub contacts: [ContactState; MAX_FINGERS],

    /// Whether the click-pad button is held.
    pub button: bool,

    /// Whether a contact hovers above the surface.
    pub hover: bool,

    /// When the underlying report was pulled from the bus.
    pub timestamp: Instant,
}

/// Relative trackpoint motion.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PointerEvent {
    /// The horizontal motion delta.
    pub dx: i32,

    /// The vertical motion delta.
    pub dy: i32,

    /// The button mask: left is bit 0, right is bit 1, middle is bit 2.
    pub buttons: u8,
}

/// Trackpoint motion reinterpreted as scrolling.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScrollEvent {
    /// The vertical scroll delta.
    pub dx: i32,

    /// The horizontal scroll delta.
    pub dy: i32,

    /// The third-axis scroll delta. Always zero for this device.
    pub dz: i32,
}

/// Any event the driver publishes.
#[derive(Clone, Copy, Debug)]
pub enum TouchpadEvent {
    /// A multitouch batch decoded from an absolute report.
    Touch(MultitouchEvent),

    /// Relative pointer motion decoded from a trackpoint report.
    Pointer(PointerEvent),

    /// Scroll motion decoded from a trackpoint report in scroll mode.
    Scroll(ScrollEvent),
}

/// A simple event emitter sending a single event to multiple MPSC channels.
#[derive(Debug)]
pub struct EventEmitter<T: Copy> {
    senders: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Copy> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    /// Creates a new receiver and adds the corresponding sender to the
    /// sender list.
    pub fn create_receiver(&self) -> flume::Receiver<T> {
        let mut senders = self.senders.lock().unwrap();
        let (tx, rx) = flume::unbounded();
        senders.push(tx);
        rx
    }

    /// Emits an event to all senders. Senders whose receivers were dropped
    /// are removed from the list.
    pub fn emit(&self, event: T) {
        let mut senders = self.senders.lock().unwrap();
        senders.retain(|sender| sender.send(event).is_ok());
    }
}

impl<T: Copy> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_to_every_receiver() {
        let emitter = EventEmitter::new();
        let first = emitter.create_receiver();
        let second = emitter.create_receiver();

        emitter.emit(7u8);

        assert_eq!(first.try_recv().unwrap(), 7);
        assert_eq!(second.try_recv().unwrap(), 7);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let emitter = EventEmitter::new();
        let kept = emitter.create_receiver();
        drop(emitter.create_receiver());

        emitter.emit(1u8);
        emitter.emit(2u8);

        assert_eq!(kept.try_recv().unwrap(), 1);
        assert_eq!(kept.try_recv().unwrap(), 2);
    }
}
