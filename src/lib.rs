//! A driver core for ELAN I2C/SMBus touchpads with trackpoint support.
//!
//! Several laptop families wire their ELAN touchpad to the host over SMBus
//! instead of regular I2C or PS/2. The device then speaks a small
//! register-addressed block protocol: after a fixed hello handshake and a
//! mode switch it pushes input reports that carry either multitouch contact
//! data or trackpoint motion, selected by a leading identifier byte.
//!
//! This crate implements that protocol: the handshake and mode switching,
//! the decoding of contact and trackpoint reports into input events, the
//! input suppression around keyboard activity and the power-driven
//! re-initialization policy. It deliberately implements nothing below or
//! above it: the bus access and the publication of the decoded events are
//! left to the embedding platform.
//!
//! The wire format follows the ELAN SMBus protocol as implemented by the
//! Linux `elan_i2c` driver family.
//!
//! # Quickstart
//!
//! ## Provide bus access
//!
//! The trait bridging the platform's bus access to this crate is
//! [`bus::SmbusTransport`]. Implement it on whatever handle reaches your
//! SMBus controller:
//!
//! ```no_run
//! use std::time::Instant;
//!
//! use elantp::{
//!     bus::SmbusTransport,
//!     device::{PowerState, TouchpadDriver},
//!     event::TouchpadEvent,
//! };
//!
//! struct MyBus;
//!
//! impl SmbusTransport for MyBus {
//!     type Error = std::io::Error;
//!
//!     fn read_block(&self, _command: u8, _buf: &mut [u8]) -> Result<usize, Self::Error> {
//!         // Talk to /dev/i2c-* or the platform's SMBus controller here.
//!         todo!()
//!     }
//!
//!     fn write_byte(&self, _command: u8) -> Result<(), Self::Error> {
//!         todo!()
//!     }
//!
//!     fn write_block(&self, _command: u8, _data: &[u8]) -> Result<(), Self::Error> {
//!         todo!()
//!     }
//! }
//!
//! // The driver is reactive; it only ever acts when one of its entry
//! // points is called.
//! let driver = TouchpadDriver::new(MyBus);
//!
//! // Subscribe to the event stream before the first report arrives.
//! let events = driver.listen();
//!
//! // Bring the device up: hello handshake, touch enable, absolute mode,
//! // with the bounded retry policy the hardware needs after power-on.
//! driver.start().expect("could not initialize the touchpad");
//!
//! // Wire the platform's "data ready" notification to the driver.
//! driver.handle_host_notify();
//!
//! // Power management and keyboard activity are forwarded the same way.
//! driver.note_keystroke(Instant::now());
//! driver.set_power(PowerState::Asleep);
//! driver.set_power(PowerState::Awake);
//!
//! for event in events.drain() {
//!     match event {
//!         TouchpadEvent::Touch(touch) => println!("{} contacts", touch.contact_count),
//!         TouchpadEvent::Pointer(pointer) => println!("rel {},{}", pointer.dx, pointer.dy),
//!         TouchpadEvent::Scroll(scroll) => println!("scroll {},{}", scroll.dx, scroll.dy),
//!     }
//! }
//! ```
//!
//! Decoded events surface on the receiver returned by
//! [`device::TouchpadDriver::listen`]; each receiver gets its own copy of
//! every event.

pub mod bus;
pub mod device;
pub mod event;
pub mod gate;
pub mod packet;
pub mod touch;
pub mod trackpoint;
