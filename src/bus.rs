//! Defines the boundary between the protocol core and the platform's
//! SMBus/I2C access layer.
//!
//! The touchpad speaks a register-addressed block protocol: every exchange
//! is a single-byte command code optionally followed by a block of data.
//! Implementations of [`SmbusTransport`] bridge whatever bus access the
//! platform provides (an I2C character device, an SMBus controller driver,
//! an emulated bus in tests) to this crate.

use std::error::Error;

/// The longest block a single bus transaction can carry.
pub const BLOCK_MAX: usize = 32;

/// The command (register) codes understood by the touchpad.
pub mod commands {
    /// The register the 4-byte mode-set payload is written to.
    pub const IAP: u8 = 0x00;

    /// Block read answering the fixed hello packet.
    pub const HELLO_PACKET: u8 = 0x02;

    /// Single-byte write enabling touch reporting.
    pub const ENABLE_TP: u8 = 0x20;

    /// Single-byte write putting the device to sleep.
    pub const SLEEP: u8 = 0x21;

    /// Block read answering the most recent input report.
    pub const PACKET_QUERY: u8 = 0x24;
}

/// Represents the two-wire bus the touchpad is attached to.
///
/// All three operations address the device that hosts the touchpad; there is
/// no device index because a transport instance is already bound to exactly
/// one device. Every operation may fail and the protocol core never assumes
/// success.
pub trait SmbusTransport: Send + Sync + 'static {
    /// An implementation-specific error type.
    type Error: Error + Send + Sync + 'static;

    /// Reads a block of data for the given command.
    ///
    /// Returns the exact amount of read bytes on success. The buffer should
    /// be able to hold [`BLOCK_MAX`] bytes; a shorter read is reported
    /// through the returned length, never padded.
    fn read_block(&self, command: u8, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes a bare command byte with no payload.
    fn write_byte(&self, command: u8) -> Result<(), Self::Error>;

    /// Writes a block of data to the given command register.
    fn write_block(&self, command: u8, data: &[u8]) -> Result<(), Self::Error>;
}
