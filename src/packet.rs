//! Validates and classifies the fixed-length packets the touchpad produces.
//!
//! All layout knowledge about the wire format lives here. The decoding of
//! the classified payloads into input events is done by [`crate::touch`] and
//! [`crate::trackpoint`]; this module only hands out typed, bounds-checked
//! views over the raw bytes.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// The length of the handshake block the device answers before any protocol
/// command is accepted.
pub const HELLO_PACKET_LEN: usize = 5;

/// Every byte of a well-formed hello packet holds this value.
pub const HELLO_PACKET_BYTE: u8 = 0x55;

/// The payload length of a single report as delivered by the bus.
pub const REPORT_LEN: usize = 32;

/// Report payloads are stored at this offset inside the driver-side buffer.
pub const REPORT_OFFSET: usize = 2;

/// The size of the driver-side report buffer.
pub const MAX_REPORT_LEN: usize = REPORT_OFFSET + REPORT_LEN;

/// The position of the report identifier byte inside the report buffer.
pub const REPORT_ID_OFFSET: usize = 2;

/// The position of the touch-info byte of an absolute report.
pub const TOUCH_INFO_OFFSET: usize = 3;

/// The position of the first per-finger record of an absolute report.
pub const FINGER_DATA_OFFSET: usize = 4;

/// The position of the hover-info byte of an absolute report.
pub const HOVER_INFO_OFFSET: usize = 30;

/// The length of one per-finger record inside an absolute report.
pub const FINGER_DATA_LEN: usize = 5;

/// The number of contact slots an absolute report carries.
pub const MAX_FINGERS: usize = 5;

/// The position of the trackpoint payload inside the report buffer.
pub const TRACKPOINT_DATA_OFFSET: usize = REPORT_ID_OFFSET + 1;

/// The length of the trackpoint payload.
pub const TRACKPOINT_DATA_LEN: usize = 6;

/// Verifies the hello packet read during the bus handshake.
///
/// Succeeds iff the block is exactly [`HELLO_PACKET_LEN`] bytes of
/// [`HELLO_PACKET_BYTE`]; any other length or content yields the matching
/// distinguished error.
pub fn verify_hello(block: &[u8]) -> Result<(), PacketError> {
    if block.len() != HELLO_PACKET_LEN {
        return Err(PacketError::LengthMismatch { got: block.len() });
    }

    if block.iter().any(|&byte| byte != HELLO_PACKET_BYTE) {
        return Err(PacketError::HandshakeMismatch);
    }

    Ok(())
}

/// Represents the report identifier byte selecting the decode path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ReportId {
    /// A multitouch contact report.
    Absolute = 0x5d,

    /// A trackpoint motion report.
    Trackpoint = 0x5e,
}

/// A classified report, borrowing the raw buffer it was read into.
#[derive(Clone, Copy, Debug)]
pub enum Report<'a> {
    /// A multitouch contact report.
    Absolute(AbsoluteReport<'a>),

    /// A trackpoint motion report.
    Trackpoint(TrackpointReport<'a>),
}

impl<'a> Report<'a> {
    /// Tries to classify a raw report buffer by its identifier byte.
    ///
    /// The buffer must hold a full [`MAX_REPORT_LEN`]-sized report; shorter
    /// input is rejected before any payload byte is touched so that a
    /// partial bus read can never reach the decoders.
    pub fn parse(buf: &'a [u8]) -> Result<Self, PacketError> {
        if buf.len() < MAX_REPORT_LEN {
            return Err(PacketError::TruncatedReport { got: buf.len() });
        }

        match ReportId::try_from(buf[REPORT_ID_OFFSET]) {
            Ok(ReportId::Absolute) => Ok(Report::Absolute(AbsoluteReport { buf })),
            Ok(ReportId::Trackpoint) => Ok(Report::Trackpoint(TrackpointReport { buf })),
            Err(_) => Err(PacketError::UnknownReportId(buf[REPORT_ID_OFFSET])),
        }
    }
}

/// A typed view over a multitouch contact report.
#[derive(Clone, Copy, Debug)]
pub struct AbsoluteReport<'a> {
    buf: &'a [u8],
}

impl<'a> AbsoluteReport<'a> {
    /// The touch-info byte: physical button state and the per-slot validity
    /// bitmask.
    pub fn touch_info(&self) -> u8 {
        self.buf[TOUCH_INFO_OFFSET]
    }

    /// Whether the slot at `slot` reported a contact this cycle.
    pub fn contact_valid(&self, slot: usize) -> bool {
        self.touch_info() & (1 << (3 + slot)) != 0
    }

    /// Whether the click-pad button is held.
    pub fn button(&self) -> bool {
        self.touch_info() & 0x01 != 0
    }

    /// Whether a contact hovers above the surface without touching it.
    pub fn hover(&self) -> bool {
        self.buf[HOVER_INFO_OFFSET] & 0x40 != 0
    }

    /// The `record`-th per-finger record.
    ///
    /// Records are packed: only slots that reported a contact occupy one, in
    /// slot order. The caller keeps track of which record belongs to which
    /// slot.
    pub fn finger_record(&self, record: usize) -> &'a [u8] {
        let start = FINGER_DATA_OFFSET + record * FINGER_DATA_LEN;
        &self.buf[start..start + FINGER_DATA_LEN]
    }
}

/// A typed view over a trackpoint motion report.
#[derive(Clone, Copy, Debug)]
pub struct TrackpointReport<'a> {
    buf: &'a [u8],
}

impl<'a> TrackpointReport<'a> {
    /// The raw trackpoint payload: one button byte followed by the encoded
    /// motion bytes.
    pub fn data(&self) -> &'a [u8] {
        &self.buf[TRACKPOINT_DATA_OFFSET..TRACKPOINT_DATA_OFFSET + TRACKPOINT_DATA_LEN]
    }
}

/// Represents a violation of the fixed wire format.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum PacketError {
    /// Indicates that the hello block had the wrong length.
    #[error("hello packet length mismatch ({got} instead of {HELLO_PACKET_LEN} bytes)")]
    LengthMismatch {
        /// The length actually read from the bus.
        got: usize,
    },

    /// Indicates that the hello block content differs from the fixed
    /// pattern.
    #[error("hello packet content mismatch")]
    HandshakeMismatch,

    /// Indicates that a report was shorter than the fixed report length.
    #[error("truncated report ({got} instead of {REPORT_LEN} bytes)")]
    TruncatedReport {
        /// The length actually read from the bus.
        got: usize,
    },

    /// Indicates a report identifier no decode path exists for.
    #[error("unknown report id {0:#04x}")]
    UnknownReportId(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_accepts_exact_pattern() {
        assert_eq!(verify_hello(&[HELLO_PACKET_BYTE; HELLO_PACKET_LEN]), Ok(()));
    }

    #[test]
    fn hello_rejects_wrong_length() {
        assert_eq!(
            verify_hello(&[HELLO_PACKET_BYTE; 4]),
            Err(PacketError::LengthMismatch { got: 4 })
        );
        assert_eq!(
            verify_hello(&[HELLO_PACKET_BYTE; 6]),
            Err(PacketError::LengthMismatch { got: 6 })
        );
        assert_eq!(verify_hello(&[]), Err(PacketError::LengthMismatch { got: 0 }));
    }

    #[test]
    fn hello_rejects_any_differing_byte() {
        for i in 0..HELLO_PACKET_LEN {
            let mut block = [HELLO_PACKET_BYTE; HELLO_PACKET_LEN];
            block[i] = 0x54;
            assert_eq!(verify_hello(&block), Err(PacketError::HandshakeMismatch));
        }
    }

    #[test]
    fn parse_selects_decode_path_by_id() {
        let mut buf = [0u8; MAX_REPORT_LEN];

        buf[REPORT_ID_OFFSET] = u8::from(ReportId::Absolute);
        assert!(matches!(Report::parse(&buf), Ok(Report::Absolute(_))));

        buf[REPORT_ID_OFFSET] = u8::from(ReportId::Trackpoint);
        assert!(matches!(Report::parse(&buf), Ok(Report::Trackpoint(_))));
    }

    #[test]
    fn parse_reports_unknown_id() {
        let mut buf = [0u8; MAX_REPORT_LEN];
        buf[REPORT_ID_OFFSET] = 0x17;

        assert_eq!(
            Report::parse(&buf).unwrap_err(),
            PacketError::UnknownReportId(0x17)
        );
    }

    #[test]
    fn parse_rejects_short_buffer() {
        assert_eq!(
            Report::parse(&[0u8; 8]).unwrap_err(),
            PacketError::TruncatedReport { got: 8 }
        );
    }

    #[test]
    fn absolute_view_exposes_touch_and_hover_bits() {
        let mut buf = [0u8; MAX_REPORT_LEN];
        buf[REPORT_ID_OFFSET] = u8::from(ReportId::Absolute);
        buf[TOUCH_INFO_OFFSET] = 0b0010_1001;
        buf[HOVER_INFO_OFFSET] = 0x40;

        let Ok(Report::Absolute(report)) = Report::parse(&buf) else {
            panic!("expected an absolute report");
        };

        assert!(report.button());
        assert!(report.hover());
        assert!(report.contact_valid(0));
        assert!(!report.contact_valid(1));
        assert!(report.contact_valid(2));
        assert!(!report.contact_valid(3));
        assert!(!report.contact_valid(4));
    }

    #[test]
    fn finger_records_are_packed_from_the_data_offset() {
        let mut buf = [0u8; MAX_REPORT_LEN];
        buf[REPORT_ID_OFFSET] = u8::from(ReportId::Absolute);
        buf[FINGER_DATA_OFFSET] = 0xaa;
        buf[FINGER_DATA_OFFSET + FINGER_DATA_LEN] = 0xbb;

        let Ok(Report::Absolute(report)) = Report::parse(&buf) else {
            panic!("expected an absolute report");
        };

        assert_eq!(report.finger_record(0)[0], 0xaa);
        assert_eq!(report.finger_record(1)[0], 0xbb);
    }

    #[test]
    fn trackpoint_view_exposes_the_payload() {
        let mut buf = [0u8; MAX_REPORT_LEN];
        buf[REPORT_ID_OFFSET] = u8::from(ReportId::Trackpoint);
        buf[TRACKPOINT_DATA_OFFSET] = 0x07;
        buf[TRACKPOINT_DATA_OFFSET + TRACKPOINT_DATA_LEN - 1] = 0x42;

        let Ok(Report::Trackpoint(report)) = Report::parse(&buf) else {
            panic!("expected a trackpoint report");
        };

        assert_eq!(report.data().len(), TRACKPOINT_DATA_LEN);
        assert_eq!(report.data()[0], 0x07);
        assert_eq!(report.data()[5], 0x42);
    }
}
