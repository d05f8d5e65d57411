//! The Kongsberg Simrad EM-series processed datagram codec.
//!
//! An EM stream is a sequence of independently framed datagrams:
//!
//! ```text
//! <u32 record_size> <u8 0x02> <u8 type> <u16 sonar_id> <body> <u8 0x03> <u16 checksum>
//! ```
//!
//! `record_size` counts every byte after its own four. The byte order of
//! the multi-byte fields is whatever the recording processor used, and is
//! detected from the sonar id of the first valid frame. A survey ping
//! spans several datagrams (bathymetry, raw beam data, sidescan, and two
//! of each on dual-head sonars); [Reader] reassembles them into the
//! store's ping buffers and recovers from corrupt framing by sliding
//! byte-by-byte until a valid label comes around.

mod frame;
mod reader;
mod sensor;
mod survey;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use crate::RecordKind;
use num_derive::FromPrimitive;

/// Every datagram starts with this byte, right after the size field.
pub const START_BYTE: u8 = 0x02;
/// Every datagram body is terminated by this byte.
pub const END_BYTE: u8 = 0x03;

/// The datagram type byte, the second byte of each frame label.
///
/// One type maps to one [RecordKind], except for bathymetry and sidescan
/// which also have extended variants carrying the same kind in a
/// different on-disk layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum DatagramType {
    /// Installation parameters, alternate stop form.
    Stop2 = 0x30,
    /// Installation parameters, remote off.
    Off = 0x31,
    /// Installation parameters, remote on.
    On = 0x32,
    /// Attitude sample series.
    Attitude = 0x41,
    /// Clock record.
    Clock = 0x43,
    /// Vendor bathymetry.
    Bath = 0x44,
    /// Single-beam echo sounder depth (skipped).
    SbDepth = 0x45,
    /// First-generation raw range and angle.
    RawBeam = 0x46,
    /// Sound speed at transducer sample series.
    Ssv = 0x47,
    /// Heading sample series.
    Heading = 0x48,
    /// Installation parameters at line start.
    Start = 0x49,
    /// Transmit tilt sample series.
    Tilt = 0x4A,
    /// Central beams echogram (skipped).
    CbEcho = 0x4B,
    /// Position record.
    Position = 0x50,
    /// Runtime parameters.
    RunParameter = 0x52,
    /// Vendor sidescan.
    Sidescan = 0x53,
    /// Tide record.
    Tide = 0x54,
    /// Sound velocity profile, current layout.
    Svp2 = 0x55,
    /// Sound velocity profile, old layout.
    Svp = 0x56,
    /// Sound speed profile input (skipped).
    SspInput = 0x57,
    /// Second-generation raw range and angle.
    RawBeam2 = 0x65,
    /// Third-generation raw range and angle.
    RawBeam3 = 0x66,
    /// Height record.
    Height = 0x68,
    /// Installation parameters at line stop.
    Stop = 0x69,
    /// Remote control (skipped).
    Remote = 0x70,
    /// Sound speed profile (skipped).
    Ssp = 0x73,
    /// Extended bathymetry, which preserves beam flags.
    BathExtended = 0xE1,
    /// Extended sidescan, which carries the processed pixel image.
    SidescanExtended = 0xE2,
    /// Water column record.
    WaterColumn = 0x6B,
}

impl DatagramType {
    /// Looks a type up by its on-disk byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::simrad::DatagramType;
    /// assert_eq!(Some(DatagramType::Attitude), DatagramType::from_u8(0x41));
    /// assert_eq!(None, DatagramType::from_u8(0x00));
    /// ```
    pub fn from_u8(n: u8) -> Option<DatagramType> {
        num_traits::FromPrimitive::from_u8(n)
    }

    /// The on-disk type byte.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// True for the installation-parameter family that breaks a ping in
    /// progress.
    pub fn is_installation(&self) -> bool {
        matches!(
            self,
            DatagramType::Start
                | DatagramType::Stop
                | DatagramType::Stop2
                | DatagramType::Off
                | DatagramType::On
        )
    }

    /// True for datagrams whose payloads this crate does not decode; they
    /// are skipped without failing the read loop.
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            DatagramType::SbDepth
                | DatagramType::CbEcho
                | DatagramType::SspInput
                | DatagramType::Remote
                | DatagramType::Ssp
        )
    }

    /// The record kind a datagram of this type decodes into, where the
    /// mapping is static. Position datagrams pick their navigation
    /// channel from a payload byte and report `None` here.
    pub fn record_kind(&self) -> Option<RecordKind> {
        match self {
            DatagramType::Attitude => Some(RecordKind::Attitude),
            DatagramType::Clock => Some(RecordKind::Clock),
            DatagramType::Bath
            | DatagramType::BathExtended
            | DatagramType::RawBeam
            | DatagramType::RawBeam2
            | DatagramType::RawBeam3
            | DatagramType::Sidescan
            | DatagramType::SidescanExtended => Some(RecordKind::Data),
            DatagramType::Ssv => Some(RecordKind::Ssv),
            DatagramType::Heading => Some(RecordKind::Heading),
            DatagramType::Start => Some(RecordKind::Start),
            DatagramType::Stop | DatagramType::Stop2 => Some(RecordKind::Stop),
            DatagramType::On | DatagramType::Off => Some(RecordKind::Status),
            DatagramType::Tilt => Some(RecordKind::Tilt),
            DatagramType::RunParameter => Some(RecordKind::RunParameter),
            DatagramType::Tide => Some(RecordKind::Tide),
            DatagramType::Svp | DatagramType::Svp2 => Some(RecordKind::VelocityProfile),
            DatagramType::Height => Some(RecordKind::Height),
            DatagramType::WaterColumn => Some(RecordKind::WaterColumn),
            DatagramType::Position => None,
            DatagramType::SbDepth
            | DatagramType::CbEcho
            | DatagramType::SspInput
            | DatagramType::Remote
            | DatagramType::Ssp => None,
        }
    }
}
