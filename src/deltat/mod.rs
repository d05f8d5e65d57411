//! The Imagenex DeltaT codec: the vendor `.83P` profile format and the
//! extended `.83M` format.
//!
//! A DeltaT file is a sequence of records, each starting with a 256-byte
//! header that mixes ASCII (timestamps, GNSS position strings) and
//! big-endian binary fields, followed by per-beam ranges. The extended
//! format replaces the `83P` magic with `83M`, bumps the version byte to
//! 10, and appends processed soundings and per-beam flags that the vendor
//! format cannot carry. Comments are record headers with `##` in the
//! reserved bytes.

mod reader;
mod record;
mod writer;

pub use reader::Reader;
pub use record::DeltaTRecord;
pub use writer::Writer;

/// The most beams a DeltaT sonar produces.
pub const MAX_BEAMS: usize = 480;
/// The longest comment a record can carry.
pub const COMMENT_LENGTH: usize = 248;
/// The fixed record header length.
pub const HEADER_LENGTH: usize = 256;
/// Bytes per beam in the extended format.
pub const EXTENDED_BEAM_SIZE: usize = 33;
/// Bytes per beam in the obsolete first extended layout.
pub const OBSOLETE_BEAM_SIZE: usize = 15;

/// Which DeltaT flavor a reader expects and a writer produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// The vendor `.83P` format: raw ranges and, in v1.10, intensities.
    Vendor,
    /// The MB-System `.83M` extension with processed soundings and beam
    /// flags. Readers in this mode also accept the obsolete `83P`-magic
    /// extended layout and the plain comment records.
    #[default]
    Extended,
}
