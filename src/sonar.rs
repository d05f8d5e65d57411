//! Sonar model identifiers and the stream byte-order oracle.

use crate::Endian;
use num_derive::FromPrimitive;

/// The sonar models whose datagrams this crate understands.
///
/// The id is carried in the third and fourth bytes of every datagram label,
/// and doubles as the byte-order probe for the stream (see
/// [detect_byte_order]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum SonarId {
    Em120 = 120,
    Em300 = 300,
    Em1002 = 1002,
    Em2000 = 2000,
    Em3000 = 3000,
    Em3000d1 = 3001,
    Em3000d2 = 3002,
    Em3000d3 = 3003,
    Em3000d4 = 3004,
    Em3000d5 = 3005,
    Em3000d6 = 3006,
    Em3000d7 = 3007,
    Em3000d8 = 3008,
    Em3002 = 3020,
    Em3002d = 3021,
    Em12s = 9901,
    Em12d = 9902,
    Em121 = 9903,
    Em100 = 9904,
    Em1000 = 9905,
}

impl SonarId {
    /// Looks up a sonar id by its on-disk value.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::SonarId;
    /// assert_eq!(Some(SonarId::Em3002), SonarId::from_u16(3020));
    /// assert_eq!(None, SonarId::from_u16(4242));
    /// ```
    pub fn from_u16(n: u16) -> Option<SonarId> {
        num_traits::FromPrimitive::from_u16(n)
    }

    /// Returns true if the value is in the enumerated valid set.
    pub fn is_valid(n: u16) -> bool {
        SonarId::from_u16(n).is_some()
    }

    /// The on-disk value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// EM3002 variants ship two transducer heads per ping.
    pub fn is_dual_head(&self) -> bool {
        matches!(self, SonarId::Em3002 | SonarId::Em3002d)
    }

    /// The EM3000D family reuses the bathymetry sample-rate field for the
    /// depth difference between its two sonar heads.
    pub fn is_em3000d(&self) -> bool {
        (3001..=3008).contains(&self.to_u16())
    }

    /// The older deep-water models store beam depths as unsigned counts;
    /// everything else is signed.
    pub fn has_unsigned_depth(&self) -> bool {
        matches!(self, SonarId::Em120 | SonarId::Em300)
    }
}

/// Disambiguates the stream byte order from the sonar-id bytes of the
/// first frame.
///
/// Both interpretations of the two bytes are checked against the valid
/// sonar-id set; exactly one is expected to match. If both or neither
/// match, the frame is treated as invalid (`None`) and resynchronization
/// proceeds. The surviving interpretation fixes the byte order for the
/// remainder of the stream.
///
/// # Examples
///
/// ```
/// use swath::{sonar::detect_byte_order, Endian};
/// // 300 = 0x012C
/// assert_eq!(Some(Endian::Little), detect_byte_order([0x2C, 0x01]));
/// assert_eq!(Some(Endian::Big), detect_byte_order([0x01, 0x2C]));
/// assert_eq!(None, detect_byte_order([0xAB, 0xCD]));
/// ```
pub fn detect_byte_order(bytes: [u8; 2]) -> Option<Endian> {
    let little = SonarId::is_valid(u16::from_le_bytes(bytes));
    let big = SonarId::is_valid(u16::from_be_bytes(bytes));
    match (little, big) {
        (true, false) => Some(Endian::Little),
        (false, true) => Some(Endian::Big),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_set() {
        for n in [
            120, 300, 1002, 2000, 3000, 3001, 3002, 3003, 3004, 3005, 3006, 3007, 3008, 3020,
            3021, 9901, 9902, 9903, 9904, 9905,
        ] {
            assert!(SonarId::is_valid(n), "{} should be valid", n);
        }
        assert!(!SonarId::is_valid(0));
        assert!(!SonarId::is_valid(3009));
    }

    #[test]
    fn dual_head() {
        assert!(SonarId::Em3002.is_dual_head());
        assert!(SonarId::Em3002d.is_dual_head());
        assert!(!SonarId::Em3000.is_dual_head());
    }

    #[test]
    fn em3000d_family() {
        assert!(SonarId::Em3000d1.is_em3000d());
        assert!(SonarId::Em3000d8.is_em3000d());
        assert!(!SonarId::Em3000.is_em3000d());
        assert!(!SonarId::Em3002.is_em3000d());
    }

    #[test]
    fn depth_signedness() {
        assert!(SonarId::Em120.has_unsigned_depth());
        assert!(SonarId::Em300.has_unsigned_depth());
        assert!(!SonarId::Em3000.has_unsigned_depth());
    }

    #[test]
    fn byte_order_from_every_id() {
        for id in [SonarId::Em120, SonarId::Em3002, SonarId::Em1000] {
            let n = id.to_u16();
            assert_eq!(Some(Endian::Little), detect_byte_order(n.to_le_bytes()));
            assert_eq!(Some(Endian::Big), detect_byte_order(n.to_be_bytes()));
        }
    }
}
