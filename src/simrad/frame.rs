//! Datagram framing: find labels, validate them, and resynchronize.
//!
//! The scanner reads the four size bytes and the four label bytes of each
//! datagram. If the label fails validation the eight bytes slide left one
//! byte at a time, pulling one more byte from the stream per step, until a
//! valid label comes around. The first valid label also fixes the stream
//! byte order from the sonar-id bytes.

use crate::simrad::{DatagramType, START_BYTE};
use crate::sonar::{detect_byte_order, SonarId};
use crate::{Endian, Error, Result};
use log::{debug, warn};
use std::io::{self, Read};

/// A validated datagram label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Label {
    /// The record size field: every byte of the record after the size
    /// field itself.
    pub size: u32,
    /// The datagram type.
    pub dtype: DatagramType,
    /// The sonar id, after any zero-id fallback.
    pub sonar: u16,
}

impl Label {
    /// The number of bytes between the label and the end of the record.
    pub fn body_len(&self) -> usize {
        self.size.saturating_sub(4) as usize
    }
}

enum Check {
    Label(Label),
    BadType { type_byte: u8, size: u32 },
    Garbage,
}

/// Locates datagram boundaries in a byte stream (C2) and holds the
/// stream's byte order once the first frame has disambiguated it (C3).
#[derive(Debug)]
pub(crate) struct FrameScanner {
    byte_order: Option<Endian>,
    last_sonar: u16,
    skipped: u64,
    reported: bool,
}

impl FrameScanner {
    pub fn new() -> FrameScanner {
        FrameScanner {
            byte_order: None,
            last_sonar: 0,
            skipped: 0,
            reported: false,
        }
    }

    /// The stream byte order, once the first valid frame has fixed it.
    pub fn byte_order(&self) -> Option<Endian> {
        self.byte_order
    }

    /// Total garbage bytes skipped by resynchronization so far.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Reads the next valid label.
    ///
    /// Returns `Ok(None)` at a clean end of stream, [Error::Eof] when the
    /// stream ends mid-label or mid-resync, and [Error::BadDatagram] when
    /// a frame carries a valid sonar id but an invalid type byte (the
    /// record is skipped first, so the caller may continue).
    pub fn next_label<R: Read>(&mut self, read: &mut R) -> Result<Option<Label>> {
        let mut window = [0u8; 8];
        let mut filled = 0;
        while filled < window.len() {
            let n = read.read(&mut window[filled..])?;
            if n == 0 {
                return if filled == 0 { Ok(None) } else { Err(Error::Eof) };
            }
            filled += n;
        }
        let mut slid = 0u64;
        loop {
            match self.check(&window) {
                Check::Label(label) => {
                    self.note_resync(slid);
                    self.last_sonar = label.sonar;
                    return Ok(Some(label));
                }
                Check::BadType { type_byte, size } => {
                    self.note_resync(slid);
                    debug!(
                        "skipping datagram with invalid type {:#04x} ({} bytes)",
                        type_byte, size
                    );
                    skip_bytes(read, u64::from(size.saturating_sub(4)))?;
                    return Err(Error::BadDatagram(type_byte));
                }
                Check::Garbage => {
                    window.copy_within(1.., 0);
                    let mut byte = [0u8; 1];
                    read_exact_or_eof(read, &mut byte)?;
                    window[7] = byte[0];
                    slid += 1;
                }
            }
        }
    }

    fn check(&mut self, window: &[u8; 8]) -> Check {
        if window[4] != START_BYTE {
            return Check::Garbage;
        }
        let dtype = DatagramType::from_u8(window[5]);
        let sonar_bytes = [window[6], window[7]];
        let (byte_order, committed) = match self.byte_order {
            Some(byte_order) => (byte_order, true),
            None => {
                // first frame: exactly one interpretation of the sonar id
                // bytes must be valid, and the label must be fully valid
                // before the order commits
                let Some(byte_order) = detect_byte_order(sonar_bytes) else {
                    return Check::Garbage;
                };
                if dtype.is_none() {
                    return Check::Garbage;
                }
                (byte_order, false)
            }
        };
        let size = byte_order.get_u32(&window[0..4]);
        if size < 7 {
            return Check::Garbage;
        }
        if !committed {
            self.byte_order = Some(byte_order);
        }
        let mut sonar = byte_order.get_u16(&sonar_bytes);
        if !SonarId::is_valid(sonar) {
            // vendor bug: SVP and SSV datagrams may carry a zero sonar id
            let svp_like = matches!(
                dtype,
                Some(DatagramType::Svp) | Some(DatagramType::Svp2) | Some(DatagramType::Ssv)
            );
            if sonar == 0 && svp_like && self.last_sonar != 0 {
                sonar = self.last_sonar;
            } else {
                return Check::Garbage;
            }
        }
        match dtype {
            Some(dtype) => Check::Label(Label { size, dtype, sonar }),
            None => Check::BadType {
                type_byte: window[5],
                size,
            },
        }
    }

    fn note_resync(&mut self, slid: u64) {
        if slid == 0 {
            return;
        }
        self.skipped += slid;
        if !self.reported {
            warn!("lost datagram sync, skipped {} bytes", slid);
            self.reported = true;
        }
    }
}

/// Maps an unexpected end of stream onto [Error::Eof].
pub(crate) fn read_exact_or_eof<R: Read>(read: &mut R, buf: &mut [u8]) -> Result<()> {
    read.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Eof
        } else {
            Error::from(err)
        }
    })
}

/// Consumes exactly `n` bytes from the stream.
pub(crate) fn skip_bytes<R: Read>(read: &mut R, n: u64) -> Result<()> {
    let copied = io::copy(&mut read.take(n), &mut io::sink())?;
    if copied == n {
        Ok(())
    } else {
        Err(Error::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn label_bytes(size: u32, dtype: u8, sonar: u16, endian: Endian) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut quad = [0; 4];
        endian.put_u32(&mut quad, size);
        bytes.extend_from_slice(&quad);
        bytes.push(START_BYTE);
        bytes.push(dtype);
        let mut pair = [0; 2];
        endian.put_u16(&mut pair, sonar);
        bytes.extend_from_slice(&pair);
        bytes
    }

    #[test]
    fn clean_stream_end() {
        let mut scanner = FrameScanner::new();
        let mut read = Cursor::new(Vec::new());
        assert!(scanner.next_label(&mut read).unwrap().is_none());
    }

    #[test]
    fn eof_mid_label() {
        let mut scanner = FrameScanner::new();
        let mut read = Cursor::new(vec![0u8; 5]);
        assert!(matches!(scanner.next_label(&mut read), Err(Error::Eof)));
    }

    #[test]
    fn first_label_commits_byte_order() {
        for endian in [Endian::Little, Endian::Big] {
            let mut scanner = FrameScanner::new();
            let bytes = label_bytes(100, 0x41, 3020, endian);
            let mut read = Cursor::new(bytes);
            let label = scanner.next_label(&mut read).unwrap().unwrap();
            assert_eq!(DatagramType::Attitude, label.dtype);
            assert_eq!(3020, label.sonar);
            assert_eq!(100, label.size);
            assert_eq!(Some(endian), scanner.byte_order());
        }
    }

    #[test]
    fn resync_over_garbage() {
        let mut bytes = vec![0xAA; 37];
        bytes.extend(label_bytes(64, 0x41, 300, Endian::Little));
        let mut scanner = FrameScanner::new();
        let mut read = Cursor::new(bytes);
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        assert_eq!(DatagramType::Attitude, label.dtype);
        assert_eq!(37, scanner.skipped_bytes());
    }

    #[test]
    fn bad_type_with_valid_sonar_skips_record() {
        let mut scanner = FrameScanner::new();
        // commit the byte order with a valid frame first
        let mut bytes = label_bytes(7, 0x41, 300, Endian::Little);
        bytes.extend_from_slice(&[0, 0, 0]);
        // then a framed record with a type byte outside the valid set
        bytes.extend(label_bytes(10, 0x3F, 300, Endian::Little));
        bytes.extend_from_slice(&[0; 6]);
        // and a good frame after it
        bytes.extend(label_bytes(7, 0x43, 300, Endian::Little));
        bytes.extend_from_slice(&[0, 0, 0]);
        let mut read = Cursor::new(bytes);
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        assert_eq!(DatagramType::Attitude, label.dtype);
        skip_bytes(&mut read, label.body_len() as u64).unwrap();
        assert!(matches!(
            scanner.next_label(&mut read),
            Err(Error::BadDatagram(0x3F))
        ));
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        assert_eq!(DatagramType::Clock, label.dtype);
    }

    #[test]
    fn zero_sonar_svp_falls_back() {
        let mut scanner = FrameScanner::new();
        let mut bytes = label_bytes(7, 0x41, 3000, Endian::Little);
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend(label_bytes(7, 0x56, 0, Endian::Little));
        bytes.extend_from_slice(&[0, 0, 0]);
        let mut read = Cursor::new(bytes);
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        skip_bytes(&mut read, label.body_len() as u64).unwrap();
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        assert_eq!(DatagramType::Svp, label.dtype);
        assert_eq!(3000, label.sonar);
    }

    #[test]
    fn zero_sonar_attitude_is_garbage() {
        // the zero-id fallback is an SVP/SSV vendor bug, nothing else
        let mut scanner = FrameScanner::new();
        let mut bytes = label_bytes(7, 0x41, 3000, Endian::Little);
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend(label_bytes(7, 0x41, 0, Endian::Little));
        bytes.extend_from_slice(&[0, 0, 0]);
        let mut read = Cursor::new(bytes);
        let label = scanner.next_label(&mut read).unwrap().unwrap();
        skip_bytes(&mut read, label.body_len() as u64).unwrap();
        assert!(matches!(scanner.next_label(&mut read), Err(Error::Eof)));
    }
}
