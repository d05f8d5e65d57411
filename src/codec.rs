//! Byte-level codec shared by both formats.
//!
//! A datagram stream may be written by either a little- or a big-endian
//! processor. The byte order is detected once per stream (see
//! [crate::sonar::detect_byte_order]) and then threaded explicitly into
//! every field read or write through an [Endian] value; nothing here holds
//! byte-order state of its own.

use crate::{Error, Result};
use byteorder::ByteOrder as _;
use byteorder::{BigEndian, LittleEndian};

/// Byte order of a datagram stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endian {
    /// Returns the opposite byte order.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::Endian;
    /// assert_eq!(Endian::Big, Endian::Little.opposite());
    /// ```
    pub fn opposite(&self) -> Endian {
        match self {
            Endian::Little => Endian::Big,
            Endian::Big => Endian::Little,
        }
    }

    /// Decodes a u16 from the first two bytes of the slice.
    pub fn get_u16(&self, bytes: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(bytes),
            Endian::Big => BigEndian::read_u16(bytes),
        }
    }

    /// Decodes a u32 from the first four bytes of the slice.
    pub fn get_u32(&self, bytes: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(bytes),
            Endian::Big => BigEndian::read_u32(bytes),
        }
    }

    /// Decodes an f32 from the first four bytes of the slice.
    pub fn get_f32(&self, bytes: &[u8]) -> f32 {
        match self {
            Endian::Little => LittleEndian::read_f32(bytes),
            Endian::Big => BigEndian::read_f32(bytes),
        }
    }

    /// Encodes a u16 into the first two bytes of the slice.
    pub fn put_u16(&self, bytes: &mut [u8], n: u16) {
        match self {
            Endian::Little => LittleEndian::write_u16(bytes, n),
            Endian::Big => BigEndian::write_u16(bytes, n),
        }
    }

    /// Encodes a u32 into the first four bytes of the slice.
    pub fn put_u32(&self, bytes: &mut [u8], n: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(bytes, n),
            Endian::Big => BigEndian::write_u32(bytes, n),
        }
    }

    /// Encodes an f32 into the first four bytes of the slice.
    pub fn put_f32(&self, bytes: &mut [u8], n: f32) {
        match self {
            Endian::Little => LittleEndian::write_f32(bytes, n),
            Endian::Big => BigEndian::write_f32(bytes, n),
        }
    }
}

/// Running 16-bit additive checksum over datagram bytes.
///
/// The sum covers every byte from the datagram type byte up to and
/// including the end-of-record byte; the two checksum bytes themselves are
/// excluded. Overflow wraps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Checksum(u16);

impl Checksum {
    /// Creates a zeroed checksum accumulator.
    pub fn new() -> Checksum {
        Checksum(0)
    }

    /// Folds the bytes into the running sum.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::Checksum;
    /// let mut checksum = Checksum::new();
    /// checksum.update(&[0x02, 0x03]);
    /// assert_eq!(5, checksum.value());
    /// ```
    pub fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.wrapping_add(u16::from(byte));
        }
    }

    /// Returns the accumulated sum.
    pub fn value(&self) -> u16 {
        self.0
    }
}

/// A cursor over a datagram body with a fixed byte order.
///
/// Every accessor returns [Error::Eof] when the body is shorter than the
/// field, enforcing the body-length contract of the decoders.
pub(crate) struct BodyReader<'a> {
    endian: Endian,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(endian: Endian, buf: &'a [u8]) -> BodyReader<'a> {
        BodyReader {
            endian,
            buf,
            pos: 0,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(Error::Eof);
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(self.endian.get_u16(bytes))
    }

    pub(crate) fn i16(&mut self) -> Result<i16> {
        Ok(self.u16()? as i16)
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(self.endian.get_u32(bytes))
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    pub(crate) fn f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(self.endian.get_f32(bytes))
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        let _ = self.take(n)?;
        Ok(())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Builds a datagram body with a fixed byte order.
pub(crate) struct BodyWriter {
    endian: Endian,
    buf: Vec<u8>,
}

impl BodyWriter {
    pub(crate) fn new(endian: Endian) -> BodyWriter {
        BodyWriter {
            endian,
            buf: Vec::new(),
        }
    }

    pub(crate) fn u8(&mut self, n: u8) {
        self.buf.push(n);
    }

    pub(crate) fn i8(&mut self, n: i8) {
        self.buf.push(n as u8);
    }

    pub(crate) fn u16(&mut self, n: u16) {
        let mut bytes = [0; 2];
        self.endian.put_u16(&mut bytes, n);
        self.buf.extend_from_slice(&bytes);
    }

    pub(crate) fn i16(&mut self, n: i16) {
        self.u16(n as u16);
    }

    pub(crate) fn u32(&mut self, n: u32) {
        let mut bytes = [0; 4];
        self.endian.put_u32(&mut bytes, n);
        self.buf.extend_from_slice(&bytes);
    }

    pub(crate) fn i32(&mut self, n: i32) {
        self.u32(n as u32);
    }

    pub(crate) fn f32(&mut self, n: f32) {
        let mut bytes = [0; 4];
        self.endian.put_f32(&mut bytes, n);
        self.buf.extend_from_slice(&bytes);
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endian_round_trip() {
        for endian in [Endian::Little, Endian::Big] {
            let mut bytes = [0; 4];
            endian.put_u32(&mut bytes, 0xDEADBEEF);
            assert_eq!(0xDEADBEEF, endian.get_u32(&bytes));
            endian.put_f32(&mut bytes, -1.5);
            assert_eq!(-1.5, endian.get_f32(&bytes));
        }
    }

    #[test]
    fn endian_is_what_it_says() {
        let mut bytes = [0; 2];
        Endian::Big.put_u16(&mut bytes, 0x0102);
        assert_eq!([1, 2], bytes);
        Endian::Little.put_u16(&mut bytes, 0x0102);
        assert_eq!([2, 1], bytes);
    }

    #[test]
    fn checksum_wraps() {
        let mut checksum = Checksum::new();
        checksum.update(&[0xff; 1000]);
        assert_eq!((0xffu64 * 1000 % 65536) as u16, checksum.value());
    }

    #[test]
    fn body_reader_eof() {
        let mut body = BodyReader::new(Endian::Little, &[1, 2, 3]);
        assert_eq!(0x0201, body.u16().unwrap());
        assert!(matches!(body.u16(), Err(Error::Eof)));
    }

    #[test]
    fn body_writer_round_trip() {
        let mut writer = BodyWriter::new(Endian::Big);
        writer.u16(42);
        writer.i32(-7);
        writer.f32(2.5);
        let buf = writer.into_inner();
        let mut reader = BodyReader::new(Endian::Big, &buf);
        assert_eq!(42, reader.u16().unwrap());
        assert_eq!(-7, reader.i32().unwrap());
        assert_eq!(2.5, reader.f32().unwrap());
        assert_eq!(0, reader.remaining());
    }
}
