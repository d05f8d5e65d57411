//! Read Imagenex DeltaT files.

use crate::deltat::{record, DeltaTRecord, Format, HEADER_LENGTH};
use crate::{Error, RecordKind, Result};
use log::warn;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Reads records from a DeltaT `.83P` or `.83M` file.
///
/// Each call to [Reader::read] decodes one record into the owned
/// [DeltaTRecord]. Vendor records get their soundings recomputed on the
/// way in, so the bathymetry arrays are always populated for data
/// records. Garbage between records is skipped by sliding byte-by-byte
/// until a record magic comes around.
///
/// # Examples
///
/// ```no_run
/// use swath::deltat::{Format, Reader};
/// let mut reader = Reader::from_path("survey.83p", Format::Vendor).unwrap();
/// while let Some(kind) = reader.read().unwrap() {
///     println!("{:?}: {} beams", kind, reader.record().num_beams);
/// }
/// ```
#[derive(Debug)]
pub struct Reader<R: Read> {
    read: R,
    format: Format,
    record: Box<DeltaTRecord>,
    skipped: u64,
    reported: bool,
}

impl Reader<BufReader<File>> {
    /// Opens a reader for the given path.
    pub fn from_path<P: AsRef<Path>>(path: P, format: Format) -> Result<Reader<BufReader<File>>> {
        Ok(Reader::new(BufReader::new(File::open(path)?), format))
    }
}

impl<R: Read> Reader<R> {
    /// Creates a reader over any byte stream.
    pub fn new(read: R, format: Format) -> Reader<R> {
        Reader {
            read,
            format,
            record: Box::default(),
            skipped: 0,
            reported: false,
        }
    }

    /// The record the decoders fill.
    pub fn record(&self) -> &DeltaTRecord {
        &self.record
    }

    /// Which flavor this reader expects.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Total garbage bytes skipped between records.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Consumes the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.read
    }

    /// Reads the next record, returning its kind, or `None` at a clean
    /// end of file.
    pub fn read(&mut self) -> Result<Option<RecordKind>> {
        let Some(window) = self.find_magic()? else {
            self.record.kind = RecordKind::None;
            return Ok(None);
        };
        let total = usize::from(u16::from_be_bytes([window[4], window[5]]));
        if total < 8 {
            return Err(Error::Unintelligible(format!(
                "record claims {} total bytes",
                total
            )));
        }
        let mut buffer = vec![0u8; total];
        buffer[..6].copy_from_slice(&window);
        self.read.read_exact(&mut buffer[6..]).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                Error::Eof
            } else {
                Error::from(err)
            }
        })?;

        let record = self.record.as_mut();
        *record = DeltaTRecord::default();
        if buffer[6] == b'#' {
            record::parse_comment(&buffer, record);
            return Ok(Some(RecordKind::Comment));
        }
        if total < HEADER_LENGTH {
            return Err(Error::Unintelligible(format!(
                "data record of {} bytes is shorter than its header",
                total
            )));
        }
        let extended_magic = &window[..3] == b"83M";
        match (self.format, extended_magic) {
            (Format::Vendor, _) => {
                record::parse_vendor(&buffer, record)?;
                record.recompute_soundings();
            }
            (Format::Extended, true) => {
                record::parse_extended(&buffer, record)?;
            }
            (Format::Extended, false) => {
                record::parse_obsolete_extended(&buffer, record)?;
                record.recompute_soundings();
            }
        }
        Ok(Some(RecordKind::Data))
    }

    /// Scans to the next record magic, returning the six bytes of magic,
    /// version, and total length, or `None` at a clean end of file.
    fn find_magic(&mut self) -> Result<Option<[u8; 6]>> {
        let mut window = [0u8; 6];
        let mut filled = 0;
        while filled < window.len() {
            let n = self.read.read(&mut window[filled..])?;
            if n == 0 {
                return if filled == 0 { Ok(None) } else { Err(Error::Eof) };
            }
            filled += n;
        }
        let mut slid = 0u64;
        loop {
            let magic = &window[..3];
            let accepted = match self.format {
                Format::Vendor => magic == b"83P",
                Format::Extended => magic == b"83P" || magic == b"83M",
            };
            if accepted {
                if slid > 0 {
                    self.skipped += slid;
                    if !self.reported {
                        warn!("lost record sync, skipped {} bytes", slid);
                        self.reported = true;
                    }
                }
                return Ok(Some(window));
            }
            window.copy_within(1.., 0);
            let mut byte = [0u8; 1];
            match self.read.read(&mut byte)? {
                0 => return Err(Error::Eof),
                _ => window[5] = byte[0],
            }
            slid += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_file() {
        let mut reader = Reader::new(Cursor::new(Vec::new()), Format::Extended);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn eof_mid_magic() {
        let mut reader = Reader::new(Cursor::new(b"83".to_vec()), Format::Extended);
        assert!(matches!(reader.read(), Err(Error::Eof)));
    }

    #[test]
    fn comment_then_eof() {
        let bytes = record::encode_comment("hello", b"83M", 10);
        let mut reader = Reader::new(Cursor::new(bytes), Format::Extended);
        assert_eq!(Some(RecordKind::Comment), reader.read().unwrap());
        assert_eq!("hello", reader.record().comment);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn garbage_before_record_is_skipped() {
        let mut bytes = vec![0x55u8; 21];
        bytes.extend(record::encode_comment("after noise", b"83P", 0));
        let mut reader = Reader::new(Cursor::new(bytes), Format::Vendor);
        assert_eq!(Some(RecordKind::Comment), reader.read().unwrap());
        assert_eq!(21, reader.skipped_bytes());
    }
}
