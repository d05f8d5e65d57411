//! Write Imagenex DeltaT files.

use crate::deltat::{record, DeltaTRecord, Format};
use crate::{Error, RecordKind, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes DeltaT records.
///
/// A vendor writer produces `.83P` records in whatever version the record
/// declares; per-beam flags and processed soundings are lost, as the
/// vendor format has nowhere to put them. An extended writer always
/// produces `.83M` version 10 records, which preserve them.
#[derive(Debug)]
pub struct Writer<W: Write> {
    write: W,
    format: Format,
}

impl Writer<BufWriter<File>> {
    /// Creates a file-backed writer.
    pub fn from_path<P: AsRef<Path>>(path: P, format: Format) -> Result<Writer<BufWriter<File>>> {
        Ok(Writer::new(BufWriter::new(File::create(path)?), format))
    }
}

impl<W: Write> Writer<W> {
    /// Creates a writer producing the given flavor.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use swath::deltat::{DeltaTRecord, Format, Writer};
    /// use swath::RecordKind;
    ///
    /// let mut record = DeltaTRecord::default();
    /// record.kind = RecordKind::Comment;
    /// record.comment = "first line".to_string();
    /// let mut writer = Writer::new(Cursor::new(Vec::new()), Format::Extended);
    /// writer.write(&record).unwrap();
    /// ```
    pub fn new(write: W, format: Format) -> Writer<W> {
        Writer { write, format }
    }

    /// Which flavor this writer produces.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Writes one record.
    pub fn write(&mut self, record: &DeltaTRecord) -> Result<()> {
        let buffer = match record.kind {
            RecordKind::Comment => match self.format {
                Format::Vendor => record::encode_comment(&record.comment, b"83P", record.version),
                Format::Extended => record::encode_comment(&record.comment, b"83M", 10),
            },
            RecordKind::Data => match self.format {
                Format::Vendor => record::encode_vendor(record),
                Format::Extended => record::encode_extended(record),
            },
            kind => return Err(Error::BadKind(kind)),
        };
        self.write.write_all(&buffer).map_err(|err| {
            if err.kind() == io::ErrorKind::WriteZero {
                Error::WriteFail
            } else {
                Error::from(err)
            }
        })
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.write.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deltat::Reader;
    use std::io::Cursor;

    #[test]
    fn wrong_kind_is_bad_kind() {
        let record = DeltaTRecord::default();
        let mut writer = Writer::new(Cursor::new(Vec::new()), Format::Extended);
        assert!(matches!(
            writer.write(&record),
            Err(Error::BadKind(RecordKind::None))
        ));
    }

    #[test]
    fn extended_writer_output_reads_back() {
        let mut record = DeltaTRecord::default();
        record.kind = RecordKind::Data;
        record.version = 10;
        record.num_beams = 2;
        record.range[0] = 500;
        record.range[1] = 600;
        record.range_resolution = 2;
        record.sound_velocity = 15000;
        record.profile_tilt_angle = 180;
        record.pitch = 900;
        record.roll = 900;
        record.start_angle = 12000;
        record.angle_increment = 30;
        record.external_sensor_flags = 0x0f;
        record.recompute_soundings();

        let mut writer = Writer::new(Cursor::new(Vec::new()), Format::Extended);
        writer.write(&record).unwrap();
        let bytes = writer.into_inner().into_inner();
        let mut reader = Reader::new(Cursor::new(bytes), Format::Extended);
        assert_eq!(Some(RecordKind::Data), reader.read().unwrap());
        assert_eq!(record.num_beams, reader.record().num_beams);
        assert_eq!(record.bath[..2], reader.record().bath[..2]);
        assert_eq!(record.beamflag[..2], reader.record().beamflag[..2]);
    }
}
