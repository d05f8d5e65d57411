//! Write Simrad EM datagram streams.
//!
//! The writer frames each encoded payload with the size field, start and
//! type bytes, sonar id, end byte, and the additive checksum. Payloads are
//! padded so every record's size field comes out even, which is what the
//! vendor's own datagrams do. The checksum bytes are stored little-endian
//! regardless of the body byte order.

use crate::codec::Checksum;
use crate::simrad::{sensor, survey, DatagramType, END_BYTE, START_BYTE};
use crate::{Endian, Error, RecordKind, Result, Store};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes records from a [Store] as Simrad EM datagrams.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use swath::simrad::Writer;
/// use swath::{Endian, RecordKind, Store};
///
/// let mut store = Store::new();
/// store.sonar = 3000;
/// store.kind = RecordKind::Comment;
/// store.comment = "calibration line".to_string();
/// let mut writer = Writer::new(Cursor::new(Vec::new()), Endian::Little);
/// writer.write(&store).unwrap();
/// ```
#[derive(Debug)]
pub struct Writer<W: Write> {
    write: W,
    byte_order: Endian,
}

impl Writer<BufWriter<File>> {
    /// Creates a file-backed writer.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        byte_order: Endian,
    ) -> Result<Writer<BufWriter<File>>> {
        Ok(Writer::new(BufWriter::new(File::create(path)?), byte_order))
    }
}

impl<W: Write> Writer<W> {
    /// Creates a writer that frames records with the given byte order.
    pub fn new(write: W, byte_order: Endian) -> Writer<W> {
        Writer { write, byte_order }
    }

    /// The byte order this writer frames records with.
    pub fn byte_order(&self) -> Endian {
        self.byte_order
    }

    /// Writes the store's current record, dispatching on its kind.
    ///
    /// A `Data` store emits the full ping sequence `BathExtended →
    /// RawBeam{1|2|3}? → SidescanExtended?`, for head 0 then head 1,
    /// skipping sub-records that were never read. Asking for a kind the
    /// store holds no data for is [Error::BadKind]. The store's sonar id
    /// is stamped into every frame label, so it must be one of the valid
    /// ids for the stream to be readable again.
    pub fn write(&mut self, store: &Store) -> Result<()> {
        let endian = self.byte_order;
        match store.kind {
            RecordKind::Data => self.write_pings(store),
            RecordKind::Comment => self.put_record(
                DatagramType::Start,
                store.sonar,
                sensor::write_comment(&store.comment, endian),
            ),
            RecordKind::Attitude => match store.attitude.as_deref() {
                Some(record) => self.put_record(
                    DatagramType::Attitude,
                    store.sonar,
                    sensor::write_attitude(record, endian),
                ),
                None => Err(Error::BadKind(RecordKind::Attitude)),
            },
            RecordKind::Heading => match store.heading.as_deref() {
                Some(record) => self.put_record(
                    DatagramType::Heading,
                    store.sonar,
                    sensor::write_heading(record, endian),
                ),
                None => Err(Error::BadKind(RecordKind::Heading)),
            },
            RecordKind::Ssv => match store.ssv.as_deref() {
                Some(record) => self.put_record(
                    DatagramType::Ssv,
                    store.sonar,
                    sensor::write_ssv(record, endian),
                ),
                None => Err(Error::BadKind(RecordKind::Ssv)),
            },
            RecordKind::Tilt => match store.tilt.as_deref() {
                Some(record) => self.put_record(
                    DatagramType::Tilt,
                    store.sonar,
                    sensor::write_tilt(record, endian),
                ),
                None => Err(Error::BadKind(RecordKind::Tilt)),
            },
            RecordKind::Clock => self.put_record(
                DatagramType::Clock,
                store.sonar,
                sensor::write_clock(&store.clock, endian),
            ),
            RecordKind::Tide => self.put_record(
                DatagramType::Tide,
                store.sonar,
                sensor::write_tide(&store.tide, endian),
            ),
            RecordKind::Height => self.put_record(
                DatagramType::Height,
                store.sonar,
                sensor::write_height(&store.height, endian),
            ),
            RecordKind::Nav | RecordKind::Nav1 | RecordKind::Nav2 | RecordKind::Nav3 => self
                .put_record(
                    DatagramType::Position,
                    store.sonar,
                    sensor::write_position(&store.position, endian),
                ),
            RecordKind::VelocityProfile => self.put_record(
                DatagramType::Svp2,
                store.sonar,
                sensor::write_svp(&store.svp, endian),
            ),
            RecordKind::RunParameter => self.put_record(
                DatagramType::RunParameter,
                store.sonar,
                sensor::write_run_parameter(&store.run_parameter, endian),
            ),
            RecordKind::Start => self.put_record(
                DatagramType::Start,
                store.sonar,
                sensor::write_installation(&store.installation, endian),
            ),
            RecordKind::Stop => self.put_record(
                DatagramType::Stop,
                store.sonar,
                sensor::write_installation(&store.installation, endian),
            ),
            RecordKind::Status => self.put_record(
                DatagramType::On,
                store.sonar,
                sensor::write_installation(&store.installation, endian),
            ),
            RecordKind::WaterColumn => match store.water_column.as_deref() {
                Some(record) => self.put_record(
                    DatagramType::WaterColumn,
                    store.sonar,
                    survey::write_water_column(record, endian),
                ),
                None => Err(Error::BadKind(RecordKind::WaterColumn)),
            },
            RecordKind::None => Err(Error::BadKind(RecordKind::None)),
        }
    }

    fn write_pings(&mut self, store: &Store) -> Result<()> {
        let endian = self.byte_order;
        let sonar = store.sonar_id();
        let mut wrote = false;
        for head in 0..store.pings.len() {
            let Some(ping) = store.ping(head) else {
                continue;
            };
            if !ping.seen.bath {
                continue;
            }
            wrote = true;
            self.put_record(
                DatagramType::BathExtended,
                store.sonar,
                survey::write_bath(&ping.bath, endian, sonar, true),
            )?;
            if ping.seen.raw3 {
                self.put_record(
                    DatagramType::RawBeam3,
                    store.sonar,
                    survey::write_raw_beam3(&ping.raw3, endian),
                )?;
            } else if ping.seen.raw2 {
                self.put_record(
                    DatagramType::RawBeam2,
                    store.sonar,
                    survey::write_raw_beam2(&ping.raw2, endian),
                )?;
            } else if ping.seen.raw1 {
                self.put_record(
                    DatagramType::RawBeam,
                    store.sonar,
                    survey::write_raw_beam1(&ping.raw1, endian),
                )?;
            }
            if ping.seen.sidescan {
                self.put_record(
                    DatagramType::SidescanExtended,
                    store.sonar,
                    survey::write_sidescan(&ping.sidescan, endian, true),
                )?;
            }
        }
        if wrote {
            Ok(())
        } else {
            Err(Error::BadKind(RecordKind::Data))
        }
    }

    /// Frames one payload and writes it out.
    fn put_record(&mut self, dtype: DatagramType, sonar: u16, mut payload: Vec<u8>) -> Result<()> {
        // pad so the size field is even, as the vendor records are
        if payload.len() % 2 == 0 {
            payload.push(0);
        }
        let size = payload.len() as u32 + 7;
        let mut record = Vec::with_capacity(payload.len() + 11);
        let mut quad = [0; 4];
        self.byte_order.put_u32(&mut quad, size);
        record.extend_from_slice(&quad);
        record.push(START_BYTE);
        record.push(dtype.to_u8());
        let mut pair = [0; 2];
        self.byte_order.put_u16(&mut pair, sonar);
        record.extend_from_slice(&pair);
        record.extend_from_slice(&payload);
        record.push(END_BYTE);
        let mut checksum = Checksum::new();
        checksum.update(&record[5..]);
        record.extend_from_slice(&checksum.value().to_le_bytes());
        self.write.write_all(&record).map_err(|err| {
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
