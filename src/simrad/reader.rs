//! Read a Simrad EM datagram stream.
//!
//! The reader couples the frame scanner to the per-datagram decoders and
//! runs the ping-assembly state machine: bathymetry, raw beam, and
//! sidescan datagrams arrive independently framed and are only surfaced as
//! one survey record once the set belonging to a ping is complete. The
//! assembler's own state (what it expects next, which variant leads in
//! this stream, and a stashed label when a record turns out to belong to
//! the next ping) survives across calls to [Reader::read].

use crate::attitude::{Attitude, AttitudeCache};
use crate::geometry::{beaudoin, steer_sign, Orientation};
use crate::ping::{PingRecord, MAX_PIXELS};
use crate::simrad::frame::{read_exact_or_eof, skip_bytes, FrameScanner, Label};
use crate::simrad::{sensor, survey, DatagramType};
use crate::{Endian, Error, RecordKind, Result, Store};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A label whose body may already have been pulled off the stream.
#[derive(Debug)]
struct Pending {
    label: Label,
    body: Option<Vec<u8>>,
}

/// The assembler state preserved between top-level reads.
#[derive(Debug, Default)]
struct AssemblerState {
    /// The datagram type that would complete the ping in progress.
    expect: Option<DatagramType>,
    /// Which survey variant leads a ping in this stream.
    first_type: Option<DatagramType>,
    /// A record that belongs to the next ping, replayed on the next call.
    pending: Option<Pending>,
}

/// Reads records from a Simrad EM datagram stream.
///
/// # Examples
///
/// ```no_run
/// use swath::simrad::Reader;
/// let mut reader = Reader::from_path("survey.all").unwrap();
/// while let Some(kind) = reader.read().unwrap() {
///     println!("{:?} at {:?}", kind, reader.store().timestamp);
/// }
/// ```
#[derive(Debug)]
pub struct Reader<R: Read> {
    read: R,
    store: Store,
    scanner: FrameScanner,
    state: AssemblerState,
    head0_serial: Option<u16>,
}

impl Reader<BufReader<File>> {
    /// Opens a reader for the given path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<BufReader<File>>> {
        Ok(Reader::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> Reader<R> {
    /// Creates a reader over any byte stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use swath::simrad::Reader;
    /// let mut reader = Reader::new(Cursor::new(Vec::new()));
    /// assert!(reader.read().unwrap().is_none());
    /// ```
    pub fn new(read: R) -> Reader<R> {
        Reader {
            read,
            store: Store::new(),
            scanner: FrameScanner::new(),
            state: AssemblerState::default(),
            head0_serial: None,
        }
    }

    /// The record store the decoders fill.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The stream byte order, once the first frame has fixed it.
    pub fn byte_order(&self) -> Option<Endian> {
        self.scanner.byte_order()
    }

    /// Total garbage bytes skipped by resynchronization.
    pub fn skipped_bytes(&self) -> u64 {
        self.scanner.skipped_bytes()
    }

    /// Consumes the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.read
    }

    /// Reads the next record, returning its kind, or `None` at a clean end
    /// of stream.
    ///
    /// Survey datagrams are held back until their ping completes, so one
    /// returned `Data` record may account for several consumed datagrams.
    /// A partial ping buffered at end of stream is discarded without
    /// error. Recoverable errors ([Error::Unintelligible],
    /// [Error::BadDatagram]) leave the reader aligned on the next frame;
    /// calling again continues the stream.
    pub fn read(&mut self) -> Result<Option<RecordKind>> {
        loop {
            let (label, cached) = match self.state.pending.take() {
                Some(pending) => (pending.label, pending.body),
                None => match self.scanner.next_label(&mut self.read)? {
                    Some(label) => (label, None),
                    None => {
                        self.store.kind = RecordKind::None;
                        return Ok(None);
                    }
                },
            };
            self.store.sonar = label.sonar;

            // an installation record while a ping is assembling means the
            // ping is over; stash the label and surface the partial ping
            if label.dtype.is_installation() && self.state.expect.is_some() {
                self.state.pending = Some(Pending {
                    label,
                    body: cached,
                });
                self.state.expect = None;
                self.finalize_ping();
                self.store.kind = RecordKind::Data;
                return Ok(Some(RecordKind::Data));
            }

            if label.dtype.is_skipped() {
                skip_bytes(&mut self.read, label.body_len() as u64)?;
                continue;
            }

            let endian = self.scanner.byte_order().expect("set by the first label");
            let body = match cached {
                Some(body) => body,
                None => {
                    let mut body = vec![0; label.body_len()];
                    read_exact_or_eof(&mut self.read, &mut body)?;
                    body
                }
            };
            if body.len() < 3 {
                continue;
            }
            let split = body.len() - 3;

            let kind = match label.dtype {
                DatagramType::Bath | DatagramType::BathExtended => {
                    match self.handle_bath(label, body, endian)? {
                        Some(kind) => kind,
                        None => continue,
                    }
                }
                DatagramType::Sidescan | DatagramType::SidescanExtended => {
                    match self.handle_sidescan(label, body, endian)? {
                        Some(kind) => kind,
                        None => continue,
                    }
                }
                DatagramType::RawBeam => {
                    let payload = &body[..split];
                    let head = self.route_head(survey::peek_count_serial(payload, endian));
                    let result = survey::read_raw_beam1(payload, endian, self.store.ping_mut(head));
                    self.check_assembly(result)?;
                    continue;
                }
                DatagramType::RawBeam2 => {
                    let payload = &body[..split];
                    let head = self.route_head(survey::peek_count_serial(payload, endian));
                    let result = survey::read_raw_beam2(payload, endian, self.store.ping_mut(head));
                    self.check_assembly(result)?;
                    continue;
                }
                DatagramType::RawBeam3 => {
                    let payload = &body[..split];
                    let head = self.route_head(survey::peek_count_serial(payload, endian));
                    let result = survey::read_raw_beam3(payload, endian, self.store.ping_mut(head));
                    self.check_assembly(result)?;
                    continue;
                }
                DatagramType::Attitude => {
                    sensor::read_attitude(&body[..split], endian, &mut self.store)?;
                    self.feed_attitude_cache();
                    RecordKind::Attitude
                }
                DatagramType::Heading => sensor::read_heading(&body[..split], endian, &mut self.store)?,
                DatagramType::Ssv => sensor::read_ssv(&body[..split], endian, &mut self.store)?,
                DatagramType::Tilt => sensor::read_tilt(&body[..split], endian, &mut self.store)?,
                DatagramType::Clock => sensor::read_clock(&body[..split], endian, &mut self.store)?,
                DatagramType::Tide => sensor::read_tide(&body[..split], endian, &mut self.store)?,
                DatagramType::Height => sensor::read_height(&body[..split], endian, &mut self.store)?,
                DatagramType::Position => sensor::read_position(&body[..split], endian, &mut self.store)?,
                DatagramType::RunParameter => {
                    sensor::read_run_parameter(&body[..split], endian, &mut self.store)?
                }
                DatagramType::Svp => sensor::read_svp(&body[..split], endian, &mut self.store, false)?,
                DatagramType::Svp2 => sensor::read_svp(&body[..split], endian, &mut self.store, true)?,
                DatagramType::WaterColumn => {
                    survey::read_water_column(&body[..split], endian, &mut self.store)?
                }
                DatagramType::Start
                | DatagramType::Stop
                | DatagramType::Stop2
                | DatagramType::Off
                | DatagramType::On => {
                    let payload = &body[..split];
                    if payload.first() == Some(&b'#') {
                        sensor::read_comment(payload, &mut self.store)?
                    } else {
                        let kind = label.dtype.record_kind().unwrap_or(RecordKind::Start);
                        sensor::read_installation(payload, endian, &mut self.store, kind)?
                    }
                }
                DatagramType::SbDepth
                | DatagramType::CbEcho
                | DatagramType::SspInput
                | DatagramType::Remote
                | DatagramType::Ssp => unreachable!("skipped above"),
            };
            self.store.kind = kind;
            return Ok(Some(kind));
        }
    }

    /// The sidescan variant that matches a bathymetry variant, and back.
    fn partner(dtype: DatagramType) -> DatagramType {
        match dtype {
            DatagramType::Bath => DatagramType::Sidescan,
            DatagramType::BathExtended => DatagramType::SidescanExtended,
            DatagramType::Sidescan => DatagramType::Bath,
            DatagramType::SidescanExtended => DatagramType::BathExtended,
            _ => dtype,
        }
    }

    fn is_sidescan(dtype: DatagramType) -> bool {
        matches!(
            dtype,
            DatagramType::Sidescan | DatagramType::SidescanExtended
        )
    }

    fn handle_bath(
        &mut self,
        label: Label,
        body: Vec<u8>,
        endian: Endian,
    ) -> Result<Option<RecordKind>> {
        let split = body.len() - 3;
        let payload = &body[..split];
        let extended = label.dtype == DatagramType::BathExtended;
        let count_serial = survey::peek_count_serial(payload, endian);
        match self.state.expect {
            None => {
                // a new ping begins
                if let Some(first) = self.state.first_type {
                    if first != label.dtype {
                        debug!(
                            "leading survey datagram changed from {:?} to {:?}",
                            first, label.dtype
                        );
                    }
                }
                self.reset_pings();
                let head = self.route_head(count_serial);
                let sonar = self.store.sonar_id();
                let result =
                    survey::read_bath(payload, endian, sonar, extended, self.store.ping_mut(head));
                self.check_assembly(result)?;
                self.state.first_type = Some(label.dtype);
                self.state.expect = Some(Self::partner(label.dtype));
                Ok(None)
            }
            Some(expected) if Self::is_sidescan(expected) => {
                // bathymetry while expecting sidescan: either the second
                // head of the same ping, or the previous ping had no
                // sidescan at all
                if self.store.is_dual_head() && self.belongs_to_current_ping(count_serial) {
                    let head = self.route_head(count_serial);
                    let sonar = self.store.sonar_id();
                    let result = survey::read_bath(
                        payload,
                        endian,
                        sonar,
                        extended,
                        self.store.ping_mut(head),
                    );
                    self.check_assembly(result)?;
                    return Ok(None);
                }
                self.state.pending = Some(Pending {
                    label,
                    body: Some(body),
                });
                self.state.expect = None;
                self.finalize_ping();
                self.store.kind = RecordKind::Data;
                Ok(Some(RecordKind::Data))
            }
            Some(_) => {
                // sidescan led this ping; the bathymetry completes it
                let head = self.route_head(count_serial);
                let sonar = self.store.sonar_id();
                let result =
                    survey::read_bath(payload, endian, sonar, extended, self.store.ping_mut(head));
                self.check_assembly(result)?;
                self.complete_if_matched(head)
            }
        }
    }

    fn handle_sidescan(
        &mut self,
        label: Label,
        body: Vec<u8>,
        endian: Endian,
    ) -> Result<Option<RecordKind>> {
        let split = body.len() - 3;
        let payload = &body[..split];
        let extended = label.dtype == DatagramType::SidescanExtended;
        let count_serial = survey::peek_count_serial(payload, endian);
        match self.state.expect {
            None => {
                // sidescan leads in this stream
                self.reset_pings();
                let head = self.route_head(count_serial);
                let result =
                    survey::read_sidescan(payload, endian, extended, self.store.ping_mut(head));
                self.check_assembly(result)?;
                self.state.first_type = Some(label.dtype);
                self.state.expect = Some(Self::partner(label.dtype));
                Ok(None)
            }
            Some(expected) if Self::is_sidescan(expected) => {
                let head = self.route_head(count_serial);
                let result =
                    survey::read_sidescan(payload, endian, extended, self.store.ping_mut(head));
                self.check_assembly(result)?;
                self.complete_if_matched(head)
            }
            Some(_) => {
                // two sidescans in a row: the previous ping never got its
                // bathymetry, surface what there is
                self.state.pending = Some(Pending {
                    label,
                    body: Some(body),
                });
                self.state.expect = None;
                self.finalize_ping();
                self.store.kind = RecordKind::Data;
                Ok(Some(RecordKind::Data))
            }
        }
    }

    /// After a head gained its second survey record, decide whether the
    /// ping (or ping pair) is complete, applying the timestamp matching
    /// rules.
    fn complete_if_matched(&mut self, head: usize) -> Result<Option<RecordKind>> {
        let ping = self.store.ping(head).expect("just decoded into it");
        if ping.seen.bath && ping.seen.sidescan {
            let bath_time = ping.bath.timestamp;
            let ss_time = ping.sidescan.timestamp;
            if bath_time > ss_time {
                // stale sidescan: drop it and surface the ping without
                debug!(
                    "sidescan older than bathymetry ({:?} < {:?}), zeroing it",
                    ss_time, bath_time
                );
                let ping = self.store.ping_mut(head);
                ping.sidescan = Default::default();
                ping.seen.sidescan = false;
                self.state.expect = None;
                self.finalize_ping();
                self.store.kind = RecordKind::Data;
                return Ok(Some(RecordKind::Data));
            }
            if bath_time < ss_time {
                // the sidescan belongs to a ping we never saw; nothing
                // here can be trusted
                self.state.expect = None;
                self.reset_pings();
                return Err(Error::Unintelligible(format!(
                    "sidescan newer than bathymetry: {:?} vs {:?}",
                    ss_time, bath_time
                )));
            }
        }
        if self.assembly_complete() {
            self.state.expect = None;
            self.finalize_ping();
            self.store.kind = RecordKind::Data;
            Ok(Some(RecordKind::Data))
        } else {
            Ok(None)
        }
    }

    /// A single-head ping is complete when its pair matched; a dual-head
    /// ping additionally needs both heads with matching counters.
    fn assembly_complete(&self) -> bool {
        if !self.store.is_dual_head() {
            return self
                .store
                .ping(0)
                .map(|ping| ping.seen.bath && ping.seen.sidescan)
                .unwrap_or(false);
        }
        let (Some(first), Some(second)) = (self.store.ping(0), self.store.ping(1)) else {
            return false;
        };
        first.seen.bath
            && first.seen.sidescan
            && second.seen.bath
            && second.seen.sidescan
            && first.count() == second.count()
    }

    /// True when a survey record's counter matches the ping currently
    /// being assembled, so a dual-head partner record joins it instead of
    /// starting the next ping.
    fn belongs_to_current_ping(&self, count_serial: Option<(u16, u16)>) -> bool {
        let Some((count, _)) = count_serial else {
            return false;
        };
        self.store
            .pings
            .iter()
            .flatten()
            .any(|ping| ping.seen.bath && ping.count() == count)
    }

    /// Maps a record's serial number onto a head index. The first serial
    /// observed owns head 0; any other serial is the second head.
    fn route_head(&mut self, count_serial: Option<(u16, u16)>) -> usize {
        if !self.store.is_dual_head() {
            return 0;
        }
        let serial = count_serial.map(|(_, serial)| serial).unwrap_or(0);
        match self.head0_serial {
            None => {
                self.head0_serial = Some(serial);
                0
            }
            Some(first) if first == serial => 0,
            Some(_) => 1,
        }
    }

    fn reset_pings(&mut self) {
        for slot in self.store.pings.iter_mut().flatten() {
            slot.reset();
        }
    }

    /// On a recoverable decode failure mid-assembly, abandon the ping so
    /// the next record starts clean, then propagate.
    fn check_assembly(&mut self, result: Result<()>) -> Result<()> {
        if let Err(err) = result {
            if err.is_recoverable() {
                self.state.expect = None;
                self.state.first_type = None;
                self.reset_pings();
            }
            return Err(err);
        }
        Ok(())
    }

    /// Pushes a freshly decoded attitude series into the interpolation
    /// cache.
    fn feed_attitude_cache(&mut self) {
        let Some(record) = self.store.attitude.as_deref() else {
            return;
        };
        let base = record.timestamp.seconds();
        let samples: Vec<Attitude> = record
            .samples
            .iter()
            .map(|sample| Attitude {
                time: base + f64::from(sample.time) / 1000.0,
                roll: f64::from(sample.roll) / 100.0,
                pitch: f64::from(sample.pitch) / 100.0,
                heave: f64::from(sample.heave) / 100.0,
                heading: f64::from(sample.heading) / 100.0,
            })
            .collect();
        for sample in samples {
            self.store.attitude_cache.push(sample);
        }
    }

    /// Completes every assembled head: attitude fill from the cache,
    /// sidescan pixel processing, beam-index cross-checks, and beam
    /// geometry from the raw record when the bathymetry lacks it.
    fn finalize_ping(&mut self) {
        for head in 0..self.store.pings.len() {
            let Some(ping) = self.store.pings[head].as_deref() else {
                continue;
            };
            if !ping.seen.bath && !ping.seen.sidescan {
                continue;
            }
            let query = ping.bath.timestamp.seconds();
            let interpolated = self.store.attitude_cache.interpolate(query);
            let ping = self.store.pings[head].as_deref_mut().expect("checked");
            if let Some((attitude, extrapolated)) = interpolated {
                ping.bath.roll = (attitude.roll * 100.0) as i16;
                ping.bath.pitch = (attitude.pitch * 100.0) as i16;
                ping.bath.heave = (attitude.heave * 100.0) as i16;
                ping.bath.attitude_extrapolated = extrapolated;
            }
            process_sidescan(ping);
            check_beam_indexes(ping);
            let installation = &self.store.installation;
            let heading_offset = if head == 0 {
                installation.s1h
            } else {
                installation.s2h
            };
            let mount = Orientation {
                roll: if head == 0 {
                    installation.s1r
                } else {
                    installation.s2r
                },
                pitch: if head == 0 {
                    installation.s1p
                } else {
                    installation.s2p
                },
                heading: heading_offset,
            };
            fill_beam_angles(ping, mount, &self.store.attitude_cache);
        }
    }
}

/// Builds the processed sidescan image by centering the raw samples in the
/// fixed-width pixel array, when the datagram did not carry processed
/// pixels of its own.
fn process_sidescan(ping: &mut PingRecord) {
    let ss = &mut ping.sidescan;
    if !ping.seen.sidescan || ss.pixels_ss > 0 || ss.npixels == 0 || ss.npixels > MAX_PIXELS {
        return;
    }
    let offset = (MAX_PIXELS - ss.npixels) / 2;
    for i in 0..ss.npixels {
        ss.ss[offset + i] = i16::from(ss.ssraw[i]);
    }
    ss.pixels_ss = MAX_PIXELS;
}

/// Cross-checks bathymetry beam numbers against sidescan beam indexes;
/// mismatches are diagnostics, never failures.
fn check_beam_indexes(ping: &PingRecord) {
    if !ping.seen.bath || !ping.seen.sidescan {
        return;
    }
    if ping.bath.nbeams != ping.sidescan.nbeams_ss {
        return;
    }
    for i in 0..ping.bath.nbeams {
        let beam_num = i32::from(ping.bath.beam_num[i] & 0x7f);
        let beam_index = i32::from(ping.sidescan.beam_index[i]);
        if (beam_num - beam_index).abs() > 1 {
            debug!(
                "beam number {} does not match sidescan beam index {}",
                beam_num, beam_index
            );
        }
    }
}

/// Fills per-beam depression and azimuth angles from the raw steering
/// data when the bathymetry record carries none, composing the mount and
/// vessel orientations per beam. A reverse-mounted array (heading offset
/// near 180 degrees) flips its steering sign and folds the mount angles.
/// The receive orientation is taken at each beam's echo return time when
/// the attitude cache can supply it.
fn fill_beam_angles(ping: &mut PingRecord, mount: Orientation, cache: &AttitudeCache) {
    if !ping.seen.raw3 || !ping.seen.bath {
        return;
    }
    if ping.raw3.nbeams != ping.bath.nbeams {
        return;
    }
    if ping.bath.depression[..ping.bath.nbeams]
        .iter()
        .any(|&angle| angle != 0)
    {
        return;
    }
    let mut align = mount;
    let tx_sign = steer_sign(align.heading);
    let rx_sign = steer_sign(align.heading);
    if align.heading.abs() > 100.0 {
        align.heading -= 180.0_f64.copysign(align.heading);
        align.roll = -align.roll;
        align.pitch = -align.pitch;
    }
    let roll = f64::from(ping.bath.roll) / 100.0;
    let pitch = f64::from(ping.bath.pitch) / 100.0;
    let heading = f64::from(ping.bath.heading) / 100.0;
    let tx_orientation = Orientation {
        roll,
        pitch,
        heading,
    };
    let ping_seconds = ping.bath.timestamp.seconds();
    // raw ranges are quarter-sample two way travel times; the sample rate
    // field is 0.01 Hz
    let sample_rate = f64::from(ping.raw3.sample_rate) / 100.0;
    for i in 0..ping.bath.nbeams {
        let sector = ping.raw3.rxsector[i] as usize;
        let tilt = if sector < ping.raw3.ntx {
            f64::from(ping.raw3.txtiltangle[sector]) / 100.0
        } else {
            0.0
        };
        let tx_steer = tx_sign * tilt;
        let rx_steer = rx_sign * f64::from(ping.raw3.rxpointangle[i]) / 100.0;
        let rx_orientation = if sample_rate > 0.0 {
            let echo_time = ping_seconds
                + f64::from(ping.raw3.rxrange[i]) * 0.25 / sample_rate;
            match cache.interpolate(echo_time) {
                Some((attitude, _)) => Orientation {
                    roll: attitude.roll,
                    pitch: attitude.pitch,
                    heading,
                },
                None => tx_orientation,
            }
        } else {
            tx_orientation
        };
        let (azimuth, depression) = beaudoin(
            align,
            tx_orientation,
            tx_steer,
            align,
            rx_orientation,
            rx_steer,
            heading,
        );
        ping.bath.depression[i] = (depression * 100.0).round() as i32;
        ping.bath.azimuth[i] = (azimuth.rem_euclid(360.0) * 100.0).round() as i32;
    }
}
