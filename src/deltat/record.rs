//! The DeltaT record and its header and beam codecs.

use crate::deltat::{
    COMMENT_LENGTH, EXTENDED_BEAM_SIZE, HEADER_LENGTH, MAX_BEAMS, OBSOLETE_BEAM_SIZE,
};
use crate::geometry::{recompute_sounding, PingGeometry};
use crate::ping::BeamFlag;
use crate::{Endian, Error, RecordKind, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

const MONTHS: [&[u8; 3]; 12] = [
    b"JAN", b"FEB", b"MAR", b"APR", b"MAY", b"JUN", b"JUL", b"AUG", b"SEP", b"OCT", b"NOV",
    b"DEC",
];

/// One Imagenex DeltaT record: either a survey ping or a comment.
///
/// Integer fields keep the vendor's encodings: pitch and roll are
/// `degrees * 10 + 900`, heading is `degrees * 10`, the start angle is
/// `(degrees + 180) * 100`, sound velocity is 0.1 m/s with 15000 meaning
/// "not measured", and the profile tilt angle is `degrees + 180`.
#[derive(Clone, Debug, PartialEq)]
pub struct DeltaTRecord {
    /// What the record holds.
    pub kind: RecordKind,
    /// Format version byte: 0 for v1.00, 10 for v1.10.
    pub version: u8,
    /// Ping interrogation time, to millisecond precision.
    pub time: NaiveDateTime,
    /// Latitude in decimal degrees, negative south.
    pub nav_lat: f64,
    /// Longitude in decimal degrees, negative west.
    pub nav_lon: f64,
    /// Speed over ground in 0.1 knots.
    pub nav_speed: u8,
    /// Course over ground in 0.1 degrees.
    pub course: u16,
    /// Internal-sensor pitch, degrees * 10 + 900.
    pub pitch: u16,
    /// Internal-sensor roll, degrees * 10 + 900.
    pub roll: u16,
    /// Internal-sensor heading, degrees * 10.
    pub heading: u16,
    /// Number of beams in this ping.
    pub num_beams: usize,
    /// Samples per beam.
    pub samples_per_beam: u16,
    /// Sector size in degrees.
    pub sector_size: u16,
    /// Beam 0 angle, (degrees + 180) * 100.
    pub start_angle: u16,
    /// Angle spacing per beam in 0.01 degrees.
    pub angle_increment: u8,
    /// Acoustic range in meters.
    pub acoustic_range: u16,
    /// Acoustic frequency in kHz.
    pub acoustic_frequency: u16,
    /// Sound velocity in 0.1 m/s.
    pub sound_velocity: u16,
    /// Range resolution in millimeters.
    pub range_resolution: u16,
    /// Pulse length in microseconds.
    pub pulse_length: u16,
    /// Profile tilt angle (mounting offset), degrees + 180.
    pub profile_tilt_angle: u16,
    /// Repetition rate in milliseconds.
    pub rep_rate: u16,
    /// Ping number, incremented every ping.
    pub ping_number: u32,
    /// Sonar x offset in meters (v1.10).
    pub sonar_x_offset: f32,
    /// Sonar y offset in meters (v1.10).
    pub sonar_y_offset: f32,
    /// Sonar z offset in meters (v1.10).
    pub sonar_z_offset: f32,
    /// True when per-beam intensities follow the ranges (v1.10).
    pub has_intensity: bool,
    /// Ping latency in 100 microsecond units (v1.10).
    pub ping_latency: u16,
    /// Data latency in 100 microsecond units (v1.10).
    pub data_latency: u16,
    /// Sample-rate flag: 0 standard, 1 high resolution (v1.10).
    pub sample_rate: u8,
    /// Option flag bits (v1.10).
    pub option_flags: u8,
    /// Number of pings averaged (v1.10).
    pub number_averaged: u8,
    /// Center ping time offset in 100 microsecond units (v1.10).
    pub center_time_offset: u16,
    /// Heave from the external sensor in meters (v1.10).
    pub heave_external: f32,
    /// Copy of the 837 user defined byte (v1.10).
    pub user_defined_byte: u8,
    /// Altitude in meters (v1.10).
    pub altitude: f32,
    /// External sensor presence bits: heading, roll, pitch, heave.
    pub external_sensor_flags: u8,
    /// Pitch from the external sensor in degrees (v1.10).
    pub pitch_external: f32,
    /// Roll from the external sensor in degrees (v1.10).
    pub roll_external: f32,
    /// Heading from the external sensor in degrees (v1.10).
    pub heading_external: f32,
    /// Transmit scan flag: 0 manual, 1 auto (v1.10).
    pub transmit_scan_flag: u8,
    /// Transmit scan angle in degrees (v1.10).
    pub transmit_scan_angle: f32,
    /// Per-beam ranges in range resolution units.
    pub range: [u16; MAX_BEAMS],
    /// Per-beam intensities, present when [DeltaTRecord::has_intensity].
    pub intensity: [u16; MAX_BEAMS],
    /// Sonar depth in meters, carried by the extended format only.
    pub sonar_depth: f32,
    /// Number of processed soundings.
    pub num_proc_beams: usize,
    /// One-way beam ranges in meters.
    pub beamrange: [f64; MAX_BEAMS],
    /// Takeoff angles from vertical in degrees.
    pub angles: [f64; MAX_BEAMS],
    /// Azimuthal angles in degrees.
    pub angles_forward: [f64; MAX_BEAMS],
    /// Depths below the waterline in meters.
    pub bath: [f32; MAX_BEAMS],
    /// Acrosstrack distances in meters.
    pub acrosstrack: [f32; MAX_BEAMS],
    /// Alongtrack distances in meters.
    pub alongtrack: [f32; MAX_BEAMS],
    /// Per-beam amplitudes.
    pub amp: [f32; MAX_BEAMS],
    /// Per-beam flags, carried by the extended format only.
    pub beamflag: [BeamFlag; MAX_BEAMS],
    /// The comment text, for comment records.
    pub comment: String,
}

impl Default for DeltaTRecord {
    fn default() -> DeltaTRecord {
        DeltaTRecord {
            kind: RecordKind::None,
            version: 0,
            time: NaiveDateTime::default(),
            nav_lat: 0.0,
            nav_lon: 0.0,
            nav_speed: 0,
            course: 0,
            pitch: 0,
            roll: 0,
            heading: 0,
            num_beams: 0,
            samples_per_beam: 0,
            sector_size: 0,
            start_angle: 0,
            angle_increment: 0,
            acoustic_range: 0,
            acoustic_frequency: 0,
            sound_velocity: 0,
            range_resolution: 0,
            pulse_length: 0,
            profile_tilt_angle: 0,
            rep_rate: 0,
            ping_number: 0,
            sonar_x_offset: 0.0,
            sonar_y_offset: 0.0,
            sonar_z_offset: 0.0,
            has_intensity: false,
            ping_latency: 0,
            data_latency: 0,
            sample_rate: 0,
            option_flags: 0,
            number_averaged: 0,
            center_time_offset: 0,
            heave_external: 0.0,
            user_defined_byte: 0,
            altitude: 0.0,
            external_sensor_flags: 0,
            pitch_external: 0.0,
            roll_external: 0.0,
            heading_external: 0.0,
            transmit_scan_flag: 0,
            transmit_scan_angle: 0.0,
            range: [0; MAX_BEAMS],
            intensity: [0; MAX_BEAMS],
            sonar_depth: 0.0,
            num_proc_beams: 0,
            beamrange: [0.0; MAX_BEAMS],
            angles: [0.0; MAX_BEAMS],
            angles_forward: [0.0; MAX_BEAMS],
            bath: [0.0; MAX_BEAMS],
            acrosstrack: [0.0; MAX_BEAMS],
            alongtrack: [0.0; MAX_BEAMS],
            amp: [0.0; MAX_BEAMS],
            beamflag: [BeamFlag::CLEAN; MAX_BEAMS],
            comment: String::new(),
        }
    }
}

impl DeltaTRecord {
    /// Recomputes the processed soundings from the raw ranges, the
    /// external attitude, and the beam fan geometry.
    ///
    /// The computation is a pure function of the raw fields, so applying
    /// it again leaves the record unchanged.
    pub fn recompute_soundings(&mut self) {
        let geometry = PingGeometry {
            roll: f64::from(self.roll_external),
            pitch: f64::from(self.pitch_external),
            heading: f64::from(self.heading_external),
            profile_tilt_angle: i32::from(self.profile_tilt_angle),
            start_angle: i32::from(self.start_angle),
            angle_increment: i32::from(self.angle_increment),
            sound_velocity: i32::from(self.sound_velocity),
            range_resolution: i32::from(self.range_resolution),
            sonar_depth: f64::from(self.sonar_depth),
            heave: f64::from(self.heave_external),
        };
        self.num_proc_beams = self.num_beams;
        for i in 0..self.num_proc_beams {
            let sounding = recompute_sounding(&geometry, i, u32::from(self.range[i]));
            self.beamrange[i] = sounding.beamrange;
            self.angles[i] = sounding.angle;
            self.angles_forward[i] = sounding.angle_forward;
            self.bath[i] = sounding.bath as f32;
            self.acrosstrack[i] = sounding.acrosstrack as f32;
            self.alongtrack[i] = sounding.alongtrack as f32;
            self.beamflag[i] = sounding.flag;
            self.amp[i] = if self.range[i] > 0 {
                f32::from(self.intensity[i])
            } else {
                0.0
            };
        }
    }
}

fn ascii_u32(bytes: &[u8]) -> u32 {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .and_then(|text| text.parse().ok())
        .unwrap_or(0)
}

fn ascii_f64(bytes: &[u8]) -> f64 {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .and_then(|text| text.parse().ok())
        .unwrap_or(0.0)
}

/// Reads one of the flag-carrying shorts: the high bit is a presence
/// flag, the low 15 bits are big-endian payload.
fn flag_short(bytes: &[u8]) -> u16 {
    (u16::from(bytes[0] & 0x7f) << 8) | u16::from(bytes[1])
}

fn put_flag_short(bytes: &mut [u8], value: u16) {
    bytes[0] = ((value >> 8) & 0x7f) as u8;
    bytes[1] = value as u8;
    if value != 0 {
        bytes[0] |= 0x80;
    }
}

fn parse_month(bytes: &[u8]) -> u32 {
    let upper = [
        bytes[0].to_ascii_uppercase(),
        bytes[1].to_ascii_uppercase(),
        bytes[2].to_ascii_uppercase(),
    ];
    MONTHS
        .iter()
        .position(|month| **month == upper)
        .map(|index| index as u32 + 1)
        .unwrap_or(1)
}

fn parse_latitude(bytes: &[u8]) -> f64 {
    let degrees = ascii_f64(&bytes[1..3]);
    let minutes = ascii_f64(&bytes[4..6]);
    let dec_minutes = ascii_f64(&bytes[7..12]);
    let latitude = degrees + ((dec_minutes / 100000.0 + minutes) / 60.0);
    if bytes[13] == b'S' || bytes[13] == b's' {
        -latitude
    } else {
        latitude
    }
}

fn parse_longitude(bytes: &[u8]) -> f64 {
    let degrees = ascii_f64(&bytes[0..3]);
    let minutes = ascii_f64(&bytes[4..6]);
    let dec_minutes = ascii_f64(&bytes[7..12]);
    let longitude = degrees + ((dec_minutes / 100000.0 + minutes) / 60.0);
    if bytes[13] == b'W' || bytes[13] == b'w' {
        -longitude
    } else {
        longitude
    }
}

fn format_latitude(latitude: f64) -> Vec<u8> {
    let hemisphere = if latitude > 0.0 { 'N' } else { 'S' };
    let degrees = latitude.abs() as u32;
    let minutes = (latitude.abs() - f64::from(degrees)) * 60.0;
    format!("_{:02}.{:8.5}_{}", degrees, minutes, hemisphere).into_bytes()
}

fn format_longitude(longitude: f64) -> Vec<u8> {
    let hemisphere = if longitude > 0.0 { 'E' } else { 'W' };
    let degrees = longitude.abs() as u32;
    let minutes = (longitude.abs() - f64::from(degrees)) * 60.0;
    format!("{:03}.{:8.5}_{}", degrees, minutes, hemisphere).into_bytes()
}

/// Parses a comment record: `#` in the reserved bytes, text at offset 8.
pub(crate) fn parse_comment(buffer: &[u8], record: &mut DeltaTRecord) {
    record.kind = RecordKind::Comment;
    record.version = buffer[3];
    let text = &buffer[8..buffer.len().min(8 + COMMENT_LENGTH)];
    let end = text.iter().position(|&byte| byte == 0).unwrap_or(text.len());
    record.comment = String::from_utf8_lossy(&text[..end]).into_owned();
}

/// Parses the header fields shared by every data layout: bytes 8 through
/// 96 of the record header.
fn parse_common_header(buffer: &[u8], record: &mut DeltaTRecord) -> Result<()> {
    let be = Endian::Big;
    let year = ascii_u32(&buffer[15..19]);
    let month = parse_month(&buffer[11..14]);
    let day = ascii_u32(&buffer[8..10]);
    let hour = ascii_u32(&buffer[20..22]);
    let minute = ascii_u32(&buffer[23..25]);
    let second = ascii_u32(&buffer[26..28]);
    let hundredths = ascii_u32(&buffer[30..32]);
    record.time = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_milli_opt(hour, minute, second, hundredths * 10))
        .unwrap_or_default();
    record.nav_lat = parse_latitude(&buffer[33..47]);
    record.nav_lon = parse_longitude(&buffer[47..61]);
    record.nav_speed = buffer[61];
    record.course = be.get_u16(&buffer[62..64]);
    record.pitch = flag_short(&buffer[64..66]);
    record.roll = flag_short(&buffer[66..68]);
    record.heading = flag_short(&buffer[68..70]);
    let num_beams = be.get_u16(&buffer[70..72]) as usize;
    if num_beams > MAX_BEAMS {
        return Err(Error::Unintelligible(format!(
            "too many beams: {}",
            num_beams
        )));
    }
    record.num_beams = num_beams;
    record.samples_per_beam = be.get_u16(&buffer[72..74]);
    record.sector_size = be.get_u16(&buffer[74..76]);
    record.start_angle = be.get_u16(&buffer[76..78]);
    record.angle_increment = buffer[78];
    record.acoustic_range = be.get_u16(&buffer[79..81]);
    record.acoustic_frequency = be.get_u16(&buffer[81..83]);
    record.sound_velocity = if buffer[83] >> 7 != 0 {
        flag_short(&buffer[83..85])
    } else {
        15000
    };
    record.range_resolution = be.get_u16(&buffer[85..87]);
    record.pulse_length = be.get_u16(&buffer[87..89]);
    record.profile_tilt_angle = be.get_u16(&buffer[89..91]);
    record.rep_rate = be.get_u16(&buffer[91..93]);
    record.ping_number = be.get_u32(&buffer[93..97]);
    Ok(())
}

/// The zero-value fixups and the internal-to-external attitude fallback
/// every vendor-layout read finishes with.
fn apply_attitude_fallback(record: &mut DeltaTRecord) {
    if record.pitch == 0 {
        record.pitch = 900;
    }
    if record.roll == 0 {
        record.roll = 900;
    }
    if record.profile_tilt_angle == 0 {
        record.profile_tilt_angle = 180;
    }
    if record.external_sensor_flags & 0x01 == 0 {
        record.heading_external = (f64::from(record.heading) / 10.0) as f32;
        record.external_sensor_flags |= 0x01;
    }
    if record.external_sensor_flags & 0x02 == 0 {
        record.roll_external = (0.1 * (f64::from(record.roll) - 900.0)) as f32;
        record.external_sensor_flags |= 0x02;
    }
    if record.external_sensor_flags & 0x04 == 0 {
        record.pitch_external = (0.1 * (f64::from(record.pitch) - 900.0)) as f32;
        record.external_sensor_flags |= 0x04;
    }
    if record.external_sensor_flags & 0x08 == 0 {
        record.heave_external = 0.0;
        record.external_sensor_flags |= 0x08;
    }
}

/// Parses a vendor `83P` data record, v1.00 or v1.10.
///
/// The v1.10 external-sensor floats have no defined byte order in the
/// wild; they are read big-endian first, and if any flagged value falls
/// outside its physical range the whole group is reread with the bytes
/// swapped. A single file may mix interpretations across pings.
pub(crate) fn parse_vendor(buffer: &[u8], record: &mut DeltaTRecord) -> Result<()> {
    if buffer.len() < HEADER_LENGTH {
        return Err(Error::Eof);
    }
    record.kind = RecordKind::Data;
    record.version = buffer[3];
    parse_common_header(buffer, record)?;
    let be = Endian::Big;
    if record.version >= 10 {
        record.sonar_x_offset = be.get_f32(&buffer[100..104]);
        record.sonar_y_offset = be.get_f32(&buffer[104..108]);
        record.sonar_z_offset = be.get_f32(&buffer[108..112]);
        let milliseconds = ascii_u32(&buffer[113..116]);
        record.time = record
            .time
            .date()
            .and_hms_milli_opt(
                record.time.hour(),
                record.time.minute(),
                record.time.second(),
                milliseconds,
            )
            .unwrap_or(record.time);
        record.has_intensity = buffer[117] != 0;
        record.ping_latency = be.get_u16(&buffer[118..120]);
        record.data_latency = be.get_u16(&buffer[120..122]);
        record.sample_rate = buffer[122];
        record.option_flags = buffer[123];
        record.number_averaged = buffer[125];
        record.center_time_offset = be.get_u16(&buffer[126..128]);
        let mut external = Endian::Big;
        record.heave_external = external.get_f32(&buffer[128..132]);
        record.user_defined_byte = buffer[132];
        record.altitude = external.get_f32(&buffer[133..137]);
        record.external_sensor_flags = buffer[137];
        record.pitch_external = external.get_f32(&buffer[138..142]);
        record.roll_external = external.get_f32(&buffer[142..146]);
        record.heading_external = external.get_f32(&buffer[146..150]);
        record.transmit_scan_flag = buffer[150];
        record.transmit_scan_angle = be.get_f32(&buffer[151..155]);

        // the external sensor floats may have been logged little-endian;
        // range checking is the only way to tell
        let flags = record.external_sensor_flags;
        let mut reverse = false;
        if (flags & 0x01 != 0 && record.heading_external < 0.0) || record.heading_external > 360.0
        {
            reverse = true;
        }
        if (flags & 0x02 != 0 && record.roll_external < -90.0) || record.roll_external > 90.0 {
            reverse = true;
        }
        if (flags & 0x04 != 0 && record.pitch_external < 0.0) || record.pitch_external > 360.0 {
            reverse = true;
        }
        if (flags & 0x08 != 0 && record.heave_external < -1000.0)
            || record.heave_external > 1000.0
        {
            reverse = true;
        }
        if reverse {
            external = external.opposite();
            record.altitude = external.get_f32(&buffer[128..132]);
            record.heave_external = external.get_f32(&buffer[133..137]);
            record.pitch_external = external.get_f32(&buffer[138..142]);
            record.roll_external = external.get_f32(&buffer[142..146]);
            record.heading_external = external.get_f32(&buffer[146..150]);
        }
    }
    let beam_bytes = if record.has_intensity { 4 } else { 2 };
    if buffer.len() < HEADER_LENGTH + beam_bytes * record.num_beams {
        return Err(Error::Eof);
    }
    let mut index = HEADER_LENGTH;
    for i in 0..record.num_beams {
        record.range[i] = be.get_u16(&buffer[index..index + 2]);
        index += 2;
    }
    if record.has_intensity {
        for i in 0..record.num_beams {
            record.intensity[i] = be.get_u16(&buffer[index..index + 2]);
            index += 2;
        }
    } else {
        record.intensity[..record.num_beams].fill(0);
    }
    apply_attitude_fallback(record);
    Ok(())
}

/// Parses the obsolete first extended layout: an `83P`-magic header with
/// sonar depth and heave at offset 248 and 15-byte beams.
pub(crate) fn parse_obsolete_extended(buffer: &[u8], record: &mut DeltaTRecord) -> Result<()> {
    if buffer.len() < HEADER_LENGTH {
        return Err(Error::Eof);
    }
    record.kind = RecordKind::Data;
    record.version = buffer[3];
    parse_common_header(buffer, record)?;
    if buffer.len() < HEADER_LENGTH + OBSOLETE_BEAM_SIZE * record.num_beams {
        return Err(Error::Eof);
    }
    let be = Endian::Big;
    record.sonar_depth = be.get_f32(&buffer[248..252]);
    record.heave_external = be.get_f32(&buffer[252..256]);
    // the heave came from the record itself; keep the fallback off it
    record.external_sensor_flags |= 0x08;
    let mut index = HEADER_LENGTH;
    record.num_proc_beams = record.num_beams;
    for i in 0..record.num_proc_beams {
        record.range[i] = be.get_u16(&buffer[index..index + 2]);
        record.bath[i] = be.get_f32(&buffer[index + 2..index + 6]);
        record.acrosstrack[i] = be.get_f32(&buffer[index + 6..index + 10]);
        record.alongtrack[i] = be.get_f32(&buffer[index + 10..index + 14]);
        record.beamflag[i] = BeamFlag(buffer[index + 14]);
        index += OBSOLETE_BEAM_SIZE;
    }
    apply_attitude_fallback(record);
    Ok(())
}

/// Parses an `83M` data record: the full v1.10 header, the sonar depth at
/// offset 248, and the 33-byte processed beams.
pub(crate) fn parse_extended(buffer: &[u8], record: &mut DeltaTRecord) -> Result<()> {
    if buffer.len() < HEADER_LENGTH {
        return Err(Error::Eof);
    }
    record.kind = RecordKind::Data;
    record.version = buffer[3];
    parse_common_header(buffer, record)?;
    if buffer.len() < HEADER_LENGTH + EXTENDED_BEAM_SIZE * record.num_beams {
        return Err(Error::Eof);
    }
    let be = Endian::Big;
    record.sonar_x_offset = be.get_f32(&buffer[100..104]);
    record.sonar_y_offset = be.get_f32(&buffer[104..108]);
    record.sonar_z_offset = be.get_f32(&buffer[108..112]);
    let milliseconds = ascii_u32(&buffer[113..116]);
    record.time = record
        .time
        .date()
        .and_hms_milli_opt(
            record.time.hour(),
            record.time.minute(),
            record.time.second(),
            milliseconds,
        )
        .unwrap_or(record.time);
    record.has_intensity = buffer[117] != 0;
    record.ping_latency = be.get_u16(&buffer[118..120]);
    record.data_latency = be.get_u16(&buffer[120..122]);
    record.sample_rate = buffer[122];
    record.option_flags = buffer[123];
    record.number_averaged = buffer[125];
    record.center_time_offset = be.get_u16(&buffer[126..128]);
    record.heave_external = be.get_f32(&buffer[128..132]);
    record.user_defined_byte = buffer[132];
    record.altitude = be.get_f32(&buffer[133..137]);
    record.external_sensor_flags = buffer[137];
    record.pitch_external = be.get_f32(&buffer[138..142]);
    record.roll_external = be.get_f32(&buffer[142..146]);
    record.heading_external = be.get_f32(&buffer[146..150]);
    record.transmit_scan_flag = buffer[150];
    record.transmit_scan_angle = be.get_f32(&buffer[151..155]);
    record.sonar_depth = be.get_f32(&buffer[248..252]);
    let mut index = HEADER_LENGTH;
    record.num_proc_beams = record.num_beams;
    for i in 0..record.num_proc_beams {
        record.range[i] = be.get_u16(&buffer[index..index + 2]);
        record.intensity[i] = be.get_u16(&buffer[index + 2..index + 4]);
        record.beamrange[i] = f64::from(be.get_f32(&buffer[index + 4..index + 8]));
        record.angles[i] = f64::from(be.get_f32(&buffer[index + 8..index + 12]));
        record.angles_forward[i] = f64::from(be.get_f32(&buffer[index + 12..index + 16]));
        record.bath[i] = be.get_f32(&buffer[index + 16..index + 20]);
        record.acrosstrack[i] = be.get_f32(&buffer[index + 20..index + 24]);
        record.alongtrack[i] = be.get_f32(&buffer[index + 24..index + 28]);
        record.amp[i] = be.get_f32(&buffer[index + 28..index + 32]);
        record.beamflag[i] = BeamFlag(buffer[index + 32]);
        index += EXTENDED_BEAM_SIZE;
    }
    Ok(())
}

/// Fills the common header bytes 0 through 96, minus the magic and size
/// fields.
fn put_common_header(buffer: &mut [u8], record: &DeltaTRecord) {
    let be = Endian::Big;
    let time = record.time;
    buffer[8..11].copy_from_slice(format!("{:02}-", time.day()).as_bytes());
    let month = MONTHS[(time.month() as usize - 1).min(11)];
    buffer[11..14].copy_from_slice(month);
    buffer[14] = b'-';
    buffer[15..19].copy_from_slice(format!("{:04}", time.year()).as_bytes());
    buffer[19] = 0;
    buffer[20..28].copy_from_slice(
        format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        )
        .as_bytes(),
    );
    buffer[28] = 0;
    let hundredths = time.nanosecond() / 10_000_000;
    buffer[29..32].copy_from_slice(format!(".{:02}", hundredths).as_bytes());
    buffer[32] = 0;
    buffer[33..47].copy_from_slice(&format_latitude(record.nav_lat));
    buffer[47..61].copy_from_slice(&format_longitude(record.nav_lon));
    buffer[61] = record.nav_speed;
    be.put_u16(&mut buffer[62..64], record.course);
    put_flag_short(&mut buffer[64..66], record.pitch);
    put_flag_short(&mut buffer[66..68], record.roll);
    put_flag_short(&mut buffer[68..70], record.heading);
    be.put_u16(&mut buffer[70..72], record.num_beams as u16);
    be.put_u16(&mut buffer[72..74], record.samples_per_beam);
    be.put_u16(&mut buffer[74..76], record.sector_size);
    be.put_u16(&mut buffer[76..78], record.start_angle);
    buffer[78] = record.angle_increment;
    be.put_u16(&mut buffer[79..81], record.acoustic_range);
    be.put_u16(&mut buffer[81..83], record.acoustic_frequency);
    put_flag_short(&mut buffer[83..85], record.sound_velocity);
    be.put_u16(&mut buffer[85..87], record.range_resolution);
    be.put_u16(&mut buffer[87..89], record.pulse_length);
    be.put_u16(&mut buffer[89..91], record.profile_tilt_angle);
    be.put_u16(&mut buffer[91..93], record.rep_rate);
    be.put_u32(&mut buffer[93..97], record.ping_number);
}

/// Fills the v1.10 header extras, bytes 100 through 154.
fn put_v10_header(buffer: &mut [u8], record: &DeltaTRecord) {
    let be = Endian::Big;
    be.put_f32(&mut buffer[100..104], record.sonar_x_offset);
    be.put_f32(&mut buffer[104..108], record.sonar_y_offset);
    be.put_f32(&mut buffer[108..112], record.sonar_z_offset);
    let milliseconds = record.time.nanosecond() / 1_000_000;
    buffer[112..116].copy_from_slice(format!(".{:03}", milliseconds).as_bytes());
    buffer[116] = 0;
    buffer[117] = u8::from(record.has_intensity);
    be.put_u16(&mut buffer[118..120], record.ping_latency);
    be.put_u16(&mut buffer[120..122], record.data_latency);
    buffer[122] = record.sample_rate;
    buffer[123] = record.option_flags;
    buffer[125] = record.number_averaged;
    be.put_u16(&mut buffer[126..128], record.center_time_offset);
    be.put_f32(&mut buffer[128..132], record.heave_external);
    buffer[132] = record.user_defined_byte;
    be.put_f32(&mut buffer[133..137], record.altitude);
    buffer[137] = record.external_sensor_flags;
    be.put_f32(&mut buffer[138..142], record.pitch_external);
    be.put_f32(&mut buffer[142..146], record.roll_external);
    be.put_f32(&mut buffer[146..150], record.heading_external);
    buffer[150] = record.transmit_scan_flag;
    be.put_f32(&mut buffer[151..155], record.transmit_scan_angle);
}

/// Encodes a vendor `83P` record in the version the record declares.
pub(crate) fn encode_vendor(record: &DeltaTRecord) -> Vec<u8> {
    let be = Endian::Big;
    let beam_bytes = if record.has_intensity && record.version >= 10 {
        4
    } else {
        2
    };
    let total = HEADER_LENGTH + beam_bytes * record.num_beams;
    let mut buffer = vec![0u8; total];
    buffer[0..3].copy_from_slice(b"83P");
    buffer[3] = record.version;
    be.put_u16(&mut buffer[4..6], total as u16);
    put_common_header(&mut buffer, record);
    if record.version >= 10 {
        put_v10_header(&mut buffer, record);
    }
    let mut index = HEADER_LENGTH;
    for i in 0..record.num_beams {
        be.put_u16(&mut buffer[index..index + 2], record.range[i]);
        index += 2;
    }
    if record.has_intensity && record.version >= 10 {
        for i in 0..record.num_beams {
            be.put_u16(&mut buffer[index..index + 2], record.intensity[i]);
            index += 2;
        }
    }
    buffer
}

/// Encodes an `83M` record, always at version 10.
pub(crate) fn encode_extended(record: &DeltaTRecord) -> Vec<u8> {
    let be = Endian::Big;
    let total = HEADER_LENGTH + EXTENDED_BEAM_SIZE * record.num_beams;
    let mut buffer = vec![0u8; total];
    buffer[0..3].copy_from_slice(b"83M");
    buffer[3] = 10;
    be.put_u16(&mut buffer[4..6], total as u16);
    put_common_header(&mut buffer, record);
    put_v10_header(&mut buffer, record);
    be.put_f32(&mut buffer[248..252], record.sonar_depth);
    let mut index = HEADER_LENGTH;
    for i in 0..record.num_beams {
        be.put_u16(&mut buffer[index..index + 2], record.range[i]);
        be.put_u16(&mut buffer[index + 2..index + 4], record.intensity[i]);
        be.put_f32(&mut buffer[index + 4..index + 8], record.beamrange[i] as f32);
        be.put_f32(&mut buffer[index + 8..index + 12], record.angles[i] as f32);
        be.put_f32(
            &mut buffer[index + 12..index + 16],
            record.angles_forward[i] as f32,
        );
        be.put_f32(&mut buffer[index + 16..index + 20], record.bath[i]);
        be.put_f32(&mut buffer[index + 20..index + 24], record.acrosstrack[i]);
        be.put_f32(&mut buffer[index + 24..index + 28], record.alongtrack[i]);
        be.put_f32(&mut buffer[index + 28..index + 32], record.amp[i]);
        buffer[index + 32] = record.beamflag[i].0;
        index += EXTENDED_BEAM_SIZE;
    }
    buffer
}

/// Encodes a comment record under the given magic.
pub(crate) fn encode_comment(comment: &str, magic: &[u8; 3], version: u8) -> Vec<u8> {
    let mut buffer = vec![0u8; HEADER_LENGTH];
    buffer[0..3].copy_from_slice(magic);
    buffer[3] = version;
    Endian::Big.put_u16(&mut buffer[4..6], HEADER_LENGTH as u16);
    buffer[6] = b'#';
    buffer[7] = b'#';
    let text = comment.as_bytes();
    let len = text.len().min(COMMENT_LENGTH - 1);
    buffer[8..8 + len].copy_from_slice(&text[..len]);
    buffer
}
