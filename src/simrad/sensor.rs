//! Decoders and encoders for the sensor-side datagrams: attitude, heading,
//! sound speed, tilt, clock, tide, height, position, sound velocity
//! profiles, runtime parameters, installation parameters, and comments.
//!
//! Decoders are pure functions from a payload slice into the store; the
//! payload excludes the label and the trailing end byte and checksum.
//! Encoders are their strict inverses and return the payload bytes; the
//! writer adds framing and the checksum.

use crate::codec::{BodyReader, BodyWriter};
use crate::store::{
    AttitudeRecord, AttitudeSample, ClockRecord, HeadingRecord, HeightRecord,
    InstallationRecord, PositionRecord, RunParameterRecord, SsvRecord, SvpEntry, SvpRecord,
    TideRecord, TiltRecord, COMMENT_LENGTH, MAX_ATTITUDE, MAX_HEADING, MAX_SSV, MAX_SVP, MAX_TILT,
};
use crate::{Endian, RecordKind, Result, Store, Timestamp};

fn read_timestamp(body: &mut BodyReader) -> Result<Timestamp> {
    let date = body.u32()?;
    let msec = body.u32()?;
    Ok(Timestamp::new(date, msec))
}

fn put_timestamp(body: &mut BodyWriter, timestamp: Timestamp) {
    body.u32(timestamp.date);
    body.u32(timestamp.msec);
}

/// Decodes an attitude datagram.
///
/// The declared sample count is clamped to [MAX_ATTITUDE]; the overflow
/// slices have already been consumed with the rest of the record, so a
/// clamped record is indistinguishable from a full one downstream.
pub(crate) fn read_attitude(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = store.attitude.get_or_insert_with(Default::default);
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    let ndata = body.u16()? as usize;
    record.samples.clear();
    for _ in 0..ndata {
        let sample = AttitudeSample {
            time: body.u16()?,
            status: body.u16()?,
            roll: body.i16()?,
            pitch: body.i16()?,
            heave: body.i16()?,
            heading: body.u16()?,
        };
        if record.samples.len() < MAX_ATTITUDE {
            record.samples.push(sample);
        }
    }
    record.heading_status = body.u8()?;
    store.timestamp = record.timestamp;
    Ok(RecordKind::Attitude)
}

pub(crate) fn write_attitude(record: &AttitudeRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.u16(record.samples.len() as u16);
    for sample in &record.samples {
        body.u16(sample.time);
        body.u16(sample.status);
        body.i16(sample.roll);
        body.i16(sample.pitch);
        body.i16(sample.heave);
        body.u16(sample.heading);
    }
    body.u8(record.heading_status);
    body.into_inner()
}

/// Decodes a heading datagram.
pub(crate) fn read_heading(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = store.heading.get_or_insert_with(Default::default);
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    let ndata = body.u16()? as usize;
    record.samples.clear();
    for _ in 0..ndata {
        let sample = (body.u16()?, body.u16()?);
        if record.samples.len() < MAX_HEADING {
            record.samples.push(sample);
        }
    }
    record.heading_status = body.u8()?;
    store.timestamp = record.timestamp;
    Ok(RecordKind::Heading)
}

pub(crate) fn write_heading(record: &HeadingRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.u16(record.samples.len() as u16);
    for &(time, heading) in &record.samples {
        body.u16(time);
        body.u16(heading);
    }
    body.u8(record.heading_status);
    body.into_inner()
}

/// Decodes a sound-speed-at-transducer datagram.
pub(crate) fn read_ssv(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = store.ssv.get_or_insert_with(Default::default);
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    let ndata = body.u16()? as usize;
    record.samples.clear();
    for _ in 0..ndata {
        let sample = (body.u16()?, body.u16()?);
        if record.samples.len() < MAX_SSV {
            record.samples.push(sample);
        }
    }
    store.timestamp = record.timestamp;
    Ok(RecordKind::Ssv)
}

pub(crate) fn write_ssv(record: &SsvRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.u16(record.samples.len() as u16);
    for &(time, ssv) in &record.samples {
        body.u16(time);
        body.u16(ssv);
    }
    body.u8(0);
    body.into_inner()
}

/// Decodes a transmit tilt datagram.
pub(crate) fn read_tilt(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = store.tilt.get_or_insert_with(Default::default);
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    let ndata = body.u16()? as usize;
    record.samples.clear();
    for _ in 0..ndata {
        let sample = (body.u16()?, body.i16()?);
        if record.samples.len() < MAX_TILT {
            record.samples.push(sample);
        }
    }
    store.timestamp = record.timestamp;
    Ok(RecordKind::Tilt)
}

pub(crate) fn write_tilt(record: &TiltRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.u16(record.samples.len() as u16);
    for &(time, tilt) in &record.samples {
        body.u16(time);
        body.i16(tilt);
    }
    body.u8(0);
    body.into_inner()
}

/// Decodes a clock datagram.
pub(crate) fn read_clock(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    store.clock = ClockRecord {
        timestamp: read_timestamp(&mut body)?,
        count: body.u16()?,
        serial: body.u16()?,
        origin: read_timestamp(&mut body)?,
        pps_use: body.u8()?,
    };
    store.timestamp = store.clock.timestamp;
    Ok(RecordKind::Clock)
}

pub(crate) fn write_clock(record: &ClockRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    put_timestamp(&mut body, record.origin);
    body.u8(record.pps_use);
    body.into_inner()
}

/// Decodes a tide datagram.
pub(crate) fn read_tide(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    store.tide = TideRecord {
        timestamp: read_timestamp(&mut body)?,
        count: body.u16()?,
        serial: body.u16()?,
        origin: read_timestamp(&mut body)?,
        tide: body.i16()?,
    };
    store.timestamp = store.tide.timestamp;
    Ok(RecordKind::Tide)
}

pub(crate) fn write_tide(record: &TideRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    put_timestamp(&mut body, record.origin);
    body.i16(record.tide);
    body.u8(0);
    body.into_inner()
}

/// Decodes a height datagram.
pub(crate) fn read_height(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    store.height = HeightRecord {
        timestamp: read_timestamp(&mut body)?,
        count: body.u16()?,
        serial: body.u16()?,
        height: body.i32()?,
        height_type: body.u8()?,
    };
    store.timestamp = store.height.timestamp;
    Ok(RecordKind::Height)
}

pub(crate) fn write_height(record: &HeightRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.i32(record.height);
    body.u8(record.height_type);
    body.into_inner()
}

/// Decodes a position datagram. The record kind depends on the system
/// byte, so this is the one decoder whose kind comes from the payload.
pub(crate) fn read_position(payload: &[u8], endian: Endian, store: &mut Store) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let timestamp = read_timestamp(&mut body)?;
    let count = body.u16()?;
    let serial = body.u16()?;
    let latitude = body.i32()?;
    let longitude = body.i32()?;
    let quality = body.u16()?;
    let speed = body.u16()?;
    let course = body.u16()?;
    let heading = body.u16()?;
    let system = body.u8()?;
    let input_len = body.u8()? as usize;
    let input = body.bytes(input_len)?.to_vec();
    store.position = PositionRecord {
        timestamp,
        count,
        serial,
        latitude,
        longitude,
        quality,
        speed,
        course,
        heading,
        system,
        input,
    };
    store.timestamp = timestamp;
    Ok(store.position.kind())
}

pub(crate) fn write_position(record: &PositionRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.i32(record.latitude);
    body.i32(record.longitude);
    body.u16(record.quality);
    body.u16(record.speed);
    body.u16(record.course);
    body.u16(record.heading);
    body.u8(record.system);
    let input = &record.input[..record.input.len().min(255)];
    body.u8(input.len() as u8);
    body.bytes(input);
    body.into_inner()
}

/// Decodes a sound velocity profile, either the old layout with 2-byte
/// entries or the current one with 4-byte entries.
pub(crate) fn read_svp(
    payload: &[u8],
    endian: Endian,
    store: &mut Store,
    wide: bool,
) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = &mut store.svp;
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    record.origin = read_timestamp(&mut body)?;
    let num = body.u16()? as usize;
    record.depth_res = body.u16()?;
    record.entries.clear();
    for _ in 0..num {
        let entry = if wide {
            SvpEntry {
                depth: body.u32()?,
                velocity: body.u32()?,
            }
        } else {
            SvpEntry {
                depth: u32::from(body.u16()?),
                velocity: u32::from(body.u16()?),
            }
        };
        if record.entries.len() < MAX_SVP {
            record.entries.push(entry);
        }
    }
    store.timestamp = record.timestamp;
    Ok(RecordKind::VelocityProfile)
}

/// Encodes a sound velocity profile in the current wide layout.
pub(crate) fn write_svp(record: &SvpRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    put_timestamp(&mut body, record.origin);
    body.u16(record.entries.len() as u16);
    body.u16(record.depth_res);
    for entry in &record.entries {
        body.u32(entry.depth);
        body.u32(entry.velocity);
    }
    body.into_inner()
}

/// Decodes a runtime parameter datagram.
pub(crate) fn read_run_parameter(
    payload: &[u8],
    endian: Endian,
    store: &mut Store,
) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = &mut store.run_parameter;
    record.timestamp = read_timestamp(&mut body)?;
    record.ping_count = body.u16()?;
    record.serial = body.u16()?;
    record.status = body.u32()?;
    record.mode = body.u8()?;
    record.filter_id = body.u8()?;
    record.min_depth = body.u16()?;
    record.max_depth = body.u16()?;
    record.absorption = body.u16()?;
    record.tran_pulse = body.u16()?;
    record.tran_beam = body.u16()?;
    record.tran_pow = body.u8()?;
    record.rec_beam = body.u8()?;
    record.rec_band = body.u8()?;
    record.rec_gain = body.u8()?;
    record.tvg_cross = body.u8()?;
    record.ssv_source = body.u8()?;
    record.max_swath = body.u16()?;
    record.beam_space = body.u8()?;
    record.swath_angle = body.u8()?;
    record.stab_mode = body.u8()?;
    let spare = body.bytes(6)?;
    record.spare.copy_from_slice(spare);
    store.timestamp = record.timestamp;
    Ok(RecordKind::RunParameter)
}

pub(crate) fn write_run_parameter(record: &RunParameterRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.ping_count);
    body.u16(record.serial);
    body.u32(record.status);
    body.u8(record.mode);
    body.u8(record.filter_id);
    body.u16(record.min_depth);
    body.u16(record.max_depth);
    body.u16(record.absorption);
    body.u16(record.tran_pulse);
    body.u16(record.tran_beam);
    body.u8(record.tran_pow);
    body.u8(record.rec_beam);
    body.u8(record.rec_band);
    body.u8(record.rec_gain);
    body.u8(record.tvg_cross);
    body.u8(record.ssv_source);
    body.u16(record.max_swath);
    body.u8(record.beam_space);
    body.u8(record.swath_angle);
    body.u8(record.stab_mode);
    body.bytes(&record.spare);
    body.into_inner()
}

/// Decodes an installation datagram: a fixed binary prefix followed by the
/// comma-separated ASCII parameter list.
pub(crate) fn read_installation(
    payload: &[u8],
    endian: Endian,
    store: &mut Store,
    kind: RecordKind,
) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = &mut store.installation;
    record.timestamp = read_timestamp(&mut body)?;
    record.line_num = body.u16()?;
    record.serial_1 = body.u16()?;
    record.serial_2 = body.u16()?;
    let ascii = body.bytes(body.remaining())?;
    let end = ascii.iter().position(|&byte| byte == 0).unwrap_or(ascii.len());
    record.parse_ascii(&String::from_utf8_lossy(&ascii[..end]));
    store.timestamp = record.timestamp;
    Ok(kind)
}

pub(crate) fn write_installation(record: &InstallationRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.line_num);
    body.u16(record.serial_1);
    body.u16(record.serial_2);
    body.bytes(record.to_ascii().as_bytes());
    body.u8(0);
    body.into_inner()
}

/// Decodes a comment, signalled by `#` at the first body byte of a
/// start-framed datagram.
pub(crate) fn read_comment(payload: &[u8], store: &mut Store) -> Result<RecordKind> {
    let text = &payload[1..];
    let end = text.iter().position(|&byte| byte == 0).unwrap_or(text.len());
    let end = end.min(COMMENT_LENGTH);
    store.comment = String::from_utf8_lossy(&text[..end]).into_owned();
    Ok(RecordKind::Comment)
}

pub(crate) fn write_comment(comment: &str, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    body.u8(b'#');
    let text = comment.as_bytes();
    body.bytes(&text[..text.len().min(COMMENT_LENGTH - 1)]);
    body.u8(0);
    body.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> Timestamp {
        Timestamp::new(19950226, 29570234)
    }

    #[test]
    fn attitude_round_trip() {
        let record = AttitudeRecord {
            timestamp: timestamp(),
            count: 7,
            serial: 123,
            samples: vec![
                AttitudeSample {
                    time: 0,
                    status: 0x90,
                    roll: -150,
                    pitch: 75,
                    heave: -12,
                    heading: 18000,
                },
                AttitudeSample {
                    time: 100,
                    status: 0x91,
                    roll: -140,
                    pitch: 80,
                    heave: -10,
                    heading: 18010,
                },
            ],
            heading_status: 1,
        };
        for endian in [Endian::Little, Endian::Big] {
            let payload = write_attitude(&record, endian);
            assert_eq!(14 + 2 * 12 + 1, payload.len());
            let mut store = Store::new();
            assert_eq!(
                RecordKind::Attitude,
                read_attitude(&payload, endian, &mut store).unwrap()
            );
            assert_eq!(record, *store.attitude.unwrap());
        }
    }

    #[test]
    fn attitude_clamps_but_consumes() {
        let mut record = AttitudeRecord {
            timestamp: timestamp(),
            ..Default::default()
        };
        for i in 0..300 {
            record.samples.push(AttitudeSample {
                time: i,
                ..Default::default()
            });
        }
        let payload = write_attitude(&record, Endian::Little);
        let mut store = Store::new();
        read_attitude(&payload, Endian::Little, &mut store).unwrap();
        let decoded = store.attitude.unwrap();
        assert_eq!(MAX_ATTITUDE, decoded.samples.len());
        // the overflow slices were part of the payload, so the trailing
        // heading status byte still decoded from the right offset
        assert_eq!(record.heading_status, decoded.heading_status);
    }

    #[test]
    fn clock_round_trip() {
        let record = ClockRecord {
            timestamp: timestamp(),
            count: 1,
            serial: 9,
            origin: Timestamp::new(19950226, 29570001),
            pps_use: 1,
        };
        let payload = write_clock(&record, Endian::Big);
        assert_eq!(21, payload.len());
        let mut store = Store::new();
        read_clock(&payload, Endian::Big, &mut store).unwrap();
        assert_eq!(record, store.clock);
    }

    #[test]
    fn tide_and_height_round_trip() {
        let tide = TideRecord {
            timestamp: timestamp(),
            count: 2,
            serial: 9,
            origin: timestamp(),
            tide: -55,
        };
        let payload = write_tide(&tide, Endian::Little);
        assert_eq!(23, payload.len());
        let mut store = Store::new();
        read_tide(&payload, Endian::Little, &mut store).unwrap();
        assert_eq!(tide, store.tide);

        let height = HeightRecord {
            timestamp: timestamp(),
            count: 3,
            serial: 9,
            height: -1234,
            height_type: 2,
        };
        let payload = write_height(&height, Endian::Little);
        assert_eq!(17, payload.len());
        read_height(&payload, Endian::Little, &mut store).unwrap();
        assert_eq!(height, store.height);
    }

    #[test]
    fn position_round_trip_and_kind() {
        let record = PositionRecord {
            timestamp: timestamp(),
            count: 77,
            serial: 9,
            latitude: -735600000,
            longitude: -1220500000,
            quality: 150,
            speed: 320,
            course: 18150,
            heading: 18200,
            system: 0x81,
            input: b"$GPGGA,120000,3646.80,S".to_vec(),
        };
        let payload = write_position(&record, Endian::Little);
        assert_eq!(30 + record.input.len(), payload.len());
        let mut store = Store::new();
        assert_eq!(
            RecordKind::Nav,
            read_position(&payload, Endian::Little, &mut store).unwrap()
        );
        assert_eq!(record, store.position);
    }

    #[test]
    fn svp_round_trip() {
        let record = SvpRecord {
            timestamp: timestamp(),
            count: 5,
            serial: 9,
            origin: Timestamp::new(19950225, 1000),
            depth_res: 1,
            entries: vec![
                SvpEntry {
                    depth: 0,
                    velocity: 15002,
                },
                SvpEntry {
                    depth: 1000,
                    velocity: 14980,
                },
            ],
        };
        let payload = write_svp(&record, Endian::Big);
        let mut store = Store::new();
        assert_eq!(
            RecordKind::VelocityProfile,
            read_svp(&payload, Endian::Big, &mut store, true).unwrap()
        );
        assert_eq!(record, store.svp);
    }

    #[test]
    fn narrow_svp_decodes() {
        let mut body = BodyWriter::new(Endian::Little);
        put_timestamp(&mut body, timestamp());
        body.u16(1);
        body.u16(9);
        put_timestamp(&mut body, timestamp());
        body.u16(1);
        body.u16(1);
        body.u16(500);
        body.u16(14999);
        let mut store = Store::new();
        read_svp(&body.into_inner(), Endian::Little, &mut store, false).unwrap();
        assert_eq!(
            SvpEntry {
                depth: 500,
                velocity: 14999
            },
            store.svp.entries[0]
        );
    }

    #[test]
    fn run_parameter_round_trip() {
        let record = RunParameterRecord {
            timestamp: timestamp(),
            ping_count: 42,
            serial: 9,
            status: 0xCAFE,
            mode: 1,
            filter_id: 0b1101,
            min_depth: 5,
            max_depth: 800,
            absorption: 3200,
            tran_pulse: 150,
            tran_beam: 15,
            tran_pow: 0,
            rec_beam: 15,
            rec_band: 4,
            rec_gain: 30,
            tvg_cross: 6,
            ssv_source: 2,
            max_swath: 300,
            beam_space: 1,
            swath_angle: 130,
            stab_mode: 0x80,
            spare: [0; 6],
        };
        let payload = write_run_parameter(&record, Endian::Little);
        assert_eq!(45, payload.len());
        let mut store = Store::new();
        read_run_parameter(&payload, Endian::Little, &mut store).unwrap();
        assert_eq!(record, store.run_parameter);
    }

    #[test]
    fn installation_round_trip() {
        let record = InstallationRecord {
            timestamp: timestamp(),
            line_num: 12,
            serial_1: 345,
            serial_2: 346,
            wlz: 0.5,
            s1h: 180.0,
            s2h: 0.0,
            psv: "1.2.3".to_string(),
            psv_version: 10203,
            com: "two heads, one ping".to_string(),
            ..Default::default()
        };
        let payload = write_installation(&record, Endian::Little);
        let mut store = Store::new();
        assert_eq!(
            RecordKind::Start,
            read_installation(&payload, Endian::Little, &mut store, RecordKind::Start).unwrap()
        );
        assert_eq!(record, store.installation);
    }

    #[test]
    fn comment_round_trip() {
        let payload = write_comment("survey starts here", Endian::Little);
        assert_eq!(b'#', payload[0]);
        let mut store = Store::new();
        assert_eq!(
            RecordKind::Comment,
            read_comment(&payload, &mut store).unwrap()
        );
        assert_eq!("survey starts here", store.comment);
    }
}
