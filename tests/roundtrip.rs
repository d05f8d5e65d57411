//! Encode-then-decode laws for every record kind, in both byte orders.

use std::io::Cursor;
use swath::simrad::{Reader, Writer};
use swath::store::{
    AttitudeRecord, AttitudeSample, ClockRecord, HeadingRecord, HeightRecord, PositionRecord,
    RunParameterRecord, SsvRecord, SvpEntry, SvpRecord, TideRecord, TiltRecord, WaterColumnBeam,
    WaterColumnRecord, WaterColumnTx,
};
use swath::{BeamFlag, Endian, Error, RecordKind, SampleRate, Store, Timestamp};

fn timestamp() -> Timestamp {
    Timestamp::new(20080505, 29570234)
}

fn new_store() -> Store {
    let mut store = Store::new();
    store.sonar = 3000;
    store
}

fn reader_for(store: &Store, endian: Endian) -> Reader<Cursor<Vec<u8>>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()), endian);
    writer.write(store).unwrap();
    let mut reader = Reader::new(Cursor::new(writer.into_inner().into_inner()));
    let kind = reader.read().unwrap().unwrap();
    assert_eq!(store.kind, kind);
    assert_eq!(Some(endian), reader.byte_order());
    reader
}

#[test]
fn clock() {
    let mut store = new_store();
    store.kind = RecordKind::Clock;
    store.clock = ClockRecord {
        timestamp: timestamp(),
        count: 3,
        serial: 345,
        origin: Timestamp::new(20080505, 29570001),
        pps_use: 1,
    };
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.clock, reader.store().clock);
    }
}

#[test]
fn tide() {
    let mut store = new_store();
    store.kind = RecordKind::Tide;
    store.tide = TideRecord {
        timestamp: timestamp(),
        count: 4,
        serial: 345,
        origin: Timestamp::new(20080505, 29000000),
        tide: -34,
    };
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.tide, reader.store().tide);
    }
}

#[test]
fn height() {
    let mut store = new_store();
    store.kind = RecordKind::Height;
    store.height = HeightRecord {
        timestamp: timestamp(),
        count: 5,
        serial: 345,
        height: -210,
        height_type: 1,
    };
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.height, reader.store().height);
    }
}

#[test]
fn heading() {
    let mut store = new_store();
    store.kind = RecordKind::Heading;
    store.heading = Some(Box::new(HeadingRecord {
        timestamp: timestamp(),
        count: 6,
        serial: 345,
        samples: vec![(0, 18000), (100, 18020), (200, 18040)],
        heading_status: 1,
    }));
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.heading, reader.store().heading);
    }
}

#[test]
fn attitude() {
    let mut store = new_store();
    store.kind = RecordKind::Attitude;
    store.attitude = Some(Box::new(AttitudeRecord {
        timestamp: timestamp(),
        count: 7,
        serial: 345,
        samples: vec![
            AttitudeSample {
                time: 0,
                status: 0x90,
                roll: -120,
                pitch: 45,
                heave: -8,
                heading: 18000,
            },
            AttitudeSample {
                time: 100,
                status: 0x90,
                roll: -110,
                pitch: 50,
                heave: -6,
                heading: 18005,
            },
        ],
        heading_status: 1,
    }));
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.attitude, reader.store().attitude);
    }
}

#[test]
fn ssv_and_tilt() {
    let mut store = new_store();
    store.kind = RecordKind::Ssv;
    store.ssv = Some(Box::new(SsvRecord {
        timestamp: timestamp(),
        count: 8,
        serial: 345,
        samples: vec![(0, 15002), (250, 15004)],
    }));
    let reader = reader_for(&store, Endian::Little);
    assert_eq!(store.ssv, reader.store().ssv);

    store.kind = RecordKind::Tilt;
    store.tilt = Some(Box::new(TiltRecord {
        timestamp: timestamp(),
        count: 9,
        serial: 345,
        samples: vec![(0, -150), (250, -140)],
    }));
    let reader = reader_for(&store, Endian::Big);
    assert_eq!(store.tilt, reader.store().tilt);
}

#[test]
fn position() {
    let mut store = new_store();
    store.position = PositionRecord {
        timestamp: timestamp(),
        count: 10,
        serial: 345,
        latitude: -735600000,
        longitude: -1220500000,
        quality: 120,
        speed: 310,
        course: 18150,
        heading: 18170,
        system: 0x82,
        input: b"$GPGGA,081251,3646.80,S,12203.00,W".to_vec(),
    };
    store.kind = store.position.kind();
    assert_eq!(RecordKind::Nav, store.kind);
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.position, reader.store().position);
    }
}

#[test]
fn velocity_profile() {
    let mut store = new_store();
    store.kind = RecordKind::VelocityProfile;
    store.svp = SvpRecord {
        timestamp: timestamp(),
        count: 11,
        serial: 345,
        origin: Timestamp::new(20080504, 82800000),
        depth_res: 1,
        entries: (0..100)
            .map(|i| SvpEntry {
                depth: i * 100,
                velocity: 15020 - i,
            })
            .collect(),
    };
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.svp, reader.store().svp);
    }
}

#[test]
fn run_parameter() {
    let mut store = new_store();
    store.kind = RecordKind::RunParameter;
    store.run_parameter = RunParameterRecord {
        timestamp: timestamp(),
        ping_count: 42,
        serial: 345,
        status: 1,
        mode: 1,
        filter_id: 0b101,
        min_depth: 3,
        max_depth: 500,
        absorption: 3100,
        tran_pulse: 150,
        tran_beam: 15,
        tran_pow: 0,
        rec_beam: 15,
        rec_band: 4,
        rec_gain: 28,
        tvg_cross: 6,
        ssv_source: 0,
        max_swath: 250,
        beam_space: 1,
        swath_angle: 130,
        stab_mode: 0x82,
        spare: [0; 6],
    };
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.run_parameter, reader.store().run_parameter);
    }
}

#[test]
fn installation() {
    let mut store = new_store();
    store.kind = RecordKind::Start;
    store.installation.timestamp = timestamp();
    store.installation.line_num = 12;
    store.installation.serial_1 = 345;
    store.installation.wlz = 1.25;
    store.installation.s1z = 0.45;
    store.installation.s1h = 180.0;
    store.installation.psv = "2.1.5".to_string();
    store.installation.psv_version = 20105;
    store.installation.p1g = "WGS84".to_string();
    store.installation.com = "line start, heading north".to_string();
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.installation, reader.store().installation);
    }
}

#[test]
fn comment() {
    let mut store = new_store();
    store.kind = RecordKind::Comment;
    store.comment = "swath width reduced due to weather".to_string();
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.comment, reader.store().comment);
    }
}

#[test]
fn water_column() {
    let mut store = new_store();
    store.kind = RecordKind::WaterColumn;
    store.water_column = Some(Box::new(WaterColumnRecord {
        timestamp: timestamp(),
        count: 42,
        serial: 345,
        ndatagrams: 1,
        datagram_num: 1,
        total_nbeams: 2,
        sample_rate: 1400000,
        ssv: 15000,
        heave: -10,
        tx: vec![WaterColumnTx {
            tiltangle: -50,
            center_frequency: 30000,
            sector: 0,
        }],
        beams: vec![
            WaterColumnBeam {
                pointangle: -6000,
                start_range: 2,
                detected_range: 444,
                tx_sector: 0,
                beam_num: 1,
                samples: vec![-3, -6, -9, -12],
            },
            WaterColumnBeam {
                pointangle: 6000,
                start_range: 2,
                detected_range: 450,
                tx_sector: 0,
                beam_num: 2,
                samples: vec![-2, -4, -8],
            },
        ],
    }));
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.water_column, reader.store().water_column);
    }
}

fn survey_store(nbeams: usize) -> Store {
    let mut store = new_store();
    store.kind = RecordKind::Data;
    let ping = store.ping_mut(0);
    ping.seen.bath = true;
    ping.seen.raw3 = true;
    ping.seen.sidescan = true;
    ping.bath.timestamp = timestamp();
    ping.bath.count = 42;
    ping.bath.serial = 345;
    ping.bath.heading = 18000;
    ping.bath.ssv = 15000;
    ping.bath.xducer_depth = 230;
    ping.bath.nbeams_max = nbeams;
    ping.bath.nbeams = nbeams;
    ping.bath.depth_res = 1;
    ping.bath.distance_res = 1;
    ping.bath.sample_rate = SampleRate::Hertz(14000);
    for i in 0..nbeams {
        ping.bath.depth[i] = 1000 + i as i32;
        ping.bath.acrosstrack[i] = i as i32 * 100 - 500;
        ping.bath.alongtrack[i] = 5;
        ping.bath.depression[i] = 4500 + i as i32;
        ping.bath.azimuth[i] = 9000;
        ping.bath.range[i] = 200 + i as u16;
        ping.bath.quality[i] = 25;
        ping.bath.window[i] = 4;
        ping.bath.amp[i] = -30;
        ping.bath.beam_num[i] = i as u8 + 1;
        ping.bath.beamflag[i] = if i % 7 == 3 {
            BeamFlag::FLAGGED
        } else {
            BeamFlag::CLEAN
        };
    }
    ping.raw3.timestamp = timestamp();
    ping.raw3.count = 42;
    ping.raw3.serial = 345;
    ping.raw3.ssv = 15000;
    ping.raw3.ntx = 2;
    ping.raw3.nbeams = nbeams;
    ping.raw3.nbeams_max = nbeams;
    ping.raw3.sample_rate = 1400000;
    ping.raw3.xducer_depth = 230;
    for i in 0..2 {
        ping.raw3.txtiltangle[i] = -100 * i as i16;
        ping.raw3.txsignallength[i] = 150;
        ping.raw3.txcenter[i] = 300000;
        ping.raw3.txbandwidth[i] = 600;
        ping.raw3.txsector[i] = i as u8;
    }
    for i in 0..nbeams {
        ping.raw3.rxpointangle[i] = (i as i16 - nbeams as i16 / 2) * 50;
        ping.raw3.rxrange[i] = 800 + i as u16;
        ping.raw3.rxsector[i] = (i % 2) as u8;
        ping.raw3.rxamp[i] = -28;
        ping.raw3.rxquality[i] = 20;
        ping.raw3.rxwindow[i] = 4;
        ping.raw3.rxbeam_num[i] = i as i16 + 1;
    }
    ping.sidescan.timestamp = timestamp();
    ping.sidescan.count = 42;
    ping.sidescan.serial = 345;
    ping.sidescan.max_range = 3100;
    ping.sidescan.r_zero = 150;
    ping.sidescan.bsn = -20;
    ping.sidescan.bso = -32;
    ping.sidescan.tx = 15;
    ping.sidescan.tvg_crossover = 6;
    ping.sidescan.nbeams_ss = nbeams;
    let mut npixels = 0;
    for i in 0..nbeams {
        ping.sidescan.beam_index[i] = i as u8 + 1;
        ping.sidescan.sort_direction[i] = if i * 2 < nbeams { -1 } else { 1 };
        ping.sidescan.beam_samples[i] = 10;
        ping.sidescan.center_sample[i] = 5;
        ping.sidescan.start_sample[i] = npixels as u16;
        npixels += 10;
    }
    ping.sidescan.npixels = npixels;
    for i in 0..npixels {
        ping.sidescan.ssraw[i] = (i % 120) as i8;
    }
    ping.sidescan.pixel_size = 25;
    ping.sidescan.pixels_ss = 64;
    for i in 0..64 {
        ping.sidescan.ss[i] = i as i16;
        ping.sidescan.ss_alongtrack[i] = -(i as i16);
    }
    store
}

#[test]
fn survey_ping() {
    let store = survey_store(16);
    for endian in [Endian::Little, Endian::Big] {
        let reader = reader_for(&store, endian);
        assert_eq!(store.ping(0), reader.store().ping(0));
    }
}

#[test]
fn survey_ping_with_max_beams() {
    let store = survey_store(254);
    let reader = reader_for(&store, Endian::Little);
    assert_eq!(254, reader.store().ping(0).unwrap().bath.nbeams);
    assert_eq!(store.ping(0), reader.store().ping(0));
}

#[test]
fn empty_ping_reads_successfully() {
    let mut store = new_store();
    store.kind = RecordKind::Data;
    let ping = store.ping_mut(0);
    ping.seen.bath = true;
    ping.seen.sidescan = true;
    ping.bath.timestamp = timestamp();
    ping.sidescan.timestamp = timestamp();
    let reader = reader_for(&store, Endian::Little);
    let ping = reader.store().ping(0).unwrap();
    assert_eq!(0, ping.bath.nbeams);
    assert_eq!(0, ping.sidescan.npixels);
}

#[test]
fn pixel_overflow_is_unintelligible_but_consumed() {
    let mut store = survey_store(2);
    {
        let ping = store.ping_mut(0);
        ping.sidescan.beam_samples[0] = 30000;
        ping.sidescan.beam_samples[1] = 30000;
        ping.sidescan.npixels = 0;
        ping.sidescan.pixels_ss = 0;
    }
    let mut writer = Writer::new(Cursor::new(Vec::new()), Endian::Little);
    writer.write(&store).unwrap();
    // append a good record so we can prove the stream stays aligned
    let mut clock_store = new_store();
    clock_store.kind = RecordKind::Clock;
    clock_store.clock.count = 99;
    let mut writer = Writer::new(writer.into_inner(), Endian::Little);
    writer.write(&clock_store).unwrap();

    let mut reader = Reader::new(Cursor::new(writer.into_inner().into_inner()));
    assert!(matches!(reader.read(), Err(Error::Unintelligible(_))));
    assert_eq!(Some(RecordKind::Clock), reader.read().unwrap());
    assert_eq!(99, reader.store().clock.count);
}

#[test]
fn checksums_verify_on_every_frame() {
    let store = survey_store(8);
    let mut writer = Writer::new(Cursor::new(Vec::new()), Endian::Little);
    writer.write(&store).unwrap();
    let bytes = writer.into_inner().into_inner();
    let mut offset = 0;
    let mut frames = 0;
    while offset < bytes.len() {
        let size = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        let frame = &bytes[offset..offset + 4 + size];
        assert_eq!(0x02, frame[4]);
        assert_eq!(0x03, frame[frame.len() - 3]);
        let sum: u16 = frame[5..frame.len() - 2]
            .iter()
            .fold(0u16, |acc, &byte| acc.wrapping_add(u16::from(byte)));
        let stored = u16::from_le_bytes(frame[frame.len() - 2..].try_into().unwrap());
        assert_eq!(sum, stored, "checksum mismatch in frame {}", frames);
        offset += 4 + size;
        frames += 1;
    }
    assert_eq!(3, frames);
}

#[test]
fn endianness_round_trip_matches() {
    let store = survey_store(16);
    let little = reader_for(&store, Endian::Little);
    let big = reader_for(&store, Endian::Big);
    assert_eq!(little.store().ping(0), big.store().ping(0));
}
