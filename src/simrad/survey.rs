//! Decoders and encoders for the survey datagrams: bathymetry (vendor and
//! extended), raw range and angle (three generations), sidescan (vendor
//! and extended), and water column.
//!
//! The extended bathymetry and sidescan layouts are the ones the writer
//! produces; they carry the per-beam flag byte and the processed sidescan
//! image that the vendor layouts drop.

use crate::codec::{BodyReader, BodyWriter};
use crate::ping::{
    Bathymetry, BeamFlag, PingRecord, RawBeam1, RawBeam2, RawBeam3, Sidescan, MAX_BEAMS,
    MAX_RAW_PIXELS, MAX_TX,
};
use crate::store::{SampleRate, WaterColumnBeam, WaterColumnRecord, WaterColumnTx};
use crate::{Endian, Error, RecordKind, Result, SonarId, Store, Timestamp};

fn read_timestamp(body: &mut BodyReader) -> Result<Timestamp> {
    let date = body.u32()?;
    let msec = body.u32()?;
    Ok(Timestamp::new(date, msec))
}

fn put_timestamp(body: &mut BodyWriter, timestamp: Timestamp) {
    body.u32(timestamp.date);
    body.u32(timestamp.msec);
}

/// Reads the ping counter and serial number from a survey payload without
/// decoding it, so the assembler can route the record to the right head.
pub(crate) fn peek_count_serial(payload: &[u8], endian: Endian) -> Option<(u16, u16)> {
    if payload.len() < 12 {
        return None;
    }
    Some((
        endian.get_u16(&payload[8..10]),
        endian.get_u16(&payload[10..12]),
    ))
}

fn check_beam_counts(nbeams: usize, nbeams_max: usize) -> Result<()> {
    if nbeams > nbeams_max || nbeams_max > MAX_BEAMS {
        return Err(Error::Unintelligible(format!(
            "beam counts out of range: {} beams, {} max",
            nbeams, nbeams_max
        )));
    }
    Ok(())
}

fn check_monotonic(beam_num: &[u8], nbeams: usize) -> Result<()> {
    for window in beam_num[..nbeams].windows(2) {
        if window[0] >= window[1] {
            return Err(Error::Unintelligible(format!(
                "beam numbers not increasing: {} then {}",
                window[0], window[1]
            )));
        }
    }
    Ok(())
}

/// Decodes a bathymetry datagram into a ping's bathymetry record.
///
/// The vendor layout stores depths as signed or unsigned according to the
/// sonar model; the extended layout additionally carries the per-beam
/// flag byte, the depth offset multiplier, and wide count fields.
pub(crate) fn read_bath(
    payload: &[u8],
    endian: Endian,
    sonar: Option<SonarId>,
    extended: bool,
    ping: &mut PingRecord,
) -> Result<()> {
    let mut body = BodyReader::new(endian, payload);
    let unsigned_depth = sonar.map(|id| id.has_unsigned_depth()).unwrap_or(false);
    let bath = &mut ping.bath;
    bath.timestamp = read_timestamp(&mut body)?;
    bath.count = body.u16()?;
    bath.serial = body.u16()?;
    bath.heading = body.u16()?;
    bath.ssv = body.u16()?;
    bath.xducer_depth = body.u16()?;
    let nbeams_max;
    let nbeams;
    if extended {
        bath.offset_multiplier = body.i16()?;
        nbeams_max = body.u16()? as usize;
        nbeams = body.u16()? as usize;
        bath.depth_res = body.u16()?;
        bath.distance_res = body.u16()?;
        bath.sample_rate = SampleRate::from_raw(sonar, body.u32()?);
        body.skip(2)?;
    } else {
        bath.offset_multiplier = 0;
        nbeams_max = body.u8()? as usize;
        nbeams = body.u8()? as usize;
        bath.depth_res = u16::from(body.u8()?);
        bath.distance_res = u16::from(body.u8()?);
        bath.sample_rate = SampleRate::from_raw(sonar, u32::from(body.u16()?));
    }
    check_beam_counts(nbeams, nbeams_max)?;
    bath.nbeams_max = nbeams_max;
    bath.nbeams = nbeams;
    for i in 0..nbeams {
        bath.depth[i] = if unsigned_depth {
            i32::from(body.u16()?)
        } else {
            i32::from(body.i16()?)
        };
        bath.acrosstrack[i] = i32::from(body.i16()?);
        bath.alongtrack[i] = i32::from(body.i16()?);
        bath.depression[i] = i32::from(body.i16()?);
        bath.azimuth[i] = i32::from(body.u16()?);
        bath.range[i] = body.u16()?;
        bath.quality[i] = body.u8()?;
        bath.window[i] = body.u8()?;
        bath.amp[i] = body.i8()?;
        bath.beam_num[i] = body.u8()?;
        if extended {
            bath.beamflag[i] = BeamFlag(body.u8()?);
            body.skip(1)?;
        } else {
            bath.beamflag[i] = BeamFlag::CLEAN;
        }
    }
    check_monotonic(&bath.beam_num, nbeams)?;
    ping.seen.bath = true;
    Ok(())
}

/// Encodes a bathymetry record; the inverse of [read_bath].
pub(crate) fn write_bath(
    bath: &Bathymetry,
    endian: Endian,
    sonar: Option<SonarId>,
    extended: bool,
) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    let unsigned_depth = sonar.map(|id| id.has_unsigned_depth()).unwrap_or(false);
    put_timestamp(&mut body, bath.timestamp);
    body.u16(bath.count);
    body.u16(bath.serial);
    body.u16(bath.heading);
    body.u16(bath.ssv);
    body.u16(bath.xducer_depth);
    if extended {
        body.i16(bath.offset_multiplier);
        body.u16(bath.nbeams_max as u16);
        body.u16(bath.nbeams as u16);
        body.u16(bath.depth_res);
        body.u16(bath.distance_res);
        body.u32(bath.sample_rate.to_raw());
        body.zeros(2);
    } else {
        body.u8(bath.nbeams_max as u8);
        body.u8(bath.nbeams as u8);
        body.u8(bath.depth_res as u8);
        body.u8(bath.distance_res as u8);
        body.u16(bath.sample_rate.to_raw() as u16);
    }
    for i in 0..bath.nbeams {
        if unsigned_depth {
            body.u16(bath.depth[i] as u16);
        } else {
            body.i16(bath.depth[i] as i16);
        }
        body.i16(bath.acrosstrack[i] as i16);
        body.i16(bath.alongtrack[i] as i16);
        body.i16(bath.depression[i] as i16);
        body.u16(bath.azimuth[i] as u16);
        body.u16(bath.range[i]);
        body.u8(bath.quality[i]);
        body.u8(bath.window[i]);
        body.i8(bath.amp[i]);
        body.u8(bath.beam_num[i]);
        if extended {
            body.u8(bath.beamflag[i].0);
            body.u8(0);
        }
    }
    body.into_inner()
}

/// Decodes a first-generation raw range and angle datagram.
pub(crate) fn read_raw_beam1(payload: &[u8], endian: Endian, ping: &mut PingRecord) -> Result<()> {
    let mut body = BodyReader::new(endian, payload);
    let raw = &mut ping.raw1;
    raw.timestamp = read_timestamp(&mut body)?;
    raw.count = body.u16()?;
    raw.serial = body.u16()?;
    let nbeams_max = body.u8()? as usize;
    let nbeams = body.u8()? as usize;
    raw.sample_rate = body.u16()?;
    check_beam_counts(nbeams, nbeams_max.max(nbeams))?;
    raw.nbeams_max = nbeams_max;
    raw.nbeams = nbeams;
    for i in 0..nbeams {
        raw.pointangle[i] = body.i16()?;
        raw.tiltangle[i] = body.i16()?;
        raw.range[i] = body.u16()?;
        raw.amp[i] = body.i8()?;
        raw.beam_num[i] = body.u8()?;
    }
    ping.seen.raw1 = true;
    Ok(())
}

/// Encodes a first-generation raw range and angle record.
pub(crate) fn write_raw_beam1(raw: &RawBeam1, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, raw.timestamp);
    body.u16(raw.count);
    body.u16(raw.serial);
    body.u8(raw.nbeams_max as u8);
    body.u8(raw.nbeams as u8);
    body.u16(raw.sample_rate);
    for i in 0..raw.nbeams {
        body.i16(raw.pointangle[i]);
        body.i16(raw.tiltangle[i]);
        body.u16(raw.range[i]);
        body.i8(raw.amp[i]);
        body.u8(raw.beam_num[i]);
    }
    body.into_inner()
}

/// Decodes a second-generation raw range and angle datagram.
pub(crate) fn read_raw_beam2(payload: &[u8], endian: Endian, ping: &mut PingRecord) -> Result<()> {
    let mut body = BodyReader::new(endian, payload);
    let raw = &mut ping.raw2;
    raw.timestamp = read_timestamp(&mut body)?;
    raw.count = body.u16()?;
    raw.serial = body.u16()?;
    raw.heading = body.u16()?;
    raw.ssv = body.u16()?;
    raw.xducer_depth = body.u16()?;
    raw.status = body.u16()?;
    raw.rangenormal = body.u16()?;
    raw.normalbackscatter = body.i16()?;
    raw.obliquebackscatter = body.i16()?;
    raw.fixedgain = body.u16()?;
    raw.txpower = body.i16()?;
    raw.mode = body.u8()?;
    raw.coverage = body.u8()?;
    raw.yawstabheading = body.u16()?;
    let ntx = body.u16()? as usize;
    let nbeams = body.u16()? as usize;
    let nbeams_max = body.u16()? as usize;
    raw.sample_rate = body.u16()?;
    if ntx > MAX_TX {
        return Err(Error::Unintelligible(format!(
            "too many transmit pulses: {}",
            ntx
        )));
    }
    check_beam_counts(nbeams, nbeams_max.max(nbeams))?;
    raw.ntx = ntx;
    raw.nbeams = nbeams;
    raw.nbeams_max = nbeams_max;
    for i in 0..ntx {
        raw.txlastbeam[i] = body.u16()?;
        raw.txtiltangle[i] = body.i16()?;
        raw.txheading[i] = body.u16()?;
        raw.txroll[i] = body.i16()?;
        raw.txpitch[i] = body.i16()?;
        raw.txheave[i] = body.i16()?;
    }
    for i in 0..nbeams {
        raw.rxpointangle[i] = body.i16()?;
        raw.rxtiltangle[i] = body.i16()?;
        raw.rxrange[i] = body.u16()?;
        raw.rxquality[i] = body.u8()?;
        raw.rxwindow[i] = body.u8()?;
        raw.rxamp[i] = body.i8()?;
        raw.rxbeam_num[i] = body.u8()?;
        raw.rxheading[i] = body.u16()?;
        raw.rxroll[i] = body.i16()?;
        raw.rxpitch[i] = body.i16()?;
    }
    ping.seen.raw2 = true;
    Ok(())
}

/// Encodes a second-generation raw range and angle record.
pub(crate) fn write_raw_beam2(raw: &RawBeam2, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, raw.timestamp);
    body.u16(raw.count);
    body.u16(raw.serial);
    body.u16(raw.heading);
    body.u16(raw.ssv);
    body.u16(raw.xducer_depth);
    body.u16(raw.status);
    body.u16(raw.rangenormal);
    body.i16(raw.normalbackscatter);
    body.i16(raw.obliquebackscatter);
    body.u16(raw.fixedgain);
    body.i16(raw.txpower);
    body.u8(raw.mode);
    body.u8(raw.coverage);
    body.u16(raw.yawstabheading);
    body.u16(raw.ntx as u16);
    body.u16(raw.nbeams as u16);
    body.u16(raw.nbeams_max as u16);
    body.u16(raw.sample_rate);
    for i in 0..raw.ntx {
        body.u16(raw.txlastbeam[i]);
        body.i16(raw.txtiltangle[i]);
        body.u16(raw.txheading[i]);
        body.i16(raw.txroll[i]);
        body.i16(raw.txpitch[i]);
        body.i16(raw.txheave[i]);
    }
    for i in 0..raw.nbeams {
        body.i16(raw.rxpointangle[i]);
        body.i16(raw.rxtiltangle[i]);
        body.u16(raw.rxrange[i]);
        body.u8(raw.rxquality[i]);
        body.u8(raw.rxwindow[i]);
        body.i8(raw.rxamp[i]);
        body.u8(raw.rxbeam_num[i]);
        body.u16(raw.rxheading[i]);
        body.i16(raw.rxroll[i]);
        body.i16(raw.rxpitch[i]);
    }
    body.into_inner()
}

/// Decodes a third-generation raw range and angle datagram, including the
/// per-sector transmit slices.
pub(crate) fn read_raw_beam3(payload: &[u8], endian: Endian, ping: &mut PingRecord) -> Result<()> {
    let mut body = BodyReader::new(endian, payload);
    let raw = &mut ping.raw3;
    raw.timestamp = read_timestamp(&mut body)?;
    raw.count = body.u16()?;
    raw.serial = body.u16()?;
    raw.ssv = body.u16()?;
    let ntx = body.u16()? as usize;
    let nbeams = body.u16()? as usize;
    let nbeams_max = body.u16()? as usize;
    raw.sample_rate = body.u32()?;
    raw.xducer_depth = body.i32()?;
    body.skip(4)?;
    if ntx > MAX_TX {
        return Err(Error::Unintelligible(format!(
            "too many transmit sectors: {}",
            ntx
        )));
    }
    check_beam_counts(nbeams, nbeams_max.max(nbeams))?;
    raw.ntx = ntx;
    raw.nbeams = nbeams;
    raw.nbeams_max = nbeams_max;
    for i in 0..ntx {
        raw.txtiltangle[i] = body.i16()?;
        raw.txfocus[i] = body.u16()?;
        raw.txsignallength[i] = body.u32()?;
        raw.txoffset[i] = body.u32()?;
        raw.txcenter[i] = body.u32()?;
        raw.txbandwidth[i] = body.u16()?;
        raw.txwaveform[i] = body.u8()?;
        raw.txsector[i] = body.u8()?;
    }
    for i in 0..nbeams {
        raw.rxpointangle[i] = body.i16()?;
        raw.rxrange[i] = body.u16()?;
        raw.rxsector[i] = body.u8()?;
        raw.rxamp[i] = body.i8()?;
        raw.rxquality[i] = body.u8()?;
        raw.rxwindow[i] = body.u8()?;
        raw.rxbeam_num[i] = body.i16()?;
        raw.rxspare[i] = body.i16()?;
    }
    ping.seen.raw3 = true;
    Ok(())
}

/// Encodes a third-generation raw range and angle record.
pub(crate) fn write_raw_beam3(raw: &RawBeam3, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, raw.timestamp);
    body.u16(raw.count);
    body.u16(raw.serial);
    body.u16(raw.ssv);
    body.u16(raw.ntx as u16);
    body.u16(raw.nbeams as u16);
    body.u16(raw.nbeams_max as u16);
    body.u32(raw.sample_rate);
    body.i32(raw.xducer_depth);
    body.zeros(4);
    for i in 0..raw.ntx {
        body.i16(raw.txtiltangle[i]);
        body.u16(raw.txfocus[i]);
        body.u32(raw.txsignallength[i]);
        body.u32(raw.txoffset[i]);
        body.u32(raw.txcenter[i]);
        body.u16(raw.txbandwidth[i]);
        body.u8(raw.txwaveform[i]);
        body.u8(raw.txsector[i]);
    }
    for i in 0..raw.nbeams {
        body.i16(raw.rxpointangle[i]);
        body.u16(raw.rxrange[i]);
        body.u8(raw.rxsector[i]);
        body.i8(raw.rxamp[i]);
        body.u8(raw.rxquality[i]);
        body.u8(raw.rxwindow[i]);
        body.i16(raw.rxbeam_num[i]);
        body.i16(raw.rxspare[i]);
    }
    body.into_inner()
}

/// Decodes a sidescan datagram.
///
/// A raw sample total beyond [MAX_RAW_PIXELS] is unintelligible; the
/// record's bytes have already been consumed from the stream by the time
/// this runs, so the next frame is still found.
pub(crate) fn read_sidescan(
    payload: &[u8],
    endian: Endian,
    extended: bool,
    ping: &mut PingRecord,
) -> Result<()> {
    let mut body = BodyReader::new(endian, payload);
    let ss = &mut ping.sidescan;
    ss.timestamp = read_timestamp(&mut body)?;
    ss.count = body.u16()?;
    ss.serial = body.u16()?;
    ss.max_range = body.u16()?;
    ss.r_zero = body.u16()?;
    ss.r_zero_corr = body.u16()?;
    ss.tvg_start = body.u16()?;
    ss.tvg_stop = body.u16()?;
    ss.bsn = body.i8()?;
    ss.bso = body.i8()?;
    ss.tx = body.u16()?;
    ss.tvg_crossover = body.u8()?;
    let nbeams_ss = body.u8()? as usize;
    let mut pixels_ss = 0;
    if extended {
        ss.pixel_size = body.u16()?;
        pixels_ss = body.u16()? as usize;
    } else {
        ss.pixel_size = 0;
    }
    if nbeams_ss > MAX_BEAMS {
        return Err(Error::Unintelligible(format!(
            "too many sidescan beams: {}",
            nbeams_ss
        )));
    }
    ss.nbeams_ss = nbeams_ss;
    let mut npixels = 0usize;
    for i in 0..nbeams_ss {
        ss.beam_index[i] = body.u8()?;
        ss.sort_direction[i] = body.i8()?;
        ss.beam_samples[i] = body.u16()?;
        ss.center_sample[i] = body.u16()?;
        ss.start_sample[i] = npixels.min(u16::MAX as usize) as u16;
        npixels += ss.beam_samples[i] as usize;
    }
    if npixels > MAX_RAW_PIXELS {
        return Err(Error::Unintelligible(format!(
            "too many raw sidescan samples: {}",
            npixels
        )));
    }
    ss.npixels = npixels;
    for i in 0..npixels {
        ss.ssraw[i] = body.i8()?;
    }
    if extended {
        ss.pixels_ss = pixels_ss.min(ss.ss.len());
        for i in 0..ss.pixels_ss {
            ss.ss[i] = body.i16()?;
            ss.ss_alongtrack[i] = body.i16()?;
        }
    } else {
        ss.pixels_ss = 0;
    }
    ping.seen.sidescan = true;
    Ok(())
}

/// Encodes a sidescan record; the inverse of [read_sidescan].
pub(crate) fn write_sidescan(ss: &Sidescan, endian: Endian, extended: bool) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, ss.timestamp);
    body.u16(ss.count);
    body.u16(ss.serial);
    body.u16(ss.max_range);
    body.u16(ss.r_zero);
    body.u16(ss.r_zero_corr);
    body.u16(ss.tvg_start);
    body.u16(ss.tvg_stop);
    body.i8(ss.bsn);
    body.i8(ss.bso);
    body.u16(ss.tx);
    body.u8(ss.tvg_crossover);
    body.u8(ss.nbeams_ss as u8);
    if extended {
        body.u16(ss.pixel_size);
        body.u16(ss.pixels_ss as u16);
    }
    for i in 0..ss.nbeams_ss {
        body.u8(ss.beam_index[i]);
        body.i8(ss.sort_direction[i]);
        body.u16(ss.beam_samples[i]);
        body.u16(ss.center_sample[i]);
    }
    for i in 0..ss.npixels {
        body.i8(ss.ssraw[i]);
    }
    if extended {
        for i in 0..ss.pixels_ss {
            body.i16(ss.ss[i]);
            body.i16(ss.ss_alongtrack[i]);
        }
    }
    body.into_inner()
}

/// Decodes a water column datagram.
pub(crate) fn read_water_column(
    payload: &[u8],
    endian: Endian,
    store: &mut Store,
) -> Result<RecordKind> {
    let mut body = BodyReader::new(endian, payload);
    let record = store.water_column.get_or_insert_with(Default::default);
    record.timestamp = read_timestamp(&mut body)?;
    record.count = body.u16()?;
    record.serial = body.u16()?;
    record.ndatagrams = body.u16()?;
    record.datagram_num = body.u16()?;
    let ntx = body.u16()? as usize;
    let nbeams = body.u16()? as usize;
    record.total_nbeams = body.u16()?;
    record.sample_rate = body.u32()?;
    record.ssv = body.u16()?;
    record.heave = body.i16()?;
    body.skip(2)?;
    if ntx > MAX_TX {
        return Err(Error::Unintelligible(format!(
            "too many transmit sectors: {}",
            ntx
        )));
    }
    if nbeams > MAX_BEAMS {
        return Err(Error::Unintelligible(format!(
            "too many water column beams: {}",
            nbeams
        )));
    }
    record.tx.clear();
    for _ in 0..ntx {
        let tx = WaterColumnTx {
            tiltangle: body.i16()?,
            center_frequency: body.u16()?,
            sector: body.u8()?,
        };
        body.skip(1)?;
        record.tx.push(tx);
    }
    record.beams.clear();
    for _ in 0..nbeams {
        let pointangle = body.i16()?;
        let start_range = body.u16()?;
        let nsamples = body.u16()? as usize;
        let detected_range = body.u16()?;
        let tx_sector = body.u8()?;
        let beam_num = body.u8()?;
        let samples = body.bytes(nsamples)?.iter().map(|&b| b as i8).collect();
        record.beams.push(WaterColumnBeam {
            pointangle,
            start_range,
            detected_range,
            tx_sector,
            beam_num,
            samples,
        });
    }
    store.timestamp = record.timestamp;
    Ok(RecordKind::WaterColumn)
}

/// Encodes a water column record; the inverse of [read_water_column].
pub(crate) fn write_water_column(record: &WaterColumnRecord, endian: Endian) -> Vec<u8> {
    let mut body = BodyWriter::new(endian);
    put_timestamp(&mut body, record.timestamp);
    body.u16(record.count);
    body.u16(record.serial);
    body.u16(record.ndatagrams);
    body.u16(record.datagram_num);
    body.u16(record.tx.len() as u16);
    body.u16(record.beams.len() as u16);
    body.u16(record.total_nbeams);
    body.u32(record.sample_rate);
    body.u16(record.ssv);
    body.i16(record.heave);
    body.zeros(2);
    for tx in &record.tx {
        body.i16(tx.tiltangle);
        body.u16(tx.center_frequency);
        body.u8(tx.sector);
        body.u8(0);
    }
    for beam in &record.beams {
        body.i16(beam.pointangle);
        body.u16(beam.start_range);
        body.u16(beam.samples.len() as u16);
        body.u16(beam.detected_range);
        body.u8(beam.tx_sector);
        body.u8(beam.beam_num);
        for &sample in &beam.samples {
            body.i8(sample);
        }
    }
    body.into_inner()
}
