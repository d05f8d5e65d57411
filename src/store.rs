//! The in-memory record store.
//!
//! A [Store] owns the typed representation of every supported record kind:
//! one slot per non-ping record where the most recent decode wins, up to
//! two ping buffers (one per sonar head), and lazily allocated buffers for
//! the sample-series records. All sub-buffers are owned exclusively by the
//! store and freed when it drops; record payloads are never shared.

use crate::attitude::AttitudeCache;
use crate::ping::PingRecord;
use crate::{SonarId, Timestamp};

/// The most entries a sound velocity profile may carry.
pub const MAX_SVP: usize = 1024;
/// The most samples an attitude datagram may carry.
pub const MAX_ATTITUDE: usize = 256;
/// The most samples a heading datagram may carry.
pub const MAX_HEADING: usize = 256;
/// The most samples a sound-speed datagram may carry.
pub const MAX_SSV: usize = 256;
/// The most samples a tilt datagram may carry.
pub const MAX_TILT: usize = 256;
/// The longest comment either codec can carry.
pub const COMMENT_LENGTH: usize = 256;
/// The sentinel stored in latitude and longitude fields when no fix is
/// available.
pub const INVALID_COORDINATE: i32 = 0x7FFFFFFF;
/// The sentinel stored in speed, course, and heading fields when the
/// value is invalid.
pub const INVALID_SHORT: u16 = 0xFFFF;

/// The kind of the record most recently read into a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordKind {
    /// Nothing has been read yet, or the last read failed.
    #[default]
    None,
    /// A survey ping.
    Data,
    /// Navigation from the active position system.
    Nav,
    /// Navigation from position system 1.
    Nav1,
    /// Navigation from position system 2.
    Nav2,
    /// Navigation from position system 3.
    Nav3,
    /// A comment record.
    Comment,
    /// A sound velocity profile.
    VelocityProfile,
    /// A clock record.
    Clock,
    /// A tide record.
    Tide,
    /// A height record.
    Height,
    /// A heading sample series.
    Heading,
    /// An attitude sample series.
    Attitude,
    /// A sound-speed-at-transducer sample series.
    Ssv,
    /// A transmit tilt sample series.
    Tilt,
    /// Installation parameters at line start.
    Start,
    /// Installation parameters at line stop.
    Stop,
    /// Installation parameters from a running system.
    Status,
    /// Runtime parameters.
    RunParameter,
    /// A water column record.
    WaterColumn,
}

/// The on-disk sample-rate field of a bathymetry record, whose meaning
/// depends on the sonar model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleRate {
    /// Sampling rate in Hz.
    Hertz(u32),
    /// EM3000D streams reuse the field for the depth difference between
    /// the two sonar heads, in 0.01 m.
    HeadSeparation(i32),
}

impl Default for SampleRate {
    fn default() -> SampleRate {
        SampleRate::Hertz(0)
    }
}

impl SampleRate {
    /// Interprets the raw field value for the given sonar.
    pub fn from_raw(sonar: Option<SonarId>, raw: u32) -> SampleRate {
        if sonar.map(|id| id.is_em3000d()).unwrap_or(false) {
            SampleRate::HeadSeparation(raw as i32)
        } else {
            SampleRate::Hertz(raw)
        }
    }

    /// The raw field value to write back to disk.
    pub fn to_raw(self) -> u32 {
        match self {
            SampleRate::Hertz(n) => n,
            SampleRate::HeadSeparation(n) => n as u32,
        }
    }
}

/// Installation parameters, parsed from the comma-separated ASCII payload
/// of a start, stop, or status datagram. Mutated only at record parse
/// time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstallationRecord {
    /// Time of the installation record.
    pub timestamp: Timestamp,
    /// Survey line number.
    pub line_num: u16,
    /// System 1 serial number.
    pub serial_1: u16,
    /// System 2 serial number.
    pub serial_2: u16,
    /// Water line vertical location in meters (WLZ).
    pub wlz: f64,
    /// System main head serial number (SMH).
    pub smh: u16,
    /// Transducer 1 vertical location in meters (S1Z).
    pub s1z: f64,
    /// Transducer 1 along location in meters (S1X).
    pub s1x: f64,
    /// Transducer 1 athwart location in meters (S1Y).
    pub s1y: f64,
    /// Transducer 1 heading in degrees (S1H).
    pub s1h: f64,
    /// Transducer 1 roll offset in degrees (S1R).
    pub s1r: f64,
    /// Transducer 1 pitch offset in degrees (S1P).
    pub s1p: f64,
    /// Transducer 1 number of modules (S1N).
    pub s1n: u16,
    /// Transducer 2 vertical location in meters (S2Z).
    pub s2z: f64,
    /// Transducer 2 along location in meters (S2X).
    pub s2x: f64,
    /// Transducer 2 athwart location in meters (S2Y).
    pub s2y: f64,
    /// Transducer 2 heading in degrees (S2H).
    pub s2h: f64,
    /// Transducer 2 roll offset in degrees (S2R).
    pub s2r: f64,
    /// Transducer 2 pitch offset in degrees (S2P).
    pub s2p: f64,
    /// Transducer 2 number of modules (S2N).
    pub s2n: u16,
    /// Sonar head 1 gain offset (GO1).
    pub go1: f64,
    /// Sonar head 2 gain offset (GO2).
    pub go2: f64,
    /// Transmitter software version (TSV).
    pub tsv: String,
    /// Receiver software version (RSV).
    pub rsv: String,
    /// Beamformer software version (BSV).
    pub bsv: String,
    /// Processing unit software version (PSV).
    pub psv: String,
    /// Operator station software version (OSV).
    pub osv: String,
    /// Processing unit version condensed to `patch + 100*minor +
    /// 10000*major`, used by later decoders to vary parsing.
    pub psv_version: u32,
    /// Depth sensor time delay in msec (DSD).
    pub dsd: f64,
    /// Depth sensor offset (DSO).
    pub dso: f64,
    /// Depth sensor scale factor (DSF).
    pub dsf: f64,
    /// Depth sensor heave handling, "IN" or "NI" (DSH).
    pub dsh: String,
    /// Active position system number (APS).
    pub aps: u16,
    /// Position system 1 motion compensation (P1M).
    pub p1m: u16,
    /// Position system 1 time stamp source (P1T).
    pub p1t: u16,
    /// Position system 1 vertical location in meters (P1Z).
    pub p1z: f64,
    /// Position system 1 along location in meters (P1X).
    pub p1x: f64,
    /// Position system 1 athwart location in meters (P1Y).
    pub p1y: f64,
    /// Position system 1 time delay in seconds (P1D).
    pub p1d: f64,
    /// Position system 1 geodetic datum (P1G).
    pub p1g: String,
    /// Position system 2 motion compensation (P2M).
    pub p2m: u16,
    /// Position system 2 time stamp source (P2T).
    pub p2t: u16,
    /// Position system 2 vertical location in meters (P2Z).
    pub p2z: f64,
    /// Position system 2 along location in meters (P2X).
    pub p2x: f64,
    /// Position system 2 athwart location in meters (P2Y).
    pub p2y: f64,
    /// Position system 2 time delay in seconds (P2D).
    pub p2d: f64,
    /// Position system 2 geodetic datum (P2G).
    pub p2g: String,
    /// Position system 3 motion compensation (P3M).
    pub p3m: u16,
    /// Position system 3 time stamp source (P3T).
    pub p3t: u16,
    /// Position system 3 vertical location in meters (P3Z).
    pub p3z: f64,
    /// Position system 3 along location in meters (P3X).
    pub p3x: f64,
    /// Position system 3 athwart location in meters (P3Y).
    pub p3y: f64,
    /// Position system 3 time delay in seconds (P3D).
    pub p3d: f64,
    /// Position system 3 geodetic datum (P3G).
    pub p3g: String,
    /// Motion sensor vertical location in meters (MSZ).
    pub msz: f64,
    /// Motion sensor along location in meters (MSX).
    pub msx: f64,
    /// Motion sensor athwart location in meters (MSY).
    pub msy: f64,
    /// Motion sensor roll reference plane, "HO" or "RP" (MRP).
    pub mrp: String,
    /// Motion sensor time delay in seconds (MSD).
    pub msd: f64,
    /// Motion sensor roll offset in degrees (MSR).
    pub msr: f64,
    /// Motion sensor pitch offset in degrees (MSP).
    pub msp: f64,
    /// Motion sensor heading offset in degrees (MSG).
    pub msg: f64,
    /// Gyro compass heading offset in degrees (GCG).
    pub gcg: f64,
    /// Cartographic projection (CPR).
    pub cpr: String,
    /// Responsible operator (ROP).
    pub rop: String,
    /// Survey identifier (SID).
    pub sid: String,
    /// Planned survey line identifier (PLL).
    pub pll: String,
    /// Free-form comment; commas travel as `^` on disk (COM).
    pub com: String,
}

impl InstallationRecord {
    /// Parses the ASCII `KEY=value,` sequence into the typed fields.
    ///
    /// Unknown keys are skipped. The `COM=` value has its `^` characters
    /// restored to commas, and `PSV=` additionally condenses into
    /// [InstallationRecord::psv_version].
    pub fn parse_ascii(&mut self, ascii: &str) {
        for tuple in ascii.split(',') {
            let Some((key, value)) = tuple.split_once('=') else {
                continue;
            };
            self.apply(key, value);
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        fn float(value: &str) -> f64 {
            value.trim().parse().unwrap_or(0.0)
        }
        fn int(value: &str) -> u16 {
            value.trim().parse().unwrap_or(0)
        }
        match key {
            "WLZ" => self.wlz = float(value),
            "SMH" => self.smh = int(value),
            "S1Z" => self.s1z = float(value),
            "S1X" => self.s1x = float(value),
            "S1Y" => self.s1y = float(value),
            "S1H" => self.s1h = float(value),
            "S1R" => self.s1r = float(value),
            "S1P" => self.s1p = float(value),
            "S1N" => self.s1n = int(value),
            "S2Z" => self.s2z = float(value),
            "S2X" => self.s2x = float(value),
            "S2Y" => self.s2y = float(value),
            "S2H" => self.s2h = float(value),
            "S2R" => self.s2r = float(value),
            "S2P" => self.s2p = float(value),
            "S2N" => self.s2n = int(value),
            "GO1" => self.go1 = float(value),
            "GO2" => self.go2 = float(value),
            "TSV" => self.tsv = value.to_string(),
            "RSV" => self.rsv = value.to_string(),
            "BSV" => self.bsv = value.to_string(),
            "PSV" => {
                self.psv = value.to_string();
                self.psv_version = condense_version(value);
            }
            "OSV" => self.osv = value.to_string(),
            "DSD" => self.dsd = float(value),
            "DSO" => self.dso = float(value),
            "DSF" => self.dsf = float(value),
            "DSH" => self.dsh = value.to_string(),
            "APS" => self.aps = int(value),
            "P1M" => self.p1m = int(value),
            "P1T" => self.p1t = int(value),
            "P1Z" => self.p1z = float(value),
            "P1X" => self.p1x = float(value),
            "P1Y" => self.p1y = float(value),
            "P1D" => self.p1d = float(value),
            "P1G" => self.p1g = value.to_string(),
            "P2M" => self.p2m = int(value),
            "P2T" => self.p2t = int(value),
            "P2Z" => self.p2z = float(value),
            "P2X" => self.p2x = float(value),
            "P2Y" => self.p2y = float(value),
            "P2D" => self.p2d = float(value),
            "P2G" => self.p2g = value.to_string(),
            "P3M" => self.p3m = int(value),
            "P3T" => self.p3t = int(value),
            "P3Z" => self.p3z = float(value),
            "P3X" => self.p3x = float(value),
            "P3Y" => self.p3y = float(value),
            "P3D" => self.p3d = float(value),
            "P3G" => self.p3g = value.to_string(),
            "MSZ" => self.msz = float(value),
            "MSX" => self.msx = float(value),
            "MSY" => self.msy = float(value),
            "MRP" => self.mrp = value.to_string(),
            "MSD" => self.msd = float(value),
            "MSR" => self.msr = float(value),
            "MSP" => self.msp = float(value),
            "MSG" => self.msg = float(value),
            "GCG" => self.gcg = float(value),
            "CPR" => self.cpr = value.to_string(),
            "ROP" => self.rop = value.to_string(),
            "SID" => self.sid = value.to_string(),
            "PLL" => self.pll = value.to_string(),
            "COM" => self.com = value.replace('^', ","),
            _ => {}
        }
    }

    /// Renders the typed fields back into the ASCII `KEY=value,` sequence.
    ///
    /// Keys are written in the canonical order; commas in the comment are
    /// substituted with `^`.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        let mut push = |key: &str, value: String| {
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push(',');
        };
        push("WLZ", self.wlz.to_string());
        push("SMH", self.smh.to_string());
        push("S1Z", self.s1z.to_string());
        push("S1X", self.s1x.to_string());
        push("S1Y", self.s1y.to_string());
        push("S1H", self.s1h.to_string());
        push("S1R", self.s1r.to_string());
        push("S1P", self.s1p.to_string());
        push("S1N", self.s1n.to_string());
        push("S2Z", self.s2z.to_string());
        push("S2X", self.s2x.to_string());
        push("S2Y", self.s2y.to_string());
        push("S2H", self.s2h.to_string());
        push("S2R", self.s2r.to_string());
        push("S2P", self.s2p.to_string());
        push("S2N", self.s2n.to_string());
        push("GO1", self.go1.to_string());
        push("GO2", self.go2.to_string());
        push("TSV", self.tsv.clone());
        push("RSV", self.rsv.clone());
        push("BSV", self.bsv.clone());
        push("PSV", self.psv.clone());
        push("OSV", self.osv.clone());
        push("DSD", self.dsd.to_string());
        push("DSO", self.dso.to_string());
        push("DSF", self.dsf.to_string());
        push("DSH", self.dsh.clone());
        push("APS", self.aps.to_string());
        push("P1M", self.p1m.to_string());
        push("P1T", self.p1t.to_string());
        push("P1Z", self.p1z.to_string());
        push("P1X", self.p1x.to_string());
        push("P1Y", self.p1y.to_string());
        push("P1D", self.p1d.to_string());
        push("P1G", self.p1g.clone());
        push("P2M", self.p2m.to_string());
        push("P2T", self.p2t.to_string());
        push("P2Z", self.p2z.to_string());
        push("P2X", self.p2x.to_string());
        push("P2Y", self.p2y.to_string());
        push("P2D", self.p2d.to_string());
        push("P2G", self.p2g.clone());
        push("P3M", self.p3m.to_string());
        push("P3T", self.p3t.to_string());
        push("P3Z", self.p3z.to_string());
        push("P3X", self.p3x.to_string());
        push("P3Y", self.p3y.to_string());
        push("P3D", self.p3d.to_string());
        push("P3G", self.p3g.clone());
        push("MSZ", self.msz.to_string());
        push("MSX", self.msx.to_string());
        push("MSY", self.msy.to_string());
        push("MRP", self.mrp.clone());
        push("MSD", self.msd.to_string());
        push("MSR", self.msr.to_string());
        push("MSP", self.msp.to_string());
        push("MSG", self.msg.to_string());
        push("GCG", self.gcg.to_string());
        push("CPR", self.cpr.clone());
        push("ROP", self.rop.clone());
        push("SID", self.sid.clone());
        push("PLL", self.pll.clone());
        push("COM", self.com.replace(',', "^"));
        out
    }
}

/// Condenses a `major.minor.patch` version string into
/// `patch + 100*minor + 10000*major`.
fn condense_version(version: &str) -> u32 {
    let mut parts = version.trim().split('.');
    let mut next = || -> u32 {
        parts
            .next()
            .and_then(|part| part.trim().parse().ok())
            .unwrap_or(0)
    };
    let major = next();
    let minor = next();
    let patch = next();
    patch + 100 * minor + 10000 * major
}

/// Runtime parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunParameterRecord {
    /// Time of the runtime record.
    pub timestamp: Timestamp,
    /// Ping counter at the time of the record.
    pub ping_count: u16,
    /// System serial number.
    pub serial: u16,
    /// System status.
    pub status: u32,
    /// System mode.
    pub mode: u8,
    /// Filter identifier bitfield.
    pub filter_id: u8,
    /// Minimum depth in meters.
    pub min_depth: u16,
    /// Maximum depth in meters.
    pub max_depth: u16,
    /// Absorption coefficient in 0.01 dB/km.
    pub absorption: u16,
    /// Transmit pulse length in microseconds.
    pub tran_pulse: u16,
    /// Transmit beamwidth in 0.1 degrees.
    pub tran_beam: u16,
    /// Transmit power reduction in dB.
    pub tran_pow: u8,
    /// Receiver beamwidth in 0.1 degrees.
    pub rec_beam: u8,
    /// Receiver bandwidth in 50 Hz units.
    pub rec_band: u8,
    /// Receiver fixed gain in dB.
    pub rec_gain: u8,
    /// TVG law crossover angle in degrees.
    pub tvg_cross: u8,
    /// Source of the sound speed at the transducer.
    pub ssv_source: u8,
    /// Maximum swath width in meters.
    pub max_swath: u16,
    /// Beam spacing mode.
    pub beam_space: u8,
    /// Coverage sector in degrees.
    pub swath_angle: u8,
    /// Yaw and pitch stabilization mode.
    pub stab_mode: u8,
    /// Spare bytes preserved for round trips.
    pub spare: [u8; 6],
}

/// A clock record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClockRecord {
    /// System time of the record.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// External clock time.
    pub origin: Timestamp,
    /// Nonzero when the internal clock is synchronized to a 1 PPS signal.
    pub pps_use: u8,
}

/// A tide record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TideRecord {
    /// Time of the record.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// Time of the tide input.
    pub origin: Timestamp,
    /// Tide offset in 0.01 m.
    pub tide: i16,
}

/// A height record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightRecord {
    /// Time of the record.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// Height in 0.01 m.
    pub height: i32,
    /// Height type from the input datagram.
    pub height_type: u8,
}

/// A position record, including the original input message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionRecord {
    /// Time of the record.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// Latitude in decimal degrees times 20000000, negative south;
    /// 0x7FFFFFFF when invalid.
    pub latitude: i32,
    /// Longitude in decimal degrees times 10000000, negative west;
    /// 0x7FFFFFFF when invalid.
    pub longitude: i32,
    /// Position fix quality in cm.
    pub quality: u16,
    /// Speed over ground in cm/s, 0xFFFF when invalid.
    pub speed: u16,
    /// Course over ground in 0.01 degrees, 0xFFFF when invalid.
    pub course: u16,
    /// Heading in 0.01 degrees, 0xFFFF when invalid.
    pub heading: u16,
    /// Position system number, type, and realtime-use flags.
    pub system: u8,
    /// The input position datagram as received, minus framing.
    pub input: Vec<u8>,
}

impl PositionRecord {
    /// True when the record carries a usable position fix.
    pub fn has_fix(&self) -> bool {
        self.latitude != INVALID_COORDINATE && self.longitude != INVALID_COORDINATE
    }

    /// Which navigation channel this record belongs to: the active-system
    /// flag sits in bit 7 and the channel in the two lowest bits.
    pub fn kind(&self) -> RecordKind {
        if self.system & 0x80 != 0 {
            RecordKind::Nav
        } else {
            match self.system & 0x03 {
                2 => RecordKind::Nav2,
                3 => RecordKind::Nav3,
                _ => RecordKind::Nav1,
            }
        }
    }
}

/// One entry of a sound velocity profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SvpEntry {
    /// Depth in depth resolution units.
    pub depth: u32,
    /// Sound speed in 0.1 m/s.
    pub velocity: u32,
}

/// A sound velocity profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SvpRecord {
    /// Time the profile came into use.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// Time the profile was measured.
    pub origin: Timestamp,
    /// Depth resolution in cm.
    pub depth_res: u16,
    /// The profile entries, at most [MAX_SVP].
    pub entries: Vec<SvpEntry>,
}

/// One sample of an attitude datagram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttitudeSample {
    /// Milliseconds since the record timestamp.
    pub time: u16,
    /// Vendor sensor status.
    pub status: u16,
    /// Roll in 0.01 degrees.
    pub roll: i16,
    /// Pitch in 0.01 degrees.
    pub pitch: i16,
    /// Heave in cm.
    pub heave: i16,
    /// Heading in 0.01 degrees.
    pub heading: u16,
}

/// An attitude sample series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttitudeRecord {
    /// Base time of the series.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// The samples, clamped to [MAX_ATTITUDE].
    pub samples: Vec<AttitudeSample>,
    /// Heading status, zero when the heading sensor is inactive.
    pub heading_status: u8,
}

/// A heading sample series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadingRecord {
    /// Base time of the series.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// `(msec offset, heading in 0.01 degrees)` samples.
    pub samples: Vec<(u16, u16)>,
    /// Heading status, zero when the heading sensor is inactive.
    pub heading_status: u8,
}

/// A sound-speed-at-transducer sample series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SsvRecord {
    /// Base time of the series.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// `(msec offset, sound speed in 0.1 m/s)` samples.
    pub samples: Vec<(u16, u16)>,
}

/// A transmit tilt sample series.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TiltRecord {
    /// Base time of the series.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// `(msec offset, tilt in 0.01 degrees positive forward)` samples.
    pub samples: Vec<(u16, i16)>,
}

/// One transmit slice of a water column record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaterColumnTx {
    /// Tilt angle in 0.01 degrees.
    pub tiltangle: i16,
    /// Center frequency in 10 Hz.
    pub center_frequency: u16,
    /// Transmit sector number.
    pub sector: u8,
}

/// One beam of a water column record with its amplitude samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterColumnBeam {
    /// Beam pointing angle in 0.01 degrees.
    pub pointangle: i16,
    /// Start range in samples.
    pub start_range: u16,
    /// Detected range in samples.
    pub detected_range: u16,
    /// Transmit sector this beam belongs to.
    pub tx_sector: u8,
    /// Beam number.
    pub beam_num: u8,
    /// Amplitude samples in 0.5 dB.
    pub samples: Vec<i8>,
}

/// A water column record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterColumnRecord {
    /// Time of the record.
    pub timestamp: Timestamp,
    /// Sequential counter.
    pub count: u16,
    /// System serial number.
    pub serial: u16,
    /// Total datagrams this ping's water column spans.
    pub ndatagrams: u16,
    /// Index of this datagram within the ping, 1-based.
    pub datagram_num: u16,
    /// Total number of transmit sectors in the ping.
    pub total_nbeams: u16,
    /// Sampling rate in 0.01 Hz.
    pub sample_rate: u32,
    /// Sound speed at the transducer in 0.1 m/s.
    pub ssv: u16,
    /// Heave at ping time in 0.01 m.
    pub heave: i16,
    /// The transmit slices.
    pub tx: Vec<WaterColumnTx>,
    /// The beams carried by this datagram.
    pub beams: Vec<WaterColumnBeam>,
}

/// The root record store (see the module docs).
#[derive(Debug, Default)]
pub struct Store {
    /// The kind of the record most recently decoded.
    pub kind: RecordKind,
    /// Raw sonar id of the stream, zero until the first frame.
    pub sonar: u16,
    /// Timestamp of the most recent record.
    pub timestamp: Timestamp,
    /// The most recent installation parameters.
    pub installation: InstallationRecord,
    /// The most recent runtime parameters.
    pub run_parameter: RunParameterRecord,
    /// The most recent clock record.
    pub clock: ClockRecord,
    /// The most recent tide record.
    pub tide: TideRecord,
    /// The most recent height record.
    pub height: HeightRecord,
    /// The most recent position record.
    pub position: PositionRecord,
    /// The most recent sound velocity profile.
    pub svp: SvpRecord,
    /// The most recent comment.
    pub comment: String,
    /// The most recent attitude series, allocated on first occurrence.
    pub attitude: Option<Box<AttitudeRecord>>,
    /// The most recent heading series, allocated on first occurrence.
    pub heading: Option<Box<HeadingRecord>>,
    /// The most recent sound-speed series, allocated on first occurrence.
    pub ssv: Option<Box<SsvRecord>>,
    /// The most recent tilt series, allocated on first occurrence.
    pub tilt: Option<Box<TiltRecord>>,
    /// The most recent water column record, allocated on first occurrence.
    pub water_column: Option<Box<WaterColumnRecord>>,
    /// The ping buffers, one per sonar head, allocated on first ping.
    pub pings: [Option<Box<PingRecord>>; 2],
    /// Recent attitude samples for ping-time interpolation.
    pub attitude_cache: AttitudeCache,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Store {
        Store::default()
    }

    /// The sonar model of the stream, once known.
    pub fn sonar_id(&self) -> Option<SonarId> {
        SonarId::from_u16(self.sonar)
    }

    /// Returns true once the stream has identified a dual-head sonar.
    pub fn is_dual_head(&self) -> bool {
        self.sonar_id().map(|id| id.is_dual_head()).unwrap_or(false)
    }

    /// The ping buffer for a head, if one has been read.
    pub fn ping(&self, head: usize) -> Option<&PingRecord> {
        self.pings.get(head).and_then(|slot| slot.as_deref())
    }

    /// The ping buffer for a head, allocating its max-sized arrays on
    /// first use.
    pub fn ping_mut(&mut self, head: usize) -> &mut PingRecord {
        let slot = &mut self.pings[head];
        if slot.is_none() {
            let mut ping = Box::<PingRecord>::default();
            ping.head = head;
            *slot = Some(ping);
        }
        slot.as_deref_mut().expect("just allocated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_ascii_round_trip() {
        let mut record = InstallationRecord {
            wlz: 1.25,
            smh: 123,
            s1h: 180.5,
            aps: 1,
            psv: "2.3.4".to_string(),
            psv_version: 20304,
            com: "depth gate, manual".to_string(),
            p1g: "WGS84".to_string(),
            ..Default::default()
        };
        record.timestamp = Timestamp::new(20080505, 1000);
        let ascii = record.to_ascii();
        assert!(ascii.contains("COM=depth gate^ manual,"));
        let mut parsed = InstallationRecord {
            timestamp: record.timestamp,
            ..Default::default()
        };
        parsed.parse_ascii(&ascii);
        assert_eq!(record, parsed);
    }

    #[test]
    fn installation_skips_unknown_keys() {
        let mut record = InstallationRecord::default();
        record.parse_ascii("XXX=9,WLZ=2.5,JUNK,S1N=4,");
        assert_eq!(2.5, record.wlz);
        assert_eq!(4, record.s1n);
    }

    #[test]
    fn psv_condenses() {
        assert_eq!(20304, condense_version("2.3.4"));
        assert_eq!(10000, condense_version("1.0.0"));
        assert_eq!(0, condense_version("garbage"));
    }

    #[test]
    fn position_fix_sentinel() {
        let mut position = PositionRecord::default();
        assert!(position.has_fix());
        position.latitude = INVALID_COORDINATE;
        assert!(!position.has_fix());
        assert_eq!(0xFFFF, INVALID_SHORT);
    }

    #[test]
    fn position_kind_from_system_byte() {
        let mut position = PositionRecord::default();
        position.system = 0x81;
        assert_eq!(RecordKind::Nav, position.kind());
        position.system = 0x01;
        assert_eq!(RecordKind::Nav1, position.kind());
        position.system = 0x02;
        assert_eq!(RecordKind::Nav2, position.kind());
        position.system = 0x03;
        assert_eq!(RecordKind::Nav3, position.kind());
    }

    #[test]
    fn sample_rate_overload() {
        assert_eq!(
            SampleRate::Hertz(14000),
            SampleRate::from_raw(Some(SonarId::Em3000), 14000)
        );
        assert_eq!(
            SampleRate::HeadSeparation(250),
            SampleRate::from_raw(Some(SonarId::Em3000d2), 250)
        );
        assert_eq!(250, SampleRate::HeadSeparation(250).to_raw());
    }

    #[test]
    fn ping_buffers_allocate_lazily() {
        let mut store = Store::new();
        assert!(store.ping(0).is_none());
        store.ping_mut(1).bath.count = 7;
        assert!(store.ping(0).is_none());
        assert_eq!(7, store.ping(1).unwrap().bath.count);
        assert_eq!(1, store.ping(1).unwrap().head);
    }
}
