//! Survey ping records and their per-beam arrays.
//!
//! A ping is assembled from up to three independently framed datagrams
//! (bathymetry, raw beam data, sidescan); dual-head sonars produce one
//! [PingRecord] per head tied together by a shared ping counter. The
//! max-sized beam arrays are allocated eagerly when a ping buffer is first
//! created and reused for the life of the reader.

use crate::{SampleRate, Timestamp};

/// The most beams any supported sonar produces per ping.
pub const MAX_BEAMS: usize = 254;
/// Width of the processed sidescan pixel array.
pub const MAX_PIXELS: usize = 1024;
/// The most raw sidescan samples a single ping may carry.
pub const MAX_RAW_PIXELS: usize = 32000;
/// The most transmit sectors a single ping may carry.
pub const MAX_TX: usize = 19;

/// Per-beam status flag, preserved across read-modify-write only by the
/// extended formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BeamFlag(pub u8);

impl BeamFlag {
    /// A clean, usable sounding.
    pub const CLEAN: BeamFlag = BeamFlag(0x00);
    /// No sounding exists for this beam.
    pub const NULL: BeamFlag = BeamFlag(0x01);
    /// The sounding exists but has been flagged bad.
    pub const FLAGGED: BeamFlag = BeamFlag(0x02);

    /// Returns true if no sounding exists for this beam.
    pub fn is_null(&self) -> bool {
        self.0 & 0x01 != 0
    }

    /// Returns true if the sounding is present and unflagged.
    pub fn is_clean(&self) -> bool {
        self.0 == 0
    }
}

/// Which sub-datagrams have been seen for a ping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubRecords {
    /// A bathymetry datagram has been decoded.
    pub bath: bool,
    /// An old-style raw beam datagram has been decoded.
    pub raw1: bool,
    /// A second-generation raw beam datagram has been decoded.
    pub raw2: bool,
    /// A third-generation raw beam datagram has been decoded.
    pub raw3: bool,
    /// A sidescan datagram has been decoded.
    pub sidescan: bool,
}

/// The bathymetry portion of a ping.
#[derive(Clone, Debug, PartialEq)]
pub struct Bathymetry {
    /// Time of the ping.
    pub timestamp: Timestamp,
    /// Sequential ping counter.
    pub count: u16,
    /// Serial number of the sonar head that produced this ping.
    pub serial: u16,
    /// Heading in 0.01 degrees.
    pub heading: u16,
    /// Sound speed at the transducer in 0.1 m/s.
    pub ssv: u16,
    /// Transmit transducer depth in 0.01 m.
    pub xducer_depth: u16,
    /// Transducer depth offset in units of 655.36 m, nonzero only for deep
    /// submerged installations.
    pub offset_multiplier: i16,
    /// Maximum number of beams possible.
    pub nbeams_max: usize,
    /// Number of valid beams in this ping.
    pub nbeams: usize,
    /// Depth resolution in 0.01 m.
    pub depth_res: u16,
    /// Acrosstrack and alongtrack resolution in 0.01 m.
    pub distance_res: u16,
    /// Sampling rate, or the inter-head depth difference on EM3000D.
    pub sample_rate: SampleRate,
    /// Heave interpolated at the ping time, 0.01 m.
    pub heave: i16,
    /// Roll interpolated at the ping time, 0.01 degrees.
    pub roll: i16,
    /// Pitch interpolated at the ping time, 0.01 degrees.
    pub pitch: i16,
    /// True when the attitude values came from outside the cached span.
    pub attitude_extrapolated: bool,
    /// Beam depths in depth resolution units.
    pub depth: [i32; MAX_BEAMS],
    /// Acrosstrack distances in distance resolution units.
    pub acrosstrack: [i32; MAX_BEAMS],
    /// Alongtrack distances in distance resolution units.
    pub alongtrack: [i32; MAX_BEAMS],
    /// Beam depression angles in 0.01 degrees.
    pub depression: [i32; MAX_BEAMS],
    /// Beam azimuth angles in 0.01 degrees.
    pub azimuth: [i32; MAX_BEAMS],
    /// One-way ranges in sample units.
    pub range: [u16; MAX_BEAMS],
    /// Per-beam quality, 0 through 254.
    pub quality: [u8; MAX_BEAMS],
    /// Detection window length in samples / 4.
    pub window: [u8; MAX_BEAMS],
    /// Beam amplitude in 0.5 dB.
    pub amp: [i8; MAX_BEAMS],
    /// Beam numbers; bit 7 marks the second head on dual-head systems.
    pub beam_num: [u8; MAX_BEAMS],
    /// Per-beam flags, carried on disk by the extended format only.
    pub beamflag: [BeamFlag; MAX_BEAMS],
}

impl Default for Bathymetry {
    fn default() -> Bathymetry {
        Bathymetry {
            timestamp: Timestamp::default(),
            count: 0,
            serial: 0,
            heading: 0,
            ssv: 0,
            xducer_depth: 0,
            offset_multiplier: 0,
            nbeams_max: 0,
            nbeams: 0,
            depth_res: 0,
            distance_res: 0,
            sample_rate: SampleRate::default(),
            heave: 0,
            roll: 0,
            pitch: 0,
            attitude_extrapolated: false,
            depth: [0; MAX_BEAMS],
            acrosstrack: [0; MAX_BEAMS],
            alongtrack: [0; MAX_BEAMS],
            depression: [0; MAX_BEAMS],
            azimuth: [0; MAX_BEAMS],
            range: [0; MAX_BEAMS],
            quality: [0; MAX_BEAMS],
            window: [0; MAX_BEAMS],
            amp: [0; MAX_BEAMS],
            beam_num: [0; MAX_BEAMS],
            beamflag: [BeamFlag::CLEAN; MAX_BEAMS],
        }
    }
}

/// The first-generation raw range and angle datagram.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBeam1 {
    /// Time of the raw beam record.
    pub timestamp: Timestamp,
    /// Sequential ping counter.
    pub count: u16,
    /// Sonar head serial number.
    pub serial: u16,
    /// Maximum number of beams possible.
    pub nbeams_max: usize,
    /// Number of raw travel times and angles.
    pub nbeams: usize,
    /// Sampling rate in Hz.
    pub sample_rate: u16,
    /// Beam pointing angles in 0.01 degrees, positive to port.
    pub pointangle: [i16; MAX_BEAMS],
    /// Transmit tilt angles in 0.01 degrees, positive forward.
    pub tiltangle: [i16; MAX_BEAMS],
    /// Two-way travel times in sample units.
    pub range: [u16; MAX_BEAMS],
    /// Beam amplitude in 0.5 dB.
    pub amp: [i8; MAX_BEAMS],
    /// Beam numbers.
    pub beam_num: [u8; MAX_BEAMS],
}

impl Default for RawBeam1 {
    fn default() -> RawBeam1 {
        RawBeam1 {
            timestamp: Timestamp::default(),
            count: 0,
            serial: 0,
            nbeams_max: 0,
            nbeams: 0,
            sample_rate: 0,
            pointangle: [0; MAX_BEAMS],
            tiltangle: [0; MAX_BEAMS],
            range: [0; MAX_BEAMS],
            amp: [0; MAX_BEAMS],
            beam_num: [0; MAX_BEAMS],
        }
    }
}

/// The second-generation raw range and angle datagram, which added
/// transmit-pulse slices and receive-side attitude.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBeam2 {
    /// Time of the raw beam record.
    pub timestamp: Timestamp,
    /// Sequential ping counter.
    pub count: u16,
    /// Sonar head serial number.
    pub serial: u16,
    /// Heading in 0.01 degrees.
    pub heading: u16,
    /// Sound speed at the transducer in 0.1 m/s.
    pub ssv: u16,
    /// Transmit transducer depth in 0.01 m.
    pub xducer_depth: u16,
    /// Status from the processing unit.
    pub status: u16,
    /// Normal incidence range in meters.
    pub rangenormal: u16,
    /// Normal incidence backscatter in dB.
    pub normalbackscatter: i16,
    /// Oblique incidence backscatter in dB.
    pub obliquebackscatter: i16,
    /// Fixed gain in dB.
    pub fixedgain: u16,
    /// Transmit power reduction in dB.
    pub txpower: i16,
    /// Sonar mode, 0 (very shallow) through 5 (extra deep).
    pub mode: u8,
    /// Swath coverage in degrees.
    pub coverage: u8,
    /// Yaw stabilization heading in 0.01 degrees.
    pub yawstabheading: u16,
    /// Number of transmit pulses.
    pub ntx: usize,
    /// Number of raw travel times and angles.
    pub nbeams: usize,
    /// Maximum number of beams possible.
    pub nbeams_max: usize,
    /// Sampling rate in Hz.
    pub sample_rate: u16,
    /// Last beam number in each transmit pulse.
    pub txlastbeam: [u16; MAX_TX],
    /// Transmit tilt angle per pulse in 0.01 degrees.
    pub txtiltangle: [i16; MAX_TX],
    /// Heading per pulse in 0.01 degrees.
    pub txheading: [u16; MAX_TX],
    /// Roll per pulse in 0.01 degrees.
    pub txroll: [i16; MAX_TX],
    /// Pitch per pulse in 0.01 degrees.
    pub txpitch: [i16; MAX_TX],
    /// Heave per pulse in 0.01 m.
    pub txheave: [i16; MAX_TX],
    /// Beam pointing angles in 0.01 degrees, positive to port.
    pub rxpointangle: [i16; MAX_BEAMS],
    /// Transmit tilt angle seen by each beam in 0.01 degrees.
    pub rxtiltangle: [i16; MAX_BEAMS],
    /// Two-way travel times in sample units.
    pub rxrange: [u16; MAX_BEAMS],
    /// Beam quality flags.
    pub rxquality: [u8; MAX_BEAMS],
    /// Detection window lengths.
    pub rxwindow: [u8; MAX_BEAMS],
    /// Beam amplitude in 0.5 dB.
    pub rxamp: [i8; MAX_BEAMS],
    /// Beam numbers.
    pub rxbeam_num: [u8; MAX_BEAMS],
    /// Heading at each beam's receive time in 0.01 degrees.
    pub rxheading: [u16; MAX_BEAMS],
    /// Roll at each beam's receive time in 0.01 degrees.
    pub rxroll: [i16; MAX_BEAMS],
    /// Pitch at each beam's receive time in 0.01 degrees.
    pub rxpitch: [i16; MAX_BEAMS],
}

impl Default for RawBeam2 {
    fn default() -> RawBeam2 {
        RawBeam2 {
            timestamp: Timestamp::default(),
            count: 0,
            serial: 0,
            heading: 0,
            ssv: 0,
            xducer_depth: 0,
            status: 0,
            rangenormal: 0,
            normalbackscatter: 0,
            obliquebackscatter: 0,
            fixedgain: 0,
            txpower: 0,
            mode: 0,
            coverage: 0,
            yawstabheading: 0,
            ntx: 0,
            nbeams: 0,
            nbeams_max: 0,
            sample_rate: 0,
            txlastbeam: [0; MAX_TX],
            txtiltangle: [0; MAX_TX],
            txheading: [0; MAX_TX],
            txroll: [0; MAX_TX],
            txpitch: [0; MAX_TX],
            txheave: [0; MAX_TX],
            rxpointangle: [0; MAX_BEAMS],
            rxtiltangle: [0; MAX_BEAMS],
            rxrange: [0; MAX_BEAMS],
            rxquality: [0; MAX_BEAMS],
            rxwindow: [0; MAX_BEAMS],
            rxamp: [0; MAX_BEAMS],
            rxbeam_num: [0; MAX_BEAMS],
            rxheading: [0; MAX_BEAMS],
            rxroll: [0; MAX_BEAMS],
            rxpitch: [0; MAX_BEAMS],
        }
    }
}

/// The third-generation raw range and angle datagram, which added
/// per-sector transmit parameters and per-beam sector identifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBeam3 {
    /// Time of the raw beam record.
    pub timestamp: Timestamp,
    /// Sequential ping counter.
    pub count: u16,
    /// Sonar head serial number.
    pub serial: u16,
    /// Sound speed at the transducer in 0.1 m/s.
    pub ssv: u16,
    /// Number of transmit sectors.
    pub ntx: usize,
    /// Number of raw travel times and angles.
    pub nbeams: usize,
    /// Maximum number of beams possible.
    pub nbeams_max: usize,
    /// Sampling rate in 0.01 Hz.
    pub sample_rate: u32,
    /// Transmit transducer depth in 0.01 m.
    pub xducer_depth: i32,
    /// Transmit tilt angle per sector in 0.01 degrees.
    pub txtiltangle: [i16; MAX_TX],
    /// Focus range per sector in 0.1 m, zero for no focusing.
    pub txfocus: [u16; MAX_TX],
    /// Signal length per sector in microseconds.
    pub txsignallength: [u32; MAX_TX],
    /// Transmit time offset per sector in microseconds.
    pub txoffset: [u32; MAX_TX],
    /// Center frequency per sector in Hz.
    pub txcenter: [u32; MAX_TX],
    /// Bandwidth per sector in 10 Hz.
    pub txbandwidth: [u16; MAX_TX],
    /// Signal waveform per sector, 0 for CW and 1 for FM.
    pub txwaveform: [u8; MAX_TX],
    /// Transmit sector number.
    pub txsector: [u8; MAX_TX],
    /// Beam pointing angles in 0.01 degrees, positive to port.
    pub rxpointangle: [i16; MAX_BEAMS],
    /// Two-way travel times in quarter-sample units.
    pub rxrange: [u16; MAX_BEAMS],
    /// Transmit sector of each beam.
    pub rxsector: [u8; MAX_BEAMS],
    /// Beam amplitude in 0.5 dB.
    pub rxamp: [i8; MAX_BEAMS],
    /// Beam quality flags.
    pub rxquality: [u8; MAX_BEAMS],
    /// Detection window lengths.
    pub rxwindow: [u8; MAX_BEAMS],
    /// Beam numbers; bit 7 marks the second head on dual-head systems.
    pub rxbeam_num: [i16; MAX_BEAMS],
    /// Spare field preserved for round trips.
    pub rxspare: [i16; MAX_BEAMS],
}

impl Default for RawBeam3 {
    fn default() -> RawBeam3 {
        RawBeam3 {
            timestamp: Timestamp::default(),
            count: 0,
            serial: 0,
            ssv: 0,
            ntx: 0,
            nbeams: 0,
            nbeams_max: 0,
            sample_rate: 0,
            xducer_depth: 0,
            txtiltangle: [0; MAX_TX],
            txfocus: [0; MAX_TX],
            txsignallength: [0; MAX_TX],
            txoffset: [0; MAX_TX],
            txcenter: [0; MAX_TX],
            txbandwidth: [0; MAX_TX],
            txwaveform: [0; MAX_TX],
            txsector: [0; MAX_TX],
            rxpointangle: [0; MAX_BEAMS],
            rxrange: [0; MAX_BEAMS],
            rxsector: [0; MAX_BEAMS],
            rxamp: [0; MAX_BEAMS],
            rxquality: [0; MAX_BEAMS],
            rxwindow: [0; MAX_BEAMS],
            rxbeam_num: [0; MAX_BEAMS],
            rxspare: [0; MAX_BEAMS],
        }
    }
}

/// The sidescan portion of a ping: raw per-beam sample runs plus the
/// processed acrosstrack pixel image.
#[derive(Clone, Debug, PartialEq)]
pub struct Sidescan {
    /// Time of the sidescan record.
    pub timestamp: Timestamp,
    /// Sequential ping counter.
    pub count: u16,
    /// Sonar head serial number.
    pub serial: u16,
    /// Mean absorption coefficient in 0.01 dB/km.
    pub max_range: u16,
    /// Transmit pulse length in microseconds.
    pub r_zero: u16,
    /// Range to normal incidence used to correct amplitudes, in samples.
    pub r_zero_corr: u16,
    /// Start sample of the TVG ramp, zero if unused.
    pub tvg_start: u16,
    /// Stop sample of the TVG ramp, zero if unused.
    pub tvg_stop: u16,
    /// Normal incidence backscatter in dB.
    pub bsn: i8,
    /// Oblique incidence backscatter in dB.
    pub bso: i8,
    /// Transmit beamwidth in 0.1 degrees.
    pub tx: u16,
    /// TVG law crossover angle in degrees.
    pub tvg_crossover: u8,
    /// Number of beams carrying sidescan.
    pub nbeams_ss: usize,
    /// Total number of raw sidescan samples.
    pub npixels: usize,
    /// Beam index of each sidescan run.
    pub beam_index: [u8; MAX_BEAMS],
    /// Sample sort direction per beam: 1 low range first, -1 high first.
    pub sort_direction: [i8; MAX_BEAMS],
    /// Raw sample count per beam.
    pub beam_samples: [u16; MAX_BEAMS],
    /// Starting offset of each beam's run in the raw array.
    pub start_sample: [u16; MAX_BEAMS],
    /// Center sample of each beam's run.
    pub center_sample: [u16; MAX_BEAMS],
    /// The raw sidescan, ordered port to starboard.
    pub ssraw: [i8; MAX_RAW_PIXELS],
    /// Processed pixel size in cm.
    pub pixel_size: u16,
    /// Number of processed pixels stored.
    pub pixels_ss: usize,
    /// The processed sidescan image, ordered port to starboard.
    pub ss: [i16; MAX_PIXELS],
    /// Alongtrack distance of each processed pixel in distance resolution
    /// units.
    pub ss_alongtrack: [i16; MAX_PIXELS],
}

impl Default for Sidescan {
    fn default() -> Sidescan {
        Sidescan {
            timestamp: Timestamp::default(),
            count: 0,
            serial: 0,
            max_range: 0,
            r_zero: 0,
            r_zero_corr: 0,
            tvg_start: 0,
            tvg_stop: 0,
            bsn: 0,
            bso: 0,
            tx: 0,
            tvg_crossover: 0,
            nbeams_ss: 0,
            npixels: 0,
            beam_index: [0; MAX_BEAMS],
            sort_direction: [0; MAX_BEAMS],
            beam_samples: [0; MAX_BEAMS],
            start_sample: [0; MAX_BEAMS],
            center_sample: [0; MAX_BEAMS],
            ssraw: [0; MAX_RAW_PIXELS],
            pixel_size: 0,
            pixels_ss: 0,
            ss: [0; MAX_PIXELS],
            ss_alongtrack: [0; MAX_PIXELS],
        }
    }
}

/// One survey ping as assembled from its sub-datagrams.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PingRecord {
    /// Which head produced this ping, 0 or 1.
    pub head: usize,
    /// The bathymetry record.
    pub bath: Bathymetry,
    /// The first-generation raw beam record, if read.
    pub raw1: RawBeam1,
    /// The second-generation raw beam record, if read.
    pub raw2: RawBeam2,
    /// The third-generation raw beam record, if read.
    pub raw3: RawBeam3,
    /// The sidescan record, if read.
    pub sidescan: Sidescan,
    /// Which sub-datagrams have actually been seen for this ping.
    pub seen: SubRecords,
}

impl PingRecord {
    /// Resets the ping for reuse by the next assembly cycle.
    ///
    /// The buffers stay allocated; only the seen flags and the sidescan
    /// and raw sections that could leak stale data are cleared.
    pub fn reset(&mut self) {
        self.seen = SubRecords::default();
        self.sidescan = Sidescan::default();
        self.bath.attitude_extrapolated = false;
    }

    /// The ping counter, taken from the bathymetry record.
    pub fn count(&self) -> u16 {
        self.bath.count
    }

    /// True when bathymetry and sidescan timestamps agree, or when no
    /// sidescan was read at all.
    pub fn times_match(&self) -> bool {
        !self.seen.sidescan || self.bath.timestamp == self.sidescan.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beam_flags() {
        assert!(BeamFlag::CLEAN.is_clean());
        assert!(BeamFlag::NULL.is_null());
        assert!(!BeamFlag::FLAGGED.is_clean());
        assert!(!BeamFlag::FLAGGED.is_null());
    }

    #[test]
    fn reset_clears_sidescan_but_keeps_bath() {
        let mut ping = PingRecord::default();
        ping.bath.count = 42;
        ping.sidescan.npixels = 7;
        ping.seen.bath = true;
        ping.seen.sidescan = true;
        ping.reset();
        assert_eq!(42, ping.bath.count);
        assert_eq!(0, ping.sidescan.npixels);
        assert_eq!(SubRecords::default(), ping.seen);
    }

    #[test]
    fn times_match_without_sidescan() {
        let mut ping = PingRecord::default();
        ping.bath.timestamp = Timestamp::new(20080505, 100);
        assert!(ping.times_match());
        ping.seen.sidescan = true;
        assert!(!ping.times_match());
        ping.sidescan.timestamp = ping.bath.timestamp;
        assert!(ping.times_match());
    }
}
