//! A cache of recent attitude samples and interpolation over them.
//!
//! Every decoded attitude datagram feeds its samples into the cache. When a
//! ping completes, the cache is queried at the ping timestamp (and, for
//! per-beam work, at the echo return time) to fill the ping's roll, pitch,
//! heave, and heading.

use std::collections::VecDeque;

/// How many samples the cache retains before dropping the oldest.
const CAPACITY: usize = 1024;

/// One attitude sample in absolute time.
///
/// Angles are degrees, heave is meters, time is seconds since the Unix
/// epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attitude {
    /// Sample time in seconds since the Unix epoch.
    pub time: f64,
    /// Roll in degrees, starboard down positive.
    pub roll: f64,
    /// Pitch in degrees, bow up positive.
    pub pitch: f64,
    /// Heave in meters, up positive.
    pub heave: f64,
    /// Heading in degrees, compass convention.
    pub heading: f64,
}

/// Health of the attitude sensor, decoded from the vendor status byte.
///
/// The cache records the status but never acts on it; filtering on sensor
/// health is the caller's call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorHealth {
    /// 0x90 through 0x99: a valid datagram, accuracy gradually reduced as
    /// the value rises.
    Working(u8),
    /// 0x9A through 0x9F: the sensor runs but its data is invalid.
    InvalidData,
    /// 0xA0 through 0xAF: faulty sensor.
    Faulty,
    /// Anything else is not a valid attitude sensor status.
    Invalid,
}

impl SensorHealth {
    /// Classifies a vendor status byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::attitude::SensorHealth;
    /// assert_eq!(SensorHealth::Working(0), SensorHealth::from_status(0x90));
    /// assert_eq!(SensorHealth::Faulty, SensorHealth::from_status(0xA3));
    /// ```
    pub fn from_status(status: u8) -> SensorHealth {
        match status {
            0x90..=0x99 => SensorHealth::Working(status - 0x90),
            0x9A..=0x9F => SensorHealth::InvalidData,
            0xA0..=0xAF => SensorHealth::Faulty,
            _ => SensorHealth::Invalid,
        }
    }
}

/// A ring of recent attitude samples with linear interpolation.
///
/// Heading interpolates along the shortest arc so that samples straddling
/// north (e.g. 359° and 1°) do not average to south. Queries outside the
/// cached span return the nearest endpoint and report extrapolation.
#[derive(Clone, Debug, Default)]
pub struct AttitudeCache {
    samples: VecDeque<Attitude>,
}

impl AttitudeCache {
    /// Creates an empty cache.
    pub fn new() -> AttitudeCache {
        AttitudeCache {
            samples: VecDeque::with_capacity(CAPACITY),
        }
    }

    /// Appends a sample, dropping the oldest when the ring is full.
    ///
    /// Samples are expected in nondecreasing time order, which is what the
    /// datagram stream delivers.
    pub fn push(&mut self, sample: Attitude) {
        if self.samples.len() == CAPACITY {
            let _ = self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The number of cached samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drops all cached samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Interpolates the attitude at the given time.
    ///
    /// Returns the interpolated sample and a flag that is true when the
    /// query fell outside the cached span and the nearest endpoint was
    /// returned instead. An empty cache yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use swath::attitude::{Attitude, AttitudeCache};
    /// let mut cache = AttitudeCache::new();
    /// cache.push(Attitude { time: 0.0, roll: 0.0, ..Default::default() });
    /// cache.push(Attitude { time: 2.0, roll: 4.0, ..Default::default() });
    /// let (attitude, extrapolated) = cache.interpolate(1.0).unwrap();
    /// assert_eq!(2.0, attitude.roll);
    /// assert!(!extrapolated);
    /// ```
    pub fn interpolate(&self, time: f64) -> Option<(Attitude, bool)> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        if time <= first.time {
            let mut attitude = *first;
            attitude.time = time;
            return Some((attitude, time < first.time));
        }
        if time >= last.time {
            let mut attitude = *last;
            attitude.time = time;
            return Some((attitude, time > last.time));
        }
        let index = self
            .samples
            .iter()
            .position(|sample| sample.time >= time)
            .unwrap_or(self.samples.len() - 1);
        let after = self.samples[index];
        let before = self.samples[index - 1];
        let span = after.time - before.time;
        let factor = if span > 0.0 {
            (time - before.time) / span
        } else {
            0.0
        };
        Some((
            Attitude {
                time,
                roll: before.roll + factor * (after.roll - before.roll),
                pitch: before.pitch + factor * (after.pitch - before.pitch),
                heave: before.heave + factor * (after.heave - before.heave),
                heading: lerp_heading(before.heading, after.heading, factor),
            },
            false,
        ))
    }
}

/// Shortest-arc (circular) interpolation between two headings in degrees.
fn lerp_heading(from: f64, to: f64, factor: f64) -> f64 {
    let mut delta = (to - from) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    (from + factor * delta).rem_euclid(360.0)
}
