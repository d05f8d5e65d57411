//! Beam geometry recomputation.
//!
//! Transmit and receive array orientations compose with the mechanical
//! steering angles into an earth-frame (depression, azimuth) pair per beam,
//! following Beaudoin, Hughes Clarke, and Bartlett, "Application of Surface
//! Sound Speed Measurements in Post-Processing for Multi-Sector Multibeam
//! Echosounders", International Hydrographic Review v.5 no.3.
//!
//! The ship frame is x starboard, y forward, z down. A beam direction is
//! the unit vector whose projection on the transmit array axis equals the
//! sine of the transmit steering angle and whose projection on the receive
//! array axis equals the sine of the receive steering angle, taking the
//! downward-pointing solution.

use crate::ping::BeamFlag;

const DTR: f64 = std::f64::consts::PI / 180.0;

/// Roll, pitch, and heading of a transducer array, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    /// Roll, starboard down positive.
    pub roll: f64,
    /// Pitch, bow up positive.
    pub pitch: f64,
    /// Heading, compass convention.
    pub heading: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Vec3 {
    x: f64,
    y: f64,
    z: f64,
}

impl Vec3 {
    fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    fn cross(&self, other: &Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    fn norm2(&self) -> f64 {
        self.dot(self)
    }
}

/// Rotates a vector out of an array frame: roll about the forward axis,
/// then pitch about the starboard axis, then heading about the vertical.
fn unrotate(v: Vec3, o: &Orientation) -> Vec3 {
    let (sin_roll, cos_roll) = (o.roll * DTR).sin_cos();
    let rolled = Vec3 {
        x: v.x * cos_roll - v.z * sin_roll,
        y: v.y,
        z: v.x * sin_roll + v.z * cos_roll,
    };
    let (sin_pitch, cos_pitch) = (o.pitch * DTR).sin_cos();
    let pitched = Vec3 {
        x: rolled.x,
        y: rolled.y * cos_pitch + rolled.z * sin_pitch,
        z: -rolled.y * sin_pitch + rolled.z * cos_pitch,
    };
    let (sin_heading, cos_heading) = (o.heading * DTR).sin_cos();
    Vec3 {
        x: pitched.x * cos_heading + pitched.y * sin_heading,
        y: -pitched.x * sin_heading + pitched.y * cos_heading,
        z: pitched.z,
    }
}

/// Composes array orientations and steering angles into a beam azimuth and
/// depression angle, both in degrees.
///
/// The azimuth is relative to `reference_heading` and the depression is
/// measured down from the horizontal. Alignment angles describe how each
/// array is mounted on the vessel; orientation angles carry the vessel
/// attitude at transmit or receive time. Reverse-mounted arrays are
/// handled by the caller flipping the sign of the corresponding steering
/// angle (see [steer_sign]); no sign work happens here.
#[allow(clippy::too_many_arguments)]
pub fn beaudoin(
    tx_align: Orientation,
    tx_orientation: Orientation,
    tx_steer: f64,
    rx_align: Orientation,
    rx_orientation: Orientation,
    rx_steer: f64,
    reference_heading: f64,
) -> (f64, f64) {
    // transmit array axis points forward, receive array axis starboard
    let tx_ideal = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    let rx_ideal = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };
    let tx_geo = unrotate(unrotate(tx_ideal, &tx_align), &tx_orientation);
    let rx_geo = unrotate(unrotate(rx_ideal, &rx_align), &rx_orientation);

    // solve dot(tx, b) = sin(tx_steer), dot(rx, b) = sin(rx_steer), |b| = 1
    let tx_component = (tx_steer * DTR).sin();
    let rx_component = (rx_steer * DTR).sin();
    let cosine = tx_geo.dot(&rx_geo);
    let denominator = (1.0 - cosine * cosine).max(f64::EPSILON);
    let a1 = (tx_component - rx_component * cosine) / denominator;
    let a2 = (rx_component - tx_component * cosine) / denominator;
    let cross = tx_geo.cross(&rx_geo);
    let planar = a1 * a1 + a2 * a2 + 2.0 * a1 * a2 * cosine;
    let a3 = ((1.0 - planar).max(0.0) / cross.norm2().max(f64::EPSILON)).sqrt();
    let mut beam = Vec3 {
        x: a1 * tx_geo.x + a2 * rx_geo.x + a3 * cross.x,
        y: a1 * tx_geo.y + a2 * rx_geo.y + a3 * cross.y,
        z: a1 * tx_geo.z + a2 * rx_geo.z + a3 * cross.z,
    };
    if beam.z < 0.0 {
        beam.x -= 2.0 * a3 * cross.x;
        beam.y -= 2.0 * a3 * cross.y;
        beam.z -= 2.0 * a3 * cross.z;
    }

    let radial = (beam.x * beam.x + beam.y * beam.y).sqrt();
    let depression = beam.z.atan2(radial) / DTR;
    let mut azimuth = 90.0 - beam.y.atan2(beam.x) / DTR - reference_heading;
    azimuth = azimuth.rem_euclid(360.0);
    (azimuth, depression)
}

/// Sign of the steering angle for an array mounted with the given heading
/// offset: a reverse mount (offset near 180 degrees) flips the steering
/// sign.
pub fn steer_sign(heading_offset: f64) -> f64 {
    if heading_offset.abs() > 100.0 {
        -1.0
    } else {
        1.0
    }
}

/// One recomputed sounding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sounding {
    /// One-way beam range in meters.
    pub beamrange: f64,
    /// Takeoff angle from vertical in degrees.
    pub angle: f64,
    /// Azimuthal angle in degrees, zero at starboard.
    pub angle_forward: f64,
    /// Depth below the waterline in meters.
    pub bath: f64,
    /// Acrosstrack distance in meters, starboard positive.
    pub acrosstrack: f64,
    /// Alongtrack distance in meters, forward positive.
    pub alongtrack: f64,
    /// Sounding validity flag.
    pub flag: BeamFlag,
}

/// Per-ping inputs for sounding recomputation.
///
/// Encoded fields keep their on-disk scaling: angles in 0.01 degree with
/// the vendor's +180 degree offsets, sound velocity in 0.1 m/s, range
/// resolution in millimeters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PingGeometry {
    /// Vessel roll in degrees.
    pub roll: f64,
    /// Vessel pitch in degrees.
    pub pitch: f64,
    /// Vessel heading in degrees.
    pub heading: f64,
    /// Profile tilt angle field, degrees + 180.
    pub profile_tilt_angle: i32,
    /// Start angle field, 0.01 degrees + 180 degrees.
    pub start_angle: i32,
    /// Angle spacing per beam in 0.01 degrees.
    pub angle_increment: i32,
    /// Sound velocity in 0.1 m/s.
    pub sound_velocity: i32,
    /// Range resolution in millimeters.
    pub range_resolution: i32,
    /// Transducer depth below the waterline in meters.
    pub sonar_depth: f64,
    /// Heave in meters, up positive.
    pub heave: f64,
}

impl PingGeometry {
    /// The sound speed in m/s, with out-of-range values (outside 1300 to
    /// 1700 m/s) replaced by 1500.
    pub fn soundspeed(&self) -> f64 {
        if self.sound_velocity > 13000 && self.sound_velocity < 17000 {
            0.1 * f64::from(self.sound_velocity)
        } else {
            1500.0
        }
    }
}

/// Recomputes one sounding from a raw sample-unit range.
///
/// A zero range yields a null beam; negative or non-finite bathymetry is
/// flagged null rather than reported as an error. The computation is a
/// pure function of its inputs, so applying it twice gives the same
/// sounding as applying it once.
pub fn recompute_sounding(geometry: &PingGeometry, beam: usize, range: u32) -> Sounding {
    if range == 0 {
        return Sounding {
            flag: BeamFlag::NULL,
            ..Default::default()
        };
    }
    let tx_align = Orientation::default();
    let rx_align = Orientation::default();
    let tilt = f64::from(geometry.profile_tilt_angle) - 180.0;
    let tx_orientation = Orientation {
        roll: geometry.roll,
        pitch: geometry.pitch + tilt,
        heading: geometry.heading,
    };
    let rx_orientation = tx_orientation;
    let tx_steer = 0.0;
    let rx_sign = 1.0;
    let rx_steer = rx_sign
        * (180.0
            - 0.01 * (geometry.start_angle + beam as i32 * geometry.angle_increment) as f64);
    let (azimuth, depression) = beaudoin(
        tx_align,
        tx_orientation,
        tx_steer,
        rx_align,
        rx_orientation,
        rx_steer,
        geometry.heading,
    );
    let theta = 90.0 - depression;
    let phi = (90.0 - azimuth).rem_euclid(360.0);
    let beamrange = geometry.soundspeed() / 1500.0
        * 0.001
        * f64::from(geometry.range_resolution)
        * f64::from(range);
    let across = beamrange * (DTR * theta).sin();
    let down = beamrange * (DTR * theta).cos();
    let bath = down + geometry.sonar_depth - geometry.heave;
    let flag = if bath.is_finite() && bath >= 0.0 {
        BeamFlag::CLEAN
    } else {
        BeamFlag::NULL
    };
    Sounding {
        beamrange,
        angle: theta,
        angle_forward: phi,
        bath,
        acrosstrack: across * (DTR * phi).cos(),
        alongtrack: across * (DTR * phi).sin(),
        flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_geometry() -> PingGeometry {
        PingGeometry {
            roll: 0.0,
            pitch: 0.0,
            heading: 0.0,
            profile_tilt_angle: 180,
            start_angle: 12000,
            angle_increment: 0,
            sound_velocity: 15000,
            range_resolution: 1000,
            sonar_depth: 0.0,
            heave: 0.0,
        }
    }

    #[test]
    fn nadir_beam_points_down() {
        let mut geometry = flat_geometry();
        geometry.start_angle = 18000;
        let sounding = recompute_sounding(&geometry, 0, 100);
        assert!((sounding.angle - 0.0).abs() < 1e-6);
        assert!((sounding.bath - 100.0).abs() < 1e-6);
        assert!(sounding.acrosstrack.abs() < 1e-6);
        assert!(sounding.alongtrack.abs() < 1e-6);
    }

    #[test]
    fn sixty_degree_starboard_beam() {
        // start angle 120 deg encodes a 60 degree steer toward starboard
        let sounding = recompute_sounding(&flat_geometry(), 0, 100);
        assert!((sounding.angle - 60.0).abs() < 1e-6);
        assert!((sounding.beamrange - 100.0).abs() < 1e-9);
        assert!((sounding.acrosstrack - 100.0 * (60.0 * DTR).sin()).abs() < 1e-6);
        assert!((sounding.bath - 100.0 * (60.0 * DTR).cos()).abs() < 1e-6);
        assert!(sounding.alongtrack.abs() < 1e-6);
    }

    #[test]
    fn port_beam_has_negative_acrosstrack() {
        let mut geometry = flat_geometry();
        geometry.start_angle = 24000;
        let sounding = recompute_sounding(&geometry, 0, 100);
        assert!(sounding.acrosstrack < 0.0);
        assert!((sounding.acrosstrack + 100.0 * (60.0 * DTR).sin()).abs() < 1e-6);
    }

    #[test]
    fn heading_cancels_out_of_ship_frame() {
        let mut geometry = flat_geometry();
        geometry.heading = 137.0;
        let rotated = recompute_sounding(&geometry, 0, 100);
        let unrotated = recompute_sounding(&flat_geometry(), 0, 100);
        assert!((rotated.acrosstrack - unrotated.acrosstrack).abs() < 1e-6);
        assert!((rotated.alongtrack - unrotated.alongtrack).abs() < 1e-6);
        assert!((rotated.bath - unrotated.bath).abs() < 1e-6);
    }

    #[test]
    fn zero_range_yields_null_beam() {
        let sounding = recompute_sounding(&flat_geometry(), 0, 0);
        assert_eq!(BeamFlag::NULL, sounding.flag);
        assert_eq!(0.0, sounding.bath);
        assert_eq!(0.0, sounding.beamrange);
    }

    #[test]
    fn out_of_range_soundspeed_substitutes_1500() {
        let mut geometry = flat_geometry();
        geometry.sound_velocity = 99999;
        assert_eq!(1500.0, geometry.soundspeed());
        geometry.sound_velocity = 0;
        assert_eq!(1500.0, geometry.soundspeed());
        geometry.sound_velocity = 15100;
        assert_eq!(1510.0, geometry.soundspeed());
    }

    #[test]
    fn beamrange_scales_with_soundspeed() {
        let mut geometry = flat_geometry();
        geometry.sound_velocity = 15100;
        let sounding = recompute_sounding(&geometry, 0, 100);
        assert!((sounding.beamrange - 1510.0 / 1500.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn recompute_is_idempotent() {
        let geometry = flat_geometry();
        let first = recompute_sounding(&geometry, 3, 250);
        let second = recompute_sounding(&geometry, 3, 250);
        assert_eq!(first, second);
    }

    #[test]
    fn steer_sign_reverse_mount() {
        assert_eq!(1.0, steer_sign(0.0));
        assert_eq!(1.0, steer_sign(-30.0));
        assert_eq!(-1.0, steer_sign(180.0));
        assert_eq!(-1.0, steer_sign(-179.0));
    }

    #[test]
    fn roll_tilts_the_swath() {
        let mut geometry = flat_geometry();
        geometry.start_angle = 18000;
        geometry.roll = 10.0;
        let sounding = recompute_sounding(&geometry, 0, 100);
        // rolling starboard down swings the nadir beam toward port
        assert!((sounding.angle - 10.0).abs() < 1e-6);
        assert!(sounding.acrosstrack < 0.0);
        assert!((sounding.bath - 100.0 * (10.0 * DTR).cos()).abs() < 1e-6);
    }
}
