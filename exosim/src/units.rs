//! Physical constants and unit helpers for planetary photometry
//!
//! Instrument-facing quantities (wavelengths, apertures, orbital and stellar
//! distances) go through `uom` lengths so unit mix-ups are caught at compile
//! time. The sampling hot loops work on plain `f64` values in the catalog's
//! native units (AU, parsecs, Earth/Jupiter masses and radii) using the
//! constants defined here.

use std::f64::consts::PI;

use uom::si::f64::Angle;
use uom::si::angle::{degree, radian};
use uom::si::length::{astronomical_unit, meter, micrometer, nanometer, parsec};

/// Type alias for length measurements with convenient methods
pub type Length = uom::si::f64::Length;

/// Astronomical unit in meters (IAU 2012)
pub const AU_M: f64 = 1.495_978_707e11;
/// Parsec in meters
pub const PARSEC_M: f64 = 3.085_677_581_491_367e16;
/// Astronomical units per parsec
pub const AU_PER_PARSEC: f64 = PARSEC_M / AU_M;

/// Equatorial Jupiter radius in meters
pub const R_JUPITER_M: f64 = 7.1492e7;
/// Equatorial Earth radius in meters
pub const R_EARTH_M: f64 = 6.3781e6;
/// Jupiter radius expressed in Earth radii
pub const R_JUPITER_IN_EARTH: f64 = R_JUPITER_M / R_EARTH_M;

/// Jupiter mass in kg (IAU 2015 nominal GM / G)
pub const M_JUPITER_KG: f64 = 1.898_124_597_336_050_5e27;
/// Earth mass in kg (IAU 2015 nominal GM / G)
pub const M_EARTH_KG: f64 = 5.972_167_867_791_379e24;
/// Solar mass in kg (IAU 2015 nominal GM / G)
pub const M_SUN_KG: f64 = 1.988_409_870_698_051e30;
/// Jupiter mass expressed in Earth masses
pub const M_JUPITER_IN_EARTH: f64 = M_JUPITER_KG / M_EARTH_KG;
/// Solar mass expressed in Earth masses
pub const M_SUN_IN_EARTH: f64 = M_SUN_KG / M_EARTH_KG;

/// Newtonian gravitational constant (m^3 kg^-1 s^-2)
pub const G_SI: f64 = 6.674_30e-11;
/// Seconds per day
pub const DAY_S: f64 = 86_400.0;

/// Milliarcseconds per radian
pub const MAS_PER_RAD: f64 = 180.0 / PI * 3_600.0 * 1_000.0;

/// Jupiter masses to Earth masses
pub fn mjup_to_mearth(m: f64) -> f64 {
    m * M_JUPITER_IN_EARTH
}

/// Earth radii to Jupiter radii
pub fn rearth_to_rjup(r: f64) -> f64 {
    r / R_JUPITER_IN_EARTH
}

/// Jupiter radii to astronomical units
pub fn rjup_to_au(r: f64) -> f64 {
    r * R_JUPITER_M / AU_M
}

/// Extension trait for length conversions used in orbit and instrument work
pub trait LengthExt {
    fn from_nanometers(nm: f64) -> Self;
    fn as_nanometers(&self) -> f64;

    fn from_micrometers(um: f64) -> Self;
    fn as_micrometers(&self) -> f64;

    fn from_meters(m: f64) -> Self;
    fn as_meters(&self) -> f64;

    /// Create length from astronomical units (orbital distances)
    fn from_au(au: f64) -> Self;
    fn as_au(&self) -> f64;

    /// Create length from parsecs (stellar distances)
    fn from_parsecs(pc: f64) -> Self;
    fn as_parsecs(&self) -> f64;
}

impl LengthExt for Length {
    fn from_nanometers(nm: f64) -> Self {
        Length::new::<nanometer>(nm)
    }

    fn as_nanometers(&self) -> f64 {
        self.get::<nanometer>()
    }

    fn from_micrometers(um: f64) -> Self {
        Length::new::<micrometer>(um)
    }

    fn as_micrometers(&self) -> f64 {
        self.get::<micrometer>()
    }

    fn from_meters(m: f64) -> Self {
        Length::new::<meter>(m)
    }

    fn as_meters(&self) -> f64 {
        self.get::<meter>()
    }

    fn from_au(au: f64) -> Self {
        Length::new::<astronomical_unit>(au)
    }

    fn as_au(&self) -> f64 {
        self.get::<astronomical_unit>()
    }

    fn from_parsecs(pc: f64) -> Self {
        Length::new::<parsec>(pc)
    }

    fn as_parsecs(&self) -> f64 {
        self.get::<parsec>()
    }
}

/// Extension trait for sky-plane angles
pub trait AngleExt {
    fn from_degrees(deg: f64) -> Self;
    fn as_degrees(&self) -> f64;
    fn from_radians(rad: f64) -> Self;
    fn as_radians(&self) -> f64;
    fn from_milliarcseconds(mas: f64) -> Self;
    fn as_milliarcseconds(&self) -> f64;
}

impl AngleExt for Angle {
    fn from_degrees(deg: f64) -> Self {
        Angle::new::<degree>(deg)
    }

    fn as_degrees(&self) -> f64 {
        self.get::<degree>()
    }

    fn from_radians(rad: f64) -> Self {
        Angle::new::<radian>(rad)
    }

    fn as_radians(&self) -> f64 {
        self.get::<radian>()
    }

    fn from_milliarcseconds(mas: f64) -> Self {
        Angle::new::<radian>(mas / MAS_PER_RAD)
    }

    fn as_milliarcseconds(&self) -> f64 {
        self.get::<radian>() * MAS_PER_RAD
    }
}

/// Diffraction scale λ/D of an instrument as a sky angle.
pub fn diffraction_scale(wavelength: Length, aperture: Length) -> Angle {
    Angle::from_radians(wavelength.as_meters() / aperture.as_meters())
}

/// Angular separation subtended by a physical separation at a distance.
pub fn angular_separation(separation: Length, distance: Length) -> Angle {
    Angle::from_radians((separation.as_meters() / distance.as_meters()).atan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mass_ratios() {
        assert_relative_eq!(M_JUPITER_IN_EARTH, 317.828, epsilon = 1e-3);
        assert_relative_eq!(M_SUN_IN_EARTH, 332_946.0, epsilon = 1.0);
        assert_relative_eq!(R_JUPITER_IN_EARTH, 11.209, epsilon = 1e-3);
    }

    #[test]
    fn test_length_conversions() {
        let wavelength = Length::from_nanometers(575.0);
        assert_relative_eq!(wavelength.as_micrometers(), 0.575, epsilon = 1e-12);

        let one_au = Length::from_au(1.0);
        assert_relative_eq!(one_au.as_meters(), AU_M, max_relative = 1e-9);

        let one_pc = Length::from_parsecs(1.0);
        assert_relative_eq!(one_pc.as_au(), AU_PER_PARSEC, max_relative = 1e-6);
    }

    #[test]
    fn test_one_au_at_one_parsec_is_one_arcsecond() {
        let angle = angular_separation(Length::from_au(1.0), Length::from_parsecs(1.0));
        assert_relative_eq!(angle.as_milliarcseconds(), 1000.0, max_relative = 1e-6);
    }

    #[test]
    fn test_diffraction_scale() {
        let scale = diffraction_scale(Length::from_nanometers(575.0), Length::from_meters(2.37));
        // 575 nm / 2.37 m ~ 50 mas
        assert_relative_eq!(scale.as_milliarcseconds(), 50.04, epsilon = 0.01);
    }

    #[test]
    fn test_angle_round_trip() {
        let a = Angle::from_degrees(90.0);
        assert_relative_eq!(a.as_radians(), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(
            Angle::from_milliarcseconds(a.as_milliarcseconds()).as_degrees(),
            90.0,
            epsilon = 1e-9
        );
    }
}
