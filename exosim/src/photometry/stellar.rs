//! Main-sequence luminosity relation
//!
//! Host luminosities missing from the catalog are inferred from a tabulated
//! dwarf sequence: by effective temperature when known, otherwise by the
//! spectral type string. Lookups outside the table or on unparseable types
//! give `None`, never an error.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::algo::interp::{Interp1dError, LinearInterpolator};

/// Errors loading a stellar sequence table
#[derive(Debug, Error)]
pub enum StellarTableError {
    #[error("I/O error reading stellar table: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error reading stellar table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Stellar table {relation}: {source}")]
    Relation {
        relation: &'static str,
        source: Interp1dError,
    },
}

/// Morgan-Keenan spectral classes, hottest first, extended to brown dwarfs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
    L,
    T,
    Y,
}

impl SpectralClass {
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'O' => Some(SpectralClass::O),
            'B' => Some(SpectralClass::B),
            'A' => Some(SpectralClass::A),
            'F' => Some(SpectralClass::F),
            'G' => Some(SpectralClass::G),
            'K' => Some(SpectralClass::K),
            'M' => Some(SpectralClass::M),
            'L' => Some(SpectralClass::L),
            'T' => Some(SpectralClass::T),
            'Y' => Some(SpectralClass::Y),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SpectralClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpectralClass::O => "O",
            SpectralClass::B => "B",
            SpectralClass::A => "A",
            SpectralClass::F => "F",
            SpectralClass::G => "G",
            SpectralClass::K => "K",
            SpectralClass::M => "M",
            SpectralClass::L => "L",
            SpectralClass::T => "T",
            SpectralClass::Y => "Y",
        };
        write!(f, "{s}")
    }
}

/// A parsed spectral type: class letter plus numeric subtype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralType {
    pub class: SpectralClass,
    pub subtype: f64,
}

impl SpectralType {
    /// Parse the leading class letter and the subtype digits that follow it
    /// (`G2V` → G2, `K1.5 III` → K1.5). Luminosity class and anything after
    /// the subtype are ignored; a comma ends the subtype.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let class = SpectralClass::from_letter(chars.next()?)?;
        let rest = chars.as_str();

        let digits_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let digits = rest[..digits_end].trim_end_matches('.');
        if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        let subtype = digits.parse().ok()?;
        Some(Self { class, subtype })
    }

    /// Position on a continuous O0..Y9 scale, ten units per class
    pub fn code(&self) -> f64 {
        self.class.index() as f64 * 10.0 + self.subtype
    }
}

#[derive(Debug, Deserialize)]
struct SequenceRow {
    spt: String,
    teff: f64,
    logl: f64,
}

/// Tabulated dwarf sequence relating temperature and spectral type to
/// log10(L / L_sun).
#[derive(Debug, Clone)]
pub struct StellarSequence {
    by_teff: LinearInterpolator,
    by_type: LinearInterpolator,
}

/// Sort pairs by x and drop repeated x values, keeping the first
fn sorted_unique(mut pairs: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    pairs.retain(|(x, y)| x.is_finite() && y.is_finite());
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.dedup_by(|b, a| a.0 == b.0);
    pairs
}

impl StellarSequence {
    /// Read a CSV table with columns `spt,teff,logl`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StellarTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);
        let rows: Vec<SequenceRow> = csv_reader.deserialize().collect::<Result<_, _>>()?;

        let teff_pairs = sorted_unique(rows.iter().map(|r| (r.teff, r.logl)).collect());
        let type_pairs = sorted_unique(
            rows.iter()
                .filter_map(|r| SpectralType::parse(&r.spt).map(|t| (t.code(), r.logl)))
                .collect(),
        );

        let (x, y) = teff_pairs.into_iter().unzip();
        let by_teff = LinearInterpolator::new(x, y).map_err(|source| StellarTableError::Relation {
            relation: "teff",
            source,
        })?;
        let (x, y) = type_pairs.into_iter().unzip();
        let by_type = LinearInterpolator::new(x, y).map_err(|source| StellarTableError::Relation {
            relation: "spectral type",
            source,
        })?;

        Ok(Self { by_teff, by_type })
    }

    pub fn load(path: &Path) -> Result<Self, StellarTableError> {
        let sequence = Self::from_reader(std::fs::File::open(path)?)?;
        log::info!(
            "Loaded stellar sequence {} ({} temperatures, {} spectral types)",
            path.display(),
            sequence.by_teff.x().len(),
            sequence.by_type.x().len()
        );
        Ok(sequence)
    }

    fn known(v: f64) -> Option<f64> {
        v.is_finite().then_some(v)
    }

    /// log10 luminosity for an effective temperature in kelvin
    pub fn log_luminosity_from_teff(&self, teff: f64) -> Option<f64> {
        Self::known(self.by_teff.evaluate(teff))
    }

    /// log10 luminosity for a spectral type string
    pub fn log_luminosity_from_type(&self, spectral_type: &str) -> Option<f64> {
        let parsed = SpectralType::parse(spectral_type)?;
        Self::known(self.by_type.evaluate(parsed.code()))
    }

    /// Temperature first, then spectral type
    pub fn log_luminosity(&self, teff: Option<f64>, spectral_type: Option<&str>) -> Option<f64> {
        match teff.filter(|t| t.is_finite()) {
            Some(t) => self.log_luminosity_from_teff(t),
            None => spectral_type.and_then(|s| self.log_luminosity_from_type(s)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) const SEQUENCE_CSV: &str = "\
spt,teff,logl
F5V,6550,0.43
G0V,5930,0.11
G2V,5770,0.01
G5V,5660,-0.05
K0V,5270,-0.34
K5V,4440,-0.76
M0V,3850,-1.11
";

    fn sequence() -> StellarSequence {
        StellarSequence::from_reader(SEQUENCE_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_spectral_types() {
        let g2 = SpectralType::parse("G2V").unwrap();
        assert_eq!(g2.class, SpectralClass::G);
        assert_eq!(g2.subtype, 2.0);
        assert_eq!(g2.code(), 42.0);

        assert_eq!(SpectralType::parse("K1.5 III").unwrap().subtype, 1.5);
        assert_eq!(SpectralType::parse("m4,5V").unwrap().code(), 64.0);
        assert!(SpectralType::parse("G").is_none());
        assert!(SpectralType::parse("DA2").is_none());
        assert!(SpectralType::parse("").is_none());
        assert!(SpectralType::parse("K.5V").is_none());
    }

    #[test]
    fn test_class_from_letter() {
        for (letter, class) in "obafgkmlty".chars().zip([
            SpectralClass::O,
            SpectralClass::B,
            SpectralClass::A,
            SpectralClass::F,
            SpectralClass::G,
            SpectralClass::K,
            SpectralClass::M,
            SpectralClass::L,
            SpectralClass::T,
            SpectralClass::Y,
        ]) {
            assert_eq!(SpectralClass::from_letter(letter), Some(class));
            assert_eq!(SpectralClass::from_letter(letter.to_ascii_uppercase()), Some(class));
            assert_eq!(class.to_string(), letter.to_ascii_uppercase().to_string());
        }
        assert_eq!(SpectralClass::from_letter('D'), None);
        assert_eq!(SpectralClass::from_letter('2'), None);
    }

    #[test]
    fn test_luminosity_from_teff() {
        let seq = sequence();
        assert_relative_eq!(seq.log_luminosity_from_teff(5770.0).unwrap(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(
            seq.log_luminosity_from_teff(5715.0).unwrap(),
            -0.02,
            epsilon = 1e-12
        );
        assert!(seq.log_luminosity_from_teff(10_000.0).is_none());
    }

    #[test]
    fn test_luminosity_from_type() {
        let seq = sequence();
        assert_relative_eq!(seq.log_luminosity_from_type("G2 V").unwrap(), 0.01, epsilon = 1e-12);
        // K2 lies 2/5 of the way from K0 to K5
        assert_relative_eq!(
            seq.log_luminosity_from_type("K2V").unwrap(),
            -0.34 + 0.4 * (-0.76 + 0.34),
            epsilon = 1e-12
        );
        assert!(seq.log_luminosity_from_type("white dwarf").is_none());
        assert!(seq.log_luminosity_from_type("B3V").is_none());
    }

    #[test]
    fn test_temperature_preferred() {
        let seq = sequence();
        let l = seq.log_luminosity(Some(5770.0), Some("M0V")).unwrap();
        assert_relative_eq!(l, 0.01, epsilon = 1e-12);
        let l = seq.log_luminosity(None, Some("M0V")).unwrap();
        assert_relative_eq!(l, -1.11, epsilon = 1e-12);
        assert!(seq.log_luminosity(None, None).is_none());
    }
}
