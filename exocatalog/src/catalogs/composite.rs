//! Reader for composite-table style planet catalogs
//!
//! Expects a CSV export using the archive's `pl_*` / `st_*` column names.
//! Every measured quantity may come with `err1`, `err2` and `lim` companion
//! columns; any of them may be missing from the file or empty in a row.

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;

use crate::records::{MassProvenance, Measurement, TargetRecord};

/// Errors raised while reading a catalog file
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error reading catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error reading catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Row {row}: cannot parse '{value}' in column '{column}' as a number")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Reference strings the archive uses for radii that were computed rather
/// than measured.
const CALCULATED_MARKERS: [&str; 2] = ["calculated value", "calculated_value"];

fn is_calculated_link(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    CALCULATED_MARKERS.iter().any(|m| lower.contains(m))
}

/// Column lookup by header name
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();
        Self { index }
    }

    fn require(&self, name: &'static str) -> Result<(), CatalogError> {
        if self.index.contains_key(name) {
            Ok(())
        } else {
            Err(CatalogError::MissingColumn(name))
        }
    }

    fn text<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        let i = *self.index.get(name)?;
        record.get(i).map(str::trim).filter(|s| !s.is_empty())
    }

    fn number(
        &self,
        record: &StringRecord,
        name: &str,
        row: usize,
    ) -> Result<Option<f64>, CatalogError> {
        match self.text(record, name) {
            None => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("nan") => Ok(None),
            Some(s) => s.parse::<f64>().map(Some).map_err(|_| CatalogError::BadNumber {
                row,
                column: name.to_string(),
                value: s.to_string(),
            }),
        }
    }

    fn measurement(
        &self,
        record: &StringRecord,
        base: &str,
        row: usize,
    ) -> Result<Measurement, CatalogError> {
        let limit = self.number(record, &format!("{base}lim"), row)?;
        Ok(Measurement {
            value: self.number(record, base, row)?,
            err_upper: self.number(record, &format!("{base}err1"), row)?,
            err_lower: self.number(record, &format!("{base}err2"), row)?,
            limit_only: limit.is_some_and(|l| l != 0.0),
        })
    }
}

fn parse_row(
    columns: &Columns,
    record: &StringRecord,
    row: usize,
) -> Result<TargetRecord, CatalogError> {
    let name = columns.text(record, "pl_name").unwrap_or_default().to_string();
    let host = columns
        .text(record, "pl_hostname")
        .or_else(|| columns.text(record, "hostname"))
        .unwrap_or_default()
        .to_string();

    let radius_rjup = columns.measurement(record, "pl_radj", row)?;
    let radius_reference_link = columns.text(record, "pl_radreflink").map(str::to_string);
    let radius_calculated = !radius_rjup.is_known()
        || radius_reference_link
            .as_deref()
            .is_some_and(is_calculated_link);

    Ok(TargetRecord {
        name,
        host,
        sma_au: columns.measurement(record, "pl_orbsmax", row)?,
        eccentricity: columns.measurement(record, "pl_orbeccen", row)?,
        inclination_deg: columns.measurement(record, "pl_orbincl", row)?,
        periapsis_arg_deg: columns.measurement(record, "pl_orblper", row)?,
        period_days: columns.measurement(record, "pl_orbper", row)?,
        periapsis_time_jd: columns.measurement(record, "pl_orbtper", row)?,
        mass_mjup: columns.measurement(record, "pl_bmassj", row)?,
        mass_provenance: columns
            .text(record, "pl_bmassprov")
            .map(MassProvenance::parse)
            .unwrap_or_default(),
        radius_rjup,
        radius_calculated,
        distance_pc: columns.measurement(record, "st_dist", row)?,
        metallicity: columns.measurement(record, "st_metfe", row)?,
        luminosity_log: columns.measurement(record, "st_lum", row)?,
        stellar_mass_msun: columns.measurement(record, "st_mass", row)?,
        effective_temperature_k: columns.measurement(record, "st_teff", row)?,
        spectral_type: columns.text(record, "st_spstr").map(str::to_string),
        reference_link: columns.text(record, "pl_reflink").map(str::to_string),
        radius_reference_link,
        derived: Default::default(),
    })
}

/// Parse catalog records from any reader producing composite-table CSV.
pub fn read_composite<R: std::io::Read>(reader: R) -> Result<Vec<TargetRecord>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::new(rdr.headers()?);
    columns.require("pl_name")?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        records.push(parse_row(&columns, &record, row + 1)?);
    }

    // Downstream tables are ordered by planet name
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

/// Read a composite-table CSV file.
pub fn read_composite_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TargetRecord>, CatalogError> {
    let file = std::fs::File::open(path.as_ref())?;
    let records = read_composite(file)?;
    log::info!(
        "Read {} catalog rows from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    const SAMPLE: &str = "\
# exported composite table
pl_name,pl_hostname,pl_orbsmax,pl_orbsmaxerr1,pl_orbsmaxerr2,pl_orbeccen,pl_bmassj,pl_bmassprov,pl_radj,pl_radreflink,st_dist,st_lum
zeta b,zeta,5.2,0.1,-0.1,0.05,1.0,Msini,,,10.0,
alpha b,alpha,1.0,,,,0.5,Mass,1.1,<a refstr=CALCULATED_VALUE href=/docs/composite_calc.html target=_blank>Calculated Value</a>,12.5,0.1
";

    #[test]
    fn test_parse_sample() {
        let records = read_composite(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        // Sorted by name
        assert_eq!(records[0].name, "alpha b");
        assert_eq!(records[1].name, "zeta b");

        let zeta = &records[1];
        assert_relative_eq!(zeta.sma_au.known().unwrap(), 5.2);
        assert_relative_eq!(zeta.sma_au.sigma().unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(zeta.mass_provenance, MassProvenance::Msini);
        assert!(zeta.radius_calculated, "missing radius counts as calculated");
        assert!(!zeta.luminosity_log.is_known());

        let alpha = &records[0];
        assert!(alpha.radius_calculated, "calculated reference link");
        assert_eq!(alpha.mass_provenance, MassProvenance::Mass);
        assert!(!alpha.eccentricity.is_known());
    }

    #[test]
    fn test_measured_radius_not_calculated() {
        let csv = "pl_name,pl_radj,pl_radreflink\nb,1.0,<a href=paper>Smith 2020</a>\n";
        let records = read_composite(csv.as_bytes()).unwrap();
        assert!(!records[0].radius_calculated);
    }

    #[test]
    fn test_limit_flag() {
        let csv = "pl_name,pl_orbeccen,pl_orbeccenlim\nb,0.3,1\n";
        let records = read_composite(csv.as_bytes()).unwrap();
        assert!(records[0].eccentricity.limit_only);
    }

    #[test]
    fn test_missing_name_column() {
        let csv = "pl_orbsmax\n1.0\n";
        assert!(matches!(
            read_composite(csv.as_bytes()),
            Err(CatalogError::MissingColumn("pl_name"))
        ));
    }

    #[test]
    fn test_bad_number_reports_location() {
        let csv = "pl_name,st_dist\nb,far\n";
        match read_composite(csv.as_bytes()) {
            Err(CatalogError::BadNumber { row, column, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "st_dist");
            }
            other => panic!("expected BadNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let records = read_composite_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }
}
