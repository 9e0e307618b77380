//! Planet catalogs module
//!
//! This module provides loading of target records from local catalog exports
//! and a small in-memory container for querying them.

pub mod composite;

pub use composite::{read_composite, read_composite_csv, CatalogError};

use std::path::Path;

use crate::records::{filter_usable, TargetRecord};

/// In-memory set of target records, ordered by planet name
#[derive(Debug, Clone, Default)]
pub struct PlanetCatalog {
    records: Vec<TargetRecord>,
}

impl PlanetCatalog {
    pub fn new(mut records: Vec<TargetRecord>) -> Self {
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Self { records }
    }

    /// Load a composite-table CSV, keeping only usable records
    pub fn load_usable<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        Ok(Self::new(filter_usable(read_composite_csv(path)?)))
    }

    /// Look up a planet by name
    pub fn get(&self, name: &str) -> Option<&TargetRecord> {
        self.records
            .binary_search_by(|r| r.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[TargetRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TargetRecord] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<TargetRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching a predicate
    pub fn filter<F>(&self, predicate: F) -> Vec<&TargetRecord>
    where
        F: Fn(&TargetRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Measurement;

    #[test]
    fn test_lookup_by_name() {
        let catalog = PlanetCatalog::new(vec![
            TargetRecord::named("c b", "c"),
            TargetRecord::named("a b", "a"),
            TargetRecord::named("b b", "b"),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("b b").unwrap().host, "b");
        assert!(catalog.get("d b").is_none());
    }

    #[test]
    fn test_filter() {
        let mut eccentric = TargetRecord::named("e b", "e");
        eccentric.eccentricity = Measurement::new(0.6);
        let catalog = PlanetCatalog::new(vec![eccentric, TargetRecord::named("f b", "f")]);
        let found = catalog.filter(|r| r.eccentricity.known().is_some_and(|e| e > 0.5));
        assert_eq!(found.len(), 1);
    }
}
